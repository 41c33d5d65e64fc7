//! Tracer setup and management

use opentelemetry::trace::TracerProvider as _;
use opentelemetry_sdk::trace::{SimpleSpanProcessor, TracerProvider};
use std::sync::{Arc, Mutex, OnceLock};
use tracing_subscriber::Layer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Global tracer provider holder
static TRACER_PROVIDER: OnceLock<Arc<TracerProvider>> = OnceLock::new();

/// Global span processor builders (registered before initialization)
type ProcessorBuilder = Box<dyn FnOnce() -> SimpleSpanProcessor + Send>;
static SPAN_PROCESSOR_BUILDERS: Mutex<Option<Vec<ProcessorBuilder>>> = Mutex::new(Some(Vec::new()));

/// Options for `init_telemetry`
#[derive(Debug, Clone, Default)]
pub struct TelemetryOptions {
    /// Tracer name; defaults to `zdk.mysql-tools`
    pub service_name: Option<String>,
    /// Emit JSON log lines instead of human-readable ones
    pub json_logs: bool,
}

/// Register a span processor builder to be used when telemetry is initialized.
///
/// Exporters (OTLP, Jaeger, stdout) are attached this way. Must be called
/// BEFORE `init_telemetry()`; later registrations are ignored with a warning.
pub fn register_span_processor(builder: ProcessorBuilder) {
    let mut builders = match SPAN_PROCESSOR_BUILDERS.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };

    if let Some(ref mut vec) = *builders {
        vec.push(builder);
    } else {
        tracing::warn!("Attempted to register span processor after telemetry initialization");
    }
}

/// Initialize telemetry with OpenTelemetry support.
///
/// This sets up:
/// - A tracer provider with any registered span processors
/// - Integration with the tracing subscriber
/// - Structured logging output filtered by `RUST_LOG`
///
/// Returns `false` when a global subscriber was already installed.
///
/// # Example
///
/// ```rust,no_run
/// use zdk_telemetry::{TelemetryOptions, init_telemetry};
///
/// init_telemetry(TelemetryOptions::default());
/// ```
pub fn init_telemetry(options: TelemetryOptions) -> bool {
    // Take the span processor builders (can only initialize once)
    let builders = match SPAN_PROCESSOR_BUILDERS.lock() {
        Ok(mut guard) => guard.take().unwrap_or_default(),
        Err(poisoned) => poisoned.into_inner().take().unwrap_or_default(),
    };

    let mut provider_builder = TracerProvider::builder();
    for builder in builders {
        provider_builder = provider_builder.with_span_processor(builder());
    }
    let tracer_provider = provider_builder.build();

    let service_name = options
        .service_name
        .unwrap_or_else(|| crate::attributes::SYSTEM_NAME.to_string());
    let tracer = tracer_provider.tracer(service_name);

    let _ = TRACER_PROVIDER.set(Arc::new(tracer_provider));

    let telemetry_layer = tracing_opentelemetry::layer().with_tracer(tracer);

    let fmt_layer = if options.json_logs {
        tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_current_span(true)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_level(true)
            .with_thread_ids(false)
            .with_line_number(true)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(telemetry_layer)
        .with(fmt_layer)
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .try_init()
        .is_ok()
}

/// Get the global tracer provider if initialized
pub fn tracer_provider() -> Option<Arc<TracerProvider>> {
    TRACER_PROVIDER.get().cloned()
}
