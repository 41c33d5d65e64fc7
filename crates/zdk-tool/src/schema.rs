use serde_json::{Map, Value};

/// Tool schema builder for manual schema creation
///
/// Produces the JSON-Schema-like object a tool advertises as its
/// `parameters`: property types, descriptions, defaults, enum constraints,
/// nested objects and the list of required properties.
#[derive(Debug, Clone)]
pub struct ToolSchema {
    pub type_: String,
    pub properties: Map<String, Value>,
    pub required: Vec<String>,
}

impl ToolSchema {
    pub fn new() -> Self {
        Self {
            type_: "object".to_string(),
            properties: Map::new(),
            required: Vec::new(),
        }
    }

    pub fn property(
        self,
        name: impl Into<String>,
        type_: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        let prop = Self::typed(type_.into(), description.into());
        self.raw_property(name, Value::Object(prop))
    }

    /// Property that the caller may omit; `default` is applied in its place
    pub fn property_with_default(
        self,
        name: impl Into<String>,
        type_: impl Into<String>,
        description: impl Into<String>,
        default: impl Into<Value>,
    ) -> Self {
        let mut prop = Self::typed(type_.into(), description.into());
        prop.insert("default".to_string(), default.into());
        self.raw_property(name, Value::Object(prop))
    }

    /// String property restricted to a fixed set of values
    pub fn enum_property(
        self,
        name: impl Into<String>,
        description: impl Into<String>,
        values: &[&str],
    ) -> Self {
        let mut prop = Self::typed("string".to_string(), description.into());
        prop.insert(
            "enum".to_string(),
            Value::Array(values.iter().map(|v| Value::String(v.to_string())).collect()),
        );
        self.raw_property(name, Value::Object(prop))
    }

    /// Nested object property described by its own schema
    pub fn object_property(
        self,
        name: impl Into<String>,
        description: impl Into<String>,
        nested: ToolSchema,
    ) -> Self {
        let mut prop = match nested.build() {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        prop.insert("description".to_string(), Value::String(description.into()));
        self.raw_property(name, Value::Object(prop))
    }

    /// Property given as a pre-built schema fragment
    pub fn raw_property(mut self, name: impl Into<String>, schema: Value) -> Self {
        self.properties.insert(name.into(), schema);
        self
    }

    pub fn required(mut self, name: impl Into<String>) -> Self {
        self.required.push(name.into());
        self
    }

    pub fn build(self) -> Value {
        let mut schema = Map::new();
        schema.insert("type".to_string(), Value::String(self.type_));
        schema.insert("properties".to_string(), Value::Object(self.properties));
        schema.insert(
            "required".to_string(),
            Value::Array(self.required.into_iter().map(Value::String).collect()),
        );

        Value::Object(schema)
    }

    fn typed(type_: String, description: String) -> Map<String, Value> {
        let mut prop = Map::new();
        prop.insert("type".to_string(), Value::String(type_));
        prop.insert("description".to_string(), Value::String(description));
        prop
    }
}

impl Default for ToolSchema {
    fn default() -> Self {
        Self::new()
    }
}
