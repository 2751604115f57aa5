use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Business fields of one entity snapshot.
///
/// Always a JSON object so the field comparator can diff key-by-key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EntityPayload(Map<String, Value>);

impl EntityPayload {
    pub fn new(value: Value) -> Result<Self, String> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            _ => Err("Entity payload must be a JSON object".to_string()),
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, String> {
        let value: Value =
            serde_json::from_str(json).map_err(|e| format!("Invalid JSON payload: {e}"))?;
        Self::new(value)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.0.clone())
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for EntityPayload {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl From<EntityPayload> for Value {
    fn from(payload: EntityPayload) -> Self {
        Value::Object(payload.0)
    }
}
