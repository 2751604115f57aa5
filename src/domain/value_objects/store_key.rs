use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of one entity collection cached on the client
/// (e.g. "timelines", "ordensServico", "manutencoes", "comentarios").
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StoreKey(String);

impl StoreKey {
    pub fn new(value: String) -> Result<Self, String> {
        Self::validate(&value)?;
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn validate(value: &str) -> Result<(), String> {
        if value.trim().is_empty() {
            return Err("Store key cannot be empty".to_string());
        }
        Ok(())
    }
}

impl fmt::Display for StoreKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<StoreKey> for String {
    fn from(value: StoreKey) -> Self {
        value.0
    }
}
