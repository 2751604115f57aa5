use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

const LOCAL_ID_PREFIX: &str = "local-";

/// Entity identifier. Offline creates carry a locally-generated temporary
/// id until the server assigns a permanent one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityId(String);

impl EntityId {
    pub fn new(value: String) -> Result<Self, String> {
        Self::validate(&value)?;
        Ok(Self(value))
    }

    /// Generates a temporary id for an entity created while offline.
    pub fn new_local() -> Self {
        Self(format!("{LOCAL_ID_PREFIX}{}", Uuid::new_v4()))
    }

    pub fn is_local(&self) -> bool {
        self.0.starts_with(LOCAL_ID_PREFIX)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn validate(value: &str) -> Result<(), String> {
        if value.trim().is_empty() {
            return Err("Entity ID cannot be empty".to_string());
        }
        Ok(())
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<EntityId> for String {
    fn from(value: EntityId) -> Self {
        value.0
    }
}
