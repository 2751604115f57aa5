use serde::{Deserialize, Serialize};
use std::fmt;

/// Pending local mutation kind carried by a sync queue item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncOperation {
    Create,
    Update,
    Delete,
}

impl SyncOperation {
    pub fn as_str(&self) -> &str {
        match self {
            SyncOperation::Create => "create",
            SyncOperation::Update => "update",
            SyncOperation::Delete => "delete",
        }
    }

    pub fn parse(value: &str) -> Result<Self, String> {
        match value {
            "create" => Ok(SyncOperation::Create),
            "update" => Ok(SyncOperation::Update),
            "delete" => Ok(SyncOperation::Delete),
            other => Err(format!("Unknown sync operation: {other}")),
        }
    }
}

impl fmt::Display for SyncOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
