use serde::{Deserialize, Serialize};
use std::fmt;

/// Which side of a detected divergence carried which operation.
/// The first word is the local side, the second the server side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConflictType {
    UpdateUpdate,
    UpdateDelete,
    DeleteUpdate,
}

impl ConflictType {
    pub fn as_str(&self) -> &str {
        match self {
            ConflictType::UpdateUpdate => "update-update",
            ConflictType::UpdateDelete => "update-delete",
            ConflictType::DeleteUpdate => "delete-update",
        }
    }

    pub fn parse(value: &str) -> Result<Self, String> {
        match value {
            "update-update" => Ok(ConflictType::UpdateUpdate),
            "update-delete" => Ok(ConflictType::UpdateDelete),
            "delete-update" => Ok(ConflictType::DeleteUpdate),
            other => Err(format!("Unknown conflict type: {other}")),
        }
    }
}

impl fmt::Display for ConflictType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
