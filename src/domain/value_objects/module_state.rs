use serde::{Deserialize, Serialize};
use std::fmt;

/// Per-module sync state machine: Idle -> Syncing -> (Idle | Error).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleState {
    Idle,
    Syncing,
    Error,
}

impl ModuleState {
    pub fn as_str(&self) -> &str {
        match self {
            ModuleState::Idle => "idle",
            ModuleState::Syncing => "syncing",
            ModuleState::Error => "error",
        }
    }
}

impl fmt::Display for ModuleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
