use serde::{Deserialize, Serialize};
use std::fmt;

/// Module ordering inside a full sync sweep. High syncs first; ties are
/// broken by module registration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncPriority {
    High,
    Medium,
    Low,
}

impl SyncPriority {
    pub fn as_str(&self) -> &str {
        match self {
            SyncPriority::High => "high",
            SyncPriority::Medium => "medium",
            SyncPriority::Low => "low",
        }
    }

    /// Sort rank: lower value syncs earlier.
    pub fn rank(&self) -> u8 {
        match self {
            SyncPriority::High => 0,
            SyncPriority::Medium => 1,
            SyncPriority::Low => 2,
        }
    }
}

impl fmt::Display for SyncPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
