use serde::{Deserialize, Serialize};
use std::fmt;

/// Named partition of business data with its own sync policy.
///
/// The condominium client ships with seven fixed modules; `Unknown`
/// round-trips values persisted by a newer client version.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModuleKey {
    Operational,
    Communication,
    Financial,
    Registries,
    Documents,
    Reservations,
    Incidents,
    Unknown(String),
}

impl ModuleKey {
    pub fn as_str(&self) -> &str {
        match self {
            ModuleKey::Operational => "operational",
            ModuleKey::Communication => "communication",
            ModuleKey::Financial => "financial",
            ModuleKey::Registries => "registries",
            ModuleKey::Documents => "documents",
            ModuleKey::Reservations => "reservations",
            ModuleKey::Incidents => "incidents",
            ModuleKey::Unknown(value) => value.as_str(),
        }
    }
}

impl fmt::Display for ModuleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<&str> for ModuleKey {
    fn from(value: &str) -> Self {
        match value {
            "operational" => ModuleKey::Operational,
            "communication" => ModuleKey::Communication,
            "financial" => ModuleKey::Financial,
            "registries" => ModuleKey::Registries,
            "documents" => ModuleKey::Documents,
            "reservations" => ModuleKey::Reservations,
            "incidents" => ModuleKey::Incidents,
            other => ModuleKey::Unknown(other.to_string()),
        }
    }
}
