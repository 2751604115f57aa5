use crate::domain::value_objects::{
    ConflictResolutionPolicy, ModuleKey, StoreKey, SyncPriority,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sync policy of one module. A module owns one or more entity
/// collections (stores); configuration is per module, data is per store.
///
/// `sync_interval_minutes` only matters while `auto_sync && enabled`.
/// Disabling a module disarms its timer without discarding queued items.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModuleSyncConfig {
    pub module: ModuleKey,
    pub stores: Vec<StoreKey>,
    pub enabled: bool,
    pub auto_sync: bool,
    pub priority: SyncPriority,
    pub sync_interval_minutes: u32,
    pub last_sync: Option<DateTime<Utc>>,
}

impl ModuleSyncConfig {
    pub fn new(
        module: ModuleKey,
        stores: Vec<StoreKey>,
        priority: SyncPriority,
        sync_interval_minutes: u32,
    ) -> Self {
        Self {
            module,
            stores,
            enabled: true,
            auto_sync: true,
            priority,
            sync_interval_minutes,
            last_sync: None,
        }
    }
}

/// Global sync settings plus the per-module configuration map.
///
/// Persisted under a stable settings key, independently of the business
/// data, and passed explicitly into the scheduler at construction.
/// Modules keep their registration order in the `modules` vector; the
/// scheduler uses that order to break priority ties.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SyncSettings {
    pub global_auto_sync: bool,
    pub sync_on_connect: bool,
    pub sync_on_app_start: bool,
    pub compression_enabled: bool,
    pub conflict_resolution: ConflictResolutionPolicy,
    pub max_offline_age_days: u32,
    pub max_retry_attempts: u32,
    pub network_timeout_secs: u64,
    pub modules: Vec<ModuleSyncConfig>,
}

impl SyncSettings {
    pub fn module(&self, key: &ModuleKey) -> Option<&ModuleSyncConfig> {
        self.modules.iter().find(|m| &m.module == key)
    }

    pub fn module_mut(&mut self, key: &ModuleKey) -> Option<&mut ModuleSyncConfig> {
        self.modules.iter_mut().find(|m| &m.module == key)
    }

    /// Enabled modules in sweep order: priority rank first, registration
    /// order second.
    pub fn modules_in_sweep_order(&self) -> Vec<&ModuleSyncConfig> {
        let mut enabled: Vec<(usize, &ModuleSyncConfig)> = self
            .modules
            .iter()
            .enumerate()
            .filter(|(_, m)| m.enabled)
            .collect();
        enabled.sort_by_key(|(index, m)| (m.priority.rank(), *index));
        enabled.into_iter().map(|(_, m)| m).collect()
    }

    /// Module owning the given store, if any.
    pub fn module_for_store(&self, store: &StoreKey) -> Option<&ModuleSyncConfig> {
        self.modules.iter().find(|m| m.stores.contains(store))
    }
}

impl Default for SyncSettings {
    fn default() -> Self {
        let store = |name: &str| StoreKey::new(name.to_string()).expect("non-empty store key");
        Self {
            global_auto_sync: true,
            sync_on_connect: true,
            sync_on_app_start: false,
            compression_enabled: false,
            conflict_resolution: ConflictResolutionPolicy::Manual,
            max_offline_age_days: 30,
            max_retry_attempts: 5,
            network_timeout_secs: 30,
            modules: vec![
                ModuleSyncConfig::new(
                    ModuleKey::Operational,
                    vec![store("ordensServico"), store("manutencoes")],
                    SyncPriority::High,
                    15,
                ),
                ModuleSyncConfig::new(
                    ModuleKey::Incidents,
                    vec![store("ocorrencias")],
                    SyncPriority::High,
                    15,
                ),
                ModuleSyncConfig::new(
                    ModuleKey::Communication,
                    vec![store("timelines"), store("comentarios")],
                    SyncPriority::Medium,
                    30,
                ),
                ModuleSyncConfig::new(
                    ModuleKey::Reservations,
                    vec![store("reservas")],
                    SyncPriority::Medium,
                    30,
                ),
                ModuleSyncConfig::new(
                    ModuleKey::Financial,
                    vec![store("boletos"), store("despesas")],
                    SyncPriority::Medium,
                    30,
                ),
                ModuleSyncConfig::new(
                    ModuleKey::Registries,
                    vec![store("moradores"), store("unidades")],
                    SyncPriority::Low,
                    60,
                ),
                ModuleSyncConfig::new(
                    ModuleKey::Documents,
                    vec![store("documentos")],
                    SyncPriority::Low,
                    60,
                ),
            ],
        }
    }
}
