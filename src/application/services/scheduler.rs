use crate::application::ports::{PushOutcome, RemoteDataService, SyncPersistence};
use crate::application::services::conflict_service::ConflictService;
use crate::application::services::record_store::{RecordStore, SnapshotOutcome};
use crate::application::services::status_facade::StatusHub;
use crate::application::services::sync_queue::SyncQueue;
use crate::domain::entities::{ModuleSyncConfig, SyncQueueItem, SyncSettings};
use crate::domain::value_objects::{ModuleKey, ModuleState};
use crate::shared::error::{EngineError, Result};
use chrono::Utc;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Items handed to the remote per store in one push phase.
const PUSH_BATCH_SIZE: u32 = 50;

/// Outcome of one module's sync cycle inside a sweep.
#[derive(Debug, Clone, PartialEq)]
pub enum ModuleSyncOutcome {
    Completed {
        pulled: usize,
        pushed: usize,
        conflicts: usize,
    },
    /// A cycle for this module was already in flight; the call was a
    /// no-op instead of a second concurrent cycle.
    AlreadySyncing,
    Disabled,
    Failed(String),
}

/// Result of a `sync_now` call, one entry per module in sweep order.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncReport {
    pub modules: Vec<(ModuleKey, ModuleSyncOutcome)>,
}

/// The only component that initiates network I/O. Owns connectivity
/// observation, per-module timers, and the per-module state machine
/// Idle -> Syncing -> (Idle | Error).
pub struct SyncScheduler {
    persistence: Arc<dyn SyncPersistence>,
    records: Arc<RecordStore>,
    queue: Arc<SyncQueue>,
    conflicts: Arc<ConflictService>,
    remote: Arc<dyn RemoteDataService>,
    settings: Arc<RwLock<SyncSettings>>,
    hub: Arc<StatusHub>,
    module_states: Mutex<HashMap<ModuleKey, ModuleState>>,
    timers: Mutex<Vec<JoinHandle<()>>>,
    connectivity_task: Mutex<Option<JoinHandle<()>>>,
    online_rx: watch::Receiver<bool>,
}

impl SyncScheduler {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        persistence: Arc<dyn SyncPersistence>,
        records: Arc<RecordStore>,
        queue: Arc<SyncQueue>,
        conflicts: Arc<ConflictService>,
        remote: Arc<dyn RemoteDataService>,
        settings: Arc<RwLock<SyncSettings>>,
        hub: Arc<StatusHub>,
        online_rx: watch::Receiver<bool>,
    ) -> Self {
        hub.set_online(*online_rx.borrow());
        Self {
            persistence,
            records,
            queue,
            conflicts,
            remote,
            settings,
            hub,
            module_states: Mutex::new(HashMap::new()),
            timers: Mutex::new(Vec::new()),
            connectivity_task: Mutex::new(None),
            online_rx,
        }
    }

    pub fn is_online(&self) -> bool {
        *self.online_rx.borrow()
    }

    pub fn module_state(&self, module: &ModuleKey) -> ModuleState {
        self.module_states
            .lock()
            .expect("scheduler lock poisoned")
            .get(module)
            .copied()
            .unwrap_or(ModuleState::Idle)
    }

    /// Syncs one module, or every enabled module in priority order
    /// (high before medium before low, ties by registration order).
    /// A full sweep finishes with a retention purge of clean records.
    pub async fn sync_now(&self, module: Option<ModuleKey>) -> Result<SyncReport> {
        // The error surface describes the latest sweep only.
        self.hub.clear_sync_error();
        let configs: Vec<ModuleSyncConfig> = {
            let settings = self.settings.read().expect("settings lock poisoned");
            match &module {
                Some(key) => {
                    let config = settings.module(key).ok_or_else(|| {
                        EngineError::Configuration(format!("unknown module: {key}"))
                    })?;
                    vec![config.clone()]
                }
                None => settings
                    .modules_in_sweep_order()
                    .into_iter()
                    .cloned()
                    .collect(),
            }
        };

        let mut outcomes = Vec::with_capacity(configs.len());
        for config in configs {
            let key = config.module.clone();
            let outcome = if config.enabled {
                self.sync_module(config).await
            } else {
                ModuleSyncOutcome::Disabled
            };
            outcomes.push((key, outcome));
        }

        if module.is_none() {
            let age_days = {
                let settings = self.settings.read().expect("settings lock poisoned");
                settings.max_offline_age_days
            };
            self.records.purge_older_than(age_days).await?;
        }

        Ok(SyncReport { modules: outcomes })
    }

    /// One module cycle: pull first so conflicts are detected against
    /// fresh server state, then push the pending queue. At most one
    /// cycle runs per module at any time.
    async fn sync_module(&self, config: ModuleSyncConfig) -> ModuleSyncOutcome {
        {
            let mut states = self.module_states.lock().expect("scheduler lock poisoned");
            if states.get(&config.module) == Some(&ModuleState::Syncing) {
                debug!(module = %config.module, "sync already in flight; skipping");
                return ModuleSyncOutcome::AlreadySyncing;
            }
            states.insert(config.module.clone(), ModuleState::Syncing);
        }
        self.hub.module_sync_started();
        info!(module = %config.module, "module sync started");

        match self.run_cycle(&config).await {
            Ok((pulled, pushed, conflicts)) => {
                let finished_at = Utc::now();
                let snapshot = {
                    let mut settings = self.settings.write().expect("settings lock poisoned");
                    if let Some(entry) = settings.module_mut(&config.module) {
                        entry.last_sync = Some(finished_at);
                    }
                    settings.clone()
                };
                if let Err(err) = self.persistence.save_settings(&snapshot).await {
                    warn!(module = %config.module, error = %err, "failed to persist last_sync");
                }
                self.set_module_state(&config.module, ModuleState::Idle);
                self.hub.module_sync_finished(Some(finished_at), None);
                info!(module = %config.module, pulled, pushed, conflicts, "module sync completed");
                ModuleSyncOutcome::Completed {
                    pulled,
                    pushed,
                    conflicts,
                }
            }
            Err(err) => {
                // Transient by definition: the queue is untouched and the
                // next tick or explicit call retries.
                let message = err.to_string();
                self.set_module_state(&config.module, ModuleState::Error);
                self.hub.module_sync_finished(None, Some(message.clone()));
                warn!(module = %config.module, error = %message, "module sync failed");
                ModuleSyncOutcome::Failed(message)
            }
        }
    }

    async fn run_cycle(&self, config: &ModuleSyncConfig) -> Result<(usize, usize, usize)> {
        let (timeout_secs, policy) = {
            let settings = self.settings.read().expect("settings lock poisoned");
            (settings.network_timeout_secs, settings.conflict_resolution)
        };

        // Pull phase.
        let mut pulled = 0usize;
        let mut new_conflicts: Vec<Uuid> = Vec::new();
        for store in &config.stores {
            let changes = with_timeout(
                timeout_secs,
                self.remote.fetch_since(store, config.last_sync),
            )
            .await?;
            for change in changes {
                pulled += 1;
                let outcome = self
                    .records
                    .apply_server_snapshot(
                        store,
                        &change.id,
                        change.data,
                        change.server_version,
                        change.server_timestamp,
                    )
                    .await?;
                match outcome {
                    SnapshotOutcome::Conflict(draft) => {
                        let conflict = self.conflicts.record_conflict(draft).await?;
                        new_conflicts.push(conflict.id);
                    }
                    SnapshotOutcome::AlreadyConflicted => {
                        debug!(store = %store, entity = %change.id, "change held behind open conflict");
                    }
                    SnapshotOutcome::Applied | SnapshotOutcome::PendingPush => {}
                }
            }
        }

        // Configured non-manual policy adjudicates fresh conflicts
        // immediately; manual leaves them for the user.
        if let Some(strategy) = policy.as_bulk_strategy() {
            for conflict_id in &new_conflicts {
                self.conflicts
                    .resolve_with_strategy(*conflict_id, strategy)
                    .await?;
            }
        }

        // Push phase, FIFO across all of the module's stores. The sort
        // is stable, so enqueue-time ties keep store registration order.
        let mut batch: Vec<SyncQueueItem> = Vec::new();
        for store in &config.stores {
            batch.extend(self.queue.dequeue_batch(store, PUSH_BATCH_SIZE).await?);
        }
        batch.sort_by_key(|item| item.enqueued_at);

        let mut pushed = 0usize;
        for item in batch {
            let outcome = with_timeout(
                timeout_secs,
                self.remote
                    .push(&item.store, item.operation, &item.entity_id, item.payload.as_ref()),
            )
            .await?;
            match outcome {
                PushOutcome::Acknowledged { .. } => {
                    self.records.confirm_push(&item, &outcome).await?;
                    self.queue.ack_pushed(&item).await?;
                    pushed += 1;
                }
                PushOutcome::Rejected { reason } => {
                    self.queue.fail(&item.store, &item.entity_id, reason).await?;
                }
            }
        }

        Ok((pulled, pushed, new_conflicts.len()))
    }

    /// Arms one repeating timer per module with `auto_sync && enabled`,
    /// ticking at the module's configured interval while online.
    pub fn start_auto_sync(self: &Arc<Self>) {
        self.stop_auto_sync();
        let configs: Vec<ModuleSyncConfig> = {
            let settings = self.settings.read().expect("settings lock poisoned");
            if !settings.global_auto_sync {
                return;
            }
            settings
                .modules
                .iter()
                .filter(|m| m.enabled && m.auto_sync)
                .cloned()
                .collect()
        };

        let mut timers = self.timers.lock().expect("scheduler lock poisoned");
        for config in configs {
            let scheduler = Arc::clone(self);
            let module = config.module.clone();
            let period = Duration::from_secs(u64::from(config.sync_interval_minutes.max(1)) * 60);
            timers.push(tokio::spawn(async move {
                let mut interval = tokio::time::interval(period);
                // The immediate first tick would duplicate app-start sync.
                interval.tick().await;
                loop {
                    interval.tick().await;
                    if !scheduler.is_online() {
                        debug!(module = %module, "auto sync tick skipped while offline");
                        continue;
                    }
                    if let Err(err) = scheduler.sync_now(Some(module.clone())).await {
                        warn!(module = %module, error = %err, "scheduled sync failed");
                    }
                }
            }));
        }
        info!(timers = timers.len(), "auto sync armed");
    }

    /// Disarms every module timer. Queued items are untouched and
    /// survive until the module syncs again.
    pub fn stop_auto_sync(&self) {
        let mut timers = self.timers.lock().expect("scheduler lock poisoned");
        for timer in timers.drain(..) {
            timer.abort();
        }
    }

    /// Full teardown: timers plus the connectivity watcher. The watcher
    /// holds an `Arc` to this scheduler, so it must be aborted
    /// explicitly rather than waiting for `Drop`.
    pub fn stop(&self) {
        self.stop_auto_sync();
        if let Ok(mut task) = self.connectivity_task.lock() {
            if let Some(handle) = task.take() {
                handle.abort();
            }
        }
    }

    /// Watches the connectivity signal: mirrors it into the status hub
    /// and, when `sync_on_connect` is set, sweeps all modules on the
    /// offline -> online transition.
    pub fn watch_connectivity(self: &Arc<Self>) {
        let scheduler = Arc::clone(self);
        let mut rx = self.online_rx.clone();
        let handle = tokio::spawn(async move {
            let mut was_online = *rx.borrow();
            while rx.changed().await.is_ok() {
                let online = *rx.borrow();
                scheduler.hub.set_online(online);
                let sync_on_connect = {
                    let settings = scheduler.settings.read().expect("settings lock poisoned");
                    settings.sync_on_connect
                };
                if online && !was_online {
                    info!("connectivity restored");
                    if sync_on_connect {
                        if let Err(err) = scheduler.sync_now(None).await {
                            warn!(error = %err, "sync on reconnect failed");
                        }
                    }
                }
                was_online = online;
            }
        });
        let mut task = self
            .connectivity_task
            .lock()
            .expect("scheduler lock poisoned");
        if let Some(previous) = task.replace(handle) {
            previous.abort();
        }
    }

    /// Replaces the settings, persists them, and re-arms timers so the
    /// new intervals and module flags take effect.
    pub async fn update_settings(self: &Arc<Self>, new_settings: SyncSettings) -> Result<()> {
        self.persistence.save_settings(&new_settings).await?;
        {
            let mut settings = self.settings.write().expect("settings lock poisoned");
            *settings = new_settings;
        }
        self.start_auto_sync();
        Ok(())
    }

    pub fn settings_snapshot(&self) -> SyncSettings {
        self.settings.read().expect("settings lock poisoned").clone()
    }

    fn set_module_state(&self, module: &ModuleKey, state: ModuleState) {
        self.module_states
            .lock()
            .expect("scheduler lock poisoned")
            .insert(module.clone(), state);
    }
}

impl Drop for SyncScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn with_timeout<T, F>(timeout_secs: u64, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(Duration::from_secs(timeout_secs), fut).await {
        Ok(result) => result,
        Err(_) => Err(EngineError::Timeout),
    }
}
