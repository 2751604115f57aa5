//! Read-only sync status aggregate plus the listener registry that
//! replaces platform storage events: listeners run synchronously after
//! each state transition, so a UI layer stays reactive without any
//! platform-specific event system.

use crate::application::ports::{StoreCount, SyncPersistence};
use crate::application::services::conflict_service::ConflictService;
use crate::application::services::record_store::RecordStore;
use crate::application::services::scheduler::{SyncReport, SyncScheduler};
use crate::application::services::sync_queue::SyncQueue;
use crate::domain::value_objects::ModuleKey;
use crate::shared::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

/// Snapshot consumed by the presentation layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SyncStatusSnapshot {
    pub is_online: bool,
    pub is_syncing: bool,
    pub sync_queue_count: i64,
    pub pending_conflicts: i64,
    pub last_sync_time: Option<DateTime<Utc>>,
    pub sync_error: Option<String>,
}

type StatusListener = Box<dyn Fn(&SyncStatusSnapshot) + Send + Sync>;
type ConflictListener = Box<dyn Fn(i64) + Send + Sync>;

#[derive(Debug, Clone)]
struct HubState {
    online: bool,
    syncing_modules: usize,
    queue_count: i64,
    pending_conflicts: i64,
    last_sync: Option<DateTime<Utc>>,
    error: Option<String>,
}

/// Shared mutable status state. Services write through it; the facade
/// and registered listeners read from it.
pub struct StatusHub {
    state: Mutex<HubState>,
    status_listeners: Mutex<Vec<StatusListener>>,
    conflict_listeners: Mutex<Vec<ConflictListener>>,
}

impl Default for StatusHub {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusHub {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(HubState {
                online: false,
                syncing_modules: 0,
                queue_count: 0,
                pending_conflicts: 0,
                last_sync: None,
                error: None,
            }),
            status_listeners: Mutex::new(Vec::new()),
            conflict_listeners: Mutex::new(Vec::new()),
        }
    }

    pub fn snapshot(&self) -> SyncStatusSnapshot {
        let state = self.state.lock().expect("status hub lock poisoned");
        Self::to_snapshot(&state)
    }

    pub fn on_status_change(&self, listener: StatusListener) {
        self.status_listeners
            .lock()
            .expect("status hub lock poisoned")
            .push(listener);
    }

    pub fn on_conflicts_change(&self, listener: ConflictListener) {
        self.conflict_listeners
            .lock()
            .expect("status hub lock poisoned")
            .push(listener);
    }

    pub fn set_online(&self, online: bool) {
        self.mutate(|state| state.online = online);
    }

    pub fn module_sync_started(&self) {
        self.mutate(|state| state.syncing_modules += 1);
    }

    /// Clears the error surface. Called once at the start of a sweep, so
    /// a failure in an early module survives the later modules' cycles
    /// and is still visible when the sweep ends.
    pub fn clear_sync_error(&self) {
        self.mutate(|state| state.error = None);
    }

    pub fn module_sync_finished(
        &self,
        last_sync: Option<DateTime<Utc>>,
        error: Option<String>,
    ) {
        self.mutate(|state| {
            state.syncing_modules = state.syncing_modules.saturating_sub(1);
            if last_sync.is_some() {
                state.last_sync = last_sync;
            }
            if error.is_some() {
                state.error = error;
            }
        });
    }

    pub fn set_queue_count(&self, count: i64) {
        self.mutate(|state| state.queue_count = count);
    }

    pub fn set_pending_conflicts(&self, count: i64) {
        let snapshot = {
            let mut state = self.state.lock().expect("status hub lock poisoned");
            state.pending_conflicts = count;
            Self::to_snapshot(&state)
        };
        self.notify_status(&snapshot);
        let listeners = self
            .conflict_listeners
            .lock()
            .expect("status hub lock poisoned");
        for listener in listeners.iter() {
            listener(count);
        }
    }

    fn mutate(&self, apply: impl FnOnce(&mut HubState)) {
        let snapshot = {
            let mut state = self.state.lock().expect("status hub lock poisoned");
            apply(&mut state);
            Self::to_snapshot(&state)
        };
        self.notify_status(&snapshot);
    }

    fn notify_status(&self, snapshot: &SyncStatusSnapshot) {
        let listeners = self
            .status_listeners
            .lock()
            .expect("status hub lock poisoned");
        for listener in listeners.iter() {
            listener(snapshot);
        }
    }

    fn to_snapshot(state: &HubState) -> SyncStatusSnapshot {
        SyncStatusSnapshot {
            is_online: state.online,
            is_syncing: state.syncing_modules > 0,
            sync_queue_count: state.queue_count,
            pending_conflicts: state.pending_conflicts,
            last_sync_time: state.last_sync,
            sync_error: state.error.clone(),
        }
    }
}

/// Per-store and queue totals behind the "offline data" settings screen.
#[derive(Debug, Clone, PartialEq)]
pub struct OfflineStats {
    pub stores: Vec<StoreCount>,
    pub queued_mutations: i64,
    pub pending_conflicts: i64,
    pub hard_failures: i64,
}

/// The engine surface the presentation layer consumes: the status
/// aggregate, the listener registry, and the handful of user-facing
/// operations. Everything else stays internal.
pub struct SyncStatusFacade {
    hub: Arc<StatusHub>,
    scheduler: Arc<SyncScheduler>,
    records: Arc<RecordStore>,
    queue: Arc<SyncQueue>,
    conflicts: Arc<ConflictService>,
    persistence: Arc<dyn SyncPersistence>,
}

impl SyncStatusFacade {
    pub fn new(
        hub: Arc<StatusHub>,
        scheduler: Arc<SyncScheduler>,
        records: Arc<RecordStore>,
        queue: Arc<SyncQueue>,
        conflicts: Arc<ConflictService>,
        persistence: Arc<dyn SyncPersistence>,
    ) -> Self {
        Self {
            hub,
            scheduler,
            records,
            queue,
            conflicts,
            persistence,
        }
    }

    pub fn status(&self) -> SyncStatusSnapshot {
        self.hub.snapshot()
    }

    pub fn on_status_change(&self, listener: impl Fn(&SyncStatusSnapshot) + Send + Sync + 'static) {
        self.hub.on_status_change(Box::new(listener));
    }

    pub fn on_conflicts_change(&self, listener: impl Fn(i64) + Send + Sync + 'static) {
        self.hub.on_conflicts_change(Box::new(listener));
    }

    /// Triggers a sweep of every enabled module (or one module).
    pub async fn sync_now(&self, module: Option<ModuleKey>) -> Result<SyncReport> {
        self.scheduler.sync_now(module).await
    }

    /// Drops cached offline data. Without `force`, dirty records (and
    /// their queued pushes) are kept so no unpushed edit is lost.
    pub async fn clear_offline_data(&self, force: bool) -> Result<u64> {
        let removed = self.persistence.clear_business_data(!force).await?;
        self.queue.refresh_count().await?;
        Ok(removed)
    }

    pub async fn offline_stats(&self) -> Result<OfflineStats> {
        Ok(OfflineStats {
            stores: self.records.counts_by_store().await?,
            queued_mutations: self.queue.pending_count().await?,
            pending_conflicts: self.conflicts.pending_count().await?,
            hard_failures: self.queue.hard_failures().await?.len() as i64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn listeners_fire_synchronously_on_transitions() {
        let hub = StatusHub::new();
        let fired = Arc::new(AtomicUsize::new(0));
        let seen = fired.clone();
        hub.on_status_change(Box::new(move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        }));

        hub.set_online(true);
        hub.set_queue_count(3);
        assert_eq!(fired.load(Ordering::SeqCst), 2);

        let snapshot = hub.snapshot();
        assert!(snapshot.is_online);
        assert_eq!(snapshot.sync_queue_count, 3);
    }

    #[test]
    fn syncing_flag_tracks_module_depth() {
        let hub = StatusHub::new();
        hub.module_sync_started();
        hub.module_sync_started();
        assert!(hub.snapshot().is_syncing);

        hub.module_sync_finished(Some(Utc::now()), None);
        assert!(hub.snapshot().is_syncing);
        hub.module_sync_finished(None, Some("timeout".to_string()));
        let snapshot = hub.snapshot();
        assert!(!snapshot.is_syncing);
        assert!(snapshot.last_sync_time.is_some());
        assert_eq!(snapshot.sync_error.as_deref(), Some("timeout"));
    }

    #[test]
    fn sweep_failure_survives_later_module_cycles() {
        let hub = StatusHub::new();
        hub.clear_sync_error();
        hub.module_sync_started();
        hub.module_sync_finished(None, Some("timeout".to_string()));

        // The next module in the same sweep starts and succeeds.
        hub.module_sync_started();
        hub.module_sync_finished(Some(Utc::now()), None);
        assert_eq!(hub.snapshot().sync_error.as_deref(), Some("timeout"));

        // Only the next sweep clears the surface.
        hub.clear_sync_error();
        assert!(hub.snapshot().sync_error.is_none());
    }

    #[test]
    fn conflict_listeners_receive_pending_count() {
        let hub = StatusHub::new();
        let last = Arc::new(AtomicUsize::new(0));
        let seen = last.clone();
        hub.on_conflicts_change(Box::new(move |count| {
            seen.store(count as usize, Ordering::SeqCst);
        }));

        hub.set_pending_conflicts(4);
        assert_eq!(last.load(Ordering::SeqCst), 4);
    }
}
