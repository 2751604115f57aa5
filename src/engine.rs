//! Engine assembly: wires persistence, services, and the scheduler
//! together and exposes the handful of objects an embedding client
//! works with.

use crate::application::ports::{RemoteDataService, SyncPersistence};
use crate::application::services::{
    ConflictService, RecordStore, StatusHub, SyncQueue, SyncScheduler, SyncStatusFacade,
};
use crate::domain::entities::SyncSettings;
use crate::infrastructure::storage::SqlitePersistence;
use crate::shared::error::Result;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use std::sync::{Arc, RwLock};
use tokio::sync::watch;
use tracing::{info, warn};

/// Offline-first sync engine over a local SQLite cache.
///
/// Construction initializes the schema, loads (or seeds) the settings
/// document, arms auto-sync timers, and starts watching the
/// connectivity signal. The caller owns the `watch::Sender<bool>` side
/// of that signal; how connectivity is detected is platform business.
pub struct SyncEngine {
    persistence: Arc<dyn SyncPersistence>,
    records: Arc<RecordStore>,
    queue: Arc<SyncQueue>,
    conflicts: Arc<ConflictService>,
    scheduler: Arc<SyncScheduler>,
    facade: Arc<SyncStatusFacade>,
}

impl SyncEngine {
    pub async fn new(
        pool: SqlitePool,
        remote: Arc<dyn RemoteDataService>,
        online_rx: watch::Receiver<bool>,
    ) -> Result<Self> {
        let sqlite = Arc::new(SqlitePersistence::new(pool));
        sqlite.initialize_schema().await?;
        let persistence: Arc<dyn SyncPersistence> = sqlite;

        let settings = match persistence.load_settings().await? {
            Some(settings) => settings,
            None => {
                let defaults = SyncSettings::default();
                persistence.save_settings(&defaults).await?;
                info!("seeded default sync settings");
                defaults
            }
        };
        let sync_on_start = settings.sync_on_app_start && *online_rx.borrow();
        let settings = Arc::new(RwLock::new(settings));

        let hub = Arc::new(StatusHub::new());
        let queue = Arc::new(SyncQueue::new(
            persistence.clone(),
            settings.clone(),
            hub.clone(),
        ));
        let records = Arc::new(RecordStore::new(persistence.clone(), queue.clone()));
        let conflicts = Arc::new(ConflictService::new(
            persistence.clone(),
            records.clone(),
            queue.clone(),
            hub.clone(),
        ));
        let scheduler = Arc::new(SyncScheduler::new(
            persistence.clone(),
            records.clone(),
            queue.clone(),
            conflicts.clone(),
            remote,
            settings,
            hub.clone(),
            online_rx,
        ));
        scheduler.watch_connectivity();
        scheduler.start_auto_sync();

        // Seed the status aggregate with what is already persisted.
        queue.refresh_count().await?;
        hub.set_pending_conflicts(conflicts.pending_count().await?);

        if sync_on_start {
            let scheduler = scheduler.clone();
            tokio::spawn(async move {
                if let Err(err) = scheduler.sync_now(None).await {
                    warn!(error = %err, "app-start sync failed");
                }
            });
        }

        let facade = Arc::new(SyncStatusFacade::new(
            hub,
            scheduler.clone(),
            records.clone(),
            queue.clone(),
            conflicts.clone(),
            persistence.clone(),
        ));

        Ok(Self {
            persistence,
            records,
            queue,
            conflicts,
            scheduler,
            facade,
        })
    }

    /// Convenience constructor connecting to a SQLite URL
    /// (e.g. `sqlite://condo.db?mode=rwc` or `sqlite::memory:`).
    pub async fn open(
        database_url: &str,
        remote: Arc<dyn RemoteDataService>,
        online_rx: watch::Receiver<bool>,
    ) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;
        Self::new(pool, remote, online_rx).await
    }

    pub fn facade(&self) -> Arc<SyncStatusFacade> {
        self.facade.clone()
    }

    pub fn records(&self) -> Arc<RecordStore> {
        self.records.clone()
    }

    pub fn conflicts(&self) -> Arc<ConflictService> {
        self.conflicts.clone()
    }

    pub fn scheduler(&self) -> Arc<SyncScheduler> {
        self.scheduler.clone()
    }

    pub fn queue(&self) -> Arc<SyncQueue> {
        self.queue.clone()
    }

    pub fn persistence(&self) -> Arc<dyn SyncPersistence> {
        self.persistence.clone()
    }

    /// Replaces the settings document and re-arms timers.
    pub async fn update_settings(&self, settings: SyncSettings) -> Result<()> {
        self.scheduler.update_settings(settings).await
    }

    pub fn settings(&self) -> SyncSettings {
        self.scheduler.settings_snapshot()
    }

    /// Disarms timers and the connectivity watcher. Queued mutations
    /// stay persisted for the next start.
    pub fn shutdown(&self) {
        self.scheduler.stop();
    }
}
