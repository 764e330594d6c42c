pub mod catalog;
pub mod config;
pub mod coordinator;
pub mod dates;
pub mod db;
pub mod errors;
pub mod models;
pub mod notifications;
pub mod scheduler;
pub mod store;

use crate::config::AppConfig;
use crate::coordinator::JoinCoordinator;
use crate::db::Database;
use crate::errors::{AppError, AppResult};
use crate::notifications::{Clock, NotificationSink, ReminderScheduler, SystemClock};
use crate::scheduler::NotificationQueue;
use crate::store::{ActivityStore, KeyValueStore};
use std::path::Path;
use std::sync::Arc;
use tracing_appender::non_blocking::WorkerGuard;

static LOG_GUARD: std::sync::OnceLock<WorkerGuard> = std::sync::OnceLock::new();

#[derive(Clone)]
pub struct App {
    pub coordinator: Arc<JoinCoordinator>,
    pub store: ActivityStore,
}

impl App {
    pub async fn bootstrap(config: &AppConfig) -> AppResult<(Self, NotificationQueue)> {
        let database = Database::new(&config.database_path())?;
        let queue = NotificationQueue::new(config.notification_queue_capacity);
        queue.start();
        let app = Self::with_store(
            config,
            Arc::new(database),
            Arc::new(queue.clone()),
            Arc::new(SystemClock),
        )
        .await;
        Ok((app, queue))
    }

    pub async fn with_store(
        config: &AppConfig,
        kv: Arc<dyn KeyValueStore>,
        sink: Arc<dyn NotificationSink>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let store = ActivityStore::new(kv);
        if config.reset_on_start {
            store.clear_profile().await;
            store.clear_all().await;
        }

        let coordinator = Arc::new(JoinCoordinator::new(
            store.clone(),
            ReminderScheduler::new(sink, clock),
        ));
        coordinator.initialize().await;

        Self { coordinator, store }
    }
}

pub fn init_tracing(log_dir: &Path) -> AppResult<()> {
    std::fs::create_dir_all(log_dir)?;
    let file_appender = tracing_appender::rolling::daily(log_dir, "pickup.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    let _ = LOG_GUARD.set(guard);

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .json()
        .with_writer(non_blocking)
        .try_init()
        .map_err(|error| AppError::Internal(error.to_string()))
}

#[cfg(test)]
mod tests {
    use super::{init_tracing, App};
    use crate::config::AppConfig;
    use crate::notifications::tests::{at, RecordingSink};
    use crate::notifications::FixedClock;
    use crate::store::tests::sample_activity;
    use crate::store::{ActivityStore, MemoryKeyValueStore};
    use std::sync::Arc;

    #[tokio::test]
    async fn reset_on_start_clears_previous_session() {
        let kv = Arc::new(MemoryKeyValueStore::new());
        let previous = ActivityStore::new(kv.clone());
        previous.save(sample_activity("a1", "2025-01-01")).await;
        previous
            .save_profile(&serde_json::Map::from_iter([("username".to_string(), serde_json::json!("sam"))]))
            .await;

        let app = App::with_store(
            &AppConfig::default(),
            kv,
            Arc::new(RecordingSink::default()),
            Arc::new(FixedClock(at(6, 0))),
        )
        .await;
        assert!(app.coordinator.joined_activities().is_empty());
        assert!(app.store.load_profile().await.is_none());
    }

    #[tokio::test]
    async fn keeping_state_across_starts_loads_it() {
        let kv = Arc::new(MemoryKeyValueStore::new());
        ActivityStore::new(kv.clone()).save(sample_activity("a1", "2025-01-01")).await;

        let config = AppConfig {
            reset_on_start: false,
            ..AppConfig::default()
        };
        let app = App::with_store(
            &config,
            kv,
            Arc::new(RecordingSink::default()),
            Arc::new(FixedClock(at(6, 0))),
        )
        .await;
        assert!(app.coordinator.is_joined("a1"));
        assert!(!app.coordinator.is_loading());
    }

    #[tokio::test]
    async fn bootstrap_uses_sqlite_under_data_dir() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = AppConfig {
            data_dir: dir.path().to_path_buf(),
            reset_on_start: false,
            ..AppConfig::default()
        };

        let (app, _queue) = App::bootstrap(&config).await.expect("bootstrap");
        app.coordinator.toggle(&sample_activity("a1", "2999-01-01")).await;
        assert!(config.database_path().is_file());
        drop(app);

        let (reopened, queue) = App::bootstrap(&config).await.expect("bootstrap again");
        assert!(reopened.coordinator.is_joined("a1"));
        assert_eq!(queue.pending().await.len(), 0);
    }

    #[test]
    fn second_tracing_init_is_reported() {
        let dir = tempfile::tempdir().expect("tempdir");
        let _ = init_tracing(dir.path());
        assert!(init_tracing(dir.path()).is_err());
    }
}
