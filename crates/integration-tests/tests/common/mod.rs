//! Shared fixtures: a fresh on-disk store per test, plus a record type to queue
#![allow(dead_code)]

use queues_core::application::{EngineConfig, QueueEngine, TypeRegistry};
use queues_core::domain::{EntityId, Storable};
use queues_core::port::{EntityStore, FixedTimeProvider, QueueRepository};
use queues_infra_sqlite::{
    create_pool_with, run_migrations, SqliteEntityStore, SqliteQueueRepository, StoreConfig,
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::sync::{Arc, Once};
use tempfile::TempDir;

/// Record type the tests put in queues
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Widget {
    pub id: String,
    pub label: String,
}

impl Widget {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
        }
    }
}

impl Storable for Widget {
    const TYPE_TAG: &'static str = "tests.widget";

    fn entity_id(&self) -> EntityId {
        self.id.clone()
    }
}

/// Storable, but never registered
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Gadget {
    pub id: String,
}

impl Storable for Gadget {
    const TYPE_TAG: &'static str = "tests.gadget";

    fn entity_id(&self) -> EntityId {
        self.id.clone()
    }
}

static TRACING: Once = Once::new();

/// Route engine logs through the test harness; `RUST_LOG` picks the level
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .try_init();
    });
}

pub struct TestContext {
    pub dir: TempDir,
    pub pool: SqlitePool,
    pub registry: Arc<TypeRegistry>,
    pub store: Arc<dyn EntityStore>,
    pub repo: Arc<dyn QueueRepository>,
    pub engine: Arc<QueueEngine>,
}

impl TestContext {
    pub async fn new() -> Self {
        Self::build(tempfile::tempdir().unwrap(), |config| config, |engine| engine).await
    }

    /// Context whose engine is adjusted by `configure` before sealing
    pub async fn with_engine(configure: impl FnOnce(QueueEngine) -> QueueEngine) -> Self {
        Self::build(tempfile::tempdir().unwrap(), |config| config, configure).await
    }

    /// Context with custom store settings (busy timeout, pool size)
    pub async fn with_store(
        store_config: impl FnOnce(StoreConfig) -> StoreConfig,
        configure: impl FnOnce(QueueEngine) -> QueueEngine,
    ) -> Self {
        Self::build(tempfile::tempdir().unwrap(), store_config, configure).await
    }

    /// Close everything and open the same database file again
    pub async fn reopen(self) -> Self {
        let TestContext { dir, pool, .. } = self;
        pool.close().await;
        Self::build(dir, |config| config, |engine| engine).await
    }

    pub fn db_path(dir: &TempDir) -> PathBuf {
        dir.path().join("queues.db")
    }

    async fn build(
        dir: TempDir,
        store_config: impl FnOnce(StoreConfig) -> StoreConfig,
        configure: impl FnOnce(QueueEngine) -> QueueEngine,
    ) -> Self {
        init_tracing();

        let config = store_config(StoreConfig::new(
            Self::db_path(&dir).to_str().unwrap().to_string(),
        ));
        let pool = create_pool_with(&config).await.unwrap();
        run_migrations(&pool).await.unwrap();

        let registry = Arc::new(TypeRegistry::new());
        let store: Arc<dyn EntityStore> = Arc::new(SqliteEntityStore::new(
            pool.clone(),
            Arc::new(FixedTimeProvider(1_700_000_000_000)),
        ));
        registry
            .register_record::<Widget>(Arc::clone(&store))
            .unwrap();

        let repo: Arc<dyn QueueRepository> = Arc::new(SqliteQueueRepository::new(pool.clone()));
        let engine = QueueEngine::new(Arc::clone(&repo), Arc::clone(&registry))
            .unwrap()
            .with_config(EngineConfig::default());
        let engine = configure(engine);
        registry.seal();
        tracing::debug!(db = %Self::db_path(&dir).display(), "Test context ready");

        Self {
            dir,
            pool,
            registry,
            store,
            repo,
            engine: Arc::new(engine),
        }
    }

    /// Store a widget and return it
    pub async fn widget(&self, id: &str) -> Widget {
        let widget = Widget::new(id, format!("widget {}", id));
        self.store.save(&widget).await.unwrap();
        widget
    }

    /// Store `n` widgets named `{prefix}-0 .. {prefix}-{n-1}`
    pub async fn widgets(&self, prefix: &str, n: usize) -> Vec<Widget> {
        let mut widgets = Vec::with_capacity(n);
        for i in 0..n {
            widgets.push(self.widget(&format!("{}-{}", prefix, i)).await);
        }
        widgets
    }
}

/// Entity IDs of the resolved items, in queue order
pub fn ids(items: &[queues_core::domain::Item]) -> Vec<String> {
    items
        .iter()
        .map(|item| item.reference().entity_id.clone())
        .collect()
}
