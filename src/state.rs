use std::sync::Arc;

use anyhow::Context;
use sqlx::PgPool;

use crate::config::AppConfig;
use crate::db;
use crate::foods::cache::BarcodeCache;
use crate::foods::custom_repo::PgCustomFoodStore;
use crate::foods::off_memory::MemoryOffRepository;
use crate::foods::off_repo::PgOffRepository;
use crate::foods::repo::BulkDatasetRepository;
use crate::foods::services::CatalogResolver;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub catalog: Arc<CatalogResolver>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);
        let db = db::connect(&config.database_url, config.db_max_connections).await?;
        let bulk = bulk_engine(&config, &db).await?;

        tracing::info!(
            mode = %config.bulk.mode,
            from_dump = config.bulk.dump_path.is_some(),
            "food catalog ready"
        );
        Ok(Self::from_parts(db, config, bulk))
    }

    pub fn from_parts(
        db: PgPool,
        config: Arc<AppConfig>,
        bulk: Arc<dyn BulkDatasetRepository>,
    ) -> Self {
        let custom = Arc::new(PgCustomFoodStore::new(db));
        let cache = Arc::new(BarcodeCache::new(config.cache));
        let catalog = Arc::new(CatalogResolver::new(custom, bulk, cache, config.search));
        Self { config, catalog }
    }
}

async fn bulk_engine(
    config: &AppConfig,
    db: &PgPool,
) -> anyhow::Result<Arc<dyn BulkDatasetRepository>> {
    let bulk = &config.bulk;
    if let Some(path) = &bulk.dump_path {
        let repo = MemoryOffRepository::load(bulk.mode, path)
            .await
            .with_context(|| format!("load bulk dump {}", path.display()))?;
        return Ok(Arc::new(repo));
    }

    let pool = if bulk.database_url == config.database_url {
        db.clone()
    } else {
        db::connect(&bulk.database_url, config.db_max_connections)
            .await
            .context("connect to bulk database")?
    };
    let repo = PgOffRepository::new(pool, &bulk.table, bulk.mode).context("bulk table")?;
    Ok(Arc::new(repo))
}
