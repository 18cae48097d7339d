//! Capabilities the catalog needs from its two backing stores.

use async_trait::async_trait;

use crate::foods::dto::{CreateFoodRequest, FoodRecord};
use crate::foods::error::FoodResult;
use crate::foods::repo_types::OffProduct;
use crate::foods::search::SearchMode;

/// Raw rows of one bulk page plus the token for the next one.
#[derive(Debug, Clone, Default)]
pub struct OffPage {
    pub products: Vec<OffProduct>,
    pub next_cursor: Option<String>,
}

/// User-writable store of custom foods. Records come back already canonical.
///
/// Read paths return `Ok(None)` / an empty vec when nothing matches.
#[async_trait]
pub trait CustomFoodStore: Send + Sync {
    async fn create(&self, actor_id: &str, req: CreateFoodRequest) -> FoodResult<FoodRecord>;
    async fn by_barcode(&self, code: &str) -> FoodResult<Option<FoodRecord>>;
    async fn search(&self, query: &str, limit: usize) -> FoodResult<Vec<FoodRecord>>;
    async fn by_id(&self, id: &str) -> FoodResult<Option<FoodRecord>>;
}

/// Read-mostly bulk product dataset.
#[async_trait]
pub trait BulkDatasetRepository: Send + Sync {
    /// Matching strategy, fixed at construction.
    fn mode(&self) -> SearchMode;

    /// Products matching `query` under the engine's strategy. Products without a
    /// usable name are never returned. A malformed `cursor` means first page.
    async fn search(&self, query: &str, limit: usize, cursor: Option<&str>) -> FoodResult<OffPage>;

    /// Product by barcode, falling back to the primary key. Nameless products
    /// count as not found.
    async fn by_barcode(&self, code: &str) -> FoodResult<Option<OffProduct>>;

    /// Idempotent index setup, run once at startup. Not needed for correctness.
    async fn ensure_indexes(&self) -> FoodResult<()>;
}
