//! Catalog resolver: one read surface over the custom store and the bulk
//! dataset, with custom foods taking precedence.

use std::sync::Arc;

use tracing::{debug, error, instrument, warn};

use crate::foods::cache::{BarcodeCache, Cached};
use crate::foods::cursor::SearchCursor;
use crate::foods::dto::{CreateFoodRequest, FoodRecord, SearchPage};
use crate::foods::error::{FoodError, FoodResult};
use crate::foods::normalize;
use crate::foods::repo::{BulkDatasetRepository, CustomFoodStore};

pub const DEFAULT_SEARCH_LIMIT: usize = 25;
pub const MAX_SEARCH_LIMIT: usize = 50;

#[derive(Debug, Clone, Copy)]
pub struct SearchLimits {
    pub default: usize,
    pub max: usize,
}

impl Default for SearchLimits {
    fn default() -> Self {
        Self {
            default: DEFAULT_SEARCH_LIMIT,
            max: MAX_SEARCH_LIMIT,
        }
    }
}

impl SearchLimits {
    /// Unset, zero or negative means the default; anything above the ceiling is clamped.
    pub fn clamp(&self, requested: Option<i64>) -> usize {
        let max = self.max.max(1);
        match requested {
            Some(n) if n > 0 => usize::try_from(n).unwrap_or(max).min(max),
            _ => self.default.clamp(1, max),
        }
    }
}

pub struct CatalogResolver {
    custom: Arc<dyn CustomFoodStore>,
    bulk: Arc<dyn BulkDatasetRepository>,
    cache: Arc<BarcodeCache>,
    limits: SearchLimits,
}

impl CatalogResolver {
    pub fn new(
        custom: Arc<dyn CustomFoodStore>,
        bulk: Arc<dyn BulkDatasetRepository>,
        cache: Arc<BarcodeCache>,
        limits: SearchLimits,
    ) -> Self {
        Self {
            custom,
            bulk,
            cache,
            limits,
        }
    }

    /// Custom matches first, then bulk matches filling the rest of the page.
    ///
    /// The custom head only appears on the first page. With a valid cursor the
    /// whole page comes from the bulk dataset.
    #[instrument(skip(self))]
    pub async fn search(
        &self,
        query: &str,
        limit: Option<i64>,
        cursor: Option<&str>,
    ) -> FoodResult<SearchPage> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(SearchPage::empty());
        }
        let limit = self.limits.clamp(limit);
        // Only a cursor the bulk engine will honour skips the custom head.
        let cursor = cursor
            .filter(|_| self.bulk.mode().supports_cursor())
            .filter(|c| SearchCursor::decode(c).is_some());

        let mut items = match cursor {
            Some(_) => Vec::new(),
            None => self.custom.search(query, limit).await.map_err(|e| {
                error!(error = %e, query, "custom food search failed");
                e
            })?,
        };
        if items.len() >= limit {
            items.truncate(limit);
            debug!(custom = items.len(), "page filled by custom foods");
            return Ok(SearchPage {
                items,
                next_cursor: None,
            });
        }
        let custom_hits = items.len();

        let page = self
            .bulk
            .search(query, limit - custom_hits, cursor)
            .await
            .map_err(|e| {
                error!(error = %e, query, "bulk search failed");
                e
            })?;
        items.extend(page.products.iter().filter_map(normalize::off_product_to_record));

        debug!(
            custom = custom_hits,
            bulk = items.len() - custom_hits,
            has_next = page.next_cursor.is_some(),
            "search done"
        );
        Ok(SearchPage {
            items,
            next_cursor: page.next_cursor,
        })
    }

    /// Custom store first, then the cache, then the bulk dataset. Bulk answers
    /// (including "no such product") are cached; failures are not.
    #[instrument(skip(self))]
    pub async fn by_barcode(&self, code: &str) -> FoodResult<Option<FoodRecord>> {
        let code = code.trim();
        if code.is_empty() {
            return Ok(None);
        }

        if let Some(rec) = self.custom.by_barcode(code).await.map_err(|e| {
            error!(error = %e, code, "custom barcode lookup failed");
            e
        })? {
            debug!(code, "custom food hit");
            return Ok(Some(rec));
        }

        match self.cache.get(code) {
            Some(Cached::Found(rec)) => {
                debug!(code, "barcode cache hit");
                return Ok(Some(rec));
            }
            Some(Cached::NotFound) => {
                debug!(code, "barcode cache negative hit");
                return Ok(None);
            }
            None => debug!(code, "barcode cache miss"),
        }

        let product = self.bulk.by_barcode(code).await.map_err(|e| {
            error!(error = %e, code, "bulk barcode lookup failed");
            e
        })?;
        match product.as_ref().and_then(normalize::off_product_to_record) {
            Some(rec) => {
                self.cache.set(code, rec.clone());
                Ok(Some(rec))
            }
            None => {
                self.cache.set_not_found(code);
                Ok(None)
            }
        }
    }

    #[instrument(skip(self, req))]
    pub async fn create_custom(
        &self,
        actor_id: &str,
        req: CreateFoodRequest,
    ) -> FoodResult<FoodRecord> {
        let actor_id = actor_id.trim();
        if actor_id.is_empty() {
            warn!("custom food create without actor");
            return Err(FoodError::Unauthorized);
        }
        req.validate()?;
        self.custom.create(actor_id, req).await
    }

    #[instrument(skip(self))]
    pub async fn by_custom_id(&self, id: &str) -> FoodResult<Option<FoodRecord>> {
        let id = id.trim();
        if id.is_empty() {
            return Err(FoodError::validation("id required"));
        }
        self.custom.by_id(id).await
    }

    /// Best effort: a failure is logged and startup goes on.
    pub async fn ensure_indexes(&self) {
        if let Err(e) = self.bulk.ensure_indexes().await {
            warn!(error = %e, "bulk index setup failed; continuing");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{
            atomic::{AtomicUsize, Ordering},
            Mutex,
        },
        time::Duration,
    };

    use async_trait::async_trait;

    use super::*;
    use crate::foods::cache::{CacheConfig, ManualClock};
    use crate::foods::dto::FoodSource;
    use crate::foods::off_memory::{tests::product, MemoryOffRepository};
    use crate::foods::repo::OffPage;
    use crate::foods::repo_types::OffProduct;
    use crate::foods::search::SearchMode;

    #[derive(Default)]
    struct FakeCustomStore {
        foods: Mutex<Vec<FoodRecord>>,
        calls: AtomicUsize,
    }

    impl FakeCustomStore {
        fn with(foods: Vec<FoodRecord>) -> Arc<Self> {
            Arc::new(Self {
                foods: Mutex::new(foods),
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl CustomFoodStore for FakeCustomStore {
        async fn create(&self, _actor_id: &str, req: CreateFoodRequest) -> FoodResult<FoodRecord> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut rec = FoodRecord::custom(uuid::Uuid::new_v4().to_string(), req.name);
            rec.barcode = req.barcode;
            rec.per_100g.kcal = Some(req.kcal_per_100g);
            self.foods.lock().unwrap().push(rec.clone());
            Ok(rec)
        }

        async fn by_barcode(&self, code: &str) -> FoodResult<Option<FoodRecord>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let foods = self.foods.lock().unwrap();
            Ok(foods.iter().find(|f| f.barcode.as_deref() == Some(code)).cloned())
        }

        async fn search(&self, query: &str, limit: usize) -> FoodResult<Vec<FoodRecord>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let q = query.to_lowercase();
            let foods = self.foods.lock().unwrap();
            Ok(foods
                .iter()
                .filter(|f| f.name.to_lowercase().contains(&q))
                .take(limit)
                .cloned()
                .collect())
        }

        async fn by_id(&self, id: &str) -> FoodResult<Option<FoodRecord>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let foods = self.foods.lock().unwrap();
            Ok(foods.iter().find(|f| f.id == id).cloned())
        }
    }

    /// Wraps a bulk engine and counts the calls that reach it.
    struct CountingBulk {
        inner: Box<dyn BulkDatasetRepository>,
        searches: AtomicUsize,
        lookups: AtomicUsize,
    }

    impl CountingBulk {
        fn over(inner: impl BulkDatasetRepository + 'static) -> Arc<Self> {
            Arc::new(Self {
                inner: Box::new(inner),
                searches: AtomicUsize::new(0),
                lookups: AtomicUsize::new(0),
            })
        }

        fn lookups(&self) -> usize {
            self.lookups.load(Ordering::SeqCst)
        }

        fn searches(&self) -> usize {
            self.searches.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl BulkDatasetRepository for CountingBulk {
        fn mode(&self) -> SearchMode {
            self.inner.mode()
        }

        async fn search(&self, query: &str, limit: usize, cursor: Option<&str>) -> FoodResult<OffPage> {
            self.searches.fetch_add(1, Ordering::SeqCst);
            self.inner.search(query, limit, cursor).await
        }

        async fn by_barcode(&self, code: &str) -> FoodResult<Option<OffProduct>> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            self.inner.by_barcode(code).await
        }

        async fn ensure_indexes(&self) -> FoodResult<()> {
            self.inner.ensure_indexes().await
        }
    }

    /// Custom store that is always down.
    struct FailingCustom;

    #[async_trait]
    impl CustomFoodStore for FailingCustom {
        async fn create(&self, _actor_id: &str, _req: CreateFoodRequest) -> FoodResult<FoodRecord> {
            Err(FoodError::Database(sqlx::Error::PoolTimedOut))
        }

        async fn by_barcode(&self, _code: &str) -> FoodResult<Option<FoodRecord>> {
            Err(FoodError::Database(sqlx::Error::PoolTimedOut))
        }

        async fn search(&self, _query: &str, _limit: usize) -> FoodResult<Vec<FoodRecord>> {
            Err(FoodError::Database(sqlx::Error::PoolTimedOut))
        }

        async fn by_id(&self, _id: &str) -> FoodResult<Option<FoodRecord>> {
            Err(FoodError::Database(sqlx::Error::PoolTimedOut))
        }
    }

    /// Upstream that is always down.
    struct FailingBulk;

    #[async_trait]
    impl BulkDatasetRepository for FailingBulk {
        fn mode(&self) -> SearchMode {
            SearchMode::Regex
        }

        async fn search(&self, _q: &str, _l: usize, _c: Option<&str>) -> FoodResult<OffPage> {
            Err(FoodError::Database(sqlx::Error::PoolTimedOut))
        }

        async fn by_barcode(&self, _code: &str) -> FoodResult<Option<OffProduct>> {
            Err(FoodError::Database(sqlx::Error::PoolTimedOut))
        }

        async fn ensure_indexes(&self) -> FoodResult<()> {
            Err(FoodError::Database(sqlx::Error::PoolTimedOut))
        }
    }

    /// Returns the same raw product for every barcode, bypassing engine filters.
    struct FixedBulk(OffProduct);

    #[async_trait]
    impl BulkDatasetRepository for FixedBulk {
        fn mode(&self) -> SearchMode {
            SearchMode::Regex
        }

        async fn search(&self, _q: &str, _l: usize, _c: Option<&str>) -> FoodResult<OffPage> {
            Ok(OffPage {
                products: vec![self.0.clone()],
                next_cursor: None,
            })
        }

        async fn by_barcode(&self, _code: &str) -> FoodResult<Option<OffProduct>> {
            Ok(Some(self.0.clone()))
        }

        async fn ensure_indexes(&self) -> FoodResult<()> {
            Ok(())
        }
    }

    fn custom_food(id: &str, name: &str, barcode: Option<&str>) -> FoodRecord {
        let mut rec = FoodRecord::custom(id, name);
        rec.barcode = barcode.map(Into::into);
        rec
    }

    fn oat_bulk() -> MemoryOffRepository {
        MemoryOffRepository::new(
            SearchMode::Regex,
            vec![
                product("3000000000001", Some("Oat milk barista"), Some("Oatly"), 90),
                product("3000000000002", Some("Oat milk light"), Some("Oatly"), 80),
                product("3000000000003", Some("Oat milk organic"), None, 70),
                product("3000000000004", Some("Rice milk"), Some("Alpro"), 60),
            ],
        )
    }

    fn resolver(
        custom: Arc<FakeCustomStore>,
        bulk: Arc<dyn BulkDatasetRepository>,
    ) -> (CatalogResolver, Arc<BarcodeCache>, Arc<ManualClock>) {
        let clock = ManualClock::new();
        let cache = Arc::new(BarcodeCache::with_clock(CacheConfig::default(), clock.clone()));
        let r = CatalogResolver::new(custom, bulk, cache.clone(), SearchLimits::default());
        (r, cache, clock)
    }

    #[test]
    fn limits_clamp_to_default_and_ceiling() {
        let l = SearchLimits::default();
        assert_eq!(l.clamp(None), 25);
        assert_eq!(l.clamp(Some(0)), 25);
        assert_eq!(l.clamp(Some(-3)), 25);
        assert_eq!(l.clamp(Some(7)), 7);
        assert_eq!(l.clamp(Some(500)), 50);
        assert_eq!(l.clamp(Some(i64::MAX)), 50);

        let odd = SearchLimits { default: 80, max: 10 };
        assert_eq!(odd.clamp(None), 10);
    }

    #[tokio::test]
    async fn blank_query_is_an_empty_page_without_store_calls() {
        let custom = FakeCustomStore::with(vec![custom_food("c1", "Oat milk", None)]);
        let bulk = CountingBulk::over(oat_bulk());
        let (r, _, _) = resolver(custom.clone(), bulk.clone());

        let page = r.search("  ", Some(10), None).await.unwrap();
        assert!(page.items.is_empty());
        assert!(page.next_cursor.is_none());
        assert_eq!(custom.calls.load(Ordering::SeqCst), 0);
        assert_eq!(bulk.searches(), 0);
    }

    #[tokio::test]
    async fn custom_head_filling_the_page_skips_bulk() {
        let custom = FakeCustomStore::with(vec![custom_food("c1", "Oat milk (homemade)", None)]);
        let bulk = CountingBulk::over(oat_bulk());
        let (r, _, _) = resolver(custom, bulk.clone());

        let page = r.search("oat milk", Some(1), None).await.unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].source(), FoodSource::Custom);
        assert!(page.next_cursor.is_none());
        assert_eq!(bulk.searches(), 0);
    }

    #[tokio::test]
    async fn custom_matches_come_before_bulk_and_bulk_fills_the_rest() {
        let custom = FakeCustomStore::with(vec![
            custom_food("c1", "Oat milk (homemade)", None),
            custom_food("c2", "Almond butter", None),
        ]);
        let (r, _, _) = resolver(custom, Arc::new(oat_bulk()));

        let page = r.search("oat milk", Some(10), None).await.unwrap();
        let sources: Vec<_> = page.items.iter().map(|i| i.source()).collect();
        assert_eq!(
            sources,
            vec![FoodSource::Custom, FoodSource::Bulk, FoodSource::Bulk, FoodSource::Bulk]
        );
        assert_eq!(page.items[1].name, "Oat milk barista");
        assert_eq!(page.items[3].name, "Oat milk organic");
        // short bulk page ends paging
        assert!(page.next_cursor.is_none());
    }

    #[tokio::test]
    async fn cursor_pages_come_from_bulk_only() {
        let custom = FakeCustomStore::with(vec![custom_food("c1", "Oat milk (homemade)", None)]);
        let bulk = CountingBulk::over(oat_bulk());
        let (r, _, _) = resolver(custom.clone(), bulk.clone());

        let first = r.search("oat milk", Some(2), None).await.unwrap();
        assert_eq!(first.items.len(), 2);
        assert_eq!(first.items[0].id, "c1");
        assert_eq!(first.items[1].id, "3000000000001");
        let cursor = first.next_cursor.expect("full page carries a cursor");

        let custom_calls = custom.calls.load(Ordering::SeqCst);
        let second = r.search("oat milk", Some(2), Some(&cursor)).await.unwrap();
        let ids: Vec<_> = second.items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["3000000000002", "3000000000003"]);
        assert!(second.items.iter().all(|i| i.source() == FoodSource::Bulk));
        assert_eq!(custom.calls.load(Ordering::SeqCst), custom_calls);
    }

    #[tokio::test]
    async fn malformed_cursor_is_a_first_page() {
        let custom = FakeCustomStore::with(vec![custom_food("c1", "Oat milk (homemade)", None)]);
        let (r, _, _) = resolver(custom, Arc::new(oat_bulk()));

        let page = r.search("oat milk", Some(2), Some("garbage")).await.unwrap();
        assert_eq!(page.items[0].id, "c1");
    }

    #[tokio::test]
    async fn search_failures_propagate() {
        let custom = FakeCustomStore::with(vec![]);
        let (r, _, _) = resolver(custom, Arc::new(FailingBulk));
        let err = r.search("oat", None, None).await.unwrap_err();
        assert!(!err.is_client_error());
    }

    #[tokio::test]
    async fn custom_store_failures_propagate_and_are_not_cached() {
        let bulk = CountingBulk::over(oat_bulk());
        let clock = ManualClock::new();
        let cache = Arc::new(BarcodeCache::with_clock(CacheConfig::default(), clock));
        let r = CatalogResolver::new(
            Arc::new(FailingCustom),
            bulk.clone(),
            cache.clone(),
            SearchLimits::default(),
        );

        let err = r.search("oat milk", Some(5), None).await.unwrap_err();
        assert!(matches!(err, FoodError::Database(_)));
        assert_eq!(bulk.searches(), 0);

        assert!(r.by_barcode("3000000000001").await.is_err());
        assert_eq!(bulk.lookups(), 0);
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn text_mode_cursor_keeps_the_custom_head() {
        let custom = FakeCustomStore::with(vec![custom_food("c1", "Oat milk (homemade)", None)]);
        let bulk = MemoryOffRepository::new(
            SearchMode::Text,
            vec![
                product("3000000000001", Some("Oat milk barista"), Some("Oatly"), 90),
                product("3000000000002", Some("Oat milk light"), Some("Oatly"), 80),
            ],
        );
        let (r, _, _) = resolver(custom.clone(), Arc::new(bulk));

        let page = r
            .search("oat milk", Some(5), Some("90|3000000000001"))
            .await
            .unwrap();
        assert_eq!(page.items[0].id, "c1");
        assert_eq!(page.items.len(), 3);
        assert!(page.next_cursor.is_none());
        assert_eq!(custom.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn custom_barcode_wins_over_bulk() {
        let custom = FakeCustomStore::with(vec![custom_food(
            "c1",
            "My oat milk",
            Some("3000000000001"),
        )]);
        let bulk = CountingBulk::over(oat_bulk());
        let (r, cache, _) = resolver(custom, bulk.clone());

        let rec = r.by_barcode(" 3000000000001 ").await.unwrap().unwrap();
        assert_eq!(rec.source(), FoodSource::Custom);
        assert_eq!(rec.name, "My oat milk");
        assert_eq!(bulk.lookups(), 0);
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn bulk_hits_are_cached() {
        let bulk = CountingBulk::over(oat_bulk());
        let (r, _, _) = resolver(FakeCustomStore::with(vec![]), bulk.clone());

        let first = r.by_barcode("3000000000002").await.unwrap().unwrap();
        assert_eq!(first.source(), FoodSource::Bulk);
        assert_eq!(first.brand.as_deref(), Some("Oatly"));

        let second = r.by_barcode("3000000000002").await.unwrap();
        assert_eq!(second, Some(first));
        assert_eq!(bulk.lookups(), 1);
    }

    #[tokio::test]
    async fn unknown_barcode_is_negatively_cached() {
        let bulk = CountingBulk::over(oat_bulk());
        let (r, cache, _) = resolver(FakeCustomStore::with(vec![]), bulk.clone());

        assert_eq!(r.by_barcode("000000000000").await.unwrap(), None);
        assert_eq!(cache.get("000000000000"), Some(Cached::NotFound));
        assert_eq!(r.by_barcode("000000000000").await.unwrap(), None);
        assert_eq!(bulk.lookups(), 1);
    }

    #[tokio::test]
    async fn expired_negative_entry_asks_bulk_again() {
        let bulk = CountingBulk::over(oat_bulk());
        let (r, _, clock) = resolver(FakeCustomStore::with(vec![]), bulk.clone());

        assert_eq!(r.by_barcode("000000000000").await.unwrap(), None);
        clock.advance(Duration::from_secs(29 * 60));
        assert_eq!(r.by_barcode("000000000000").await.unwrap(), None);
        assert_eq!(bulk.lookups(), 1);

        clock.advance(Duration::from_secs(2 * 60));
        assert_eq!(r.by_barcode("000000000000").await.unwrap(), None);
        assert_eq!(bulk.lookups(), 2);
    }

    #[tokio::test]
    async fn upstream_failure_is_not_cached() {
        let (r, cache, _) = resolver(FakeCustomStore::with(vec![]), Arc::new(FailingBulk));

        assert!(r.by_barcode("3000000000001").await.is_err());
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn nameless_bulk_record_counts_as_not_found() {
        let nameless = product("4000000000000", Some("   "), Some("Acme"), 10);
        let (r, cache, _) = resolver(FakeCustomStore::with(vec![]), Arc::new(FixedBulk(nameless.clone())));

        assert_eq!(r.by_barcode("4000000000000").await.unwrap(), None);
        assert_eq!(cache.get("4000000000000"), Some(Cached::NotFound));

        let page = r.search("acme", None, None).await.unwrap();
        assert!(page.items.is_empty());
    }

    #[tokio::test]
    async fn blank_barcode_is_not_found() {
        let bulk = CountingBulk::over(oat_bulk());
        let (r, _, _) = resolver(FakeCustomStore::with(vec![]), bulk.clone());
        assert_eq!(r.by_barcode("   ").await.unwrap(), None);
        assert_eq!(bulk.lookups(), 0);
    }

    #[tokio::test]
    async fn concurrent_lookups_agree() {
        let bulk = CountingBulk::over(oat_bulk());
        let (r, _, _) = resolver(FakeCustomStore::with(vec![]), bulk.clone());
        let r = Arc::new(r);

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let r = r.clone();
                tokio::spawn(async move { r.by_barcode("3000000000003").await })
            })
            .collect();
        for h in handles {
            let rec = h.await.unwrap().unwrap().unwrap();
            assert_eq!(rec.name, "Oat milk organic");
        }
        assert!(bulk.lookups() >= 1);
    }

    fn create_request(name: &str) -> CreateFoodRequest {
        CreateFoodRequest {
            name: name.into(),
            barcode: Some("2000000000008".into()),
            kcal_per_100g: 46.0,
            protein_per_100g: 1.0,
            fat_per_100g: 1.5,
            carbs_per_100g: 6.7,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn create_requires_actor_and_valid_request() {
        let custom = FakeCustomStore::with(vec![]);
        let (r, _, _) = resolver(custom.clone(), Arc::new(oat_bulk()));

        let err = r.create_custom("  ", create_request("Oat milk")).await.unwrap_err();
        assert!(matches!(err, FoodError::Unauthorized));

        let err = r.create_custom("user-1", create_request(" ")).await.unwrap_err();
        assert!(matches!(err, FoodError::Validation(_)));
        assert_eq!(custom.calls.load(Ordering::SeqCst), 0);

        let rec = r.create_custom("user-1", create_request("Oat milk")).await.unwrap();
        assert_eq!(rec.source(), FoodSource::Custom);

        let found = r.by_barcode("2000000000008").await.unwrap().unwrap();
        assert_eq!(found.id, rec.id);
        assert_eq!(r.by_custom_id(&rec.id).await.unwrap(), Some(rec));
    }

    #[tokio::test]
    async fn custom_id_lookup() {
        let custom = FakeCustomStore::with(vec![custom_food("c1", "Granola", None)]);
        let (r, _, _) = resolver(custom, Arc::new(oat_bulk()));

        assert!(matches!(
            r.by_custom_id(" ").await,
            Err(FoodError::Validation(_))
        ));
        assert_eq!(r.by_custom_id("missing").await.unwrap(), None);
        assert_eq!(r.by_custom_id("c1").await.unwrap().unwrap().name, "Granola");
    }

    #[tokio::test]
    async fn index_setup_failure_is_swallowed() {
        let (r, _, _) = resolver(FakeCustomStore::with(vec![]), Arc::new(FailingBulk));
        r.ensure_indexes().await;
    }
}
