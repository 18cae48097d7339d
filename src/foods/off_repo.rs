//! Bulk product dataset in Postgres.
//!
//! Expected table shape (name configurable):
//! `id text primary key, code text, product_name text, brands text,
//! popularity_key bigint, unique_scans_n bigint, serving_size text,
//! quantity text, keywords text[], nutriments jsonb`.

use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use sqlx::PgPool;
use tracing::{debug, info, instrument};

use crate::foods::cursor::SearchCursor;
use crate::foods::error::{FoodError, FoodResult};
use crate::foods::repo::{BulkDatasetRepository, OffPage};
use crate::foods::repo_types::OffProduct;
use crate::foods::search::{self, SearchMode};

lazy_static! {
    static ref TABLE_RE: Regex =
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)?$").unwrap();
}

const COLUMNS: &str = "id, code, product_name, brands, popularity_key, unique_scans_n, \
                       serving_size, quantity, keywords, nutriments";
const NAMED: &str = "product_name IS NOT NULL AND btrim(product_name) <> ''";
const POPULARITY: &str = "COALESCE(popularity_key, 0)";
const SCANS: &str = "COALESCE(unique_scans_n, 0)";
const ID: &str = r#"id COLLATE "C""#;
const DOCUMENT: &str =
    "to_tsvector('simple', coalesce(product_name, '') || ' ' || coalesce(brands, ''))";

pub struct PgOffRepository {
    db: PgPool,
    table: String,
    mode: SearchMode,
}

impl PgOffRepository {
    /// `table` is spliced into SQL, so it must be a plain (optionally
    /// schema-qualified) identifier.
    pub fn new(db: PgPool, table: &str, mode: SearchMode) -> FoodResult<Self> {
        let table = table.trim();
        if !TABLE_RE.is_match(table) {
            return Err(FoodError::validation(format!("invalid table name: {table}")));
        }
        Ok(Self {
            db,
            table: table.to_string(),
            mode,
        })
    }

    fn sort_column(&self) -> &'static str {
        match self.mode {
            SearchMode::Keyword => SCANS,
            SearchMode::Regex | SearchMode::Text => POPULARITY,
        }
    }

    /// Statement for one page. Binds: `$1` match argument, `$2` limit and,
    /// with a cursor, `$3` sort key and `$4` id.
    pub(crate) fn search_sql(&self, with_cursor: bool) -> String {
        let table = &self.table;
        let key = self.sort_column();
        let after = if with_cursor {
            format!("AND ({key} < $3 OR ({key} = $3 AND {ID} > $4))")
        } else {
            String::new()
        };
        match self.mode {
            SearchMode::Regex => format!(
                "SELECT {COLUMNS} FROM {table} \
                 WHERE {NAMED} AND (product_name ~* $1 OR brands ~* $1) {after} \
                 ORDER BY {key} DESC, {ID} ASC LIMIT $2"
            ),
            SearchMode::Keyword => format!(
                "SELECT {COLUMNS} FROM {table} \
                 WHERE {NAMED} AND keywords && $1::text[] {after} \
                 ORDER BY {key} DESC, {ID} ASC LIMIT $2"
            ),
            SearchMode::Text => format!(
                "SELECT {COLUMNS} FROM {table} \
                 WHERE {NAMED} AND {DOCUMENT} @@ plainto_tsquery('simple', $1) \
                 ORDER BY ts_rank({DOCUMENT}, plainto_tsquery('simple', $1)) DESC, \
                 {POPULARITY} DESC, {ID} ASC LIMIT $2"
            ),
        }
    }

    pub(crate) fn barcode_sql(&self) -> String {
        format!(
            "SELECT {COLUMNS} FROM {} \
             WHERE (code = $1 OR id = $1) AND {NAMED} \
             ORDER BY (code IS NOT DISTINCT FROM $1) DESC LIMIT 1",
            self.table
        )
    }

    pub(crate) fn index_statements(&self) -> Vec<String> {
        let table = &self.table;
        let base = table.rsplit('.').next().unwrap_or(table);
        let key = self.sort_column();
        let mut out = vec![
            format!(r#"CREATE INDEX IF NOT EXISTS idx_{base}_sort_id ON {table} (({key}) DESC, {ID})"#),
            format!("CREATE INDEX IF NOT EXISTS idx_{base}_code ON {table} (code)"),
        ];
        match self.mode {
            SearchMode::Regex => {}
            SearchMode::Text => out.push(format!(
                "CREATE INDEX IF NOT EXISTS idx_{base}_text ON {table} USING GIN ({DOCUMENT})"
            )),
            SearchMode::Keyword => out.push(format!(
                "CREATE INDEX IF NOT EXISTS idx_{base}_keywords ON {table} USING GIN (keywords)"
            )),
        }
        out
    }
}

#[async_trait]
impl BulkDatasetRepository for PgOffRepository {
    fn mode(&self) -> SearchMode {
        self.mode
    }

    #[instrument(skip(self))]
    async fn search(&self, query: &str, limit: usize, cursor: Option<&str>) -> FoodResult<OffPage> {
        let query = query.trim();
        if query.is_empty() || limit == 0 {
            return Ok(OffPage::default());
        }
        let after = cursor
            .filter(|_| self.mode.supports_cursor())
            .and_then(SearchCursor::decode);
        let sql = self.search_sql(after.is_some());
        let limit_arg = i64::try_from(limit).unwrap_or(i64::MAX);

        let q = sqlx::query_as::<_, OffProduct>(&sql);
        let q = match self.mode {
            SearchMode::Regex => q.bind(search::substring_pattern(query)),
            SearchMode::Keyword => {
                let tokens = search::keyword_tokens(query);
                if tokens.is_empty() {
                    return Ok(OffPage::default());
                }
                q.bind(tokens)
            }
            SearchMode::Text => q.bind(query.to_string()),
        };
        let mut q = q.bind(limit_arg);
        if let Some(c) = &after {
            q = q.bind(c.key).bind(c.id.clone());
        }
        let products = q.fetch_all(&self.db).await?;

        let next_cursor = match products.last() {
            Some(last) if self.mode.supports_cursor() && products.len() == limit => {
                Some(SearchCursor::new(self.mode.sort_key(last), last.id.clone()).to_string())
            }
            _ => None,
        };
        debug!(
            hits = products.len(),
            has_next = next_cursor.is_some(),
            mode = %self.mode,
            "bulk search"
        );
        Ok(OffPage {
            products,
            next_cursor,
        })
    }

    async fn by_barcode(&self, code: &str) -> FoodResult<Option<OffProduct>> {
        let code = code.trim();
        if code.is_empty() {
            return Ok(None);
        }
        let sql = self.barcode_sql();
        let product = sqlx::query_as::<_, OffProduct>(&sql)
            .bind(code)
            .fetch_optional(&self.db)
            .await?;
        Ok(product)
    }

    async fn ensure_indexes(&self) -> FoodResult<()> {
        for stmt in self.index_statements() {
            sqlx::query(&stmt).execute(&self.db).await?;
        }
        info!(table = %self.table, mode = %self.mode, "bulk indexes ensured");
        Ok(())
    }
}
