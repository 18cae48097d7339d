//! Bulk dataset held in memory, loaded from a JSON-lines product dump.
//!
//! Implements the same strategies, ordering and cursor contract as the
//! Postgres engine, which makes it the reference for both local runs against
//! a dump and tests.

use std::{cmp::Ordering, io::BufRead, path::Path};

use async_trait::async_trait;
use regex::RegexBuilder;
use serde::Deserialize;
use serde_json::Value;
use sqlx::types::Json;
use tracing::{debug, info};

use crate::foods::cursor::SearchCursor;
use crate::foods::error::{FoodError, FoodResult};
use crate::foods::normalize;
use crate::foods::repo::{BulkDatasetRepository, OffPage};
use crate::foods::repo_types::{OffProduct, RawNutriments};
use crate::foods::search::{self, SearchMode};

pub struct MemoryOffRepository {
    mode: SearchMode,
    products: Vec<OffProduct>,
}

/// One dump line. Every field is read loosely: a value of the wrong type
/// becomes absent instead of failing the load.
#[derive(Debug, Deserialize)]
struct DumpLine {
    #[serde(rename = "_id")]
    mongo_id: Option<Value>,
    id: Option<Value>,
    code: Option<Value>,
    product_name: Option<Value>,
    brands: Option<Value>,
    popularity_key: Option<Value>,
    unique_scans_n: Option<Value>,
    serving_size: Option<Value>,
    quantity: Option<Value>,
    #[serde(rename = "_keywords")]
    mongo_keywords: Option<Value>,
    keywords: Option<Value>,
    nutriments: Option<Value>,
}

fn as_text(v: Option<&Value>) -> Option<String> {
    match v? {
        Value::String(s) => normalize::clean(Some(s.as_str())),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// String entries of an array; anything else is dropped.
fn as_words(v: Option<&Value>) -> Option<Vec<String>> {
    match v? {
        Value::Array(items) => Some(items.iter().filter_map(|i| as_text(Some(i))).collect()),
        _ => None,
    }
}

fn as_nutriments(v: Option<Value>) -> Option<RawNutriments> {
    match v? {
        Value::Object(m) => Some(m.into_iter().collect()),
        _ => None,
    }
}

fn as_count(v: Option<&Value>) -> Option<i64> {
    v.and_then(normalize::parse_nutrient).map(|f| f as i64)
}

impl DumpLine {
    fn into_product(self) -> Option<OffProduct> {
        let code = as_text(self.code.as_ref());
        let id = as_text(self.mongo_id.as_ref())
            .or_else(|| as_text(self.id.as_ref()))
            .or_else(|| code.clone())?;
        Some(OffProduct {
            id,
            code,
            product_name: as_text(self.product_name.as_ref()),
            brands: as_text(self.brands.as_ref()),
            popularity_key: as_count(self.popularity_key.as_ref()),
            unique_scans_n: as_count(self.unique_scans_n.as_ref()),
            serving_size: as_text(self.serving_size.as_ref()),
            quantity: as_text(self.quantity.as_ref()),
            keywords: as_words(self.mongo_keywords.as_ref())
                .or_else(|| as_words(self.keywords.as_ref())),
            nutriments: as_nutriments(self.nutriments).map(Json),
        })
    }
}

impl MemoryOffRepository {
    pub fn new(mode: SearchMode, products: Vec<OffProduct>) -> Self {
        let products = products.into_iter().map(with_keywords).collect();
        Self { mode, products }
    }

    /// Parses one product per line. Blank lines are skipped; a bad line fails
    /// the whole load with its line number.
    pub fn from_json_lines(mode: SearchMode, reader: impl BufRead) -> FoodResult<Self> {
        let mut products = Vec::new();
        for (idx, line) in reader.lines().enumerate() {
            let lineno = idx + 1;
            let line = line.map_err(|e| FoodError::Dataset(format!("line {lineno}: {e}")))?;
            if line.trim().is_empty() {
                continue;
            }
            let parsed: DumpLine = serde_json::from_str(&line)
                .map_err(|e| FoodError::Dataset(format!("line {lineno}: {e}")))?;
            let product = parsed.into_product().ok_or_else(|| {
                FoodError::Dataset(format!("line {lineno}: product has no identifier"))
            })?;
            products.push(product);
        }
        Ok(Self::new(mode, products))
    }

    pub async fn load(mode: SearchMode, path: &Path) -> FoodResult<Self> {
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| FoodError::Dataset(format!("{}: {e}", path.display())))?;
        let repo = Self::from_json_lines(mode, text.as_bytes())?;
        info!(path = %path.display(), products = repo.len(), %mode, "bulk dump loaded");
        Ok(repo)
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    fn named(&self) -> impl Iterator<Item = &OffProduct> + '_ {
        self.products.iter().filter(|p| p.has_name())
    }

    fn search_regex(&self, query: &str) -> FoodResult<Vec<&OffProduct>> {
        let re = RegexBuilder::new(&search::substring_pattern(query))
            .case_insensitive(true)
            .build()
            .map_err(|e| FoodError::validation(e.to_string()))?;
        let hit = |s: &Option<String>| s.as_deref().is_some_and(|s| re.is_match(s));
        Ok(self
            .named()
            .filter(|p| hit(&p.product_name) || hit(&p.brands))
            .collect())
    }

    fn search_keyword(&self, query: &str) -> Vec<&OffProduct> {
        let tokens = search::keyword_tokens(query);
        if tokens.is_empty() {
            return Vec::new();
        }
        self.named()
            .filter(|p| {
                p.keywords
                    .as_deref()
                    .unwrap_or_default()
                    .iter()
                    .any(|k| tokens.contains(k))
            })
            .collect()
    }

    fn search_text(&self, query: &str, limit: usize) -> OffPage {
        let tokens = search::words(query);
        let mut scored: Vec<(usize, &OffProduct)> = self
            .named()
            .map(|p| (search::text_score(&tokens, &searchable_text(p)), p))
            .filter(|(score, _)| *score > 0)
            .collect();
        scored.sort_by(|(sa, a), (sb, b)| {
            sb.cmp(sa)
                .then_with(|| b.popularity().cmp(&a.popularity()))
                .then_with(|| a.id.cmp(&b.id))
        });
        OffPage {
            products: scored.into_iter().take(limit).map(|(_, p)| p.clone()).collect(),
            next_cursor: None,
        }
    }

    /// Sorts by `(key DESC, id ASC)`, skips up to the cursor and cuts one page.
    fn page(&self, mut hits: Vec<&OffProduct>, limit: usize, cursor: Option<&str>) -> OffPage {
        let mode = self.mode;
        if let Some(after) = cursor.and_then(SearchCursor::decode) {
            hits.retain(|p| after.admits(mode.sort_key(p), &p.id));
        }
        hits.sort_by(|a, b| by_key_then_id(mode, a, b));
        hits.truncate(limit);

        let next_cursor = match hits.last() {
            Some(last) if hits.len() == limit => {
                Some(SearchCursor::new(mode.sort_key(last), last.id.clone()).to_string())
            }
            _ => None,
        };
        OffPage {
            products: hits.into_iter().cloned().collect(),
            next_cursor,
        }
    }
}

fn by_key_then_id(mode: SearchMode, a: &OffProduct, b: &OffProduct) -> Ordering {
    mode.sort_key(b)
        .cmp(&mode.sort_key(a))
        .then_with(|| a.id.cmp(&b.id))
}

fn searchable_text(p: &OffProduct) -> String {
    format!(
        "{} {}",
        p.product_name.as_deref().unwrap_or_default(),
        p.brands.as_deref().unwrap_or_default()
    )
}

/// Lowercases stored keywords, or derives them from name and brand when the dump has none.
fn with_keywords(mut p: OffProduct) -> OffProduct {
    let stored: Vec<String> = p
        .keywords
        .take()
        .unwrap_or_default()
        .into_iter()
        .map(|k| k.trim().to_lowercase())
        .filter(|k| !k.is_empty())
        .collect();
    p.keywords = Some(if stored.is_empty() {
        search::words(&searchable_text(&p))
    } else {
        stored
    });
    p
}

#[async_trait]
impl BulkDatasetRepository for MemoryOffRepository {
    fn mode(&self) -> SearchMode {
        self.mode
    }

    async fn search(&self, query: &str, limit: usize, cursor: Option<&str>) -> FoodResult<OffPage> {
        let query = query.trim();
        if query.is_empty() || limit == 0 {
            return Ok(OffPage::default());
        }
        let page = match self.mode {
            SearchMode::Regex => self.page(self.search_regex(query)?, limit, cursor),
            SearchMode::Keyword => self.page(self.search_keyword(query), limit, cursor),
            SearchMode::Text => self.search_text(query, limit),
        };
        debug!(query, limit, hits = page.products.len(), mode = %self.mode, "memory bulk search");
        Ok(page)
    }

    async fn by_barcode(&self, code: &str) -> FoodResult<Option<OffProduct>> {
        let code = code.trim();
        if code.is_empty() {
            return Ok(None);
        }
        let by_code = self
            .named()
            .find(|p| p.code.as_deref().map(str::trim) == Some(code));
        Ok(by_code
            .or_else(|| self.named().find(|p| p.id == code))
            .cloned())
    }

    async fn ensure_indexes(&self) -> FoodResult<()> {
        Ok(())
    }
}
