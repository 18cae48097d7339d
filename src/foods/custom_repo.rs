use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::{types::Json, PgPool};
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::foods::dto::{CreateFoodRequest, FoodRecord};
use crate::foods::error::{FoodError, FoodResult};
use crate::foods::normalize;
use crate::foods::repo::CustomFoodStore;
use crate::foods::repo_types::CustomFoodRow;

const COLUMNS: &str = r#"
    id, name, brand, barcode,
    kcal_per_100g::float8      AS kcal_per_100g,
    protein_g_per_100g::float8 AS protein_g_per_100g,
    fat_g_per_100g::float8     AS fat_g_per_100g,
    carbs_g_per_100g::float8   AS carbs_g_per_100g,
    fiber_g_per_100g::float8   AS fiber_g_per_100g,
    sugar_g_per_100g::float8   AS sugar_g_per_100g,
    salt_g_per_100g::float8    AS salt_g_per_100g,
    serving_g::float8          AS serving_g,
    nutriments,
    verified
"#;

const UNIQUE_VIOLATION: &str = "23505";

/// Custom foods in Postgres (`foods_custom`).
#[derive(Clone)]
pub struct PgCustomFoodStore {
    db: PgPool,
}

impl PgCustomFoodStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

/// Bulk-dataset shaped nutriment map stored alongside the row. Caller extras
/// go in first so the typed fields always win.
pub(crate) fn build_nutriments(req: &CreateFoodRequest) -> HashMap<String, f64> {
    let mut out: HashMap<String, f64> = req
        .nutriments
        .iter()
        .map(|(k, v)| (k.trim().to_string(), *v))
        .filter(|(k, v)| !k.is_empty() && v.is_finite())
        .collect();

    let typed = [
        (normalize::KCAL[0], Some(req.kcal_per_100g)),
        (normalize::PROTEIN[0], Some(req.protein_per_100g)),
        (normalize::CARBS[0], Some(req.carbs_per_100g)),
        (normalize::FAT[0], Some(req.fat_per_100g)),
        (normalize::FIBER[0], req.fiber_per_100g),
        (normalize::SUGAR[0], req.sugar_per_100g),
        (normalize::SALT[0], req.salt_per_100g),
        (normalize::SODIUM[0], req.sodium_per_100g),
        (normalize::SATURATED_FAT[0], req.saturated_fat_per_100g),
        (normalize::MONOUNSATURATED_FAT[0], req.monounsaturated_fat_per_100g),
        (normalize::POLYUNSATURATED_FAT[0], req.polyunsaturated_fat_per_100g),
        (normalize::ALPHA_LINOLENIC_ACID[0], req.alpha_linolenic_acid_per_100g),
    ];
    for (key, v) in typed {
        if let Some(v) = v {
            out.insert(key.to_string(), v);
        }
    }
    out
}

/// `ILIKE` pattern for a literal substring.
pub(crate) fn like_pattern(query: &str) -> String {
    let escaped = query
        .trim()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

fn map_insert_error(e: sqlx::Error) -> FoodError {
    let code = e.as_database_error().and_then(|d| d.code());
    if code.as_deref() == Some(UNIQUE_VIOLATION) {
        return FoodError::Conflict("barcode already exists".into());
    }
    FoodError::Database(e)
}

#[async_trait]
impl CustomFoodStore for PgCustomFoodStore {
    #[instrument(skip(self, req))]
    async fn create(&self, actor_id: &str, req: CreateFoodRequest) -> FoodResult<FoodRecord> {
        req.validate()?;
        let nutriments = build_nutriments(&req);

        let sql = format!(
            r#"
            INSERT INTO foods_custom
                (created_by_user_id, name, brand, barcode,
                 kcal_per_100g, protein_g_per_100g, fat_g_per_100g, carbs_g_per_100g,
                 fiber_g_per_100g, sugar_g_per_100g, salt_g_per_100g,
                 serving_g, nutriments)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING {COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, CustomFoodRow>(&sql)
            .bind(actor_id)
            .bind(req.name.trim())
            .bind(normalize::clean(req.brand.as_deref()))
            .bind(normalize::clean(req.barcode.as_deref()))
            .bind(req.kcal_per_100g)
            .bind(req.protein_per_100g)
            .bind(req.fat_per_100g)
            .bind(req.carbs_per_100g)
            .bind(req.fiber_per_100g)
            .bind(req.sugar_per_100g)
            .bind(req.salt_per_100g)
            .bind(req.serving_g)
            .bind(Json(nutriments))
            .fetch_one(&self.db)
            .await
            .map_err(|e| {
                let err = map_insert_error(e);
                warn!(error = %err, actor_id, "insert custom food failed");
                err
            })?;

        debug!(id = %row.id, "custom food created");
        Ok(row.into())
    }

    async fn by_barcode(&self, code: &str) -> FoodResult<Option<FoodRecord>> {
        let code = code.trim();
        if code.is_empty() {
            return Ok(None);
        }
        let sql = format!("SELECT {COLUMNS} FROM foods_custom WHERE barcode = $1 LIMIT 1");
        let row = sqlx::query_as::<_, CustomFoodRow>(&sql)
            .bind(code)
            .fetch_optional(&self.db)
            .await?;
        Ok(row.map(Into::into))
    }

    async fn search(&self, query: &str, limit: usize) -> FoodResult<Vec<FoodRecord>> {
        let query = query.trim();
        if query.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }
        let sql = format!(
            r#"
            SELECT {COLUMNS}
            FROM foods_custom
            WHERE name ILIKE $1
               OR (brand IS NOT NULL AND brand ILIKE $1)
            ORDER BY verified DESC, created_at DESC, id
            LIMIT $2
            "#
        );
        let rows = sqlx::query_as::<_, CustomFoodRow>(&sql)
            .bind(like_pattern(query))
            .bind(i64::try_from(limit).unwrap_or(i64::MAX))
            .fetch_all(&self.db)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn by_id(&self, id: &str) -> FoodResult<Option<FoodRecord>> {
        // Not a UUID means it cannot exist.
        let Ok(id) = Uuid::parse_str(id.trim()) else {
            return Ok(None);
        };
        let sql = format!("SELECT {COLUMNS} FROM foods_custom WHERE id = $1");
        let row = sqlx::query_as::<_, CustomFoodRow>(&sql)
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
        Ok(row.map(Into::into))
    }
}
