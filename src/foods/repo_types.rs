use std::collections::HashMap;

use serde_json::Value;
use sqlx::{types::Json, FromRow};
use uuid::Uuid;

use crate::foods::dto::FoodRecord;
use crate::foods::normalize;

/// Raw nutriment map as stored by the bulk dataset: keys like `"proteins_100g"`,
/// values of whatever type the contributor happened to send.
pub type RawNutriments = HashMap<String, Value>;

/// A product row of the bulk dataset, before normalization.
#[derive(Debug, Clone, Default, FromRow)]
pub struct OffProduct {
    pub id: String,
    pub code: Option<String>,
    pub product_name: Option<String>,
    pub brands: Option<String>,
    pub popularity_key: Option<i64>,
    pub unique_scans_n: Option<i64>,
    pub serving_size: Option<String>,
    pub quantity: Option<String>,
    pub keywords: Option<Vec<String>>,
    pub nutriments: Option<Json<RawNutriments>>,
}

impl OffProduct {
    /// Sort key for regex mode and cursors; missing counts as 0.
    pub fn popularity(&self) -> i64 {
        self.popularity_key.unwrap_or(0)
    }

    /// Sort key for keyword mode; missing counts as 0.
    pub fn scans(&self) -> i64 {
        self.unique_scans_n.unwrap_or(0)
    }

    pub fn has_name(&self) -> bool {
        self.product_name
            .as_deref()
            .is_some_and(|n| !n.trim().is_empty())
    }

    pub fn raw_nutriments(&self) -> Option<&RawNutriments> {
        self.nutriments.as_ref().map(|j| &j.0)
    }
}

/// Row of `foods_custom`.
#[derive(Debug, Clone, FromRow)]
pub struct CustomFoodRow {
    pub id: Uuid,
    pub name: String,
    pub brand: Option<String>,
    pub barcode: Option<String>,
    pub kcal_per_100g: f64,
    pub protein_g_per_100g: f64,
    pub fat_g_per_100g: f64,
    pub carbs_g_per_100g: f64,
    pub fiber_g_per_100g: Option<f64>,
    pub sugar_g_per_100g: Option<f64>,
    pub salt_g_per_100g: Option<f64>,
    pub serving_g: Option<f64>,
    pub nutriments: Option<Json<RawNutriments>>,
    pub verified: bool,
}

impl From<CustomFoodRow> for FoodRecord {
    fn from(r: CustomFoodRow) -> Self {
        let mut rec = FoodRecord::custom(r.id.to_string(), r.name);
        rec.brand = normalize::clean(r.brand.as_deref());
        rec.barcode = normalize::clean(r.barcode.as_deref());
        rec.serving_g = r.serving_g;
        rec.verified = r.verified;

        // Nutrients without a dedicated column live in the jsonb map under bulk keys.
        let extras = r
            .nutriments
            .map(|j| normalize::nutrients_from_raw(&j.0))
            .unwrap_or_default();

        let n = &mut rec.per_100g;
        n.kcal = Some(r.kcal_per_100g);
        n.protein = Some(r.protein_g_per_100g);
        n.fat = Some(r.fat_g_per_100g);
        n.carbs = Some(r.carbs_g_per_100g);
        n.fiber = r.fiber_g_per_100g.or(extras.fiber);
        n.sugar = r.sugar_g_per_100g.or(extras.sugar);
        n.salt = r.salt_g_per_100g.or(extras.salt);
        n.sodium = extras.sodium;
        n.saturated_fat = extras.saturated_fat;
        n.monounsaturated_fat = extras.monounsaturated_fat;
        n.polyunsaturated_fat = extras.polyunsaturated_fat;
        n.alpha_linolenic_acid = extras.alpha_linolenic_acid;
        rec
    }
}
