use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::foods::error::{FoodError, FoodResult};

/// Where a food record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FoodSource {
    /// Crowd-sourced bulk product dataset.
    Bulk,
    /// User-authored food.
    Custom,
}

/// Nutrient values per 100g. `None` means unknown, never zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Nutrients {
    pub kcal: Option<f64>,
    pub protein: Option<f64>,
    pub carbs: Option<f64>,
    pub fat: Option<f64>,

    pub fiber: Option<f64>,
    pub sugar: Option<f64>,
    pub salt: Option<f64>,
    pub sodium: Option<f64>,
    pub saturated_fat: Option<f64>,
    pub monounsaturated_fat: Option<f64>,
    pub polyunsaturated_fat: Option<f64>,
    pub alpha_linolenic_acid: Option<f64>,
}

/// Canonical food record shared by both sources.
///
/// Bulk records carry the raw `serving_size`/`quantity` strings and never
/// `serving_g`; custom records carry `serving_g` and never the raw strings.
/// Build records through [`FoodRecord::bulk`] and [`FoodRecord::custom`];
/// the source cannot change afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FoodRecord {
    source: FoodSource,
    pub id: String,
    pub name: String,
    pub brand: Option<String>,
    pub barcode: Option<String>,
    #[serde(flatten)]
    pub per_100g: Nutrients,
    pub serving_size: Option<String>,
    pub quantity: Option<String>,
    pub serving_g: Option<f64>,
    pub verified: bool,
}

impl FoodRecord {
    pub fn bulk(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(FoodSource::Bulk, id.into(), name.into())
    }

    pub fn custom(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(FoodSource::Custom, id.into(), name.into())
    }

    fn new(source: FoodSource, id: String, name: String) -> Self {
        Self {
            source,
            id,
            name: name.trim().to_string(),
            brand: None,
            barcode: None,
            per_100g: Nutrients::default(),
            serving_size: None,
            quantity: None,
            serving_g: None,
            verified: false,
        }
    }

    pub fn source(&self) -> FoodSource {
        self.source
    }
}

/// Body for creating a custom food.
///
/// The four macros are mandatory for custom foods. `nutriments` takes any
/// extra bulk-dataset style keys (e.g. `"vitamin-c_100g"`) and is stored as-is.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateFoodRequest {
    pub name: String,
    pub brand: Option<String>,
    pub barcode: Option<String>,

    pub kcal_per_100g: f64,
    pub protein_per_100g: f64,
    pub fat_per_100g: f64,
    pub carbs_per_100g: f64,

    pub fiber_per_100g: Option<f64>,
    pub sugar_per_100g: Option<f64>,
    pub salt_per_100g: Option<f64>,
    pub sodium_per_100g: Option<f64>,
    pub saturated_fat_per_100g: Option<f64>,
    pub monounsaturated_fat_per_100g: Option<f64>,
    pub polyunsaturated_fat_per_100g: Option<f64>,
    pub alpha_linolenic_acid_per_100g: Option<f64>,

    pub serving_g: Option<f64>,

    #[serde(default)]
    pub nutriments: HashMap<String, f64>,
}

fn check_amount(field: &str, v: f64) -> FoodResult<()> {
    if !v.is_finite() || v < 0.0 {
        return Err(FoodError::validation(format!(
            "{field} must be a non-negative number"
        )));
    }
    Ok(())
}

impl CreateFoodRequest {
    /// Rejects blank names and amounts that are negative or not finite.
    pub fn validate(&self) -> FoodResult<()> {
        if self.name.trim().is_empty() {
            return Err(FoodError::validation("name required"));
        }
        check_amount("kcal_per_100g", self.kcal_per_100g)?;
        check_amount("protein_per_100g", self.protein_per_100g)?;
        check_amount("fat_per_100g", self.fat_per_100g)?;
        check_amount("carbs_per_100g", self.carbs_per_100g)?;
        let optional = [
            ("fiber_per_100g", self.fiber_per_100g),
            ("sugar_per_100g", self.sugar_per_100g),
            ("salt_per_100g", self.salt_per_100g),
            ("sodium_per_100g", self.sodium_per_100g),
            ("saturated_fat_per_100g", self.saturated_fat_per_100g),
            ("monounsaturated_fat_per_100g", self.monounsaturated_fat_per_100g),
            ("polyunsaturated_fat_per_100g", self.polyunsaturated_fat_per_100g),
            ("alpha_linolenic_acid_per_100g", self.alpha_linolenic_acid_per_100g),
        ];
        for (field, v) in optional {
            if let Some(v) = v {
                check_amount(field, v)?;
            }
        }
        if let Some(g) = self.serving_g {
            if !g.is_finite() || g <= 0.0 {
                return Err(FoodError::validation("serving_g must be positive"));
            }
        }
        Ok(())
    }
}

/// One page of search results.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SearchPage {
    pub items: Vec<FoodRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

impl SearchPage {
    pub fn empty() -> Self {
        Self::default()
    }
}
