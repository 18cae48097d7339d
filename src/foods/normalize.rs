//! Bulk dataset -> canonical record mapping.
//!
//! Contributors send nutrient values as numbers, numeric strings with either
//! decimal separator, Mongo export wrappers, or free text like `"traces"`.
//! Everything here is total: anything that is not a usable number becomes
//! `None`, never `0.0`.

use serde_json::Value;

use crate::foods::dto::{FoodRecord, Nutrients};
use crate::foods::repo_types::{OffProduct, RawNutriments};

// Alias lists are ordered: per-100g keys first, then the bare keys.
pub const KCAL: &[&str] = &["energy-kcal_100g", "energy-kcal", "energy-kcal_value"];
pub const PROTEIN: &[&str] = &["proteins_100g", "proteins"];
pub const CARBS: &[&str] = &["carbohydrates_100g", "carbohydrates"];
pub const FAT: &[&str] = &["fat_100g", "fat"];
pub const FIBER: &[&str] = &["fiber_100g", "fiber"];
pub const SUGAR: &[&str] = &["sugars_100g", "sugars"];
pub const SALT: &[&str] = &["salt_100g", "salt"];
pub const SODIUM: &[&str] = &["sodium_100g", "sodium"];
pub const SATURATED_FAT: &[&str] = &["saturated-fat_100g", "saturated-fat"];
pub const MONOUNSATURATED_FAT: &[&str] = &["monounsaturated-fat_100g", "monounsaturated-fat"];
pub const POLYUNSATURATED_FAT: &[&str] = &["polyunsaturated-fat_100g", "polyunsaturated-fat"];
pub const ALPHA_LINOLENIC_ACID: &[&str] = &["alpha-linolenic-acid_100g", "alpha-linolenic-acid"];

/// Textual values meaning "present but negligible". They are not a measured zero.
const NEGLIGIBLE: &[&str] = &["trace", "traces", "<0.1", "<0,1"];

/// Mongo extended-JSON wrappers found in dataset exports.
const NUMBER_WRAPPERS: &[&str] = &["$numberDecimal", "$numberDouble", "$numberInt", "$numberLong"];

/// First alias that is present and parses to a finite number.
pub fn pick(raw: &RawNutriments, aliases: &[&str]) -> Option<f64> {
    aliases
        .iter()
        .find_map(|k| raw.get(*k).and_then(parse_nutrient))
}

pub fn parse_nutrient(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64().filter(|f| f.is_finite()),
        Value::String(s) => parse_numeric_str(s),
        Value::Object(m) if m.len() == 1 => NUMBER_WRAPPERS
            .iter()
            .find_map(|w| m.get(*w))
            .and_then(parse_nutrient),
        _ => None,
    }
}

fn parse_numeric_str(s: &str) -> Option<f64> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    let lower = s.to_lowercase();
    if NEGLIGIBLE.contains(&lower.as_str()) {
        return None;
    }
    lower
        .replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|f| f.is_finite())
}

pub fn nutrients_from_raw(raw: &RawNutriments) -> Nutrients {
    Nutrients {
        kcal: pick(raw, KCAL),
        protein: pick(raw, PROTEIN),
        carbs: pick(raw, CARBS),
        fat: pick(raw, FAT),
        fiber: pick(raw, FIBER),
        sugar: pick(raw, SUGAR),
        salt: pick(raw, SALT),
        sodium: pick(raw, SODIUM),
        saturated_fat: pick(raw, SATURATED_FAT),
        monounsaturated_fat: pick(raw, MONOUNSATURATED_FAT),
        polyunsaturated_fat: pick(raw, POLYUNSATURATED_FAT),
        alpha_linolenic_acid: pick(raw, ALPHA_LINOLENIC_ACID),
    }
}

/// Trimmed copy, `None` when blank.
pub fn clean(s: Option<&str>) -> Option<String> {
    s.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
}

/// Maps a bulk product to the canonical shape. Products without a usable
/// name yield `None`: they cannot be shown to anyone.
pub fn off_product_to_record(p: &OffProduct) -> Option<FoodRecord> {
    let name = clean(p.product_name.as_deref())?;

    let mut rec = FoodRecord::bulk(p.id.clone(), name);
    // Some dumps only keep the barcode as the primary key.
    rec.barcode = clean(p.code.as_deref()).or_else(|| clean(Some(&p.id)));
    rec.brand = clean(p.brands.as_deref());
    rec.serving_size = clean(p.serving_size.as_deref());
    rec.quantity = clean(p.quantity.as_deref());
    if let Some(raw) = p.raw_nutriments() {
        rec.per_100g = nutrients_from_raw(raw);
    }
    Some(rec)
}
