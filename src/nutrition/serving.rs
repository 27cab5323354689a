//! Serving-size normalization
//!
//! Scales a food entry's base-serving nutrients to the quantity and serving size the
//! user asked for. Inputs arrive as raw user text; anything unusable falls back to a
//! default instead of failing.

use serde::{Deserialize, Serialize};

use super::parser::parse_quantity;
use super::units::{grams_per_unit, ServingUnit};
use crate::models::{FoodEntry, Nutrients};

/// User-entered serving adjustment
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServingRequest {
    /// Number of servings, as typed; empty or invalid means 1
    #[serde(default)]
    pub quantity: Option<String>,
    /// Custom serving amount, as typed; None keeps the base serving
    #[serde(default)]
    pub custom_serving: Option<String>,
    /// Unit of the custom serving amount
    #[serde(default)]
    pub unit: ServingUnit,
}

impl ServingRequest {
    pub fn servings(quantity: impl Into<String>) -> Self {
        Self {
            quantity: Some(quantity.into()),
            ..Default::default()
        }
    }

    pub fn custom(quantity: impl Into<String>, amount: impl Into<String>, unit: ServingUnit) -> Self {
        Self {
            quantity: Some(quantity.into()),
            custom_serving: Some(amount.into()),
            unit,
        }
    }
}

/// Result of a serving adjustment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdjustedServing {
    pub nutrients: Nutrients,
    pub serving_size: String,
    /// Resolved serving weight in grams
    pub serving_weight: f64,
    pub scale_factor: f64,
}

impl AdjustedServing {
    /// The entry re-expressed at this serving, keeping its id and name
    pub fn apply_to(&self, entry: &FoodEntry) -> FoodEntry {
        FoodEntry {
            nutrients: self.nutrients,
            serving_size: self.serving_size.clone(),
            serving_weight: self.serving_weight,
            ..entry.clone()
        }
    }
}

/// Parse the servings multiplier; empty, unparseable, negative, or non-finite means 1
fn parse_multiplier(quantity: Option<&str>) -> f64 {
    match quantity.map(str::trim) {
        Some(q) if !q.is_empty() => match q.parse::<f64>() {
            Ok(v) if v.is_finite() && v >= 0.0 => v,
            _ => 1.0,
        },
        _ => 1.0,
    }
}

/// Integer form of a weight for labels ("56.7" -> "56")
fn format_weight(amount: f64) -> String {
    format!("{}", amount.trunc() as i64)
}

/// Scale an entry to the requested serving
///
/// Scale factor is `(target grams / base grams) * quantity`, where the base weight
/// defaults to 100g when missing or non-positive.
pub fn adjust_serving(entry: &FoodEntry, request: &ServingRequest) -> AdjustedServing {
    let base_weight = entry.base_serving_weight();
    let multiplier = parse_multiplier(request.quantity.as_deref());

    let custom_amount = request
        .custom_serving
        .as_deref()
        .map(parse_quantity)
        .filter(|amount| *amount > 0.0);

    let (target_weight, serving_size) = match (request.custom_serving.as_deref(), custom_amount) {
        (_, Some(amount)) => (
            request.unit.to_grams(amount),
            format!("{}{}", format_weight(amount), request.unit.suffix()),
        ),
        (Some(raw), None) => {
            tracing::warn!("Ignoring custom serving '{}', using base weight", raw);
            (base_weight, format!("{}g", format_weight(base_weight)))
        }
        (None, None) => (base_weight, format!("{}g", format_weight(base_weight))),
    };

    let scale_factor = (target_weight / base_weight) * multiplier;

    AdjustedServing {
        nutrients: entry.nutrients.scale(scale_factor).sanitized(),
        serving_size,
        serving_weight: target_weight,
        scale_factor,
    }
}

/// Parse a serving weight written as text, e.g. `"30 g"`, `"1.5oz"` or `"1 bar (40g)"`
///
/// A parenthesised weight wins over the leading amount. Returns None when no weight
/// unit can be recognised.
pub fn parse_weight_text(text: &str) -> Option<f64> {
    let trimmed = text.trim();

    if let (Some(open), Some(close)) = (trimmed.find('('), trimmed.rfind(')')) {
        if open < close {
            if let Some(grams) = parse_amount_with_unit(&trimmed[open + 1..close]) {
                return Some(grams);
            }
        }
    }

    parse_amount_with_unit(trimmed)
}

fn parse_amount_with_unit(s: &str) -> Option<f64> {
    let s = s.trim();
    let split_at = s
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(s.len());
    let (number, unit) = s.split_at(split_at);

    let amount: f64 = number.parse().ok()?;
    let unit = unit.trim();
    let factor = if unit.is_empty() { 1.0 } else { grams_per_unit(unit)? };
    let grams = amount * factor;
    (grams.is_finite() && grams > 0.0).then_some(grams)
}
