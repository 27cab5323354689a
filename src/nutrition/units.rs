//! Unit types and conversion constants
//!
//! Serving units accepted for custom serving sizes, plus the standard energy and body
//! measurement factors used across the nutrition module.

use serde::{Deserialize, Serialize};

// ============================================================================
// Weight Conversion Constants (to grams)
// ============================================================================

/// Grams per milligram
pub const G_PER_MG: f64 = 0.001;
/// Grams per kilogram
pub const G_PER_KG: f64 = 1000.0;
/// Grams per ounce
pub const G_PER_OZ: f64 = 28.3495;
/// Grams per pound
pub const G_PER_LB: f64 = 453.592;

/// Base serving weight assumed when a food carries none
pub const DEFAULT_SERVING_WEIGHT_G: f64 = 100.0;

// ============================================================================
// Energy Constants (Atwater factors)
// ============================================================================

pub const KCAL_PER_G_PROTEIN: f64 = 4.0;
pub const KCAL_PER_G_CARBS: f64 = 4.0;
pub const KCAL_PER_G_FAT: f64 = 9.0;

// ============================================================================
// Body Measurement Constants
// ============================================================================

/// Kilograms per pound (body weight is stored in pounds)
pub const KG_PER_LB: f64 = 0.453592;
/// Centimeters per inch (height is stored in centimeters)
pub const CM_PER_INCH: f64 = 2.54;

/// Unit of a user-entered custom serving size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServingUnit {
    #[default]
    #[serde(rename = "g")]
    Grams,
    #[serde(rename = "oz")]
    Ounces,
}

impl ServingUnit {
    /// Short suffix used in serving labels ("g", "oz")
    pub fn suffix(&self) -> &'static str {
        match self {
            ServingUnit::Grams => "g",
            ServingUnit::Ounces => "oz",
        }
    }

    /// Parse a unit string; anything unrecognised yields None
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "g" | "gram" | "grams" => Some(ServingUnit::Grams),
            "oz" | "ounce" | "ounces" => Some(ServingUnit::Ounces),
            _ => None,
        }
    }

    /// Pick the unit a serving label is expressed in ("1 oz" -> Ounces, everything else -> Grams)
    pub fn infer_from_label(label: &str) -> Self {
        if label.contains("oz") {
            ServingUnit::Ounces
        } else {
            ServingUnit::Grams
        }
    }

    /// Convert an amount in this unit to grams
    pub fn to_grams(&self, amount: f64) -> f64 {
        match self {
            ServingUnit::Grams => amount,
            ServingUnit::Ounces => amount * G_PER_OZ,
        }
    }
}

/// Get the conversion factor to grams for a weight unit
pub fn grams_per_unit(unit: &str) -> Option<f64> {
    let lower = unit.to_lowercase();
    let trimmed = lower.trim();

    match trimmed {
        "g" | "gram" | "grams" => Some(1.0),
        "mg" | "milligram" | "milligrams" => Some(G_PER_MG),
        "kg" | "kilogram" | "kilograms" => Some(G_PER_KG),
        "oz" | "ounce" | "ounces" => Some(G_PER_OZ),
        "lb" | "lbs" | "pound" | "pounds" => Some(G_PER_LB),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serving_unit_parsing() {
        assert_eq!(ServingUnit::from_str("g"), Some(ServingUnit::Grams));
        assert_eq!(ServingUnit::from_str(" OZ "), Some(ServingUnit::Ounces));
        assert_eq!(ServingUnit::from_str("ounces"), Some(ServingUnit::Ounces));
        assert_eq!(ServingUnit::from_str("cup"), None);
    }

    #[test]
    fn test_ounces_to_grams() {
        let grams = ServingUnit::Ounces.to_grams(2.0);
        assert!((grams - 56.699).abs() < 0.001);
        assert_eq!(ServingUnit::Grams.to_grams(42.0), 42.0);
    }

    #[test]
    fn test_infer_from_label() {
        assert_eq!(ServingUnit::infer_from_label("1 oz"), ServingUnit::Ounces);
        assert_eq!(ServingUnit::infer_from_label("1 slice"), ServingUnit::Grams);
        assert_eq!(ServingUnit::infer_from_label("100g"), ServingUnit::Grams);
    }

    #[test]
    fn test_grams_per_unit() {
        assert_eq!(grams_per_unit("g"), Some(1.0));
        assert_eq!(grams_per_unit("oz"), Some(G_PER_OZ));
        assert_eq!(grams_per_unit("lb"), Some(G_PER_LB));
        assert_eq!(grams_per_unit("tbsp"), None);
    }
}
