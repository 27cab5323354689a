//! Nutrient text parsing
//!
//! Catalog search results describe nutrients as a pipe-delimited string such as
//! `"Per 100g - Calories: 250kcal | Fat: 10g | Carbs: 5g | Protein: 3g"`. Parsing is
//! best-effort: a segment that fails to parse leaves its nutrient at zero.

use crate::models::Nutrients;

const CALORIES_LABEL: &str = "Calories:";
const FAT_LABEL: &str = "Fat:";
const CARBS_LABEL: &str = "Carbs:";
const PROTEIN_LABEL: &str = "Protein:";

/// Which nutrient a description segment carries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Segment {
    Calories,
    Fat,
    Carbs,
    Protein,
}

impl Segment {
    /// First matching label wins; labels are case-sensitive
    fn classify(segment: &str) -> Option<Self> {
        if segment.contains(CALORIES_LABEL) {
            Some(Segment::Calories)
        } else if segment.contains(FAT_LABEL) {
            Some(Segment::Fat)
        } else if segment.contains(CARBS_LABEL) {
            Some(Segment::Carbs)
        } else if segment.contains(PROTEIN_LABEL) {
            Some(Segment::Protein)
        } else {
            None
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Segment::Calories => CALORIES_LABEL,
            Segment::Fat => FAT_LABEL,
            Segment::Carbs => CARBS_LABEL,
            Segment::Protein => PROTEIN_LABEL,
        }
    }

    fn unit(&self) -> &'static str {
        match self {
            Segment::Calories => "kcal",
            _ => "g",
        }
    }
}

/// Parse a nutrient description into calories/protein/carbs/fat
///
/// Examples:
/// - `None` -> all zeros
/// - `"Calories: 250 - 300kcal | Fat: 10g | Carbs: 5g | Protein: 3g"` -> (300, 3, 5, 10)
/// - `"Fat: abcg"` -> fat = 0
pub fn parse_nutrient_description(description: Option<&str>) -> Nutrients {
    let Some(description) = description else {
        return Nutrients::zero();
    };

    let mut nutrients = Nutrients::zero();

    for raw in description.split('|') {
        let segment = raw.trim();
        let Some(kind) = Segment::classify(segment) else {
            continue;
        };

        // Ranges like "250 - 300kcal" resolve to the value after the last '-'
        let value_part = match kind {
            Segment::Calories => segment.rsplit('-').next().unwrap_or(segment).trim(),
            _ => segment,
        };

        let cleaned = value_part
            .replace(kind.label(), "")
            .replace(kind.unit(), "");
        let value = parse_quantity(cleaned.trim());

        tracing::debug!("Parsed nutrient segment '{}' as {:?} = {}", segment, kind, value);

        match kind {
            Segment::Calories => nutrients.calories = value,
            Segment::Fat => nutrients.fat = value,
            Segment::Carbs => nutrients.carbs = value,
            Segment::Protein => nutrients.protein = value,
        }
    }

    nutrients
}

/// Parse a plain numeric quantity; anything unparseable, negative, or non-finite is zero
pub fn parse_quantity(s: &str) -> f64 {
    match s.trim().parse::<f64>() {
        Ok(v) if v.is_finite() && v >= 0.0 => v,
        _ => 0.0,
    }
}

/// Parse a numeric catalog field that may carry stray text ("12.5 g", "250kcal")
///
/// Keeps only ASCII digits and the decimal point before parsing.
pub fn parse_numeric_field(field: Option<&str>) -> f64 {
    let Some(field) = field else {
        return 0.0;
    };
    let cleaned: String = field
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    parse_quantity(&cleaned)
}
