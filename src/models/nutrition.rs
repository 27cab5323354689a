//! Shared nutrition data structures
//!
//! Used across food entries, meals, daily logs, and goal progress.

use serde::{Deserialize, Serialize};

/// Calories plus the three macronutrients, all per some quantity of food
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Nutrients {
    pub calories: f64, // kcal
    pub protein: f64,  // grams
    pub carbs: f64,    // grams
    pub fat: f64,      // grams
}

/// Macronutrient grams without calories
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Macros {
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

impl Nutrients {
    pub fn new(calories: f64, protein: f64, carbs: f64, fat: f64) -> Self {
        Self { calories, protein, carbs, fat }
    }

    pub fn zero() -> Self {
        Self::default()
    }

    /// Scale every value by a multiplier
    pub fn scale(&self, multiplier: f64) -> Self {
        Self {
            calories: self.calories * multiplier,
            protein: self.protein * multiplier,
            carbs: self.carbs * multiplier,
            fat: self.fat * multiplier,
        }
    }

    /// Replace negative or non-finite values with zero
    pub fn sanitized(&self) -> Self {
        Self {
            calories: non_negative(self.calories),
            protein: non_negative(self.protein),
            carbs: non_negative(self.carbs),
            fat: non_negative(self.fat),
        }
    }

    pub fn macros(&self) -> Macros {
        Macros {
            protein: self.protein,
            carbs: self.carbs,
            fat: self.fat,
        }
    }
}

/// Clamp a nutrient quantity into `[0, inf)`, mapping NaN/inf to zero
pub fn non_negative(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

impl std::ops::Add for Nutrients {
    type Output = Nutrients;

    fn add(self, other: Nutrients) -> Nutrients {
        Nutrients {
            calories: self.calories + other.calories,
            protein: self.protein + other.protein,
            carbs: self.carbs + other.carbs,
            fat: self.fat + other.fat,
        }
    }
}

impl std::ops::Mul<f64> for Nutrients {
    type Output = Nutrients;

    fn mul(self, multiplier: f64) -> Nutrients {
        self.scale(multiplier)
    }
}

impl std::iter::Sum for Nutrients {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Nutrients::zero(), |acc, n| acc + n)
    }
}

impl<'a> std::iter::Sum<&'a Nutrients> for Nutrients {
    fn sum<I: Iterator<Item = &'a Nutrients>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitized_clamps_negative_and_nan() {
        let n = Nutrients::new(-5.0, f64::NAN, 3.0, f64::INFINITY).sanitized();
        assert_eq!(n, Nutrients::new(0.0, 0.0, 3.0, 0.0));
    }

    #[test]
    fn test_sum_and_scale() {
        let total: Nutrients = vec![Nutrients::new(100.0, 1.0, 2.0, 3.0), Nutrients::new(50.0, 1.0, 1.0, 1.0)]
            .into_iter()
            .sum();
        assert_eq!(total, Nutrients::new(150.0, 2.0, 3.0, 4.0));
        assert_eq!(total * 2.0, Nutrients::new(300.0, 4.0, 6.0, 8.0));
    }
}
