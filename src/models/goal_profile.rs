//! Goal profile model
//!
//! Per-user calorie and macro targets, plus body measurements used by the
//! calorie calculator.

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::Macros;
use crate::db::DbResult;
use crate::nutrition::units::{CM_PER_INCH, KCAL_PER_G_CARBS, KCAL_PER_G_FAT, KCAL_PER_G_PROTEIN};

/// Calorie goal written when a profile is saved before one was ever set
pub const FALLBACK_CALORIE_GOAL: f64 = 2000.0;

const PERCENT_TOLERANCE: f64 = 1e-9;

/// Goal configuration errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GoalError {
    #[error("Macro percentages must sum to 100 (got {0})")]
    PercentagesNotHundred(f64),
}

/// Macro split as percentages of the calorie goal
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MacroSplit {
    pub protein_pct: f64,
    pub carbs_pct: f64,
    pub fat_pct: f64,
}

impl Default for MacroSplit {
    fn default() -> Self {
        Self {
            protein_pct: 30.0,
            carbs_pct: 50.0,
            fat_pct: 20.0,
        }
    }
}

impl MacroSplit {
    pub fn total(&self) -> f64 {
        self.protein_pct + self.carbs_pct + self.fat_pct
    }

    pub fn validate(&self) -> Result<(), GoalError> {
        let total = self.total();
        if (total - 100.0).abs() > PERCENT_TOLERANCE {
            return Err(GoalError::PercentagesNotHundred(total));
        }
        Ok(())
    }
}

/// A user's nutrition targets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalProfile {
    pub user_id: String,
    /// Absent until first computed or saved
    pub calories: Option<f64>,
    pub macros: Macros,
    pub split: MacroSplit,
    /// Body weight in pounds
    pub weight: f64,
    /// Height in centimeters
    pub height: f64,
}

impl GoalProfile {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            calories: None,
            macros: Macros {
                protein: 150.0,
                carbs: 250.0,
                fat: 70.0,
            },
            split: MacroSplit::default(),
            weight: 150.0,
            height: 170.0,
        }
    }

    /// Recompute macro grams from the calorie goal and split
    ///
    /// Refuses with an error, leaving grams untouched, when the split does not sum
    /// to 100. Returns `Ok(None)` without changes when no calorie goal is set.
    pub fn update_macros(&mut self) -> Result<Option<Macros>, GoalError> {
        self.split.validate()?;

        let Some(calories) = self.calories else {
            return Ok(None);
        };

        self.macros = Macros {
            protein: self.split.protein_pct / 100.0 * calories / KCAL_PER_G_PROTEIN,
            carbs: self.split.carbs_pct / 100.0 * calories / KCAL_PER_G_CARBS,
            fat: self.split.fat_pct / 100.0 * calories / KCAL_PER_G_FAT,
        };
        Ok(Some(self.macros))
    }

    /// Height as whole feet and remaining inches
    pub fn height_feet_inches(&self) -> (i64, i64) {
        // Nudge so heights set via set_height_feet_inches survive float rounding
        let total_inches = (self.height / CM_PER_INCH + 1e-9).floor() as i64;
        (total_inches / 12, total_inches % 12)
    }

    pub fn set_height_feet_inches(&mut self, feet: i64, inches: i64) {
        self.height = (feet * 12 + inches) as f64 * CM_PER_INCH;
    }

    // ========================================================================
    // Persistence
    // ========================================================================

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            user_id: row.get("user_id")?,
            calories: row.get("calories")?,
            macros: Macros {
                protein: row.get("protein")?,
                carbs: row.get("carbs")?,
                fat: row.get("fat")?,
            },
            split: MacroSplit {
                protein_pct: row.get("protein_pct")?,
                carbs_pct: row.get("carbs_pct")?,
                fat_pct: row.get("fat_pct")?,
            },
            weight: row.get("weight")?,
            height: row.get("height")?,
        })
    }

    /// Load a user's profile, falling back to defaults when none is stored
    ///
    /// Macros are recomputed after loading; a stored split that no longer sums to
    /// 100 keeps its stored grams.
    pub fn load(conn: &Connection, user_id: &str) -> DbResult<Self> {
        let mut stmt = conn.prepare("SELECT * FROM goal_profiles WHERE user_id = ?1")?;

        let mut profile = match stmt.query_row([user_id], Self::from_row) {
            Ok(profile) => profile,
            Err(rusqlite::Error::QueryReturnedNoRows) => Self::new(user_id),
            Err(e) => return Err(e.into()),
        };

        if let Err(e) = profile.update_macros() {
            tracing::warn!("Stored goals for {} are inconsistent: {}", user_id, e);
        }
        Ok(profile)
    }

    /// Recompute macros and persist, writing the fallback calorie goal if none is set
    ///
    /// The refusal from an invalid split is logged; the previous grams are saved as-is.
    pub fn save(&mut self, conn: &Connection) -> DbResult<()> {
        if let Err(e) = self.update_macros() {
            tracing::warn!("Saving goals for {} without recomputing macros: {}", self.user_id, e);
        }

        let calories = self.calories.unwrap_or(FALLBACK_CALORIE_GOAL);
        conn.execute(
            r#"
            INSERT INTO goal_profiles (
                user_id, calories, protein, carbs, fat,
                protein_pct, carbs_pct, fat_pct, weight, height
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            ON CONFLICT(user_id) DO UPDATE SET
                calories = excluded.calories,
                protein = excluded.protein,
                carbs = excluded.carbs,
                fat = excluded.fat,
                protein_pct = excluded.protein_pct,
                carbs_pct = excluded.carbs_pct,
                fat_pct = excluded.fat_pct,
                weight = excluded.weight,
                height = excluded.height,
                updated_at = datetime('now')
            "#,
            params![
                self.user_id,
                calories,
                self.macros.protein,
                self.macros.carbs,
                self.macros.fat,
                self.split.protein_pct,
                self.split.carbs_pct,
                self.split.fat_pct,
                self.weight,
                self.height,
            ],
        )?;

        tracing::info!("Saved goals for {}: {} kcal", self.user_id, calories);
        Ok(())
    }

    /// Update only the stored body weight, creating a default profile if needed
    pub(crate) fn store_weight(conn: &Connection, user_id: &str, weight: f64) -> DbResult<()> {
        let mut profile = Self::load(conn, user_id)?;
        profile.weight = weight;
        profile.save(conn)
    }
}
