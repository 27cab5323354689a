//! Meal model
//!
//! A named group of food entries inside one daily log.

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use super::FoodEntry;
use crate::db::DbResult;

/// Name given to the meal a new log starts with
pub const DEFAULT_MEAL_NAME: &str = "All Meals";

/// A named group of food entries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meal {
    pub id: String,
    pub name: String,
    pub food_items: Vec<FoodEntry>,
}

impl Meal {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            food_items: Vec::new(),
        }
    }

    /// The default meal every new log starts with
    pub fn default_meal() -> Self {
        Self::new(DEFAULT_MEAL_NAME)
    }

    pub fn contains_food(&self, food_id: &str) -> bool {
        self.food_items.iter().any(|f| f.id == food_id)
    }

    /// Remove every entry with this id, returning how many were removed
    pub fn remove_food(&mut self, food_id: &str) -> usize {
        let before = self.food_items.len();
        self.food_items.retain(|f| f.id != food_id);
        before - self.food_items.len()
    }

    /// Load all meals of a daily log, in order, with their entries
    pub(crate) fn load_for_log(conn: &Connection, daily_log_id: i64) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare(
            "SELECT row_id, meal_id, name FROM meals WHERE daily_log_id = ?1 ORDER BY position, row_id",
        )?;

        let rows = stmt
            .query_map([daily_log_id], |row: &Row| {
                Ok((
                    row.get::<_, i64>("row_id")?,
                    row.get::<_, String>("meal_id")?,
                    row.get::<_, String>("name")?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut entry_stmt = conn.prepare(
            "SELECT * FROM food_entries WHERE meal_row_id = ?1 ORDER BY position, row_id",
        )?;

        let mut meals = Vec::with_capacity(rows.len());
        for (row_id, id, name) in rows {
            let food_items = entry_stmt
                .query_map([row_id], FoodEntry::from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            meals.push(Meal { id, name, food_items });
        }

        Ok(meals)
    }

    /// Insert this meal and its entries under a daily log
    pub(crate) fn insert(&self, conn: &Connection, daily_log_id: i64, position: usize) -> DbResult<()> {
        conn.execute(
            "INSERT INTO meals (daily_log_id, meal_id, name, position) VALUES (?1, ?2, ?3, ?4)",
            params![daily_log_id, self.id, self.name, position as i64],
        )?;
        let meal_row_id = conn.last_insert_rowid();

        let mut stmt = conn.prepare(
            r#"
            INSERT INTO food_entries (
                meal_row_id, entry_id, name, calories, protein, carbs, fat,
                serving_size, serving_weight, timestamp, position
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )?;

        for (i, entry) in self.food_items.iter().enumerate() {
            stmt.execute(params![
                meal_row_id,
                entry.id,
                entry.name,
                entry.nutrients.calories,
                entry.nutrients.protein,
                entry.nutrients.carbs,
                entry.nutrients.fat,
                entry.serving_size,
                entry.serving_weight,
                entry.timestamp.map(|t| t.to_rfc3339()),
                i as i64,
            ])?;
        }

        Ok(())
    }
}
