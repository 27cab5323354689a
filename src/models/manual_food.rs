//! Manual food model
//!
//! Barcode products the user typed in themselves after a failed lookup.

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use super::{FoodEntry, Nutrients};
use crate::db::DbResult;
use crate::nutrition::units::DEFAULT_SERVING_WEIGHT_G;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManualFood {
    pub barcode: String,
    pub name: String,
    pub calories: f64,
}

impl ManualFood {
    pub fn new(barcode: impl Into<String>, name: impl Into<String>, calories: f64) -> Self {
        Self {
            barcode: barcode.into(),
            name: name.into(),
            calories,
        }
    }

    /// One serving of this food, identified by its barcode
    pub fn to_food_entry(&self) -> FoodEntry {
        FoodEntry::new(
            self.barcode.clone(),
            self.name.clone(),
            Nutrients::new(self.calories, 0.0, 0.0, 0.0),
            "1 serving",
            DEFAULT_SERVING_WEIGHT_G,
        )
    }

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            barcode: row.get("barcode")?,
            name: row.get("name")?,
            calories: row.get("calories")?,
        })
    }

    /// Save, replacing any earlier entry for the same barcode
    pub fn save(&self, conn: &Connection) -> DbResult<()> {
        conn.execute(
            r#"
            INSERT INTO manual_foods (barcode, name, calories)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(barcode) DO UPDATE SET
                name = excluded.name,
                calories = excluded.calories,
                updated_at = datetime('now')
            "#,
            params![self.barcode, self.name, self.calories],
        )?;
        tracing::info!("Saved manual food {} ({})", self.name, self.barcode);
        Ok(())
    }

    pub fn get_by_barcode(conn: &Connection, barcode: &str) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM manual_foods WHERE barcode = ?1")?;

        match stmt.query_row([barcode], Self::from_row) {
            Ok(food) => Ok(Some(food)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
