//! Food lookup MCP tools
//!
//! Catalog search, barcode resolution, manual foods, and the pure nutrient helpers.

use serde::Serialize;

use crate::catalog::{CatalogChain, CatalogError};
use crate::db::Database;
use crate::models::{FoodEntry, ManualFood, Nutrients};
use crate::nutrition::{self, AdjustedServing, ServingRequest};

/// Response for search_foods
#[derive(Debug, Serialize)]
pub struct SearchFoodsResponse {
    pub query: String,
    pub foods: Vec<FoodEntry>,
    pub total: usize,
}

/// Response for lookup_barcode
#[derive(Debug, Serialize)]
pub struct BarcodeLookupResponse {
    pub barcode: String,
    /// "manual", or the name of the catalog that resolved it
    pub source: String,
    pub food: FoodEntry,
}

/// Parse a catalog nutrient description
pub fn parse_nutrient_description(description: Option<&str>) -> Nutrients {
    nutrition::parse_nutrient_description(description)
}

/// Scale a food to a requested serving without logging it
pub fn adjust_serving(entry: &FoodEntry, request: &ServingRequest) -> AdjustedServing {
    nutrition::adjust_serving(entry, request)
}

/// Search the configured catalogs
pub async fn search_foods(catalogs: &CatalogChain, query: &str) -> Result<SearchFoodsResponse, String> {
    let foods = catalogs
        .search(query)
        .await
        .map_err(|e| format!("Food search failed: {}", e))?;

    Ok(SearchFoodsResponse {
        query: query.to_string(),
        total: foods.len(),
        foods,
    })
}

/// Resolve a barcode: saved manual foods first, then each catalog in order
pub async fn lookup_barcode(db: &Database, catalogs: &CatalogChain, barcode: &str) -> Result<BarcodeLookupResponse, String> {
    let barcode = barcode.trim();
    if barcode.is_empty() {
        return Err("Barcode is required".to_string());
    }

    let manual = {
        let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
        ManualFood::get_by_barcode(&conn, barcode).map_err(|e| format!("Failed to check manual foods: {}", e))?
    };
    if let Some(food) = manual {
        return Ok(BarcodeLookupResponse {
            barcode: barcode.to_string(),
            source: "manual".to_string(),
            food: food.to_food_entry(),
        });
    }

    match catalogs.lookup_barcode(barcode).await {
        Ok((source, food)) => Ok(BarcodeLookupResponse {
            barcode: barcode.to_string(),
            source: source.to_string(),
            food,
        }),
        Err(CatalogError::NoData) => Err(format!(
            "No food found for barcode {}; save it with save_manual_food",
            barcode
        )),
        Err(e) => Err(format!("Barcode lookup failed: {}", e)),
    }
}

/// Save a user-entered food for a barcode, replacing any earlier one
pub fn save_manual_food(db: &Database, barcode: &str, name: &str, calories: f64) -> Result<FoodEntry, String> {
    let barcode = barcode.trim();
    let name = name.trim();
    if barcode.is_empty() || name.is_empty() {
        return Err("Barcode and name are required".to_string());
    }
    if !calories.is_finite() || calories < 0.0 {
        return Err(format!("Calories must be a non-negative number, got {}", calories));
    }

    let food = ManualFood::new(barcode, name, calories);
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    food.save(&conn).map_err(|e| format!("Failed to save manual food: {}", e))?;
    Ok(food.to_food_entry())
}
