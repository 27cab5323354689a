//! FatSecret proxy client
//!
//! Talks to a proxy that forwards `/search`, `/food` and `/barcode` to the
//! FatSecret platform API and returns its JSON unchanged.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use super::{
    fetch_text, http_client, normalize_base_url, CatalogError, CatalogResult, FoodCatalog,
    InFlight, OneOrMany, Scalar,
};
use crate::models::{FoodEntry, Nutrients};
use crate::nutrition::parse_nutrient_description;
use crate::nutrition::units::DEFAULT_SERVING_WEIGHT_G;

const UNKNOWN_NAME: &str = "Unknown";
const UNKNOWN_SERVING: &str = "N/A";

// ============================================================================
// Response DTOs
// ============================================================================

#[derive(Debug, Deserialize)]
struct SearchResponse {
    foods: Option<SearchFoods>,
}

#[derive(Debug, Deserialize)]
struct SearchFoods {
    food: Option<OneOrMany<SearchItem>>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    food_id: Scalar,
    food_name: Option<String>,
    brand_name: Option<String>,
    food_description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FoodResponse {
    food: Option<FoodDetail>,
}

#[derive(Debug, Deserialize)]
struct FoodDetail {
    food_id: Scalar,
    food_name: Option<String>,
    brand_name: Option<String>,
    servings: Option<Servings>,
}

#[derive(Debug, Deserialize)]
struct Servings {
    serving: Option<OneOrMany<Serving>>,
}

#[derive(Debug, Deserialize)]
struct Serving {
    calories: Option<Scalar>,
    protein: Option<Scalar>,
    carbohydrate: Option<Scalar>,
    fat: Option<Scalar>,
    serving_description: Option<String>,
    metric_serving_amount: Option<Scalar>,
}

#[derive(Debug, Deserialize)]
struct BarcodeResponse {
    food_id: Option<BarcodeValue>,
}

#[derive(Debug, Deserialize)]
struct BarcodeValue {
    value: Option<Scalar>,
}

// ============================================================================
// Payload parsing
// ============================================================================

fn scalar_id(id: &Scalar) -> String {
    match id {
        Scalar::Text(s) => s.clone(),
        Scalar::Number(n) => format!("{}", *n as i64),
    }
}

/// "<brand> <name>" when branded, otherwise the name, otherwise "Unknown"
fn display_name(brand: Option<&str>, name: Option<&str>) -> String {
    match (brand.map(str::trim).filter(|b| !b.is_empty()), name) {
        (Some(brand), name) => format!("{} {}", brand, name.unwrap_or("")).trim_end().to_string(),
        (None, Some(name)) => name.to_string(),
        (None, None) => UNKNOWN_NAME.to_string(),
    }
}

fn field(value: &Option<Scalar>) -> f64 {
    value.as_ref().map(Scalar::as_f64).unwrap_or(0.0)
}

/// Parse a `/search` response into entries
///
/// A missing `foods.food` list means no results.
pub fn parse_search_response(body: &str) -> CatalogResult<Vec<FoodEntry>> {
    let response: SearchResponse = serde_json::from_str(body)?;

    let items = response
        .foods
        .and_then(|f| f.food)
        .map(OneOrMany::into_vec)
        .unwrap_or_default();

    Ok(items
        .into_iter()
        .map(|item| {
            FoodEntry::new(
                scalar_id(&item.food_id),
                display_name(item.brand_name.as_deref(), item.food_name.as_deref()),
                parse_nutrient_description(item.food_description.as_deref()),
                UNKNOWN_SERVING,
                DEFAULT_SERVING_WEIGHT_G,
            )
        })
        .collect())
}

/// Parse a `/food` detail response using its first serving
pub fn parse_food_detail(body: &str) -> CatalogResult<FoodEntry> {
    let response: FoodResponse = serde_json::from_str(body)?;
    let food = response.food.ok_or(CatalogError::NoData)?;

    let serving = food
        .servings
        .and_then(|s| s.serving)
        .map(OneOrMany::into_vec)
        .and_then(|servings| servings.into_iter().next())
        .ok_or(CatalogError::NoData)?;

    let weight = match field(&serving.metric_serving_amount) {
        w if w > 0.0 => w,
        _ => DEFAULT_SERVING_WEIGHT_G,
    };

    Ok(FoodEntry::new(
        scalar_id(&food.food_id),
        display_name(food.brand_name.as_deref(), food.food_name.as_deref()),
        Nutrients::new(
            field(&serving.calories),
            field(&serving.protein),
            field(&serving.carbohydrate),
            field(&serving.fat),
        ),
        serving.serving_description.unwrap_or_else(|| UNKNOWN_SERVING.to_string()),
        weight,
    ))
}

/// Extract the food id from a `/barcode` response
pub fn parse_barcode_response(body: &str) -> CatalogResult<String> {
    let response: BarcodeResponse = serde_json::from_str(body)?;
    response
        .food_id
        .and_then(|f| f.value)
        .map(|v| scalar_id(&v))
        .filter(|id| !id.is_empty() && id != "0")
        .ok_or(CatalogError::NoData)
}

// ============================================================================
// Client
// ============================================================================

/// FatSecret proxy client
#[derive(Debug, Clone)]
pub struct FatSecretClient {
    base_url: String,
    client: reqwest::Client,
    in_flight: InFlight,
}

impl FatSecretClient {
    pub fn new(base_url: &str, timeout: Duration) -> CatalogResult<Self> {
        Ok(Self {
            base_url: normalize_base_url(base_url)?,
            client: http_client(timeout)?,
            in_flight: InFlight::default(),
        })
    }

    /// Fetch full details for one food id
    pub async fn food_details(&self, food_id: &str) -> CatalogResult<FoodEntry> {
        let request = self
            .client
            .get(format!("{}/food", self.base_url))
            .query(&[("food_id", food_id)]);
        let body = fetch_text(request).await?;
        tracing::debug!("FatSecret food {} response: {} bytes", food_id, body.len());
        parse_food_detail(&body)
    }
}

#[async_trait]
impl FoodCatalog for FatSecretClient {
    fn name(&self) -> &'static str {
        "fatsecret"
    }

    async fn search(&self, query: &str) -> CatalogResult<Vec<FoodEntry>> {
        let request = self
            .client
            .get(format!("{}/search", self.base_url))
            .query(&[("query", query)]);
        let body = fetch_text(request).await?;
        let results = parse_search_response(&body)?;
        tracing::debug!("FatSecret search '{}' returned {} foods", query, results.len());
        Ok(results)
    }

    async fn lookup_barcode(&self, barcode: &str) -> CatalogResult<FoodEntry> {
        let Some(_claim) = self.in_flight.claim(barcode) else {
            tracing::warn!("Skipping duplicate barcode lookup: {}", barcode);
            return Err(CatalogError::DuplicateLookup(barcode.to_string()));
        };

        let request = self
            .client
            .get(format!("{}/barcode", self.base_url))
            .query(&[("barcode", barcode)]);
        let body = fetch_text(request).await?;
        let food_id = parse_barcode_response(&body)?;

        self.food_details(&food_id).await
    }
}
