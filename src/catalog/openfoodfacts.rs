//! Open Food Facts client
//!
//! Barcode lookups against the public product database. Nutrients are reported
//! per 100g.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use super::{fetch_text, http_client, normalize_base_url, CatalogError, CatalogResult, FoodCatalog, Scalar};
use crate::models::{FoodEntry, Nutrients};
use crate::nutrition::parse_weight_text;
use crate::nutrition::units::DEFAULT_SERVING_WEIGHT_G;

pub const DEFAULT_BASE_URL: &str = "https://world.openfoodfacts.org";

#[derive(Debug, Deserialize)]
struct ProductResponse {
    product: Option<Product>,
}

#[derive(Debug, Deserialize)]
struct Product {
    product_name: Option<String>,
    nutriments: Option<Nutriments>,
    serving_size: Option<Scalar>,
}

#[derive(Debug, Deserialize)]
struct Nutriments {
    #[serde(rename = "energy-kcal_100g")]
    energy_kcal: Option<Scalar>,
    #[serde(rename = "proteins_100g")]
    protein: Option<Scalar>,
    #[serde(rename = "carbohydrates_100g")]
    carbs: Option<Scalar>,
    #[serde(rename = "fat_100g")]
    fat: Option<Scalar>,
    serving_size: Option<Scalar>,
}

fn serving_weight(size: Option<&Scalar>) -> Option<f64> {
    match size? {
        Scalar::Number(n) if n.is_finite() && *n > 0.0 => Some(*n),
        Scalar::Number(_) => None,
        Scalar::Text(text) => parse_weight_text(text),
    }
}

fn value(v: &Option<Scalar>) -> f64 {
    v.as_ref().map(Scalar::as_f64).unwrap_or(0.0)
}

/// Parse a product response into an entry identified by the barcode
pub fn parse_product(barcode: &str, body: &str) -> CatalogResult<FoodEntry> {
    let response: ProductResponse = serde_json::from_str(body)?;
    let product = response.product.ok_or(CatalogError::NoData)?;

    let name = product
        .product_name
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| "Unknown".to_string());

    let (nutrients, nutriment_serving) = match &product.nutriments {
        Some(n) => (
            Nutrients::new(value(&n.energy_kcal), value(&n.protein), value(&n.carbs), value(&n.fat)),
            serving_weight(n.serving_size.as_ref()),
        ),
        None => (Nutrients::zero(), None),
    };

    let weight = nutriment_serving
        .or_else(|| serving_weight(product.serving_size.as_ref()))
        .unwrap_or(DEFAULT_SERVING_WEIGHT_G);

    Ok(FoodEntry::new(barcode, name, nutrients, "100g", weight))
}

/// Open Food Facts client
#[derive(Debug, Clone)]
pub struct OpenFoodFactsClient {
    base_url: String,
    client: reqwest::Client,
}

impl OpenFoodFactsClient {
    pub fn new(base_url: &str, timeout: Duration) -> CatalogResult<Self> {
        Ok(Self {
            base_url: normalize_base_url(base_url)?,
            client: http_client(timeout)?,
        })
    }
}

#[async_trait]
impl FoodCatalog for OpenFoodFactsClient {
    fn name(&self) -> &'static str {
        "openfoodfacts"
    }

    async fn lookup_barcode(&self, barcode: &str) -> CatalogResult<FoodEntry> {
        let barcode = barcode.trim();
        if barcode.is_empty() || !barcode.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(CatalogError::InvalidUrl(format!("bad barcode '{}'", barcode)));
        }

        let url = format!("{}/api/v2/product/{}.json", self.base_url, barcode);
        let body = fetch_text(self.client.get(url)).await?;
        parse_product(barcode, &body)
    }
}
