//! External food catalogs
//!
//! HTTP clients for the FatSecret proxy and Open Food Facts. Each client turns
//! the remote payload into `FoodEntry` values; the JSON decoding lives in plain
//! functions so it can be tested against recorded fixtures.

pub mod fatsecret;
pub mod openfoodfacts;

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use crate::config::Config;
use crate::models::FoodEntry;
use crate::nutrition::parse_numeric_field;

pub use fatsecret::FatSecretClient;
pub use openfoodfacts::OpenFoodFactsClient;

/// Catalog error types
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected HTTP status {0}")]
    Status(u16),

    #[error("Could not decode catalog response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("No data found")]
    NoData,

    #[error("Invalid catalog URL: {0}")]
    InvalidUrl(String),

    #[error("A lookup for barcode {0} is already in progress")]
    DuplicateLookup(String),
}

/// Result type for catalog operations
pub type CatalogResult<T> = Result<T, CatalogError>;

/// A remote source of food data
#[async_trait]
pub trait FoodCatalog: Send + Sync {
    fn name(&self) -> &'static str;

    /// Free-text search; catalogs without text search return no results
    async fn search(&self, _query: &str) -> CatalogResult<Vec<FoodEntry>> {
        Ok(Vec::new())
    }

    /// Resolve a product barcode to a single food
    async fn lookup_barcode(&self, barcode: &str) -> CatalogResult<FoodEntry>;
}

/// Catalogs consulted in order
#[derive(Clone, Default)]
pub struct CatalogChain {
    catalogs: Vec<Arc<dyn FoodCatalog>>,
}

impl CatalogChain {
    pub fn new(catalogs: Vec<Arc<dyn FoodCatalog>>) -> Self {
        Self { catalogs }
    }

    /// FatSecret first when a proxy is configured, then Open Food Facts
    pub fn from_config(config: &Config) -> CatalogResult<Self> {
        let mut catalogs: Vec<Arc<dyn FoodCatalog>> = Vec::new();
        match &config.fatsecret_url {
            Some(url) => catalogs.push(Arc::new(FatSecretClient::new(url, config.http_timeout)?)),
            None => tracing::info!("No FatSecret URL configured, using Open Food Facts only"),
        }
        catalogs.push(Arc::new(OpenFoodFactsClient::new(
            &config.openfoodfacts_url,
            config.http_timeout,
        )?));
        Ok(Self::new(catalogs))
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.catalogs.iter().map(|c| c.name()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.catalogs.is_empty()
    }

    /// Search the first catalog that returns results
    pub async fn search(&self, query: &str) -> CatalogResult<Vec<FoodEntry>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let mut last_error = None;
        for catalog in &self.catalogs {
            match catalog.search(query).await {
                Ok(results) if !results.is_empty() => return Ok(results),
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!("{} search for '{}' failed: {}", catalog.name(), query, e);
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) => Err(e),
            None => Ok(Vec::new()),
        }
    }

    /// Try each catalog in turn until one resolves the barcode
    ///
    /// Returns the resolving catalog's name with the food. A duplicate in-flight
    /// lookup stops the chain immediately.
    pub async fn lookup_barcode(&self, barcode: &str) -> CatalogResult<(&'static str, FoodEntry)> {
        for catalog in &self.catalogs {
            match catalog.lookup_barcode(barcode).await {
                Ok(entry) => {
                    tracing::info!("Resolved barcode {} via {}", barcode, catalog.name());
                    return Ok((catalog.name(), entry));
                }
                Err(e @ CatalogError::DuplicateLookup(_)) => return Err(e),
                Err(e) => {
                    tracing::warn!("{} lookup for barcode {} failed: {}", catalog.name(), barcode, e);
                }
            }
        }
        Err(CatalogError::NoData)
    }
}

// ============================================================================
// Shared helpers
// ============================================================================

/// Build the shared HTTP client
pub fn http_client(timeout: Duration) -> CatalogResult<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("calorie-beta/", env!("CARGO_PKG_VERSION")))
        .build()?)
}

/// Validate and normalize a base URL (no trailing slash)
pub(crate) fn normalize_base_url(base_url: &str) -> CatalogResult<String> {
    let trimmed = base_url.trim().trim_end_matches('/');
    reqwest::Url::parse(trimmed).map_err(|e| CatalogError::InvalidUrl(format!("{}: {}", trimmed, e)))?;
    Ok(trimmed.to_string())
}

/// GET a URL and return its body, treating 404 as missing data
pub(crate) async fn fetch_text(request: reqwest::RequestBuilder) -> CatalogResult<String> {
    let response = request.send().await?;
    let status = response.status();
    if status == reqwest::StatusCode::NOT_FOUND {
        return Err(CatalogError::NoData);
    }
    if !status.is_success() {
        return Err(CatalogError::Status(status.as_u16()));
    }
    Ok(response.text().await?)
}

/// A JSON value that may arrive as a number or as text
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub(crate) enum Scalar {
    Number(f64),
    Text(String),
}

impl Scalar {
    /// Numeric value; text is cleaned to digits and '.' first
    pub(crate) fn as_f64(&self) -> f64 {
        match self {
            Scalar::Number(n) => crate::models::non_negative(*n),
            Scalar::Text(s) => parse_numeric_field(Some(s)),
        }
    }
}

/// One item or a list of items; FatSecret collapses single-element arrays
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> OneOrMany<T> {
    pub(crate) fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::Many(items) => items,
            OneOrMany::One(item) => vec![item],
        }
    }
}

/// Set of barcodes with a lookup in progress
#[derive(Debug, Clone, Default)]
pub(crate) struct InFlight {
    barcodes: Arc<Mutex<HashSet<String>>>,
}

impl InFlight {
    /// Claim a barcode, or None if it is already being looked up
    pub(crate) fn claim(&self, barcode: &str) -> Option<InFlightGuard> {
        let mut set = self.barcodes.lock().unwrap_or_else(|e| e.into_inner());
        if !set.insert(barcode.to_string()) {
            return None;
        }
        Some(InFlightGuard {
            barcodes: Arc::clone(&self.barcodes),
            barcode: barcode.to_string(),
        })
    }
}

/// Releases the barcode claim when dropped
pub(crate) struct InFlightGuard {
    barcodes: Arc<Mutex<HashSet<String>>>,
    barcode: String,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        let mut set = self.barcodes.lock().unwrap_or_else(|e| e.into_inner());
        set.remove(&self.barcode);
    }
}
