// Catalog and recommendation payloads exchanged with the recommendation backend

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One catalog entry as returned by `GET /api/products/list`.
///
/// Identity is `product_id`; a fetched list is never mutated in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub product_id: String,
    pub product_name: String,
    pub price: f64,
    pub image_url: String,
    pub category_name: String,
}

/// A visually-similar product returned by `GET /api/recommand/demo/{productId}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationResult {
    pub product_id: String,
    pub title: String,
    pub price: f64,
    pub image_url: String,
    pub product_link: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub similarity_score: Option<f64>,
}

/// What a finished scan reports upward: the results plus the category of the
/// reference product.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanOutcome {
    pub product_id: String,
    pub category: String,
    pub results: Vec<RecommendationResult>,
    /// Set when the live call timed out and a previously cached answer was used.
    pub from_cache: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    CatalogUnavailable,
    ScanFailed,
    Timeout,
}

/// User-facing failure notice. Every network failure in a session surfaces as
/// exactly one of these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
    pub raised_at: DateTime<Utc>,
}

impl Notice {
    pub fn new(kind: NoticeKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            raised_at: Utc::now(),
        }
    }
}
