// Catalog fixtures: a product list plus canned recommendation answers.
//
// Backs the mock backend server and offline CLI runs.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::client::CatalogApi;
use crate::error::ClientError;
use crate::models::{Product, RecommendationResult};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Fixture {
    pub products: Vec<Product>,
    /// productId -> answer of the recommendation endpoint
    #[serde(default)]
    pub recommendations: HashMap<String, Vec<RecommendationResult>>,
}

impl Fixture {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read fixture {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse fixture {}", path.display()))
    }

    pub fn product(&self, product_id: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.product_id == product_id)
    }

    /// Canned answer for a known product; known products without an entry
    /// answer with an empty list. Unknown products yield `None`.
    pub fn recommendations_for(&self, product_id: &str) -> Option<Vec<RecommendationResult>> {
        self.product(product_id)?;
        Some(
            self.recommendations
                .get(product_id)
                .cloned()
                .unwrap_or_default(),
        )
    }
}

/// In-process [`CatalogApi`] answering from a [`Fixture`].
#[derive(Debug, Clone, Default)]
pub struct FixtureApi {
    fixture: Fixture,
    delay: Option<Duration>,
    fail_catalog: bool,
}

impl FixtureApi {
    pub fn new(fixture: Fixture) -> Self {
        Self {
            fixture,
            delay: None,
            fail_catalog: false,
        }
    }

    /// Delay every answer, e.g. to exercise timeouts.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Answer the catalog call with a 503.
    pub fn failing_catalog(mut self) -> Self {
        self.fail_catalog = true;
        self
    }

    async fn pause(&self) {
        if let Some(d) = self.delay {
            tokio::time::sleep(d).await;
        }
    }
}

#[async_trait]
impl CatalogApi for FixtureApi {
    async fn fetch_products(&self) -> Result<Vec<Product>, ClientError> {
        self.pause().await;
        if self.fail_catalog {
            return Err(ClientError::Http {
                status: 503,
                body: "catalog unavailable".into(),
            });
        }
        Ok(self.fixture.products.clone())
    }

    async fn fetch_recommendations(
        &self,
        product_id: &str,
    ) -> Result<Vec<RecommendationResult>, ClientError> {
        self.pause().await;
        self.fixture
            .recommendations_for(product_id)
            .ok_or_else(|| ClientError::Http {
                status: 404,
                body: format!("unknown product {product_id}"),
            })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::catalog::filter::tests::product;

    pub(crate) fn sample() -> Fixture {
        let mut recommendations = HashMap::new();
        recommendations.insert(
            "AKA3CA001".to_string(),
            vec![RecommendationResult {
                product_id: "SIM-1".into(),
                title: "Silk blouse".into(),
                price: 52_000.0,
                image_url: "https://cdn.example/SIM-1.jpg".into(),
                product_link: "https://shop.example/SIM-1".into(),
                similarity_score: Some(0.87),
            }],
        );
        Fixture {
            products: vec![
                product("AKA3CA001", "블라우스"),
                product("AKA3CA002", "블라우스"),
                product("CT001", "코트"),
            ],
            recommendations,
        }
    }

    #[test]
    fn known_product_without_entry_answers_empty() {
        let fixture = sample();
        assert_eq!(fixture.recommendations_for("AKA3CA001").unwrap().len(), 1);
        assert_eq!(fixture.recommendations_for("CT001"), Some(Vec::new()));
        assert_eq!(fixture.recommendations_for("nope"), None);
    }

    #[test]
    fn fixture_parses_without_recommendations() {
        let raw = r#"{"products":[{"productId":"p","productName":"n","price":1,"imageUrl":"u","categoryName":"c"}]}"#;
        let fixture: Fixture = serde_json::from_str(raw).unwrap();
        assert_eq!(fixture.products.len(), 1);
        assert!(fixture.recommendations.is_empty());
    }

    #[tokio::test]
    async fn fixture_api_maps_unknown_product_to_404() {
        let api = FixtureApi::new(sample());
        let err = api.fetch_recommendations("nope").await.unwrap_err();
        assert!(matches!(err, ClientError::Http { status: 404, .. }));
        assert_eq!(api.fetch_products().await.unwrap().len(), 3);
    }
}
