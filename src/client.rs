// HTTP client for the recommendation backend

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::models::{Product, RecommendationResult};

pub const PRODUCTS_PATH: &str = "/api/products/list";
pub const RECOMMEND_PATH: &str = "/api/recommand/demo";

/// The two backend calls a catalog session needs.
#[async_trait]
pub trait CatalogApi: Send + Sync {
    /// Full, unpaginated product list.
    async fn fetch_products(&self) -> Result<Vec<Product>, ClientError>;

    /// Visually-similar products for one reference product.
    async fn fetch_recommendations(
        &self,
        product_id: &str,
    ) -> Result<Vec<RecommendationResult>, ClientError>;
}

#[derive(Debug, Clone)]
pub struct HttpCatalogClient {
    base_url: String,
    http: Client,
}

impl HttpCatalogClient {
    pub fn new(cfg: &ClientConfig) -> Result<Self, ClientError> {
        url::Url::parse(&cfg.base_url)
            .map_err(|e| ClientError::Config(format!("base url {:?}: {e}", cfg.base_url)))?;

        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );
        if let Some(token) = &cfg.api_token {
            let value = header::HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|e| ClientError::Config(format!("api token: {e}")))?;
            headers.insert(header::AUTHORIZATION, value);
        }

        let http = Client::builder()
            .user_agent(concat!("lookfinder/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .timeout(cfg.request_timeout)
            .pool_idle_timeout(Duration::from_secs(50))
            .build()?;

        Ok(Self {
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn recommend_url(&self, product_id: &str) -> String {
        self.url(&format!(
            "{}/{}",
            RECOMMEND_PATH,
            urlencoding::encode(product_id)
        ))
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, ClientError> {
        debug!(target = "client", url, "GET");
        let resp = self.http.get(url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ClientError::Http {
                status: status.as_u16(),
                body,
            });
        }
        // Decode separately so malformed bodies surface as Json, not Net
        let bytes = resp.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait]
impl CatalogApi for HttpCatalogClient {
    async fn fetch_products(&self) -> Result<Vec<Product>, ClientError> {
        self.get_json(&self.url(PRODUCTS_PATH)).await
    }

    async fn fetch_recommendations(
        &self,
        product_id: &str,
    ) -> Result<Vec<RecommendationResult>, ClientError> {
        self.get_json(&self.recommend_url(product_id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_paths_without_double_slashes() {
        let cfg = ClientConfig::default().with_base_url("http://reco.internal:9000/");
        let client = HttpCatalogClient::new(&cfg).unwrap();
        assert_eq!(
            client.url(PRODUCTS_PATH),
            "http://reco.internal:9000/api/products/list"
        );
    }

    #[test]
    fn encodes_product_id_as_single_path_segment() {
        let client = HttpCatalogClient::new(&ClientConfig::default()).unwrap();
        assert_eq!(
            client.recommend_url("AKA3CA001"),
            "http://localhost:8080/api/recommand/demo/AKA3CA001"
        );
        assert_eq!(
            client.recommend_url("a/b c"),
            "http://localhost:8080/api/recommand/demo/a%2Fb%20c"
        );
    }

    #[test]
    fn rejects_unparseable_base_url() {
        let cfg = ClientConfig::default().with_base_url("not a url");
        assert!(matches!(
            HttpCatalogClient::new(&cfg),
            Err(ClientError::Config(_))
        ));
    }
}
