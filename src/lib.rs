pub mod api;
pub mod cache;
pub mod catalog;
pub mod cli;
pub mod client;
pub mod config;
pub mod driver;
pub mod error;
pub mod fixture;
pub mod logging;
pub mod models;
pub mod prefs;
pub mod session;
pub mod tasks;

pub mod util {
    pub mod env;
}

pub use client::{CatalogApi, HttpCatalogClient};
pub use config::ClientConfig;
pub use driver::{SessionDriver, SessionHandle};
pub use error::ClientError;
pub use models::{Product, RecommendationResult, ScanOutcome};
pub use session::{CatalogSession, Phase};
