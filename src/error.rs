use std::time::Duration;
use thiserror::Error;

/// Failures of the two backend calls (catalog list and recommendation).
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("network: {0}")]
    Net(#[from] reqwest::Error),
    #[error("http {status}: {body}")]
    Http { status: u16, body: String },
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("request timed out after {}s", .0.as_secs())]
    Timeout(Duration),
    #[error("config: {0}")]
    Config(String),
}

impl ClientError {
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Timeout(_) => true,
            Self::Net(e) => e.is_timeout(),
            _ => false,
        }
    }
}
