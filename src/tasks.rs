// Background network calls owned by a session driver.
//
// Both calls run as spawned tokio tasks and hand their result to a `deliver`
// callback. Dropping the owner aborts the task, so results never arrive for a
// session that no longer exists.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::debug;

use crate::client::CatalogApi;
use crate::error::ClientError;
use crate::models::{Product, RecommendationResult};

/// At most one running task; replacing or dropping the slot aborts it.
#[derive(Debug, Default)]
pub struct TaskSlot {
    handle: Option<JoinHandle<()>>,
}

impl TaskSlot {
    pub fn replace(&mut self, handle: JoinHandle<()>) {
        self.cancel();
        self.handle = Some(handle);
    }

    pub fn cancel(&mut self) -> bool {
        match self.handle.take() {
            Some(h) if !h.is_finished() => {
                h.abort();
                true
            }
            _ => false,
        }
    }

    pub fn is_active(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for TaskSlot {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Runs the one-time catalog fetch.
pub struct CatalogLoader {
    api: Arc<dyn CatalogApi>,
    slot: TaskSlot,
}

impl CatalogLoader {
    pub fn new(api: Arc<dyn CatalogApi>) -> Self {
        Self {
            api,
            slot: TaskSlot::default(),
        }
    }

    pub fn start<F>(&mut self, generation: u64, deliver: F)
    where
        F: FnOnce(u64, Result<Vec<Product>, ClientError>) + Send + 'static,
    {
        let api = Arc::clone(&self.api);
        self.slot.replace(tokio::spawn(async move {
            let result = api.fetch_products().await;
            deliver(generation, result);
        }));
    }

    pub fn is_active(&self) -> bool {
        self.slot.is_active()
    }
}

/// Runs recommendation calls, each bounded by `timeout`.
pub struct RecommendationRequest {
    api: Arc<dyn CatalogApi>,
    timeout: Duration,
    slot: TaskSlot,
}

impl RecommendationRequest {
    pub fn new(api: Arc<dyn CatalogApi>, timeout: Duration) -> Self {
        Self {
            api,
            timeout,
            slot: TaskSlot::default(),
        }
    }

    pub fn start<F>(&mut self, generation: u64, product_id: String, deliver: F)
    where
        F: FnOnce(u64, Result<Vec<RecommendationResult>, ClientError>) + Send + 'static,
    {
        let api = Arc::clone(&self.api);
        let timeout = self.timeout;
        self.slot.replace(tokio::spawn(async move {
            let result =
                match tokio::time::timeout(timeout, api.fetch_recommendations(&product_id)).await {
                    Ok(r) => r,
                    Err(_) => Err(ClientError::Timeout(timeout)),
                };
            deliver(generation, result);
        }));
    }

    pub fn cancel(&mut self) {
        if self.slot.cancel() {
            debug!(target = "tasks", "recommendation request aborted");
        }
    }

    pub fn is_active(&self) -> bool {
        self.slot.is_active()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use tokio::sync::oneshot;

    struct SlowApi {
        delay: Duration,
    }

    #[async_trait]
    impl CatalogApi for SlowApi {
        async fn fetch_products(&self) -> Result<Vec<Product>, ClientError> {
            tokio::time::sleep(self.delay).await;
            Ok(Vec::new())
        }

        async fn fetch_recommendations(
            &self,
            _product_id: &str,
        ) -> Result<Vec<RecommendationResult>, ClientError> {
            tokio::time::sleep(self.delay).await;
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn recommendation_call_times_out() {
        let api = Arc::new(SlowApi {
            delay: Duration::from_secs(60),
        });
        let mut request = RecommendationRequest::new(api, Duration::from_millis(20));
        let (tx, rx) = oneshot::channel();
        request.start(3, "CT001".into(), move |generation, result| {
            let _ = tx.send((generation, result));
        });

        let (generation, result) = rx.await.unwrap();
        assert_eq!(generation, 3);
        assert!(matches!(result, Err(ClientError::Timeout(d)) if d == Duration::from_millis(20)));
    }

    #[tokio::test]
    async fn cancelled_request_never_delivers() {
        let api = Arc::new(SlowApi {
            delay: Duration::from_secs(1),
        });
        let mut request = RecommendationRequest::new(api, Duration::from_secs(15));
        let (tx, rx) = oneshot::channel::<u64>();
        request.start(1, "CT001".into(), move |generation, _| {
            let _ = tx.send(generation);
        });
        assert!(request.is_active());
        request.cancel();
        // Sender is dropped with the aborted task
        assert!(rx.await.is_err());
    }

    #[tokio::test]
    async fn dropping_loader_aborts_fetch() {
        let api = Arc::new(SlowApi {
            delay: Duration::from_secs(5),
        });
        let mut loader = CatalogLoader::new(api);
        let (tx, rx) = oneshot::channel::<u64>();
        loader.start(1, move |generation, _| {
            let _ = tx.send(generation);
        });
        drop(loader);
        assert!(rx.await.is_err());
    }
}
