// Command implementations behind the `lookfinder` binary

pub mod browse;
pub mod history;
pub mod prefs;
pub mod scan;

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use tokio::task::JoinHandle;
use tracing::warn;

use crate::client::{CatalogApi, HttpCatalogClient};
use crate::config::ClientConfig;
use crate::driver::{MemoryNavigator, SessionDriver, SessionHandle, SessionObserver};
use crate::fixture::{Fixture, FixtureApi};
use crate::models::{Notice, Product, ScanOutcome};
use crate::prefs::{JsonFilePreferenceStore, PreferenceStore};
use crate::session::{CatalogSession, SessionSnapshot};

/// Where catalog data comes from: the configured backend, or a local fixture.
#[derive(Debug, Clone, Default)]
pub struct SourceConfig {
    pub base_url: Option<String>,
    pub fixture: Option<PathBuf>,
}

impl SourceConfig {
    pub fn client_config(&self) -> Result<ClientConfig> {
        let cfg = ClientConfig::from_env()?;
        let cfg = match &self.base_url {
            Some(url) => cfg.with_base_url(url.clone()),
            None => cfg,
        };
        let store = JsonFilePreferenceStore::new(&cfg.state_file);
        Ok(apply_preferences(cfg, &store))
    }
}

/// Fill in settings kept in the preference store. An unreadable store is
/// logged and skipped.
pub fn apply_preferences(cfg: ClientConfig, store: &dyn PreferenceStore) -> ClientConfig {
    match store.load() {
        Ok(prefs) => cfg.with_stored_token(&prefs),
        Err(e) => {
            warn!(target = "cli", error = %e, "ignoring unreadable preferences");
            cfg
        }
    }
}

pub fn build_api(cfg: &ClientConfig, fixture: Option<&Path>) -> Result<Arc<dyn CatalogApi>> {
    match fixture {
        Some(path) => Ok(Arc::new(FixtureApi::new(Fixture::load(path)?))),
        None => {
            let client = HttpCatalogClient::new(cfg).context("failed to build HTTP client")?;
            Ok(Arc::new(client))
        }
    }
}

/// Prints notices and remembers the last previewed product.
#[derive(Debug, Clone, Default)]
pub struct ConsoleObserver {
    last_preview: Arc<Mutex<Option<String>>>,
}

impl ConsoleObserver {
    pub fn last_preview(&self) -> Option<String> {
        self.last_preview.lock().ok()?.clone()
    }
}

impl SessionObserver for ConsoleObserver {
    fn on_analysis_start(&mut self, image_url: &str, product_name: &str) {
        eprintln!("analyzing {product_name} ({image_url})");
        if let Ok(mut slot) = self.last_preview.lock() {
            *slot = Some(product_name.to_string());
        }
    }

    fn on_result_found(&mut self, _outcome: Option<&ScanOutcome>) {}

    fn on_notice(&mut self, notice: &Notice) {
        warn!(target = "cli", kind = ?notice.kind, "{}", notice.message);
        eprintln!("! {}", notice.message);
    }
}

pub struct OpenSession {
    pub handle: SessionHandle,
    pub join: JoinHandle<()>,
    pub observer: ConsoleObserver,
    pub navigator: MemoryNavigator,
    pub ready: SessionSnapshot,
}

impl OpenSession {
    pub async fn close(self) -> Result<()> {
        self.handle.shutdown()?;
        self.join.await.context("session driver panicked")?;
        Ok(())
    }
}

/// Start a session (optionally seeded from a query string) and wait for the
/// catalog to load.
pub async fn open_session(source: &SourceConfig, query: Option<&str>) -> Result<OpenSession> {
    let cfg = source.client_config()?;
    let api = build_api(&cfg, source.fixture.as_deref())?;
    let session = match query {
        Some(q) => CatalogSession::from_query(q),
        None => CatalogSession::new(),
    };
    let observer = ConsoleObserver::default();
    let navigator = MemoryNavigator::default();
    let (handle, join) = SessionDriver::spawn(
        session,
        api,
        cfg.scan_timeout,
        observer.clone(),
        navigator.clone(),
    );
    let ready = handle.settle().await?;
    Ok(OpenSession {
        handle,
        join,
        observer,
        navigator,
        ready,
    })
}

pub fn print_products(products: &[Product]) {
    for p in products {
        println!(
            "{:<14} {:>10.0}  {:<12} {}",
            p.product_id, p.price, p.category_name, p.product_name
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prefs::{MemoryPreferenceStore, Preferences};
    use anyhow::anyhow;

    struct BrokenStore;

    impl PreferenceStore for BrokenStore {
        fn load(&self) -> Result<Preferences> {
            Err(anyhow!("corrupt state file"))
        }

        fn save(&self, _prefs: &Preferences) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn saved_token_reaches_the_client_config() {
        let store = MemoryPreferenceStore::default();
        store
            .update(&mut |p| p.auth_token = Some("saved".into()))
            .unwrap();
        let cfg = apply_preferences(ClientConfig::default(), &store);
        assert_eq!(cfg.api_token.as_deref(), Some("saved"));
    }

    #[test]
    fn unreadable_preferences_leave_config_alone() {
        let cfg = apply_preferences(ClientConfig::default(), &BrokenStore);
        assert_eq!(cfg.api_token, None);
    }
}
