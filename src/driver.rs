//! Event loop that owns a [`CatalogSession`] and carries out its effects.
//!
//! One tokio task processes commands and network completions strictly one at a
//! time, so the session itself needs no locking. Network calls run as child
//! tasks (see [`crate::tasks`]) and report back over an internal channel.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{anyhow, Result};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::catalog::ScrollMetrics;
use crate::client::CatalogApi;
use crate::error::ClientError;
use crate::models::{Notice, Product, RecommendationResult, ScanOutcome};
use crate::session::{CatalogSession, Effect, SessionSnapshot};
use crate::tasks::{CatalogLoader, RecommendationRequest};

/// Receives the session's outward notifications.
pub trait SessionObserver: Send + 'static {
    /// A product was selected; the preview panel should start on it.
    fn on_analysis_start(&mut self, _image_url: &str, _product_name: &str) {}
    /// `None` means "back to the selection screen".
    fn on_result_found(&mut self, _outcome: Option<&ScanOutcome>) {}
    fn on_notice(&mut self, _notice: &Notice) {}
}

impl SessionObserver for () {}

/// History-replace side of the URL-as-state mapping.
pub trait Navigator: Send + 'static {
    fn replace(&mut self, query: &str);
}

/// Navigator that keeps the replaced queries in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryNavigator {
    replaced: Arc<Mutex<Vec<String>>>,
}

impl MemoryNavigator {
    pub fn current(&self) -> Option<String> {
        self.replaced.lock().ok()?.last().cloned()
    }

    pub fn replacements(&self) -> Vec<String> {
        self.replaced
            .lock()
            .map(|v| v.clone())
            .unwrap_or_default()
    }
}

impl Navigator for MemoryNavigator {
    fn replace(&mut self, query: &str) {
        if let Ok(mut v) = self.replaced.lock() {
            v.push(query.to_string());
        }
    }
}

#[derive(Debug)]
pub enum Command {
    SelectCategory(String),
    ToggleProduct(String),
    Scroll(ScrollMetrics),
    Scan,
    Reset,
    RestoreQuery(String),
    DismissNotice,
    Snapshot(oneshot::Sender<SessionSnapshot>),
    Shutdown,
}

enum Completion {
    Catalog {
        generation: u64,
        result: Result<Vec<Product>, ClientError>,
    },
    Scan {
        generation: u64,
        result: Result<Vec<RecommendationResult>, ClientError>,
    },
}

enum Next {
    Command(Option<Command>),
    Completion(Completion),
}

pub struct SessionDriver<O, N> {
    session: CatalogSession,
    loader: CatalogLoader,
    request: RecommendationRequest,
    observer: O,
    navigator: N,
    commands: mpsc::UnboundedReceiver<Command>,
    completions_tx: mpsc::UnboundedSender<Completion>,
    completions: mpsc::UnboundedReceiver<Completion>,
    state: watch::Sender<SessionSnapshot>,
}

impl<O: SessionObserver, N: Navigator> SessionDriver<O, N> {
    /// Spawn the driver task. The session mounts (starts its catalog fetch)
    /// as soon as the task runs.
    pub fn spawn(
        session: CatalogSession,
        api: Arc<dyn CatalogApi>,
        scan_timeout: Duration,
        observer: O,
        navigator: N,
    ) -> (SessionHandle, JoinHandle<()>) {
        let (commands_tx, commands) = mpsc::unbounded_channel();
        let (completions_tx, completions) = mpsc::unbounded_channel();
        let (state, state_rx) = watch::channel(session.snapshot());

        let driver = Self {
            session,
            loader: CatalogLoader::new(Arc::clone(&api)),
            request: RecommendationRequest::new(api, scan_timeout),
            observer,
            navigator,
            commands,
            completions_tx,
            completions,
            state,
        };
        let join = tokio::spawn(driver.run());
        (
            SessionHandle {
                commands: commands_tx,
                state: state_rx,
            },
            join,
        )
    }

    async fn run(mut self) {
        let effects = self.session.mount();
        self.apply(effects);
        self.publish();

        loop {
            let next = tokio::select! {
                cmd = self.commands.recv() => Next::Command(cmd),
                Some(done) = self.completions.recv() => Next::Completion(done),
            };
            let effects = match next {
                Next::Command(None) | Next::Command(Some(Command::Shutdown)) => break,
                Next::Command(Some(cmd)) => self.handle_command(cmd),
                Next::Completion(Completion::Catalog { generation, result }) => {
                    self.session.catalog_loaded(generation, result)
                }
                Next::Completion(Completion::Scan { generation, result }) => {
                    self.session.scan_finished(generation, result)
                }
            };
            self.apply(effects);
            self.publish();
        }

        // Dropping the loader and request slots aborts anything still running
        info!(target = "driver", "session driver stopped");
    }

    fn handle_command(&mut self, cmd: Command) -> Vec<Effect> {
        debug!(target = "driver", command = ?cmd, "command");
        match cmd {
            Command::SelectCategory(category) => self.session.select_category(&category),
            Command::ToggleProduct(product_id) => self.session.toggle_product(&product_id),
            Command::Scroll(metrics) => {
                self.session.scroll(metrics);
                Vec::new()
            }
            Command::Scan => self.session.scan(),
            Command::Reset => self.session.reset(),
            Command::RestoreQuery(query) => self.session.restore_query(&query),
            Command::DismissNotice => {
                self.session.dismiss_notice();
                Vec::new()
            }
            Command::Snapshot(reply) => {
                let _ = reply.send(self.session.snapshot());
                Vec::new()
            }
            // handled by the loop
            Command::Shutdown => Vec::new(),
        }
    }

    fn apply(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::FetchCatalog { generation } => {
                    let tx = self.completions_tx.clone();
                    self.loader.start(generation, move |generation, result| {
                        let _ = tx.send(Completion::Catalog { generation, result });
                    });
                }
                Effect::RequestRecommendations {
                    generation,
                    product_id,
                } => {
                    let tx = self.completions_tx.clone();
                    self.request
                        .start(generation, product_id, move |generation, result| {
                            let _ = tx.send(Completion::Scan { generation, result });
                        });
                }
                Effect::CancelRecommendations => self.request.cancel(),
                Effect::ReplaceQuery(query) => self.navigator.replace(&query),
                Effect::AnalysisStart {
                    image_url,
                    product_name,
                } => self.observer.on_analysis_start(&image_url, &product_name),
                Effect::ResultFound(outcome) => self.observer.on_result_found(outcome.as_ref()),
                Effect::Notice(notice) => self.observer.on_notice(&notice),
            }
        }
    }

    fn publish(&self) {
        self.state.send_replace(self.session.snapshot());
    }
}

/// Cloneable front door to a running [`SessionDriver`].
#[derive(Debug, Clone)]
pub struct SessionHandle {
    commands: mpsc::UnboundedSender<Command>,
    state: watch::Receiver<SessionSnapshot>,
}

impl SessionHandle {
    fn send(&self, cmd: Command) -> Result<()> {
        self.commands
            .send(cmd)
            .map_err(|_| anyhow!("session driver stopped"))
    }

    pub fn select_category(&self, category: impl Into<String>) -> Result<()> {
        self.send(Command::SelectCategory(category.into()))
    }

    pub fn toggle_product(&self, product_id: impl Into<String>) -> Result<()> {
        self.send(Command::ToggleProduct(product_id.into()))
    }

    pub fn scroll(&self, metrics: ScrollMetrics) -> Result<()> {
        self.send(Command::Scroll(metrics))
    }

    pub fn scan(&self) -> Result<()> {
        self.send(Command::Scan)
    }

    pub fn reset(&self) -> Result<()> {
        self.send(Command::Reset)
    }

    pub fn restore_query(&self, query: impl Into<String>) -> Result<()> {
        self.send(Command::RestoreQuery(query.into()))
    }

    pub fn dismiss_notice(&self) -> Result<()> {
        self.send(Command::DismissNotice)
    }

    pub fn shutdown(&self) -> Result<()> {
        self.send(Command::Shutdown)
    }

    /// State after every previously sent command has been handled.
    pub async fn snapshot(&self) -> Result<SessionSnapshot> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Snapshot(tx))?;
        rx.await.map_err(|_| anyhow!("session driver stopped"))
    }

    /// Wait for the published state to satisfy `pred`.
    pub async fn wait_until<F>(&self, pred: F) -> Result<SessionSnapshot>
    where
        F: Fn(&SessionSnapshot) -> bool,
    {
        let mut rx = self.state.clone();
        let snapshot = rx
            .wait_for(|s| pred(s))
            .await
            .map_err(|_| anyhow!("session driver stopped"))?;
        Ok(snapshot.clone())
    }

    /// Wait until no catalog fetch or scan is in flight.
    pub async fn settle(&self) -> Result<SessionSnapshot> {
        self.snapshot().await?;
        self.wait_until(|s| !s.fetching && !s.scanning).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::tests::sample;
    use crate::fixture::FixtureApi;
    use crate::models::NoticeKind;
    use crate::session::Phase;

    #[derive(Debug, Default, Clone)]
    struct Recorder {
        events: Arc<Mutex<Vec<String>>>,
    }

    impl Recorder {
        fn events(&self) -> Vec<String> {
            self.events.lock().unwrap().clone()
        }
    }

    impl SessionObserver for Recorder {
        fn on_analysis_start(&mut self, _image_url: &str, product_name: &str) {
            self.events.lock().unwrap().push(format!("preview:{product_name}"));
        }

        fn on_result_found(&mut self, outcome: Option<&ScanOutcome>) {
            let line = match outcome {
                Some(o) => format!("results:{}:{}", o.category, o.results.len()),
                None => "results:none".to_string(),
            };
            self.events.lock().unwrap().push(line);
        }

        fn on_notice(&mut self, notice: &Notice) {
            self.events.lock().unwrap().push(format!("notice:{:?}", notice.kind));
        }
    }

    #[tokio::test]
    async fn full_flow_from_mount_to_results() {
        let recorder = Recorder::default();
        let navigator = MemoryNavigator::default();
        let (handle, join) = SessionDriver::spawn(
            CatalogSession::new(),
            Arc::new(FixtureApi::new(sample())),
            Duration::from_secs(15),
            recorder.clone(),
            navigator.clone(),
        );

        let ready = handle.settle().await.unwrap();
        assert_eq!(ready.phase, Phase::Ready);
        assert_eq!(ready.categories.len(), 2);

        handle.select_category("블라우스").unwrap();
        handle.toggle_product("AKA3CA001").unwrap();
        let selected = handle.snapshot().await.unwrap();
        assert!(selected.can_scan);
        assert_eq!(navigator.current().as_deref(), Some(selected.query.as_str()));

        handle.scan().unwrap();
        let done = handle.settle().await.unwrap();
        assert_eq!(done.phase, Phase::Results);
        assert_eq!(done.results.as_ref().map(|r| r.results.len()), Some(1));

        handle.reset().unwrap();
        let reset = handle.snapshot().await.unwrap();
        assert_eq!(reset.phase, Phase::Ready);
        assert_eq!(navigator.current().as_deref(), Some(""));

        assert_eq!(
            recorder.events(),
            vec![
                "preview:AKA3CA001 name".to_string(),
                "results:블라우스:1".to_string(),
                "results:none".to_string(),
            ]
        );

        handle.shutdown().unwrap();
        join.await.unwrap();
    }

    #[tokio::test]
    async fn catalog_failure_is_reported_once() {
        let recorder = Recorder::default();
        let (handle, _join) = SessionDriver::spawn(
            CatalogSession::new(),
            Arc::new(FixtureApi::new(sample()).failing_catalog()),
            Duration::from_secs(15),
            recorder.clone(),
            MemoryNavigator::default(),
        );

        let state = handle.settle().await.unwrap();
        assert_eq!(state.phase, Phase::Ready);
        assert!(state.visible.is_empty());
        assert_eq!(
            state.notice.map(|n| n.kind),
            Some(NoticeKind::CatalogUnavailable)
        );
        assert_eq!(recorder.events(), vec!["notice:CatalogUnavailable".to_string()]);
    }

    #[tokio::test]
    async fn reset_during_slow_scan_drops_the_answer() {
        let recorder = Recorder::default();
        let (handle, _join) = SessionDriver::spawn(
            CatalogSession::new(),
            Arc::new(FixtureApi::new(sample()).with_delay(Duration::from_millis(50))),
            Duration::from_secs(15),
            recorder.clone(),
            MemoryNavigator::default(),
        );
        handle.settle().await.unwrap();

        handle.select_category("코트").unwrap();
        handle.toggle_product("CT001").unwrap();
        handle.scan().unwrap();
        let requesting = handle.snapshot().await.unwrap();
        assert_eq!(requesting.phase, Phase::Requesting);

        handle.reset().unwrap();
        tokio::time::sleep(Duration::from_millis(120)).await;
        let after = handle.snapshot().await.unwrap();
        assert_eq!(after.phase, Phase::Ready);
        assert!(after.results.is_none());
        assert!(!recorder
            .events()
            .iter()
            .any(|e| e.starts_with("results:코트")));
    }

    #[tokio::test]
    async fn dropping_every_handle_stops_the_driver() {
        let (handle, join) = SessionDriver::spawn(
            CatalogSession::new(),
            Arc::new(FixtureApi::new(sample())),
            Duration::from_secs(15),
            (),
            MemoryNavigator::default(),
        );
        drop(handle);
        join.await.unwrap();
    }
}
