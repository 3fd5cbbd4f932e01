//! Catalog browsing session: the state machine behind the "choose a category,
//! pick a garment, scan for similar items" flow.
//!
//! `CatalogSession` performs no I/O. Every transition mutates local state and
//! returns the [`Effect`]s the caller must carry out (start a fetch, replace the
//! URL query, notify the preview panel, ...). Completions of the network calls
//! come back in through [`CatalogSession::catalog_loaded`] and
//! [`CatalogSession::scan_finished`], tagged with the generation they were
//! started under so late answers can be dropped.

use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::cache::ResultCache;
use crate::catalog::filter::category_counts;
use crate::catalog::query::{query_to_state, state_to_query};
use crate::catalog::{
    CategoryFilter, ProductCatalogStore, ScrollMetrics, SelectionChange, SelectionState,
    VisibleWindow,
};
use crate::error::ClientError;
use crate::models::{Notice, NoticeKind, Product, RecommendationResult, ScanOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Init,
    Loading,
    Ready,
    Requesting,
    Results,
}

/// Side effects requested by a session transition.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    FetchCatalog { generation: u64 },
    RequestRecommendations { generation: u64, product_id: String },
    /// Abort whatever recommendation call is in flight.
    CancelRecommendations,
    /// History-replace (never push) with this query string.
    ReplaceQuery(String),
    AnalysisStart { image_url: String, product_name: String },
    ResultFound(Option<ScanOutcome>),
    Notice(Notice),
}

#[derive(Debug, Clone)]
struct PendingScan {
    generation: u64,
    product_id: String,
    category: String,
}

#[derive(Debug, Clone)]
pub struct CatalogSession {
    store: ProductCatalogStore,
    filter: CategoryFilter,
    window: VisibleWindow,
    selection: SelectionState,
    phase: Phase,
    scan_generation: u64,
    pending: Option<PendingScan>,
    results: Option<ScanOutcome>,
    cache: ResultCache,
    notice: Option<Notice>,
}

impl Default for CatalogSession {
    fn default() -> Self {
        Self::new()
    }
}

impl CatalogSession {
    pub fn new() -> Self {
        Self {
            store: ProductCatalogStore::new(),
            filter: CategoryFilter::new(),
            window: VisibleWindow::new(),
            selection: SelectionState::default(),
            phase: Phase::Init,
            scan_generation: 0,
            pending: None,
            results: None,
            cache: ResultCache::default(),
            notice: None,
        }
    }

    /// Seed selection from a URL query (shared link or reload). The product id
    /// is validated once the catalog arrives.
    pub fn from_query(query: &str) -> Self {
        let mut session = Self::new();
        session.selection = query_to_state(query);
        session
    }

    // ----- transitions ---------------------------------------------------

    /// First mount: request the one catalog fetch.
    pub fn mount(&mut self) -> Vec<Effect> {
        match self.store.begin_fetch() {
            Some(generation) => {
                self.phase = Phase::Loading;
                info!(target = "session", generation, "catalog fetch started");
                vec![Effect::FetchCatalog { generation }]
            }
            None => Vec::new(),
        }
    }

    pub fn catalog_loaded(
        &mut self,
        generation: u64,
        result: Result<Vec<Product>, ClientError>,
    ) -> Vec<Effect> {
        if !self.store.accepts(generation) {
            debug!(target = "session", generation, "ignoring stale catalog completion");
            return Vec::new();
        }

        let mut effects = Vec::new();
        match result {
            Ok(products) => {
                info!(target = "session", count = products.len(), "catalog loaded");
                self.store.finish_fetch(products);
            }
            Err(err) => {
                error!(target = "session", error = %err, "catalog fetch failed");
                self.store.fail_fetch();
                effects.push(self.raise(
                    NoticeKind::CatalogUnavailable,
                    format!("could not load the product catalog: {err}"),
                ));
            }
        }
        if self.phase == Phase::Loading {
            self.phase = Phase::Ready;
        }
        self.refresh_filter();
        effects.extend(self.reconcile_selection());
        effects
    }

    /// Pick a category. Clears the product selection first; a scan in flight
    /// is cancelled and a shown result set is dismissed.
    pub fn select_category(&mut self, category: &str) -> Vec<Effect> {
        let mut effects = self.leave_scan_states();
        self.selection.set_category(Some(category.to_string()));
        self.refresh_filter();
        effects.push(Effect::ReplaceQuery(self.query_string()));
        effects
    }

    /// Click on a product card. Only products of the current filtered view can
    /// be selected, and only once a category is chosen on the selection screen.
    pub fn toggle_product(&mut self, product_id: &str) -> Vec<Effect> {
        if self.phase != Phase::Ready || self.selection.category().is_none() {
            debug!(target = "session", phase = ?self.phase, product_id, "selection ignored");
            return Vec::new();
        }
        let product = match self.store.find(product_id) {
            Some(p) if self.filter.contains(self.store.products(), product_id) => p.clone(),
            _ => {
                warn!(target = "session", product_id, "product not in current view");
                return Vec::new();
            }
        };

        match self.selection.toggle(&product) {
            SelectionChange::Selected {
                image_url,
                product_name,
                ..
            } => vec![
                Effect::ReplaceQuery(self.query_string()),
                Effect::AnalysisStart {
                    image_url,
                    product_name,
                },
            ],
            SelectionChange::Deselected { .. } => vec![Effect::ReplaceQuery(self.query_string())],
        }
    }

    /// Scroll event from the product grid. Returns whether more items became visible.
    pub fn scroll(&mut self, metrics: ScrollMetrics) -> bool {
        let grew = self.window.on_scroll(metrics, self.filter.len());
        if grew {
            debug!(
                target = "session",
                display_count = self.window.display_count(),
                "window grew"
            );
        }
        grew
    }

    pub fn can_scan(&self) -> bool {
        self.phase == Phase::Ready && self.selection.selected().is_some() && self.pending.is_none()
    }

    /// Start the recommendation call for the selected product.
    pub fn scan(&mut self) -> Vec<Effect> {
        if !self.can_scan() {
            debug!(target = "session", phase = ?self.phase, "scan not available");
            return Vec::new();
        }
        let Some(product_id) = self.selection.selected().map(str::to_string) else {
            return Vec::new();
        };
        let category = self
            .store
            .find(&product_id)
            .map(|p| p.category_name.clone())
            .or_else(|| self.selection.category.clone())
            .unwrap_or_default();

        self.scan_generation += 1;
        let generation = self.scan_generation;
        self.pending = Some(PendingScan {
            generation,
            product_id: product_id.clone(),
            category,
        });
        self.phase = Phase::Requesting;
        info!(target = "session", generation, product_id = %product_id, "scan started");
        vec![Effect::RequestRecommendations {
            generation,
            product_id,
        }]
    }

    pub fn scan_finished(
        &mut self,
        generation: u64,
        result: Result<Vec<RecommendationResult>, ClientError>,
    ) -> Vec<Effect> {
        let pending = match self.pending.take() {
            Some(p) if p.generation == generation => p,
            other => {
                self.pending = other;
                debug!(target = "session", generation, "ignoring stale scan completion");
                return Vec::new();
            }
        };

        match result {
            Ok(results) => {
                info!(
                    target = "session",
                    product_id = %pending.product_id,
                    count = results.len(),
                    "scan finished"
                );
                self.cache.insert(&pending.product_id, results.clone());
                vec![self.show_results(ScanOutcome {
                    product_id: pending.product_id,
                    category: pending.category,
                    results,
                    from_cache: false,
                })]
            }
            Err(err) if err.is_timeout() => {
                warn!(target = "session", product_id = %pending.product_id, error = %err, "scan timed out");
                let cached = self.cache.get(&pending.product_id).map(<[_]>::to_vec);
                let mut effects = Vec::new();
                match cached {
                    Some(results) => {
                        effects.push(self.raise(
                            NoticeKind::Timeout,
                            "the recommendation service is slow; showing earlier results",
                        ));
                        effects.push(self.show_results(ScanOutcome {
                            product_id: pending.product_id,
                            category: pending.category,
                            results,
                            from_cache: true,
                        }));
                    }
                    None => {
                        self.phase = Phase::Ready;
                        effects.push(self.raise(
                            NoticeKind::Timeout,
                            "the recommendation service did not answer in time",
                        ));
                    }
                }
                effects
            }
            Err(err) => {
                error!(target = "session", product_id = %pending.product_id, error = %err, "scan failed");
                self.phase = Phase::Ready;
                vec![self.raise(
                    NoticeKind::ScanFailed,
                    format!("could not fetch similar products: {err}"),
                )]
            }
        }
    }

    /// Back to "choose a category". Safe to call repeatedly.
    pub fn reset(&mut self) -> Vec<Effect> {
        let mut effects = Vec::new();
        if self.pending.is_some() {
            effects.push(self.cancel_scan());
        }
        self.results = None;
        self.selection.clear();
        self.refresh_filter();
        self.window.reset();
        if matches!(self.phase, Phase::Requesting | Phase::Results) {
            self.phase = Phase::Ready;
        }
        effects.push(Effect::ReplaceQuery(String::new()));
        effects.push(Effect::ResultFound(None));
        effects
    }

    /// Apply a query string coming from navigation (back/forward, pasted link).
    pub fn restore_query(&mut self, query: &str) -> Vec<Effect> {
        let target = query_to_state(query);
        if target == self.selection && self.phase != Phase::Results {
            return Vec::new();
        }
        let mut effects = self.leave_scan_states();
        self.selection = target;
        self.refresh_filter();
        effects.extend(self.reconcile_selection());
        effects
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    // ----- helpers -------------------------------------------------------

    fn refresh_filter(&mut self) -> bool {
        let changed = self.filter.refresh(
            self.store.products(),
            self.store.generation(),
            self.selection.category(),
        );
        if changed {
            self.window.reset();
        }
        changed
    }

    /// Drop a selected product id that the loaded catalog does not show under
    /// the current category. A pid without a category is dropped as well.
    fn reconcile_selection(&mut self) -> Option<Effect> {
        if !self.store.is_loaded() {
            return None;
        }
        let pid = self.selection.selected()?;
        if self.selection.category().is_some() && self.filter.contains(self.store.products(), pid) {
            return None;
        }
        warn!(target = "session", product_id = pid, "dropping unknown product from query");
        self.selection.selected_product_id = None;
        Some(Effect::ReplaceQuery(self.query_string()))
    }

    fn leave_scan_states(&mut self) -> Vec<Effect> {
        let mut effects = Vec::new();
        if self.pending.is_some() {
            effects.push(self.cancel_scan());
        }
        if self.phase == Phase::Results {
            self.results = None;
            self.phase = Phase::Ready;
            effects.push(Effect::ResultFound(None));
        }
        effects
    }

    fn cancel_scan(&mut self) -> Effect {
        if let Some(p) = self.pending.take() {
            info!(target = "session", generation = p.generation, product_id = %p.product_id, "scan cancelled");
        }
        // Anything started under an older generation is now stale
        self.scan_generation += 1;
        if self.phase == Phase::Requesting {
            self.phase = Phase::Ready;
        }
        Effect::CancelRecommendations
    }

    fn show_results(&mut self, outcome: ScanOutcome) -> Effect {
        self.results = Some(outcome.clone());
        self.phase = Phase::Results;
        Effect::ResultFound(Some(outcome))
    }

    fn raise(&mut self, kind: NoticeKind, message: impl Into<String>) -> Effect {
        let notice = Notice::new(kind, message);
        self.notice = Some(notice.clone());
        Effect::Notice(notice)
    }

    // ----- read side -----------------------------------------------------

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn query_string(&self) -> String {
        state_to_query(&self.selection)
    }

    pub fn products(&self) -> &[Product] {
        self.store.products()
    }

    pub fn visible_products(&self) -> Vec<&Product> {
        self.filter
            .resolve(self.store.products(), self.window.display_count())
    }

    pub fn filtered_len(&self) -> usize {
        self.filter.len()
    }

    pub fn display_count(&self) -> usize {
        self.window.display_count()
    }

    pub fn has_more(&self) -> bool {
        self.window.has_more(self.filter.len())
    }

    pub fn categories(&self) -> Vec<(String, usize)> {
        category_counts(self.store.products()).into_iter().collect()
    }

    pub fn results(&self) -> Option<&ScanOutcome> {
        self.results.as_ref()
    }

    pub fn is_fetching(&self) -> bool {
        self.store.is_fetching()
    }

    pub fn is_scanning(&self) -> bool {
        self.pending.is_some()
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            phase: self.phase,
            category: self.selection.category.clone(),
            selected_product_id: self.selection.selected_product_id.clone(),
            query: self.query_string(),
            categories: self.categories(),
            visible: self.visible_products().into_iter().cloned().collect(),
            filtered_len: self.filtered_len(),
            display_count: self.display_count(),
            fetching: self.is_fetching(),
            scanning: self.is_scanning(),
            can_scan: self.can_scan(),
            results: self.results.clone(),
            notice: self.notice.clone(),
        }
    }
}

/// Owned copy of everything a view needs to render a session.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub phase: Phase,
    pub category: Option<String>,
    pub selected_product_id: Option<String>,
    pub query: String,
    pub categories: Vec<(String, usize)>,
    pub visible: Vec<Product>,
    pub filtered_len: usize,
    pub display_count: usize,
    pub fetching: bool,
    pub scanning: bool,
    pub can_scan: bool,
    pub results: Option<ScanOutcome>,
    pub notice: Option<Notice>,
}
