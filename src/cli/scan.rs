use anyhow::{bail, Result};
use tracing::info;

use super::{open_session, SourceConfig};
use crate::catalog::ALL_CATEGORIES;
use crate::prefs::{AnalysisHistoryEntry, JsonFilePreferenceStore, PreferenceStore};
use crate::session::Phase;

#[derive(Debug, Clone, Default)]
pub struct ScanCommandConfig {
    pub source: SourceConfig,
    pub product_id: String,
    /// Category to select first; defaults to "All"
    pub category: Option<String>,
    pub json: bool,
    /// Skip writing the analysis history
    pub no_history: bool,
}

pub async fn run_scan(cfg: ScanCommandConfig) -> Result<()> {
    let opened = open_session(&cfg.source, None).await?;
    let handle = &opened.handle;

    let category = cfg.category.as_deref().unwrap_or(ALL_CATEGORIES);
    handle.select_category(category)?;
    handle.toggle_product(cfg.product_id.clone())?;
    let selected = handle.snapshot().await?;
    if selected.selected_product_id.as_deref() != Some(cfg.product_id.as_str()) {
        opened.close().await?;
        bail!("product {} not found in category {category}", cfg.product_id);
    }

    handle.scan()?;
    let state = handle.settle().await?;
    let outcome = match (state.phase, state.results) {
        (Phase::Results, Some(outcome)) => outcome,
        _ => {
            opened.close().await?;
            bail!("scan for {} did not produce results", cfg.product_id);
        }
    };

    if cfg.json {
        println!("{}", serde_json::to_string_pretty(&outcome.results)?);
    } else {
        println!(
            "{} similar items for {} ({}){}",
            outcome.results.len(),
            outcome.product_id,
            outcome.category,
            if outcome.from_cache { " [cached]" } else { "" }
        );
        for r in &outcome.results {
            let score = r
                .similarity_score
                .map(|s| format!("{s:.2}"))
                .unwrap_or_else(|| "-".into());
            println!("{score:>5}  {:>10.0}  {}  {}", r.price, r.title, r.product_link);
        }
    }

    if !cfg.no_history {
        let client_cfg = cfg.source.client_config()?;
        let store = JsonFilePreferenceStore::new(&client_cfg.state_file);
        let name = opened
            .observer
            .last_preview()
            .unwrap_or_else(|| outcome.product_id.clone());
        let entry = AnalysisHistoryEntry::from_outcome(&outcome, &name);
        store.update(&mut |prefs| prefs.record_analysis(entry.clone()))?;
        info!(target = "cli", path = %store.path().display(), "analysis recorded");
    }

    opened.close().await
}
