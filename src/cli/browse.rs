use anyhow::Result;

use super::{open_session, print_products, SourceConfig};
use crate::catalog::ScrollMetrics;

/// Height of the simulated grid viewport used for scroll events.
const VIEWPORT_PX: f64 = 800.0;
/// Rendered height of one grid row of products.
const ROW_PX: f64 = 320.0;
const COLUMNS: usize = 4;

#[derive(Debug, Clone, Default)]
pub struct CategoriesCommandConfig {
    pub source: SourceConfig,
}

#[derive(Debug, Clone, Default)]
pub struct BrowseCommandConfig {
    pub source: SourceConfig,
    pub category: Option<String>,
    /// Seed state from a `cat=..&pid=..` query instead of `category`
    pub query: Option<String>,
    /// Number of scroll-to-bottom events to simulate
    pub scrolls: u32,
    pub json: bool,
}

pub async fn run_categories(cfg: CategoriesCommandConfig) -> Result<()> {
    let opened = open_session(&cfg.source, None).await?;
    let categories = &opened.ready.categories;
    if categories.is_empty() {
        println!("no categories have items");
    }
    for (name, count) in categories {
        println!("{count:>6}  {name}");
    }
    opened.close().await
}

pub async fn run_browse(cfg: BrowseCommandConfig) -> Result<()> {
    let opened = open_session(&cfg.source, cfg.query.as_deref()).await?;
    let handle = &opened.handle;
    if let Some(category) = &cfg.category {
        handle.select_category(category.clone())?;
    }

    for _ in 0..cfg.scrolls {
        let state = handle.snapshot().await?;
        let rows = state.visible.len().div_ceil(COLUMNS) as f64;
        let scroll_height = (rows * ROW_PX).max(VIEWPORT_PX);
        handle.scroll(ScrollMetrics::at_bottom(scroll_height, VIEWPORT_PX))?;
    }

    let state = handle.snapshot().await?;
    if cfg.json {
        println!("{}", serde_json::to_string_pretty(&state.visible)?);
    } else {
        print_products(&state.visible);
        println!(
            "showing {} of {} (window {}){}",
            state.visible.len(),
            state.filtered_len,
            state.display_count,
            if state.query.is_empty() {
                String::new()
            } else {
                format!("  ?{}", state.query)
            }
        );
    }
    opened.close().await
}
