use std::path::PathBuf;

use anyhow::Result;

use crate::prefs::{JsonFilePreferenceStore, PreferenceStore};

#[derive(Debug, Clone, Default)]
pub struct HistoryCommandConfig {
    pub state_file: PathBuf,
    pub limit: usize,
    pub clear: bool,
}

pub fn run_history(cfg: HistoryCommandConfig) -> Result<()> {
    let store = JsonFilePreferenceStore::new(&cfg.state_file);
    if cfg.clear {
        store.update(&mut |prefs| prefs.analysis_history.clear())?;
        println!("analysis history cleared");
        return Ok(());
    }

    let prefs = store.load()?;
    if prefs.analysis_history.is_empty() {
        println!("no analyses recorded yet");
        return Ok(());
    }
    for entry in prefs.analysis_history.iter().take(cfg.limit.max(1)) {
        println!(
            "{}  {:<14} {:<12} {:>3} results  {}",
            entry.scanned_at.format("%Y-%m-%d %H:%M"),
            entry.product_id,
            entry.category,
            entry.result_count,
            entry.product_name
        );
    }
    Ok(())
}
