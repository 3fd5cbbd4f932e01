// Persisted user preferences: auth token, theme, cart and analysis history.
//
// Stores are injected behind `PreferenceStore` so nothing in the catalog
// pipeline reaches for ambient global state.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Mutex;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::ScanOutcome;

pub const HISTORY_LIMIT: usize = 50;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisHistoryEntry {
    pub product_id: String,
    pub product_name: String,
    pub category: String,
    pub result_count: usize,
    pub scanned_at: DateTime<Utc>,
}

impl AnalysisHistoryEntry {
    pub fn from_outcome(outcome: &ScanOutcome, product_name: &str) -> Self {
        Self {
            product_id: outcome.product_id.clone(),
            product_name: product_name.to_string(),
            category: outcome.category.clone(),
            result_count: outcome.results.len(),
            scanned_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            other => Err(format!("unknown theme {other:?} (expected light or dark)")),
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: String,
    pub quantity: u32,
    pub added_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,
    #[serde(default)]
    pub theme: Theme,
    #[serde(default)]
    pub cart: Vec<CartItem>,
    /// Newest first.
    #[serde(default)]
    pub analysis_history: Vec<AnalysisHistoryEntry>,
}

impl Preferences {
    /// Add one unit of `product_id`; returns the resulting quantity.
    pub fn add_to_cart(&mut self, product_id: &str) -> u32 {
        if let Some(item) = self.cart.iter_mut().find(|i| i.product_id == product_id) {
            item.quantity += 1;
            return item.quantity;
        }
        self.cart.push(CartItem {
            product_id: product_id.to_string(),
            quantity: 1,
            added_at: Utc::now(),
        });
        1
    }

    /// Drop the whole line for `product_id`. Returns whether it was present.
    pub fn remove_from_cart(&mut self, product_id: &str) -> bool {
        let before = self.cart.len();
        self.cart.retain(|i| i.product_id != product_id);
        self.cart.len() != before
    }

    /// Prepend an entry, keeping at most `HISTORY_LIMIT`.
    pub fn record_analysis(&mut self, entry: AnalysisHistoryEntry) {
        self.analysis_history.insert(0, entry);
        self.analysis_history.truncate(HISTORY_LIMIT);
    }
}

pub trait PreferenceStore: Send + Sync {
    fn load(&self) -> Result<Preferences>;
    fn save(&self, prefs: &Preferences) -> Result<()>;

    /// Read-modify-write helper.
    fn update(&self, f: &mut dyn FnMut(&mut Preferences)) -> Result<Preferences> {
        let mut prefs = self.load()?;
        f(&mut prefs);
        self.save(&prefs)?;
        Ok(prefs)
    }
}

#[derive(Debug, Default)]
pub struct MemoryPreferenceStore {
    inner: Mutex<Preferences>,
}

impl PreferenceStore for MemoryPreferenceStore {
    fn load(&self) -> Result<Preferences> {
        self.inner
            .lock()
            .map(|p| p.clone())
            .map_err(|_| anyhow!("preference store poisoned"))
    }

    fn save(&self, prefs: &Preferences) -> Result<()> {
        let mut guard = self
            .inner
            .lock()
            .map_err(|_| anyhow!("preference store poisoned"))?;
        *guard = prefs.clone();
        Ok(())
    }
}

/// JSON file store; a missing file reads as default preferences.
#[derive(Debug, Clone)]
pub struct JsonFilePreferenceStore {
    path: PathBuf,
}

impl JsonFilePreferenceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PreferenceStore for JsonFilePreferenceStore {
    fn load(&self) -> Result<Preferences> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) => serde_json::from_str(&raw)
                .with_context(|| format!("failed to parse {}", self.path.display())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Preferences::default()),
            Err(e) => Err(e).with_context(|| format!("failed to read {}", self.path.display())),
        }
    }

    fn save(&self, prefs: &Preferences) -> Result<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("failed to create {}", dir.display()))?;
        }
        let body = serde_json::to_string_pretty(prefs)?;
        // Write-then-rename so a crash never leaves a truncated file
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, body).with_context(|| format!("failed to write {}", tmp.display()))?;
        std::fs::rename(&tmp, &self.path)
            .with_context(|| format!("failed to replace {}", self.path.display()))?;
        debug!(target = "prefs", path = %self.path.display(), "preferences saved");
        Ok(())
    }
}
