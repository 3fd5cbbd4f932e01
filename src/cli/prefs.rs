use std::path::PathBuf;

use anyhow::Result;

use crate::prefs::{JsonFilePreferenceStore, PreferenceStore, Theme};
use crate::util::env::redact_value;

#[derive(Debug, Clone, Default)]
pub struct PrefsCommandConfig {
    pub state_file: PathBuf,
    pub set_token: Option<String>,
    pub clear_token: bool,
    pub theme: Option<Theme>,
}

#[derive(Debug, Clone)]
pub enum CartAction {
    List,
    Add(String),
    Remove(String),
}

#[derive(Debug, Clone)]
pub struct CartCommandConfig {
    pub state_file: PathBuf,
    pub action: CartAction,
}

pub fn run_prefs(cfg: PrefsCommandConfig) -> Result<()> {
    let store = JsonFilePreferenceStore::new(&cfg.state_file);
    let changed = cfg.set_token.is_some() || cfg.clear_token || cfg.theme.is_some();
    let prefs = if changed {
        store.update(&mut |prefs| {
            if cfg.clear_token {
                prefs.auth_token = None;
            }
            if let Some(token) = &cfg.set_token {
                prefs.auth_token = Some(token.clone());
            }
            if let Some(theme) = cfg.theme {
                prefs.theme = theme;
            }
        })?
    } else {
        store.load()?
    };

    let token = prefs
        .auth_token
        .as_deref()
        .map(|t| redact_value("auth_token", t))
        .unwrap_or_else(|| "-".into());
    println!("auth_token = {token}");
    println!("theme      = {}", prefs.theme);
    println!("cart       = {} item(s)", prefs.cart.len());
    println!("history    = {} analysis(es)", prefs.analysis_history.len());
    Ok(())
}

pub fn run_cart(cfg: CartCommandConfig) -> Result<()> {
    let store = JsonFilePreferenceStore::new(&cfg.state_file);
    match &cfg.action {
        CartAction::List => {
            let prefs = store.load()?;
            if prefs.cart.is_empty() {
                println!("cart is empty");
            }
            for item in &prefs.cart {
                println!(
                    "{:>3} x {:<14} added {}",
                    item.quantity,
                    item.product_id,
                    item.added_at.format("%Y-%m-%d %H:%M")
                );
            }
        }
        CartAction::Add(product_id) => {
            let mut quantity = 0;
            store.update(&mut |prefs| quantity = prefs.add_to_cart(product_id))?;
            println!("{product_id}: {quantity} in cart");
        }
        CartAction::Remove(product_id) => {
            let mut removed = false;
            store.update(&mut |prefs| removed = prefs.remove_from_cart(product_id))?;
            if removed {
                println!("{product_id} removed from cart");
            } else {
                println!("{product_id} was not in the cart");
            }
        }
    }
    Ok(())
}
