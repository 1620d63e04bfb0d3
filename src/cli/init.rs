use colored::Colorize;

use crate::error::{DeskError, Result};
use crate::settings::{config_dir, load_settings, save_settings, Settings};

/// Merge new connection details into the saved settings. An omitted key or
/// budget keeps whatever was saved before.
pub fn apply(mut settings: Settings, url: &str, key: Option<&str>, budget: Option<f64>) -> Result<Settings> {
    let url = url.trim().trim_end_matches('/');
    if !(url.starts_with("https://") || url.starts_with("http://")) {
        return Err(DeskError::InvalidInput(format!(
            "store URL must start with http:// or https://, got '{url}'"
        )));
    }
    settings.store_url = url.to_string();
    if let Some(k) = key {
        settings.store_key = k.trim().to_string();
    }
    if let Some(b) = budget {
        if !b.is_finite() || b < 0.0 {
            return Err(DeskError::InvalidInput(format!("budget must be zero or more, got {b}")));
        }
        settings.startup_budget = b;
    }
    Ok(settings)
}

pub fn run(url: &str, key: Option<&str>, budget: Option<f64>) -> Result<()> {
    let settings = apply(load_settings(), url, key, budget)?;
    save_settings(&settings)?;
    println!(
        "{} {}",
        "Saved settings to".green(),
        config_dir().join("settings.json").display()
    );
    if settings.store_key.is_empty() {
        println!("No API key saved. Set SUPABASE_KEY or rerun with --key.");
    }
    Ok(())
}
