use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{DeskError, Result};

pub const URL_ENV: &str = "SUPABASE_URL";
pub const KEY_ENV: &str = "SUPABASE_KEY";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub store_url: String,
    #[serde(default)]
    pub store_key: String,
    #[serde(default = "default_startup_budget")]
    pub startup_budget: f64,
    #[serde(default = "default_title")]
    pub title: String,
}

fn default_startup_budget() -> f64 {
    35_000.0
}

fn default_title() -> String {
    "DXC-HPI Reporting Tool".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            store_url: String::new(),
            store_key: String::new(),
            startup_budget: default_startup_budget(),
            title: default_title(),
        }
    }
}

/// Connection details for the remote store after env overrides are applied.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreCredentials {
    pub url: String,
    pub key: String,
}

impl Settings {
    /// Resolve store credentials, preferring `SUPABASE_URL` / `SUPABASE_KEY`.
    pub fn credentials(&self) -> Result<StoreCredentials> {
        self.credentials_with(|name| std::env::var(name).ok())
    }

    fn credentials_with(&self, env: impl Fn(&str) -> Option<String>) -> Result<StoreCredentials> {
        let url = env(URL_ENV)
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| self.store_url.clone());
        let key = env(KEY_ENV)
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| self.store_key.clone());

        let mut missing = Vec::new();
        if url.trim().is_empty() {
            missing.push(URL_ENV);
        }
        if key.trim().is_empty() {
            missing.push(KEY_ENV);
        }
        if !missing.is_empty() {
            return Err(DeskError::Config(format!(
                "store secret not found: {}. Run `dispatch-desk init` or set the environment variables.",
                missing.join(", ")
            )));
        }
        Ok(StoreCredentials {
            url: url.trim().trim_end_matches('/').to_string(),
            key: key.trim().to_string(),
        })
    }
}

pub fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("dispatch-desk")
}

fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

pub fn load_settings() -> Settings {
    let path = settings_path();
    if path.exists() {
        let content = std::fs::read_to_string(&path).unwrap_or_default();
        serde_json::from_str(&content).unwrap_or_default()
    } else {
        Settings::default()
    }
}

pub fn save_settings(settings: &Settings) -> Result<()> {
    let dir = config_dir();
    std::fs::create_dir_all(&dir)?;
    let json = serde_json::to_string_pretty(settings)?;
    std::fs::write(settings_path(), format!("{json}\n"))?;
    Ok(())
}

pub fn settings_file_exists() -> bool {
    settings_path().exists()
}
