use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context};
use client_core::DEFAULT_API_BASE;
use serde::Deserialize;
use url::Url;

pub const DEFAULT_CONFIG_FILE: &str = "pdfchat.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub api_base: String,
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.into(),
            log_filter: "info".into(),
        }
    }
}

impl Settings {
    pub fn api_url(&self) -> anyhow::Result<Url> {
        let url = Url::parse(self.api_base.trim())
            .with_context(|| format!("invalid api base url '{}'", self.api_base))?;
        if !matches!(url.scheme(), "http" | "https") {
            bail!("api base url must use http or https, got '{}'", url.scheme());
        }
        Ok(url)
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    api_base: Option<String>,
    log_filter: Option<String>,
}

/// Flags that override file and environment settings.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub config_path: Option<PathBuf>,
    pub api_base: Option<String>,
    pub log_filter: Option<String>,
}

pub fn load_settings(overrides: &Overrides) -> anyhow::Result<Settings> {
    load_settings_with_env(overrides, |key| std::env::var(key).ok())
}

/// Defaults, then the config file, then environment, then flags.
pub fn load_settings_with_env(
    overrides: &Overrides,
    env: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    let file_cfg = match &overrides.config_path {
        Some(path) => Some(read_config_file(path)?),
        None => {
            let default_path = Path::new(DEFAULT_CONFIG_FILE);
            if default_path.exists() {
                Some(read_config_file(default_path)?)
            } else {
                None
            }
        }
    };
    if let Some(file_cfg) = file_cfg {
        if let Some(v) = file_cfg.api_base {
            settings.api_base = v;
        }
        if let Some(v) = file_cfg.log_filter {
            settings.log_filter = v;
        }
    }

    if let Some(v) = env("PDFCHAT_API_BASE") {
        settings.api_base = v;
    }
    if let Some(v) = env("APP__API_BASE") {
        settings.api_base = v;
    }

    if let Some(v) = env("PDFCHAT_LOG") {
        settings.log_filter = v;
    }
    if let Some(v) = env("APP__LOG_FILTER") {
        settings.log_filter = v;
    }

    if let Some(v) = &overrides.api_base {
        settings.api_base = v.clone();
    }
    if let Some(v) = &overrides.log_filter {
        settings.log_filter = v.clone();
    }

    Ok(settings)
}

fn read_config_file(path: &Path) -> anyhow::Result<FileSettings> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file '{}'", path.display()))?;
    toml::from_str(&raw).with_context(|| format!("failed to parse config file '{}'", path.display()))
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
