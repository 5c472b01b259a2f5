use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{anyhow, bail, Context, Result};
use client_core::{RestConfig, Viewer};
use serde::Deserialize;
use shared::domain::Role;
use tracing::warn;
use url::Url;

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub backend_url: Option<String>,
    pub api_key: Option<String>,
    pub access_token: Option<String>,
    pub user_id: Option<String>,
    pub full_name: Option<String>,
    pub role: Option<Role>,
    pub request_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            backend_url: None,
            api_key: None,
            access_token: None,
            user_id: None,
            full_name: None,
            role: None,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl Settings {
    /// REST settings, or `None` when no backend is configured.
    pub fn rest_config(&self) -> Result<Option<RestConfig>> {
        let Some(raw_url) = self.backend_url.as_deref() else {
            return Ok(None);
        };
        let backend_url = normalize_backend_url(raw_url)?;
        let api_key = self
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| anyhow!("api_key is required when backend_url is set"))?;

        Ok(Some(RestConfig {
            backend_url,
            api_key,
            access_token: self.access_token.clone(),
            request_timeout: (self.request_timeout_secs > 0)
                .then(|| Duration::from_secs(self.request_timeout_secs)),
        }))
    }

    pub fn viewer(&self) -> Option<Viewer> {
        let user_id = self.user_id.as_deref().filter(|id| !id.trim().is_empty())?;
        let full_name = self.full_name.as_deref().unwrap_or(user_id);
        Some(Viewer::new(user_id, full_name, self.role))
    }
}

pub fn default_config_path() -> Result<PathBuf> {
    let base = dirs::config_dir().ok_or_else(|| anyhow!("unable to resolve config dir"))?;
    Ok(base.join("hirrd").join("config.toml"))
}

/// Defaults, then the TOML file at `path` when it exists, then `HIRRD_*`
/// environment variables.
pub fn load_settings(path: &Path) -> Result<Settings> {
    let mut settings = read_file(path)?.unwrap_or_default();
    apply_env(&mut settings, |key| std::env::var(key).ok());
    Ok(settings)
}

fn read_file(path: &Path) -> Result<Option<Settings>> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read config '{}'", path.display()))?;
    let settings = toml::from_str(&raw)
        .with_context(|| format!("failed to parse config '{}'", path.display()))?;
    Ok(Some(settings))
}

fn apply_env(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("HIRRD_BACKEND_URL") {
        settings.backend_url = Some(v);
    }
    if let Some(v) = lookup("HIRRD_API_KEY") {
        settings.api_key = Some(v);
    }
    if let Some(v) = lookup("HIRRD_ACCESS_TOKEN") {
        settings.access_token = Some(v);
    }
    if let Some(v) = lookup("HIRRD_USER_ID") {
        settings.user_id = Some(v);
    }
    if let Some(v) = lookup("HIRRD_FULL_NAME") {
        settings.full_name = Some(v);
    }
    if let Some(v) = lookup("HIRRD_ROLE") {
        match Role::parse(&v) {
            Some(role) => settings.role = Some(role),
            None => warn!(value = %v, "ignoring unknown HIRRD_ROLE"),
        }
    }
    if let Some(v) = lookup("HIRRD_REQUEST_TIMEOUT_SECS") {
        match v.parse::<u64>() {
            Ok(parsed) => settings.request_timeout_secs = parsed,
            Err(_) => warn!(value = %v, "ignoring non-numeric HIRRD_REQUEST_TIMEOUT_SECS"),
        }
    }
}

pub fn normalize_backend_url(raw: &str) -> Result<String> {
    let raw = raw.trim();
    let url = Url::parse(raw).with_context(|| format!("invalid backend url '{raw}'"))?;
    if !matches!(url.scheme(), "http" | "https") {
        bail!("backend url must use http or https, got '{}'", url.scheme());
    }
    Ok(url.as_str().trim_end_matches('/').to_string())
}

/// Writes the onboarding choice into the config file, keeping other keys.
pub fn save_role(path: &Path, role: Role) -> Result<()> {
    let mut table = if path.exists() {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config '{}'", path.display()))?;
        raw.parse::<toml::Table>()
            .with_context(|| format!("failed to parse config '{}'", path.display()))?
    } else {
        toml::Table::new()
    };
    table.insert("role".into(), toml::Value::String(role.as_str().into()));

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| {
            format!("failed to create config directory '{}'", parent.display())
        })?;
    }
    let rendered = toml::to_string_pretty(&table).context("failed to render config")?;
    fs::write(path, rendered)
        .with_context(|| format!("failed to write config '{}'", path.display()))?;
    Ok(())
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
