use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use core_types::{NavigationMode, UiLanguage};
use serde::{Deserialize, Serialize};
use tracing::warn;

pub const CURRENT_SCHEMA_VERSION: u32 = 2;
pub const DEFAULT_BASE_PATH: &str = "/app";
pub const DEFAULT_TITLE_SUFFIX: &str = "Cabinet Management";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default)]
    pub encrypt_at_rest: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub schema_version: u32,
    pub language: UiLanguage,
    pub server_url: String,
    #[serde(default = "default_base_path")]
    pub base_path: String,
    #[serde(default = "default_title_suffix")]
    pub title_suffix: String,
    #[serde(default)]
    pub link_mode: NavigationMode,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    #[serde(default)]
    pub session: SessionConfig,
}

fn default_base_path() -> String {
    DEFAULT_BASE_PATH.to_string()
}

fn default_title_suffix() -> String {
    DEFAULT_TITLE_SUFFIX.to_string()
}

const fn default_request_timeout_ms() -> u64 {
    10_000
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            schema_version: CURRENT_SCHEMA_VERSION,
            language: UiLanguage::FrFr,
            server_url: "http://127.0.0.1:8000".to_string(),
            base_path: default_base_path(),
            title_suffix: default_title_suffix(),
            link_mode: NavigationMode::Hard,
            request_timeout_ms: default_request_timeout_ms(),
            session: SessionConfig {
                encrypt_at_rest: false,
            },
        }
    }
}

impl AppConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms.max(1))
    }

    pub fn server_root(&self) -> &str {
        self.server_url.trim_end_matches('/')
    }
}

pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn from_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            path: dir.into().join("config.json"),
        }
    }

    pub fn from_default_location() -> Result<Self> {
        let mut dir = dirs::config_dir().context("failed to resolve config_dir")?;
        dir.push("cabinet");
        Ok(Self::from_dir(dir))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load_or_init(&self) -> Result<AppConfig> {
        if !self.path.exists() {
            let config = AppConfig::default();
            self.save(&config)?;
            return Ok(config);
        }

        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read {}", self.path.display()))?;
        let mut config: AppConfig =
            serde_json::from_str(&raw).context("failed to parse app config json")?;
        self.migrate(&mut config);
        self.save(&config)?;
        Ok(config)
    }

    pub fn save(&self, config: &AppConfig) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }

        let text = serde_json::to_string_pretty(config).context("failed to serialize config")?;
        fs::write(&self.path, text)
            .with_context(|| format!("failed to write {}", self.path.display()))?;
        Ok(())
    }

    fn migrate(&self, config: &mut AppConfig) {
        if config.schema_version >= CURRENT_SCHEMA_VERSION {
            return;
        }

        warn!(
            from = config.schema_version,
            to = CURRENT_SCHEMA_VERSION,
            "migrating app config schema"
        );

        // v1 stored the base path with a trailing slash.
        let trimmed = config.base_path.trim_end_matches('/');
        config.base_path = if trimmed.is_empty() {
            default_base_path()
        } else if trimmed.starts_with('/') {
            trimmed.to_string()
        } else {
            format!("/{trimmed}")
        };
        config.schema_version = CURRENT_SCHEMA_VERSION;
    }
}
