//! Site configuration
//!
//! A single JSON file holding the tunable thresholds of every component plus
//! the local back-end data directory. Every field has a serde default, so a
//! partial (or missing) file still yields a complete configuration.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::constants::{self, forms, menu, notify, reveal, scroll, typing};

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub scroll: ScrollSettings,
    #[serde(default)]
    pub menu: MenuSettings,
    #[serde(default)]
    pub reveal: RevealSettings,
    #[serde(default)]
    pub typing: TypingSettings,
    #[serde(default)]
    pub forms: FormSettings,
    /// Where the local back end keeps its JSON files and uploads
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrollSettings {
    pub header_height: f64,
    pub scrolled_offset: f64,
    pub back_to_top_offset: f64,
    pub debounce_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MenuSettings {
    pub breakpoint: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RevealSettings {
    pub fade_threshold: f64,
    pub counter_threshold: f64,
    pub counter_duration_ms: u64,
    pub counter_steps: u32,
    pub fallback_debounce_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TypingSettings {
    pub phrases: Vec<String>,
    pub speed_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormSettings {
    pub max_upload_bytes: u64,
    pub allowed_upload_types: Vec<String>,
    pub notification_ms: u64,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ScrollSettings {
    fn default() -> Self {
        Self {
            header_height: scroll::DEFAULT_HEADER_HEIGHT,
            scrolled_offset: scroll::NAVBAR_SCROLLED_OFFSET,
            back_to_top_offset: scroll::BACK_TO_TOP_OFFSET,
            debounce_ms: scroll::DEBOUNCE_MS,
        }
    }
}

impl Default for MenuSettings {
    fn default() -> Self {
        Self {
            breakpoint: menu::DESKTOP_BREAKPOINT,
        }
    }
}

impl Default for RevealSettings {
    fn default() -> Self {
        Self {
            fade_threshold: reveal::FADE_THRESHOLD,
            counter_threshold: reveal::COUNTER_THRESHOLD,
            counter_duration_ms: reveal::COUNTER_DURATION_MS,
            counter_steps: reveal::COUNTER_STEPS,
            fallback_debounce_ms: reveal::FALLBACK_DEBOUNCE_MS,
        }
    }
}

impl Default for TypingSettings {
    fn default() -> Self {
        Self {
            phrases: typing::PHRASES.iter().map(|p| p.to_string()).collect(),
            speed_ms: typing::SPEED_MS,
        }
    }
}

impl Default for FormSettings {
    fn default() -> Self {
        Self {
            max_upload_bytes: forms::MAX_UPLOAD_BYTES,
            allowed_upload_types: forms::ALLOWED_UPLOAD_TYPES
                .iter()
                .map(|t| t.to_string())
                .collect(),
            notification_ms: notify::AUTO_DISMISS_MS,
        }
    }
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            scroll: ScrollSettings::default(),
            menu: MenuSettings::default(),
            reveal: RevealSettings::default(),
            typing: TypingSettings::default(),
            forms: FormSettings::default(),
            data_dir: None,
        }
    }
}

impl SiteConfig {
    pub fn path() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push(constants::config::APP_DIR);
        path.push(constants::config::FILENAME);
        path
    }

    /// Load from the default location, falling back to defaults when absent
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::path())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {:?}", path))?;

        let config: SiteConfig = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse JSON config from {:?}", path))?;

        info!(path = %path.display(), "Loaded site config");
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory {:?}", parent))?;
        }

        let json = serde_json::to_string_pretty(self).context("Failed to serialize config to JSON")?;

        fs::write(path, json).with_context(|| format!("Failed to write config to {:?}", path))?;

        info!(path = %path.display(), "Saved site config");
        Ok(())
    }

    /// Data directory for the local back end (explicit setting, else platform data dir)
    pub fn data_dir(&self) -> PathBuf {
        if let Some(dir) = &self.data_dir {
            return dir.clone();
        }
        let mut path = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push(constants::config::APP_DIR);
        path
    }
}
