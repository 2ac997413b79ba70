//! Configuration management for Parley.
//!
//! Loads configuration from ${PARLEY_HOME}/config.toml with sensible defaults.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::attachment::DEFAULT_MAX_ATTACHMENT_BYTES;
use crate::download::DEFAULT_DIRECT_OPEN_HOSTS;
use crate::staging::AcceptFilter;
use crate::storage::StorageScope;

/// CSS-like style overrides, property name to value.
pub type StyleMap = BTreeMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

/// How a pending assistant reply is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TypingIndicator {
    #[default]
    Dots,
    Spinner,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ButtonIcon {
    PaperPlaneHorizontal,
    PaperPlane,
    Folder,
    File,
    Paperclip,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum IconPosition {
    Left,
    Right,
    #[default]
    Only,
}

/// Appearance of one input button.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ButtonConfig {
    pub show: bool,
    pub label: String,
    pub icon: Option<ButtonIcon>,
    pub icon_position: IconPosition,
    pub style: StyleMap,
    #[serde(rename = "className")]
    pub class_name: String,
}

impl Default for ButtonConfig {
    fn default() -> Self {
        Self {
            show: true,
            label: String::new(),
            icon: None,
            icon_position: IconPosition::Only,
            style: StyleMap::new(),
            class_name: String::new(),
        }
    }
}

impl ButtonConfig {
    pub fn attach() -> Self {
        Self {
            label: "Attach File".to_string(),
            icon: Some(ButtonIcon::Paperclip),
            ..Self::default()
        }
    }

    pub fn send() -> Self {
        Self {
            label: "Send".to_string(),
            icon: Some(ButtonIcon::PaperPlane),
            ..Self::default()
        }
    }
}

fn default_attach_button() -> ButtonConfig {
    ButtonConfig::attach()
}

fn default_send_button() -> ButtonConfig {
    ButtonConfig::send()
}

/// Download behavior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadConfig {
    /// Hosts that refuse cross-origin fetches; their files are opened
    /// directly instead of downloaded.
    pub direct_open_hosts: Vec<String>,
    /// Where downloaded files are saved. Defaults to `$PARLEY_HOME/downloads`.
    pub dir: Option<PathBuf>,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            direct_open_hosts: DEFAULT_DIRECT_OPEN_HOSTS
                .iter()
                .map(|host| (*host).to_string())
                .collect(),
            dir: None,
        }
    }
}

impl DownloadConfig {
    pub fn effective_dir(&self) -> PathBuf {
        self.dir.clone().unwrap_or_else(paths::downloads_dir)
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub theme: Theme,
    pub typing_indicator: TypingIndicator,

    /// Keep transcripts in storage between mounts.
    pub persistence: bool,
    pub persistence_type: StorageScope,

    pub container_style: StyleMap,
    pub input_container_style: StyleMap,
    pub input_text_style: StyleMap,
    pub user_bubble_style: StyleMap,
    pub assistant_bubble_style: StyleMap,

    pub fill_height: bool,
    pub fill_width: bool,
    pub class_name: String,
    pub input_placeholder: String,

    /// Accepted attachment types, e.g. `"image/*"` or `["application/pdf", ".csv"]`.
    pub supported_input_file_types: AcceptFilter,

    #[serde(default = "default_attach_button")]
    pub file_attachment_button_config: ButtonConfig,
    #[serde(default = "default_send_button")]
    pub send_button_config: ButtonConfig,

    pub max_attachment_bytes: u64,

    pub download: DownloadConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            theme: Theme::default(),
            typing_indicator: TypingIndicator::default(),
            persistence: true,
            persistence_type: StorageScope::Local,
            container_style: StyleMap::new(),
            input_container_style: StyleMap::new(),
            input_text_style: StyleMap::new(),
            user_bubble_style: StyleMap::new(),
            assistant_bubble_style: StyleMap::new(),
            fill_height: true,
            fill_width: true,
            class_name: String::new(),
            input_placeholder: String::new(),
            supported_input_file_types: AcceptFilter::default(),
            file_attachment_button_config: ButtonConfig::attach(),
            send_button_config: ButtonConfig::send(),
            max_attachment_bytes: DEFAULT_MAX_ATTACHMENT_BYTES,
            download: DownloadConfig::default(),
        }
    }
}

pub mod paths {
    //! Path resolution for Parley configuration and data directories.
    //!
    //! PARLEY_HOME resolution order:
    //! 1. PARLEY_HOME environment variable (if set)
    //! 2. ~/.config/parley (default)
    //! 3. ./.parley when no home directory is known

    use std::path::PathBuf;

    pub fn parley_home() -> PathBuf {
        if let Ok(home) = std::env::var("PARLEY_HOME") {
            return PathBuf::from(home);
        }

        dirs::home_dir().map_or_else(
            || PathBuf::from(".parley"),
            |h| h.join(".config").join("parley"),
        )
    }

    pub fn config_path() -> PathBuf {
        parley_home().join("config.toml")
    }

    /// Directory of the file-backed transcript store.
    pub fn storage_dir() -> PathBuf {
        parley_home().join("storage")
    }

    pub fn logs_dir() -> PathBuf {
        parley_home().join("logs")
    }

    pub fn downloads_dir() -> PathBuf {
        parley_home().join("downloads")
    }
}

fn default_config_template() -> &'static str {
    include_str!("../default_config.toml")
}

impl Config {
    /// Loads configuration from the default config path.
    pub fn load() -> Result<Self> {
        Self::load_from(&paths::config_path())
    }

    /// Loads configuration from a specific path.
    /// Returns defaults if file doesn't exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config from {}", path.display()))
        } else {
            Ok(Config::default())
        }
    }

    /// Creates a default config file at the given path.
    /// Returns an error if the file already exists.
    pub fn init(path: &Path) -> Result<()> {
        if path.exists() {
            anyhow::bail!("Config file already exists at {}", path.display());
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let tmp_path = path.with_extension("toml.tmp");
        fs::write(&tmp_path, default_config_template())
            .with_context(|| format!("Failed to write config to {}", tmp_path.display()))?;
        fs::rename(&tmp_path, path).with_context(|| {
            format!(
                "Failed to rename {} to {}",
                tmp_path.display(),
                path.display()
            )
        })
    }
}
