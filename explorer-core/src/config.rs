//! src/config.rs
//! ============================================================================
//! # Config: explorer configuration loader and saver
//!
//! Loads and saves settings as TOML from the platform config directory
//! using the [`directories`](https://docs.rs/directories) crate. Every
//! section has defaults, so a partial file (or none at all) is fine.
//!
//! This is the tool's own configuration (thresholds, timings, file
//! locations). The user-facing explorer settings live in the JSON settings
//! file, see [`crate::model::settings`].
//!
//! ## Example
//! ```rust,ignore
//! let config = Config::load().await?;
//! config.save().await?;
//! ```

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

use tokio::fs as TokioFs;

use crate::error::ExplorerResult;
use crate::operators::drop_zone::DropGeometry;

/// Where and how often explorer settings are written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistenceConfig {
    /// Settings file name inside the config directory.
    pub settings_file: String,

    /// Quiet period before a settings change is written.
    #[serde(with = "humantime_serde")]
    pub save_debounce: Duration,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            settings_file: "settings.json".to_string(),
            save_debounce: Duration::from_millis(250),
        }
    }
}

/// Drag evaluation timing and row metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DragConfig {
    /// Minimum time between two hover evaluations.
    #[serde(with = "humantime_serde")]
    pub frame_interval: Duration,

    /// Height of one explorer row in pixels.
    pub row_height: f64,
}

impl Default for DragConfig {
    fn default() -> Self {
        Self {
            frame_interval: Duration::from_millis(16),
            row_height: 24.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub dir: PathBuf,
    pub file_prefix: String,
    /// Default filter directive when `RUST_LOG` is unset.
    pub level: String,
    pub stderr: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("logs"),
            file_prefix: "explorer".to_string(),
            level: "info".to_string(),
            stderr: true,
        }
    }
}

/// Main configuration struct.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub geometry: DropGeometry,

    pub persistence: PersistenceConfig,

    pub drag: DragConfig,

    pub logging: LoggingConfig,
}

impl Config {
    /// Loads config from `config.toml` in the app config dir, or writes and
    /// returns the defaults when the file does not exist yet.
    pub async fn load() -> anyhow::Result<Self> {
        let path = Self::config_path()?;
        if TokioFs::try_exists(&path).await? {
            info!("Loading config from {}", path.display());
            let text = TokioFs::read_to_string(&path).await?;
            Ok(Self::parse(&text)?)
        } else {
            info!(
                "No config file found at {}, using default configuration. Creating it now.",
                path.display()
            );

            let default_config = Self::default();
            default_config.save().await?;

            Ok(default_config)
        }
    }

    /// Parse a TOML document; missing sections take their defaults.
    pub fn parse(text: &str) -> ExplorerResult<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Saves config to `config.toml` in the app config dir.
    pub async fn save(&self) -> anyhow::Result<()> {
        let path = Self::config_path()?;

        info!("Saving config to {}", path.display());

        if let Some(parent) = path.parent() {
            TokioFs::create_dir_all(parent).await?;
        }

        let toml_str = toml::to_string_pretty(self)?;
        TokioFs::write(&path, toml_str).await?;

        Ok(())
    }

    fn project_dirs() -> anyhow::Result<ProjectDirs> {
        ProjectDirs::from("org", "explorer", "Explorer")
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory."))
    }

    /// Canonical config file path.
    pub fn config_path() -> anyhow::Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Config directory; the settings file lives here too.
    pub fn config_dir() -> anyhow::Result<PathBuf> {
        Ok(Self::project_dirs()?.config_dir().to_path_buf())
    }

    /// Full path of the explorer settings file.
    pub fn settings_path(&self) -> anyhow::Result<PathBuf> {
        Ok(Self::config_dir()?.join(&self.persistence.settings_file))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = Config::parse(
            r#"
            [persistence]
            save_debounce = "1s"

            [geometry]
            root_gutter = 24.0
            "#,
        )
        .unwrap();
        assert_eq!(config.persistence.save_debounce, Duration::from_secs(1));
        assert_eq!(config.persistence.settings_file, "settings.json");
        assert_eq!(config.geometry.root_gutter, 24.0);
        assert_eq!(config.geometry.top_whitespace, 40.0);
        assert_eq!(config.drag.frame_interval, Duration::from_millis(16));
    }

    #[test]
    fn test_defaults_round_trip_through_toml() {
        let text = toml::to_string_pretty(&Config::default()).unwrap();
        assert!(text.contains("save_debounce = \"250ms\""));
        assert_eq!(Config::parse(&text).unwrap(), Config::default());
    }

    #[test]
    fn test_bad_toml_is_config_error() {
        let err = Config::parse("geometry = 3").unwrap_err();
        assert!(matches!(err, crate::error::ExplorerError::Config(_)));
    }
}
