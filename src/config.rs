//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/uiwire/uiwire.toml`
//! 3. Local config: file passed via `--config`
//! 4. Environment variables: `UIWIRE_*` prefix

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::application::ApplicationError;
use crate::codec::{Format, DEFAULT_MAX_NODES};

/// Unified configuration for uiwire.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Wire format header layout (default: indexed)
    pub format: Format,
    /// Largest tree the decoder accepts, root included
    pub max_nodes: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            format: Format::default(),
            max_nodes: DEFAULT_MAX_NODES,
        }
    }
}

/// Raw settings for intermediate parsing (`None` means "not specified").
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub format: Option<Format>,
    pub max_nodes: Option<usize>,
}

/// Get the XDG config directory for uiwire.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "uiwire").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("uiwire.toml"))
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

impl Settings {
    /// Overlay wins where it specifies a value.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            format: overlay.format.unwrap_or(self.format),
            max_nodes: overlay.max_nodes.unwrap_or(self.max_nodes),
        }
    }

    /// Load settings with layered precedence.
    ///
    /// `local` is an explicitly requested config file, so it must exist.
    pub fn load(local: Option<&Path>) -> Result<Self, ApplicationError> {
        Self::load_layers(global_config_path().as_deref(), local)
    }

    /// Same as [`Settings::load`] with an explicit global config location.
    #[instrument(level = "debug")]
    pub fn load_layers(global: Option<&Path>, local: Option<&Path>) -> Result<Self, ApplicationError> {
        // 1. Start with defaults
        let mut current = Self::default();

        // 2. Global config, only if present
        if let Some(global_path) = global {
            if global_path.exists() {
                debug!("loading global config {}", global_path.display());
                current = current.merge_with(&load_raw_settings(global_path)?);
            }
        }

        // 3. Local config
        if let Some(local_path) = local {
            debug!("loading local config {}", local_path.display());
            current = current.merge_with(&load_raw_settings(local_path)?);
        }

        // 4. Environment variables
        current = Self::apply_env_overrides(current)?;

        if current.max_nodes == 0 {
            return Err(ApplicationError::Config {
                message: "max_nodes must be at least 1".to_string(),
            });
        }
        Ok(current)
    }

    /// Apply UIWIRE_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        let config = Config::builder()
            .add_source(Environment::with_prefix("UIWIRE").separator("__"))
            .build()
            .map_err(config_err)?;

        if let Ok(val) = config.get_string("format") {
            settings.format = val
                .parse()
                .map_err(|message| ApplicationError::Config { message })?;
        }
        match config.get::<usize>("max_nodes") {
            Ok(val) => settings.max_nodes = val,
            Err(ConfigError::NotFound(_)) => {}
            Err(e) => return Err(config_err(e)),
        }

        Ok(settings)
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        format!(
            r#"# uiwire configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/uiwire/uiwire.toml
#   Local:  file passed with --config
#   Env:    UIWIRE_FORMAT, UIWIRE_MAX_NODES

# Header layout: "indexed" (node id + parent id) or "positional" (inherited slot)
# format = "indexed"

# Largest tree the decoder accepts, root included
# max_nodes = {}
"#,
            DEFAULT_MAX_NODES
        )
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}
