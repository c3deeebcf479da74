use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::boundary::RuntimeCommand;
use crate::engine::DEFAULT_QUIET_PERIOD;
use crate::util::paths::{config_path, snippets_dir};

/// Example configuration file contents (bundled with the binary)
pub const EXAMPLE_CONFIG: &str = include_str!("config.toml.example");

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Quiet period before a debounced reload
    pub quiet_period: Duration,
    /// Command hosting the isolation boundary
    pub runtime: RuntimeCommand,
    /// Directory for saved snippets
    pub snippets_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            quiet_period: DEFAULT_QUIET_PERIOD,
            runtime: RuntimeCommand::default(),
            snippets_dir: snippets_dir(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlPreviewConfig {
    pub debounce_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlRuntimeConfig {
    pub program: Option<PathBuf>,
    pub args: Option<Vec<String>>,
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlSnippetsConfig {
    pub dir: Option<PathBuf>,
}

/// TOML representation of the config file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    pub preview: Option<TomlPreviewConfig>,
    pub runtime: Option<TomlRuntimeConfig>,
    pub snippets: Option<TomlSnippetsConfig>,
}

impl Config {
    /// Load `~/.livepreview/config.toml`, merging with defaults.
    ///
    /// Writes the bundled example on first run.
    pub fn load() -> Result<Self, ConfigError> {
        let path = config_path();
        if !path.exists() {
            Self::create_default_config(&path);
        }
        Self::load_from(&path)
    }

    /// Load a specific file. A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        let toml_config =
            toml::from_str::<TomlConfig>(&contents).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Self::default().merge(toml_config))
    }

    /// Overlay the settings present in `toml_config`
    pub fn merge(mut self, toml_config: TomlConfig) -> Self {
        if let Some(preview) = toml_config.preview {
            if let Some(ms) = preview.debounce_ms {
                self.quiet_period = Duration::from_millis(ms);
            }
        }

        if let Some(runtime) = toml_config.runtime {
            if let Some(program) = runtime.program {
                self.runtime.program = program;
            }
            if let Some(args) = runtime.args {
                self.runtime.args = args;
            }
            self.runtime.env.extend(runtime.env);
        }

        if let Some(snippets) = toml_config.snippets {
            if let Some(dir) = snippets.dir {
                self.snippets_dir = dir;
            }
        }

        self
    }

    fn create_default_config(path: &Path) {
        if let Some(parent) = path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                tracing::warn!("Failed to create config directory: {e}");
                return;
            }
        }
        if let Err(e) = fs::write(path, EXAMPLE_CONFIG) {
            tracing::warn!("Failed to write default config: {e}");
        }
    }

    pub fn with_quiet_period(mut self, quiet_period: Duration) -> Self {
        self.quiet_period = quiet_period;
        self
    }
}
