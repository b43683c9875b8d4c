use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

const APP_NAME: &str = "dependency-updates";

/// Pattern string used when unstable filtering is on but no patterns are set
pub const DEFAULT_UNSTABLE_PATTERNS: &str = "alpha, beta, -M, incubator, rc, snapshot";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read settings {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse settings {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Settings snapshot handed to the engine at the start of a run
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    /// Repositories in lookup priority order
    pub repositories: Vec<RepositoryConfig>,
    /// Skip versions matching `unstable_patterns` when looking for the latest version
    pub ignore_unstable: bool,
    /// Comma-separated substrings marking unstable versions
    pub unstable_patterns: String,
    /// Trust any TLS certificate (intranet mirrors)
    pub accept_invalid_certs: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            repositories: default_repositories(),
            ignore_unstable: true,
            unstable_patterns: DEFAULT_UNSTABLE_PATTERNS.to_string(),
            accept_invalid_certs: false,
        }
    }
}

impl Settings {
    /// Loads settings from a JSON file, filling in defaults
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let settings: Settings =
            serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(settings.normalized())
    }

    /// Loads the settings file at `path` if it exists, defaults otherwise
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Applies the fallbacks of the settings store: an empty repository list
    /// becomes the default list, blank patterns become the default patterns
    pub fn normalized(mut self) -> Self {
        if self.repositories.is_empty() {
            self.repositories = default_repositories();
        }
        if self.ignore_unstable && self.unstable_patterns.trim().is_empty() {
            self.unstable_patterns = DEFAULT_UNSTABLE_PATTERNS.to_string();
        }
        self
    }

    pub fn active_repositories(&self) -> impl Iterator<Item = &RepositoryConfig> {
        self.repositories.iter().filter(|r| r.active)
    }
}

/// One artifact repository entry
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct RepositoryConfig {
    pub active: bool,
    pub name: String,
    /// Base URL, may embed `user:password@` credentials
    pub url: String,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            active: true,
            name: String::new(),
            url: String::new(),
        }
    }
}

impl RepositoryConfig {
    pub fn new(name: &str, url: &str) -> Self {
        Self {
            active: true,
            name: name.to_string(),
            url: url.to_string(),
        }
    }
}

fn default_repositories() -> Vec<RepositoryConfig> {
    vec![
        RepositoryConfig::new("Maven Central", "https://repo.maven.apache.org/maven2"),
        RepositoryConfig::new("Google's Android", "https://dl.google.com/dl/android/maven2"),
    ]
}

/// Returns the path to the settings file.
/// Uses $XDG_CONFIG_HOME/dependency-updates/settings.json if XDG_CONFIG_HOME is set,
/// otherwise falls back to ~/.config/dependency-updates/settings.json.
pub fn settings_path() -> PathBuf {
    app_dir_with_env(
        std::env::var("XDG_CONFIG_HOME").ok(),
        dirs::home_dir(),
        ".config",
    )
    .join("settings.json")
}

/// Returns the path to the data directory for dependency-updates.
/// Uses $XDG_DATA_HOME/dependency-updates if XDG_DATA_HOME is set,
/// otherwise falls back to ~/.local/share/dependency-updates,
/// or ./dependency-updates if neither is available.
pub fn data_dir() -> PathBuf {
    app_dir_with_env(
        std::env::var("XDG_DATA_HOME").ok(),
        dirs::home_dir(),
        ".local/share",
    )
}

/// Returns the path to the log file.
pub fn log_path() -> PathBuf {
    data_dir().join(format!("{}.log", APP_NAME))
}

fn app_dir_with_env(xdg_home: Option<String>, home_dir: Option<PathBuf>, fallback: &str) -> PathBuf {
    let base = xdg_home
        .filter(|dir| !dir.is_empty())
        .map(PathBuf::from)
        .or_else(|| home_dir.map(|home| home.join(fallback)))
        .unwrap_or_else(|| PathBuf::from("."));

    base.join(APP_NAME)
}
