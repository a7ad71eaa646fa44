//! Runtime configuration.
//!
//! # Responsibility
//! - Load settings from an optional TOML file, then environment overrides.
//! - Validate values before any store or fetcher is built from them.
//!
//! # Invariants
//! - Every section has defaults; an empty file is a valid config.
//! - The SQLite backend always has a database path after validation.

use crate::search::suggest::{SuggestConfig, DEFAULT_DEBOUNCE, DEFAULT_SUGGESTION_LIMIT};
use crate::service::history_service::{DEFAULT_HISTORY_CAPACITY, DEFAULT_HISTORY_VIEW};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Env var naming the config file when `--config` is not given.
pub const CONFIG_PATH_ENV: &str = "BIZLOOKUP_CONFIG";

const BACKEND_ENV: &str = "BIZLOOKUP_BACKEND";
const DB_PATH_ENV: &str = "BIZLOOKUP_DB_PATH";
const DEBOUNCE_ENV: &str = "BIZLOOKUP_DEBOUNCE_MS";
const LOG_LEVEL_ENV: &str = "BIZLOOKUP_LOG_LEVEL";
const LOG_DIR_ENV: &str = "BIZLOOKUP_LOG_DIR";

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Configuration loading or validation failure.
#[derive(Debug)]
pub enum ConfigError {
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        origin: String,
        message: String,
    },
    InvalidValue {
        key: &'static str,
        message: String,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Read { path, source } => {
                write!(f, "cannot read config `{}`: {source}", path.display())
            }
            Self::Parse { origin, message } => write!(f, "cannot parse config {origin}: {message}"),
            Self::InvalidValue { key, message } => write!(f, "invalid `{key}`: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Read { source, .. } => Some(source),
            Self::Parse { .. } | Self::InvalidValue { .. } => None,
        }
    }
}

/// Which directory/history implementation to compose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Seeded in-memory mock data; nothing persists.
    #[default]
    Memory,
    /// SQLite file at `storage.db_path`.
    Sqlite,
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "memory" | "mock" => Ok(Self::Memory),
            "sqlite" => Ok(Self::Sqlite),
            other => Err(format!("unknown backend `{other}`; expected memory|sqlite")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    pub debounce_ms: u64,
    pub suggestion_limit: usize,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            debounce_ms: u64::try_from(DEFAULT_DEBOUNCE.as_millis()).unwrap_or(300),
            suggestion_limit: DEFAULT_SUGGESTION_LIMIT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistorySettings {
    pub capacity: usize,
    pub view_size: usize,
}

impl Default for HistorySettings {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_HISTORY_CAPACITY,
            view_size: DEFAULT_HISTORY_VIEW,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    pub backend: BackendKind,
    pub db_path: Option<PathBuf>,
    /// Artificial delay for every mock directory call.
    pub simulated_latency_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: Option<String>,
    /// Absolute directory for rolling log files; logging stays off when unset.
    pub dir: Option<PathBuf>,
}

/// Complete runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LookupConfig {
    pub search: SearchSettings,
    pub history: HistorySettings,
    pub storage: StorageSettings,
    pub logging: LoggingSettings,
}

impl LookupConfig {
    /// Loads the config file (explicit path, else `BIZLOOKUP_CONFIG`, else
    /// defaults), applies environment overrides and validates the result.
    pub fn load(explicit_path: Option<&Path>) -> ConfigResult<Self> {
        let path = explicit_path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from));

        let mut config = match path {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses one TOML file without applying overrides.
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&raw).map_err(|err| ConfigError::Parse {
            origin: format!("`{}`", path.display()),
            message: err.to_string(),
        })
    }

    /// Parses TOML text without applying overrides.
    pub fn from_toml_str(raw: &str) -> ConfigResult<Self> {
        toml::from_str(raw).map_err(|err| ConfigError::Parse {
            origin: "text".to_string(),
            message: err.to_string(),
        })
    }

    /// Applies `BIZLOOKUP_*` overrides resolved through `lookup`.
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> ConfigResult<()> {
        if let Some(value) = lookup(BACKEND_ENV) {
            self.storage.backend =
                value
                    .parse::<BackendKind>()
                    .map_err(|message| ConfigError::InvalidValue {
                        key: BACKEND_ENV,
                        message,
                    })?;
        }
        if let Some(value) = lookup(DB_PATH_ENV) {
            self.storage.db_path = Some(PathBuf::from(value));
        }
        if let Some(value) = lookup(DEBOUNCE_ENV) {
            self.search.debounce_ms =
                value
                    .trim()
                    .parse::<u64>()
                    .map_err(|err| ConfigError::InvalidValue {
                        key: DEBOUNCE_ENV,
                        message: format!("`{value}`: {err}"),
                    })?;
        }
        if let Some(value) = lookup(LOG_LEVEL_ENV) {
            self.logging.level = Some(value);
        }
        if let Some(value) = lookup(LOG_DIR_ENV) {
            self.logging.dir = Some(PathBuf::from(value));
        }
        Ok(())
    }

    /// Checks cross-field constraints.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.search.suggestion_limit == 0 {
            return Err(invalid("search.suggestion_limit", "must be at least 1"));
        }
        if self.history.capacity == 0 {
            return Err(invalid("history.capacity", "must be at least 1"));
        }
        if self.history.view_size == 0 {
            return Err(invalid("history.view_size", "must be at least 1"));
        }
        if self.storage.backend == BackendKind::Sqlite && self.storage.db_path.is_none() {
            return Err(invalid(
                "storage.db_path",
                "required when storage.backend = \"sqlite\"",
            ));
        }
        Ok(())
    }

    pub fn suggest_config(&self) -> SuggestConfig {
        SuggestConfig {
            debounce: Duration::from_millis(self.search.debounce_ms),
            limit: self.search.suggestion_limit,
        }
    }

    pub fn simulated_latency(&self) -> Duration {
        Duration::from_millis(self.storage.simulated_latency_ms)
    }
}

fn invalid(key: &'static str, message: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key,
        message: message.to_string(),
    }
}
