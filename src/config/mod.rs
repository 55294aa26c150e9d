//! Configuration management.
//!
//! Sources, later ones winning:
//! 1. Built-in defaults
//! 2. A TOML file (`load_from_file`, or `load_default` for the standard
//!    locations)
//! 3. `NEWSLEDGER_*` environment variables (`apply_env_overrides`)

mod limits;

pub use limits::FieldLimits;

use crate::observability::{
    DEFAULT_EVENT_BUS_CAPACITY, LogFormat, LoggingConfig, MetricsConfig, ObservabilityConfig,
};
use crate::storage::{MemoryBackend, PersistenceBackend, SqliteBackend};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Durable substrate selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendKind {
    /// Volatile, process-local storage.
    Memory,
    /// `SQLite` database file.
    #[default]
    Sqlite,
}

impl BackendKind {
    /// Parses a backend name.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidInput`] for an unknown name.
    pub fn parse(s: &str) -> crate::Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "memory" | "mem" | "in-memory" => Ok(Self::Memory),
            "sqlite" => Ok(Self::Sqlite),
            other => Err(crate::Error::InvalidInput(format!(
                "unknown backend '{other}' (expected 'sqlite' or 'memory')"
            ))),
        }
    }

    /// Returns the backend name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Sqlite => "sqlite",
        }
    }
}

/// Main configuration for newsledger.
#[derive(Debug, Clone)]
pub struct LedgerConfig {
    /// Directory holding the database when `db_path` is unset.
    pub data_dir: PathBuf,
    /// Durable substrate.
    pub backend: BackendKind,
    /// Explicit database path; defaults to `<data_dir>/ledger.db`.
    pub db_path: Option<PathBuf>,
    /// Field truncation applied before fingerprinting.
    pub limits: FieldLimits,
    /// Logging configuration.
    pub logging: LoggingConfig,
    /// Metrics configuration.
    pub metrics: MetricsConfig,
    /// Buffer size of the admission event bus.
    pub event_bus_capacity: usize,
}

/// Configuration file structure (for TOML parsing).
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Data directory.
    pub data_dir: Option<String>,
    /// Backend name (`sqlite` or `memory`).
    pub backend: Option<String>,
    /// Database path.
    pub db_path: Option<String>,
    /// Event bus capacity.
    pub event_bus_capacity: Option<usize>,
    /// Field limits.
    pub limits: Option<ConfigFileLimits>,
    /// Logging section.
    pub logging: Option<ConfigFileLogging>,
    /// Metrics section.
    pub metrics: Option<ConfigFileMetrics>,
}

/// `[limits]` section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileLimits {
    /// Whether truncation is applied.
    pub enabled: Option<bool>,
    /// Title limit in chars.
    pub title: Option<usize>,
    /// Content limit in chars.
    pub content: Option<usize>,
    /// Summary limit in chars.
    pub summary: Option<usize>,
    /// Source limit in chars.
    pub source: Option<usize>,
    /// Link limit in chars.
    pub link: Option<usize>,
    /// Tags limit in chars.
    pub tags: Option<usize>,
}

/// `[logging]` section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileLogging {
    /// `pretty` or `json`.
    pub format: Option<String>,
    /// Default filter directive.
    pub level: Option<String>,
    /// Log file path.
    pub file: Option<String>,
}

/// `[metrics]` section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileMetrics {
    /// Whether metrics are enabled.
    pub enabled: Option<bool>,
    /// Listener port.
    pub port: Option<u16>,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".newsledger"),
            backend: BackendKind::default(),
            db_path: None,
            limits: FieldLimits::default(),
            logging: LoggingConfig::default(),
            metrics: MetricsConfig::default(),
            event_bus_capacity: DEFAULT_EVENT_BUS_CAPACITY,
        }
    }
}

impl LedgerConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_file(path: &Path) -> crate::Result<Self> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| crate::Error::OperationFailed {
                operation: "read_config_file".to_string(),
                cause: format!("{}: {e}", path.display()),
            })?;

        Self::parse_toml(&contents)
    }

    /// Parses configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid TOML, has unknown keys, or
    /// names an unknown backend.
    pub fn parse_toml(contents: &str) -> crate::Result<Self> {
        let file: ConfigFile =
            toml::from_str(contents).map_err(|e| crate::Error::OperationFailed {
                operation: "parse_config_file".to_string(),
                cause: e.to_string(),
            })?;

        Self::from_config_file(file)
    }

    /// Loads configuration from the default location.
    ///
    /// Checks the following paths in order:
    /// 1. Platform-specific config dir (`~/Library/Application Support/newsledger/` on macOS)
    /// 2. XDG config dir (`~/.config/newsledger/` for Unix compatibility)
    ///
    /// Returns default configuration if no config file is found. A file that
    /// exists but fails to parse is skipped with a warning.
    #[must_use]
    pub fn load_default() -> Self {
        let Some(base_dirs) = directories::BaseDirs::new() else {
            return Self::default();
        };

        let candidates = [
            base_dirs.config_dir().join("newsledger").join("config.toml"),
            base_dirs
                .home_dir()
                .join(".config")
                .join("newsledger")
                .join("config.toml"),
        ];

        for path in candidates.iter().filter(|p| p.exists()) {
            match Self::load_from_file(path) {
                Ok(config) => return config,
                Err(e) => tracing::warn!(path = %path.display(), error = %e, "Ignoring config file"),
            }
        }

        Self::default()
    }

    /// Converts a `ConfigFile` to `LedgerConfig`.
    fn from_config_file(file: ConfigFile) -> crate::Result<Self> {
        let mut config = Self::default();

        if let Some(data_dir) = file.data_dir {
            config.data_dir = PathBuf::from(data_dir);
        }
        if let Some(backend) = file.backend {
            config.backend = BackendKind::parse(&backend)?;
        }
        if let Some(db_path) = file.db_path {
            config.db_path = Some(PathBuf::from(db_path));
        }
        if let Some(capacity) = file.event_bus_capacity {
            config.event_bus_capacity = capacity;
        }
        if let Some(limits) = file.limits {
            let l = &mut config.limits;
            // A [limits] section switches truncation on unless it says otherwise.
            l.enabled = limits.enabled.unwrap_or(true);
            l.title = limits.title.unwrap_or(l.title);
            l.content = limits.content.unwrap_or(l.content);
            l.summary = limits.summary.unwrap_or(l.summary);
            l.source = limits.source.unwrap_or(l.source);
            l.link = limits.link.unwrap_or(l.link);
            l.tags = limits.tags.unwrap_or(l.tags);
        }
        if let Some(logging) = file.logging {
            if let Some(format) = logging.format {
                config.logging.format = LogFormat::parse(&format);
            }
            if let Some(level) = logging.level {
                config.logging.level = level;
            }
            config.logging.file = logging.file.map(PathBuf::from);
        }
        if let Some(metrics) = file.metrics {
            if let Some(enabled) = metrics.enabled {
                config.metrics.enabled = enabled;
            }
            if let Some(port) = metrics.port {
                config.metrics = config.metrics.with_port(port);
            }
        }

        Ok(config)
    }

    /// Applies `NEWSLEDGER_*` environment overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if `NEWSLEDGER_BACKEND` names an unknown backend.
    pub fn apply_env_overrides(self) -> crate::Result<Self> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides from an arbitrary key lookup.
    fn apply_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> crate::Result<Self> {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        if let Some(dir) = get("NEWSLEDGER_DATA_DIR") {
            self.data_dir = PathBuf::from(dir);
        }
        if let Some(backend) = get("NEWSLEDGER_BACKEND") {
            self.backend = BackendKind::parse(&backend)?;
        }
        if let Some(path) = get("NEWSLEDGER_DB_PATH") {
            self.db_path = Some(PathBuf::from(path));
        }
        if let Some(format) = get("NEWSLEDGER_LOG_FORMAT") {
            self.logging.format = LogFormat::parse(&format);
        }
        if let Some(file) = get("NEWSLEDGER_LOG_FILE") {
            self.logging.file = Some(PathBuf::from(file));
        }
        if let Some(enabled) = get("NEWSLEDGER_METRICS_ENABLED") {
            let enabled = enabled.to_lowercase();
            self.metrics.enabled = enabled == "true" || enabled == "1" || enabled == "yes";
        }
        if let Some(port) = get("NEWSLEDGER_METRICS_PORT").and_then(|p| p.parse::<u16>().ok()) {
            self.metrics = self.metrics.with_port(port);
        }

        Ok(self)
    }

    /// Sets the data directory.
    #[must_use]
    pub fn with_data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.data_dir = path.into();
        self
    }

    /// Sets the backend.
    #[must_use]
    pub const fn with_backend(mut self, backend: BackendKind) -> Self {
        self.backend = backend;
        self
    }

    /// Resolved database path.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.db_path
            .clone()
            .unwrap_or_else(|| self.data_dir.join("ledger.db"))
    }

    /// Observability settings derived from this configuration.
    #[must_use]
    pub fn observability(&self, verbose: bool, metrics_expose: bool) -> ObservabilityConfig {
        ObservabilityConfig {
            logging: self.logging.clone().verbose(verbose),
            metrics: self.metrics.clone(),
            metrics_expose,
        }
    }

    /// Opens the configured persistence backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened.
    pub fn open_backend(&self) -> crate::Result<Box<dyn PersistenceBackend>> {
        match self.backend {
            BackendKind::Memory => Ok(Box::new(MemoryBackend::new())),
            BackendKind::Sqlite => Ok(Box::new(SqliteBackend::new(self.database_path())?)),
        }
    }
}
