//! Structured logging configuration.

use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable multi-line output.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

impl LogFormat {
    /// Parses a format name. Unknown names fall back to `Pretty`.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::Pretty,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Output format.
    pub format: LogFormat,
    /// Default filter directive, used when `RUST_LOG` is unset.
    pub level: String,
    /// Optional file to append logs to instead of stderr.
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Pretty,
            level: "warn".to_string(),
            file: None,
        }
    }
}

impl LoggingConfig {
    /// Raises the default level to `debug`.
    #[must_use]
    pub fn verbose(mut self, verbose: bool) -> Self {
        if verbose {
            self.level = "debug".to_string();
        }
        self
    }

    /// Builds the subscriber filter.
    ///
    /// `RUST_LOG` wins over the configured level. An unparsable configured
    /// level falls back to `warn`.
    #[must_use]
    pub fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&self.level))
            .unwrap_or_else(|_| EnvFilter::new("warn"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("json", LogFormat::Json ; "json")]
    #[test_case("JSON ", LogFormat::Json ; "json uppercase")]
    #[test_case("pretty", LogFormat::Pretty ; "pretty")]
    #[test_case("xml", LogFormat::Pretty ; "unknown falls back")]
    fn test_log_format_parse(input: &str, expected: LogFormat) {
        assert_eq!(LogFormat::parse(input), expected);
    }

    #[test]
    fn test_verbose_raises_level() {
        let config = LoggingConfig::default().verbose(true);
        assert_eq!(config.level, "debug");

        let config = LoggingConfig::default().verbose(false);
        assert_eq!(config.level, "warn");
    }
}
