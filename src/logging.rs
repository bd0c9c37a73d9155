//! Structured logging setup.
//!
//! The recorder only emits `tracing` events; hosts that do not install their
//! own subscriber can call [`init`] once at startup.
//!
//! # Environment Variables
//!
//! - `DEG_LEDGER_DEBUG=1` - Enable debug logging
//! - `DEG_LEDGER_LOG_LEVEL=trace|debug|info|warn|error|off` - Set log level
//! - `DEG_LEDGER_LOG_FORMAT=pretty|compact|json` - Set output format
//! - `RUST_LOG` - Full filter directives, overrides the level

use std::env;
use std::fmt;
use tracing_subscriber::{EnvFilter, fmt as tfmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Minimum log level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    Off,
}

impl Level {
    /// Parse a level name, case-insensitively.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "trace" => Some(Self::Trace),
            "debug" => Some(Self::Debug),
            "info" => Some(Self::Info),
            "warn" | "warning" => Some(Self::Warn),
            "error" => Some(Self::Error),
            "off" | "none" => Some(Self::Off),
            _ => None,
        }
    }

    /// Directive understood by `EnvFilter`
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
            Self::Off => "off",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Multi-line, human readable
    Pretty,
    /// Single line per event
    Compact,
    /// One JSON object per event
    Json,
}

impl Format {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pretty" => Some(Self::Pretty),
            "compact" => Some(Self::Compact),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub level: Level,
    pub format: Format,
    /// ANSI colors for pretty and compact output
    pub ansi: bool,
    /// Include the event target (module path)
    pub targets: bool,
    /// Explicit filter directives; take precedence over `RUST_LOG` and `level`
    pub filter: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::Info,
            format: Format::Json,
            ansi: false,
            targets: true,
            filter: None,
        }
    }
}

impl LogConfig {
    /// Build from `DEG_LEDGER_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let flag = |v: String| v == "1" || v.eq_ignore_ascii_case("true");

        let debug = lookup("DEG_LEDGER_DEBUG").map(flag).unwrap_or(false);

        let level = lookup("DEG_LEDGER_LOG_LEVEL")
            .and_then(|s| Level::parse(&s))
            .unwrap_or(if debug { Level::Debug } else { Level::Info });

        let format = lookup("DEG_LEDGER_LOG_FORMAT")
            .and_then(|s| Format::parse(&s))
            .unwrap_or(Format::Json);

        Self {
            level,
            format,
            ansi: format != Format::Json && lookup("NO_COLOR").is_none(),
            ..Default::default()
        }
    }

    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    pub fn with_format(mut self, format: Format) -> Self {
        self.format = format;
        self
    }

    pub fn with_filter(mut self, directives: impl Into<String>) -> Self {
        self.filter = Some(directives.into());
        self
    }

    fn env_filter(&self) -> EnvFilter {
        match &self.filter {
            Some(directives) => {
                EnvFilter::try_new(directives).unwrap_or_else(|_| EnvFilter::new(self.level.as_str()))
            }
            None => EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(self.level.as_str())),
        }
    }
}

/// Install a global `tracing` subscriber.
///
/// Returns false when a global subscriber was already set, in which case the
/// existing one is left in place.
pub fn init(config: LogConfig) -> bool {
    let filter = config.env_filter();
    let registry = tracing_subscriber::registry().with(filter);

    let result = match config.format {
        Format::Json => registry
            .with(
                tfmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_target(config.targets)
                    .with_current_span(true),
            )
            .try_init(),
        Format::Pretty => registry
            .with(
                tfmt::layer()
                    .pretty()
                    .with_writer(std::io::stderr)
                    .with_target(config.targets)
                    .with_ansi(config.ansi),
            )
            .try_init(),
        Format::Compact => registry
            .with(
                tfmt::layer()
                    .compact()
                    .with_writer(std::io::stderr)
                    .with_target(config.targets)
                    .with_ansi(config.ansi),
            )
            .try_init(),
    };

    result.is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_level_parse() {
        assert_eq!(Level::parse("DEBUG"), Some(Level::Debug));
        assert_eq!(Level::parse("warning"), Some(Level::Warn));
        assert_eq!(Level::parse("none"), Some(Level::Off));
        assert_eq!(Level::parse("loud"), None);
        assert!(Level::Debug < Level::Error);
    }

    #[test]
    fn test_format_parse() {
        assert_eq!(Format::parse("Json"), Some(Format::Json));
        assert_eq!(Format::parse("compact"), Some(Format::Compact));
        assert_eq!(Format::parse("xml"), None);
    }

    #[test]
    fn test_config_defaults() {
        let config = LogConfig::from_lookup(lookup(&[]));
        assert_eq!(config.level, Level::Info);
        assert_eq!(config.format, Format::Json);
        assert!(!config.ansi);
    }

    #[test]
    fn test_debug_flag_lowers_level() {
        let config = LogConfig::from_lookup(lookup(&[("DEG_LEDGER_DEBUG", "true")]));
        assert_eq!(config.level, Level::Debug);

        let config = LogConfig::from_lookup(lookup(&[
            ("DEG_LEDGER_DEBUG", "1"),
            ("DEG_LEDGER_LOG_LEVEL", "warn"),
        ]));
        assert_eq!(config.level, Level::Warn);
    }

    #[test]
    fn test_format_from_env() {
        let config = LogConfig::from_lookup(lookup(&[("DEG_LEDGER_LOG_FORMAT", "pretty")]));
        assert_eq!(config.format, Format::Pretty);
        assert!(config.ansi);

        let config = LogConfig::from_lookup(lookup(&[
            ("DEG_LEDGER_LOG_FORMAT", "compact"),
            ("NO_COLOR", "1"),
        ]));
        assert!(!config.ansi);
    }

    #[test]
    fn test_init_is_idempotent() {
        let config = LogConfig::default().with_filter("deg_ledger=debug");
        init(config.clone());
        assert!(!init(config));
    }
}
