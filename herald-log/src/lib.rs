//! Herald Logging
//!
//! Installs a `tracing` subscriber configured from the `HERALD_*`
//! environment variables. Herald crates log through the `tracing` macros;
//! nothing is printed until a subscriber is installed.
//!
//! # Usage
//!
//! ```rust,ignore
//! // Level, format and colour from the environment
//! herald_log::init();
//!
//! // Or explicitly
//! herald_log::LogConfig::default()
//!     .level(herald_log::Level::Debug)
//!     .format(herald_log::Format::Pretty)
//!     .try_init()?;
//! ```
//!
//! # Environment Variables
//!
//! - `HERALD_DEBUG=1` - Enable debug logging
//! - `HERALD_LOG_LEVEL=trace|debug|info|warn|error|off` - Set log level
//! - `HERALD_LOG_FORMAT=pretty|json|compact` - Set output format
//! - `HERALD_LOG_COLOR=1|0` - Enable/disable colors
//!
//! `RUST_LOG`, when set, takes precedence over the level.

use once_cell::sync::OnceCell;
use std::env;
use thiserror::Error;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

// ============================================================================
// Log Levels
// ============================================================================

/// Minimum level that gets logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    /// Trace level (most verbose)
    Trace,
    Debug,
    Info,
    Warn,
    /// Error level (least verbose)
    Error,
    /// Off (no logging)
    Off,
}

impl Level {
    /// Get level from string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "trace" => Some(Level::Trace),
            "debug" => Some(Level::Debug),
            "info" => Some(Level::Info),
            "warn" | "warning" => Some(Level::Warn),
            "error" => Some(Level::Error),
            "off" | "none" => Some(Level::Off),
            _ => None,
        }
    }

    /// Get level name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Trace => "TRACE",
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
            Level::Off => "OFF",
        }
    }

    /// Directive understood by `EnvFilter`
    pub fn as_directive(&self) -> &'static str {
        match self {
            Level::Trace => "trace",
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
            Level::Off => "off",
        }
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Log Format
// ============================================================================

/// Output format for log messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Multi-line, human oriented
    Pretty,
    /// Compact single-line format
    Compact,
    /// JSON format for structured logging
    Json,
}

impl Format {
    /// Get format from string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pretty" => Some(Format::Pretty),
            "compact" => Some(Format::Compact),
            "json" => Some(Format::Json),
            _ => None,
        }
    }
}

// ============================================================================
// Configuration
// ============================================================================

/// Configuration of the installed subscriber, set once.
static INSTALLED: OnceCell<LogConfig> = OnceCell::new();

/// Logging errors
#[derive(Debug, Error)]
pub enum LogError {
    #[error("A global logger is already installed")]
    AlreadyInitialized,

    #[error("Invalid log filter: {0}")]
    InvalidFilter(String),
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Whether debug mode is enabled
    pub debug: bool,
    /// Minimum log level
    pub level: Level,
    /// Output format
    pub format: Format,
    /// Whether colors are enabled
    pub color: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            debug: false,
            level: Level::Info,
            format: Format::Compact,
            color: false,
        }
    }
}

impl LogConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self::from_vars(|name| env::var(name).ok())
    }

    /// Create config from an arbitrary variable source
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Self {
        let flag = |name: &str| var(name).map(|v| v == "1" || v.to_lowercase() == "true");

        let debug = flag("HERALD_DEBUG").unwrap_or(false);

        let level = var("HERALD_LOG_LEVEL")
            .and_then(|s| Level::from_str(&s))
            .unwrap_or(if debug { Level::Debug } else { Level::Info });

        let format = var("HERALD_LOG_FORMAT")
            .and_then(|s| Format::from_str(&s))
            .unwrap_or(Format::Compact);

        let color = flag("HERALD_LOG_COLOR")
            .unwrap_or_else(|| var("NO_COLOR").is_none() && var("TERM").is_some());

        Self {
            debug,
            level,
            format,
            color,
        }
    }

    /// Set the minimum level
    pub fn level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Set the output format
    pub fn format(mut self, format: Format) -> Self {
        self.format = format;
        self
    }

    /// Enable/disable colors
    pub fn color(mut self, enabled: bool) -> Self {
        self.color = enabled;
        self
    }

    /// Filter used when `RUST_LOG` is absent
    pub fn filter(&self) -> Result<EnvFilter, LogError> {
        match EnvFilter::try_from_default_env() {
            Ok(filter) => Ok(filter),
            Err(_) => EnvFilter::try_new(self.level.as_directive())
                .map_err(|e| LogError::InvalidFilter(e.to_string())),
        }
    }

    /// Install this configuration as the global subscriber.
    pub fn try_init(self) -> Result<(), LogError> {
        if INSTALLED.get().is_some() {
            return Err(LogError::AlreadyInitialized);
        }

        let filter = self.filter()?;
        let registry = tracing_subscriber::registry().with(filter);
        let installed = match self.format {
            Format::Json => registry
                .with(tracing_subscriber::fmt::layer().json())
                .try_init(),
            Format::Compact => registry
                .with(tracing_subscriber::fmt::layer().compact().with_ansi(self.color))
                .try_init(),
            Format::Pretty => registry
                .with(tracing_subscriber::fmt::layer().pretty().with_ansi(self.color))
                .try_init(),
        };
        installed.map_err(|_| LogError::AlreadyInitialized)?;

        tracing::debug!(level = %self.level, format = ?self.format, "Logging initialized");
        INSTALLED
            .set(self)
            .map_err(|_| LogError::AlreadyInitialized)
    }
}

// ============================================================================
// Public API
// ============================================================================

/// Initialize logging from the environment.
///
/// Does nothing if a subscriber is already installed. Other failures are
/// printed to stderr, since there is no subscriber to log them.
pub fn init() {
    if let Some(message) = init_failure(try_init()) {
        eprintln!("herald-log: {}", message);
    }
}

fn init_failure(result: Result<(), LogError>) -> Option<String> {
    match result {
        Ok(()) | Err(LogError::AlreadyInitialized) => None,
        Err(e) => Some(e.to_string()),
    }
}

/// Initialize logging from the environment, reporting failures.
pub fn try_init() -> Result<(), LogError> {
    LogConfig::from_env().try_init()
}

/// Configuration installed by [`init`]/[`try_init`], if any.
pub fn config() -> Option<&'static LogConfig> {
    INSTALLED.get()
}

/// Check if debug logging is enabled.
pub fn is_debug_enabled() -> bool {
    config().is_some_and(|c| c.debug || c.level <= Level::Debug)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<&str, &str> = pairs.iter().copied().collect();
        move |name| map.get(name).map(|v| v.to_string())
    }

    #[test]
    fn test_level_ordering() {
        assert!(Level::Trace < Level::Debug);
        assert!(Level::Debug < Level::Info);
        assert!(Level::Info < Level::Warn);
        assert!(Level::Warn < Level::Error);
        assert!(Level::Error < Level::Off);
    }

    #[test]
    fn test_level_from_str() {
        assert_eq!(Level::from_str("debug"), Some(Level::Debug));
        assert_eq!(Level::from_str("DEBUG"), Some(Level::Debug));
        assert_eq!(Level::from_str("warning"), Some(Level::Warn));
        assert_eq!(Level::from_str("invalid"), None);
        assert_eq!(Level::Warn.as_directive(), "warn");
    }

    #[test]
    fn test_format_from_str() {
        assert_eq!(Format::from_str("pretty"), Some(Format::Pretty));
        assert_eq!(Format::from_str("JSON"), Some(Format::Json));
        assert_eq!(Format::from_str("xml"), None);
    }

    #[test]
    fn test_debug_flag_lowers_level() {
        let config = LogConfig::from_vars(vars(&[("HERALD_DEBUG", "1")]));
        assert!(config.debug);
        assert_eq!(config.level, Level::Debug);
    }

    #[test]
    fn test_explicit_level_wins_over_debug() {
        let config = LogConfig::from_vars(vars(&[
            ("HERALD_DEBUG", "true"),
            ("HERALD_LOG_LEVEL", "error"),
            ("HERALD_LOG_FORMAT", "json"),
            ("HERALD_LOG_COLOR", "0"),
        ]));
        assert_eq!(config.level, Level::Error);
        assert_eq!(config.format, Format::Json);
        assert!(!config.color);
    }

    #[test]
    fn test_color_fallback() {
        let tty = LogConfig::from_vars(vars(&[("TERM", "xterm")]));
        assert!(tty.color);

        let disabled = LogConfig::from_vars(vars(&[("TERM", "xterm"), ("NO_COLOR", "1")]));
        assert!(!disabled.color);
    }

    #[test]
    fn test_builder_setters() {
        let config = LogConfig::default()
            .level(Level::Trace)
            .format(Format::Pretty)
            .color(true);
        assert_eq!(config.level, Level::Trace);
        assert_eq!(config.format, Format::Pretty);
        assert!(config.color);
    }

    #[test]
    fn test_init_reports_only_real_failures() {
        assert_eq!(init_failure(Ok(())), None);
        assert_eq!(init_failure(Err(LogError::AlreadyInitialized)), None);
        assert_eq!(
            init_failure(Err(LogError::InvalidFilter("bad=directive=".into()))),
            Some("Invalid log filter: bad=directive=".to_string())
        );
    }

    #[test]
    fn test_second_init_is_rejected() {
        let _ = LogConfig::default().level(Level::Off).try_init();
        let again = LogConfig::default().try_init();
        assert!(matches!(again, Err(LogError::AlreadyInitialized)));
        assert!(config().is_some());
    }
}
