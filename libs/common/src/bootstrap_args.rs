//! Common command-line arguments for adssync binaries
//!
//! Provides a unified argument structure that individual binaries extend.

#[cfg(feature = "cli")]
use clap::Parser;

/// Common service startup arguments
///
/// Standard options for logging, debugging and validation shared by every binary.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "cli", derive(Parser))]
#[cfg_attr(feature = "cli", clap(author, version, about))]
pub struct ServiceArgs {
    /// Log level (trace, debug, info, warn, error)
    #[cfg_attr(
        feature = "cli",
        clap(short = 'l', long, default_value = "info", env = "RUST_LOG")
    )]
    pub log_level: String,

    /// Enable debug mode with verbose output
    #[cfg_attr(feature = "cli", clap(long, env = "DEBUG"))]
    pub debug: bool,

    /// Disable colored output (useful for log files)
    #[cfg_attr(feature = "cli", clap(long))]
    pub no_color: bool,

    /// Only validate configuration without starting service
    #[cfg_attr(feature = "cli", clap(long))]
    pub validate: bool,

    /// Custom configuration file path
    #[cfg_attr(feature = "cli", clap(short = 'c', long, env = "ADSSYNC_CONFIG"))]
    pub config_path: Option<String>,

    /// Directory for log files (console only when absent)
    #[cfg_attr(feature = "cli", clap(long, env = "ADSSYNC_LOG_DIR"))]
    pub log_dir: Option<String>,
}

impl Default for ServiceArgs {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            debug: false,
            no_color: false,
            validate: false,
            config_path: None,
            log_dir: None,
        }
    }
}

impl ServiceArgs {
    /// Parse log level string to tracing::Level
    pub fn parse_log_level(&self) -> tracing::Level {
        if self.debug {
            return tracing::Level::DEBUG;
        }
        match self.log_level.to_lowercase().as_str() {
            "trace" => tracing::Level::TRACE,
            "debug" => tracing::Level::DEBUG,
            "warn" | "warning" => tracing::Level::WARN,
            "error" => tracing::Level::ERROR,
            _ => tracing::Level::INFO,
        }
    }

    /// Check if running in development mode
    pub fn is_development(&self) -> bool {
        self.debug || self.log_level == "debug" || self.log_level == "trace"
    }
}
