//! Service bootstrap utilities
//!
//! Startup banner, service metadata and logging setup from parsed arguments.

use crate::bootstrap_args::ServiceArgs;
use crate::logging::{self, LogConfig};
use std::path::PathBuf;
use tracing::info;

/// Service metadata for startup
#[derive(Debug, Clone)]
pub struct ServiceInfo {
    /// Service name (e.g., "adssync")
    pub name: String,
    /// Service version
    pub version: String,
    /// Service description
    pub description: String,
}

impl ServiceInfo {
    /// Create new service info
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            description: description.into(),
        }
    }
}

/// Print startup banner for a service
pub fn print_startup_banner(service: &ServiceInfo) {
    let banner = r#"
  █████╗ ██████╗ ███████╗███████╗██╗   ██╗███╗   ██╗ ██████╗
 ██╔══██╗██╔══██╗██╔════╝██╔════╝╚██╗ ██╔╝████╗  ██║██╔════╝
 ███████║██║  ██║███████╗███████╗ ╚████╔╝ ██╔██╗ ██║██║
 ██╔══██║██║  ██║╚════██║╚════██║  ╚██╔╝  ██║╚██╗██║██║
 ██║  ██║██████╔╝███████║███████║   ██║   ██║ ╚████║╚██████╗
 ╚═╝  ╚═╝╚═════╝ ╚══════╝╚══════╝   ╚═╝   ╚═╝  ╚═══╝ ╚═════╝
    "#;

    info!("{}", banner);
    info!(" {} v{}", service.name.to_uppercase(), service.version);
    info!(" {}", service.description);
}

/// Initialize logging from command-line arguments
///
/// Log directory priority: `--log-dir` argument, then `config_dir` (from the
/// service configuration file), otherwise console only.
pub fn init_logging(
    service: &ServiceInfo,
    args: &ServiceArgs,
    config_dir: Option<&str>,
    enable_json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let log_dir = args
        .log_dir
        .as_deref()
        .or(config_dir)
        .map(|dir| PathBuf::from(dir).join(&service.name));

    let log_config = LogConfig {
        service_name: service.name.clone(),
        log_dir,
        console_level: args.parse_log_level(),
        enable_json,
        ansi: !args.no_color,
    };

    logging::init_with_config(log_config)
}
