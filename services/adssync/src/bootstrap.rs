//! Service bootstrap and supervision
//!
//! Command-line arguments, logging setup from the loaded configuration, the
//! `--validate` summary and the supervisor wait that turns process signals
//! into an engine stop.

use clap::Parser;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

use common::service_bootstrap::ServiceInfo;
use common::shutdown::wait_for_shutdown;

use crate::config::{AppConfig, DEFAULT_CONFIG_PATH};
use crate::error::{AdsSyncError, Result};
use crate::runtime::{EngineHandle, EngineOutcome};
use crate::store::ValueStore;
use crate::symbols::{SymbolTable, SymbolValue};

pub use common::bootstrap_args::ServiceArgs;

/// Service name used for the banner, log files and default config path
pub const SERVICE_NAME: &str = "adssync";

/// Command-line arguments for adssync
#[derive(Parser, Debug, Clone, Default)]
#[command(
    name = "adssync",
    version = env!("CARGO_PKG_VERSION"),
    about = "Cyclic symbol synchronization with a TwinCAT/ADS controller",
    long_about = None
)]
pub struct Args {
    /// Configuration file
    #[arg(short = 'c', long, env = "ADSSYNC_CONFIG")]
    pub config: Option<String>,

    /// Symbol specification file, overrides `ads.symbols_path`
    #[arg(short = 's', long)]
    pub symbols: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error); defaults to `logging.level`
    #[arg(short = 'l', long)]
    pub log_level: Option<String>,

    /// Enable debug mode
    #[arg(short = 'd', long)]
    pub debug: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Directory for log files, overrides `logging.dir`
    #[arg(long, env = "ADSSYNC_LOG_DIR")]
    pub log_dir: Option<String>,

    /// Validation mode - load configuration and symbols, then exit
    #[arg(long)]
    pub validate: bool,

    /// Stop automatically after this many seconds
    #[arg(long)]
    pub duration_secs: Option<u64>,
}

impl Args {
    pub fn config_path(&self) -> String {
        self.config
            .clone()
            .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string())
    }

    /// Load the configuration and apply command-line overrides
    pub fn load_config(&self) -> Result<AppConfig> {
        let mut config = AppConfig::load(self.config_path())?;
        if let Some(symbols) = &self.symbols {
            config.ads.symbols_path = symbols.clone();
        }
        if let Some(dir) = &self.log_dir {
            config.logging.dir = Some(PathBuf::from(dir));
        }
        Ok(config)
    }

    /// Common service arguments, completed from the configuration
    pub fn service_args(&self, config: &AppConfig) -> ServiceArgs {
        ServiceArgs {
            log_level: self
                .log_level
                .clone()
                .unwrap_or_else(|| config.logging.level.clone()),
            debug: self.debug,
            no_color: self.no_color,
            validate: self.validate,
            config_path: Some(self.config_path()),
            log_dir: self.log_dir.clone(),
        }
    }

    pub fn run_duration(&self) -> Option<Duration> {
        self.duration_secs.map(Duration::from_secs)
    }
}

pub fn service_info() -> ServiceInfo {
    ServiceInfo::new(
        SERVICE_NAME,
        env!("CARGO_PKG_VERSION"),
        "Cyclic ADS symbol synchronization",
    )
}

/// Initialize logging from arguments and the `logging` section
pub fn initialize_logging(
    args: &ServiceArgs,
    service_info: &ServiceInfo,
    config: &AppConfig,
) -> Result<()> {
    let config_dir = config.logging.dir.as_ref().and_then(|dir| dir.to_str());
    common::service_bootstrap::init_logging(service_info, args, config_dir, config.logging.json)
        .map_err(|e| AdsSyncError::config(format!("Failed to init logging: {}", e)))
}

/// Build the symbol table and log what would be synchronized
pub fn validate_configuration(config: &AppConfig) -> Result<SymbolTable> {
    let target = config.target()?;
    let table = SymbolTable::from_file(&config.ads.symbols_path)?;

    info!("ADS target: {}", target);
    info!("Symbol file: {}", config.ads.symbols_path.display());
    info!(
        "{} symbols declared, {} read, {} write",
        table.len(),
        table.read_list().len(),
        table.write_list().len()
    );
    Ok(table)
}

/// Wait for a shutdown signal, the run duration or an engine fault, then stop
/// the engine and return how it ended
pub async fn supervise(engine: EngineHandle, run_for: Option<Duration>) -> Result<EngineOutcome> {
    let mut states = engine.subscribe();

    tokio::select! {
        sig = wait_for_shutdown() => {
            info!("{} received, stopping ADS synchronization", sig);
        }
        () = sleep_or_forever(run_for) => {
            info!("Run duration elapsed, stopping ADS synchronization");
        }
        _ = states.wait_for(|state| state.is_terminal()) => {
            warn!("ADS engine terminated without a stop request");
        }
    }

    engine.stop().await
}

async fn sleep_or_forever(duration: Option<Duration>) {
    match duration {
        Some(duration) => tokio::time::sleep(duration).await,
        None => std::future::pending().await,
    }
}

/// Last known values, ordered by symbol name
pub fn final_snapshot(store: &ValueStore) -> BTreeMap<String, SymbolValue> {
    store.snapshot().into_iter().collect()
}
