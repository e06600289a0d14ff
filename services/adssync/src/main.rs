//! adssync service entry point

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{debug, info, warn};

use adssync::bootstrap::{self, Args};
use adssync::{PollEngine, SymbolTable, ValueStore, VirtualPlc};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = args
        .load_config()
        .with_context(|| format!("Failed to load configuration {}", args.config_path()))?;

    let service_args = args.service_args(&config);
    let service_info = bootstrap::service_info();
    bootstrap::initialize_logging(&service_args, &service_info, &config)?;
    if !args.no_color {
        common::service_bootstrap::print_startup_banner(&service_info);
    }
    info!("Configuration loaded from {}", args.config_path());
    if service_args.is_development() {
        debug!("{:?}", config);
    }

    if args.validate {
        bootstrap::validate_configuration(&config)?;
        info!("Validation completed successfully");
        return Ok(());
    }

    let target = config.target()?;
    let table = SymbolTable::from_file(&config.ads.symbols_path).with_context(|| {
        format!(
            "Failed to build symbol table from {}",
            config.ads.symbols_path.display()
        )
    })?;
    let store = Arc::new(ValueStore::new(table));

    // No wire transport is linked in; drive the loopback PLC
    let plc = VirtualPlc::seeded_from("virtual-plc", &store).with_target(target);
    let engine = PollEngine::new(plc, store.clone(), config.engine_config()).spawn();

    let outcome = bootstrap::supervise(engine, args.run_duration()).await?;

    let snapshot = bootstrap::final_snapshot(&store);
    info!("Final values: {}", serde_json::to_string(&snapshot)?);
    info!("ADS synchronization closed");

    if !outcome.is_clean() {
        warn!("ADS engine ended abnormally: {}", outcome);
        anyhow::bail!("ADS engine ended abnormally: {}", outcome);
    }
    Ok(())
}
