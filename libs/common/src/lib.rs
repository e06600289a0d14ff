//! adssync basic library
//!
//! Provides functions shared by the adssync binaries:
//! - logging initialization
//! - startup banner and service metadata
//! - common command-line arguments
//! - flexible serde deserializers for configuration values
//! - graceful shutdown signal handling

pub mod bootstrap_args;
pub mod logging;
pub mod serde_helpers;
pub mod service_bootstrap;
pub mod shutdown;

pub use bootstrap_args::ServiceArgs;
pub use logging::LogConfig;
pub use service_bootstrap::ServiceInfo;

// Re-export common dependencies
pub use tokio;

// Re-export CLI dependencies when cli feature is enabled
#[cfg(feature = "cli")]
pub use clap;
