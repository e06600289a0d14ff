//! adssync - cyclic ADS symbol synchronization
//!
//! Keeps a local table of named controller variables in step with a
//! TwinCAT/ADS PLC. Symbols declared in a specification file become typed
//! slots in a [`SymbolTable`]; a [`ValueStore`] guards them with one lock; a
//! [`PollEngine`] pushes the write list and pulls the read list at a fixed
//! cadence until it is cancelled or the transport fails.
//!
//! ```ignore
//! let table = SymbolTable::from_file("config/adssymbols.yaml")?;
//! let store = Arc::new(ValueStore::new(table));
//! let plc = VirtualPlc::seeded_from("plc", &store);
//! let engine = PollEngine::new(plc, store.clone(), EngineConfig::default()).spawn();
//!
//! store.set("GVL.a", true);
//! let outcome = engine.stop().await?;
//! ```

pub mod bootstrap;
pub mod config;
pub mod error;
pub mod runtime;
pub mod store;
pub mod symbols;
pub mod transport;

pub use config::AppConfig;
pub use error::{AdsSyncError, Result};
pub use runtime::{EngineConfig, EngineHandle, EngineOutcome, EngineState, PollEngine};
pub use store::{ApplySummary, ValueMap, ValueStore};
pub use symbols::{DataType, SymbolMode, SymbolSpec, SymbolTable, SymbolValue};
pub use transport::{AdsTarget, AdsTransport, VirtualPlc};
