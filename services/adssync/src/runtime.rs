//! Engine runtime
//!
//! - `engine`: the poll-cycle worker and its [`EngineHandle`]
//! - `state`: lifecycle state, outcome and statistics

pub mod engine;
pub mod state;

pub use engine::{EngineConfig, EngineHandle, PollEngine, DEFAULT_CYCLE_INTERVAL};
pub use state::{EngineOutcome, EngineState, EngineStatsSnapshot};
