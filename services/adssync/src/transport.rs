//! Controller transports
//!
//! - `traits`: the [`AdsTransport`] interface and session parameters
//! - `virt`: in-memory loopback PLC

pub mod traits;
pub mod virt;

pub use traits::{AdsTarget, AdsTransport, AmsNetId, DEFAULT_ADS_PORT};
pub use virt::{PlcCounters, VirtualPlc, VirtualPlcHandle};
