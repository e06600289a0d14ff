//! Engine lifecycle state, outcome and statistics

use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

/// Lifecycle state of a poll-cycle engine
///
/// `Disconnected -> Validating -> Running -> (Stopping | Faulted) -> Terminated`.
/// An engine never leaves `Terminated`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EngineState {
    /// Created, transport not opened yet
    Disconnected,
    /// Session open, checking symbol presence
    Validating,
    /// Cycling
    Running,
    /// Cancellation observed, leaving the loop
    Stopping,
    /// Open, validation or a batch failed
    Faulted,
    /// Worker finished, transport released
    Terminated,
}

impl EngineState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, EngineState::Terminated)
    }

    /// Whether `next` is a legal successor of `self`
    pub fn can_transition_to(&self, next: EngineState) -> bool {
        use EngineState::*;
        matches!(
            (self, next),
            (Disconnected, Validating)
                | (Disconnected, Stopping)
                | (Disconnected, Faulted)
                | (Validating, Running)
                | (Validating, Stopping)
                | (Validating, Faulted)
                | (Running, Stopping)
                | (Running, Faulted)
                | (Stopping, Terminated)
                | (Faulted, Terminated)
        )
    }
}

impl fmt::Display for EngineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EngineState::Disconnected => "disconnected",
            EngineState::Validating => "validating",
            EngineState::Running => "running",
            EngineState::Stopping => "stopping",
            EngineState::Faulted => "faulted",
            EngineState::Terminated => "terminated",
        };
        f.write_str(s)
    }
}

/// Why an engine run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineOutcome {
    /// Stopped by cancellation
    Stopped,
    /// Session could not be opened
    ConnectFailed(String),
    /// Expected symbols absent on the target
    MissingSymbols(Vec<String>),
    /// A batch or symbol lookup failed on the open session
    TransportFailed(String),
}

impl EngineOutcome {
    /// `true` only for a caller-requested stop
    pub fn is_clean(&self) -> bool {
        matches!(self, EngineOutcome::Stopped)
    }
}

impl fmt::Display for EngineOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineOutcome::Stopped => write!(f, "stopped"),
            EngineOutcome::ConnectFailed(e) => write!(f, "connect failed: {}", e),
            EngineOutcome::MissingSymbols(names) => {
                write!(f, "missing symbols: [{}]", names.join(", "))
            },
            EngineOutcome::TransportFailed(e) => write!(f, "transport failed: {}", e),
        }
    }
}

/// Counters shared between the engine worker and its handle
#[derive(Debug, Default)]
pub(crate) struct EngineStats {
    cycles: AtomicU64,
    last_cycle_us: AtomicU64,
    connected: AtomicBool,
    last_error: Mutex<Option<String>>,
}

impl EngineStats {
    pub(crate) fn record_cycle(&self, elapsed: Duration) {
        self.cycles.fetch_add(1, Ordering::Relaxed);
        let micros = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX);
        self.last_cycle_us.store(micros, Ordering::Relaxed);
    }

    pub(crate) fn record_error(&self, error: impl ToString) {
        *self.last_error.lock() = Some(error.to_string());
    }

    pub(crate) fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::Release);
    }

    pub(crate) fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    pub(crate) fn snapshot(&self) -> EngineStatsSnapshot {
        EngineStatsSnapshot {
            cycles_completed: self.cycles.load(Ordering::Relaxed),
            last_cycle_duration: Duration::from_micros(self.last_cycle_us.load(Ordering::Relaxed)),
            last_error: self.last_error.lock().clone(),
        }
    }
}

/// Point-in-time copy of the engine counters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineStatsSnapshot {
    pub cycles_completed: u64,
    pub last_cycle_duration: Duration,
    pub last_error: Option<String>,
}
