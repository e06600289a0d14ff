//! Poll-cycle engine
//!
//! One tokio task owns the transport and runs
//!
//! ```text
//! ┌──────────────┐  open   ┌────────────┐  all present  ┌─────────┐
//! │ Disconnected │ ──────► │ Validating │ ────────────► │ Running │◄─┐
//! └──────────────┘         └────────────┘               └─────────┘  │ sleep
//!        │ open failed           │ missing / lookup failed │   │     │
//!        ▼                       ▼                         │   └─────┘
//!   ┌─────────┐ ◄────────────────────────── batch failed ──┘   │ cancelled
//!   │ Faulted │                                          ┌──────────┐
//!   └─────────┘ ─────────────► Terminated ◄───────────── │ Stopping │
//!                                                        └──────────┘
//! ```
//!
//! Each cycle refreshes the write-shadow, pushes it, pulls the read list and
//! applies the result, then sleeps the cycle interval. Cancellation is checked
//! at the top of every cycle and during the sleep, never in the middle of a
//! batch. There is no reconnect: a faulted engine terminates and a new engine
//! has to be started.

use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use super::state::{EngineOutcome, EngineState, EngineStats, EngineStatsSnapshot};
use crate::error::{AdsSyncError, Result};
use crate::store::{ApplySummary, ValueStore};
use crate::transport::AdsTransport;

/// Default pause between two cycles
pub const DEFAULT_CYCLE_INTERVAL: Duration = Duration::from_millis(10);

/// Engine tuning
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub cycle_interval: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cycle_interval: DEFAULT_CYCLE_INTERVAL,
        }
    }
}

/// Poll-cycle engine bound to one transport and one value store
pub struct PollEngine<T> {
    transport: T,
    store: Arc<ValueStore>,
    config: EngineConfig,
}

impl<T> PollEngine<T>
where
    T: AdsTransport + 'static,
{
    pub fn new(transport: T, store: Arc<ValueStore>, config: EngineConfig) -> Self {
        Self {
            transport,
            store,
            config,
        }
    }

    /// Start the worker task with a fresh cancellation token
    pub fn spawn(self) -> EngineHandle {
        self.spawn_with_token(CancellationToken::new())
    }

    /// Start the worker task, stopping when `token` is cancelled
    ///
    /// Passing a child token of a supervisor token lets one cancel stop
    /// several engines.
    pub fn spawn_with_token(self, token: CancellationToken) -> EngineHandle {
        let (state_tx, _) = watch::channel(EngineState::Disconnected);
        let state = Arc::new(state_tx);
        let stats = Arc::new(EngineStats::default());

        let worker = Worker {
            transport: self.transport,
            store: self.store,
            config: self.config,
            state: state.clone(),
            stats: stats.clone(),
        };

        info!(
            "Starting ADS poll engine on {} (cycle {:?})",
            worker.transport.name(),
            worker.config.cycle_interval
        );

        let task_token = token.clone();
        let task = tokio::spawn(async move { worker.run(task_token).await });

        EngineHandle {
            task,
            token,
            state,
            stats,
        }
    }
}

struct Worker<T> {
    transport: T,
    store: Arc<ValueStore>,
    config: EngineConfig,
    state: Arc<watch::Sender<EngineState>>,
    stats: Arc<EngineStats>,
}

impl<T: AdsTransport> Worker<T> {
    async fn run(mut self, token: CancellationToken) -> EngineOutcome {
        let outcome = self.drive(&token).await;

        self.release().await;
        self.transition(EngineState::Terminated);

        if outcome.is_clean() {
            info!("ADS poll engine on {} terminated: {}", self.transport.name(), outcome);
        } else {
            error!("ADS poll engine on {} terminated: {}", self.transport.name(), outcome);
        }
        outcome
    }

    async fn drive(&mut self, token: &CancellationToken) -> EngineOutcome {
        if token.is_cancelled() {
            info!("Engine cancelled before connecting");
            self.transition(EngineState::Stopping);
            return EngineOutcome::Stopped;
        }

        if let Err(e) = self.transport.open().await {
            error!("Cannot connect to ADS target {}: {}", self.transport.name(), e);
            return self.fault(e, EngineOutcome::ConnectFailed);
        }
        self.stats.set_connected(true);
        self.transition(EngineState::Validating);

        match self.validate().await {
            Ok(missing) if missing.is_empty() => {},
            Ok(missing) => {
                error!(
                    "{} expected symbols missing on the target, engine will not run",
                    missing.len()
                );
                let err = AdsSyncError::validation(format!(
                    "missing symbols: {}",
                    missing.join(", ")
                ));
                return self.fault(err, |_| EngineOutcome::MissingSymbols(missing));
            },
            Err(e) => {
                error!("Symbol validation failed: {}", e);
                return self.fault(e, EngineOutcome::TransportFailed);
            },
        }

        self.transition(EngineState::Running);
        self.cycle_loop(token).await
    }

    /// Look up every read and write list symbol; returns the absent ones
    async fn validate(&mut self) -> Result<Vec<String>> {
        let expected = self.store.expected_symbols();
        let mut missing = Vec::new();

        for name in expected {
            if self.transport.symbol_exists(&name).await? {
                debug!("[{}] found on the target", name);
            } else {
                error!("[{}] is not present on the ADS target", name);
                missing.push(name);
            }
        }

        Ok(missing)
    }

    async fn cycle_loop(&mut self, token: &CancellationToken) -> EngineOutcome {
        loop {
            if token.is_cancelled() {
                break;
            }

            let started = Instant::now();
            match self.cycle().await {
                Ok(summary) => {
                    let elapsed = started.elapsed();
                    self.stats.record_cycle(elapsed);
                    if !summary.is_complete() {
                        warn!(
                            "Cycle applied {} symbols, {} missing from the read result",
                            summary.updated,
                            summary.missing.len()
                        );
                    }
                    if elapsed > self.config.cycle_interval {
                        trace!("Cycle took {:?}, longer than the interval", elapsed);
                    }
                },
                Err(e) => {
                    error!("ADS cycle failed on {}: {}", self.transport.name(), e);
                    return self.fault(e, EngineOutcome::TransportFailed);
                },
            }

            tokio::select! {
                biased;
                () = token.cancelled() => break,
                () = tokio::time::sleep(self.config.cycle_interval) => {},
            }
        }

        info!("Cancellation observed, stopping ADS poll engine");
        self.transition(EngineState::Stopping);
        EngineOutcome::Stopped
    }

    /// Refresh and push the write-shadow, then pull and apply the read list
    async fn cycle(&mut self) -> Result<ApplySummary> {
        let shadow = self.store.refresh_write_shadow();
        if !shadow.is_empty() {
            self.transport.write_batch(&shadow).await?;
            trace!("Pushed {} symbols", shadow.len());
        }

        let read_list = self.store.read_list();
        if read_list.is_empty() {
            return Ok(ApplySummary::default());
        }
        let result = self.transport.read_batch(&read_list).await?;
        let summary = self.store.apply_read_result(&result);
        trace!("Pulled {} symbols", summary.updated);

        Ok(summary)
    }

    fn fault(
        &self,
        error: AdsSyncError,
        outcome: impl FnOnce(String) -> EngineOutcome,
    ) -> EngineOutcome {
        self.stats.record_error(&error);
        self.transition(EngineState::Faulted);
        outcome(error.to_string())
    }

    async fn release(&mut self) {
        if self.transport.is_open() {
            if let Err(e) = self.transport.close().await {
                warn!("Error closing ADS session on {}: {}", self.transport.name(), e);
            }
        }
        self.stats.set_connected(false);
    }

    fn transition(&self, next: EngineState) {
        let current = *self.state.borrow();
        if !current.can_transition_to(next) {
            warn!("Ignoring engine transition {} -> {}", current, next);
            return;
        }
        info!("ADS engine state: {} -> {}", current, next);
        self.state.send_replace(next);
    }
}

/// Caller side of a running engine
pub struct EngineHandle {
    task: JoinHandle<EngineOutcome>,
    token: CancellationToken,
    state: Arc<watch::Sender<EngineState>>,
    stats: Arc<EngineStats>,
}

impl EngineHandle {
    /// Request a cooperative stop
    pub fn cancel(&self) {
        debug!("ADS poll engine cancellation requested");
        self.token.cancel();
    }

    pub fn state(&self) -> EngineState {
        *self.state.borrow()
    }

    /// Receiver notified on every state change
    pub fn subscribe(&self) -> watch::Receiver<EngineState> {
        self.state.subscribe()
    }

    /// Whether the transport session is currently open
    pub fn is_connected(&self) -> bool {
        self.stats.is_connected()
    }

    pub fn stats(&self) -> EngineStatsSnapshot {
        self.stats.snapshot()
    }

    /// Wait until the engine reaches `Terminated`
    ///
    /// A worker task that panicked or was aborted comes back as `StateError`.
    /// The release profile sets `panic = "abort"`, so there a panic in a
    /// transport ends the process instead and only unwinding builds (dev,
    /// test) take this path.
    pub async fn wait(self) -> Result<EngineOutcome> {
        match self.task.await {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                self.stats.set_connected(false);
                self.stats.record_error(&e);
                self.state.send_replace(EngineState::Terminated);
                Err(AdsSyncError::state(format!("ADS poll engine task aborted: {}", e)))
            },
        }
    }

    /// Cancel, then wait for termination
    pub async fn stop(self) -> Result<EngineOutcome> {
        self.cancel();
        self.wait().await
    }
}

impl std::fmt::Debug for EngineHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineHandle")
            .field("state", &self.state())
            .field("cancelled", &self.token.is_cancelled())
            .finish()
    }
}
