//! Shared helpers for the adssync integration tests

#![allow(dead_code)]
#![allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use adssync::{
    AdsSyncError, AdsTransport, DataType, EngineHandle, Result, SymbolMode, SymbolSpec,
    SymbolTable, SymbolValue, ValueMap, ValueStore,
};

/// Transport call as seen by [`ScriptedTransport`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    Open,
    Close,
    Lookup,
    Read,
    Write,
}

#[derive(Debug, Clone, Copy)]
pub struct Call {
    pub kind: CallKind,
    /// Whether the watched token was already cancelled when the call started
    pub after_cancel: bool,
}

/// Call journal shared between a test and its transport
#[derive(Debug, Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<Call>>>);

impl Journal {
    pub fn calls(&self) -> Vec<Call> {
        self.0.lock().clone()
    }

    pub fn count(&self, kind: CallKind) -> usize {
        self.0.lock().iter().filter(|c| c.kind == kind).count()
    }

    pub fn batches_after_cancel(&self) -> usize {
        self.0
            .lock()
            .iter()
            .filter(|c| c.after_cancel && matches!(c.kind, CallKind::Read | CallKind::Write))
            .count()
    }

    fn push(&self, call: Call) {
        self.0.lock().push(call);
    }
}

/// Transport answering every read with fixed values, with optional latency
/// and a failing read
pub struct ScriptedTransport {
    values: ValueMap,
    journal: Journal,
    watched: CancellationToken,
    batch_latency: Duration,
    fail_read_at: Option<usize>,
    open: bool,
}

impl ScriptedTransport {
    pub fn new(values: ValueMap, watched: CancellationToken) -> Self {
        Self {
            values,
            journal: Journal::default(),
            watched,
            batch_latency: Duration::ZERO,
            fail_read_at: None,
            open: false,
        }
    }

    pub fn with_batch_latency(mut self, latency: Duration) -> Self {
        self.batch_latency = latency;
        self
    }

    /// Fail the n-th read (1-based)
    pub fn fail_read_at(mut self, n: usize) -> Self {
        self.fail_read_at = Some(n);
        self
    }

    pub fn journal(&self) -> Journal {
        self.journal.clone()
    }

    fn record(&self, kind: CallKind) {
        self.journal.push(Call {
            kind,
            after_cancel: self.watched.is_cancelled(),
        });
    }

    async fn latency(&self) {
        if !self.batch_latency.is_zero() {
            tokio::time::sleep(self.batch_latency).await;
        }
    }
}

#[async_trait]
impl AdsTransport for ScriptedTransport {
    fn name(&self) -> &str {
        "scripted"
    }

    fn is_open(&self) -> bool {
        self.open
    }

    async fn open(&mut self) -> Result<()> {
        self.record(CallKind::Open);
        self.open = true;
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        self.record(CallKind::Close);
        self.open = false;
        Ok(())
    }

    async fn symbol_exists(&mut self, name: &str) -> Result<bool> {
        self.record(CallKind::Lookup);
        Ok(self.values.contains_key(name))
    }

    async fn read_batch(&mut self, names: &[String]) -> Result<ValueMap> {
        self.record(CallKind::Read);
        self.latency().await;

        if Some(self.journal.count(CallKind::Read)) == self.fail_read_at {
            return Err(AdsSyncError::transport("scripted read failure"));
        }
        Ok(names
            .iter()
            .filter_map(|n| self.values.get(n).map(|v| (n.clone(), *v)))
            .collect())
    }

    async fn write_batch(&mut self, values: &ValueMap) -> Result<()> {
        self.record(CallKind::Write);
        self.latency().await;
        for (name, value) in values {
            self.values.insert(name.clone(), *value);
        }
        Ok(())
    }
}

/// `[GVL.a BOOL W, GVL.b INT R]`
pub fn example_store() -> Arc<ValueStore> {
    Arc::new(ValueStore::new(SymbolTable::build(vec![
        SymbolSpec::new("GVL.a", DataType::Bool, SymbolMode::ReadWrite),
        SymbolSpec::new("GVL.b", DataType::Int, SymbolMode::ReadOnly),
    ])))
}

pub fn example_values() -> ValueMap {
    ValueMap::from([
        ("GVL.a".to_string(), SymbolValue::Bool(false)),
        ("GVL.b".to_string(), SymbolValue::Int(7)),
    ])
}

pub async fn wait_for_cycles(handle: &EngineHandle, cycles: u64) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while handle.stats().cycles_completed < cycles {
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
    })
    .await
    .expect("engine did not reach the expected cycle count");
}
