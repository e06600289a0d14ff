//! Virtual PLC transport
//!
//! Loopback controller kept in memory. Writes land in the simulated PLC
//! memory and are returned by later reads. Used by the binary when no wire
//! transport is plugged in and by the tests, which can poke the PLC side
//! through a [`VirtualPlcHandle`] and inject faults.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::traits::{AdsTarget, AdsTransport};
use crate::error::{AdsSyncError, Result};
use crate::store::{ValueMap, ValueStore};
use crate::symbols::SymbolValue;

/// Call counters of a virtual PLC
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlcCounters {
    pub opens: u64,
    pub closes: u64,
    pub lookups: u64,
    pub reads: u64,
    pub writes: u64,
}

impl PlcCounters {
    /// Read and write batches served so far
    pub fn batches(&self) -> u64 {
        self.reads + self.writes
    }
}

#[derive(Debug, Default)]
struct PlcMemory {
    symbols: HashMap<String, SymbolValue>,
    counters: PlcCounters,
}

#[derive(Debug, Clone, Default)]
struct FaultPlan {
    refuse_open: bool,
    fail_after_batches: Option<u64>,
}

/// In-memory controller implementing [`AdsTransport`]
pub struct VirtualPlc {
    name: Arc<str>,
    target: Option<AdsTarget>,
    open: bool,
    memory: Arc<Mutex<PlcMemory>>,
    faults: FaultPlan,
}

impl VirtualPlc {
    pub fn new(name: impl Into<String>) -> Self {
        let name: String = name.into();
        Self {
            name: name.into(),
            target: None,
            open: false,
            memory: Arc::new(Mutex::new(PlcMemory::default())),
            faults: FaultPlan::default(),
        }
    }

    /// Virtual PLC exposing every synchronized symbol of `store` with its current value
    pub fn seeded_from(name: impl Into<String>, store: &ValueStore) -> Self {
        let expected = store.expected_symbols();
        let values = store
            .snapshot()
            .into_iter()
            .filter(|(name, _)| expected.contains(name));
        Self::new(name).with_symbols(values)
    }

    /// Session parameters reported on open
    pub fn with_target(mut self, target: AdsTarget) -> Self {
        self.target = Some(target);
        self
    }

    pub fn with_symbol(self, name: impl Into<String>, value: impl Into<SymbolValue>) -> Self {
        self.memory.lock().symbols.insert(name.into(), value.into());
        self
    }

    pub fn with_symbols<I>(self, values: I) -> Self
    where
        I: IntoIterator<Item = (String, SymbolValue)>,
    {
        self.memory.lock().symbols.extend(values);
        self
    }

    /// Remove a symbol from the controller, as if it were not downloaded
    pub fn without_symbol(self, name: &str) -> Self {
        self.memory.lock().symbols.remove(name);
        self
    }

    /// Make every `open` fail
    pub fn refuse_open(mut self) -> Self {
        self.faults.refuse_open = true;
        self
    }

    /// Fail every batch once `batches` read/write batches have been served
    pub fn fail_after(mut self, batches: u64) -> Self {
        self.faults.fail_after_batches = Some(batches);
        self
    }

    /// Shared view of the PLC memory, usable after the transport is moved
    pub fn handle(&self) -> VirtualPlcHandle {
        VirtualPlcHandle {
            memory: self.memory.clone(),
        }
    }

    fn ensure_open(&self) -> Result<()> {
        if self.open {
            Ok(())
        } else {
            Err(AdsSyncError::not_connected())
        }
    }

    fn check_injected_fault(&self, memory: &PlcMemory) -> Result<()> {
        match self.faults.fail_after_batches {
            Some(limit) if memory.counters.batches() >= limit => Err(AdsSyncError::transport(
                format!("{}: injected failure after {} batches", self.name, limit),
            )),
            _ => Ok(()),
        }
    }
}

impl std::fmt::Debug for VirtualPlc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VirtualPlc")
            .field("name", &self.name)
            .field("target", &self.target)
            .field("open", &self.open)
            .finish()
    }
}

#[async_trait]
impl AdsTransport for VirtualPlc {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_open(&self) -> bool {
        self.open
    }

    async fn open(&mut self) -> Result<()> {
        self.memory.lock().counters.opens += 1;

        if self.faults.refuse_open {
            return Err(AdsSyncError::connection(format!(
                "{}: target refused the connection",
                self.name
            )));
        }

        self.open = true;
        match &self.target {
            Some(target) => info!("{}: virtual session open to {}", self.name, target),
            None => info!("{}: virtual session open", self.name),
        }
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        if !self.open {
            return Ok(());
        }
        self.open = false;
        self.memory.lock().counters.closes += 1;
        info!("{}: virtual session closed", self.name);
        Ok(())
    }

    async fn symbol_exists(&mut self, name: &str) -> Result<bool> {
        self.ensure_open()?;
        let mut memory = self.memory.lock();
        memory.counters.lookups += 1;
        Ok(memory.symbols.contains_key(name))
    }

    async fn read_batch(&mut self, names: &[String]) -> Result<ValueMap> {
        self.ensure_open()?;
        let mut memory = self.memory.lock();
        self.check_injected_fault(&memory)?;
        memory.counters.reads += 1;

        let mut values = ValueMap::with_capacity(names.len());
        for name in names {
            match memory.symbols.get(name) {
                Some(value) => {
                    values.insert(name.clone(), *value);
                },
                None => {
                    return Err(AdsSyncError::transport(format!(
                        "{}: read of unknown symbol [{}]",
                        self.name, name
                    )))
                },
            }
        }

        debug!("{}: read {} symbols", self.name, values.len());
        Ok(values)
    }

    async fn write_batch(&mut self, values: &ValueMap) -> Result<()> {
        self.ensure_open()?;
        let mut memory = self.memory.lock();
        self.check_injected_fault(&memory)?;
        memory.counters.writes += 1;

        if let Some(unknown) = values.keys().find(|name| !memory.symbols.contains_key(*name)) {
            warn!("{}: write rejected, unknown symbol [{}]", self.name, unknown);
            return Err(AdsSyncError::transport(format!(
                "{}: write of unknown symbol [{}]",
                self.name, unknown
            )));
        }

        for (name, value) in values {
            memory.symbols.insert(name.clone(), *value);
        }
        debug!("{}: wrote {} symbols", self.name, values.len());
        Ok(())
    }
}

/// Outside view of a [`VirtualPlc`]'s memory and counters
#[derive(Debug, Clone)]
pub struct VirtualPlcHandle {
    memory: Arc<Mutex<PlcMemory>>,
}

impl VirtualPlcHandle {
    /// Current PLC-side value of a symbol
    pub fn value(&self, name: &str) -> Option<SymbolValue> {
        self.memory.lock().symbols.get(name).copied()
    }

    /// Change a value on the PLC side, as the PLC program would
    pub fn set_value(&self, name: &str, value: impl Into<SymbolValue>) -> bool {
        match self.memory.lock().symbols.get_mut(name) {
            Some(slot) => {
                *slot = value.into();
                true
            },
            None => false,
        }
    }

    pub fn counters(&self) -> PlcCounters {
        self.memory.lock().counters
    }
}
