//! Synchronized value store
//!
//! Wraps the [`SymbolTable`] and the outbound write-shadow behind one mutex.
//! Single-symbol access ([`ValueStore::get`], [`ValueStore::set`]) and the two
//! bulk operations used by the poll cycle ([`ValueStore::apply_read_result`],
//! [`ValueStore::refresh_write_shadow`]) all take the same lock, so a batch is
//! never observed half applied.
//!
//! The lock is a `parking_lot::Mutex` and is never held across an `.await`.

use parking_lot::Mutex;
use std::collections::HashMap;
use tracing::{debug, error, info, warn};

use crate::symbols::{SymbolTable, SymbolValue};

/// Symbol name to value mapping exchanged with the transport
pub type ValueMap = HashMap<String, SymbolValue>;

/// Outcome of one [`ValueStore::apply_read_result`] batch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplySummary {
    /// Read-list symbols overwritten from the result
    pub updated: usize,
    /// Read-list symbols absent from the result
    pub missing: Vec<String>,
}

impl ApplySummary {
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}

#[derive(Debug)]
struct StoreInner {
    table: SymbolTable,
    write_shadow: ValueMap,
}

/// Thread-safe store shared by the poll cycle and local readers/writers
#[derive(Debug)]
pub struct ValueStore {
    inner: Mutex<StoreInner>,
}

impl ValueStore {
    /// Wrap a built table; the write-shadow starts with the write-list defaults
    pub fn new(table: SymbolTable) -> Self {
        table.warn_write_only();

        let mut write_shadow = ValueMap::with_capacity(table.write_list().len());
        for name in table.write_list() {
            if let Some(desc) = table.get(name) {
                write_shadow.insert(name.clone(), desc.value());
                info!("Successfully add [{}] in the ads writedict", name);
            }
        }

        Self {
            inner: Mutex::new(StoreInner {
                table,
                write_shadow,
            }),
        }
    }

    /// Current value of a symbol, `None` when the symbol is unknown
    pub fn get(&self, symbolic_name: &str) -> Option<SymbolValue> {
        let value = {
            let inner = self.inner.lock();
            inner.table.get(symbolic_name).map(|desc| desc.value())
        };

        if value.is_none() {
            warn!("Cannot read [{}]: unknown symbol", symbolic_name);
        }
        value
    }

    /// Overwrite the local value of a symbol
    ///
    /// Returns `false` (and logs) when the symbol is unknown. The value is
    /// stored even when it does not fit the declared type.
    pub fn set(&self, symbolic_name: &str, value: impl Into<SymbolValue>) -> bool {
        let value = value.into();
        let mut inner = self.inner.lock();

        let Some(desc) = inner.table.get_mut(symbolic_name) else {
            warn!("Cannot write [{}]: unknown symbol", symbolic_name);
            return false;
        };

        if !desc.data_type().accepts(&value) {
            warn!(
                "[{}] declared as {} received {}; stored as is",
                symbolic_name,
                desc.data_type(),
                value
            );
        }
        desc.set_value(value);
        true
    }

    /// Apply a batch read result to every read-list symbol
    ///
    /// Holds the lock once for the whole batch. Names missing from `result`
    /// are logged and keep their previous value.
    pub fn apply_read_result(&self, result: &ValueMap) -> ApplySummary {
        let mut summary = ApplySummary::default();
        let mut inner = self.inner.lock();
        let StoreInner { table, .. } = &mut *inner;

        let read_list = table.read_list().to_vec();
        for name in read_list {
            match (result.get(&name), table.get_mut(&name)) {
                (Some(value), Some(desc)) => {
                    desc.set_value(*value);
                    summary.updated += 1;
                },
                (None, _) => {
                    error!("Cannot update model data [{}]: missing in read result", name);
                    summary.missing.push(name);
                },
                (Some(_), None) => {
                    error!("Cannot update model data [{}]: unknown symbol", name);
                    summary.missing.push(name);
                },
            }
        }

        summary
    }

    /// Copy current write-list values into the write-shadow
    ///
    /// Returns the refreshed shadow, ready to be pushed to the controller.
    pub fn refresh_write_shadow(&self) -> ValueMap {
        let mut inner = self.inner.lock();
        let StoreInner {
            table,
            write_shadow,
        } = &mut *inner;

        for name in table.write_list() {
            match table.get(name) {
                Some(desc) => {
                    write_shadow.insert(name.clone(), desc.value());
                },
                None => error!("Cannot update write dict [{}]: unknown symbol", name),
            }
        }

        write_shadow.clone()
    }

    /// Last refreshed write-shadow
    pub fn write_shadow(&self) -> ValueMap {
        self.inner.lock().write_shadow.clone()
    }

    /// Add known symbols to the read list; see [`SymbolTable::register_read`]
    pub fn register_read<S: AsRef<str>>(&self, names: &[S]) -> usize {
        self.inner.lock().table.register_read(names)
    }

    /// Add known symbols to the write list and seed their shadow entries
    pub fn register_write<S: AsRef<str>>(&self, names: &[S]) -> usize {
        let mut inner = self.inner.lock();
        let StoreInner {
            table,
            write_shadow,
        } = &mut *inner;

        let added = table.register_write(names);
        for name in table.write_list() {
            if !write_shadow.contains_key(name) {
                if let Some(desc) = table.get(name) {
                    write_shadow.insert(name.clone(), desc.value());
                }
            }
        }
        added
    }

    pub fn read_list(&self) -> Vec<String> {
        self.inner.lock().table.read_list().to_vec()
    }

    pub fn write_list(&self) -> Vec<String> {
        self.inner.lock().table.write_list().to_vec()
    }

    /// Symbols that must exist on the controller before cycling
    pub fn expected_symbols(&self) -> Vec<String> {
        self.inner.lock().table.expected_symbols()
    }

    pub fn contains(&self, symbolic_name: &str) -> bool {
        self.inner.lock().table.contains(symbolic_name)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().table.is_empty()
    }

    /// Consistent copy of every symbol value, sorted by name
    pub fn snapshot(&self) -> Vec<(String, SymbolValue)> {
        let mut values: Vec<_> = {
            let inner = self.inner.lock();
            inner
                .table
                .iter()
                .map(|desc| (desc.symbolic_name().to_string(), desc.value()))
                .collect()
        };
        values.sort_by(|a, b| a.0.cmp(&b.0));
        debug!("Snapshot of {} symbols taken", values.len());
        values
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable
mod tests {
    use super::*;
    use crate::symbols::{DataType, SymbolMode, SymbolSpec};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use tracing_test::traced_test;

    fn example_store() -> ValueStore {
        ValueStore::new(SymbolTable::build(vec![
            SymbolSpec::new("GVL.a", DataType::Bool, SymbolMode::ReadWrite),
            SymbolSpec::new("GVL.b", DataType::Int, SymbolMode::ReadOnly),
        ]))
    }

    #[test]
    fn test_example_scenario() {
        let store = example_store();
        assert_eq!(store.get("GVL.a"), Some(SymbolValue::Bool(false)));
        assert_eq!(store.get("GVL.b"), Some(SymbolValue::Int(0)));

        assert!(store.set("GVL.a", true));
        let shadow = store.refresh_write_shadow();
        assert_eq!(
            shadow,
            ValueMap::from([("GVL.a".to_string(), SymbolValue::Bool(true))])
        );

        let result = ValueMap::from([
            ("GVL.a".to_string(), SymbolValue::Bool(true)),
            ("GVL.b".to_string(), SymbolValue::Int(7)),
        ]);
        let summary = store.apply_read_result(&result);
        assert_eq!(summary.updated, 2);
        assert!(summary.is_complete());
        assert_eq!(store.get("GVL.b"), Some(SymbolValue::Int(7)));
    }

    #[test]
    fn test_write_shadow_seeded_with_defaults() {
        let store = example_store();
        assert_eq!(
            store.write_shadow(),
            ValueMap::from([("GVL.a".to_string(), SymbolValue::Bool(false))])
        );
    }

    #[test]
    fn test_write_shadow_freshness() {
        let store = example_store();

        store.set("GVL.a", true);
        store.refresh_write_shadow();
        assert_eq!(store.write_shadow()["GVL.a"], SymbolValue::Bool(true));

        // A set after the refresh waits for the next refresh
        store.set("GVL.a", false);
        assert_eq!(store.write_shadow()["GVL.a"], SymbolValue::Bool(true));

        store.refresh_write_shadow();
        assert_eq!(store.write_shadow()["GVL.a"], SymbolValue::Bool(false));
    }

    #[test]
    #[traced_test]
    fn test_unknown_symbol_resilience() {
        let store = example_store();

        assert_eq!(store.get("GVL.ghost"), None);
        assert!(!store.set("GVL.ghost", 1));
        assert!(logs_contain("Cannot read [GVL.ghost]"));
        assert!(logs_contain("Cannot write [GVL.ghost]"));

        // Store still usable
        assert!(store.set("GVL.b", 3));
        assert_eq!(store.get("GVL.b"), Some(SymbolValue::Int(3)));
    }

    #[test]
    #[traced_test]
    fn test_set_is_permissive_about_types() {
        let store = example_store();
        assert!(store.set("GVL.b", true));
        assert_eq!(store.get("GVL.b"), Some(SymbolValue::Bool(true)));
        assert!(logs_contain("declared as INT"));
    }

    #[test]
    #[traced_test]
    fn test_apply_missing_entries_keep_value() {
        let store = example_store();
        store.set("GVL.a", true);

        let result = ValueMap::from([("GVL.b".to_string(), SymbolValue::Int(42))]);
        let summary = store.apply_read_result(&result);

        assert_eq!(summary.updated, 1);
        assert_eq!(summary.missing, vec!["GVL.a".to_string()]);
        assert_eq!(store.get("GVL.a"), Some(SymbolValue::Bool(true)));
        assert_eq!(store.get("GVL.b"), Some(SymbolValue::Int(42)));
        assert!(logs_contain("missing in read result"));
    }

    #[test]
    fn test_apply_ignores_names_outside_read_list() {
        let store = ValueStore::new(SymbolTable::build(vec![
            SymbolSpec::new("GVL.r", DataType::Int, SymbolMode::ReadOnly),
            SymbolSpec::new("GVL.off", DataType::Int, SymbolMode::Inactive),
        ]));

        let result = ValueMap::from([
            ("GVL.r".to_string(), SymbolValue::Int(1)),
            ("GVL.off".to_string(), SymbolValue::Int(99)),
        ]);
        store.apply_read_result(&result);
        assert_eq!(store.get("GVL.off"), Some(SymbolValue::Int(0)));
    }

    #[test]
    fn test_register_write_seeds_shadow() {
        let store = ValueStore::new(SymbolTable::build(vec![SymbolSpec::new(
            "GVL.late",
            DataType::Bool,
            SymbolMode::Inactive,
        )]));
        assert!(store.write_shadow().is_empty());

        assert_eq!(store.register_write(&["GVL.late", "GVL.ghost"]), 1);
        assert_eq!(store.write_list(), vec!["GVL.late".to_string()]);
        assert_eq!(store.write_shadow()["GVL.late"], SymbolValue::Bool(false));

        assert_eq!(store.register_read(&["GVL.late"]), 1);
        assert_eq!(store.expected_symbols(), vec!["GVL.late".to_string()]);
    }

    #[test]
    fn test_batch_atomicity_under_concurrency() {
        const SYMBOLS: usize = 64;
        const ROUNDS: i64 = 500;

        let mut specs: Vec<SymbolSpec> = (0..SYMBOLS)
            .map(|i| SymbolSpec::new(format!("GVL.r{}", i), DataType::Dint, SymbolMode::ReadOnly))
            .collect();
        // Locally written symbols, not touched by the read batches
        specs.extend(
            (0..8).map(|i| SymbolSpec::new(format!("GVL.w{}", i), DataType::Dint, SymbolMode::Inactive)),
        );
        let store = Arc::new(ValueStore::new(SymbolTable::build(specs)));
        let done = Arc::new(AtomicBool::new(false));

        let writer = {
            let store = store.clone();
            std::thread::spawn(move || {
                for round in 1..=ROUNDS {
                    let result: ValueMap = (0..SYMBOLS)
                        .map(|i| (format!("GVL.r{}", i), SymbolValue::Int(round)))
                        .collect();
                    store.apply_read_result(&result);
                }
            })
        };

        let setters: Vec<_> = (0..8)
            .map(|i| {
                let store = store.clone();
                let done = done.clone();
                std::thread::spawn(move || {
                    let name = format!("GVL.w{}", i);
                    let mut n = 0i64;
                    while !done.load(Ordering::Relaxed) {
                        n += 1;
                        assert!(store.set(&name, n));
                        assert_eq!(store.get(&name), Some(SymbolValue::Int(n)));
                    }
                })
            })
            .collect();

        let reader = {
            let store = store.clone();
            let done = done.clone();
            std::thread::spawn(move || {
                while !done.load(Ordering::Relaxed) {
                    let snapshot = store.snapshot();
                    let batch_values: Vec<_> = snapshot
                        .iter()
                        .filter(|(name, _)| name.starts_with("GVL.r"))
                        .map(|(_, v)| *v)
                        .collect();
                    let first = batch_values[0];
                    assert!(
                        batch_values.iter().all(|v| *v == first),
                        "observed a partially applied batch"
                    );
                }
            })
        };

        writer.join().unwrap();
        done.store(true, Ordering::Relaxed);
        reader.join().unwrap();
        for setter in setters {
            setter.join().unwrap();
        }

        assert_eq!(store.get("GVL.r0"), Some(SymbolValue::Int(ROUNDS)));
    }
}
