//! Symbol table
//!
//! Owns every [`VariableDescriptor`] keyed by local key and the ordered read
//! and write lists used by the poll cycle.

use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, error, info, warn};

use super::loader;
use super::types::{local_key, SymbolSpec, VariableDescriptor};
use crate::error::Result;

/// Registry of declared controller symbols
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    entries: HashMap<String, VariableDescriptor>,
    read_list: Vec<String>,
    write_list: Vec<String>,
}

impl SymbolTable {
    /// Build a table from declared symbols
    ///
    /// Entries with an empty name or a colliding local key are logged and
    /// skipped; the rest of the table is still built.
    pub fn build<I>(specs: I) -> Self
    where
        I: IntoIterator<Item = SymbolSpec>,
    {
        let mut table = SymbolTable::default();

        for spec in specs {
            let name = spec.name.trim();
            if name.is_empty() {
                error!("Symbol with empty name ignored (type {})", spec.data_type);
                continue;
            }

            let key = local_key(name);
            if let Some(existing) = table.entries.get(&key) {
                error!(
                    "[{}] collides with [{}] on local key '{}'. Entry ignored",
                    name,
                    existing.symbolic_name(),
                    key
                );
                continue;
            }

            table
                .entries
                .insert(key, VariableDescriptor::new(name, spec.data_type));

            if spec.mode.is_read() {
                table.read_list.push(name.to_string());
            }
            if spec.mode.is_write() {
                table.write_list.push(name.to_string());
            }
            if !spec.mode.is_read() && !spec.mode.is_write() {
                info!("!!! The symbol [{}] is ignored", name);
            }
        }

        info!(
            "Symbol table built: {} symbols, {} read, {} write",
            table.entries.len(),
            table.read_list.len(),
            table.write_list.len()
        );
        table
    }

    /// Load a symbol specification file and build the table
    ///
    /// An unreadable or malformed file is a fatal configuration error.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let specs = loader::load_symbol_specs(path.as_ref())?;
        Ok(Self::build(specs))
    }

    /// Find a descriptor by local key
    pub fn lookup(&self, local_key: &str) -> Option<&VariableDescriptor> {
        self.entries.get(local_key)
    }

    pub fn lookup_mut(&mut self, local_key: &str) -> Option<&mut VariableDescriptor> {
        self.entries.get_mut(local_key)
    }

    /// Find a descriptor by controller symbol name
    pub fn get(&self, symbolic_name: &str) -> Option<&VariableDescriptor> {
        self.lookup(&local_key(symbolic_name))
    }

    pub fn get_mut(&mut self, symbolic_name: &str) -> Option<&mut VariableDescriptor> {
        self.lookup_mut(&local_key(symbolic_name))
    }

    pub fn contains(&self, symbolic_name: &str) -> bool {
        self.get(symbolic_name).is_some()
    }

    /// Add known symbols to the read list
    ///
    /// Returns the number of names added. Unknown names are logged and skipped.
    pub fn register_read<S: AsRef<str>>(&mut self, names: &[S]) -> usize {
        let mut added = 0;
        for name in names {
            let name = name.as_ref();
            if !self.contains(name) {
                error!("Unknown variable. Cannot add [{}] in the ads readlist", name);
                continue;
            }
            if self.read_list.iter().any(|n| n == name) {
                debug!("[{}] already in the ads readlist", name);
                continue;
            }
            self.read_list.push(name.to_string());
            added += 1;
            info!("Successfully add [{}] in the ads readlist", name);
        }
        added
    }

    /// Add known symbols to the write list
    ///
    /// Returns the number of names added. Unknown names are logged and skipped.
    pub fn register_write<S: AsRef<str>>(&mut self, names: &[S]) -> usize {
        let mut added = 0;
        for name in names {
            let name = name.as_ref();
            if !self.contains(name) {
                error!("Unknown variable. Cannot add [{}] in the ads writelist", name);
                continue;
            }
            if self.write_list.iter().any(|n| n == name) {
                debug!("[{}] already in the ads writelist", name);
                continue;
            }
            self.write_list.push(name.to_string());
            added += 1;
            info!("Successfully add [{}] in the ads writelist", name);
        }
        added
    }

    pub fn read_list(&self) -> &[String] {
        &self.read_list
    }

    pub fn write_list(&self) -> &[String] {
        &self.write_list
    }

    /// Every synchronized symbol, read list first, without duplicates
    pub fn expected_symbols(&self) -> Vec<String> {
        let mut names = self.read_list.clone();
        for name in &self.write_list {
            if !names.contains(name) {
                names.push(name.clone());
            }
        }
        names
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &VariableDescriptor> {
        self.entries.values()
    }

    /// Warn about write-list symbols that are never read back
    pub(crate) fn warn_write_only(&self) {
        for name in &self.write_list {
            if !self.read_list.contains(name) {
                warn!("[{}] is written but never read back", name);
            }
        }
    }
}
