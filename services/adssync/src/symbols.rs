//! Symbol registry
//!
//! Turns declared controller symbols into typed, individually addressable
//! slots. See [`SymbolTable`] for the classification into read and write lists.

pub mod loader;
pub mod table;
pub mod types;

pub use loader::{load_symbol_specs, parse_text_specs, parse_yaml_specs};
pub use table::SymbolTable;
pub use types::{local_key, DataType, SymbolMode, SymbolSpec, SymbolValue, VariableDescriptor};
