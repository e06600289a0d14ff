//! Symbol data types
//!
//! Closed set of PLC data types, the tagged value container and the
//! per-symbol descriptor held by the symbol table.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

use crate::error::AdsSyncError;

/// Separator inserted in place of `.` when deriving a local key
const LOCAL_KEY_DOT: &str = "_dot_";

/// Derive the in-process lookup key from a controller symbol name
///
/// `GVL.input01` becomes `GVL_dot_input01`.
pub fn local_key(symbolic_name: &str) -> String {
    symbolic_name.replace('.', LOCAL_KEY_DOT)
}

/// PLC data type of a symbol
///
/// Unrecognized type tags are kept as [`DataType::Unknown`] and behave like a
/// numeric type with a zero default.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DataType {
    Bool,
    Byte,
    Sint,
    Usint,
    Int,
    Uint,
    Word,
    Dint,
    Udint,
    Dword,
    Unknown(String),
}

impl DataType {
    /// Parse a type tag; never fails
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_ascii_uppercase().as_str() {
            "BOOL" => DataType::Bool,
            "BYTE" => DataType::Byte,
            "SINT" => DataType::Sint,
            "USINT" => DataType::Usint,
            "INT" => DataType::Int,
            "UINT" => DataType::Uint,
            "WORD" => DataType::Word,
            "DINT" => DataType::Dint,
            "UDINT" => DataType::Udint,
            "DWORD" => DataType::Dword,
            _ => DataType::Unknown(tag.trim().to_string()),
        }
    }

    /// Zero value of this type
    pub fn default_value(&self) -> SymbolValue {
        match self {
            DataType::Bool => SymbolValue::Bool(false),
            _ => SymbolValue::Int(0),
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, DataType::Unknown(_))
    }

    /// Inclusive value range of integer types
    pub fn int_range(&self) -> Option<(i64, i64)> {
        match self {
            DataType::Byte | DataType::Usint => Some((0, u8::MAX as i64)),
            DataType::Sint => Some((i8::MIN as i64, i8::MAX as i64)),
            DataType::Int => Some((i16::MIN as i64, i16::MAX as i64)),
            DataType::Uint | DataType::Word => Some((0, u16::MAX as i64)),
            DataType::Dint => Some((i32::MIN as i64, i32::MAX as i64)),
            DataType::Udint | DataType::Dword => Some((0, u32::MAX as i64)),
            DataType::Bool | DataType::Unknown(_) => None,
        }
    }

    /// Whether `value` fits this type
    ///
    /// Unknown types accept anything.
    pub fn accepts(&self, value: &SymbolValue) -> bool {
        match (self, value) {
            (DataType::Unknown(_), _) => true,
            (DataType::Bool, SymbolValue::Bool(_)) => true,
            (DataType::Bool, SymbolValue::Int(_)) => false,
            (_, SymbolValue::Bool(_)) => false,
            (ty, SymbolValue::Int(v)) => ty
                .int_range()
                .is_some_and(|(min, max)| (min..=max).contains(v)),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            DataType::Bool => "BOOL",
            DataType::Byte => "BYTE",
            DataType::Sint => "SINT",
            DataType::Usint => "USINT",
            DataType::Int => "INT",
            DataType::Uint => "UINT",
            DataType::Word => "WORD",
            DataType::Dint => "DINT",
            DataType::Udint => "UDINT",
            DataType::Dword => "DWORD",
            DataType::Unknown(tag) => tag,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Value of a symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SymbolValue {
    Bool(bool),
    Int(i64),
}

impl fmt::Display for SymbolValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SymbolValue::Bool(b) => write!(f, "{}", b),
            SymbolValue::Int(i) => write!(f, "{}", i),
        }
    }
}

impl From<bool> for SymbolValue {
    fn from(value: bool) -> Self {
        SymbolValue::Bool(value)
    }
}

impl From<i64> for SymbolValue {
    fn from(value: i64) -> Self {
        SymbolValue::Int(value)
    }
}

impl From<i32> for SymbolValue {
    fn from(value: i32) -> Self {
        SymbolValue::Int(value as i64)
    }
}

/// Synchronization mode of a declared symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolMode {
    /// Pulled from the controller every cycle (`R`)
    ReadOnly,
    /// Pushed and pulled every cycle (`W`)
    ReadWrite,
    /// Declared but not synchronized (`X`)
    Inactive,
}

impl SymbolMode {
    pub fn is_read(&self) -> bool {
        matches!(self, SymbolMode::ReadOnly | SymbolMode::ReadWrite)
    }

    pub fn is_write(&self) -> bool {
        matches!(self, SymbolMode::ReadWrite)
    }

    /// Short tag used in symbol files
    pub fn tag(&self) -> &'static str {
        match self {
            SymbolMode::ReadOnly => "R",
            SymbolMode::ReadWrite => "W",
            SymbolMode::Inactive => "X",
        }
    }
}

impl FromStr for SymbolMode {
    type Err = AdsSyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "R" | "READONLY" => Ok(SymbolMode::ReadOnly),
            "W" | "READWRITE" | "WRITEREAD" => Ok(SymbolMode::ReadWrite),
            "X" | "INACTIVE" | "NOTACTIVE" => Ok(SymbolMode::Inactive),
            other => Err(AdsSyncError::symbol(format!("Unknown mode: {}", other))),
        }
    }
}

impl fmt::Display for SymbolMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag())
    }
}

/// One declared symbol as read from the symbol specification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolSpec {
    pub name: String,
    pub data_type: DataType,
    pub mode: SymbolMode,
}

impl SymbolSpec {
    pub fn new(name: impl Into<String>, data_type: DataType, mode: SymbolMode) -> Self {
        Self {
            name: name.into(),
            data_type,
            mode,
        }
    }
}

/// Identity and current value of one controller symbol
#[derive(Debug, Clone, PartialEq)]
pub struct VariableDescriptor {
    symbolic_name: String,
    local_key: String,
    data_type: DataType,
    value: SymbolValue,
}

impl VariableDescriptor {
    /// Create a descriptor holding the type's zero value
    pub fn new(symbolic_name: impl Into<String>, data_type: DataType) -> Self {
        let symbolic_name = symbolic_name.into();
        if !data_type.is_known() {
            warn!(
                "[{}] has unknown datatype '{}'. Set default data to [0]",
                symbolic_name, data_type
            );
        }
        let value = data_type.default_value();
        debug!("[{}] is successfully created for ADS server", symbolic_name);

        Self {
            local_key: local_key(&symbolic_name),
            symbolic_name,
            data_type,
            value,
        }
    }

    pub fn symbolic_name(&self) -> &str {
        &self.symbolic_name
    }

    pub fn local_key(&self) -> &str {
        &self.local_key
    }

    pub fn data_type(&self) -> &DataType {
        &self.data_type
    }

    pub fn value(&self) -> SymbolValue {
        self.value
    }

    pub fn set_value(&mut self, value: SymbolValue) {
        self.value = value;
    }
}
