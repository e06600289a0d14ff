//! Symbol specification loading
//!
//! Two formats are understood:
//!
//! ```yaml
//! # adssymbols.yaml
//! symbols:
//!   GVL.a: { type: BOOL, mode: W }
//!   GVL.b: { type: INT, mode: R }
//! ```
//!
//! ```text
//! # adssymbols.txt  ->  NAME : TYPE [: MODE]
//! GVL.a : BOOL : W
//! GVL.b : INT
//! ```
//!
//! Top-level problems (unreadable file, wrong document shape) are fatal.
//! Problems with a single entry are logged and the entry is skipped.

use serde::Deserialize;
use std::path::Path;
use tracing::{debug, error};

use super::types::{DataType, SymbolMode, SymbolSpec};
use crate::error::{AdsSyncError, Result};

#[derive(Debug, Deserialize)]
struct RawSymbolEntry {
    #[serde(rename = "type")]
    data_type: String,
    mode: String,
}

/// Load symbol declarations from a file, choosing the format by extension
pub fn load_symbol_specs(path: &Path) -> Result<Vec<SymbolSpec>> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        AdsSyncError::config(format!(
            "Cannot read variable list {}: {}",
            path.display(),
            e
        ))
    })?;

    let is_yaml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));

    debug!(
        "Loading symbols from {} ({} format)",
        path.display(),
        if is_yaml { "yaml" } else { "text" }
    );

    if is_yaml {
        parse_yaml_specs(&content)
    } else {
        Ok(parse_text_specs(&content))
    }
}

/// Parse the YAML symbol document
pub fn parse_yaml_specs(content: &str) -> Result<Vec<SymbolSpec>> {
    let document: serde_yaml::Value = serde_yaml::from_str(content)?;

    let root = document
        .as_mapping()
        .ok_or_else(|| AdsSyncError::config("Symbol document must be a mapping"))?;
    let symbols = root
        .get("symbols")
        .ok_or_else(|| AdsSyncError::config("Symbol document has no 'symbols' section"))?
        .as_mapping()
        .ok_or_else(|| AdsSyncError::config("'symbols' must be a mapping of name -> {type, mode}"))?;

    let mut specs = Vec::with_capacity(symbols.len());
    for (key, value) in symbols {
        let Some(name) = yaml_key_to_string(key) else {
            error!("Cannot extract variable in the list: unsupported key {:?}", key);
            continue;
        };

        let raw: RawSymbolEntry = match serde_yaml::from_value(value.clone()) {
            Ok(raw) => raw,
            Err(e) => {
                error!("Cannot extract variable [{}] in the list: {}", name, e);
                continue;
            },
        };

        let mode = match raw.mode.parse::<SymbolMode>() {
            Ok(mode) => mode,
            Err(e) => {
                error!("Cannot extract variable [{}] in the list: {}", name, e);
                continue;
            },
        };

        specs.push(SymbolSpec::new(name, DataType::from_tag(&raw.data_type), mode));
    }

    Ok(specs)
}

fn yaml_key_to_string(key: &serde_yaml::Value) -> Option<String> {
    match key {
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Parse the line-based `NAME : TYPE [: MODE]` list
pub fn parse_text_specs(content: &str) -> Vec<SymbolSpec> {
    let mut specs = Vec::new();

    for (index, line) in content.lines().enumerate() {
        let line_no = index + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        match parse_text_line(trimmed) {
            Ok(spec) => specs.push(spec),
            Err(e) => error!("Cannot extract variable in line {}: {}", line_no, e),
        }
    }

    specs
}

fn parse_text_line(line: &str) -> Result<SymbolSpec> {
    let mut parts = line.split(':').map(str::trim);

    let name = parts
        .next()
        .and_then(|p| p.split_whitespace().next())
        .ok_or_else(|| AdsSyncError::symbol(format!("missing name in '{}'", line)))?;
    let data_type = parts
        .next()
        .and_then(|p| p.split_whitespace().next())
        .ok_or_else(|| AdsSyncError::symbol(format!("missing type in '{}'", line)))?;
    let mode = match parts.next().and_then(|p| p.split_whitespace().next()) {
        Some(tag) => tag.parse::<SymbolMode>()?,
        None => SymbolMode::ReadOnly,
    };

    Ok(SymbolSpec::new(name, DataType::from_tag(data_type), mode))
}
