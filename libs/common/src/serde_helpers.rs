//! Shared Serde deserializers
//!
//! Configuration values that are strings in the service but may arrive as
//! numbers: an unquoted YAML scalar (`password: 1`) or an environment
//! variable that figment parses eagerly (`..._PASSWORD=1234`).

use serde::{Deserialize, Deserializer};

/// Custom deserializer for string fields that also accepts scalars
///
/// Supports the following input formats:
/// - String: `"Administrator"` → `"Administrator"`
/// - Integer: `1234` → `"1234"`
/// - Float: `1.5` → `"1.5"`
/// - Boolean: `true` → `"true"`
///
/// Integers lose leading zeros before they reach this function; such values
/// must be quoted in YAML.
///
/// # Example
/// ```ignore
/// #[derive(Deserialize)]
/// struct Credentials {
///     #[serde(deserialize_with = "deserialize_string_flexible")]
///     password: String,
/// }
/// ```
pub fn deserialize_string_flexible<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrScalar {
        String(String),
        Int(i64),
        UInt(u64),
        Float(f64),
        Bool(bool),
    }

    Ok(match StringOrScalar::deserialize(deserializer)? {
        StringOrScalar::String(s) => s,
        StringOrScalar::Int(i) => i.to_string(),
        StringOrScalar::UInt(u) => u.to_string(),
        StringOrScalar::Float(f) => f.to_string(),
        StringOrScalar::Bool(b) => b.to_string(),
    })
}
