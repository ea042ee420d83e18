//! Flat JSON key/value resource files.
//!
//! Relies on serde_json's `preserve_order` feature so that `Map` iterates in
//! file order, which becomes the entry order.

use serde_json::{Map, Value};
use std::fs;
use std::path::Path;

use super::ResourceEntries;
use crate::errors::FormatError;

/// Parse a flat JSON object into ordered entries.
///
/// Empty files and a literal `null` produce no entries. Anything other than an
/// object of strings is rejected.
pub fn parse(path: &Path) -> Result<ResourceEntries, FormatError> {
    let content = fs::read_to_string(path).map_err(|source| FormatError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_str(&content).map_err(|message| FormatError::Json {
        path: path.to_path_buf(),
        message,
    })
}

pub fn parse_str(content: &str) -> Result<ResourceEntries, String> {
    // Strip a UTF-8 BOM, common in files saved by Windows tooling
    let content = content.trim_start_matches('\u{feff}');
    if content.trim().is_empty() {
        return Ok(ResourceEntries::new());
    }

    let value: Value = serde_json::from_str(content).map_err(|e| e.to_string())?;
    let map = match value {
        Value::Null => return Ok(ResourceEntries::new()),
        Value::Object(map) => map,
        other => return Err(format!("expected a JSON object, found {}", kind_of(&other))),
    };

    let mut entries = ResourceEntries::new();
    for (key, value) in map {
        match value {
            Value::String(text) => entries.insert(key, text),
            other => {
                return Err(format!(
                    "value for key '{}' is {}, expected a string",
                    key,
                    kind_of(&other)
                ));
            }
        }
    }
    Ok(entries)
}

/// Serialize the mapping as an indented JSON object at `output_path`
pub fn reconstruct(translated: &ResourceEntries, output_path: &Path) -> Result<(), FormatError> {
    let content = to_string_pretty(translated).map_err(|message| FormatError::Json {
        path: output_path.to_path_buf(),
        message,
    })?;
    fs::write(output_path, content).map_err(|source| FormatError::Io {
        path: output_path.to_path_buf(),
        source,
    })
}

pub fn to_string_pretty(entries: &ResourceEntries) -> Result<String, String> {
    let map: Map<String, Value> = entries
        .iter()
        .map(|e| (e.key.clone(), Value::String(e.text.clone())))
        .collect();
    serde_json::to_string_pretty(&Value::Object(map)).map_err(|e| e.to_string())
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
