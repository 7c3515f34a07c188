//! Komodo backend.
//!
//! Komodo stack files keep environment variables as an array of tables:
//!
//! ```toml
//! [[variable]]
//! name = "DB_PASSWORD"
//! value = "hunter2"
//! ```
//!
//! On store every existing `variable` block is stripped from the raw text
//! (both the `[[variable]]` form and an inline `variable = [...]` array), the
//! rest of the file is kept verbatim and one record per public value is
//! appended. Records for variables no longer in the schema are dropped.

use anyhow::Result;
use regex::Regex;
use std::path::PathBuf;

use super::{StorageBackend, public_values};
use crate::core::{EnvgenError, ValueMap};
use crate::schema::EnvSchema;
use crate::utils::fs::{read_or_empty, safe_write};

const VARIABLE_HEADER: &str = r"^\[\[\s*variable\s*\]\]";
const INLINE_VARIABLE: &str = r"^variable\s*=";

/// Komodo TOML file backend
#[derive(Debug, Clone)]
pub struct KomodoStorage {
    path: PathBuf,
}

impl KomodoStorage {
    /// Backend for the file at `path`
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
        }
    }
}

impl StorageBackend for KomodoStorage {
    fn load(&self) -> Result<ValueMap> {
        let text = read_or_empty(&self.path)?;
        if text.trim().is_empty() {
            return Ok(ValueMap::new());
        }

        let table: toml::Table = toml::from_str(&text).map_err(|e| EnvgenError::StorageParse {
            path: self.path.display().to_string(),
            reason: e.to_string(),
        })?;

        let Some(records) = table.get("variable").and_then(toml::Value::as_array) else {
            return Ok(ValueMap::new());
        };

        let mut values = ValueMap::new();
        for record in records {
            let (Some(name), Some(value)) = (
                record.get("name").and_then(toml::Value::as_str),
                record.get("value"),
            ) else {
                tracing::warn!("Skipping malformed variable record in {}", self.path.display());
                continue;
            };
            let value = match value {
                toml::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            values.insert(name.to_string(), value);
        }
        Ok(values)
    }

    fn store(&mut self, values: &ValueMap, schema: &EnvSchema) -> Result<()> {
        let public = public_values(values, schema);
        let existing = read_or_empty(&self.path)?;

        let base = strip_variable_sections(&existing);
        let base = base.trim_end();

        let mut parts: Vec<String> = Vec::with_capacity(public.len() + 1);
        if !base.is_empty() {
            parts.push(base.to_string());
        }
        parts.extend(public.iter().map(|(name, value)| variable_entry(name, value)));

        let mut output = parts.join("\n\n");
        output.push('\n');
        safe_write(&self.path, &output)?;
        tracing::info!("Wrote {} variables to {}", public.len(), self.path.display());
        Ok(())
    }

    fn describe(&self) -> String {
        format!("komodo file {}", self.path.display())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanMode {
    Normal,
    ArrayOfTables,
    InlineArray,
}

/// Remove every `variable` definition from raw TOML, keeping all other text
fn strip_variable_sections(text: &str) -> String {
    let (Ok(header), Ok(inline)) = (Regex::new(VARIABLE_HEADER), Regex::new(INLINE_VARIABLE))
    else {
        return text.to_string();
    };

    let mut result = String::with_capacity(text.len());
    let mut mode = ScanMode::Normal;
    let mut depth: i64 = 0;

    for line in text.split_inclusive('\n') {
        let stripped = line.trim();

        match mode {
            ScanMode::Normal => {
                if header.is_match(stripped) {
                    mode = ScanMode::ArrayOfTables;
                } else if inline.is_match(stripped) {
                    depth = bracket_balance(stripped);
                    if depth > 0 {
                        mode = ScanMode::InlineArray;
                    }
                } else {
                    result.push_str(line);
                }
            }
            ScanMode::ArrayOfTables => {
                // A record ends at the next header that is not another record
                if stripped.starts_with('[') && !header.is_match(stripped) {
                    mode = ScanMode::Normal;
                    result.push_str(line);
                }
            }
            ScanMode::InlineArray => {
                depth += bracket_balance(stripped);
                if depth <= 0 {
                    mode = ScanMode::Normal;
                }
            }
        }
    }

    result
}

fn bracket_balance(line: &str) -> i64 {
    line.chars().fold(0, |acc, c| match c {
        '[' => acc + 1,
        ']' => acc - 1,
        _ => acc,
    })
}

fn variable_entry(name: &str, value: &str) -> String {
    format!("[[variable]]\nname = {}\nvalue = {}", basic_string(name), basic_string(value))
}

/// Quote `s` as a TOML basic string
fn basic_string(s: &str) -> String {
    let mut quoted = String::with_capacity(s.len() + 2);
    quoted.push('"');
    for c in s.chars() {
        match c {
            '\\' => quoted.push_str("\\\\"),
            '"' => quoted.push_str("\\\""),
            '\n' => quoted.push_str("\\n"),
            '\r' => quoted.push_str("\\r"),
            '\t' => quoted.push_str("\\t"),
            c if c.is_control() => quoted.push_str(&format!("\\u{:04X}", u32::from(c))),
            other => quoted.push(other),
        }
    }
    quoted.push('"');
    quoted
}
