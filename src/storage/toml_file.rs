//! TOML backend.
//!
//! Edits go through [`toml_edit::DocumentMut`], so comments, formatting and
//! tables the tool does not manage survive a store unchanged.

use anyhow::Result;
use std::path::PathBuf;
use toml_edit::{DocumentMut, Item, Value};

use super::{StorageBackend, public_values};
use crate::core::{EnvgenError, ValueMap};
use crate::schema::EnvSchema;
use crate::utils::fs::{read_or_empty, safe_write};

/// TOML file backend holding variables as top-level keys
#[derive(Debug, Clone)]
pub struct TomlStorage {
    path: PathBuf,
}

impl TomlStorage {
    /// Backend for the file at `path`
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
        }
    }

    fn read_document(&self) -> Result<DocumentMut> {
        let text = read_or_empty(&self.path)?;
        let document = text.parse::<DocumentMut>().map_err(|e| EnvgenError::StorageParse {
            path: self.path.display().to_string(),
            reason: e.to_string(),
        })?;
        Ok(document)
    }
}

impl StorageBackend for TomlStorage {
    fn load(&self) -> Result<ValueMap> {
        let document = self.read_document()?;

        Ok(document
            .iter()
            .filter_map(|(key, item)| {
                let text = match item {
                    Item::Value(value) => scalar_string(value)?,
                    _ => return None,
                };
                Some((key.to_string(), text))
            })
            .collect())
    }

    fn store(&mut self, values: &ValueMap, schema: &EnvSchema) -> Result<()> {
        let public = public_values(values, schema);
        let mut document = self.read_document()?;

        for (name, value) in &public {
            match document.get_mut(name).and_then(Item::as_value_mut) {
                Some(existing) => {
                    // Keep the inline comment and spacing around the old value
                    let decor = existing.decor().clone();
                    *existing = Value::from(value.as_str());
                    *existing.decor_mut() = decor;
                }
                None => document[name.as_str()] = toml_edit::value(value.as_str()),
            }
        }

        safe_write(&self.path, &document.to_string())?;
        tracing::info!("Wrote {} variables to {}", public.len(), self.path.display());
        Ok(())
    }

    fn describe(&self) -> String {
        format!("toml file {}", self.path.display())
    }
}

fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.value().clone()),
        Value::Integer(i) => Some(i.value().to_string()),
        Value::Float(f) => Some(f.value().to_string()),
        Value::Boolean(b) => Some(b.value().to_string()),
        Value::Datetime(d) => Some(d.value().to_string()),
        Value::Array(_) | Value::InlineTable(_) => None,
    }
}
