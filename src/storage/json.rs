//! JSON backend.
//!
//! The whole document is parsed, public values are set as top-level string
//! keys, and the document is written back pretty-printed. Existing key order
//! is preserved and unrelated keys, including nested objects, are kept.

use anyhow::Result;
use serde_json::{Map, Value};
use std::path::PathBuf;

use super::{StorageBackend, public_values};
use crate::core::{EnvgenError, ValueMap};
use crate::schema::EnvSchema;
use crate::utils::fs::{read_or_empty, safe_write};

/// JSON file backend
#[derive(Debug, Clone)]
pub struct JsonStorage {
    path: PathBuf,
}

impl JsonStorage {
    /// Backend for the file at `path`
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
        }
    }

    /// Parse the existing document, `None` when the file is missing or blank
    fn read_document(&self) -> Result<Option<Value>> {
        let text = read_or_empty(&self.path)?;
        if text.trim().is_empty() {
            return Ok(None);
        }
        let value = serde_json::from_str(&text).map_err(|e| EnvgenError::StorageParse {
            path: self.path.display().to_string(),
            reason: e.to_string(),
        })?;
        Ok(Some(value))
    }
}

impl StorageBackend for JsonStorage {
    fn load(&self) -> Result<ValueMap> {
        let Some(Value::Object(map)) = self.read_document()? else {
            return Ok(ValueMap::new());
        };

        Ok(map
            .into_iter()
            .filter_map(|(key, value)| {
                let text = match value {
                    Value::String(s) => s,
                    Value::Number(n) => n.to_string(),
                    Value::Bool(b) => b.to_string(),
                    Value::Null | Value::Array(_) | Value::Object(_) => return None,
                };
                Some((key, text))
            })
            .collect())
    }

    fn store(&mut self, values: &ValueMap, schema: &EnvSchema) -> Result<()> {
        let public = public_values(values, schema);

        let mut document = match self.read_document()? {
            Some(Value::Object(map)) => map,
            Some(_) => {
                tracing::warn!(
                    "{} does not contain a JSON object, replacing it",
                    self.path.display()
                );
                Map::new()
            }
            None => Map::new(),
        };

        for (name, value) in &public {
            document.insert(name.clone(), Value::String(value.clone()));
        }

        let mut text = serde_json::to_string_pretty(&Value::Object(document))?;
        text.push('\n');
        safe_write(&self.path, &text)?;
        tracing::info!("Wrote {} variables to {}", public.len(), self.path.display());
        Ok(())
    }

    fn describe(&self) -> String {
        format!("json file {}", self.path.display())
    }
}
