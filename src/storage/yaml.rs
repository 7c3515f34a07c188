//! YAML backend.
//!
//! The document's top-level mapping is updated in place (existing key order is
//! kept, new keys are appended) and the whole document is re-serialised.
//! Comments in the original file are not preserved.

use anyhow::Result;
use serde_yaml::{Mapping, Value};
use std::path::PathBuf;

use super::{StorageBackend, public_values};
use crate::core::{EnvgenError, ValueMap};
use crate::schema::EnvSchema;
use crate::utils::fs::{read_or_empty, safe_write};

/// YAML file backend
#[derive(Debug, Clone)]
pub struct YamlStorage {
    path: PathBuf,
}

impl YamlStorage {
    /// Backend for the file at `path`
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
        }
    }

    fn read_document(&self) -> Result<Value> {
        let text = read_or_empty(&self.path)?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        let value = serde_yaml::from_str(&text).map_err(|e| EnvgenError::StorageParse {
            path: self.path.display().to_string(),
            reason: e.to_string(),
        })?;
        Ok(value)
    }
}

impl StorageBackend for YamlStorage {
    fn load(&self) -> Result<ValueMap> {
        let Value::Mapping(mapping) = self.read_document()? else {
            return Ok(ValueMap::new());
        };

        Ok(mapping
            .into_iter()
            .filter_map(|(key, value)| {
                let key = scalar_string(key)?;
                let value = scalar_string(value)?;
                Some((key, value))
            })
            .collect())
    }

    fn store(&mut self, values: &ValueMap, schema: &EnvSchema) -> Result<()> {
        let public = public_values(values, schema);

        let mut mapping = match self.read_document()? {
            Value::Mapping(mapping) => mapping,
            Value::Null => Mapping::new(),
            _ => {
                tracing::warn!(
                    "{} does not contain a YAML mapping, replacing it",
                    self.path.display()
                );
                Mapping::new()
            }
        };

        for (name, value) in &public {
            mapping.insert(Value::String(name.clone()), Value::String(value.clone()));
        }

        let text = serde_yaml::to_string(&Value::Mapping(mapping))?;
        safe_write(&self.path, &text)?;
        tracing::info!("Wrote {} variables to {}", public.len(), self.path.display());
        Ok(())
    }

    fn describe(&self) -> String {
        format!("yaml file {}", self.path.display())
    }
}

fn scalar_string(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
