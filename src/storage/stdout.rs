//! Stdout backend: prints `NAME=value` lines and never reads anything back.

use anyhow::{Context, Result};
use std::io::{self, Stdout, Write};

use super::{StorageBackend, public_values};
use crate::core::ValueMap;
use crate::schema::EnvSchema;

/// Writes public values to a stream, standard output by default
#[derive(Debug)]
pub struct StdoutStorage<W: Write = Stdout> {
    writer: W,
}

impl StdoutStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::with_writer(io::stdout())
    }
}

impl Default for StdoutStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write> StdoutStorage<W> {
    /// Write to `writer` instead of standard output
    pub fn with_writer(writer: W) -> Self {
        Self {
            writer,
        }
    }

    /// Recover the underlying writer
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> StorageBackend for StdoutStorage<W> {
    fn load(&self) -> Result<ValueMap> {
        Ok(ValueMap::new())
    }

    fn store(&mut self, values: &ValueMap, schema: &EnvSchema) -> Result<()> {
        for (name, value) in public_values(values, schema) {
            writeln!(self.writer, "{name}={value}").context("Failed to write to stdout")?;
        }
        self.writer.flush().context("Failed to flush stdout")?;
        Ok(())
    }

    fn describe(&self) -> String {
        "stdout".to_string()
    }
}
