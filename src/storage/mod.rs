//! Storage backends for generated values.
//!
//! Every backend can [`load`](StorageBackend::load) the values it already holds
//! (used to seed overrides so existing values survive a rerun) and
//! [`store`](StorageBackend::store) the public values of a run without
//! disturbing unrelated content.
//!
//! # Backends
//!
//! | backend   | target                          | merge strategy |
//! |-----------|---------------------------------|----------------|
//! | `stdout`  | standard output                 | prints `NAME=value` lines |
//! | `dotenv`  | `.env`, `.env.*`, `*.env`       | line-oriented, lines replaced in place |
//! | `json`    | `*.json`                        | whole document, top-level keys |
//! | `toml`    | `*.toml`                        | whole document, top-level keys, comments kept |
//! | `yaml`    | `*.yaml`, `*.yml`               | whole document, top-level keys |
//! | `komodo`  | any file, with `--backend komodo` | `[[variable]]` records regenerated |
//!
//! Internal variables are never written by any backend.

pub mod dotenv;
pub mod json;
pub mod komodo;
pub mod stdout;
pub mod toml_file;
pub mod yaml;

pub use dotenv::DotEnvStorage;
pub use json::JsonStorage;
pub use komodo::KomodoStorage;
pub use stdout::StdoutStorage;
pub use toml_file::TomlStorage;
pub use yaml::YamlStorage;

use anyhow::Result;
use std::fmt;
use std::path::Path;

use crate::core::{EnvgenError, ValueMap};
use crate::schema::EnvSchema;

/// Target identifier that selects the stdout backend
pub const STDOUT_TARGET: &str = "stdout";

/// Suffixes recognised when no backend is given explicitly
pub const RECOGNISED_SUFFIXES: &[&str] = &[".env", ".json", ".toml", ".yaml", ".yml"];

/// A place generated values are loaded from and stored to
pub trait StorageBackend {
    /// Values already present at the target
    ///
    /// Missing and empty targets yield an empty map.
    ///
    /// # Errors
    ///
    /// Fails if the target exists but cannot be read or parsed.
    fn load(&self) -> Result<ValueMap>;

    /// Merge the public entries of `values` into the target
    ///
    /// # Errors
    ///
    /// Fails if the target cannot be read, parsed or written.
    fn store(&mut self, values: &ValueMap, schema: &EnvSchema) -> Result<()>;

    /// Human readable description of the target, for logging
    fn describe(&self) -> String;
}

/// Explicit backend selection, overriding suffix detection
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum BackendKind {
    /// `KEY=value` lines
    Dotenv,
    /// JSON object
    Json,
    /// TOML document
    Toml,
    /// YAML mapping
    Yaml,
    /// Komodo `[[variable]]` records
    Komodo,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Dotenv => "dotenv",
            Self::Json => "json",
            Self::Toml => "toml",
            Self::Yaml => "yaml",
            Self::Komodo => "komodo",
        };
        f.write_str(name)
    }
}

impl BackendKind {
    /// Detect the backend from a file path
    ///
    /// `.env` and `.env.<anything>` file names are dotenv files; otherwise the
    /// suffix decides, case-insensitively.
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        if name == ".env" || name.starts_with(".env.") {
            return Some(Self::Dotenv);
        }

        let suffix = path.extension().and_then(|e| e.to_str())?.to_ascii_lowercase();
        match suffix.as_str() {
            "env" => Some(Self::Dotenv),
            "json" => Some(Self::Json),
            "toml" => Some(Self::Toml),
            "yaml" | "yml" => Some(Self::Yaml),
            _ => None,
        }
    }

    /// Construct the backend for `path`
    #[must_use]
    pub fn open(self, path: &Path) -> Box<dyn StorageBackend> {
        let path = path.to_path_buf();
        match self {
            Self::Dotenv => Box::new(DotEnvStorage::new(path)),
            Self::Json => Box::new(JsonStorage::new(path)),
            Self::Toml => Box::new(TomlStorage::new(path)),
            Self::Yaml => Box::new(YamlStorage::new(path)),
            Self::Komodo => Box::new(KomodoStorage::new(path)),
        }
    }
}

/// Resolve a target identifier to a backend
///
/// `"stdout"` always selects [`StdoutStorage`]. Otherwise an explicit
/// `backend` wins over detection from the path.
///
/// # Errors
///
/// Returns [`EnvgenError::StorageFormat`] naming the recognised suffixes when
/// the format cannot be determined.
pub fn resolve_storage(
    target: &str,
    backend: Option<BackendKind>,
) -> Result<Box<dyn StorageBackend>, EnvgenError> {
    if target == STDOUT_TARGET {
        return Ok(Box::new(StdoutStorage::new()));
    }

    let path = Path::new(target);
    let kind = backend.or_else(|| BackendKind::from_path(path)).ok_or_else(|| {
        EnvgenError::StorageFormat {
            target: target.to_string(),
            reason: format!(
                "pass '{STDOUT_TARGET}' or a path ending in {} (or named '.env' / '.env.*'), or choose one with --backend",
                RECOGNISED_SUFFIXES.join(", ")
            ),
        }
    })?;

    tracing::debug!("Using {kind} storage for {target}");
    Ok(kind.open(path))
}

/// The entries of `values` that may be written to storage
///
/// Internal variables and names the schema does not declare are dropped.
#[must_use]
pub fn public_values(values: &ValueMap, schema: &EnvSchema) -> ValueMap {
    values
        .iter()
        .filter(|(name, _)| schema.is_public(name))
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect()
}
