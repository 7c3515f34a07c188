//! Command-line interface for envgen.
//!
//! `envgen` takes a single schema file and runs the whole pipeline:
//!
//! 1. load and check the schema
//! 2. resolve the storage target
//! 3. unless `--force` is given, load the values the target already holds and
//!    use them as overrides so existing secrets survive a rerun
//! 4. apply `--override KEY=VALUE` arguments on top
//! 5. generate the remaining values in dependency order
//! 6. validate every value against its type and constraints
//! 7. merge the public values into the target
//!
//! Nothing is written unless every step succeeds.
//!
//! # Examples
//!
//! ```bash
//! # Print generated values
//! envgen env.schema.yaml
//!
//! # Fill in a dotenv file, keeping values it already has
//! envgen env.schema.yaml --storage .env
//!
//! # Regenerate everything except a pinned host
//! envgen env.schema.yaml -s config/app.json --force -o DB_HOST=db.internal
//!
//! # Write Komodo [[variable]] records into a stack file
//! envgen env.schema.yaml -s stack.toml --backend komodo
//! ```
//!
//! # Logging
//!
//! Diagnostics go to stderr through `tracing`, so stdout output stays
//! machine-readable. `RUST_LOG` takes precedence over `--verbose` and
//! `--quiet` when it is set.


use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use crate::core::{EnvgenError, ValueMap};
use crate::generation::generate_env;
use crate::schema::EnvSchema;
use crate::storage::{BackendKind, STDOUT_TARGET, resolve_storage};
use crate::validation::{canonical_strings, validate_env};

/// Runtime configuration derived from the command line.
///
/// Separating this from [`Cli`] lets tests drive [`Cli::execute_with_config`]
/// without touching the global tracing subscriber.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliConfig {
    /// Filter directive used when `RUST_LOG` is not set
    pub log_level: String,

    /// Storage target, either `stdout` or a file path
    pub storage: String,

    /// Explicit backend, bypassing suffix detection
    pub backend: Option<BackendKind>,

    /// Ignore values already present in the target
    pub force: bool,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
            storage: STDOUT_TARGET.to_string(),
            backend: None,
            force: false,
        }
    }
}

/// Generate environment variables from a YAML schema.
#[derive(Parser, Debug)]
#[command(
    name = "envgen",
    about = "Generate environment variables from a YAML schema",
    version,
    long_about = "Generates environment variable values from a YAML schema (literals, shell \
                  commands, templates and cryptographic material), validates them and merges \
                  them into a dotenv, JSON, TOML, YAML or Komodo file without disturbing \
                  unrelated content."
)]
pub struct Cli {
    /// Path to the schema file
    schema: PathBuf,

    /// Where to write the values: `stdout` or a file path
    ///
    /// The format is detected from the file name (`.env`, `.env.*`, `*.env`,
    /// `*.json`, `*.toml`, `*.yaml`, `*.yml`) unless `--backend` is given.
    #[arg(short, long, default_value = STDOUT_TARGET)]
    storage: String,

    /// Storage format, overriding detection from the file name
    #[arg(short, long, value_enum)]
    backend: Option<BackendKind>,

    /// Set a value instead of generating it (repeatable)
    #[arg(short = 'o', long = "override", value_name = "KEY=VALUE")]
    overrides: Vec<String>,

    /// Regenerate every value, ignoring those already stored
    #[arg(long)]
    force: bool,

    /// Enable debug output
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only report errors
    #[arg(short, long, global = true)]
    quiet: bool,
}

impl Cli {
    /// Set up logging and run the pipeline.
    ///
    /// # Errors
    ///
    /// Returns the first failure of any pipeline step; the storage target is
    /// left untouched in that case.
    pub fn execute(self) -> Result<()> {
        let config = self.build_config();
        init_logging(&config);
        self.execute_with_config(config)
    }

    /// Translate the parsed flags into a [`CliConfig`].
    #[must_use]
    pub fn build_config(&self) -> CliConfig {
        let log_level = if self.verbose {
            "debug"
        } else if self.quiet {
            "error"
        } else {
            "warn"
        };

        CliConfig {
            log_level: log_level.to_string(),
            storage: self.storage.clone(),
            backend: self.backend,
            force: self.force,
        }
    }

    /// Run the pipeline with an explicit configuration.
    ///
    /// # Errors
    ///
    /// See [`execute`](Self::execute).
    pub fn execute_with_config(self, config: CliConfig) -> Result<()> {
        let schema = EnvSchema::load(&self.schema)?;
        tracing::debug!("Loaded {} variables from {}", schema.len(), self.schema.display());

        let cli_overrides = parse_overrides(&self.overrides)?;
        let mut storage = resolve_storage(&config.storage, config.backend)?;
        let target = storage.describe();

        let mut overrides = if config.force {
            tracing::debug!("--force given, ignoring values in {target}");
            ValueMap::new()
        } else {
            let existing = storage
                .load()
                .with_context(|| format!("Failed to load existing values from {target}"))?;
            tracing::debug!("Found {} existing values in {target}", existing.len());
            existing
        };
        overrides.extend(cli_overrides);

        let generated = generate_env(&schema, &overrides)?;
        let typed = validate_env(&schema, &generated)?;
        let values = canonical_strings(&typed);

        storage
            .store(&values, &schema)
            .with_context(|| format!("Failed to write values to {target}"))?;
        tracing::info!("Stored {} values in {target}", values.len());
        Ok(())
    }
}

/// Parse `KEY=VALUE` arguments, splitting on the first `=`.
///
/// Later arguments win over earlier ones for the same key.
///
/// # Errors
///
/// Returns [`EnvgenError::InvalidOverride`] for an argument without `=` or
/// with an empty key.
pub fn parse_overrides(args: &[String]) -> Result<ValueMap, EnvgenError> {
    let mut overrides = ValueMap::new();
    for arg in args {
        match arg.split_once('=') {
            Some((key, value)) if !key.trim().is_empty() => {
                overrides.insert(key.trim().to_string(), value.to_string());
            }
            _ => {
                return Err(EnvgenError::InvalidOverride {
                    input: arg.clone(),
                });
            }
        }
    }
    Ok(overrides)
}

/// Install the global tracing subscriber, writing to stderr.
///
/// `RUST_LOG` wins over `config.log_level` when set. Calling this more than
/// once is harmless; later calls are ignored.
pub fn init_logging(config: &CliConfig) {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::new(&config.log_level)
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
