//! envgen - environment variables generated from a YAML schema
//!
//! A schema declares every variable an application needs, how each value is
//! produced and what it must look like. envgen generates the values in
//! dependency order, validates them and merges them into an existing
//! configuration file without disturbing content it does not manage.
//!
//! # Architecture Overview
//!
//! ```text
//! schema.yaml ─▶ schema ─▶ resolver ─▶ generation ─▶ validation ─▶ storage
//!                              │            │
//!                         templating   command / crypto
//! ```
//!
//! # Core Modules
//!
//! - [`schema`] - Schema model and YAML loading
//! - [`templating`] - Template reference extraction and Tera rendering
//! - [`resolver`] - Dependency graph and generation order
//! - [`generation`] - Rule execution: literals, shell commands, templates, key material
//! - [`validation`] - Type casting and constraint checks
//! - [`storage`] - Dotenv, JSON, TOML, YAML, Komodo and stdout backends
//! - [`cli`] - Command-line interface
//! - [`core`] - Error types and shared aliases
//! - [`utils`] - Atomic file writes
//!
//! # Schema Format
//!
//! ```yaml
//! variables:
//!   DB_HOST:
//!     generation: { rule: default, value: localhost }
//!   DB_PORT:
//!     type: int
//!     generation: { rule: default, value: "5432" }
//!     validation: { range: { min: 1, max: 65535 } }
//!   DATABASE_URL:
//!     generation:
//!       rule: template
//!       template: "postgres://app@{{ DB_HOST }}:{{ DB_PORT }}/app"
//!   SECRET_KEY:
//!     generation: { rule: openssl, command: random, args: { length: 32 } }
//!   BUILD_SEED:
//!     internal: true
//!     generation: { rule: command, command: "date +%s" }
//! ```
//!
//! Internal variables take part in generation and templating but are never
//! written to storage.
//!
//! # Library Usage
//!
//! ```rust,no_run
//! use envgen_cli::core::ValueMap;
//! use envgen_cli::generation::generate_env;
//! use envgen_cli::schema::EnvSchema;
//! use envgen_cli::validation::validate_env;
//!
//! # fn main() -> anyhow::Result<()> {
//! let schema = EnvSchema::load(std::path::Path::new("env.schema.yaml"))?;
//! let values = generate_env(&schema, &ValueMap::new())?;
//! let typed = validate_env(&schema, &values)?;
//! # let _ = typed;
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod core;
pub mod generation;
pub mod resolver;
pub mod schema;
pub mod storage;
pub mod templating;
pub mod utils;
pub mod validation;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
