//! Test utilities for envgen
//!
//! Helpers shared by unit tests and the integration suite: one-time logging
//! setup and quick construction of schemas.
//!
//! # Example
//!
//! ```rust,no_run
//! use envgen_cli::test_utils::{init_test_logging, schema_with};
//!
//! init_test_logging(None);
//! let schema = schema_with(&["PUBLIC"], &["SEED"]);
//! assert!(schema.is_public("PUBLIC"));
//! assert!(!schema.is_public("SEED"));
//! ```

use std::sync::Once;
use tracing::Level;
use tracing_subscriber::EnvFilter;

use crate::schema::{EnvSchema, GenerationRule, VariableSchema};

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Only the first call has an effect. With `Some(level)` that level is used;
/// with `None` logging is enabled only when `RUST_LOG` is set.
///
/// ```bash
/// RUST_LOG=debug cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .try_init();
    });
}

/// Schema with empty literal variables, in the given order.
///
/// `public` variables come first, then `internal` ones. Useful for storage
/// tests, which only care about names and visibility.
#[must_use]
pub fn schema_with(public: &[&str], internal: &[&str]) -> EnvSchema {
    let mut schema = EnvSchema::default();
    for (names, is_internal) in [(public, false), (internal, true)] {
        for name in names {
            let mut variable = VariableSchema::new(GenerationRule::Literal {
                value: String::new(),
            });
            variable.internal = is_internal;
            schema.variables.insert((*name).to_string(), variable);
        }
    }
    schema
}

/// Schema parsed from YAML, panicking on error.
///
/// # Panics
///
/// Panics if `yaml` is not a valid schema.
#[must_use]
pub fn schema_from_yaml(yaml: &str) -> EnvSchema {
    match EnvSchema::from_yaml_str(yaml) {
        Ok(schema) => schema,
        Err(e) => panic!("invalid test schema: {e}"),
    }
}
