//! Value generation for a whole schema.
//!
//! The [`Generator`] computes the dependency order once, then walks it: a name
//! with an override takes the override verbatim, every other name runs its rule
//! through the [`RuleExecutor`] against the values produced so far. Overridden
//! names still occupy their place in the order, so referrers observe the
//! override rather than a regenerated value.
//!
//! ```rust,no_run
//! use envgen_cli::core::ValueMap;
//! use envgen_cli::generation::generate_env;
//! use envgen_cli::schema::EnvSchema;
//!
//! # fn example() -> Result<(), envgen_cli::core::EnvgenError> {
//! let schema = EnvSchema::from_yaml_str(
//!     "variables:\n  HOST: { generation: { rule: default, value: localhost } }\n",
//! )?;
//! let mut overrides = ValueMap::new();
//! overrides.insert("HOST".to_string(), "prod-db".to_string());
//! let values = generate_env(&schema, &overrides)?;
//! assert_eq!(values["HOST"], "prod-db");
//! # Ok(())
//! # }
//! ```

pub mod command;
pub mod crypto;
pub mod executor;

pub use command::{CommandOutput, CommandRunner, ShellRunner};
pub use crypto::{BuiltinMaterialProvider, CryptoArgs, MaterialProvider, SUPPORTED_ALGORITHMS};
pub use executor::RuleExecutor;

use crate::core::{EnvgenError, ValueMap};
use crate::resolver;
use crate::schema::EnvSchema;

/// Generates every variable of a schema
pub struct Generator<'a> {
    executor: RuleExecutor<'a>,
}

impl<'a> Generator<'a> {
    /// Create a generator with explicit command and crypto backends
    pub fn new(runner: &'a dyn CommandRunner, provider: &'a dyn MaterialProvider) -> Self {
        Self {
            executor: RuleExecutor::new(runner, provider),
        }
    }

    /// Generate values for every variable in `schema`
    ///
    /// Override keys that are not declared in the schema are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`EnvgenError::CircularDependency`] before anything runs if the
    /// references form a cycle, and [`EnvgenError::Generation`] naming the
    /// variable whose rule failed otherwise. Nothing is retried.
    pub fn generate(
        &self,
        schema: &EnvSchema,
        overrides: &ValueMap,
    ) -> Result<ValueMap, EnvgenError> {
        let order = resolver::order(schema)?;
        let mut values = ValueMap::with_capacity(order.len());

        for name in order {
            if values.contains_key(&name) {
                return Err(EnvgenError::Other {
                    message: format!("Variable '{name}' was generated twice in one run"),
                });
            }

            let value = if let Some(value) = overrides.get(&name) {
                tracing::debug!(target: "generation", "{name}: using override");
                value.clone()
            } else {
                let Some(var) = schema.get(&name) else {
                    continue;
                };
                tracing::debug!(target: "generation", "{name}: running {} rule", var.generation.kind());
                self.executor.execute(&var.generation, &values).map_err(|source| {
                    EnvgenError::Generation {
                        variable: name.clone(),
                        source: Box::new(source),
                    }
                })?
            };

            values.insert(name, value);
        }

        Ok(values)
    }
}

/// Generate with the shell command runner and built-in crypto provider
///
/// # Errors
///
/// See [`Generator::generate`].
pub fn generate_env(schema: &EnvSchema, overrides: &ValueMap) -> Result<ValueMap, EnvgenError> {
    let runner = ShellRunner;
    let provider = BuiltinMaterialProvider;
    Generator::new(&runner, &provider).generate(schema, overrides)
}
