//! Execution of a single generation rule.
//!
//! Every template-bearing field is rendered against the values generated so
//! far before the rule's behavior runs. Commands and crypto material go through
//! the injected [`CommandRunner`] and [`MaterialProvider`].

use serde_yaml::Value;

use super::command::CommandRunner;
use super::crypto::{CryptoArgs, MaterialProvider};
use crate::core::{EnvgenError, ValueMap};
use crate::schema::GenerationRule;
use crate::templating::render;

/// Dispatches rules to their implementation
pub struct RuleExecutor<'a> {
    runner: &'a dyn CommandRunner,
    provider: &'a dyn MaterialProvider,
}

impl<'a> RuleExecutor<'a> {
    /// Create an executor using the given command runner and material provider
    pub fn new(runner: &'a dyn CommandRunner, provider: &'a dyn MaterialProvider) -> Self {
        Self {
            runner,
            provider,
        }
    }

    /// Produce the value for `rule`
    ///
    /// # Errors
    ///
    /// Propagates [`EnvgenError::TemplateRender`] from rendering,
    /// [`EnvgenError::CommandExecution`] from the runner and
    /// [`EnvgenError::UnsupportedAlgorithm`] or [`EnvgenError::CryptoGeneration`]
    /// from the provider.
    pub fn execute(&self, rule: &GenerationRule, values: &ValueMap) -> Result<String, EnvgenError> {
        match rule {
            GenerationRule::Literal {
                value,
            } => render(value, values),
            GenerationRule::Template {
                template,
            } => render(template, values),
            GenerationRule::Command {
                command,
            } => {
                let rendered = render(command, values)?;
                let output = self.runner.run(&rendered)?;
                Ok(output.stdout.trim().to_string())
            }
            GenerationRule::CryptoMaterial {
                command,
                args,
            } => {
                let algorithm = render(command, values)?;
                let args = render_args(args, values)?;
                self.provider.generate(&algorithm, &args)
            }
        }
    }
}

/// Render the string-valued arguments; other scalars pass through untouched
fn render_args(args: &CryptoArgs, values: &ValueMap) -> Result<CryptoArgs, EnvgenError> {
    args.iter()
        .map(|(key, value)| {
            let rendered = match value {
                Value::String(s) => Value::String(render(s, values)?),
                other => other.clone(),
            };
            Ok((key.clone(), rendered))
        })
        .collect()
}
