//! Error handling for envgen
//!
//! This module provides the error types and the user-friendly error reporting used
//! throughout envgen. The error system follows two principles:
//! 1. **Strongly-typed errors** so that callers (and tests) can match on the exact
//!    failure, such as the members of a dependency cycle or the exit code of a command
//! 2. **User-friendly messages** with actionable suggestions when surfaced by the CLI
//!
//! # Architecture
//!
//! - [`EnvgenError`] - Enumerated error types for every failure mode of a run
//! - [`ErrorContext`] - Wrapper that adds details and suggestions for terminal display
//! - [`user_friendly_error`] - Converts any [`anyhow::Error`] into an [`ErrorContext`]
//!
//! The generation core (resolver, renderer, executor, validator) returns
//! `Result<T, EnvgenError>` directly. Layers that touch the filesystem return
//! [`anyhow::Result`] with attached context; the typed error stays recoverable there
//! through `downcast_ref`.
//!
//! # Examples
//!
//! ```rust,no_run
//! use envgen_cli::core::{EnvgenError, user_friendly_error};
//!
//! let error = EnvgenError::CircularDependency {
//!     chain: "A → B → A".to_string(),
//!     members: vec!["A".to_string(), "B".to_string()],
//! };
//! let context = user_friendly_error(anyhow::Error::from(error));
//! context.display(); // Prints the coloured error, details and suggestion to stderr
//! ```

use colored::Colorize;
use std::fmt;
use thiserror::Error;

/// A single failed validation check
///
/// Collected by the validator so that every problem in a generated value set is
/// reported at once instead of one per run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationFailure {
    /// Name of the variable whose value failed
    pub variable: String,
    /// Human readable description of the failed constraint
    pub message: String,
}

impl ValidationFailure {
    /// Create a new failure for `variable`
    pub fn new(variable: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            variable: variable.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.variable, self.message)
    }
}

/// The main error type for envgen operations
///
/// Each variant carries enough information to name the offending variable,
/// command, algorithm or storage target so the CLI can report it precisely.
#[derive(Error, Debug, Clone)]
pub enum EnvgenError {
    /// The schema file does not exist
    #[error("Schema file not found: {path}")]
    SchemaNotFound {
        /// Path that was looked up
        path: String,
    },

    /// The schema is structurally invalid
    ///
    /// Covers YAML syntax errors, unknown rule discriminators, missing fields and
    /// constraints that do not fit the declared type.
    #[error("Invalid schema: {reason}")]
    SchemaError {
        /// Description of the problem
        reason: String,
    },

    /// The variable reference graph contains a cycle
    #[error("Circular dependency detected: {chain}")]
    CircularDependency {
        /// Cycle rendered as `A → B → A`
        chain: String,
        /// Distinct variables participating in the cycle, in cycle order
        members: Vec<String>,
    },

    /// A template could not be rendered
    ///
    /// Either a referenced variable has not been produced or the expression
    /// itself is malformed.
    #[error("Failed to render template '{template}': {message}")]
    TemplateRender {
        /// Template source that failed
        template: String,
        /// Cleaned-up renderer message
        message: String,
        /// Undefined variable name, when the failure is a missing reference
        variable: Option<String>,
        /// Known variable names close to the missing one
        suggestions: Vec<String>,
    },

    /// An external command could not be spawned or exited non-zero
    #[error("Command `{command}` failed{}: {stderr}", exit_code_suffix(.code))]
    CommandExecution {
        /// Rendered command line
        command: String,
        /// Exit code, `None` when the process could not be spawned or was killed
        code: Option<i32>,
        /// Captured standard error (or spawn failure message)
        stderr: String,
    },

    /// The crypto rule names an algorithm no provider implements
    #[error("Unsupported openssl command '{name}'. Supported: {}", .supported.join(", "))]
    UnsupportedAlgorithm {
        /// Requested algorithm name
        name: String,
        /// Algorithms the provider does implement
        supported: Vec<String>,
    },

    /// Key material could not be generated with the given arguments
    #[error("Crypto generation failed: {reason}")]
    CryptoGeneration {
        /// Names the offending value and, where relevant, the supported set
        reason: String,
    },

    /// Generation of a specific variable failed
    #[error("Failed to generate '{variable}': {source}")]
    Generation {
        /// Variable whose rule failed
        variable: String,
        /// Underlying failure
        source: Box<EnvgenError>,
    },

    /// One or more generated values failed type casting or constraints
    #[error("Validation failed:\n{}", format_failures(.failures))]
    Validation {
        /// Every failed check, in schema order
        failures: Vec<ValidationFailure>,
    },

    /// A storage target could not be resolved to a backend
    #[error("Cannot determine storage format for '{target}': {reason}")]
    StorageFormat {
        /// Target identifier supplied by the caller
        target: String,
        /// Why it could not be resolved
        reason: String,
    },

    /// Existing stored content could not be parsed
    #[error("Failed to parse existing storage '{path}': {reason}")]
    StorageParse {
        /// File that failed to parse
        path: String,
        /// Parser message
        reason: String,
    },

    /// A command line override was not in `KEY=VALUE` form
    #[error("Invalid override '{input}': expected KEY=VALUE")]
    InvalidOverride {
        /// The raw argument
        input: String,
    },

    /// Internal invariant violations and other uncategorised failures
    #[error("{message}")]
    Other {
        /// Error message
        message: String,
    },
}

fn exit_code_suffix(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!(" with exit code {code}"),
        None => String::new(),
    }
}

fn format_failures(failures: &[ValidationFailure]) -> String {
    failures.iter().map(|f| format!("  - {f}")).collect::<Vec<_>>().join("\n")
}

impl EnvgenError {
    /// Returns the innermost error, unwrapping [`EnvgenError::Generation`] layers
    #[must_use]
    pub fn root_cause(&self) -> &EnvgenError {
        match self {
            Self::Generation {
                source,
                ..
            } => source.root_cause(),
            other => other,
        }
    }
}

/// Error wrapper with user-facing details and suggestions
///
/// Produced by [`user_friendly_error`] and printed by the binary before exiting
/// with a non-zero status.
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying error
    pub error: EnvgenError,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a new error context with no details or suggestion
    #[must_use]
    pub const fn new(error: EnvgenError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    /// Add an actionable suggestion, displayed in green
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add details explaining the error, displayed in yellow
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Display the error context to stderr with terminal colors
    ///
    /// - Error message: Red and bold
    /// - Details: Yellow
    /// - Suggestion: Green
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error to a user-friendly [`ErrorContext`] with actionable suggestions
///
/// The error chain is walked so that an [`EnvgenError`] wrapped in `anyhow`
/// context (for example "Failed to write .env") is still recognised. The outer
/// context messages are kept as details.
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    let chain: Vec<String> = error.chain().map(ToString::to_string).collect();

    for cause in error.chain() {
        if let Some(envgen_error) = cause.downcast_ref::<EnvgenError>() {
            let mut context = create_error_context(envgen_error);
            if chain.len() > 1 && context.details.is_none() {
                context = context.with_details(chain[..chain.len() - 1].join(": "));
            }
            return context;
        }
    }

    if let Some(io_error) = error.chain().find_map(|c| c.downcast_ref::<std::io::Error>()) {
        let suggestion = match io_error.kind() {
            std::io::ErrorKind::PermissionDenied => {
                "Check the permissions of the storage target and its parent directory"
            }
            std::io::ErrorKind::NotFound => "Check that the path exists and is spelled correctly",
            _ => "Check the file system and try again",
        };
        return ErrorContext::new(EnvgenError::Other {
            message: chain.join(": "),
        })
        .with_suggestion(suggestion);
    }

    ErrorContext::new(EnvgenError::Other {
        message: chain.join(": "),
    })
}

/// Attach variant-specific details and suggestions to an [`EnvgenError`]
#[must_use]
pub fn create_error_context(error: &EnvgenError) -> ErrorContext {
    let context = ErrorContext::new(error.clone());
    match error.root_cause() {
        EnvgenError::SchemaNotFound {
            ..
        } => context.with_suggestion("Pass the path to an existing YAML schema file"),
        EnvgenError::SchemaError {
            ..
        } => context.with_suggestion(
            "Each variable needs a 'generation' mapping with a 'rule' of default, command, template or openssl",
        ),
        EnvgenError::CircularDependency {
            members,
            ..
        } => context
            .with_details(format!("Variables involved: {}", members.join(", ")))
            .with_suggestion("Break the cycle by replacing one reference with a literal value"),
        EnvgenError::TemplateRender {
            variable: Some(variable),
            suggestions,
            ..
        } => {
            let context = context.with_details(format!(
                "'{variable}' is not declared in the schema or has not been generated"
            ));
            if suggestions.is_empty() {
                context.with_suggestion("Declare the variable or fix the reference")
            } else {
                context.with_suggestion(format!("Did you mean: {}?", suggestions.join(", ")))
            }
        }
        EnvgenError::TemplateRender {
            ..
        } => context.with_suggestion("Check the template syntax"),
        EnvgenError::CommandExecution {
            code: None,
            ..
        } => context.with_suggestion("Check that the command exists and is executable"),
        EnvgenError::CommandExecution {
            ..
        } => context.with_suggestion("Run the command manually to inspect its output"),
        EnvgenError::UnsupportedAlgorithm {
            ..
        }
        | EnvgenError::CryptoGeneration {
            ..
        } => context.with_suggestion("Check the 'command' and 'args' of the openssl rule"),
        EnvgenError::Validation {
            ..
        } => context.with_suggestion(
            "Adjust the generation rule or pass a valid value with --override KEY=VALUE",
        ),
        EnvgenError::StorageFormat {
            ..
        } => context.with_suggestion(
            "Use a recognised file suffix or pass --backend dotenv|json|toml|yaml|komodo",
        ),
        EnvgenError::StorageParse {
            ..
        } => context.with_suggestion("Fix the syntax of the existing file or move it out of the way"),
        EnvgenError::InvalidOverride {
            ..
        } => context.with_suggestion("Write overrides as --override NAME=value"),
        EnvgenError::Generation {
            ..
        }
        | EnvgenError::Other {
            ..
        } => context,
    }
}
