//! Core types shared by every envgen module
//!
//! - [`EnvgenError`] - Enumerated error types covering all envgen failure modes
//! - [`ErrorContext`] - User-friendly error wrapper with suggestions and details
//! - [`user_friendly_error`] - Convert any error to the user-friendly format
//! - [`ValueMap`] - Ordered name to value mapping produced by a generation run

pub mod error;

pub use error::{
    EnvgenError, ErrorContext, ValidationFailure, create_error_context, user_friendly_error,
};

/// Variable name to string value, in insertion order
///
/// Used for generated values, overrides and values loaded back from storage.
pub type ValueMap = indexmap::IndexMap<String, String>;
