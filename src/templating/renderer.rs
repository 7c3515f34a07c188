//! Tera-based rendering of template-bearing rule fields.
//!
//! Every entry of the value map is exposed to the template as a top-level
//! string variable. Lookups are strict: referencing a variable that has not
//! been generated yet (or does not exist) is an error, never an empty string.
//!
//! The full Tera expression language is available, which covers the pipe
//! filters and arithmetic the schemas rely on:
//!
//! ```rust,no_run
//! use envgen_cli::core::ValueMap;
//! use envgen_cli::templating::render;
//!
//! let mut values = ValueMap::new();
//! values.insert("VALUE".to_string(), "41".to_string());
//! assert_eq!(render("{{ VALUE | int + 1 }}", &values).unwrap(), "42");
//! ```

use crate::core::{EnvgenError, ValueMap};
use regex::Regex;
use strsim::levenshtein;
use tera::{Context as TeraContext, Tera};

use super::references::has_markers;

/// Suggestions are offered when the edit distance is within this share of the name length
const SIMILARITY_THRESHOLD_PERCENT: usize = 50;

/// Render `template` against the values generated so far
///
/// Strings without any template syntax are returned unchanged without
/// involving Tera, so static values never fail to render.
///
/// # Errors
///
/// Returns [`EnvgenError::TemplateRender`] when the template references an
/// unknown variable or is syntactically invalid.
pub fn render(template: &str, values: &ValueMap) -> Result<String, EnvgenError> {
    if !has_markers(template) {
        return Ok(template.to_string());
    }

    let mut context = TeraContext::new();
    for (name, value) in values {
        context.insert(name.as_str(), value);
    }

    // A fresh instance per render keeps renders independent of each other
    let mut tera = Tera::default();
    tera.autoescape_on(vec![]);

    tera.render_str(template, &context).map_err(|error| {
        let message = format_tera_error(&error);
        tracing::debug!(target: "templating", "Render failed: {message}");
        match extract_variable_name(&message) {
            Some(variable) => {
                let suggestions = find_similar_variables(&variable, values);
                EnvgenError::TemplateRender {
                    template: template.to_string(),
                    message,
                    variable: Some(variable),
                    suggestions,
                }
            }
            None => EnvgenError::TemplateRender {
                template: template.to_string(),
                message,
                variable: None,
                suggestions: Vec::new(),
            },
        }
    })
}

/// Format a Tera error into a single readable message
///
/// Walks the error chain and drops Tera's internal one-off template name.
#[must_use]
pub fn format_tera_error(error: &tera::Error) -> String {
    use std::error::Error;

    let mut all_messages = vec![error.to_string()];
    let mut current_error: Option<&dyn Error> = error.source();
    while let Some(err) = current_error {
        all_messages.push(err.to_string());
        current_error = err.source();
    }

    let messages: Vec<String> = all_messages
        .iter()
        .map(|msg| {
            msg.replace("while rendering '__tera_one_off'", "")
                .replace("Failed to render '__tera_one_off'", "")
                .replace("Failed to parse '__tera_one_off'", "")
                .replace("'__tera_one_off'", "template")
                .trim()
                .to_string()
        })
        .filter(|msg| !msg.is_empty())
        .collect();

    if messages.is_empty() {
        "Template syntax error".to_string()
    } else {
        messages.join(": ")
    }
}

/// Extract the undefined variable name from a Tera message
fn extract_variable_name(message: &str) -> Option<String> {
    let re = Regex::new(r"Variable `([^`]+)` not found").ok()?;
    let caps = re.captures(message)?;
    caps.get(1).map(|m| m.as_str().to_string())
}

/// Known variable names close to `target`, closest first, at most three
fn find_similar_variables(target: &str, values: &ValueMap) -> Vec<String> {
    let mut scored: Vec<_> =
        values.keys().map(|name| (name.clone(), levenshtein(target, name))).collect();

    scored.sort_by_key(|(_, dist)| *dist);

    scored
        .into_iter()
        .filter(|(_, dist)| *dist <= target.len() * SIMILARITY_THRESHOLD_PERCENT / 100)
        .take(3)
        .map(|(name, _)| name)
        .collect()
}
