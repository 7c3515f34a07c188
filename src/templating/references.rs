//! Variable reference extraction for template-bearing strings.
//!
//! The resolver needs to know which other variables a rule depends on before
//! anything is rendered. This module scans the expression blocks of a template
//! and reports the identifiers that name declared variables.
//!
//! # Extraction Rules
//!
//! - Only `{{ ... }}` and `{% ... %}` blocks are scanned; `{# ... #}` comments
//!   and plain text are ignored
//! - String literals inside a block are skipped
//! - Attribute names (`.name`), filter and test names (`| int`, `is defined`) and
//!   keyword argument names (`default(value=...)`) are skipped
//! - Identifiers that are not in the set of known names are dropped; an
//!   undeclared reference is reported later by the renderer
//!
//! ```rust,no_run
//! use envgen_cli::templating::references;
//! use std::collections::HashSet;
//!
//! let known: HashSet<String> = ["HOST", "PORT"].iter().map(|s| s.to_string()).collect();
//! let refs = references("{{ HOST }}:{{ PORT | int + 1 }}", &known);
//! assert_eq!(refs.len(), 2);
//! ```

use regex::Regex;
use std::collections::{BTreeSet, HashSet};

/// Collect the known variable names referenced by `template`
#[must_use]
pub fn references(template: &str, known_names: &HashSet<String>) -> BTreeSet<String> {
    let mut found = BTreeSet::new();

    if !has_markers(template) {
        return found;
    }

    let Ok(block_regex) = Regex::new(r"(?s)\{\{(.*?)\}\}|\{%(.*?)%\}|\{#.*?#\}") else {
        return found;
    };

    for cap in block_regex.captures_iter(template) {
        let Some(expression) = cap.get(1).or_else(|| cap.get(2)) else {
            // Comment block
            continue;
        };
        for identifier in expression_identifiers(expression.as_str()) {
            if known_names.contains(&identifier) {
                found.insert(identifier);
            }
        }
    }

    found
}

/// Whether `template` contains any template syntax at all
#[must_use]
pub fn has_markers(template: &str) -> bool {
    template.contains("{{") || template.contains("{%") || template.contains("{#")
}

/// Identifiers in an expression that may be variable lookups
fn expression_identifiers(expression: &str) -> Vec<String> {
    let stripped = strip_string_literals(expression);
    let Ok(ident_regex) = Regex::new(r"[A-Za-z_][A-Za-z0-9_]*") else {
        return Vec::new();
    };

    let mut identifiers = Vec::new();
    let mut previous_word: Option<&str> = None;

    for m in ident_regex.find_iter(&stripped) {
        let word = m.as_str();
        let before = stripped[..m.start()].trim_end();
        let after = stripped[m.end()..].trim_start();

        // Part of a number literal such as `1e5`
        let glued_to_digit = stripped[..m.start()].chars().last().is_some_and(|c| c.is_ascii_digit());
        let is_attribute = before.ends_with('.');
        let is_filter = before.ends_with('|');
        let is_test = previous_word == Some("is") && before.ends_with("is");
        let is_kwarg = after.starts_with('=') && !after.starts_with("==");

        if !(glued_to_digit || is_attribute || is_filter || is_test || is_kwarg) {
            identifiers.push(word.to_string());
        }
        previous_word = Some(word);
    }

    identifiers
}

/// Replace quoted string contents with spaces so they are not scanned
fn strip_string_literals(expression: &str) -> String {
    let mut result = String::with_capacity(expression.len());
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for ch in expression.chars() {
        match quote {
            Some(q) => {
                if escaped {
                    escaped = false;
                } else if ch == '\\' && q != '`' {
                    escaped = true;
                } else if ch == q {
                    quote = None;
                }
                result.push(' ');
            }
            None => {
                if matches!(ch, '"' | '\'' | '`') {
                    quote = Some(ch);
                    result.push(' ');
                } else {
                    result.push(ch);
                }
            }
        }
    }

    result
}
