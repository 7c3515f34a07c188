//! Dotenv backend.
//!
//! Updates are line-oriented: a `KEY=...` or `export KEY=...` line for a public
//! variable is replaced in place (keeping the `export` prefix), every other
//! line passes through byte for byte, and variables with no existing line are
//! appended at the end.
//!
//! Values are written bare when they are plain, and double-quoted with
//! backslash escapes when they contain whitespace, quotes, `#`, backslashes or
//! newlines (PEM keys, for example).

use anyhow::Result;
use regex::Regex;
use std::collections::HashSet;
use std::path::PathBuf;

use super::{StorageBackend, public_values};
use crate::core::ValueMap;
use crate::schema::EnvSchema;
use crate::utils::fs::{read_or_empty, safe_write};

const LINE_PATTERN: &str = r"^(export\s+)?([A-Za-z_][A-Za-z0-9_]*)\s*=";

/// `.env` file backend
#[derive(Debug, Clone)]
pub struct DotEnvStorage {
    path: PathBuf,
}

impl DotEnvStorage {
    /// Backend for the file at `path`
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
        }
    }
}

impl StorageBackend for DotEnvStorage {
    fn load(&self) -> Result<ValueMap> {
        let content = read_or_empty(&self.path)?;
        Ok(parse_dotenv(&content))
    }

    fn store(&mut self, values: &ValueMap, schema: &EnvSchema) -> Result<()> {
        let public = public_values(values, schema);
        let existing = read_or_empty(&self.path)?;
        let updated = merge_dotenv(&existing, &public);
        safe_write(&self.path, &updated)?;
        tracing::info!("Wrote {} variables to {}", public.len(), self.path.display());
        Ok(())
    }

    fn describe(&self) -> String {
        format!("dotenv file {}", self.path.display())
    }
}

/// Merge `public` into existing dotenv text
fn merge_dotenv(existing: &str, public: &ValueMap) -> String {
    let Ok(line_regex) = Regex::new(LINE_PATTERN) else {
        return existing.to_string();
    };

    let mut output = String::with_capacity(existing.len());
    let mut handled: HashSet<&str> = HashSet::new();
    let mut lines = existing.split_inclusive('\n');

    while let Some(line) = lines.next() {
        let Some(caps) = line_regex.captures(line) else {
            output.push_str(line);
            continue;
        };
        let key = &caps[2];
        let Some((name, value)) = public.get_key_value(key) else {
            output.push_str(line);
            continue;
        };

        // Continuation lines of a multi-line quoted value are only dropped once
        // the closing quote is found; an unterminated value replaces one line
        let rest = line[caps.get(0).map_or(0, |m| m.end())..].trim_start();
        if let Some(body) = rest.strip_prefix('"') {
            if find_closing_quote(body).is_none() {
                let mut continuation = lines.clone();
                if continuation.any(|next| find_closing_quote(next).is_some()) {
                    lines = continuation;
                } else {
                    tracing::warn!("Unterminated quoted value for {key}, replacing its first line only");
                }
            }
        }

        let prefix = if caps.get(1).is_some() { "export " } else { "" };
        output.push_str(&format!("{prefix}{name}={}\n", format_value(value)));
        handled.insert(name.as_str());
    }

    for (name, value) in public {
        if handled.contains(name.as_str()) {
            continue;
        }
        if !output.is_empty() && !output.ends_with('\n') {
            output.push('\n');
        }
        output.push_str(&format!("{name}={}\n", format_value(value)));
    }

    output
}

/// Quote a value if it would not survive a round trip bare
fn format_value(value: &str) -> String {
    let needs_quotes = value.chars().any(|c| {
        c.is_whitespace() || matches!(c, '"' | '\'' | '#' | '\\' | '`' | '$')
    });
    if !needs_quotes {
        return value.to_string();
    }

    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        match c {
            '\\' => quoted.push_str("\\\\"),
            '"' => quoted.push_str("\\\""),
            '\n' => quoted.push_str("\\n"),
            '\r' => quoted.push_str("\\r"),
            '\t' => quoted.push_str("\\t"),
            other => quoted.push(other),
        }
    }
    quoted.push('"');
    quoted
}

/// Parse dotenv text; the last assignment of a key wins
fn parse_dotenv(content: &str) -> ValueMap {
    let mut values = ValueMap::new();
    let Ok(line_regex) = Regex::new(LINE_PATTERN) else {
        return values;
    };

    let mut lines = content.lines();
    while let Some(line) = lines.next() {
        let Some(caps) = line_regex.captures(line) else {
            continue;
        };
        let key = caps[2].to_string();
        let rest = line[caps.get(0).map_or(0, |m| m.end())..].trim_start();

        let value = if let Some(body) = rest.strip_prefix('"') {
            match find_closing_quote(body) {
                Some(end) => unescape(&body[..end]),
                None => {
                    let mut continuation = lines.clone();
                    let mut joined = body.to_string();
                    let mut closed = None;
                    for next in continuation.by_ref() {
                        joined.push('\n');
                        if let Some(end) = find_closing_quote(next) {
                            joined.push_str(&next[..end]);
                            closed = Some(joined);
                            break;
                        }
                        joined.push_str(next);
                    }
                    if let Some(joined) = closed {
                        lines = continuation;
                        unescape(&joined)
                    } else {
                        // The following lines are parsed as their own assignments
                        tracing::warn!("Unterminated quoted value for {key}");
                        unescape(body)
                    }
                }
            }
        } else if let Some(body) = rest.strip_prefix('\'') {
            match body.find('\'') {
                Some(end) => body[..end].to_string(),
                None => body.to_string(),
            }
        } else {
            strip_inline_comment(rest).trim_end().to_string()
        };

        values.insert(key, value);
    }

    values
}

/// Byte index of the first unescaped `"`
fn find_closing_quote(body: &str) -> Option<usize> {
    let mut escaped = false;
    for (idx, c) in body.char_indices() {
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == '"' {
            return Some(idx);
        }
    }
    None
}

fn unescape(body: &str) -> String {
    let mut result = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            result.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => result.push('\n'),
            Some('r') => result.push('\r'),
            Some('t') => result.push('\t'),
            Some('"') => result.push('"'),
            Some('\\') => result.push('\\'),
            Some(other) => {
                result.push('\\');
                result.push(other);
            }
            None => result.push('\\'),
        }
    }
    result
}

/// Bare values end at a `#` that starts the value or follows whitespace
fn strip_inline_comment(rest: &str) -> &str {
    if rest.starts_with('#') {
        return "";
    }
    let mut previous_whitespace = false;
    for (idx, c) in rest.char_indices() {
        if c == '#' && previous_whitespace {
            return &rest[..idx];
        }
        previous_whitespace = c.is_whitespace();
    }
    rest
}
