//! Typed validation of generated values.
//!
//! Every declared variable must have a value. Each value is cast to its
//! declared type and then checked against the variable's constraints. All
//! problems are collected into a single [`EnvgenError::Validation`] so a run
//! reports everything wrong at once.
//!
//! # Casting
//!
//! - `str`: unchanged
//! - `int`: signed 64-bit decimal, surrounding whitespace allowed
//! - `float`: finite 64-bit float, surrounding whitespace allowed
//! - `bool`: `true t yes y on 1` / `false f no n off 0`, case-insensitive
//!
//! # Constraints
//!
//! - `length`: character count (strings only)
//! - `range`: numeric bounds, each inclusive unless configured otherwise
//! - `one_of`: the canonical string form must be one of the choices
//! - `regexp`: the pattern must match at the start of the canonical string

use indexmap::IndexMap;
use regex::Regex;
use std::fmt;

use crate::core::{EnvgenError, ValidationFailure, ValueMap};
use crate::schema::{EnvSchema, RangeValidation, ValidationRules, VariableType};

/// A value after casting to its declared type
#[derive(Debug, Clone, PartialEq)]
pub enum TypedValue {
    /// String value
    Str(String),
    /// Integer value
    Int(i64),
    /// Float value
    Float(f64),
    /// Boolean value
    Bool(bool),
}

impl TypedValue {
    fn as_f64(&self) -> Option<f64> {
        match self {
            #[allow(clippy::cast_precision_loss)]
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            Self::Str(_) | Self::Bool(_) => None,
        }
    }
}

/// Canonical string form, which is what gets stored
///
/// Floats always carry a decimal point so they cast back to floats.
impl fmt::Display for TypedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => f.write_str(s),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(v) => {
                let text = v.to_string();
                if text.contains('.') {
                    f.write_str(&text)
                } else {
                    write!(f, "{text}.0")
                }
            }
            Self::Bool(b) => write!(f, "{b}"),
        }
    }
}

/// Validated values in schema order
pub type TypedValueMap = IndexMap<String, TypedValue>;

/// Cast and check every schema variable
///
/// # Errors
///
/// Returns [`EnvgenError::Validation`] listing every missing value, failed cast
/// and violated constraint.
pub fn validate_env(schema: &EnvSchema, values: &ValueMap) -> Result<TypedValueMap, EnvgenError> {
    let mut typed = TypedValueMap::with_capacity(schema.len());
    let mut failures = Vec::new();

    for (name, var) in &schema.variables {
        let Some(raw) = values.get(name) else {
            failures.push(ValidationFailure::new(name, "Missing data for required field."));
            continue;
        };

        match cast(raw, var.var_type) {
            Ok(value) => {
                let before = failures.len();
                check_constraints(name, &value, &var.validation, &mut failures);
                if failures.len() == before {
                    typed.insert(name.clone(), value);
                }
            }
            Err(message) => failures.push(ValidationFailure::new(name, message)),
        }
    }

    if failures.is_empty() {
        tracing::debug!("Validated {} values", typed.len());
        Ok(typed)
    } else {
        Err(EnvgenError::Validation {
            failures,
        })
    }
}

/// Canonical string form of every validated value
#[must_use]
pub fn canonical_strings(values: &TypedValueMap) -> ValueMap {
    values.iter().map(|(name, value)| (name.clone(), value.to_string())).collect()
}

fn cast(raw: &str, var_type: VariableType) -> Result<TypedValue, String> {
    match var_type {
        VariableType::Str => Ok(TypedValue::Str(raw.to_string())),
        VariableType::Int => {
            raw.trim().parse::<i64>().map(TypedValue::Int).map_err(|_| "Not a valid integer.".to_string())
        }
        VariableType::Float => match raw.trim().parse::<f64>() {
            Ok(v) if v.is_finite() => Ok(TypedValue::Float(v)),
            Ok(_) => Err("Special numeric values (nan or infinity) are not permitted.".to_string()),
            Err(_) => Err("Not a valid number.".to_string()),
        },
        VariableType::Bool => match raw.trim().to_ascii_lowercase().as_str() {
            "true" | "t" | "yes" | "y" | "on" | "1" => Ok(TypedValue::Bool(true)),
            "false" | "f" | "no" | "n" | "off" | "0" => Ok(TypedValue::Bool(false)),
            _ => Err("Not a valid boolean.".to_string()),
        },
    }
}

fn check_constraints(
    name: &str,
    value: &TypedValue,
    rules: &ValidationRules,
    failures: &mut Vec<ValidationFailure>,
) {
    let canonical = value.to_string();

    if let (Some(length), TypedValue::Str(s)) = (&rules.length, value) {
        let count = s.chars().count();
        let too_short = length.min.is_some_and(|min| count < min);
        let too_long = length.max.is_some_and(|max| count > max);
        if too_short || too_long {
            let message = match (length.min, length.max) {
                (Some(min), Some(max)) if min == max => format!("Length must be {min}."),
                (Some(min), Some(max)) => format!("Length must be between {min} and {max}."),
                (Some(min), None) => format!("Shorter than minimum length {min}."),
                (None, Some(max)) => format!("Longer than maximum length {max}."),
                (None, None) => String::new(),
            };
            failures.push(ValidationFailure::new(name, message));
        }
    }

    if let (Some(range), Some(number)) = (&rules.range, value.as_f64()) {
        if let Some(message) = range_violation(range, number) {
            failures.push(ValidationFailure::new(name, message));
        }
    }

    if let Some(one_of) = &rules.one_of {
        if !one_of.choices.iter().any(|choice| *choice == canonical) {
            failures.push(ValidationFailure::new(
                name,
                format!("Must be one of: {}.", one_of.choices.join(", ")),
            ));
        }
    }

    if let Some(regexp) = &rules.regexp {
        // Patterns are checked at schema load; anchoring makes this a prefix match
        match Regex::new(&format!("^(?:{})", regexp.pattern)) {
            Ok(re) if re.is_match(&canonical) => {}
            Ok(_) => failures.push(ValidationFailure::new(
                name,
                format!("String does not match expected pattern '{}'.", regexp.pattern),
            )),
            Err(e) => failures.push(ValidationFailure::new(
                name,
                format!("Invalid pattern '{}': {e}", regexp.pattern),
            )),
        }
    }
}

fn range_violation(range: &RangeValidation, number: f64) -> Option<String> {
    let below = range.min.is_some_and(|min| {
        if range.min_inclusive { number < min } else { number <= min }
    });
    let above = range.max.is_some_and(|max| {
        if range.max_inclusive { number > max } else { number >= max }
    });
    if !below && !above {
        return None;
    }

    let lower = range.min.map(|min| {
        format!("greater than {}{min}", if range.min_inclusive { "or equal to " } else { "" })
    });
    let upper = range.max.map(|max| {
        format!("less than {}{max}", if range.max_inclusive { "or equal to " } else { "" })
    });
    let bounds = match (lower, upper) {
        (Some(lower), Some(upper)) => format!("{lower} and {upper}"),
        (Some(bound), None) | (None, Some(bound)) => bound,
        (None, None) => String::new(),
    };
    Some(format!("Must be {bounds}."))
}
