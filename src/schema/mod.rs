//! Schema model for envgen YAML files
//!
//! A schema declares every variable envgen knows about, how its value is
//! generated, how the generated value is validated, and whether it is written
//! to storage at all.
//!
//! # Format
//!
//! ```yaml
//! variables:
//!   DB_HOST:
//!     description: Database host name
//!     generation:
//!       rule: default
//!       value: localhost
//!   DB_PORT:
//!     type: int
//!     generation: { rule: default, value: "5432" }
//!     validation:
//!       range: { min: 1, max: 65535 }
//!   DSN:
//!     generation:
//!       rule: template
//!       template: "postgres://{{ DB_HOST }}:{{ DB_PORT }}/app"
//!   SIGNING_KEY:
//!     generation:
//!       rule: openssl
//!       command: ec
//!       args: { curve: secp384r1 }
//!   SEED:
//!     internal: true
//!     generation: { rule: command, command: "date +%s" }
//! ```
//!
//! Declaration order is preserved ([`IndexMap`]) and is used as the
//! deterministic tie-break when ordering independent variables.

use crate::core::EnvgenError;
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;

/// Declared type of a variable, used by the validator to cast the generated string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariableType {
    /// Free-form string (the default)
    #[default]
    #[serde(alias = "string")]
    Str,
    /// Signed 64-bit integer
    Int,
    /// Finite 64-bit float
    Float,
    /// Boolean
    Bool,
}

impl VariableType {
    /// Name as written in the schema
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Str => "str",
            Self::Int => "int",
            Self::Float => "float",
            Self::Bool => "bool",
        }
    }
}

/// How a variable's value is produced
///
/// Every string field is a template: it is rendered against the values generated
/// so far before the rule runs, which is also how dependencies between variables
/// are declared.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum GenerationRule {
    /// Rendered value returned verbatim
    #[serde(rename = "default", alias = "literal")]
    Literal {
        /// Literal value (may contain references)
        #[serde(deserialize_with = "scalar_string")]
        value: String,
    },
    /// Standard output of a shell command, trimmed
    Command {
        /// Shell command line
        command: String,
    },
    /// Rendered template body
    Template {
        /// Template body
        template: String,
    },
    /// Cryptographic material from the named algorithm
    #[serde(rename = "openssl", alias = "crypto")]
    CryptoMaterial {
        /// Algorithm name, such as `rsa` or `random`
        command: String,
        /// Algorithm specific arguments
        #[serde(default)]
        args: IndexMap<String, serde_yaml::Value>,
    },
}

impl GenerationRule {
    /// Schema name of the rule kind
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Literal {
                ..
            } => "default",
            Self::Command {
                ..
            } => "command",
            Self::Template {
                ..
            } => "template",
            Self::CryptoMaterial {
                ..
            } => "openssl",
        }
    }

    /// Every field of the rule that is rendered as a template
    ///
    /// For crypto rules this is the algorithm name plus each string-valued
    /// argument; numeric and boolean arguments are never rendered.
    #[must_use]
    pub fn template_fields(&self) -> Vec<&str> {
        match self {
            Self::Literal {
                value,
            } => vec![value.as_str()],
            Self::Command {
                command,
            } => vec![command.as_str()],
            Self::Template {
                template,
            } => vec![template.as_str()],
            Self::CryptoMaterial {
                command,
                args,
            } => std::iter::once(command.as_str())
                .chain(args.values().filter_map(serde_yaml::Value::as_str))
                .collect(),
        }
    }
}

/// Accepts any YAML scalar and keeps its textual form
fn scalar_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match serde_yaml::Value::deserialize(deserializer)? {
        serde_yaml::Value::String(s) => Ok(s),
        serde_yaml::Value::Number(n) => Ok(n.to_string()),
        serde_yaml::Value::Bool(b) => Ok(b.to_string()),
        other => Err(D::Error::custom(format!("expected a scalar value, found {other:?}"))),
    }
}

/// String length bounds, inclusive, counted in characters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LengthValidation {
    /// Minimum length
    pub min: Option<usize>,
    /// Maximum length
    pub max: Option<usize>,
}

/// Numeric bounds for `int` and `float` variables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeValidation {
    /// Lower bound
    pub min: Option<f64>,
    /// Upper bound
    pub max: Option<f64>,
    /// Whether `min` itself is allowed
    #[serde(default = "default_true")]
    pub min_inclusive: bool,
    /// Whether `max` itself is allowed
    #[serde(default = "default_true")]
    pub max_inclusive: bool,
}

const fn default_true() -> bool {
    true
}

/// Closed set of allowed values
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OneOfValidation {
    /// Allowed values, compared against the canonical string form
    pub choices: Vec<String>,
}

/// Regular expression the value must match from its first character
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegexpValidation {
    /// Pattern in `regex` crate syntax
    pub pattern: String,
}

/// All constraints attached to one variable; every field is optional
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationRules {
    /// Length bounds (`str` only)
    pub length: Option<LengthValidation>,
    /// Numeric range (`int`/`float` only)
    pub range: Option<RangeValidation>,
    /// Allowed values
    pub one_of: Option<OneOfValidation>,
    /// Required pattern
    pub regexp: Option<RegexpValidation>,
}

/// Full definition of one variable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableSchema {
    /// Declared type
    #[serde(rename = "type", default)]
    pub var_type: VariableType,
    /// Generation rule
    pub generation: GenerationRule,
    /// Validation constraints
    #[serde(default)]
    pub validation: ValidationRules,
    /// Internal variables are available to templates but never stored
    #[serde(default)]
    pub internal: bool,
    /// Free-form description
    #[serde(default)]
    pub description: String,
}

impl VariableSchema {
    /// Create a public `str` variable with the given rule
    #[must_use]
    pub fn new(generation: GenerationRule) -> Self {
        Self {
            var_type: VariableType::Str,
            generation,
            validation: ValidationRules::default(),
            internal: false,
            description: String::new(),
        }
    }
}

/// Root of a schema file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnvSchema {
    /// Variables in declaration order
    pub variables: IndexMap<String, VariableSchema>,
}

impl EnvSchema {
    /// Load and check a schema file
    ///
    /// # Errors
    ///
    /// Returns [`EnvgenError::SchemaNotFound`] when the file is missing and
    /// [`EnvgenError::SchemaError`] for unreadable, malformed or inconsistent
    /// schemas.
    pub fn load(path: &Path) -> Result<Self, EnvgenError> {
        if !path.exists() {
            return Err(EnvgenError::SchemaNotFound {
                path: path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| EnvgenError::SchemaError {
            reason: format!("cannot read {}: {e}", path.display()),
        })?;

        let schema = Self::from_yaml_str(&content)?;
        tracing::debug!("Loaded schema {} with {} variables", path.display(), schema.len());
        Ok(schema)
    }

    /// Parse and check a schema from YAML text
    ///
    /// # Errors
    ///
    /// Returns [`EnvgenError::SchemaError`] on YAML errors, unknown rule kinds,
    /// missing fields or constraints that do not fit the declared type.
    pub fn from_yaml_str(content: &str) -> Result<Self, EnvgenError> {
        let schema: Self = serde_yaml::from_str(content).map_err(|e| EnvgenError::SchemaError {
            reason: e.to_string(),
        })?;
        schema.check()?;
        Ok(schema)
    }

    /// Check constraints against declared types
    ///
    /// `range` is only meaningful for numbers and `length` only for strings;
    /// regex patterns must compile.
    ///
    /// # Errors
    ///
    /// Returns [`EnvgenError::SchemaError`] naming the first offending variable.
    pub fn check(&self) -> Result<(), EnvgenError> {
        for (name, var) in &self.variables {
            let validation = &var.validation;
            if validation.range.is_some()
                && !matches!(var.var_type, VariableType::Int | VariableType::Float)
            {
                return Err(EnvgenError::SchemaError {
                    reason: format!(
                        "Variable '{name}': 'range' validation is only valid for int/float types, got '{}'",
                        var.var_type.as_str()
                    ),
                });
            }
            if validation.length.is_some() && var.var_type != VariableType::Str {
                return Err(EnvgenError::SchemaError {
                    reason: format!(
                        "Variable '{name}': 'length' validation is only valid for str type, got '{}'",
                        var.var_type.as_str()
                    ),
                });
            }
            if let Some(regexp) = &validation.regexp {
                regex::Regex::new(&regexp.pattern).map_err(|e| EnvgenError::SchemaError {
                    reason: format!("Variable '{name}': invalid regexp '{}': {e}", regexp.pattern),
                })?;
            }
        }
        Ok(())
    }

    /// Look up a variable by name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&VariableSchema> {
        self.variables.get(name)
    }

    /// Whether `name` is declared and not internal
    #[must_use]
    pub fn is_public(&self, name: &str) -> bool {
        self.variables.get(name).is_some_and(|v| !v.internal)
    }

    /// Number of declared variables
    #[must_use]
    pub fn len(&self) -> usize {
        self.variables.len()
    }

    /// Whether no variables are declared
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_all_rule_kinds() {
        let schema = EnvSchema::from_yaml_str(
            r#"
variables:
  HOST:
    generation: { rule: default, value: localhost }
  NOW:
    generation: { rule: command, command: "date +%s" }
  URL:
    generation: { rule: template, template: "http://{{ HOST }}" }
  KEY:
    internal: true
    description: signing key
    generation:
      rule: openssl
      command: rsa
      args: { key_size: 1024, encoding: der_b64 }
"#,
        )
        .unwrap();

        let names: Vec<_> = schema.variables.keys().cloned().collect();
        assert_eq!(names, vec!["HOST", "NOW", "URL", "KEY"]);
        assert_eq!(
            schema.get("HOST").unwrap().generation,
            GenerationRule::Literal {
                value: "localhost".to_string()
            }
        );
        assert_eq!(schema.get("NOW").unwrap().generation.kind(), "command");
        assert_eq!(schema.get("URL").unwrap().var_type, VariableType::Str);

        let key = schema.get("KEY").unwrap();
        assert!(key.internal);
        assert_eq!(key.description, "signing key");
        match &key.generation {
            GenerationRule::CryptoMaterial {
                command,
                args,
            } => {
                assert_eq!(command, "rsa");
                assert_eq!(args.get("key_size").and_then(serde_yaml::Value::as_u64), Some(1024));
            }
            other => panic!("unexpected rule {other:?}"),
        }
        assert!(!schema.is_public("KEY"));
        assert!(schema.is_public("HOST"));
        assert!(!schema.is_public("UNKNOWN"));
    }

    #[test]
    fn test_literal_accepts_numeric_scalars() {
        let schema = EnvSchema::from_yaml_str(
            "variables:\n  PORT:\n    type: int\n    generation: { rule: default, value: 5432 }\n",
        )
        .unwrap();
        assert_eq!(
            schema.get("PORT").unwrap().generation,
            GenerationRule::Literal {
                value: "5432".to_string()
            }
        );
    }

    #[test]
    fn test_string_type_alias() {
        let schema = EnvSchema::from_yaml_str(
            "variables:\n  A:\n    type: string\n    generation: { rule: default, value: x }\n",
        )
        .unwrap();
        assert_eq!(schema.get("A").unwrap().var_type, VariableType::Str);
    }

    #[test]
    fn test_unknown_rule_is_schema_error() {
        let result = EnvSchema::from_yaml_str(
            "variables:\n  A:\n    generation: { rule: magic, value: x }\n",
        );
        match result {
            Err(EnvgenError::SchemaError {
                reason,
            }) => assert!(reason.contains("magic"), "reason: {reason}"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_missing_generation_is_schema_error() {
        let result = EnvSchema::from_yaml_str("variables:\n  A:\n    type: str\n");
        assert!(matches!(result, Err(EnvgenError::SchemaError { .. })));
    }

    #[test]
    fn test_range_requires_numeric_type() {
        let result = EnvSchema::from_yaml_str(
            "variables:\n  A:\n    generation: { rule: default, value: x }\n    validation: { range: { min: 1 } }\n",
        );
        match result {
            Err(EnvgenError::SchemaError {
                reason,
            }) => assert!(reason.contains("'range' validation is only valid for int/float")),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_length_requires_str_type() {
        let result = EnvSchema::from_yaml_str(
            "variables:\n  A:\n    type: int\n    generation: { rule: default, value: '1' }\n    validation: { length: { max: 3 } }\n",
        );
        match result {
            Err(EnvgenError::SchemaError {
                reason,
            }) => assert!(reason.contains("'length' validation is only valid for str")),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_invalid_regexp_rejected() {
        let result = EnvSchema::from_yaml_str(
            "variables:\n  A:\n    generation: { rule: default, value: x }\n    validation: { regexp: { pattern: '(' } }\n",
        );
        assert!(matches!(result, Err(EnvgenError::SchemaError { .. })));
    }

    #[test]
    fn test_range_defaults_inclusive() {
        let schema = EnvSchema::from_yaml_str(
            "variables:\n  A:\n    type: float\n    generation: { rule: default, value: '1.5' }\n    validation: { range: { min: 0, max: 2 } }\n",
        )
        .unwrap();
        let range = schema.get("A").unwrap().validation.range.clone().unwrap();
        assert!(range.min_inclusive && range.max_inclusive);
        assert_eq!(range.min, Some(0.0));
    }

    #[test]
    fn test_template_fields_skip_non_string_args() {
        let mut args = IndexMap::new();
        args.insert("curve".to_string(), serde_yaml::Value::String("{{ CURVE }}".to_string()));
        args.insert("key_size".to_string(), serde_yaml::Value::Number(2048.into()));
        let rule = GenerationRule::CryptoMaterial {
            command: "{{ ALG }}".to_string(),
            args,
        };
        assert_eq!(rule.template_fields(), vec!["{{ ALG }}", "{{ CURVE }}"]);
    }

    #[test]
    fn test_load_missing_file() {
        let result = EnvSchema::load(Path::new("/definitely/not/here.yaml"));
        assert!(matches!(result, Err(EnvgenError::SchemaNotFound { .. })));
    }
}
