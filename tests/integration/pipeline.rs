//! Library-level runs with a scripted command runner

use std::cell::RefCell;
use std::collections::HashMap;

use envgen_cli::core::{EnvgenError, ValueMap};
use envgen_cli::generation::{BuiltinMaterialProvider, CommandOutput, CommandRunner, Generator};
use envgen_cli::resolver;
use envgen_cli::storage::{BackendKind, resolve_storage};
use envgen_cli::test_utils::schema_from_yaml;
use envgen_cli::validation::{TypedValue, canonical_strings, validate_env};
use tempfile::TempDir;

/// Answers commands from a table and records every call
#[derive(Default)]
struct ScriptedRunner {
    responses: HashMap<String, String>,
    calls: RefCell<Vec<String>>,
}

impl ScriptedRunner {
    fn respond(mut self, command: &str, stdout: &str) -> Self {
        self.responses.insert(command.to_string(), stdout.to_string());
        self
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(&self, command: &str) -> Result<CommandOutput, EnvgenError> {
        self.calls.borrow_mut().push(command.to_string());
        match self.responses.get(command) {
            Some(stdout) => Ok(CommandOutput {
                stdout: stdout.clone(),
                stderr: String::new(),
            }),
            None => Err(EnvgenError::CommandExecution {
                command: command.to_string(),
                code: Some(127),
                stderr: "not scripted".to_string(),
            }),
        }
    }
}

const SCHEMA: &str = r#"
variables:
  REGION:
    generation: { rule: command, command: "cloud region" }
  BUCKET:
    generation: { rule: command, command: "cloud bucket --region {{ REGION }}" }
  WORKERS:
    type: int
    generation: { rule: default, value: 4 }
    validation: { range: { min: 1, max: 64 } }
  DEBUG:
    type: bool
    generation: { rule: default, value: "Yes" }
  STORAGE_URL:
    generation: { rule: template, template: "s3://{{ BUCKET }}/{{ REGION | upper }}" }
"#;

#[test]
fn test_commands_see_rendered_references() {
    let schema = schema_from_yaml(SCHEMA);
    let runner = ScriptedRunner::default()
        .respond("cloud region", "eu-west-1\n")
        .respond("cloud bucket --region eu-west-1", "  assets-eu  \n");
    let provider = BuiltinMaterialProvider;

    let values = Generator::new(&runner, &provider).generate(&schema, &ValueMap::new()).unwrap();

    assert_eq!(values["BUCKET"], "assets-eu");
    assert_eq!(values["STORAGE_URL"], "s3://assets-eu/EU-WEST-1");
    assert_eq!(*runner.calls.borrow(), vec!["cloud region", "cloud bucket --region eu-west-1"]);

    let typed = validate_env(&schema, &values).unwrap();
    assert_eq!(typed["WORKERS"], TypedValue::Int(4));
    assert_eq!(typed["DEBUG"], TypedValue::Bool(true));
    assert_eq!(canonical_strings(&typed)["DEBUG"], "true");
}

/// An overridden command variable is never executed
#[test]
fn test_override_skips_command() {
    let schema = schema_from_yaml(SCHEMA);
    let runner = ScriptedRunner::default().respond("cloud bucket --region us-east-2", "assets-us");
    let provider = BuiltinMaterialProvider;

    let mut overrides = ValueMap::new();
    overrides.insert("REGION".to_string(), "us-east-2".to_string());
    let values = Generator::new(&runner, &provider).generate(&schema, &overrides).unwrap();

    assert_eq!(values["REGION"], "us-east-2");
    assert_eq!(values["STORAGE_URL"], "s3://assets-us/US-EAST-2");
    assert_eq!(*runner.calls.borrow(), vec!["cloud bucket --region us-east-2"]);
}

#[test]
fn test_failing_command_names_variable() {
    let schema = schema_from_yaml(SCHEMA);
    let runner = ScriptedRunner::default();
    let provider = BuiltinMaterialProvider;

    let err = Generator::new(&runner, &provider).generate(&schema, &ValueMap::new()).unwrap_err();
    match err {
        EnvgenError::Generation {
            variable,
            source,
        } => {
            assert_eq!(variable, "REGION");
            assert!(matches!(*source, EnvgenError::CommandExecution { code: Some(127), .. }));
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_order_follows_references_then_declaration() {
    let schema = schema_from_yaml(SCHEMA);
    assert_eq!(
        resolver::order(&schema).unwrap(),
        vec!["REGION", "BUCKET", "WORKERS", "DEBUG", "STORAGE_URL"]
    );
}

/// Generated values flow through validation into a Komodo file
#[test]
fn test_generate_validate_store() {
    let temp = TempDir::new().unwrap();
    let target = temp.path().join("stack.toml");
    std::fs::write(&target, "[stack]\nserver = \"edge\"\n").unwrap();

    let schema = schema_from_yaml(SCHEMA);
    let runner = ScriptedRunner::default()
        .respond("cloud region", "ap-south-1")
        .respond("cloud bucket --region ap-south-1", "assets-ap");
    let provider = BuiltinMaterialProvider;

    let values = Generator::new(&runner, &provider).generate(&schema, &ValueMap::new()).unwrap();
    let values = canonical_strings(&validate_env(&schema, &values).unwrap());

    let mut storage =
        resolve_storage(target.to_str().unwrap(), Some(BackendKind::Komodo)).unwrap();
    storage.store(&values, &schema).unwrap();

    let loaded = storage.load().unwrap();
    assert_eq!(loaded, values);
    assert!(std::fs::read_to_string(&target).unwrap().starts_with("[stack]\nserver = \"edge\"\n\n"));
}
