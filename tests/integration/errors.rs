use predicates::prelude::*;

use crate::common::{BASIC_SCHEMA, TestProject};

#[test]
fn test_missing_schema() {
    let project = TestProject::new();

    project
        .run(&[])
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Schema file not found"))
        .stdout(predicate::str::is_empty());
}

#[test]
fn test_invalid_schema_rule() {
    let project = TestProject::with_schema(
        "variables:\n  A:\n    generation: { rule: magic, value: x }\n",
    );

    project.run(&[]).failure().code(1).stderr(predicate::str::contains("Invalid schema"));
}

#[test]
fn test_cycle_reported_and_nothing_written() {
    let project = TestProject::with_schema(
        r#"
variables:
  A:
    generation: { rule: template, template: "{{ B }}" }
  B:
    generation: { rule: template, template: "{{ A }}" }
"#,
    );
    project.write(".env", "KEEP=1\n");

    project
        .run(&["-s", ".env"])
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Circular dependency detected"))
        .stderr(predicate::str::contains("A → B → A"));

    assert_eq!(project.read(".env"), "KEEP=1\n");
}

#[test]
fn test_undefined_template_variable_suggests_names() {
    let project = TestProject::with_schema(
        r#"
variables:
  DB_HOST:
    generation: { rule: default, value: localhost }
  URL:
    generation: { rule: template, template: "http://{{ DB_HOTS }}" }
"#,
    );

    project
        .run(&[])
        .failure()
        .stderr(predicate::str::contains("Failed to generate 'URL'"))
        .stderr(predicate::str::contains("DB_HOST"));
}

#[test]
fn test_validation_failures_listed() {
    let project = TestProject::with_schema(BASIC_SCHEMA);

    project
        .run(&["-o", "DB_PORT=not-a-port"])
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Validation failed"))
        .stderr(predicate::str::contains("DB_PORT: Not a valid integer."))
        .stdout(predicate::str::is_empty());
}

#[test]
fn test_invalid_override_argument() {
    let project = TestProject::with_schema(BASIC_SCHEMA);

    project
        .run(&["--override", "NOEQUALS"])
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Invalid override 'NOEQUALS'"));
}

#[test]
fn test_unknown_storage_suffix() {
    let project = TestProject::with_schema(BASIC_SCHEMA);

    project
        .run(&["-s", "out.ini"])
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Cannot determine storage format for 'out.ini'"))
        .stderr(predicate::str::contains(".env, .json, .toml, .yaml, .yml"));
}

#[test]
fn test_unparseable_existing_storage() {
    let project = TestProject::with_schema(BASIC_SCHEMA);
    project.write("app.json", "{ not json");

    project
        .run(&["-s", "app.json"])
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Failed to parse existing storage"));
    assert_eq!(project.read("app.json"), "{ not json");
}

#[test]
fn test_unsupported_crypto_algorithm() {
    let project = TestProject::with_schema(
        "variables:\n  KEY:\n    generation: { rule: openssl, command: dsa }\n",
    );

    project
        .run(&[])
        .failure()
        .stderr(predicate::str::contains("Unsupported openssl command 'dsa'"))
        .stderr(predicate::str::contains("rsa"));
}

#[cfg(unix)]
#[test]
fn test_failing_command() {
    let project = TestProject::with_schema(
        "variables:\n  OUT:\n    generation: { rule: command, command: \"echo oops >&2; exit 3\" }\n",
    );

    project
        .run(&[])
        .failure()
        .code(1)
        .stderr(predicate::str::contains("failed with exit code 3: oops"));
}
