use predicates::prelude::*;

use crate::common::{BASIC_SCHEMA, TestProject};

/// Values are printed in declaration order, internal ones omitted
#[test]
fn test_prints_public_values() {
    let project = TestProject::with_schema(BASIC_SCHEMA);

    project.run(&[]).success().stdout(
        "DB_HOST=localhost\nDB_PORT=5432\nDATABASE_URL=postgres://app@localhost:5432/app\nDB_USER=app\n",
    );
}

#[test]
fn test_explicit_stdout_target_and_overrides() {
    let project = TestProject::with_schema(BASIC_SCHEMA);

    project
        .run(&["--storage", "stdout", "-o", "DB_HOST=db.internal", "-o", "DB_PORT=6543"])
        .success()
        .stdout(predicate::str::contains("DB_HOST=db.internal\n"))
        .stdout(predicate::str::contains("DATABASE_URL=postgres://app@db.internal:6543/app\n"))
        .stdout(predicate::str::contains("BUILD_SEED").not());
}

/// Logging never leaks onto stdout
#[test]
fn test_verbose_logs_go_to_stderr() {
    let project = TestProject::with_schema(BASIC_SCHEMA);

    project
        .run(&["--verbose"])
        .success()
        .stdout(predicate::str::starts_with("DB_HOST=localhost\n"))
        .stdout(predicate::str::contains("DEBUG").not());
}

#[cfg(unix)]
#[test]
fn test_command_and_crypto_rules() {
    let project = TestProject::with_schema(
        r#"
variables:
  GREETING:
    generation: { rule: command, command: "echo '  hello  '" }
  SHOUT:
    generation: { rule: command, command: "echo {{ GREETING }} | tr a-z A-Z" }
  API_TOKEN:
    generation: { rule: openssl, command: random, args: { length: 16, encoding: hex } }
    validation: { length: { min: 32, max: 32 }, regexp: { pattern: "[0-9a-f]+$" } }
"#,
    );

    project
        .run(&[])
        .success()
        .stdout(predicate::str::starts_with("GREETING=hello\nSHOUT=HELLO\nAPI_TOKEN="))
        .stdout(predicate::str::is_match(r"API_TOKEN=[0-9a-f]{32}\n$").unwrap());
}
