//! Shared helpers for the envgen integration tests
//!
//! Each [`TestProject`] owns a temporary directory that the binary runs in, so
//! relative storage paths resolve inside it and tests never see each other's
//! files.

// Not every helper is used by every test module
#![allow(dead_code)]

use assert_cmd::Command;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Schema covering literals, templates, integers and an internal variable
pub const BASIC_SCHEMA: &str = r#"
variables:
  DB_HOST:
    description: Database host name
    generation: { rule: default, value: localhost }
  DB_PORT:
    type: int
    generation: { rule: default, value: "5432" }
    validation: { range: { min: 1, max: 65535 } }
  DATABASE_URL:
    generation:
      rule: template
      template: "postgres://{{ DB_USER }}@{{ DB_HOST }}:{{ DB_PORT }}/app"
  DB_USER:
    generation: { rule: default, value: app }
  BUILD_SEED:
    internal: true
    generation: { rule: default, value: "1234" }
"#;

/// A temporary working directory with a schema in it
pub struct TestProject {
    dir: TempDir,
}

impl TestProject {
    pub fn new() -> Self {
        envgen_cli::test_utils::init_test_logging(None);
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    /// Project with `schema.yaml` already written
    pub fn with_schema(schema: &str) -> Self {
        let project = Self::new();
        project.write("schema.yaml", schema);
        project
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn file(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    pub fn write(&self, name: &str, content: &str) {
        let path = self.file(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    pub fn read(&self, name: &str) -> String {
        fs::read_to_string(self.file(name)).unwrap()
    }

    /// `envgen` invocation running inside the project directory
    pub fn envgen(&self) -> Command {
        let mut cmd = Command::cargo_bin("envgen").unwrap();
        cmd.current_dir(self.path()).env_remove("RUST_LOG").env("NO_COLOR", "1");
        cmd
    }

    /// `envgen schema.yaml <args>`
    pub fn run(&self, args: &[&str]) -> assert_cmd::assert::Assert {
        self.envgen().arg("schema.yaml").args(args).assert()
    }
}
