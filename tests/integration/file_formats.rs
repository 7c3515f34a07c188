use crate::common::{BASIC_SCHEMA, TestProject};

#[test]
fn test_json_target() {
    let project = TestProject::with_schema(BASIC_SCHEMA);
    project.write("config/app.json", "{\n  \"feature_flags\": {\"beta\": true},\n  \"DB_HOST\": \"json-host\"\n}\n");

    project.run(&["-s", "config/app.json"]).success();

    let value: serde_json::Value = serde_json::from_str(&project.read("config/app.json")).unwrap();
    assert_eq!(value["feature_flags"]["beta"], true);
    assert_eq!(value["DB_HOST"], "json-host");
    assert_eq!(value["DB_PORT"], "5432");
    assert_eq!(value["DATABASE_URL"], "postgres://app@json-host:5432/app");
    assert!(value.get("BUILD_SEED").is_none());
}

#[test]
fn test_toml_target_keeps_comments() {
    let project = TestProject::with_schema(BASIC_SCHEMA);
    project.write("settings.toml", "# managed partly by envgen\nname = \"web\"\n\n[server]\nworkers = 4\n");

    project.run(&["-s", "settings.toml", "-o", "DB_USER=toml"]).success();

    let text = project.read("settings.toml");
    assert!(text.starts_with("# managed partly by envgen\n"));
    let table: toml::Table = toml::from_str(&text).unwrap();
    assert_eq!(table["name"].as_str(), Some("web"));
    assert_eq!(table["server"]["workers"].as_integer(), Some(4));
    assert_eq!(table["DB_USER"].as_str(), Some("toml"));
    assert_eq!(table["DATABASE_URL"].as_str(), Some("postgres://toml@localhost:5432/app"));
}

#[test]
fn test_yaml_target() {
    let project = TestProject::with_schema(BASIC_SCHEMA);
    project.write("values.yml", "replicas: 3\nDB_PORT: 7000\n");

    project.run(&["-s", "values.yml"]).success();

    let value: serde_yaml::Value = serde_yaml::from_str(&project.read("values.yml")).unwrap();
    assert_eq!(value["replicas"].as_u64(), Some(3));
    // Loaded as an existing value, written back as a string
    assert_eq!(value["DB_PORT"].as_str(), Some("7000"));
    assert_eq!(value["DATABASE_URL"].as_str(), Some("postgres://app@localhost:7000/app"));
}

/// Existing records are replaced and stale ones dropped
#[test]
fn test_komodo_backend() {
    let project = TestProject::with_schema(BASIC_SCHEMA);
    project.write(
        "stack.toml",
        "[stack]\nname = \"db\"\n\n[[variable]]\nname = \"DB_HOST\"\nvalue = \"komodo-host\"\n\n[[variable]]\nname = \"STALE\"\nvalue = \"x\"\n",
    );

    project.run(&["-s", "stack.toml", "--backend", "komodo"]).success();

    let text = project.read("stack.toml");
    assert!(text.starts_with("[stack]\nname = \"db\"\n\n[[variable]]\nname = \"DB_HOST\"\nvalue = \"komodo-host\"\n"));
    assert!(!text.contains("STALE"));
    assert!(!text.contains("BUILD_SEED"));

    let table: toml::Table = toml::from_str(&text).unwrap();
    let records = table["variable"].as_array().unwrap();
    let names: Vec<_> = records.iter().map(|r| r["name"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["DB_HOST", "DB_PORT", "DATABASE_URL", "DB_USER"]);
}

/// `--backend` wins over the file suffix
#[test]
fn test_backend_flag_overrides_suffix() {
    let project = TestProject::with_schema(BASIC_SCHEMA);

    project.run(&["-s", "vars.txt", "-b", "dotenv"]).success();

    assert!(project.read("vars.txt").starts_with("DB_HOST=localhost\n"));
}
