//! Integration tests for CLI commands

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

/// Helper to run hvm inside a project directory
fn hvm(dir: &Path, args: &[&str]) -> Output {
    hvm_with_env(dir, args, &[])
}

fn hvm_with_env(dir: &Path, args: &[&str], vars: &[(&str, &str)]) -> Output {
    let mut command = Command::new(env!("CARGO_BIN_EXE_hvm"));
    command
        .args(args)
        .current_dir(dir)
        .env_remove("HVM_SCHEMA")
        .env_remove("HVM_VALUES_DIR")
        .env_remove("HELM_DEBUG")
        .env_remove("RUST_LOG")
        .env_remove("DB_PW");
    for (name, value) in vars {
        command.env(name, value);
    }
    command.output().expect("Failed to execute hvm")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

fn write_schema(dir: &Path, values: serde_json::Value) {
    let schema = serde_json::json!({"version": "1.0", "values": values});
    fs::write(dir.join("schema.json"), schema.to_string()).unwrap();
}

fn write_values(dir: &Path, env: &str, values: serde_json::Value) {
    let mut document = serde_json::Map::new();
    document.insert(env.to_string(), values);
    let content = serde_json::Value::Object(document).to_string();
    fs::write(dir.join(format!("values-{}.json", env)), content).unwrap();
}

fn read_json(path: &Path) -> serde_json::Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

mod init_command {
    use super::*;

    #[test]
    fn test_init_creates_empty_schema() {
        let dir = tempfile::tempdir().unwrap();
        let output = hvm(dir.path(), &["init"]);

        assert!(output.status.success(), "stderr: {}", stderr(&output));
        let schema = read_json(&dir.path().join("schema.json"));
        assert_eq!(schema["version"], "1.0");
        assert_eq!(schema["values"], serde_json::json!([]));
    }

    #[test]
    fn test_init_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        write_schema(
            dir.path(),
            serde_json::json!([{"key": "a", "path": "a", "description": "", "type": "string"}]),
        );

        let output = hvm(dir.path(), &["init"]);
        assert_eq!(output.status.code(), Some(1));
        assert!(stderr(&output).contains("already exists"));

        let output = hvm(dir.path(), &["init", "--force"]);
        assert!(output.status.success());
        let schema = read_json(&dir.path().join("schema.json"));
        assert_eq!(schema["values"], serde_json::json!([]));
    }
}

mod schema_command {
    use super::*;

    #[test]
    fn test_add_list_get() {
        let dir = tempfile::tempdir().unwrap();
        hvm(dir.path(), &["init"]);

        let output = hvm(
            dir.path(),
            &[
                "schema", "add", "--key", "replicas", "--path", "app.replicas",
                "--description", "Replica count", "--type", "number", "--default", "1",
            ],
        );
        assert!(output.status.success(), "stderr: {}", stderr(&output));

        let schema = read_json(&dir.path().join("schema.json"));
        assert_eq!(schema["values"][0]["key"], "replicas");
        assert_eq!(schema["values"][0]["type"], "number");
        assert_eq!(schema["values"][0]["required"], true);
        assert_eq!(schema["values"][0]["default"], 1);

        let output = hvm(dir.path(), &["schema", "list"]);
        assert!(stdout(&output).contains("replicas"));
        assert!(stdout(&output).contains("app.replicas"));

        let output = hvm(dir.path(), &["schema", "get", "replicas"]);
        assert!(output.status.success());
        assert!(stdout(&output).contains("Type: number"));
    }

    #[test]
    fn test_add_rejects_duplicates_and_bad_paths() {
        let dir = tempfile::tempdir().unwrap();
        hvm(dir.path(), &["init"]);
        hvm(dir.path(), &["schema", "add", "--key", "tag", "--path", "image.tag", "--type", "string"]);

        let output = hvm(dir.path(), &["schema", "add", "--key", "tag", "--path", "other", "--type", "string"]);
        assert!(!output.status.success());
        assert!(stderr(&output).contains("already exists"));

        let output = hvm(dir.path(), &["schema", "add", "--key", "x", "--path", "a..b", "--type", "string"]);
        assert!(!output.status.success());
        assert!(stderr(&output).contains("Invalid path format"));
    }

    #[test]
    fn test_add_rejects_unknown_type() {
        let dir = tempfile::tempdir().unwrap();
        hvm(dir.path(), &["init"]);

        let output = hvm(dir.path(), &["schema", "add", "--key", "x", "--path", "x", "--type", "integer"]);
        assert_eq!(output.status.code(), Some(64));
    }

    #[test]
    fn test_update_and_remove() {
        let dir = tempfile::tempdir().unwrap();
        hvm(dir.path(), &["init"]);
        hvm(dir.path(), &["schema", "add", "--key", "port", "--path", "app.port", "--type", "number"]);

        let output = hvm(
            dir.path(),
            &["schema", "update", "port", "--required", "false", "--default", "8080"],
        );
        assert!(output.status.success(), "stderr: {}", stderr(&output));
        let schema = read_json(&dir.path().join("schema.json"));
        assert_eq!(schema["values"][0]["required"], false);
        assert_eq!(schema["values"][0]["default"], 8080);

        let output = hvm(dir.path(), &["schema", "remove", "port"]);
        assert!(output.status.success());
        let schema = read_json(&dir.path().join("schema.json"));
        assert_eq!(schema["values"], serde_json::json!([]));

        let output = hvm(dir.path(), &["schema", "remove", "port"]);
        assert!(!output.status.success());
        assert!(stderr(&output).contains("not found"));
    }

    #[test]
    fn test_missing_schema_suggests_init() {
        let dir = tempfile::tempdir().unwrap();
        let output = hvm(dir.path(), &["schema", "list"]);
        assert_eq!(output.status.code(), Some(1));
        assert!(stderr(&output).contains("hvm init"));
    }
}

mod values_command {
    use super::*;

    fn project() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        write_schema(
            dir.path(),
            serde_json::json!([
                {"key": "replicas", "path": "app.replicas", "description": "", "type": "number"},
                {"key": "debug", "path": "app.debug", "description": "", "type": "boolean", "required": false},
                {"key": "hosts", "path": "ingress.hosts", "description": "", "type": "array", "required": false},
                {"key": "db-password", "path": "db.password", "description": "", "type": "string", "sensitive": true}
            ]),
        );
        dir
    }

    #[test]
    fn test_set_parses_by_type() {
        let dir = project();
        assert!(hvm(dir.path(), &["values", "set", "replicas", "3", "--env", "dev"]).status.success());
        assert!(hvm(dir.path(), &["values", "set", "debug", "yes", "--env", "dev"]).status.success());
        assert!(hvm(dir.path(), &["values", "set", "hosts", "a.example.com,b.example.com", "--env", "dev"]).status.success());

        let document = read_json(&dir.path().join("values-dev.json"));
        assert_eq!(
            document,
            serde_json::json!({"dev": {
                "replicas": 3,
                "debug": true,
                "hosts": ["a.example.com", "b.example.com"]
            }})
        );
    }

    #[test]
    fn test_set_rejects_bad_input() {
        let dir = project();

        let output = hvm(dir.path(), &["values", "set", "replicas", "three", "--env", "dev"]);
        assert!(!output.status.success());
        assert!(stderr(&output).contains("Invalid number: three"));

        let output = hvm(dir.path(), &["values", "set", "unknown", "1", "--env", "dev"]);
        assert!(stderr(&output).contains("not found in schema"));

        let output = hvm(dir.path(), &["values", "set", "db-password", "hunter2", "--env", "dev"]);
        assert!(!output.status.success());
        assert!(stderr(&output).contains("sensitive"));
        assert!(!dir.path().join("values-dev.json").exists());
    }

    #[test]
    fn test_set_requires_force_to_overwrite() {
        let dir = project();
        hvm(dir.path(), &["values", "set", "replicas", "1", "--env", "dev"]);

        let output = hvm(dir.path(), &["values", "set", "replicas", "2", "--env", "dev"]);
        assert!(!output.status.success());
        assert!(stderr(&output).contains("already set"));

        let output = hvm(dir.path(), &["values", "set", "replicas", "2", "--env", "dev", "--force"]);
        assert!(output.status.success());
        let document = read_json(&dir.path().join("values-dev.json"));
        assert_eq!(document["dev"]["replicas"], 2);
    }

    #[test]
    fn test_secret_is_masked() {
        let dir = project();
        let output = hvm(
            dir.path(),
            &["values", "set-secret", "db-password", "--env", "prod", "--name", "DB_PW"],
        );
        assert!(output.status.success(), "stderr: {}", stderr(&output));
        assert!(stdout(&output).contains("is not set"));

        let document = read_json(&dir.path().join("values-prod.json"));
        assert_eq!(
            document["prod"]["db-password"],
            serde_json::json!({"type": "env", "name": "DB_PW"})
        );

        let output = hvm(dir.path(), &["values", "get", "db-password", "--env", "prod"]);
        assert_eq!(stdout(&output).trim(), "db-password: [SECRET - DB_PW]");

        let output = hvm(dir.path(), &["values", "list", "--env", "prod"]);
        assert!(stdout(&output).contains("[SECRET - DB_PW]"));
    }

    #[test]
    fn test_remove() {
        let dir = project();
        hvm(dir.path(), &["values", "set", "replicas", "1", "--env", "dev"]);

        let output = hvm(dir.path(), &["values", "remove", "replicas", "--env", "dev"]);
        assert!(output.status.success());
        assert_eq!(read_json(&dir.path().join("values-dev.json")), serde_json::json!({"dev": {}}));

        let output = hvm(dir.path(), &["values", "get", "replicas", "--env", "dev"]);
        assert!(!output.status.success());
        assert!(stderr(&output).contains("not set for environment 'dev'"));
    }

    #[test]
    fn test_values_dir_option() {
        let dir = project();
        let output = hvm(
            dir.path(),
            &["values", "set", "replicas", "2", "--env", "dev", "--values-dir", "envs"],
        );
        assert!(output.status.success(), "stderr: {}", stderr(&output));
        assert!(dir.path().join("envs/values-dev.json").exists());
    }
}

mod validate_command {
    use super::*;

    #[test]
    fn test_missing_required_value() {
        let dir = tempfile::tempdir().unwrap();
        write_schema(
            dir.path(),
            serde_json::json!([{"key": "replicas", "path": "app.replicas", "description": "", "type": "number", "required": true}]),
        );
        write_values(dir.path(), "dev", serde_json::json!({}));

        let output = hvm(dir.path(), &["validate", "--env", "dev"]);
        assert_eq!(output.status.code(), Some(1));
        let out = stdout(&output);
        assert!(out.contains("[dev] Values: Missing required value: replicas"));
        assert_eq!(out.matches("Missing required value").count(), 1);
    }

    #[test]
    fn test_optional_value_passes() {
        let dir = tempfile::tempdir().unwrap();
        write_schema(
            dir.path(),
            serde_json::json!([{"key": "tag", "path": "app.image.tag", "description": "", "type": "string", "required": false}]),
        );
        write_values(dir.path(), "dev", serde_json::json!({}));

        let output = hvm(dir.path(), &["validate", "--env", "dev"]);
        assert!(output.status.success(), "stdout: {}", stdout(&output));
        assert!(stdout(&output).contains("Validation passed for environment: dev"));
    }

    #[test]
    fn test_json_output_type_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        write_schema(
            dir.path(),
            serde_json::json!([{"key": "port", "path": "app.port", "description": "", "type": "number"}]),
        );
        write_values(dir.path(), "dev", serde_json::json!({"port": "8080"}));

        let output = hvm(dir.path(), &["validate", "--json"]);
        assert_eq!(output.status.code(), Some(1));

        let json: serde_json::Value =
            serde_json::from_str(&stdout(&output)).expect("Output should be valid JSON");
        assert_eq!(json["valid"], false);
        assert_eq!(json["environments"], serde_json::json!(["dev"]));
        let errors = json["errors"].as_array().unwrap();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0]["message"], "Type mismatch for port: expected number");
        assert_eq!(errors[0]["context"], "Values");
        assert_eq!(errors[0]["env"], "dev");
    }

    #[test]
    fn test_unset_secret_is_only_a_warning() {
        let dir = tempfile::tempdir().unwrap();
        write_schema(
            dir.path(),
            serde_json::json!([{"key": "db", "path": "db.password", "description": "", "type": "string", "required": true, "sensitive": true}]),
        );
        write_values(dir.path(), "dev", serde_json::json!({"db": {"type": "env", "name": "DB_PW"}}));

        let output = hvm(dir.path(), &["validate", "--env", "dev", "--json"]);
        assert!(output.status.success());
        let json: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
        assert_eq!(json["errors"], serde_json::json!([]));
        assert_eq!(json["warnings"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_secret_warning_shown_once() {
        let dir = tempfile::tempdir().unwrap();
        write_schema(
            dir.path(),
            serde_json::json!([{"key": "db", "path": "db.password", "description": "", "type": "string", "required": true, "sensitive": true}]),
        );
        write_values(dir.path(), "dev", serde_json::json!({"db": {"type": "env", "name": "DB_PW"}}));

        let output = hvm(dir.path(), &["validate", "--env", "dev"]);
        assert!(output.status.success(), "stderr: {}", stderr(&output));
        let combined = format!("{}{}", stdout(&output), stderr(&output));
        assert_eq!(combined.matches("Environment variable not found").count(), 1);
    }

    #[test]
    fn test_debug_log_is_plain_when_piped() {
        let dir = tempfile::tempdir().unwrap();
        write_schema(dir.path(), serde_json::json!([]));

        let output = hvm(dir.path(), &["validate", "--debug"]);
        assert!(output.status.success(), "stderr: {}", stderr(&output));
        assert!(stderr(&output).contains("DEBUG"));
        assert!(!stderr(&output).contains('\u{1b}'));
    }

    #[test]
    fn test_invalid_schema_is_single_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("schema.json"), "{ invalid json").unwrap();

        let output = hvm(dir.path(), &["validate", "--json"]);
        assert_eq!(output.status.code(), Some(1));
        let json: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
        let errors = json["errors"].as_array().unwrap();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0]["context"], "Schema");
    }

    #[test]
    fn test_flat_layout_from_settings() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(".hvm.yaml"), "layout: flat\nvaluesDir: envs\n").unwrap();
        write_schema(
            dir.path(),
            serde_json::json!([{"key": "replicas", "path": "app.replicas", "description": "", "type": "number"}]),
        );
        fs::create_dir(dir.path().join("envs")).unwrap();
        fs::write(dir.path().join("envs/values-dev.json"), r#"{"replicas": "two"}"#).unwrap();

        let output = hvm(dir.path(), &["validate"]);
        assert_eq!(output.status.code(), Some(1));
        assert!(stdout(&output).contains("Type mismatch for replicas: expected number"));
    }
}

mod generate_command {
    use super::*;

    #[test]
    fn test_generate_nested_yaml() {
        let dir = tempfile::tempdir().unwrap();
        write_schema(
            dir.path(),
            serde_json::json!([
                {"key": "replicas", "path": "app.replicas", "description": "", "type": "number"},
                {"key": "tag", "path": "app.image.tag", "description": "", "type": "string", "default": "latest"},
                {"key": "debug", "path": "debug", "description": "", "type": "boolean", "required": false}
            ]),
        );
        write_values(dir.path(), "dev", serde_json::json!({"replicas": 2}));

        let output = hvm(dir.path(), &["generate", "--env", "dev"]);
        assert!(output.status.success(), "stderr: {}", stderr(&output));
        assert_eq!(stdout(&output), "app:\n  image:\n    tag: latest\n  replicas: 2\n");
    }

    #[test]
    fn test_generate_to_file() {
        let dir = tempfile::tempdir().unwrap();
        write_schema(
            dir.path(),
            serde_json::json!([{"key": "replicas", "path": "app.replicas", "description": "", "type": "number"}]),
        );
        write_values(dir.path(), "dev", serde_json::json!({"replicas": 1}));

        let output = hvm(dir.path(), &["generate", "--env", "dev", "--output", "out/values.yaml"]);
        assert!(output.status.success(), "stderr: {}", stderr(&output));
        assert_eq!(
            fs::read_to_string(dir.path().join("out/values.yaml")).unwrap(),
            "app:\n  replicas: 1\n"
        );
    }

    #[test]
    fn test_optional_path_omitted() {
        let dir = tempfile::tempdir().unwrap();
        write_schema(
            dir.path(),
            serde_json::json!([{"key": "tag", "path": "app.image.tag", "description": "", "type": "string", "required": false}]),
        );
        write_values(dir.path(), "dev", serde_json::json!({}));

        let output = hvm(dir.path(), &["generate", "--env", "dev"]);
        assert!(output.status.success());
        assert_eq!(stdout(&output), "{}\n");
    }

    #[test]
    fn test_missing_required_cites_path() {
        let dir = tempfile::tempdir().unwrap();
        write_schema(
            dir.path(),
            serde_json::json!([{"key": "replicas", "path": "app.replicas", "description": "", "type": "number", "required": true}]),
        );
        write_values(dir.path(), "dev", serde_json::json!({}));

        let output = hvm(dir.path(), &["generate", "--env", "dev", "--output", "values.yaml"]);
        assert_eq!(output.status.code(), Some(1));
        assert!(stderr(&output).contains("app.replicas"));
        assert!(!dir.path().join("values.yaml").exists());
    }

    #[test]
    fn test_secret_resolution() {
        let dir = tempfile::tempdir().unwrap();
        write_schema(
            dir.path(),
            serde_json::json!([{"key": "db", "path": "db.password", "description": "", "type": "string", "required": true, "sensitive": true}]),
        );
        write_values(dir.path(), "dev", serde_json::json!({"db": {"type": "env", "name": "DB_PW"}}));

        let output = hvm(dir.path(), &["generate", "--env", "dev"]);
        assert_eq!(output.status.code(), Some(1));
        assert!(stderr(&output).contains("DB_PW"));
        assert!(stdout(&output).is_empty());

        let output = hvm_with_env(dir.path(), &["generate", "--env", "dev"], &[("DB_PW", "s3cr3t")]);
        assert!(output.status.success(), "stderr: {}", stderr(&output));
        assert_eq!(stdout(&output), "db:\n  password: s3cr3t\n");
    }
}
