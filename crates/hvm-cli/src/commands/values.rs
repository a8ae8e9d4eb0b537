//! Values commands - set, inspect and remove per-environment values

use console::style;
use hvm_core::{EnvSource, ProcessEnv, RawValue, Schema, SecretRef, Settings};

use crate::display;
use crate::error::{CliError, Result};

/// Set a plain value, parsed according to its declared type
pub fn set(settings: &Settings, environment: &str, key: &str, input: &str, force: bool) -> Result<()> {
    check_environment_name(environment)?;
    let store = settings.store();
    let _lock = store.lock()?;

    let schema = Schema::from_file(settings.schema_path())?;
    let entry = schema.get(key).ok_or_else(|| not_in_schema(key))?;
    if entry.sensitive {
        return Err(CliError::input_with_help(
            format!("Key '{}' is marked as sensitive", key),
            format!("Use 'hvm values set-secret {} --env {} --name <VAR>' instead", key, environment),
        ));
    }

    let value = RawValue::parse_as(input, entry.value_type)?;

    let mut values = store.load_or_default(environment)?;
    if let Some(current) = values.get(key) {
        if !force {
            return Err(CliError::input_with_help(
                format!("Key '{}' already set to: {}", key, current.display()),
                "Use --force to overwrite",
            ));
        }
    }

    let shown = value.display();
    values.insert(key, value);
    store.save(environment, &values)?;

    println!(
        "{} Set '{}' = {} for environment '{}'",
        style("✓").green(),
        key,
        shown,
        environment
    );
    Ok(())
}

/// Point a value at an environment variable
pub fn set_secret(
    settings: &Settings,
    environment: &str,
    key: &str,
    name: &str,
    force: bool,
) -> Result<()> {
    check_environment_name(environment)?;
    if name.trim().is_empty() {
        return Err(CliError::input("Environment variable name cannot be empty"));
    }

    let store = settings.store();
    let _lock = store.lock()?;

    let schema = Schema::from_file(settings.schema_path())?;
    let entry = schema.get(key).ok_or_else(|| not_in_schema(key))?;
    if !entry.sensitive {
        println!(
            "{} Key '{}' is not marked as sensitive in schema",
            style("⚠").yellow(),
            key
        );
    }

    let mut values = store.load_or_default(environment)?;
    if let Some(current) = values.get(key) {
        if !force {
            return Err(CliError::input_with_help(
                format!("Key '{}' already set to: {}", key, current.display()),
                "Use --force to overwrite",
            ));
        }
    }

    if ProcessEnv.var(name).is_none_or(|v| v.is_empty()) {
        println!(
            "{} Environment variable '{}' is not set",
            style("⚠").yellow(),
            name
        );
    }

    values.insert(key, SecretRef::env(name));
    store.save(environment, &values)?;

    println!(
        "{} Set secret '{}' to use environment variable '{}' for environment '{}'",
        style("✓").green(),
        key,
        name,
        environment
    );
    Ok(())
}

/// Print one value; secret references are masked
pub fn get(settings: &Settings, environment: &str, key: &str) -> Result<()> {
    check_environment_name(environment)?;
    let values = settings.store().load_or_default(environment)?;
    let value = values.get(key).ok_or_else(|| not_set(key, environment))?;

    match value {
        RawValue::Array(_) | RawValue::Object(_) => {
            let pretty = serde_json::to_string_pretty(&value.to_json())
                .map_err(|err| CliError::input(err.to_string()))?;
            println!("{}: {}", key, pretty);
        }
        other => println!("{}: {}", key, other.display()),
    }
    Ok(())
}

/// Print every value set for an environment
pub fn list(settings: &Settings, environment: &str) -> Result<()> {
    check_environment_name(environment)?;
    let values = settings.store().load_or_default(environment)?;
    if values.is_empty() {
        println!("No values set for environment '{}'", environment);
        return Ok(());
    }

    let schema = match Schema::from_file(settings.schema_path()) {
        Ok(schema) => schema,
        Err(err) => {
            tracing::debug!("listing without schema types: {}", err);
            Schema::new()
        }
    };
    display::print_values_table(&schema, environment, &values);
    Ok(())
}

/// Remove a value from an environment
pub fn remove(settings: &Settings, environment: &str, key: &str) -> Result<()> {
    check_environment_name(environment)?;
    let store = settings.store();
    let _lock = store.lock()?;

    let mut values = store.load_or_default(environment)?;
    let removed = values.remove(key).ok_or_else(|| not_set(key, environment))?;
    store.save(environment, &values)?;

    println!(
        "{} Removed '{}' ({}) from environment '{}'",
        style("✓").green(),
        key,
        removed.display(),
        environment
    );
    Ok(())
}

/// Environment names become part of a file name
pub fn check_environment_name(environment: &str) -> Result<()> {
    let valid = !environment.is_empty()
        && environment
            .chars()
            .all(|c| c.is_alphanumeric() || c == '-' || c == '_' || c == '.')
        && environment != "."
        && environment != "..";
    if valid {
        Ok(())
    } else {
        Err(CliError::input(format!(
            "Invalid environment name: '{}'",
            environment
        )))
    }
}

fn not_in_schema(key: &str) -> CliError {
    CliError::input_with_help(
        format!("Key '{}' not found in schema", key),
        "Add it first with 'hvm schema add'",
    )
}

fn not_set(key: &str, environment: &str) -> CliError {
    CliError::input(format!(
        "Value '{}' not set for environment '{}'",
        key, environment
    ))
}
