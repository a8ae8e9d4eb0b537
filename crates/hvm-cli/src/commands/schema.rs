//! Schema commands - add, list, show, update and remove value declarations

use console::style;
use hvm_core::{RawValue, Schema, SchemaUpdate, SchemaValue, Settings, ValueType};
use serde_json::Value as JsonValue;

use crate::display;
use crate::error::{CliError, Result};

/// Declare a new value
#[allow(clippy::too_many_arguments)]
pub fn add(
    settings: &Settings,
    key: &str,
    path: &str,
    description: &str,
    value_type: ValueType,
    optional: bool,
    default: Option<&str>,
    sensitive: bool,
) -> Result<()> {
    if key.trim().is_empty() {
        return Err(CliError::input("Key cannot be empty"));
    }

    let _lock = settings.store().lock()?;
    let mut schema = Schema::from_file(settings.schema_path())?;

    let mut value = SchemaValue::new(key, path, value_type)
        .with_description(description)
        .with_required(!optional)
        .with_sensitive(sensitive);
    if let Some(input) = default {
        value = value.with_default(parse_default(input, value_type)?);
    }

    schema.add(value.clone())?;
    schema.save(settings.schema_path())?;

    println!("{} Added '{}' to schema", style("✓").green(), key);
    println!("  Path: {}", value.path);
    println!("  Type: {}", value.value_type);
    println!("  Required: {}", value.required);
    if let Some(default) = &value.default {
        println!("  Default: {}", default);
    }
    println!("  Sensitive: {}", value.sensitive);
    Ok(())
}

/// List every declared value
pub fn list(settings: &Settings) -> Result<()> {
    let schema = Schema::from_file(settings.schema_path())?;
    if schema.values.is_empty() {
        println!("No values defined in schema.");
        return Ok(());
    }
    display::print_schema(&schema);
    Ok(())
}

/// Show one declared value
pub fn get(settings: &Settings, key: &str) -> Result<()> {
    let schema = Schema::from_file(settings.schema_path())?;
    let value = schema.get(key).ok_or_else(|| {
        CliError::input_with_help(
            format!("Value with key '{}' not found", key),
            "Run 'hvm schema list' to see declared keys",
        )
    })?;
    display::print_schema_value(value);
    Ok(())
}

/// Change fields of a declared value
#[allow(clippy::too_many_arguments)]
pub fn update(
    settings: &Settings,
    key: &str,
    path: Option<String>,
    description: Option<String>,
    value_type: Option<ValueType>,
    required: Option<bool>,
    default: Option<&str>,
    clear_default: bool,
    sensitive: Option<bool>,
) -> Result<()> {
    let _lock = settings.store().lock()?;
    let mut schema = Schema::from_file(settings.schema_path())?;

    let current_type = schema
        .get(key)
        .map(|v| v.value_type)
        .ok_or_else(|| CliError::input(format!("Value with key '{}' not found", key)))?;

    let default = match (default, clear_default) {
        (_, true) => Some(None),
        (Some(input), false) => Some(Some(parse_default(
            input,
            value_type.unwrap_or(current_type),
        )?)),
        (None, false) => None,
    };

    let update = SchemaUpdate {
        path,
        description,
        value_type,
        required,
        default,
        sensitive,
    };
    if is_noop(&update) {
        return Err(CliError::input_with_help(
            "No changes specified",
            "Pass at least one of --path, --description, --type, --required, --default, --clear-default, --sensitive",
        ));
    }

    let updated = schema.update(key, update)?.clone();
    schema.save(settings.schema_path())?;

    println!("{} Updated '{}' in schema", style("✓").green(), key);
    display::print_schema_value(&updated);
    Ok(())
}

/// Remove a declared value
pub fn remove(settings: &Settings, key: &str) -> Result<()> {
    let _lock = settings.store().lock()?;
    let mut schema = Schema::from_file(settings.schema_path())?;
    let removed = schema.remove(key)?;
    schema.save(settings.schema_path())?;

    println!("{} Removed '{}' from schema", style("✓").green(), removed.key);
    Ok(())
}

fn parse_default(input: &str, value_type: ValueType) -> Result<JsonValue> {
    RawValue::parse_as(input, value_type)
        .map(|value| value.to_json())
        .map_err(|err| CliError::input(format!("Invalid default for type {}: {}", value_type, err)))
}

fn is_noop(update: &SchemaUpdate) -> bool {
    update.path.is_none()
        && update.description.is_none()
        && update.value_type.is_none()
        && update.required.is_none()
        && update.default.is_none()
        && update.sensitive.is_none()
}
