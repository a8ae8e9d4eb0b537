//! Display formatting for CLI output
//!
//! Provides structured display for:
//! - Validation reports grouped by environment
//! - Schema entries
//! - Per-environment values tables

use console::style;
use hvm_core::{EnvironmentValues, ErrorContext, Schema, SchemaValue, ValidationReport, ValueType};
use std::collections::BTreeMap;

/// Group heading for errors that belong to no environment
const SCHEMA_GROUP: &str = "schema";

/// Print every error and warning of a report, grouped by environment
pub fn print_report(report: &ValidationReport) {
    let mut groups: BTreeMap<&str, Vec<String>> = BTreeMap::new();
    for error in &report.errors {
        let group = match (error.context, error.env.as_deref()) {
            (ErrorContext::Schema, _) | (_, None) => SCHEMA_GROUP,
            (ErrorContext::Values, Some(env)) => env,
        };
        groups
            .entry(group)
            .or_default()
            .push(format!("  {} {}", style("✗").red(), error));
    }
    for warning in &report.warnings {
        let group = warning.env.as_deref().unwrap_or(SCHEMA_GROUP);
        groups.entry(group).or_default().push(format!(
            "  {} {}",
            style("⚠").yellow(),
            warning.message
        ));
    }

    // Schema problems first, then environments in name order
    if let Some(lines) = groups.remove(SCHEMA_GROUP) {
        print_group(SCHEMA_GROUP, &lines);
    }
    for (group, lines) in &groups {
        print_group(group, lines);
    }
}

fn print_group(group: &str, lines: &[String]) {
    println!();
    println!("{}", style(group).cyan().bold());
    for line in lines {
        println!("{}", line);
    }
}

/// Print the closing line of a validation run
pub fn print_summary(report: &ValidationReport, environment: Option<&str>) {
    let errors = report.errors.len();
    let warnings = report.warnings.len();

    if errors > 0 {
        println!(
            "{} Validation failed: {}, {}",
            style("✗").red().bold(),
            pluralize(errors, "error", "errors"),
            pluralize(warnings, "warning", "warnings")
        );
        return;
    }

    let scope = match environment {
        Some(env) => format!("for environment: {}", env),
        None => "for all environments".to_string(),
    };
    if warnings > 0 {
        println!(
            "{} Validation passed {} with {}",
            style("✓").green().bold(),
            scope,
            pluralize(warnings, "warning", "warnings")
        );
    } else {
        println!("{} Validation passed {}", style("✓").green().bold(), scope);
    }
}

/// Print the schema as a list of entries
pub fn print_schema(schema: &Schema) {
    println!("{}", style("Schema values:").bold());
    for value in &schema.values {
        println!();
        let marker = if value.required {
            style("●").green()
        } else {
            style("○").yellow()
        };
        let sensitive = if value.sensitive { " (sensitive)" } else { "" };
        println!("{} {}{}", marker, style(&value.key).bold(), sensitive);
        println!("  Path: {}", value.path);
        println!("  Type: {}", value.value_type);
        println!("  Description: {}", value.description);
        if let Some(default) = &value.default {
            println!("  Default: {}", format_json(default, value.value_type));
        }
    }
}

/// Print every field of one schema entry
pub fn print_schema_value(value: &SchemaValue) {
    println!("{}", style(&value.key).bold());
    println!("Path: {}", value.path);
    println!("Type: {}", value.value_type);
    println!("Description: {}", value.description);
    println!("Required: {}", value.required);
    if let Some(default) = &value.default {
        println!("Default: {}", format_json(default, value.value_type));
    }
    println!("Sensitive: {}", value.sensitive);
}

/// Print an environment's values as an aligned table
///
/// Secret references are masked; keys unknown to the schema are shown with
/// a `?` type.
pub fn print_values_table(schema: &Schema, environment: &str, values: &EnvironmentValues) {
    let declared = schema.by_key();
    let rows: Vec<(&str, String, String)> = values
        .iter()
        .map(|(key, value)| {
            let kind = declared
                .get(key)
                .map(|v| v.value_type.to_string())
                .unwrap_or_else(|| "?".to_string());
            (key, kind, value.display())
        })
        .collect();

    let key_width = rows.iter().map(|r| r.0.len()).max().unwrap_or(0).max(3);
    let type_width = rows.iter().map(|r| r.1.len()).max().unwrap_or(0).max(4);

    println!("{}", style(format!("Values for environment '{}'", environment)).bold());
    println!(
        "{:<kw$}  {:<tw$}  {}",
        style("Key").bold(),
        style("Type").bold(),
        style("Value").bold(),
        kw = key_width,
        tw = type_width
    );
    for (key, kind, shown) in rows {
        println!(
            "{:<kw$}  {:<tw$}  {}",
            key,
            kind,
            shown,
            kw = key_width,
            tw = type_width
        );
    }
}

fn format_json(value: &serde_json::Value, value_type: ValueType) -> String {
    match (value, value_type) {
        (serde_json::Value::String(s), _) => s.clone(),
        (_, ValueType::Array | ValueType::Object) => {
            serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
        }
        _ => value.to_string(),
    }
}

/// Format count with proper pluralization
pub fn pluralize(count: usize, singular: &str, plural: &str) -> String {
    if count == 1 {
        format!("{} {}", count, singular)
    } else {
        format!("{} {}", count, plural)
    }
}
