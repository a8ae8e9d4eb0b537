//! Generate command - render a Helm values file for one environment

use console::style;
use hvm_core::{GenerateError, Generator, Schema, Settings, ValueStore, Validator};
use std::path::Path;

use crate::commands::values::check_environment_name;
use crate::error::{CliError, Result};

pub fn run(settings: &Settings, environment: &str, output: Option<&Path>) -> Result<()> {
    check_environment_name(environment)?;
    let store = settings.store();

    // Nothing is generated from values that do not validate
    let report = Validator::default().validate_files(settings.schema_path(), &store, Some(environment));
    if !report.is_valid() {
        eprintln!(
            "{} Validation failed. Please fix the following issues:",
            style("✗").red().bold()
        );
        for error in &report.errors {
            eprintln!("  - {}", error);
        }
        return Err(missing_paths(settings, &store, environment).unwrap_or_else(|| {
            CliError::validation_with_help(
                report.errors.len(),
                format!("Run 'hvm validate --env {}' for details", environment),
            )
        }));
    }

    let schema = Schema::from_file(settings.schema_path())?;
    let values = store.load_or_default(environment)?;
    let generated = Generator::default().generate(&schema, environment, &values)?;
    let yaml = generated.to_yaml()?;

    match output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, &yaml)?;
            println!(
                "{} Generated values for '{}' written to {}",
                style("✓").green(),
                environment,
                path.display()
            );
        }
        None => print!("{}", yaml),
    }
    Ok(())
}

/// Missing required values named by destination path, when that is what failed
fn missing_paths(settings: &Settings, store: &ValueStore, environment: &str) -> Option<CliError> {
    let schema = Schema::from_file(settings.schema_path()).ok()?;
    let values = store.load_or_default(environment).ok()?;
    match Generator::default().generate(&schema, environment, &values) {
        Err(err @ GenerateError::MissingRequired { .. }) => Some(err.into()),
        _ => None,
    }
}
