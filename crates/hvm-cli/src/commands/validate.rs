//! Validate command - check the schema and environment values

use console::style;
use hvm_core::{Settings, Validator};

use crate::commands::values::check_environment_name;
use crate::display;
use crate::error::{CliError, Result};

pub fn run(settings: &Settings, environment: Option<&str>, json_output: bool) -> Result<()> {
    if let Some(env) = environment {
        check_environment_name(env)?;
    }

    if !json_output {
        let scope = environment.unwrap_or("all environments");
        println!(
            "{} Validating {} against {}",
            style("→").blue(),
            scope,
            settings.schema_path().display()
        );
    }

    let store = settings.store();
    let report = Validator::default().validate_files(settings.schema_path(), &store, environment);

    if json_output {
        let output = serde_json::json!({
            "valid": report.is_valid(),
            "environments": report.environments,
            "errors": report.errors,
            "warnings": report.warnings,
        });
        let rendered = serde_json::to_string_pretty(&output).map_err(|err| CliError::Other {
            message: err.to_string(),
            help: None,
        })?;
        println!("{}", rendered);
    } else {
        display::print_report(&report);
        println!();
        display::print_summary(&report, environment);
    }

    if report.is_valid() {
        Ok(())
    } else {
        Err(CliError::validation(report.errors.len()))
    }
}
