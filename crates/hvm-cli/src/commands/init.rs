//! Init command - create an empty schema

use console::style;
use hvm_core::{Schema, Settings};

use crate::error::{CliError, Result};

pub fn run(settings: &Settings, force: bool) -> Result<()> {
    let _lock = settings.store().lock()?;
    let path = settings.schema_path();

    if path.exists() && !force {
        return Err(CliError::input_with_help(
            format!("{} already exists", path.display()),
            "Use --force to overwrite",
        ));
    }

    Schema::new().save(path)?;
    println!("{} Created {}", style("✓").green(), path.display());
    Ok(())
}
