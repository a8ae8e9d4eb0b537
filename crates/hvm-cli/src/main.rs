//! HVM CLI - schema-driven Helm values management

use clap::{Parser, Subcommand};
use hvm_core::{Settings, ValueType};
use std::path::{Path, PathBuf};

mod commands;
mod display;
mod error;
mod exit_codes;
mod logging;

use error::Result;

#[derive(Parser)]
#[command(name = "hvm")]
#[command(version)]
#[command(about = "Manage Helm values across environments with a typed schema", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Schema file (overrides the settings file)
    #[arg(long, global = true, env = "HVM_SCHEMA")]
    schema: Option<PathBuf>,

    /// Directory holding values-<env>.json documents
    #[arg(long, global = true, env = "HVM_VALUES_DIR")]
    values_dir: Option<PathBuf>,

    /// Settings file (default: .hvm.yaml in the working directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an empty schema
    Init {
        /// Overwrite an existing schema
        #[arg(short, long)]
        force: bool,
    },

    /// Manage value declarations in the schema
    #[command(subcommand)]
    Schema(SchemaCommands),

    /// Manage per-environment values
    #[command(subcommand)]
    Values(ValuesCommands),

    /// Validate the schema and environment values
    Validate {
        /// Only validate this environment (default: every environment found)
        #[arg(short, long)]
        env: Option<String>,

        /// Output validation results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Generate a Helm values file for an environment
    Generate {
        /// Environment to generate values for
        #[arg(short, long)]
        env: String,

        /// Output file (if not set, outputs to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum SchemaCommands {
    /// Declare a new value
    Add {
        /// Unique key of the value
        #[arg(long)]
        key: String,

        /// Dot-separated path in the generated values file
        #[arg(long)]
        path: String,

        /// Human readable description
        #[arg(long, default_value = "")]
        description: String,

        /// Value type (string, number, boolean, array, object)
        #[arg(long = "type")]
        value_type: ValueType,

        /// Mark the value as optional
        #[arg(long)]
        optional: bool,

        /// Default value, parsed according to the type
        #[arg(long)]
        default: Option<String>,

        /// Require a secret reference instead of a literal value
        #[arg(long)]
        sensitive: bool,
    },

    /// List declared values
    List,

    /// Show one declared value
    Get {
        /// Key of the value to show
        key: String,
    },

    /// Change a declared value
    Update {
        /// Key of the value to update
        key: String,

        #[arg(long)]
        path: Option<String>,

        #[arg(long)]
        description: Option<String>,

        #[arg(long = "type")]
        value_type: Option<ValueType>,

        #[arg(long)]
        required: Option<bool>,

        /// New default value, parsed according to the type
        #[arg(long, conflicts_with = "clear_default")]
        default: Option<String>,

        /// Remove the default value
        #[arg(long)]
        clear_default: bool,

        #[arg(long)]
        sensitive: Option<bool>,
    },

    /// Remove a declared value
    Remove {
        /// Key of the value to remove
        key: String,
    },
}

#[derive(Subcommand)]
enum ValuesCommands {
    /// Set a value for an environment
    Set {
        /// Key of the value to set
        key: String,

        /// Value, parsed according to the declared type
        #[arg(allow_hyphen_values = true)]
        value: String,

        /// Environment name
        #[arg(short, long)]
        env: String,

        /// Overwrite an existing value
        #[arg(short, long)]
        force: bool,
    },

    /// Reference an environment variable for a sensitive value
    SetSecret {
        /// Key of the secret value
        key: String,

        /// Environment name
        #[arg(short, long)]
        env: String,

        /// Environment variable holding the secret
        #[arg(long)]
        name: String,

        /// Overwrite an existing value
        #[arg(short, long)]
        force: bool,
    },

    /// Show one value
    Get {
        key: String,

        #[arg(short, long)]
        env: String,
    },

    /// List values set for an environment
    List {
        #[arg(short, long)]
        env: String,
    },

    /// Remove a value from an environment
    Remove {
        key: String,

        #[arg(short, long)]
        env: String,
    },
}

fn main() {
    // Setup miette for nice error display
    miette::set_panic_hook();
    let _ = miette::set_hook(Box::new(|_| {
        Box::new(miette::MietteHandlerOpts::new().wrap_lines(false).build())
    }));

    let cli = Cli::try_parse().unwrap_or_else(|err| {
        let code = if err.use_stderr() {
            exit_codes::USAGE_ERROR
        } else {
            exit_codes::SUCCESS
        };
        let _ = err.print();
        std::process::exit(code);
    });

    logging::setup_logging(cli.debug);

    if let Err(err) = run(cli) {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn run(cli: Cli) -> Result<()> {
    let settings = match &cli.config {
        Some(path) => Settings::load_from(path)?,
        None => Settings::load(Path::new("."))?,
    }
    .with_overrides(cli.schema, cli.values_dir);
    tracing::debug!(?settings, "resolved settings");

    match cli.command {
        Commands::Init { force } => commands::init::run(&settings, force),

        Commands::Schema(command) => match command {
            SchemaCommands::Add {
                key,
                path,
                description,
                value_type,
                optional,
                default,
                sensitive,
            } => commands::schema::add(
                &settings,
                &key,
                &path,
                &description,
                value_type,
                optional,
                default.as_deref(),
                sensitive,
            ),
            SchemaCommands::List => commands::schema::list(&settings),
            SchemaCommands::Get { key } => commands::schema::get(&settings, &key),
            SchemaCommands::Update {
                key,
                path,
                description,
                value_type,
                required,
                default,
                clear_default,
                sensitive,
            } => commands::schema::update(
                &settings,
                &key,
                path,
                description,
                value_type,
                required,
                default.as_deref(),
                clear_default,
                sensitive,
            ),
            SchemaCommands::Remove { key } => commands::schema::remove(&settings, &key),
        },

        Commands::Values(command) => match command {
            ValuesCommands::Set {
                key,
                value,
                env,
                force,
            } => commands::values::set(&settings, &env, &key, &value, force),
            ValuesCommands::SetSecret {
                key,
                env,
                name,
                force,
            } => commands::values::set_secret(&settings, &env, &key, &name, force),
            ValuesCommands::Get { key, env } => commands::values::get(&settings, &env, &key),
            ValuesCommands::List { env } => commands::values::list(&settings, &env),
            ValuesCommands::Remove { key, env } => commands::values::remove(&settings, &env, &key),
        },

        Commands::Validate { env, json } => commands::validate::run(&settings, env.as_deref(), json),

        Commands::Generate { env, output } => {
            commands::generate::run(&settings, &env, output.as_deref())
        }
    }
}
