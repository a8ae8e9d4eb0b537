//! Diagnostic logging
//!
//! Logs go to stderr so that generated values written to stdout stay
//! clean when piped into Helm.

use std::io::IsTerminal;

use tracing_subscriber::filter::{EnvFilter, LevelFilter};

/// Set by Helm when a plugin runs with `--debug`
const HELM_DEBUG: &str = "HELM_DEBUG";

/// Install the global subscriber
///
/// `RUST_LOG` wins when set and valid; otherwise the level is `debug` with
/// `--debug` or `HELM_DEBUG`, and `warn` by default.
pub fn setup_logging(debug: bool) {
    let helm_debug = std::env::var(HELM_DEBUG).is_ok_and(|v| !v.is_empty() && v != "false");
    let default_level = if debug || helm_debug {
        LevelFilter::DEBUG
    } else {
        LevelFilter::WARN
    };

    let env_filter = match std::env::var(EnvFilter::DEFAULT_ENV) {
        Ok(directive) => match EnvFilter::builder().parse(&directive) {
            Ok(filter) => filter,
            Err(err) => {
                eprintln!("invalid log filter: {err}");
                eprintln!("falling back to default logging");
                default_filter(default_level)
            }
        },
        Err(_) => default_filter(default_level),
    };

    let result = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .without_time()
        .with_target(debug)
        .try_init();

    if let Err(err) = result {
        eprintln!("failed to initialize logging: {err}");
    }
}

fn default_filter(level: LevelFilter) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(level.into())
        .parse_lossy("")
}
