//! CLI commands

pub mod generate;
pub mod init;
pub mod schema;
pub mod validate;
pub mod values;
