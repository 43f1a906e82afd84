//! CLI subcommands.
pub mod config;
pub mod health;
pub mod policy;
pub mod probe;
pub mod token;
