// [apps/cli/src/commands/mod.rs]
//! Subcomandos de la superficie de mando.

pub mod discover_config;
pub mod export_deps;
pub mod grid;
pub mod run;
pub mod server;
pub mod validate;
