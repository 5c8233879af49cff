//! CLI subcommand implementations.

pub mod decide;
pub mod fix;
