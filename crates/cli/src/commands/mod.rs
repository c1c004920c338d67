//! CLI subcommands

pub mod analyze;
pub mod dashboard;
pub mod history;
pub mod status;
