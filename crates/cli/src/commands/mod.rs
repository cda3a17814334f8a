//! Subcommand implementations

pub mod batch;
pub mod insights;
pub mod predict;
