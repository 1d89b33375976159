//! CLI commands.

pub mod build;
pub mod dev;
pub mod query;
pub mod serve;
