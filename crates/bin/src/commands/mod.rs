//! Subcommand implementations.

pub mod info;
pub mod list;
pub mod maintain;
pub mod reorder;
pub mod seed;
