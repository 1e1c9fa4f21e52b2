//! Shared helpers used across the catalog workspace.

pub mod utils;
