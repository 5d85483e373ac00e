//! CLI command modules.

pub mod backends;
pub mod config;
pub mod respond;
