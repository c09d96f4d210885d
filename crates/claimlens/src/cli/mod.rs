//! Command handlers for the ClaimLens CLI.

pub mod analyze;
pub mod config;
pub mod serve;
