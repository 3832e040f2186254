//! CLI subcommand implementations.

pub mod fingerprint;
pub mod ranking;
pub mod submit;
pub mod trips;
