//! Command-line interface handlers for `vaultctl`

pub mod commands;

pub use commands::*;
