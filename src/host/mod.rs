//! Host environment
//!
//! Ties a factory, the asset ledger and a clock together and serializes
//! access to each vault.

pub mod host;
pub mod state;

pub use host::{Host, HostError, VaultHandle};
pub use state::HostState;
