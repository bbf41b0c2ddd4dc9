//! Vault factory module
//!
//! Deploys new vaults behind a pause switch and a deployment fee.

pub mod factory;

pub use factory::{FactoryError, FactoryState, VaultFactory};
