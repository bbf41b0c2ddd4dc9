//! Serializable host snapshot

use crate::core::Timestamp;
use crate::factory::FactoryState;
use crate::ledger::Ledger;
use crate::vault::Vault;
use serde::{Deserialize, Serialize};

/// Everything needed to rebuild a [`Host`](super::Host)
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HostState {
    pub factory: FactoryState,
    /// Vault states in deployment order
    pub vaults: Vec<Vault>,
    pub ledger: Ledger,
    /// Host time when the snapshot was taken
    pub saved_at: Timestamp,
}

impl HostState {
    pub fn vault_count(&self) -> usize {
        self.vaults.len()
    }
}
