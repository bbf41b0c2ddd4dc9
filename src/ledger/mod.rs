//! Host asset ledger
//!
//! Native currency balances and ERC-20 style tokens. Vaults never hold funds
//! themselves: their balance is whatever the ledger records under the vault's
//! address, and every outgoing payment goes through [`AssetLedger::transfer`].
//!
//! # Example
//!
//! ```ignore
//! use multisig_vault::ledger::{AssetLedger, Ledger, Transfer};
//!
//! let mut ledger = Ledger::new();
//! ledger.credit_native(&"alice".into(), 100)?;
//! ledger.transfer(&Transfer::native("alice".into(), "bob".into(), 40), now)?;
//! ```

pub mod ledger;
pub mod token;

use crate::core::{Address, Amount, Asset, Timestamp};
use serde::{Deserialize, Serialize};

pub use ledger::Ledger;
pub use token::{LedgerError, Token, TokenMetadata, TransferEvent, TRANSFER_HISTORY_LIMIT};

/// A requested movement of funds
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    pub asset: Asset,
    pub from: Address,
    pub to: Address,
    pub amount: Amount,
    pub memo: Vec<u8>,
}

impl Transfer {
    pub fn native(from: Address, to: Address, amount: Amount) -> Self {
        Self {
            asset: Asset::Native,
            from,
            to,
            amount,
            memo: Vec::new(),
        }
    }
}

/// Where balances live and how they move
pub trait AssetLedger {
    /// Balance of `holder` in `asset` (0 for unknown tokens)
    fn balance_of(&self, asset: &Asset, holder: &Address) -> Amount;

    /// Move funds; either applies completely or leaves every balance untouched
    fn transfer(
        &mut self,
        transfer: &Transfer,
        timestamp: Timestamp,
    ) -> Result<TransferEvent, LedgerError>;
}
