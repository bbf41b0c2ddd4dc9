//! Multisig Vault: multi-signature vaults and a vault factory in Rust
//!
//! This crate provides:
//! - Vaults holding native currency and tokens on behalf of a signer set
//! - Threshold-approved transaction requests with expiry, revocation and cancellation
//! - A factory deploying vaults behind a pause switch and a deployment fee
//! - An in-memory asset ledger with ERC-20 style tokens
//! - A host serializing access to each vault, with JSON persistence
//!
//! # Example
//!
//! ```rust
//! use multisig_vault::core::{Address, Asset, ManualClock};
//! use multisig_vault::host::Host;
//! use multisig_vault::vault::{RequestPayload, VaultParams};
//! use std::sync::Arc;
//!
//! let clock = Arc::new(ManualClock::new(1_000));
//! let host = Host::with_admin("governance", clock.clone());
//! host.with_factory(&"governance".into(), |f, ctx| f.set_pause(ctx, false)).unwrap();
//!
//! // 2-of-3 vault
//! let params = VaultParams::new("alice", 2).with_signers(["bob", "carol"]);
//! let vault = host.deploy_vault(&"alice".into(), params, 3_600, 0).unwrap();
//! host.with_ledger(|ledger, _| ledger.credit_native(&vault, 100)).unwrap();
//!
//! let id = host
//!     .with_vault(&vault, &"alice".into(), |v, ctx| {
//!         v.create_request(ctx, RequestPayload::native("dave", 5))
//!     })
//!     .unwrap();
//! for signer in ["alice", "bob"] {
//!     host.with_vault(&vault, &Address::from(signer), |v, ctx| v.vote_for(ctx, id))
//!         .unwrap();
//! }
//! host.execute(&vault, &"carol".into(), id).unwrap();
//!
//! let balance = host
//!     .vault_view(&vault, |v, ledger| v.balance(ledger, &Asset::Native))
//!     .unwrap();
//! assert_eq!(balance, 95);
//! ```

pub mod cli;
pub mod core;
pub mod crypto;
pub mod factory;
pub mod host;
pub mod ledger;
pub mod storage;
pub mod vault;

// Re-export commonly used types
pub use core::{Address, Amount, Asset, CallContext, Clock, ManualClock, SystemClock};
pub use factory::{FactoryError, VaultFactory};
pub use host::{Host, HostError, HostState, VaultHandle};
pub use ledger::{AssetLedger, Ledger, LedgerError, Transfer};
pub use storage::{Storage, StorageConfig};
pub use vault::{
    RequestPayload, RequestState, TransactionRequest, Vault, VaultConfig, VaultError, VaultParams,
};
