//! Multi-signature vaults
//!
//! A vault holds funds for a group of signers and releases them only once a
//! quorum of currently active signers has voted for a transaction request.
//!
//! # Lifecycle
//!
//! ```text
//!   create_request ──► Pending ──execute (quorum + funds)──► Executed
//!                        │  ▲
//!          vote / revoke └──┘──cancel (creator|admin)──────► Cancelled
//!                        │
//!                        └──any touch at/after expires_at──► Expired
//! ```
//!
//! # Example
//!
//! ```ignore
//! use multisig_vault::core::CallContext;
//! use multisig_vault::vault::{RequestPayload, Vault, VaultConfig, VaultParams};
//!
//! let params = VaultParams::new("alice", 2).with_signers(["bob", "carol"]);
//! let mut vault = Vault::new(address, params, VaultConfig::default(), now)?;
//!
//! let id = vault.create_request(&CallContext::new("alice", now), RequestPayload::native("dave", 5))?;
//! vault.vote_for(&CallContext::new("alice", now), id)?;
//! vault.vote_for(&CallContext::new("bob", now), id)?;
//! vault.execute(&CallContext::new("bob", now), id, &mut ledger)?;
//! ```

pub mod config;
pub mod error;
pub mod events;
pub mod request;
pub mod signers;
pub mod vault;

pub use config::{ProposalPolicy, RevotePolicy, VaultConfig, VaultParams, DEFAULT_EXPIRY_PERIOD};
pub use error::VaultError;
pub use events::{VaultEvent, VaultEventKind};
pub use request::{RequestPayload, RequestState, TransactionRequest};
pub use signers::{Activation, SignerRegistry};
pub use vault::Vault;
