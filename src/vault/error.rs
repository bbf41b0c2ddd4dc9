//! Vault error taxonomy

use crate::core::{Address, Amount, RequestId};
use crate::ledger::LedgerError;
use crate::vault::request::RequestState;
use thiserror::Error;

/// Errors returned by vault operations
///
/// Every failing operation leaves the vault exactly as it found it, with one
/// exception: a request found past its expiry is moved to `Expired` before
/// `Expired` is reported.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VaultError {
    #[error("Unauthorized: {caller} may not {action}")]
    Unauthorized {
        caller: Address,
        action: &'static str,
    },
    #[error("Invalid threshold {threshold} for {signers} active signer(s)")]
    InvalidThreshold { threshold: usize, signers: usize },
    #[error("Invalid expiry period: {0} (must be at least 1 second)")]
    InvalidExpiryPeriod(u64),
    #[error("Invalid amount: requests must move a non-zero value")]
    InvalidAmount,
    #[error("Already a signer: {0}")]
    AlreadySigner(Address),
    #[error("Not a signer: {0}")]
    NotASigner(Address),
    #[error("Request not found: {0}")]
    RequestNotFound(RequestId),
    #[error("Request {id} is not pending (state: {state})")]
    NotPending { id: RequestId, state: RequestState },
    #[error("Request {0} has expired")]
    Expired(RequestId),
    #[error("{signer} already voted on request {id}")]
    AlreadyVoted { id: RequestId, signer: Address },
    #[error("Quorum not met: have {have}, need {need}")]
    QuorumNotMet { have: usize, need: usize },
    #[error("Insufficient balance: have {have}, need {need}")]
    InsufficientBalance { have: Amount, need: Amount },
    #[error("Transfer failed: {0}")]
    TransferFailed(#[from] LedgerError),
}
