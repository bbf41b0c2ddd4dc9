//! Transaction requests
//!
//! A request is a proposed outgoing transfer. It starts `Pending`, collects
//! and loses votes, and ends in exactly one terminal state. Requests are
//! never deleted; terminal ones stay behind as the vault's audit trail.

use crate::core::{Address, Amount, Asset, RequestId, Timestamp};
use crate::vault::signers::Activation;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Lifecycle state of a request
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequestState {
    /// Open for votes; the only non-terminal state
    Pending,
    /// Transfer carried out
    Executed,
    /// Withdrawn by its creator or an administrator
    Cancelled,
    /// Touched after its expiry timestamp
    Expired,
}

impl RequestState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RequestState::Pending)
    }
}

impl fmt::Display for RequestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RequestState::Pending => "pending",
            RequestState::Executed => "executed",
            RequestState::Cancelled => "cancelled",
            RequestState::Expired => "expired",
        };
        f.write_str(name)
    }
}

/// What a request would do once executed
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestPayload {
    /// Recipient
    pub to: Address,
    /// Amount to move
    pub value: Amount,
    /// Token contract, or `None` for native currency
    pub token: Option<Address>,
    /// Opaque call data forwarded with the transfer
    #[serde(default)]
    pub data: Vec<u8>,
}

impl RequestPayload {
    pub fn native(to: impl Into<Address>, value: Amount) -> Self {
        Self {
            to: to.into(),
            value,
            token: None,
            data: Vec::new(),
        }
    }

    pub fn token(to: impl Into<Address>, value: Amount, token: impl Into<Address>) -> Self {
        Self {
            to: to.into(),
            value,
            token: Some(token.into()),
            data: Vec::new(),
        }
    }

    pub fn with_data(mut self, data: Vec<u8>) -> Self {
        self.data = data;
        self
    }

    pub fn asset(&self) -> Asset {
        Asset::from_token(self.token.clone())
    }
}

/// A proposed transfer and the votes collected for it
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRequest {
    pub id: RequestId,
    pub creator: Address,
    pub payload: RequestPayload,
    pub state: RequestState,
    /// Host time at creation
    pub created_at: Timestamp,
    /// `created_at + expiry_period`; the request is dead from this instant on
    pub expires_at: Timestamp,
    /// Host time of the last state or vote change
    pub updated_at: Timestamp,
    /// Identities that voted in favor, with the activation each voted under
    signatures: BTreeMap<Address, Activation>,
}

impl TransactionRequest {
    pub(crate) fn new(
        id: RequestId,
        creator: Address,
        payload: RequestPayload,
        created_at: Timestamp,
        expiry_period: u64,
    ) -> Self {
        Self {
            id,
            creator,
            payload,
            state: RequestState::Pending,
            created_at,
            expires_at: created_at.saturating_add(expiry_period),
            updated_at: created_at,
            signatures: BTreeMap::new(),
        }
    }

    pub fn is_pending(&self) -> bool {
        self.state == RequestState::Pending
    }

    /// True once `now` has reached the expiry timestamp
    pub fn is_expired_at(&self, now: Timestamp) -> bool {
        now >= self.expires_at
    }

    /// The state an observer at `now` should see, without applying it
    pub fn effective_state(&self, now: Timestamp) -> RequestState {
        if self.is_pending() && self.is_expired_at(now) {
            RequestState::Expired
        } else {
            self.state
        }
    }

    pub fn asset(&self) -> Asset {
        self.payload.asset()
    }

    /// Every recorded vote, including stale ones from signers removed since
    pub fn signatures(&self) -> &BTreeMap<Address, Activation> {
        &self.signatures
    }

    /// True if `identity` holds a recorded vote, stale or not
    pub fn has_voted(&self, identity: &Address) -> bool {
        self.signatures.contains_key(identity)
    }

    /// Activation the recorded vote of `identity` was cast under
    pub fn vote_activation(&self, identity: &Address) -> Option<Activation> {
        self.signatures.get(identity).copied()
    }

    /// Record a vote cast under `activation`, replacing any stale one.
    /// Returns false if that exact vote was already present.
    pub(crate) fn add_vote(
        &mut self,
        voter: Address,
        activation: Activation,
        now: Timestamp,
    ) -> bool {
        if self.vote_activation(&voter) == Some(activation) {
            return false;
        }
        self.signatures.insert(voter, activation);
        self.updated_at = now;
        true
    }

    /// Returns false if there was no vote to remove
    pub(crate) fn remove_vote(&mut self, voter: &Address, now: Timestamp) -> bool {
        let removed = self.signatures.remove(voter).is_some();
        if removed {
            self.updated_at = now;
        }
        removed
    }

    /// Move out of `Pending`; terminal states never change again
    pub(crate) fn finish(&mut self, state: RequestState, now: Timestamp) {
        debug_assert!(self.is_pending() && state.is_terminal());
        self.state = state;
        self.updated_at = now;
    }
}
