//! Vault audit events
//!
//! Every accepted mutation appends one event. The log only grows.

use crate::core::{Address, RequestId, Timestamp};
use crate::ledger::TransferEvent;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum VaultEventKind {
    SignerAdded { signer: Address },
    SignerRemoved { signer: Address },
    ThresholdUpdated { old: usize, new: usize },
    RequestCreated { id: RequestId, creator: Address },
    VoteCast { id: RequestId, signer: Address },
    VoteRevoked { id: RequestId, signer: Address },
    RequestExecuted { id: RequestId, transfer: TransferEvent },
    RequestCancelled { id: RequestId, by: Address },
    RequestExpired { id: RequestId },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultEvent {
    pub timestamp: Timestamp,
    pub kind: VaultEventKind,
}

impl VaultEvent {
    pub fn new(timestamp: Timestamp, kind: VaultEventKind) -> Self {
        Self { timestamp, kind }
    }

    /// Request the event is about, if any
    pub fn request_id(&self) -> Option<RequestId> {
        match &self.kind {
            VaultEventKind::RequestCreated { id, .. }
            | VaultEventKind::VoteCast { id, .. }
            | VaultEventKind::VoteRevoked { id, .. }
            | VaultEventKind::RequestExecuted { id, .. }
            | VaultEventKind::RequestCancelled { id, .. }
            | VaultEventKind::RequestExpired { id } => Some(*id),
            _ => None,
        }
    }
}
