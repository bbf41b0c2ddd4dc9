//! Multi-signature vault
//!
//! Owns the signer registry, the administrator set and the append-only
//! arena of transaction requests. Funds sit in the host ledger under the
//! vault's address and only leave through [`Vault::execute`].

use crate::core::{Address, Amount, Asset, CallContext, RequestId, Timestamp};
use crate::ledger::{AssetLedger, Transfer, TransferEvent};
use crate::vault::config::{ProposalPolicy, RevotePolicy, VaultConfig, VaultParams};
use crate::vault::error::VaultError;
use crate::vault::events::{VaultEvent, VaultEventKind};
use crate::vault::request::{RequestPayload, RequestState, TransactionRequest};
use crate::vault::signers::{Activation, SignerRegistry};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Vault {
    address: Address,
    config: VaultConfig,
    admins: HashSet<Address>,
    registry: SignerRegistry,
    /// Indexed by request id
    requests: Vec<TransactionRequest>,
    events: Vec<VaultEvent>,
    created_at: Timestamp,
}

impl Vault {
    /// Create a vault with the admin (plus any extra signers) as its signer set
    pub fn new(
        address: Address,
        params: VaultParams,
        config: VaultConfig,
        created_at: Timestamp,
    ) -> Result<Self, VaultError> {
        config.validate()?;
        let registry = SignerRegistry::new(params.initial_signers(), params.threshold)?;

        let mut admins = HashSet::new();
        admins.insert(params.admin);

        log::info!(
            "Vault {} created: {}-of-{}, requests expire after {}s",
            address,
            registry.threshold(),
            registry.count(),
            config.expiry_period
        );

        Ok(Self {
            address,
            config,
            admins,
            registry,
            requests: Vec::new(),
            events: Vec::new(),
            created_at,
        })
    }

    // =========================================================================
    // Read-only accessors
    // =========================================================================

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn config(&self) -> &VaultConfig {
        &self.config
    }

    pub fn expiry_period(&self) -> u64 {
        self.config.expiry_period
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    pub fn threshold(&self) -> usize {
        self.registry.threshold()
    }

    /// Active signers in address order
    pub fn signers(&self) -> Vec<Address> {
        self.registry.signers()
    }

    pub fn signer_count(&self) -> usize {
        self.registry.count()
    }

    pub fn is_signer(&self, identity: &Address) -> bool {
        self.registry.is_active(identity)
    }

    pub fn is_admin(&self, identity: &Address) -> bool {
        self.admins.contains(identity)
    }

    pub fn admins(&self) -> Vec<Address> {
        let mut admins: Vec<Address> = self.admins.iter().cloned().collect();
        admins.sort();
        admins
    }

    /// Description like "2-of-3"
    pub fn description(&self) -> String {
        format!("{}-of-{}", self.threshold(), self.signer_count())
    }

    pub fn request(&self, id: RequestId) -> Option<&TransactionRequest> {
        usize::try_from(id).ok().and_then(|i| self.requests.get(i))
    }

    /// Every request ever created, in id order
    pub fn requests(&self) -> &[TransactionRequest] {
        &self.requests
    }

    pub fn request_count(&self) -> u64 {
        self.requests.len() as u64
    }

    /// Requests still stored as pending (some may be past expiry)
    pub fn pending_requests(&self) -> impl Iterator<Item = &TransactionRequest> {
        self.requests.iter().filter(|r| r.is_pending())
    }

    /// Votes on `id` that currently count toward quorum
    pub fn approvals(&self, id: RequestId) -> Option<usize> {
        self.request(id)
            .map(|r| self.registry.count_active(r.signatures()))
    }

    /// Balance the ledger holds for this vault
    pub fn balance<L: AssetLedger + ?Sized>(&self, ledger: &L, asset: &Asset) -> Amount {
        ledger.balance_of(asset, &self.address)
    }

    pub fn events(&self) -> &[VaultEvent] {
        &self.events
    }

    // =========================================================================
    // Signer registry (administrator only)
    // =========================================================================

    /// Activate a new signer under a fresh activation; votes they cast
    /// during an earlier activation stay stale
    pub fn add_signer(&mut self, ctx: &CallContext, signer: Address) -> Result<(), VaultError> {
        self.require_admin(ctx, "add signers")?;
        self.registry.add(signer.clone())?;

        log::info!("Vault {}: signer {} added", self.address, signer);
        self.emit(ctx.timestamp, VaultEventKind::SignerAdded { signer });
        Ok(())
    }

    /// Deactivate a signer; their recorded votes stop counting toward quorum
    pub fn remove_signer(&mut self, ctx: &CallContext, signer: &Address) -> Result<(), VaultError> {
        self.require_admin(ctx, "remove signers")?;
        self.registry.remove(signer)?;

        log::info!("Vault {}: signer {} removed", self.address, signer);
        self.emit(
            ctx.timestamp,
            VaultEventKind::SignerRemoved {
                signer: signer.clone(),
            },
        );
        Ok(())
    }

    pub fn update_threshold(&mut self, ctx: &CallContext, threshold: usize) -> Result<(), VaultError> {
        self.require_admin(ctx, "update the threshold")?;
        let old = self.registry.set_threshold(threshold)?;

        log::info!(
            "Vault {}: threshold {} -> {}",
            self.address,
            old,
            threshold
        );
        self.emit(
            ctx.timestamp,
            VaultEventKind::ThresholdUpdated {
                old,
                new: threshold,
            },
        );
        Ok(())
    }

    // =========================================================================
    // Request lifecycle
    // =========================================================================

    /// Open a new pending request; returns its id
    pub fn create_request(
        &mut self,
        ctx: &CallContext,
        payload: RequestPayload,
    ) -> Result<RequestId, VaultError> {
        if self.config.proposal_policy == ProposalPolicy::ActiveSigners {
            self.require_signer(ctx, "create requests")?;
        }

        if payload.value == 0 {
            return Err(VaultError::InvalidAmount);
        }

        let id = self.requests.len() as RequestId;
        log::info!(
            "Vault {}: request {} created by {} ({} {} to {})",
            self.address,
            id,
            ctx.caller,
            payload.value,
            payload.asset(),
            payload.to
        );

        self.requests.push(TransactionRequest::new(
            id,
            ctx.caller.clone(),
            payload,
            ctx.timestamp,
            self.config.expiry_period,
        ));
        self.emit(
            ctx.timestamp,
            VaultEventKind::RequestCreated {
                id,
                creator: ctx.caller.clone(),
            },
        );

        Ok(id)
    }

    /// Record the caller's vote in favor of `id`
    pub fn vote_for(&mut self, ctx: &CallContext, id: RequestId) -> Result<(), VaultError> {
        let activation = self.require_signer(ctx, "vote")?;
        let index = self.live_request(id, ctx.timestamp)?;

        if !self.requests[index].add_vote(ctx.caller.clone(), activation, ctx.timestamp) {
            return match self.config.revote_policy {
                RevotePolicy::Idempotent => {
                    log::debug!(
                        "Vault {}: repeated vote by {} on request {}",
                        self.address,
                        ctx.caller,
                        id
                    );
                    Ok(())
                }
                RevotePolicy::Reject => Err(VaultError::AlreadyVoted {
                    id,
                    signer: ctx.caller.clone(),
                }),
            };
        }

        log::info!(
            "Vault {}: {} voted for request {}",
            self.address,
            ctx.caller,
            id
        );
        self.emit(
            ctx.timestamp,
            VaultEventKind::VoteCast {
                id,
                signer: ctx.caller.clone(),
            },
        );
        Ok(())
    }

    /// Withdraw the caller's vote; a no-op if there is none
    pub fn revoke_vote(&mut self, ctx: &CallContext, id: RequestId) -> Result<(), VaultError> {
        let index = self.live_request(id, ctx.timestamp)?;

        if self.requests[index].remove_vote(&ctx.caller, ctx.timestamp) {
            log::info!(
                "Vault {}: {} revoked vote on request {}",
                self.address,
                ctx.caller,
                id
            );
            self.emit(
                ctx.timestamp,
                VaultEventKind::VoteRevoked {
                    id,
                    signer: ctx.caller.clone(),
                },
            );
        }
        Ok(())
    }

    /// Carry out the transfer described by `id`
    ///
    /// Quorum is counted against the signers active right now and the
    /// balance is read from the ledger right now. The ledger transfer runs
    /// before the state flip, so a failed transfer leaves the request
    /// pending and every balance unchanged.
    pub fn execute<L: AssetLedger + ?Sized>(
        &mut self,
        ctx: &CallContext,
        id: RequestId,
        ledger: &mut L,
    ) -> Result<TransferEvent, VaultError> {
        let now = ctx.timestamp;
        let index = self.live_request(id, now)?;
        let request = &self.requests[index];

        if !self.registry.meets_quorum(request.signatures()) {
            return Err(VaultError::QuorumNotMet {
                have: self.registry.count_active(request.signatures()),
                need: self.registry.threshold(),
            });
        }

        let asset = request.asset();
        let value = request.payload.value;
        let balance = ledger.balance_of(&asset, &self.address);
        if balance < value {
            return Err(VaultError::InsufficientBalance {
                have: balance,
                need: value,
            });
        }

        let transfer = Transfer {
            asset,
            from: self.address.clone(),
            to: request.payload.to.clone(),
            amount: value,
            memo: request.payload.data.clone(),
        };
        let receipt = ledger.transfer(&transfer, now).map_err(|e| {
            log::warn!(
                "Vault {}: transfer for request {} failed: {}",
                self.address,
                id,
                e
            );
            VaultError::TransferFailed(e)
        })?;

        self.requests[index].finish(RequestState::Executed, now);
        log::info!(
            "Vault {}: request {} executed by {} ({} {} to {})",
            self.address,
            id,
            ctx.caller,
            receipt.amount,
            receipt.asset,
            receipt.to
        );
        self.emit(
            now,
            VaultEventKind::RequestExecuted {
                id,
                transfer: receipt.clone(),
            },
        );

        Ok(receipt)
    }

    /// Withdraw a pending request (its creator or an administrator)
    pub fn cancel(&mut self, ctx: &CallContext, id: RequestId) -> Result<(), VaultError> {
        let index = self.index_of(id)?;
        if self.requests[index].creator != ctx.caller && !self.is_admin(&ctx.caller) {
            log::warn!(
                "Vault {}: {} tried to cancel request {}",
                self.address,
                ctx.caller,
                id
            );
            return Err(VaultError::Unauthorized {
                caller: ctx.caller.clone(),
                action: "cancel this request",
            });
        }

        self.live_request(id, ctx.timestamp)?;
        self.requests[index].finish(RequestState::Cancelled, ctx.timestamp);

        log::info!(
            "Vault {}: request {} cancelled by {}",
            self.address,
            id,
            ctx.caller
        );
        self.emit(
            ctx.timestamp,
            VaultEventKind::RequestCancelled {
                id,
                by: ctx.caller.clone(),
            },
        );
        Ok(())
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn require_admin(&self, ctx: &CallContext, action: &'static str) -> Result<(), VaultError> {
        if self.is_admin(&ctx.caller) {
            return Ok(());
        }
        log::warn!(
            "Vault {}: {} is not an administrator ({})",
            self.address,
            ctx.caller,
            action
        );
        Err(VaultError::Unauthorized {
            caller: ctx.caller.clone(),
            action,
        })
    }

    /// Current activation of the caller, if they are an active signer
    fn require_signer(
        &self,
        ctx: &CallContext,
        action: &'static str,
    ) -> Result<Activation, VaultError> {
        if let Some(activation) = self.registry.activation(&ctx.caller) {
            return Ok(activation);
        }
        log::warn!(
            "Vault {}: {} is not an active signer ({})",
            self.address,
            ctx.caller,
            action
        );
        Err(VaultError::Unauthorized {
            caller: ctx.caller.clone(),
            action,
        })
    }

    fn index_of(&self, id: RequestId) -> Result<usize, VaultError> {
        usize::try_from(id)
            .ok()
            .filter(|&i| i < self.requests.len())
            .ok_or(VaultError::RequestNotFound(id))
    }

    /// Resolve `id` to a pending, unexpired request
    ///
    /// A pending request found past its expiry is moved to `Expired` here and
    /// that transition is kept even though the caller gets an error.
    fn live_request(&mut self, id: RequestId, now: Timestamp) -> Result<usize, VaultError> {
        let index = self.index_of(id)?;
        let request = &mut self.requests[index];

        if !request.is_pending() {
            return Err(VaultError::NotPending {
                id,
                state: request.state,
            });
        }

        if request.is_expired_at(now) {
            request.finish(RequestState::Expired, now);
            log::warn!(
                "Vault {}: request {} expired at {}",
                self.address,
                id,
                request.expires_at
            );
            self.emit(now, VaultEventKind::RequestExpired { id });
            return Err(VaultError::Expired(id));
        }

        Ok(index)
    }

    fn emit(&mut self, timestamp: Timestamp, kind: VaultEventKind) {
        self.events.push(VaultEvent::new(timestamp, kind));
    }
}
