//! Signer registry
//!
//! The authoritative set of active signers and the quorum threshold. Quorum
//! is always counted against the set as it is *now*: a vote cast by an
//! identity that has since been removed does not count, and it does not
//! come back if that identity is added again later.
//!
//! Every time a signer is activated it receives a fresh activation number.
//! Votes carry the activation they were cast under; only votes whose
//! activation matches the voter's current one count toward quorum.

use crate::core::Address;
use crate::vault::error::VaultError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Sequence number handed out each time a signer becomes active
pub type Activation = u64;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SignerRegistry {
    /// Active signers and their current activation
    signers: HashMap<Address, Activation>,
    threshold: usize,
    /// Next activation number to hand out
    next_activation: Activation,
}

impl SignerRegistry {
    /// Build a registry, rejecting duplicates and out-of-range thresholds
    pub fn new(initial: Vec<Address>, threshold: usize) -> Result<Self, VaultError> {
        let mut registry = Self {
            signers: HashMap::with_capacity(initial.len()),
            threshold,
            next_activation: 0,
        };
        for signer in initial {
            registry.add(signer)?;
        }

        check_threshold(threshold, registry.count())?;

        Ok(registry)
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    pub fn count(&self) -> usize {
        self.signers.len()
    }

    pub fn is_active(&self, identity: &Address) -> bool {
        self.signers.contains_key(identity)
    }

    /// Current activation of an active signer
    pub fn activation(&self, identity: &Address) -> Option<Activation> {
        self.signers.get(identity).copied()
    }

    /// Active signers in address order
    pub fn signers(&self) -> Vec<Address> {
        let mut signers: Vec<Address> = self.signers.keys().cloned().collect();
        signers.sort();
        signers
    }

    pub fn add(&mut self, identity: Address) -> Result<(), VaultError> {
        if self.signers.contains_key(&identity) {
            return Err(VaultError::AlreadySigner(identity));
        }
        self.signers.insert(identity, self.next_activation);
        self.next_activation += 1;
        Ok(())
    }

    /// Deactivate a signer; refuses to drop below the threshold
    pub fn remove(&mut self, identity: &Address) -> Result<(), VaultError> {
        if !self.signers.contains_key(identity) {
            return Err(VaultError::NotASigner(identity.clone()));
        }
        check_threshold(self.threshold, self.signers.len() - 1)?;
        self.signers.remove(identity);
        Ok(())
    }

    /// Replace the threshold; returns the previous value
    pub fn set_threshold(&mut self, threshold: usize) -> Result<usize, VaultError> {
        check_threshold(threshold, self.signers.len())?;
        Ok(std::mem::replace(&mut self.threshold, threshold))
    }

    /// Number of `votes` cast by signers during their current activation
    pub fn count_active<'a, I>(&self, votes: I) -> usize
    where
        I: IntoIterator<Item = (&'a Address, &'a Activation)>,
    {
        votes
            .into_iter()
            .filter(|(voter, cast_under)| self.activation(voter) == Some(**cast_under))
            .count()
    }

    pub fn meets_quorum<'a, I>(&self, votes: I) -> bool
    where
        I: IntoIterator<Item = (&'a Address, &'a Activation)>,
    {
        self.count_active(votes) >= self.threshold
    }
}

fn check_threshold(threshold: usize, signers: usize) -> Result<(), VaultError> {
    if threshold == 0 || threshold > signers {
        return Err(VaultError::InvalidThreshold { threshold, signers });
    }
    Ok(())
}
