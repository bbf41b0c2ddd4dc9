//! Vault configuration and construction parameters

use crate::core::Address;
use crate::vault::error::VaultError;
use serde::{Deserialize, Serialize};

/// Default request lifetime: 7 days
pub const DEFAULT_EXPIRY_PERIOD: u64 = 7 * 24 * 60 * 60;

/// Who may open a new transaction request
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProposalPolicy {
    /// Only currently active signers
    #[default]
    ActiveSigners,
    /// Any identity; voting still requires an active signer
    ///
    /// Requests and events are never pruned, so under this policy an
    /// outsider can grow a vault's request arena and event log without
    /// bound. Only enable it where the host rate-limits or charges callers.
    Anyone,
}

/// What a repeated vote from the same signer does
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RevotePolicy {
    /// Accept silently; the vote set is unchanged
    #[default]
    Idempotent,
    /// Fail with `AlreadyVoted`
    Reject,
}

/// Per-vault policy, fixed for the vault's lifetime
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultConfig {
    /// Seconds a request stays open after creation
    pub expiry_period: u64,
    pub proposal_policy: ProposalPolicy,
    pub revote_policy: RevotePolicy,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            expiry_period: DEFAULT_EXPIRY_PERIOD,
            proposal_policy: ProposalPolicy::default(),
            revote_policy: RevotePolicy::default(),
        }
    }
}

impl VaultConfig {
    /// Default policies with the given expiry period
    pub fn with_expiry(expiry_period: u64) -> Self {
        Self {
            expiry_period,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), VaultError> {
        if self.expiry_period == 0 {
            return Err(VaultError::InvalidExpiryPeriod(self.expiry_period));
        }
        Ok(())
    }
}

/// Initial signer set and quorum for a new vault
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultParams {
    /// Initial administrator; always becomes a signer
    pub admin: Address,
    /// Required affirmative votes
    pub threshold: usize,
    /// Additional signers besides the admin
    #[serde(default)]
    pub signers: Vec<Address>,
}

impl VaultParams {
    /// Single-signer vault owned by `admin`
    pub fn new(admin: impl Into<Address>, threshold: usize) -> Self {
        Self {
            admin: admin.into(),
            threshold,
            signers: Vec::new(),
        }
    }

    pub fn with_signers<I, A>(mut self, signers: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<Address>,
    {
        self.signers.extend(signers.into_iter().map(Into::into));
        self
    }

    /// Admin first, then the extra signers in the given order
    pub fn initial_signers(&self) -> Vec<Address> {
        let mut all = Vec::with_capacity(self.signers.len() + 1);
        all.push(self.admin.clone());
        all.extend(self.signers.iter().cloned());
        all
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = VaultConfig::default();
        assert_eq!(config.expiry_period, DEFAULT_EXPIRY_PERIOD);
        assert_eq!(config.proposal_policy, ProposalPolicy::ActiveSigners);
        assert_eq!(config.revote_policy, RevotePolicy::Idempotent);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_expiry_rejected() {
        assert_eq!(
            VaultConfig::with_expiry(0).validate(),
            Err(VaultError::InvalidExpiryPeriod(0))
        );
    }

    #[test]
    fn test_initial_signers_put_admin_first() {
        let params = VaultParams::new("admin", 2).with_signers(["bob", "carol"]);
        let signers = params.initial_signers();

        assert_eq!(
            signers,
            vec![
                Address::from("admin"),
                Address::from("bob"),
                Address::from("carol")
            ]
        );
    }
}
