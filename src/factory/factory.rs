//! Vault factory
//!
//! Deploys vaults at deterministic addresses, gated by a pause switch and a
//! native deployment fee that only the factory administrator can change.

use crate::core::{Address, Amount, CallContext};
use crate::crypto::derive_address;
use crate::host::VaultHandle;
use crate::ledger::{AssetLedger, LedgerError, Transfer};
use crate::vault::{Vault, VaultConfig, VaultError, VaultParams};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Factory errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FactoryError {
    #[error("Unauthorized: {caller} may not {action}")]
    Unauthorized {
        caller: Address,
        action: &'static str,
    },
    #[error("Factory is paused")]
    Paused,
    #[error("Insufficient fee: paid {paid}, required {fee}")]
    InsufficientFee { paid: Amount, fee: Amount },
    #[error("Vault construction failed: {0}")]
    Vault(#[from] VaultError),
    #[error("Fee payment failed: {0}")]
    FeePayment(#[from] LedgerError),
}

/// Serializable factory settings and deployment record
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactoryState {
    pub address: Address,
    pub admin: Address,
    pub paused: bool,
    pub fee: Amount,
    /// Deployment counter for vault address generation
    pub nonce: u64,
    /// Policies applied to every vault this factory deploys
    pub vault_config: VaultConfig,
    /// Deployed vault addresses, oldest first
    pub deployed: Vec<Address>,
}

/// Deploys and tracks vaults
#[derive(Debug)]
pub struct VaultFactory {
    state: FactoryState,
    vaults: HashMap<Address, VaultHandle>,
}

impl VaultFactory {
    /// New factory: paused, free, administered by `admin`
    pub fn new(admin: impl Into<Address>) -> Self {
        Self::with_config(admin, VaultConfig::default())
    }

    /// New factory whose vaults use the given policies
    pub fn with_config(admin: impl Into<Address>, vault_config: VaultConfig) -> Self {
        let admin = admin.into();
        let address = derive_address("factory", admin.as_str(), 0);
        log::info!("Vault factory {} created (admin {})", address, admin);

        Self {
            state: FactoryState {
                address,
                admin,
                paused: true,
                fee: 0,
                nonce: 0,
                vault_config,
                deployed: Vec::new(),
            },
            vaults: HashMap::new(),
        }
    }

    /// Rebuild a factory from its saved settings and vault states
    pub fn from_parts(state: FactoryState, vaults: Vec<Vault>) -> Self {
        let vaults = vaults
            .into_iter()
            .map(|vault| (vault.address().clone(), Arc::new(Mutex::new(vault))))
            .collect();
        Self { state, vaults }
    }

    pub fn state(&self) -> &FactoryState {
        &self.state
    }

    pub fn address(&self) -> &Address {
        &self.state.address
    }

    pub fn admin(&self) -> &Address {
        &self.state.admin
    }

    pub fn paused(&self) -> bool {
        self.state.paused
    }

    pub fn fee(&self) -> Amount {
        self.state.fee
    }

    pub fn vault_config(&self) -> &VaultConfig {
        &self.state.vault_config
    }

    pub fn vault_count(&self) -> usize {
        self.state.deployed.len()
    }

    /// Address of the `index`-th deployed vault
    pub fn vault_address(&self, index: usize) -> Option<&Address> {
        self.state.deployed.get(index)
    }

    pub fn deployed(&self) -> &[Address] {
        &self.state.deployed
    }

    pub fn vault(&self, address: &Address) -> Option<VaultHandle> {
        self.vaults.get(address).cloned()
    }

    pub fn set_pause(&mut self, ctx: &CallContext, paused: bool) -> Result<(), FactoryError> {
        self.require_admin(ctx, "pause the factory")?;
        self.state.paused = paused;
        log::info!(
            "Factory {} {}",
            self.state.address,
            if paused { "paused" } else { "unpaused" }
        );
        Ok(())
    }

    pub fn update_fee(&mut self, ctx: &CallContext, fee: Amount) -> Result<(), FactoryError> {
        self.require_admin(ctx, "update the deployment fee")?;
        let old = std::mem::replace(&mut self.state.fee, fee);
        log::info!("Factory {} fee {} -> {}", self.state.address, old, fee);
        Ok(())
    }

    /// Deploy a new vault owned by `params.admin`
    ///
    /// `payment` is moved from the caller to the factory in native currency.
    /// Nothing changes unless the whole deployment succeeds.
    pub fn deploy_vault<L: AssetLedger + ?Sized>(
        &mut self,
        ctx: &CallContext,
        params: VaultParams,
        expiry_period: u64,
        payment: Amount,
        ledger: &mut L,
    ) -> Result<Address, FactoryError> {
        if self.state.paused {
            return Err(FactoryError::Paused);
        }
        if payment < self.state.fee {
            return Err(FactoryError::InsufficientFee {
                paid: payment,
                fee: self.state.fee,
            });
        }

        let address = derive_address("vault", self.state.address.as_str(), self.state.nonce);
        let config = VaultConfig {
            expiry_period,
            ..self.state.vault_config.clone()
        };
        let vault = Vault::new(address.clone(), params, config, ctx.timestamp)?;

        if payment > 0 {
            let transfer = Transfer::native(ctx.caller.clone(), self.state.address.clone(), payment);
            ledger.transfer(&transfer, ctx.timestamp)?;
        }

        self.state.nonce += 1;
        self.state.deployed.push(address.clone());
        self.vaults
            .insert(address.clone(), Arc::new(Mutex::new(vault)));

        log::info!(
            "Factory {} deployed vault #{} at {} for {}",
            self.state.address,
            self.state.deployed.len() - 1,
            address,
            ctx.caller
        );
        Ok(address)
    }

    fn require_admin(&self, ctx: &CallContext, action: &'static str) -> Result<(), FactoryError> {
        if ctx.caller == self.state.admin {
            return Ok(());
        }
        log::warn!(
            "Factory {}: {} is not the administrator ({})",
            self.state.address,
            ctx.caller,
            action
        );
        Err(FactoryError::Unauthorized {
            caller: ctx.caller.clone(),
            action,
        })
    }
}
