//! Vault host
//!
//! Owns the factory, the ledger and the clock. Every call is stamped with the
//! host's time and runs while holding the target vault's lock, so operations
//! on one vault are applied one at a time. Locks are always taken in the
//! order factory, vault, ledger.

use crate::core::{Address, Amount, CallContext, Clock, RequestId, Timestamp};
use crate::factory::{FactoryError, VaultFactory};
use crate::host::state::HostState;
use crate::ledger::{Ledger, LedgerError, TransferEvent};
use crate::vault::{Vault, VaultError, VaultParams};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;

/// Shared handle to one vault; hold the lock for the whole operation
pub type VaultHandle = Arc<Mutex<Vault>>;

/// Host errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    #[error("Vault not found: {0}")]
    VaultNotFound(Address),
    #[error("{0}")]
    Vault(#[from] VaultError),
    #[error("{0}")]
    Factory(#[from] FactoryError),
    #[error("{0}")]
    Ledger(#[from] LedgerError),
    #[error("Invalid state: {0}")]
    InvalidState(String),
}

pub struct Host {
    factory: Mutex<VaultFactory>,
    ledger: Mutex<Ledger>,
    clock: Arc<dyn Clock>,
}

impl Host {
    pub fn new(factory: VaultFactory, ledger: Ledger, clock: Arc<dyn Clock>) -> Self {
        Self {
            factory: Mutex::new(factory),
            ledger: Mutex::new(ledger),
            clock,
        }
    }

    /// Empty ledger and a fresh (paused) factory administered by `admin`
    pub fn with_admin(admin: impl Into<Address>, clock: Arc<dyn Clock>) -> Self {
        Self::new(VaultFactory::new(admin), Ledger::new(), clock)
    }

    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    fn context(&self, caller: &Address) -> CallContext {
        CallContext::new(caller.clone(), self.clock.now())
    }

    fn handle(&self, vault: &Address) -> Result<VaultHandle, HostError> {
        self.factory
            .lock()
            .vault(vault)
            .ok_or_else(|| HostError::VaultNotFound(vault.clone()))
    }

    // =========================================================================
    // Factory
    // =========================================================================

    pub fn deploy_vault(
        &self,
        caller: &Address,
        params: VaultParams,
        expiry_period: u64,
        payment: Amount,
    ) -> Result<Address, HostError> {
        let mut factory = self.factory.lock();
        let mut ledger = self.ledger.lock();
        let ctx = self.context(caller);
        Ok(factory.deploy_vault(&ctx, params, expiry_period, payment, &mut *ledger)?)
    }

    /// Run an operation against the factory as `caller`
    pub fn with_factory<T>(
        &self,
        caller: &Address,
        op: impl FnOnce(&mut VaultFactory, &CallContext) -> Result<T, FactoryError>,
    ) -> Result<T, HostError> {
        let mut factory = self.factory.lock();
        let ctx = self.context(caller);
        Ok(op(&mut factory, &ctx)?)
    }

    pub fn factory_view<T>(&self, op: impl FnOnce(&VaultFactory) -> T) -> T {
        op(&self.factory.lock())
    }

    // =========================================================================
    // Vaults
    // =========================================================================

    /// Run an operation against one vault as `caller`
    pub fn with_vault<T>(
        &self,
        vault: &Address,
        caller: &Address,
        op: impl FnOnce(&mut Vault, &CallContext) -> Result<T, VaultError>,
    ) -> Result<T, HostError> {
        let handle = self.handle(vault)?;
        let mut vault = handle.lock();
        let ctx = self.context(caller);
        Ok(op(&mut vault, &ctx)?)
    }

    /// Execute a request, moving funds out of the vault on the ledger
    pub fn execute(
        &self,
        vault: &Address,
        caller: &Address,
        id: RequestId,
    ) -> Result<TransferEvent, HostError> {
        let handle = self.handle(vault)?;
        let mut vault = handle.lock();
        let mut ledger = self.ledger.lock();
        let ctx = self.context(caller);
        Ok(vault.execute(&ctx, id, &mut *ledger)?)
    }

    /// Read a vault together with the ledger
    pub fn vault_view<T>(
        &self,
        vault: &Address,
        op: impl FnOnce(&Vault, &Ledger) -> T,
    ) -> Result<T, HostError> {
        let handle = self.handle(vault)?;
        let vault = handle.lock();
        let ledger = self.ledger.lock();
        Ok(op(&vault, &ledger))
    }

    // =========================================================================
    // Ledger
    // =========================================================================

    /// Run an operation against the ledger at the host's current time
    pub fn with_ledger<T>(&self, op: impl FnOnce(&mut Ledger, Timestamp) -> T) -> T {
        let mut ledger = self.ledger.lock();
        op(&mut ledger, self.clock.now())
    }

    // =========================================================================
    // Snapshots
    // =========================================================================

    /// Consistent copy of everything the host owns
    pub fn snapshot(&self) -> HostState {
        let factory = self.factory.lock();
        let mut vaults = Vec::with_capacity(factory.vault_count());
        for address in factory.deployed() {
            if let Some(handle) = factory.vault(address) {
                vaults.push(handle.lock().clone());
            }
        }
        let ledger = self.ledger.lock().clone();

        HostState {
            factory: factory.state().clone(),
            vaults,
            ledger,
            saved_at: self.clock.now(),
        }
    }

    /// Rebuild a host from a snapshot
    pub fn restore(state: HostState, clock: Arc<dyn Clock>) -> Result<Self, HostError> {
        let deployed: HashSet<&Address> = state.factory.deployed.iter().collect();
        if deployed.len() != state.factory.deployed.len() {
            return Err(HostError::InvalidState(
                "duplicate vault address in deployment list".to_string(),
            ));
        }
        if state.vaults.len() != deployed.len()
            || state.vaults.iter().any(|v| !deployed.contains(v.address()))
        {
            return Err(HostError::InvalidState(format!(
                "deployment list names {} vault(s), snapshot holds {}",
                deployed.len(),
                state.vaults.len()
            )));
        }

        log::debug!(
            "Restoring host: {} vault(s), saved at {}",
            state.vaults.len(),
            state.saved_at
        );
        let factory = VaultFactory::from_parts(state.factory, state.vaults);
        Ok(Self::new(factory, state.ledger, clock))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Asset, ManualClock};
    use crate::vault::{RequestPayload, RequestState};

    fn addr(s: &str) -> Address {
        Address::from(s)
    }

    /// Host with an unpaused factory and a funded 2-of-3 vault
    fn setup() -> (Host, Arc<ManualClock>, Address) {
        let clock = Arc::new(ManualClock::new(1_000));
        let host = Host::with_admin("governance", clock.clone());
        host.with_factory(&addr("governance"), |f, ctx| f.set_pause(ctx, false))
            .unwrap();

        let params = VaultParams::new("alice", 2).with_signers(["bob", "carol"]);
        let vault = host.deploy_vault(&addr("alice"), params, 100, 0).unwrap();
        host.with_ledger(|ledger, _| ledger.credit_native(&vault, 50))
            .unwrap();

        (host, clock, vault)
    }

    fn approved_request(host: &Host, vault: &Address, value: Amount) -> RequestId {
        let id = host
            .with_vault(vault, &addr("alice"), |v, ctx| {
                v.create_request(ctx, RequestPayload::native("dave", value))
            })
            .unwrap();
        for signer in ["alice", "bob"] {
            host.with_vault(vault, &addr(signer), |v, ctx| v.vote_for(ctx, id))
                .unwrap();
        }
        id
    }

    #[test]
    fn test_calls_are_stamped_with_host_time() {
        let (host, clock, vault) = setup();
        clock.set(1_234);

        let id = host
            .with_vault(&vault, &addr("alice"), |v, ctx| {
                v.create_request(ctx, RequestPayload::native("dave", 5))
            })
            .unwrap();

        let created_at = host
            .vault_view(&vault, |v, _| v.request(id).map(|r| r.created_at))
            .unwrap();
        assert_eq!(created_at, Some(1_234));
    }

    #[test]
    fn test_unknown_vault() {
        let (host, _, _) = setup();
        let missing = addr("0xmissing");

        assert_eq!(
            host.with_vault(&missing, &addr("alice"), |v, _| Ok(v.threshold())),
            Err(HostError::VaultNotFound(missing.clone()))
        );
        assert!(host.execute(&missing, &addr("alice"), 0).is_err());
    }

    #[test]
    fn test_execute_through_host() {
        let (host, _, vault) = setup();
        let id = approved_request(&host, &vault, 20);

        host.execute(&vault, &addr("carol"), id).unwrap();

        let (balance, state) = host
            .vault_view(&vault, |v, ledger| {
                (v.balance(ledger, &Asset::Native), v.request(id).map(|r| r.state))
            })
            .unwrap();
        assert_eq!(balance, 30);
        assert_eq!(state, Some(RequestState::Executed));
    }

    #[test]
    fn test_expiry_follows_host_clock() {
        let (host, clock, vault) = setup();
        let id = approved_request(&host, &vault, 20);

        clock.advance(100);
        assert_eq!(
            host.execute(&vault, &addr("alice"), id),
            Err(HostError::Vault(VaultError::Expired(id)))
        );
    }

    #[test]
    fn test_concurrent_execution_pays_once() {
        let (host, _, vault) = setup();
        let id = approved_request(&host, &vault, 20);

        let successes = std::thread::scope(|scope| {
            let workers: Vec<_> = (0..8)
                .map(|_| scope.spawn(|| host.execute(&vault, &addr("bob"), id).is_ok()))
                .collect();
            workers
                .into_iter()
                .filter_map(|w| w.join().ok())
                .filter(|ok| *ok)
                .count()
        });

        assert_eq!(successes, 1);
        let balance = host
            .vault_view(&vault, |v, ledger| v.balance(ledger, &Asset::Native))
            .unwrap();
        assert_eq!(balance, 30);
    }

    #[test]
    fn test_concurrent_votes_all_land() {
        let (host, _, vault) = setup();
        host.with_vault(&vault, &addr("alice"), |v, ctx| {
            v.add_signer(ctx, addr("dave"))?;
            v.add_signer(ctx, addr("erin"))
        })
        .unwrap();
        let id = host
            .with_vault(&vault, &addr("alice"), |v, ctx| {
                v.create_request(ctx, RequestPayload::native("dave", 5))
            })
            .unwrap();

        std::thread::scope(|scope| {
            for signer in ["alice", "bob", "carol", "dave", "erin"] {
                let host = &host;
                let vault = &vault;
                scope.spawn(move || {
                    host.with_vault(vault, &addr(signer), |v, ctx| v.vote_for(ctx, id))
                });
            }
        });

        let approvals = host.vault_view(&vault, |v, _| v.approvals(id)).unwrap();
        assert_eq!(approvals, Some(5));
    }

    #[test]
    fn test_snapshot_and_restore() {
        let (host, clock, vault) = setup();
        let id = approved_request(&host, &vault, 20);

        let state = host.snapshot();
        let restored = Host::restore(state, clock).unwrap();

        restored.execute(&vault, &addr("alice"), id).unwrap();
        let balance = restored
            .vault_view(&vault, |v, ledger| v.balance(ledger, &Asset::Native))
            .unwrap();
        assert_eq!(balance, 30);

        // The snapshotted host is untouched
        let untouched = host
            .vault_view(&vault, |v, ledger| v.balance(ledger, &Asset::Native))
            .unwrap();
        assert_eq!(untouched, 50);
    }

    #[test]
    fn test_restore_rejects_inconsistent_snapshot() {
        let (host, clock, _) = setup();
        let mut state = host.snapshot();
        state.vaults.clear();

        assert!(matches!(
            Host::restore(state, clock),
            Err(HostError::InvalidState(_))
        ));
    }
}
