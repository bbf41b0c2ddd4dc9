//! End-to-end scenarios through the host: factory deployment, funding,
//! voting, execution and persistence.

use multisig_vault::core::{Address, Amount, Asset, ManualClock};
use multisig_vault::factory::FactoryError;
use multisig_vault::host::{Host, HostError};
use multisig_vault::ledger::{AssetLedger, LedgerError, Transfer};
use multisig_vault::storage::{Storage, StorageConfig};
use multisig_vault::vault::{RequestPayload, RequestState, VaultError, VaultEventKind, VaultParams};
use std::sync::Arc;

const START: u64 = 1_700_000_000;
const EXPIRY: u64 = 100;

fn addr(s: &str) -> Address {
    Address::from(s)
}

struct Fixture {
    host: Host,
    clock: Arc<ManualClock>,
    vault: Address,
}

/// {alice, bob, carol} with threshold 2, funded with 100 native
fn fixture() -> Fixture {
    let clock = Arc::new(ManualClock::new(START));
    let host = Host::with_admin("governance", clock.clone());
    host.with_factory(&addr("governance"), |f, ctx| f.set_pause(ctx, false))
        .unwrap();

    let params = VaultParams::new("alice", 2).with_signers(["bob", "carol"]);
    let vault = host.deploy_vault(&addr("alice"), params, EXPIRY, 0).unwrap();
    host.with_ledger(|ledger, _| ledger.credit_native(&vault, 100))
        .unwrap();

    Fixture { host, clock, vault }
}

impl Fixture {
    fn propose(&self, caller: &str, to: &str, value: Amount) -> Result<u64, HostError> {
        self.host.with_vault(&self.vault, &addr(caller), |v, ctx| {
            v.create_request(ctx, RequestPayload::native(to, value))
        })
    }

    fn vote(&self, caller: &str, id: u64) -> Result<(), HostError> {
        self.host
            .with_vault(&self.vault, &addr(caller), |v, ctx| v.vote_for(ctx, id))
    }

    fn state_of(&self, id: u64) -> Option<RequestState> {
        self.host
            .vault_view(&self.vault, |v, _| v.request(id).map(|r| r.state))
            .unwrap()
    }

    fn native(&self, holder: &Address) -> Amount {
        self.host
            .with_ledger(|ledger, _| ledger.balance_of(&Asset::Native, holder))
    }
}

#[test]
fn two_of_three_transfer() {
    let f = fixture();

    let id = f.propose("alice", "dave", 5).unwrap();
    f.vote("alice", id).unwrap();
    f.clock.advance(10);
    f.vote("bob", id).unwrap();
    f.host.execute(&f.vault, &addr("alice"), id).unwrap();

    assert_eq!(f.native(&f.vault), 95);
    assert_eq!(f.native(&addr("dave")), 5);
    assert_eq!(f.state_of(id), Some(RequestState::Executed));

    assert_eq!(
        f.host.execute(&f.vault, &addr("alice"), id),
        Err(HostError::Vault(VaultError::NotPending {
            id,
            state: RequestState::Executed
        }))
    );
    assert_eq!(f.native(&f.vault), 95);
}

#[test]
fn outsider_is_refused() {
    let f = fixture();

    assert!(matches!(
        f.propose("dave", "dave", 5),
        Err(HostError::Vault(VaultError::Unauthorized { .. }))
    ));

    let id = f.propose("alice", "dave", 5).unwrap();
    assert!(matches!(
        f.vote("dave", id),
        Err(HostError::Vault(VaultError::Unauthorized { .. }))
    ));
}

#[test]
fn late_vote_expires_request() {
    let f = fixture();
    let id = f.propose("alice", "dave", 5).unwrap();

    f.clock.advance(EXPIRY + 1);
    assert_eq!(f.vote("bob", id), Err(HostError::Vault(VaultError::Expired(id))));
    assert_eq!(f.state_of(id), Some(RequestState::Expired));
}

#[test]
fn removed_signer_loses_weight() {
    let f = fixture();
    let id = f.propose("alice", "dave", 5).unwrap();
    f.vote("alice", id).unwrap();
    f.vote("bob", id).unwrap();

    f.host
        .with_vault(&f.vault, &addr("alice"), |v, ctx| {
            v.remove_signer(ctx, &addr("bob"))
        })
        .unwrap();

    assert_eq!(
        f.host.execute(&f.vault, &addr("alice"), id),
        Err(HostError::Vault(VaultError::QuorumNotMet { have: 1, need: 2 }))
    );
    assert_eq!(f.state_of(id), Some(RequestState::Pending));

    // Carol's vote restores quorum
    f.vote("carol", id).unwrap();
    f.host.execute(&f.vault, &addr("carol"), id).unwrap();
    assert_eq!(f.native(&addr("dave")), 5);
}

#[test]
fn readded_signer_needs_fresh_vote() {
    let f = fixture();
    let id = f.propose("alice", "dave", 5).unwrap();
    f.vote("alice", id).unwrap();
    f.vote("bob", id).unwrap();

    f.host
        .with_vault(&f.vault, &addr("alice"), |v, ctx| {
            v.remove_signer(ctx, &addr("bob"))?;
            v.add_signer(ctx, addr("bob"))
        })
        .unwrap();

    assert_eq!(
        f.host.execute(&f.vault, &addr("carol"), id),
        Err(HostError::Vault(VaultError::QuorumNotMet { have: 1, need: 2 }))
    );
    assert_eq!(f.native(&f.vault), 100);
    assert_eq!(f.state_of(id), Some(RequestState::Pending));

    f.vote("bob", id).unwrap();
    f.host.execute(&f.vault, &addr("carol"), id).unwrap();
    assert_eq!(f.native(&addr("dave")), 5);
}

#[test]
fn failed_transfer_is_atomic() {
    let f = fixture();
    let own = f.vault.clone();
    let id = f.propose("alice", own.as_str(), 5).unwrap();
    f.vote("alice", id).unwrap();
    f.vote("bob", id).unwrap();

    assert_eq!(
        f.host.execute(&f.vault, &addr("alice"), id),
        Err(HostError::Vault(VaultError::TransferFailed(
            LedgerError::SelfTransfer
        )))
    );
    assert_eq!(f.state_of(id), Some(RequestState::Pending));
    assert_eq!(f.native(&f.vault), 100);
}

#[test]
fn token_vault_flow() {
    let f = fixture();
    let token = f
        .host
        .with_ledger(|ledger, now| {
            ledger.create_token(
                "Vault Dollar".to_string(),
                "VUSD".to_string(),
                6,
                1_000_000,
                &addr("treasury"),
                now,
            )
        })
        .unwrap();
    let asset = Asset::Token(token.clone());
    f.host
        .with_ledger(|ledger, now| {
            ledger.transfer(
                &Transfer {
                    asset: asset.clone(),
                    from: addr("treasury"),
                    to: f.vault.clone(),
                    amount: 10_000,
                    memo: Vec::new(),
                },
                now,
            )
        })
        .unwrap();

    let id = f
        .host
        .with_vault(&f.vault, &addr("bob"), |v, ctx| {
            v.create_request(ctx, RequestPayload::token("erin", 2_500, token.clone()))
        })
        .unwrap();
    f.vote("bob", id).unwrap();
    f.vote("carol", id).unwrap();
    let receipt = f.host.execute(&f.vault, &addr("bob"), id).unwrap();

    assert_eq!(receipt.asset, asset);
    let (vault_tokens, vault_native) = f
        .host
        .vault_view(&f.vault, |v, ledger| {
            (v.balance(ledger, &asset), v.balance(ledger, &Asset::Native))
        })
        .unwrap();
    assert_eq!(vault_tokens, 7_500);
    assert_eq!(vault_native, 100);
}

#[test]
fn factory_gates_deployment() {
    let clock = Arc::new(ManualClock::new(START));
    let host = Host::with_admin("governance", clock);

    assert_eq!(
        host.deploy_vault(&addr("alice"), VaultParams::new("alice", 1), EXPIRY, 0),
        Err(HostError::Factory(FactoryError::Paused))
    );

    host.with_factory(&addr("governance"), |f, ctx| {
        f.set_pause(ctx, false)?;
        f.update_fee(ctx, 1)
    })
    .unwrap();
    host.with_ledger(|ledger, _| ledger.credit_native(&addr("alice"), 1))
        .unwrap();

    let vault = host
        .deploy_vault(&addr("alice"), VaultParams::new("alice", 1), EXPIRY, 1)
        .unwrap();

    let (first, factory_address) =
        host.factory_view(|f| (f.vault_address(0).cloned(), f.address().clone()));
    assert_eq!(first, Some(vault.clone()));
    assert_eq!(
        host.with_ledger(|ledger, _| ledger.native_balance(&factory_address)),
        1
    );

    let is_admin = host
        .vault_view(&vault, |v, _| v.is_admin(&addr("alice")))
        .unwrap();
    assert!(is_admin);
}

#[test]
fn state_survives_restart() {
    let temp_dir = tempfile::tempdir().unwrap();
    let storage = Storage::new(StorageConfig {
        data_dir: temp_dir.path().to_path_buf(),
        ..Default::default()
    })
    .unwrap();

    let f = fixture();
    let id = f.propose("alice", "dave", 5).unwrap();
    f.vote("alice", id).unwrap();
    storage.save(&f.host.snapshot()).unwrap();

    let clock = Arc::new(ManualClock::new(START + 50));
    let host = Host::restore(storage.load().unwrap(), clock).unwrap();
    host.with_vault(&f.vault, &addr("carol"), |v, ctx| v.vote_for(ctx, id))
        .unwrap();
    host.execute(&f.vault, &addr("carol"), id).unwrap();

    let kinds: Vec<VaultEventKind> = host
        .vault_view(&f.vault, |v, _| v.events().iter().map(|e| e.kind.clone()).collect())
        .unwrap();
    assert!(matches!(
        kinds.last(),
        Some(VaultEventKind::RequestExecuted { .. })
    ));
    assert_eq!(
        host.with_ledger(|ledger, _| ledger.native_balance(&addr("dave"))),
        5
    );
}
