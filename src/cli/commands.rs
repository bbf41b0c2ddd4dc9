//! CLI commands for the vault host
//!
//! Every handler runs against a [`Host`] restored from disk; mutating
//! handlers persist the new state before returning.

use crate::core::{Address, Amount, Asset, Clock, ManualClock, RequestId, SystemClock, Timestamp};
use crate::host::Host;
use crate::ledger::{AssetLedger, Transfer};
use crate::storage::Storage;
use crate::vault::{RequestPayload, TransactionRequest, VaultParams};
use chrono::{TimeZone, Utc};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Result type for CLI operations
pub type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Application state
pub struct AppState {
    pub host: Host,
    pub storage: Storage,
    pub data_dir: PathBuf,
}

impl AppState {
    /// Restore the host saved under `data_dir`
    pub fn load(data_dir: PathBuf, clock: Arc<dyn Clock>) -> CliResult<Self> {
        let storage = Storage::in_dir(data_dir.clone())?;

        if !storage.exists() {
            return Err(format!(
                "no vault state in {:?}; run `vaultctl init --admin <identity>` first",
                data_dir
            )
            .into());
        }

        let host = Host::restore(storage.load()?, clock)?;
        Ok(Self {
            host,
            storage,
            data_dir,
        })
    }

    /// Save the current state
    pub fn save(&self) -> CliResult<()> {
        self.storage.save(&self.host.snapshot())?;
        Ok(())
    }

    /// Save, then hand back `result`
    ///
    /// Used after operations that may change state even when they fail
    /// (lazy expiry). The operation's own error is reported before any
    /// save error; when both fail the save error is logged.
    pub fn save_after<T, E>(&self, result: Result<T, E>) -> CliResult<T>
    where
        E: Into<Box<dyn std::error::Error>>,
    {
        let saved = self.save();
        match (result, saved) {
            (Ok(value), Ok(())) => Ok(value),
            (Ok(_), Err(save_error)) => Err(save_error),
            (Err(error), Ok(())) => Err(error.into()),
            (Err(error), Err(save_error)) => {
                log::error!("Failed to save state: {}", save_error);
                Err(error.into())
            }
        }
    }
}

/// Fixed clock when `now` is given, wall clock otherwise
pub fn make_clock(now: Option<Timestamp>) -> Arc<dyn Clock> {
    match now {
        Some(now) => Arc::new(ManualClock::new(now)),
        None => Arc::new(SystemClock),
    }
}

fn format_time(timestamp: Timestamp) -> String {
    i64::try_from(timestamp)
        .ok()
        .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
        .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| timestamp.to_string())
}

fn asset_for(token: Option<&str>) -> Asset {
    Asset::from_token(token.map(Address::from))
}

// =============================================================================
// Setup
// =============================================================================

/// Create a fresh state with a paused factory administered by `admin`
pub fn cmd_init(data_dir: &Path, admin: &str, clock: Arc<dyn Clock>, force: bool) -> CliResult<()> {
    let storage = Storage::in_dir(data_dir)?;

    if storage.exists() && !force {
        println!("⚠️  Vault state already exists at {:?}", data_dir);
        println!("   Use --force to reinitialize (this will delete existing data)");
        return Ok(());
    }

    let host = Host::with_admin(admin, clock);
    storage.save(&host.snapshot())?;

    let (address, paused) = host.factory_view(|f| (f.address().clone(), f.paused()));
    println!("✅ Vault host initialized!");
    println!("   📁 Data directory: {:?}", data_dir);
    println!("   🏭 Factory: {}", address);
    println!("   👤 Admin: {}", admin);
    println!("   ⏸️  Paused: {}", paused);

    Ok(())
}

/// Export state to file
pub fn cmd_export(state: &AppState, path: &Path) -> CliResult<()> {
    crate::storage::save_to_file(&state.host.snapshot(), path)?;
    println!("📦 State exported to {:?}", path);
    Ok(())
}

/// Import state from file
pub fn cmd_import(state: &mut AppState, path: &Path, clock: Arc<dyn Clock>) -> CliResult<()> {
    let snapshot = crate::storage::load_from_file(path)?;
    let vaults = snapshot.vault_count();

    state.host = Host::restore(snapshot, clock)?;
    state.save()?;

    println!("📥 State imported from {:?}", path);
    println!("   Vaults: {}", vaults);
    Ok(())
}

/// Show storage statistics and the available backups
pub fn cmd_backups(state: &AppState) -> CliResult<()> {
    let stats = state.storage.stats()?;
    println!("🗄️  Storage: {:?}", stats.data_dir);
    println!("   State file: {} bytes", stats.file_size);
    println!("   Backups: {}", stats.backup_count);

    for index in state.storage.list_backups() {
        match state.storage.restore_backup(index) {
            Ok(snapshot) => println!(
                "   [{}] saved {} ({} vault(s))",
                index,
                format_time(snapshot.saved_at),
                snapshot.vault_count()
            ),
            Err(e) => println!("   [{}] unreadable: {}", index, e),
        }
    }
    Ok(())
}

/// Roll the state back to backup `index` (0 is the most recent)
pub fn cmd_restore_backup(state: &mut AppState, index: usize, clock: Arc<dyn Clock>) -> CliResult<()> {
    let snapshot = state.storage.restore_backup(index)?;
    let saved_at = snapshot.saved_at;

    state.host = Host::restore(snapshot, clock)?;
    state.save()?;

    println!("⏪ Restored backup {} (saved {})", index, format_time(saved_at));
    Ok(())
}

// =============================================================================
// Factory
// =============================================================================

pub fn cmd_factory_pause(state: &AppState, caller: &str, paused: bool) -> CliResult<()> {
    state
        .host
        .with_factory(&caller.into(), |f, ctx| f.set_pause(ctx, paused))?;
    state.save()?;

    if paused {
        println!("⏸️  Factory paused");
    } else {
        println!("▶️  Factory unpaused");
    }
    Ok(())
}

pub fn cmd_factory_fee(state: &AppState, caller: &str, fee: Amount) -> CliResult<()> {
    state
        .host
        .with_factory(&caller.into(), |f, ctx| f.update_fee(ctx, fee))?;
    state.save()?;

    println!("💸 Deployment fee set to {}", fee);
    Ok(())
}

pub fn cmd_factory_deploy(
    state: &AppState,
    caller: &str,
    admin: Option<&str>,
    threshold: usize,
    signers: &[String],
    expiry_period: u64,
    payment: Amount,
) -> CliResult<()> {
    let params = VaultParams::new(admin.unwrap_or(caller), threshold)
        .with_signers(signers.iter().map(String::as_str));
    let address = state
        .host
        .deploy_vault(&caller.into(), params, expiry_period, payment)?;
    state.save()?;

    let description = state.host.vault_view(&address, |v, _| v.description())?;
    println!("🔐 Vault deployed!");
    println!("   📍 Address: {}", address);
    println!("   ✍️  Policy: {}", description);
    println!("   ⏳ Expiry: {}s", expiry_period);
    Ok(())
}

pub fn cmd_factory_list(state: &AppState) -> CliResult<()> {
    let (factory, paused, fee, admin, deployed) = state.host.factory_view(|f| {
        (
            f.address().clone(),
            f.paused(),
            f.fee(),
            f.admin().clone(),
            f.deployed().to_vec(),
        )
    });

    println!("🏭 Factory {}", factory);
    println!("   ├─ Admin: {}", admin);
    println!("   ├─ Paused: {}", paused);
    println!("   ├─ Fee: {}", fee);
    println!("   └─ Vaults: {}", deployed.len());

    for (index, address) in deployed.iter().enumerate() {
        let description = state.host.vault_view(address, |v, _| v.description())?;
        println!("      #{} {} ({})", index, address, description);
    }
    Ok(())
}

// =============================================================================
// Ledger
// =============================================================================

/// Credit native currency out of thin air (faucet)
pub fn cmd_fund_native(state: &AppState, to: &str, amount: Amount) -> CliResult<()> {
    let balance = state
        .host
        .with_ledger(|ledger, _| ledger.credit_native(&to.into(), amount))?;
    state.save()?;

    println!("💰 Credited {} to {} (balance {})", amount, to, balance);
    Ok(())
}

/// Move tokens from a holder to another address
pub fn cmd_fund_token(
    state: &AppState,
    token: &str,
    from: &str,
    to: &str,
    amount: Amount,
) -> CliResult<()> {
    let transfer = Transfer {
        asset: asset_for(Some(token)),
        from: from.into(),
        to: to.into(),
        amount,
        memo: Vec::new(),
    };
    state
        .host
        .with_ledger(|ledger, now| ledger.transfer(&transfer, now))?;
    state.save()?;

    println!("🪙 Sent {} {} from {} to {}", amount, token, from, to);
    Ok(())
}

pub fn cmd_token_create(
    state: &AppState,
    creator: &str,
    name: &str,
    symbol: &str,
    decimals: u8,
    supply: Amount,
) -> CliResult<()> {
    let address = state.host.with_ledger(|ledger, now| {
        ledger.create_token(
            name.to_string(),
            symbol.to_string(),
            decimals,
            supply,
            &creator.into(),
            now,
        )
    })?;
    state.save()?;

    println!("🪙 Token created!");
    println!("   📍 Address: {}", address);
    println!("   🏷️  {} ({})", name, symbol);
    println!("   📊 Supply: {} to {}", supply, creator);
    Ok(())
}

pub fn cmd_token_mint(
    state: &AppState,
    token: &str,
    caller: &str,
    to: &str,
    amount: Amount,
) -> CliResult<()> {
    let supply = state
        .host
        .with_ledger(|ledger, _| ledger.mint(&token.into(), &caller.into(), &to.into(), amount))?;
    state.save()?;

    println!("🪙 Minted {} to {} (supply {})", amount, to, supply);
    Ok(())
}

pub fn cmd_token_list(state: &AppState) -> CliResult<()> {
    let tokens: Vec<(Address, String, String, Amount)> = state.host.with_ledger(|ledger, _| {
        ledger
            .tokens()
            .into_iter()
            .map(|t| {
                (
                    t.address.clone(),
                    t.name().to_string(),
                    t.symbol().to_string(),
                    t.total_supply(),
                )
            })
            .collect()
    });

    println!("🪙 Tokens: {}", tokens.len());
    for (address, name, symbol, supply) in tokens {
        println!("   └─ {} {} ({}) supply {}", address, name, symbol, supply);
    }
    Ok(())
}

pub fn cmd_balance(state: &AppState, holder: &str, token: Option<&str>) -> CliResult<()> {
    let asset = asset_for(token);
    let balance = state
        .host
        .with_ledger(|ledger, _| ledger.balance_of(&asset, &holder.into()));

    println!("💰 {}: {} {}", holder, balance, asset);
    Ok(())
}

// =============================================================================
// Vaults
// =============================================================================

pub fn cmd_vault_info(state: &AppState, vault: &str) -> CliResult<()> {
    let address = Address::from(vault);
    let now = state.host.now();

    state.host.vault_view(&address, |v, ledger| {
        let pending = v
            .pending_requests()
            .filter(|r| !r.is_expired_at(now))
            .count();

        println!("🔐 Vault {}", v.address());
        println!("   ├─ Policy: {}", v.description());
        println!("   ├─ Signers: {}", join(&v.signers()));
        println!("   ├─ Admins: {}", join(&v.admins()));
        println!("   ├─ Expiry: {}s", v.expiry_period());
        println!("   ├─ Created: {}", format_time(v.created_at()));
        println!("   ├─ Requests: {} ({} open)", v.request_count(), pending);
        println!("   └─ Balance: {}", v.balance(ledger, &Asset::Native));
    })?;
    Ok(())
}

pub fn cmd_vault_add_signer(state: &AppState, vault: &str, caller: &str, signer: &str) -> CliResult<()> {
    state
        .host
        .with_vault(&vault.into(), &caller.into(), |v, ctx| {
            v.add_signer(ctx, signer.into())
        })?;
    state.save()?;

    println!("✅ {} added as signer", signer);
    Ok(())
}

pub fn cmd_vault_remove_signer(
    state: &AppState,
    vault: &str,
    caller: &str,
    signer: &str,
) -> CliResult<()> {
    state
        .host
        .with_vault(&vault.into(), &caller.into(), |v, ctx| {
            v.remove_signer(ctx, &signer.into())
        })?;
    state.save()?;

    println!("✅ {} removed from signers", signer);
    Ok(())
}

pub fn cmd_vault_threshold(state: &AppState, vault: &str, caller: &str, threshold: usize) -> CliResult<()> {
    let description = state
        .host
        .with_vault(&vault.into(), &caller.into(), |v, ctx| {
            v.update_threshold(ctx, threshold)?;
            Ok(v.description())
        })?;
    state.save()?;

    println!("✅ Threshold updated ({})", description);
    Ok(())
}

pub fn cmd_vault_propose(
    state: &AppState,
    vault: &str,
    caller: &str,
    to: &str,
    value: Amount,
    token: Option<&str>,
    data: Option<&str>,
) -> CliResult<()> {
    let mut payload = match token {
        Some(token) => RequestPayload::token(to, value, token),
        None => RequestPayload::native(to, value),
    };
    if let Some(data) = data {
        payload = payload.with_data(hex::decode(data.trim_start_matches("0x"))?);
    }

    let id = state
        .host
        .with_vault(&vault.into(), &caller.into(), |v, ctx| {
            v.create_request(ctx, payload)
        })?;
    state.save()?;

    println!("📝 Request {} created", id);
    println!("   {} {} to {}", value, asset_for(token), to);
    Ok(())
}

pub fn cmd_vault_vote(state: &AppState, vault: &str, caller: &str, id: RequestId) -> CliResult<()> {
    let result = state
        .host
        .with_vault(&vault.into(), &caller.into(), |v, ctx| {
            v.vote_for(ctx, id)?;
            Ok((v.approvals(id).unwrap_or(0), v.threshold()))
        });
    let (approvals, threshold) = state.save_after(result)?;
    println!("✍️  {} voted for request {} ({}/{})", caller, id, approvals, threshold);
    if approvals >= threshold {
        println!("   Quorum reached; the request can be executed");
    }
    Ok(())
}

pub fn cmd_vault_revoke(state: &AppState, vault: &str, caller: &str, id: RequestId) -> CliResult<()> {
    let result = state
        .host
        .with_vault(&vault.into(), &caller.into(), |v, ctx| v.revoke_vote(ctx, id));
    state.save_after(result)?;

    println!("↩️  {} revoked their vote on request {}", caller, id);
    Ok(())
}

pub fn cmd_vault_execute(state: &AppState, vault: &str, caller: &str, id: RequestId) -> CliResult<()> {
    let result = state.host.execute(&vault.into(), &caller.into(), id);
    let receipt = state.save_after(result)?;

    println!("🚀 Request {} executed", id);
    println!("   {} {} to {}", receipt.amount, receipt.asset, receipt.to);
    Ok(())
}

pub fn cmd_vault_cancel(state: &AppState, vault: &str, caller: &str, id: RequestId) -> CliResult<()> {
    let result = state
        .host
        .with_vault(&vault.into(), &caller.into(), |v, ctx| v.cancel(ctx, id));
    state.save_after(result)?;

    println!("🛑 Request {} cancelled", id);
    Ok(())
}

pub fn cmd_vault_request(state: &AppState, vault: &str, id: Option<RequestId>) -> CliResult<()> {
    let now = state.host.now();
    let requests: Vec<TransactionRequest> = state.host.vault_view(&vault.into(), |v, _| match id {
        Some(id) => v.request(id).into_iter().cloned().collect(),
        None => v.requests().to_vec(),
    })?;

    if requests.is_empty() {
        println!("📭 No requests");
        return Ok(());
    }

    for request in &requests {
        print_request(request, now);
    }
    Ok(())
}

pub fn cmd_vault_events(state: &AppState, vault: &str, limit: usize) -> CliResult<()> {
    let events = state.host.vault_view(&vault.into(), |v, _| {
        let skip = v.events().len().saturating_sub(limit);
        v.events()[skip..].to_vec()
    })?;

    println!("📜 Last {} event(s):", events.len());
    for event in events {
        println!("   {} | {:?}", format_time(event.timestamp), event.kind);
    }
    Ok(())
}

fn print_request(request: &TransactionRequest, now: Timestamp) {
    println!("📝 Request {}", request.id);
    println!("   ├─ State: {}", request.effective_state(now));
    println!("   ├─ Creator: {}", request.creator);
    println!(
        "   ├─ Transfer: {} {} to {}",
        request.payload.value,
        request.asset(),
        request.payload.to
    );
    if !request.payload.data.is_empty() {
        println!("   ├─ Data: 0x{}", hex::encode(&request.payload.data));
    }
    println!("   ├─ Votes: {}", join(request.signatures().keys()));
    println!("   ├─ Created: {}", format_time(request.created_at));
    println!("   └─ Expires: {}", format_time(request.expires_at));
}

fn join<'a>(addresses: impl IntoIterator<Item = &'a Address>) -> String {
    let names: Vec<&str> = addresses.into_iter().map(Address::as_str).collect();
    if names.is_empty() {
        "-".to_string()
    } else {
        names.join(", ")
    }
}
