//! vaultctl: command-line interface for the multisig vault host
//!
//! State lives in a JSON snapshot under `--data-dir`; every invocation loads
//! it, runs one operation and saves it back.

use clap::{Parser, Subcommand};
use multisig_vault::cli::{self, AppState};
use multisig_vault::core::{Amount, RequestId};
use multisig_vault::vault::DEFAULT_EXPIRY_PERIOD;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "vaultctl")]
#[command(version = "0.1.0")]
#[command(about = "Multi-signature vaults with a deployment factory", long_about = None)]
struct Cli {
    /// Data directory for state storage
    #[arg(short, long, default_value = ".vault_data")]
    data_dir: PathBuf,

    /// Fixed host time in Unix seconds (defaults to the wall clock)
    #[arg(long, global = true)]
    now: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new host with a paused factory
    Init {
        /// Factory administrator
        #[arg(short, long)]
        admin: String,

        /// Overwrite existing state
        #[arg(long)]
        force: bool,
    },

    /// Factory operations
    Factory {
        #[command(subcommand)]
        action: FactoryCommands,
    },

    /// Credit funds to an address
    Fund {
        #[command(subcommand)]
        action: FundCommands,
    },

    /// Token operations
    Token {
        #[command(subcommand)]
        action: TokenCommands,
    },

    /// Vault operations
    Vault {
        /// Vault address
        #[arg(short, long)]
        vault: String,

        #[command(subcommand)]
        action: VaultCommands,
    },

    /// Show a balance
    Balance {
        /// Holder address
        #[arg(short, long)]
        address: String,

        /// Token address (native currency if omitted)
        #[arg(short, long)]
        token: Option<String>,
    },

    /// Export state to file
    Export {
        /// Output file path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Import state from file
    Import {
        /// Input file path
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Show storage statistics and available backups
    Backups,

    /// Roll state back to a saved backup
    RestoreBackup {
        /// Backup index (0 is the most recent)
        #[arg(default_value = "0")]
        index: usize,
    },
}

#[derive(Subcommand)]
enum FactoryCommands {
    /// Stop new deployments
    Pause {
        #[arg(long = "as")]
        caller: String,
    },

    /// Allow new deployments
    Unpause {
        #[arg(long = "as")]
        caller: String,
    },

    /// Set the deployment fee
    Fee {
        #[arg(long = "as")]
        caller: String,

        /// New fee in native units
        fee: Amount,
    },

    /// Deploy a new vault
    Deploy {
        #[arg(long = "as")]
        caller: String,

        /// Vault administrator (defaults to the caller)
        #[arg(long)]
        admin: Option<String>,

        /// Votes required to execute a request
        #[arg(short, long, default_value = "1")]
        threshold: usize,

        /// Additional signers (comma-separated)
        #[arg(short, long, value_delimiter = ',')]
        signers: Vec<String>,

        /// Request lifetime in seconds
        #[arg(short, long, default_value_t = DEFAULT_EXPIRY_PERIOD)]
        expiry: u64,

        /// Native payment toward the deployment fee
        #[arg(short, long, default_value = "0")]
        payment: Amount,
    },

    /// Show factory settings and deployed vaults
    List,
}

#[derive(Subcommand)]
enum FundCommands {
    /// Credit native currency (faucet)
    Native {
        #[arg(short, long)]
        to: String,

        #[arg(short, long)]
        amount: Amount,
    },

    /// Send tokens from a holder
    Token {
        /// Token address
        #[arg(long)]
        token: String,

        #[arg(short, long)]
        from: String,

        #[arg(short, long)]
        to: String,

        #[arg(short, long)]
        amount: Amount,
    },
}

#[derive(Subcommand)]
enum TokenCommands {
    /// Create a new token; the supply goes to the creator
    Create {
        #[arg(long = "as")]
        creator: String,

        #[arg(short, long)]
        name: String,

        #[arg(short, long)]
        symbol: String,

        #[arg(short, long, default_value = "18")]
        decimals: u8,

        #[arg(long)]
        supply: Amount,
    },

    /// Mint additional supply (creator only)
    Mint {
        #[arg(long = "as")]
        caller: String,

        #[arg(long)]
        token: String,

        #[arg(short, long)]
        to: String,

        #[arg(short, long)]
        amount: Amount,
    },

    /// List all tokens
    List,
}

#[derive(Subcommand)]
enum VaultCommands {
    /// Show vault details
    Info,

    /// Add a signer (administrator only)
    AddSigner {
        #[arg(long = "as")]
        caller: String,

        signer: String,
    },

    /// Remove a signer (administrator only)
    RemoveSigner {
        #[arg(long = "as")]
        caller: String,

        signer: String,
    },

    /// Change the quorum threshold (administrator only)
    Threshold {
        #[arg(long = "as")]
        caller: String,

        threshold: usize,
    },

    /// Open a transaction request
    Propose {
        #[arg(long = "as")]
        caller: String,

        /// Recipient
        #[arg(short, long)]
        to: String,

        /// Amount to transfer
        #[arg(long)]
        value: Amount,

        /// Token address (native currency if omitted)
        #[arg(long)]
        token: Option<String>,

        /// Hex-encoded call data
        #[arg(long)]
        data: Option<String>,
    },

    /// Vote for a request
    Vote {
        #[arg(long = "as")]
        caller: String,

        id: RequestId,
    },

    /// Withdraw a vote
    Revoke {
        #[arg(long = "as")]
        caller: String,

        id: RequestId,
    },

    /// Execute a request that has reached quorum
    Execute {
        #[arg(long = "as")]
        caller: String,

        id: RequestId,
    },

    /// Cancel a pending request (creator or administrator)
    Cancel {
        #[arg(long = "as")]
        caller: String,

        id: RequestId,
    },

    /// Show one request, or all of them
    Request { id: Option<RequestId> },

    /// Show the most recent events
    Events {
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let clock = cli::make_clock(cli.now);

    // Handle init command separately (doesn't need existing state)
    if let Commands::Init { admin, force } = &cli.command {
        return cli::cmd_init(&cli.data_dir, admin, clock, *force);
    }

    let mut state = AppState::load(cli.data_dir.clone(), clock.clone())?;

    match cli.command {
        Commands::Init { .. } => unreachable!(),

        Commands::Factory { action } => match action {
            FactoryCommands::Pause { caller } => cli::cmd_factory_pause(&state, &caller, true)?,
            FactoryCommands::Unpause { caller } => {
                cli::cmd_factory_pause(&state, &caller, false)?
            }
            FactoryCommands::Fee { caller, fee } => cli::cmd_factory_fee(&state, &caller, fee)?,
            FactoryCommands::Deploy {
                caller,
                admin,
                threshold,
                signers,
                expiry,
                payment,
            } => cli::cmd_factory_deploy(
                &state,
                &caller,
                admin.as_deref(),
                threshold,
                &signers,
                expiry,
                payment,
            )?,
            FactoryCommands::List => cli::cmd_factory_list(&state)?,
        },

        Commands::Fund { action } => match action {
            FundCommands::Native { to, amount } => cli::cmd_fund_native(&state, &to, amount)?,
            FundCommands::Token {
                token,
                from,
                to,
                amount,
            } => cli::cmd_fund_token(&state, &token, &from, &to, amount)?,
        },

        Commands::Token { action } => match action {
            TokenCommands::Create {
                creator,
                name,
                symbol,
                decimals,
                supply,
            } => cli::cmd_token_create(&state, &creator, &name, &symbol, decimals, supply)?,
            TokenCommands::Mint {
                caller,
                token,
                to,
                amount,
            } => cli::cmd_token_mint(&state, &token, &caller, &to, amount)?,
            TokenCommands::List => cli::cmd_token_list(&state)?,
        },

        Commands::Vault { vault, action } => match action {
            VaultCommands::Info => cli::cmd_vault_info(&state, &vault)?,
            VaultCommands::AddSigner { caller, signer } => {
                cli::cmd_vault_add_signer(&state, &vault, &caller, &signer)?
            }
            VaultCommands::RemoveSigner { caller, signer } => {
                cli::cmd_vault_remove_signer(&state, &vault, &caller, &signer)?
            }
            VaultCommands::Threshold { caller, threshold } => {
                cli::cmd_vault_threshold(&state, &vault, &caller, threshold)?
            }
            VaultCommands::Propose {
                caller,
                to,
                value,
                token,
                data,
            } => cli::cmd_vault_propose(
                &state,
                &vault,
                &caller,
                &to,
                value,
                token.as_deref(),
                data.as_deref(),
            )?,
            VaultCommands::Vote { caller, id } => cli::cmd_vault_vote(&state, &vault, &caller, id)?,
            VaultCommands::Revoke { caller, id } => {
                cli::cmd_vault_revoke(&state, &vault, &caller, id)?
            }
            VaultCommands::Execute { caller, id } => {
                cli::cmd_vault_execute(&state, &vault, &caller, id)?
            }
            VaultCommands::Cancel { caller, id } => {
                cli::cmd_vault_cancel(&state, &vault, &caller, id)?
            }
            VaultCommands::Request { id } => cli::cmd_vault_request(&state, &vault, id)?,
            VaultCommands::Events { limit } => cli::cmd_vault_events(&state, &vault, limit)?,
        },

        Commands::Balance { address, token } => {
            cli::cmd_balance(&state, &address, token.as_deref())?
        }

        Commands::Export { output } => cli::cmd_export(&state, &output)?,

        Commands::Import { input } => cli::cmd_import(&mut state, &input, clock)?,

        Commands::Backups => cli::cmd_backups(&state)?,

        Commands::RestoreBackup { index } => cli::cmd_restore_backup(&mut state, index, clock)?,
    }

    Ok(())
}
