use clap::{Parser, Subcommand};
use obsidian_types::constants::DEFAULT_RPC_ENDPOINT;
use std::path::PathBuf;

mod commands;

/// Obsidian wallet command-line interface.
#[derive(Parser)]
#[command(name = "obsidian-wallet-cli")]
#[command(about = "Command-line wallet for the Obsidian network")]
#[command(version)]
struct Cli {
    /// Node RPC endpoint (host:port or URL). Overrides the endpoint stored
    /// in the wallet file for this run.
    #[arg(long, env = "OBSIDIAN_RPC")]
    rpc: Option<String>,

    /// Wallet file path.
    #[arg(long, env = "OBSIDIAN_WALLET")]
    wallet_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new wallet.
    Create,

    /// Restore a wallet from a 24-word recovery phrase read from stdin.
    Restore,

    /// Derive a new receiving address.
    NewAddress {
        /// Derive a shielded (zobs) address instead of a transparent one.
        #[arg(long)]
        shielded: bool,
    },

    /// List wallet addresses.
    Addresses,

    /// Show balances for every address, or for one address.
    Balance {
        address: Option<String>,
    },

    /// Send funds from one of this wallet's addresses.
    Send {
        #[arg(long)]
        from: String,

        #[arg(long)]
        to: String,

        /// Amount in OBS (e.g., "1.5" or "0.001").
        #[arg(long)]
        amount: String,

        /// Memo (encrypted whenever a shielded address is involved).
        #[arg(long, default_value = "")]
        memo: String,
    },

    /// Show transaction history.
    History {
        /// Maximum number of entries to show.
        #[arg(long, default_value = "25")]
        limit: usize,
    },

    /// Show the recovery phrase.
    Seed {
        /// Confirm that the phrase may be printed to this terminal.
        #[arg(long)]
        confirm: bool,
    },

    /// Show node status.
    Status,
}

/// Application context shared across commands.
pub struct AppContext {
    /// Endpoint given on the command line, if any.
    pub rpc_override: Option<String>,
    pub wallet_path: PathBuf,
}

impl AppContext {
    fn from_cli(cli: &Cli) -> Self {
        let wallet_path = cli
            .wallet_file
            .clone()
            .unwrap_or_else(|| default_wallet_dir().join("wallet.json"));

        Self {
            rpc_override: cli.rpc.clone(),
            wallet_path,
        }
    }

    /// Endpoint for a newly created or restored wallet.
    pub fn rpc_endpoint(&self) -> String {
        self.rpc_override
            .clone()
            .unwrap_or_else(|| DEFAULT_RPC_ENDPOINT.to_string())
    }
}

fn default_wallet_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("obsidian")
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let ctx = AppContext::from_cli(&cli);
    log::debug!("wallet file: {}", ctx.wallet_path.display());

    let result = match cli.command {
        Commands::Create => commands::create_wallet(&ctx).await,
        Commands::Restore => commands::restore_wallet(&ctx).await,
        Commands::NewAddress { shielded } => commands::new_address(&ctx, shielded).await,
        Commands::Addresses => commands::show_addresses(&ctx).await,
        Commands::Balance { address } => commands::show_balance(&ctx, address.as_deref()).await,
        Commands::Send {
            from,
            to,
            amount,
            memo,
        } => commands::send(&ctx, &from, &to, &amount, &memo).await,
        Commands::History { limit } => commands::show_history(&ctx, limit).await,
        Commands::Seed { confirm } => commands::show_seed(&ctx, confirm).await,
        Commands::Status => commands::show_status(&ctx).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
