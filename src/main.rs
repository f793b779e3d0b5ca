//! # Ledger Mirror CLI (`mirror`)
//!
//! Mirrors users, accounts, and transactions from the relational ledger
//! into the document store, and inspects what has been mirrored.
//!
//! ## Usage
//!
//! ```bash
//! mirror --config ./config/mirror.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `mirror init` | Migrate the document store and create missing collections |
//! | `mirror sync <type> --user <id>` | Sync `all`, `transactions`, `accounts`, or `profile` |
//! | `mirror sync-batch <id>...` | Full sync for several users in order |
//! | `mirror status <id>` | Counts and last sync time for a user |
//! | `mirror fetch <kind> --user <id>` | Print mirrored documents |
//! | `mirror collections` | List document-store collections |
//! | `mirror serve` | Start the HTTP API |
//!
//! Results are printed to stdout as pretty JSON. Logs go to stderr.

use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;

use ledger_mirror::service::{self, SyncType};
use ledger_mirror::{config, logging, server};
use ledger_mirror_core::store::ensure_schema;
use ledger_mirror_core::EntityKind;

/// Ledger Mirror: keeps a document-store copy of relational financial records.
#[derive(Parser)]
#[command(name = "mirror", version)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/mirror.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Migrate the document store and create any missing collections.
    ///
    /// Idempotent. Does not touch the ledger.
    Init,

    /// Sync one user.
    Sync {
        /// What to sync: all, transactions, accounts, or profile.
        sync_type: SyncType,

        /// User id in the ledger.
        #[arg(long)]
        user: String,

        /// Maximum transactions to mirror (transactions only).
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Run a full sync for each user in order.
    SyncBatch {
        #[arg(required = true)]
        users: Vec<String>,
    },

    /// Show what the document store holds for a user.
    Status { user: String },

    /// Print mirrored documents of one kind.
    Fetch {
        /// transactions, accounts, or profile.
        kind: EntityKind,

        #[arg(long)]
        user: String,

        #[arg(long)]
        limit: Option<usize>,
    },

    /// List document-store collections.
    Collections,

    /// Start the HTTP API.
    Serve,
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init();

    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            let store = service::connect_store(&cfg).await?;
            let created = ensure_schema(store.as_ref()).await?;
            println!("initialized");
            for name in created {
                println!("  created collection {}", name);
            }
        }
        Commands::Sync {
            sync_type,
            user,
            limit,
        } => {
            let svc = service::connect(&cfg).await?;
            let report = service::run_sync(&svc, sync_type, &user, limit).await;
            print_json(&report)?;
        }
        Commands::SyncBatch { users } => {
            let svc = service::connect(&cfg).await?;
            let results = svc.sync_users(&users).await;
            print_json(&results)?;
        }
        Commands::Status { user } => {
            let svc = service::connect(&cfg).await?;
            print_json(&svc.sync_status(&user).await?)?;
        }
        Commands::Fetch { kind, user, limit } => {
            let svc = service::connect(&cfg).await?;
            print_json(&svc.fetch_documents(kind, &user, limit).await?)?;
        }
        Commands::Collections => {
            let svc = service::connect(&cfg).await?;
            print_json(&svc.list_collections().await?)?;
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}
