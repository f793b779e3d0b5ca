//! Startup wiring: config → ledger pool + document store → [`SyncService`].
//!
//! Everything here runs once at process start. Failures are fatal and
//! propagate to the caller, unlike per-entity sync failures which the
//! service turns into status-tagged results.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use ledger_mirror_core::store::memory::InMemoryStore;
use ledger_mirror_core::store::DocumentStore;
use ledger_mirror_core::{CompositeResult, SyncOutcome, SyncService};

use crate::config::{Config, StoreBackend};
use crate::db;
use crate::migrate;
use crate::sqlite_store::SqliteDocumentStore;
use crate::weaviate::WeaviateStore;

/// Build the configured document store, running backend migrations.
pub async fn connect_store(config: &Config) -> Result<Arc<dyn DocumentStore>> {
    match config.store.backend {
        StoreBackend::Sqlite => {
            let path = config
                .store
                .path
                .as_deref()
                .context("store.path must be set when backend is 'sqlite'")?;
            let pool = db::connect_store(path).await?;
            migrate::run_migrations(&pool).await?;
            info!(backend = "sqlite", path = %path.display(), "document store ready");
            Ok(Arc::new(SqliteDocumentStore::new(pool)))
        }
        StoreBackend::Weaviate => {
            let store = WeaviateStore::from_config(&config.store)?;
            info!(backend = "weaviate", "document store ready");
            Ok(Arc::new(store))
        }
        StoreBackend::Memory => {
            info!(backend = "memory", "document store ready");
            Ok(Arc::new(InMemoryStore::new()))
        }
    }
}

/// Connect both sides, ensure the collections exist, and return the service.
///
/// # Errors
///
/// Fails if the ledger or the document store cannot be opened, or if
/// collection creation is refused by the store.
pub async fn connect(config: &Config) -> Result<SyncService> {
    let ledger = db::connect_ledger(config).await?;
    let store = connect_store(config).await?;

    let service =
        SyncService::new(ledger, store).with_transaction_limit(config.sync.transaction_limit);

    let created = service
        .ensure_schema()
        .await
        .context("Failed to initialize document-store schema")?;
    if !created.is_empty() {
        info!(collections = ?created, "schema initialized");
    }

    Ok(service)
}

/// Which part of a user's data to mirror.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncType {
    All,
    Transactions,
    Accounts,
    Profile,
}

impl FromStr for SyncType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(SyncType::All),
            "transactions" => Ok(SyncType::Transactions),
            "accounts" => Ok(SyncType::Accounts),
            "profile" => Ok(SyncType::Profile),
            other => Err(format!(
                "invalid sync_type '{}'. Must be one of: all, transactions, accounts, profile",
                other
            )),
        }
    }
}

impl fmt::Display for SyncType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SyncType::All => "all",
            SyncType::Transactions => "transactions",
            SyncType::Accounts => "accounts",
            SyncType::Profile => "profile",
        })
    }
}

/// Either a composite result or a single entity outcome.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum SyncReport {
    All(CompositeResult),
    Entity(SyncOutcome),
}

/// Dispatch one sync request. `limit` only applies to transactions.
pub async fn run_sync(
    service: &SyncService,
    sync_type: SyncType,
    user_id: &str,
    limit: Option<usize>,
) -> SyncReport {
    match sync_type {
        SyncType::All => SyncReport::All(service.sync_all(user_id).await),
        SyncType::Transactions => {
            SyncReport::Entity(service.sync_transactions(user_id, limit).await)
        }
        SyncType::Accounts => SyncReport::Entity(service.sync_accounts(user_id).await),
        SyncType::Profile => SyncReport::Entity(service.sync_profile(user_id).await),
    }
}
