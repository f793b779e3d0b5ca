//! Connection management for the ledger and the SQLite document store.
//!
//! The ledger pool is shared by every sync operation and bounded by
//! `ledger.max_connections`. Each query acquires a connection for its own
//! duration only; the pool reclaims it on every exit path. A SQLite ledger
//! is opened read-only and its journal mode is left as the owner set it.
//!
//! The document-store pool (SQLite backend) runs in WAL mode so the HTTP
//! server can serve reads while a sync writes.

use std::str::FromStr;
use std::sync::Arc;

use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use tracing::info;

use ledger_mirror_core::ledger::Ledger;

use crate::config::Config;
use crate::ledger_pg::PgLedger;
use crate::ledger_sqlite::SqliteLedger;

/// Connect to the configured ledger and wrap it in the matching backend.
///
/// A `sqlite:` URL opens an existing file read-only ([`SqliteLedger`]); any
/// other URL is treated as Postgres ([`PgLedger`]). Both pools are capped at
/// `ledger.max_connections`.
///
/// # Arguments
///
/// - `config`: loaded configuration; only the `[ledger]` section is read.
///
/// # Returns
///
/// The ledger behind an `Arc` so it can be shared with [`SyncService`](ledger_mirror_core::SyncService).
///
/// # Errors
///
/// Fails if the URL cannot be parsed, the SQLite file does not exist, or the
/// first connection cannot be established.
pub async fn connect_ledger(config: &Config) -> Result<Arc<dyn Ledger>> {
    let url = config.ledger.url();
    let max = config.ledger.max_connections;

    if url.starts_with("sqlite:") {
        let options = SqliteConnectOptions::from_str(url)
            .with_context(|| "Invalid sqlite ledger url")?
            .read_only(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(max)
            .connect_with(options)
            .await
            .with_context(|| "Failed to connect to sqlite ledger")?;
        info!(backend = "sqlite", max_connections = max, "ledger connected");
        return Ok(Arc::new(SqliteLedger::new(pool)));
    }

    let pool = PgPoolOptions::new()
        .max_connections(max)
        .connect(url)
        .await
        .with_context(|| "Failed to connect to postgres ledger")?;
    info!(backend = "postgres", max_connections = max, "ledger connected");
    Ok(Arc::new(PgLedger::new(pool)))
}

/// Open (creating if needed) the SQLite document-store database.
///
/// Creates the parent directory, opens the file in WAL mode, and returns a
/// pool of up to five connections. Tables are not created here; run
/// [`crate::migrate::run_migrations`] on the returned pool.
///
/// # Errors
///
/// Fails if the parent directory cannot be created or the file cannot be
/// opened.
pub async fn connect_store(path: &std::path::Path) -> Result<SqlitePool> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", path.display()))?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
        .with_context(|| format!("Failed to open document store {}", path.display()))?;

    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;
    use std::path::Path;
    use tempfile::TempDir;

    async fn journal_mode(path: &Path) -> String {
        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", path.display())).unwrap();
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .unwrap();
        let mode: String = sqlx::query_scalar("PRAGMA journal_mode")
            .fetch_one(&pool)
            .await
            .unwrap();
        pool.close().await;
        mode
    }

    async fn create_ledger(path: &Path) {
        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", path.display()))
            .unwrap()
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Delete);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .unwrap();
        sqlx::query(r#"CREATE TABLE "Item" (id TEXT PRIMARY KEY, institution_name TEXT)"#)
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query(
            r#"CREATE TABLE "Account" (
                id TEXT PRIMARY KEY, user_id TEXT, item_id TEXT, name TEXT, type TEXT,
                subtype TEXT, balance_current REAL, balance_available REAL,
                balance_limit REAL, iso_currency_code TEXT, updated_at TEXT
            )"#,
        )
        .execute(&pool)
        .await
        .unwrap();
        sqlx::query(
            r#"INSERT INTO "Account" (id, user_id, type, balance_current)
               VALUES ('a1', 'u1', 'depository', 10.5)"#,
        )
        .execute(&pool)
        .await
        .unwrap();
        pool.close().await;
    }

    fn ledger_config(path: &Path) -> Config {
        let text = format!(
            "[ledger]\nurl = \"sqlite:{}\"\n\n[store]\nbackend = \"memory\"\n",
            path.display()
        );
        parse_config(&text, None).unwrap()
    }

    #[tokio::test]
    async fn test_sqlite_ledger_keeps_journal_mode() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("ledger.sqlite");
        create_ledger(&path).await;
        assert_eq!(journal_mode(&path).await, "delete");

        let ledger = connect_ledger(&ledger_config(&path)).await.unwrap();
        let accounts = ledger.accounts("u1").await.unwrap();
        assert_eq!(accounts.len(), 1);
        drop(ledger);

        assert_eq!(journal_mode(&path).await, "delete");
    }

    #[tokio::test]
    async fn test_sqlite_ledger_is_not_created() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("missing.sqlite");

        assert!(connect_ledger(&ledger_config(&path)).await.is_err());
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_store_runs_in_wal_mode() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested/store.sqlite");

        let pool = connect_store(&path).await.unwrap();
        pool.close().await;

        assert_eq!(journal_mode(&path).await, "wal");
    }
}
