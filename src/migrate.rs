//! Schema migrations for the SQLite document store.
//!
//! Creates the two backing tables. Every statement is idempotent; running
//! `mirror init` twice is safe.
//!
//! | Table | Purpose |
//! |-------|---------|
//! | `collections` | One row per collection with its property list |
//! | `objects` | Mirrored documents keyed by `(collection, id)` |

use anyhow::{Context, Result};
use sqlx::SqlitePool;

/// Create the document-store tables if they are missing.
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS collections (
            name TEXT PRIMARY KEY,
            properties_json TEXT NOT NULL,
            created_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await
    .context("Failed to create collections table")?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS objects (
            collection TEXT NOT NULL,
            id TEXT NOT NULL,
            user_id TEXT NOT NULL,
            properties_json TEXT NOT NULL,
            updated_at INTEGER NOT NULL,
            PRIMARY KEY (collection, id),
            FOREIGN KEY (collection) REFERENCES collections(name)
        )
        "#,
    )
    .execute(pool)
    .await
    .context("Failed to create objects table")?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_objects_user ON objects(collection, user_id)")
        .execute(pool)
        .await?;

    Ok(())
}
