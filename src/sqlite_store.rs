//! SQLite-backed [`DocumentStore`] implementation.
//!
//! Collections are rows in `collections` holding their property list;
//! documents are rows in `objects` holding their properties as JSON. A batch
//! upsert runs inside one SQL transaction and replaces by `(collection, id)`.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::{Row, SqlitePool};

use ledger_mirror_core::store::{
    check_object, BatchReport, CollectionSchema, DocumentStore, RejectedObject, StoredObject,
};
use ledger_mirror_core::DocumentId;

pub struct SqliteDocumentStore {
    pool: SqlitePool,
}

impl SqliteDocumentStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn property_names(&self, collection: &str) -> Result<Vec<String>> {
        let raw: Option<String> =
            sqlx::query_scalar("SELECT properties_json FROM collections WHERE name = ?")
                .bind(collection)
                .fetch_optional(&self.pool)
                .await?;
        match raw {
            Some(json) => serde_json::from_str(&json)
                .with_context(|| format!("Corrupt property list for collection {}", collection)),
            None => bail!("collection {} does not exist", collection),
        }
    }
}

fn object_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<StoredObject> {
    let id: String = row.try_get("id")?;
    let json: String = row.try_get("properties_json")?;
    let properties: Map<String, Value> = serde_json::from_str(&json)
        .with_context(|| format!("Corrupt properties for object {}", id))?;
    Ok(StoredObject {
        id: id
            .parse::<DocumentId>()
            .with_context(|| format!("Invalid object id {}", id))?,
        properties,
    })
}

#[async_trait]
impl DocumentStore for SqliteDocumentStore {
    async fn list_collections(&self) -> Result<Vec<String>> {
        let names: Vec<String> = sqlx::query_scalar("SELECT name FROM collections ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        Ok(names)
    }

    async fn create_collection(&self, schema: &CollectionSchema) -> Result<()> {
        let names: Vec<&str> = schema.property_names().collect();
        let result = sqlx::query(
            "INSERT INTO collections (name, properties_json, created_at) VALUES (?, ?, ?)",
        )
        .bind(schema.name)
        .bind(serde_json::to_string(&names)?)
        .bind(chrono::Utc::now().timestamp())
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                bail!("collection {} already exists", schema.name)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn upsert_batch(
        &self,
        collection: &str,
        objects: &[StoredObject],
    ) -> Result<BatchReport> {
        let names = self.property_names(collection).await?;
        let now = chrono::Utc::now().timestamp();

        let mut report = BatchReport::default();
        let mut tx = self.pool.begin().await?;

        for object in objects {
            if let Err(message) =
                check_object(collection, |p| names.iter().any(|n| n == p), object)
            {
                report.rejected.push(RejectedObject {
                    id: object.id,
                    message,
                });
                continue;
            }

            sqlx::query(
                r#"
                INSERT INTO objects (collection, id, user_id, properties_json, updated_at)
                VALUES (?, ?, ?, ?, ?)
                ON CONFLICT(collection, id) DO UPDATE SET
                    user_id = excluded.user_id,
                    properties_json = excluded.properties_json,
                    updated_at = excluded.updated_at
                "#,
            )
            .bind(collection)
            .bind(object.id.to_string())
            .bind(object.user_id().unwrap_or_default())
            .bind(Value::Object(object.properties.clone()).to_string())
            .bind(now)
            .execute(&mut *tx)
            .await?;

            report.accepted += 1;
        }

        tx.commit().await?;
        Ok(report)
    }

    async fn fetch_by_user(
        &self,
        collection: &str,
        user_id: &str,
        limit: Option<usize>,
    ) -> Result<Vec<StoredObject>> {
        let limit = limit
            .map(|l| i64::try_from(l).unwrap_or(i64::MAX))
            .unwrap_or(-1);
        let rows = sqlx::query(
            r#"
            SELECT id, properties_json FROM objects
            WHERE collection = ? AND user_id = ?
            ORDER BY rowid
            LIMIT ?
            "#,
        )
        .bind(collection)
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(object_from_row).collect()
    }

    async fn count_by_user(&self, collection: &str, user_id: &str) -> Result<usize> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM objects WHERE collection = ? AND user_id = ?",
        )
        .bind(collection)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count as usize)
    }
}
