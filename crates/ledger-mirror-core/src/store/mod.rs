//! Document-store abstraction.
//!
//! The [`DocumentStore`] trait covers what the sync pipeline and its
//! read-side consumers need from the secondary store: collection listing
//! and creation, batched upsert-by-identifier, and equality lookup on
//! `user_id`. Backends (in-memory, SQLite, Weaviate) are interchangeable.
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod memory;
pub mod schema;

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::identity::DocumentId;

pub use schema::{
    ensure_schema, schema_for, schema_named, CollectionSchema, DataType, PropertySpec,
};

/// A document as the store sees it: identifier plus flat properties.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredObject {
    pub id: DocumentId,
    pub properties: Map<String, Value>,
}

impl StoredObject {
    pub fn user_id(&self) -> Option<&str> {
        self.properties.get("user_id").and_then(Value::as_str)
    }
}

/// Check an object against a collection's property set.
///
/// Returns the refusal message for unknown properties or a missing
/// `user_id`, in the wording a schema-enforcing store would use.
pub fn check_object(
    collection: &str,
    has_property: impl Fn(&str) -> bool,
    object: &StoredObject,
) -> Result<(), String> {
    if let Some(unknown) = object.properties.keys().find(|key| !has_property(key.as_str())) {
        return Err(format!(
            "no such prop with name '{}' found in class '{}'",
            unknown, collection
        ));
    }
    match object.user_id() {
        Some(user) if !user.is_empty() => Ok(()),
        _ => Err("user_id is required".to_string()),
    }
}

/// A document the store refused during a batch write.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RejectedObject {
    pub id: DocumentId,
    pub message: String,
}

/// Outcome of one batch write.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchReport {
    /// Documents written (created or replaced).
    pub accepted: usize,
    /// Documents the store refused, with the store's reason.
    pub rejected: Vec<RejectedObject>,
}

impl BatchReport {
    pub fn is_complete(&self) -> bool {
        self.rejected.is_empty()
    }
}

/// Abstract document-store backend.
///
/// # Operations
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`list_collections`](DocumentStore::list_collections) | Names of existing collections |
/// | [`create_collection`](DocumentStore::create_collection) | Create a collection with a fixed property set |
/// | [`upsert_batch`](DocumentStore::upsert_batch) | Create-or-replace many documents by id |
/// | [`fetch_by_user`](DocumentStore::fetch_by_user) | Documents whose `user_id` equals a value |
/// | [`count_by_user`](DocumentStore::count_by_user) | Number of such documents |
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn list_collections(&self) -> Result<Vec<String>>;

    /// Create a collection. Fails if the collection already exists.
    async fn create_collection(&self, schema: &CollectionSchema) -> Result<()>;

    /// Write all objects in one batch, replacing any with the same id.
    ///
    /// Returns `Err` only when the batch as a whole could not be attempted;
    /// per-object refusals are reported in [`BatchReport::rejected`].
    async fn upsert_batch(&self, collection: &str, objects: &[StoredObject])
        -> Result<BatchReport>;

    async fn fetch_by_user(
        &self,
        collection: &str,
        user_id: &str,
        limit: Option<usize>,
    ) -> Result<Vec<StoredObject>>;

    async fn count_by_user(&self, collection: &str, user_id: &str) -> Result<usize>;
}
