//! In-memory [`DocumentStore`] implementation for tests and ephemeral runs.
//!
//! Collections live in a `HashMap` behind `std::sync::RwLock`; objects are
//! kept in insertion order so reads are stable. Writes are validated against
//! the collection's property set the way a schema-enforcing store would:
//! unknown properties or a missing `user_id` reject that one object.

use std::collections::HashMap;
use std::sync::RwLock;

use anyhow::{bail, Result};
use async_trait::async_trait;

use crate::identity::DocumentId;

use super::{
    check_object, BatchReport, CollectionSchema, DocumentStore, RejectedObject, StoredObject,
};

struct Collection {
    schema: CollectionSchema,
    objects: Vec<StoredObject>,
}

impl Collection {
    fn validate(&self, object: &StoredObject) -> Result<(), String> {
        check_object(self.schema.name, |p| self.schema.has_property(p), object)
    }

    fn upsert(&mut self, object: StoredObject) {
        match self.objects.iter_mut().find(|o| o.id == object.id) {
            Some(existing) => *existing = object,
            None => self.objects.push(object),
        }
    }
}

/// In-memory document store.
pub struct InMemoryStore {
    collections: RwLock<HashMap<String, Collection>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
        }
    }

    /// Total objects in a collection, across all users.
    pub fn len(&self, collection: &str) -> usize {
        self.collections
            .read()
            .unwrap()
            .get(collection)
            .map(|c| c.objects.len())
            .unwrap_or(0)
    }

    pub fn get(&self, collection: &str, id: &DocumentId) -> Option<StoredObject> {
        self.collections
            .read()
            .unwrap()
            .get(collection)
            .and_then(|c| c.objects.iter().find(|o| &o.id == id).cloned())
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn list_collections(&self) -> Result<Vec<String>> {
        let collections = self.collections.read().unwrap();
        Ok(collections.keys().cloned().collect())
    }

    async fn create_collection(&self, schema: &CollectionSchema) -> Result<()> {
        let mut collections = self.collections.write().unwrap();
        if collections.contains_key(schema.name) {
            bail!("collection {} already exists", schema.name);
        }
        collections.insert(
            schema.name.to_string(),
            Collection {
                schema: *schema,
                objects: Vec::new(),
            },
        );
        Ok(())
    }

    async fn upsert_batch(
        &self,
        collection: &str,
        objects: &[StoredObject],
    ) -> Result<BatchReport> {
        let mut collections = self.collections.write().unwrap();
        let target = match collections.get_mut(collection) {
            Some(c) => c,
            None => bail!("collection {} does not exist", collection),
        };

        let mut report = BatchReport::default();
        for object in objects {
            match target.validate(object) {
                Ok(()) => {
                    target.upsert(object.clone());
                    report.accepted += 1;
                }
                Err(message) => report.rejected.push(RejectedObject {
                    id: object.id,
                    message,
                }),
            }
        }
        Ok(report)
    }

    async fn fetch_by_user(
        &self,
        collection: &str,
        user_id: &str,
        limit: Option<usize>,
    ) -> Result<Vec<StoredObject>> {
        let collections = self.collections.read().unwrap();
        let source = match collections.get(collection) {
            Some(c) => c,
            None => bail!("collection {} does not exist", collection),
        };
        Ok(source
            .objects
            .iter()
            .filter(|o| o.user_id() == Some(user_id))
            .take(limit.unwrap_or(usize::MAX))
            .cloned()
            .collect())
    }

    async fn count_by_user(&self, collection: &str, user_id: &str) -> Result<usize> {
        let collections = self.collections.read().unwrap();
        let source = match collections.get(collection) {
            Some(c) => c,
            None => bail!("collection {} does not exist", collection),
        };
        Ok(source
            .objects
            .iter()
            .filter(|o| o.user_id() == Some(user_id))
            .count())
    }
}
