//! Fixed collection schemas and idempotent schema creation.
//!
//! Creation is create-if-absent only. An existing collection is never
//! inspected or migrated, so a changed property set must be applied to the
//! store by hand.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::models::EntityKind;

use super::DocumentStore;

/// Property types understood by every backend. Serialized names follow
/// Weaviate's `dataType` vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DataType {
    #[serde(rename = "text")]
    Text,
    #[serde(rename = "text[]")]
    TextArray,
    #[serde(rename = "number")]
    Number,
    #[serde(rename = "boolean")]
    Bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PropertySpec {
    pub name: &'static str,
    pub data_type: DataType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CollectionSchema {
    pub name: &'static str,
    pub properties: &'static [PropertySpec],
}

impl CollectionSchema {
    pub fn has_property(&self, name: &str) -> bool {
        self.properties.iter().any(|p| p.name == name)
    }

    pub fn property_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.properties.iter().map(|p| p.name)
    }
}

const fn prop(name: &'static str, data_type: DataType) -> PropertySpec {
    PropertySpec { name, data_type }
}

use DataType::{Bool, Number, Text, TextArray};

pub const TRANSACTION_SCHEMA: CollectionSchema = CollectionSchema {
    name: "Transaction",
    properties: &[
        prop("transaction_id", Text),
        prop("user_id", Text),
        prop("account_id", Text),
        prop("amount", Number),
        prop("name", Text),
        prop("category", TextArray),
        prop("date", Text),
        prop("pending", Bool),
        prop("merchant_name", Text),
        prop("payment_channel", Text),
        prop("location", Text),
        prop("month_year", Text),
        prop("description_blob", Text),
    ],
};

pub const ACCOUNT_SCHEMA: CollectionSchema = CollectionSchema {
    name: "Account",
    properties: &[
        prop("account_id", Text),
        prop("user_id", Text),
        prop("name", Text),
        prop("type", Text),
        prop("subtype", Text),
        prop("balance_current", Number),
        prop("balance_available", Number),
        prop("balance_limit", Number),
        prop("currency", Text),
        prop("institution_name", Text),
        prop("last_updated", Text),
    ],
};

pub const PROFILE_SCHEMA: CollectionSchema = CollectionSchema {
    name: "UserProfile",
    properties: &[
        prop("user_id", Text),
        prop("email", Text),
        prop("total_assets", Number),
        prop("total_liabilities", Number),
        prop("monthly_income", Number),
        prop("monthly_expenses", Number),
        prop("savings_rate", Number),
        prop("risk_tolerance", Text),
        prop("financial_goals", TextArray),
        prop("created_at", Text),
        prop("updated_at", Text),
    ],
};

pub fn schema_for(kind: EntityKind) -> &'static CollectionSchema {
    match kind {
        EntityKind::Transaction => &TRANSACTION_SCHEMA,
        EntityKind::Account => &ACCOUNT_SCHEMA,
        EntityKind::Profile => &PROFILE_SCHEMA,
    }
}

/// The fixed schema of a collection, looked up by collection name.
pub fn schema_named(name: &str) -> Option<&'static CollectionSchema> {
    EntityKind::ALL
        .into_iter()
        .map(schema_for)
        .find(|schema| schema.name == name)
}

/// Create any of the three collections that do not exist yet.
///
/// # Returns
///
/// The names of the collections created by this call; an empty list means
/// everything was already in place.
///
/// # Errors
///
/// Returns an error if the store cannot list its collections or rejects a
/// creation request.
pub async fn ensure_schema(store: &dyn DocumentStore) -> Result<Vec<&'static str>> {
    let existing = store
        .list_collections()
        .await
        .context("Failed to list document-store collections")?;

    let mut created = Vec::new();
    for kind in EntityKind::ALL {
        let schema = schema_for(kind);
        if existing.iter().any(|name| name == schema.name) {
            continue;
        }
        store
            .create_collection(schema)
            .await
            .with_context(|| format!("Failed to create collection {}", schema.name))?;
        info!(collection = schema.name, "created collection");
        created.push(schema.name);
    }

    Ok(created)
}
