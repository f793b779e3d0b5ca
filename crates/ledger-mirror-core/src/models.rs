//! Record and document shapes used throughout Ledger Mirror.
//!
//! `*Row` types are what the relational system of record hands back;
//! `*Document` types are the denormalized projections written to the
//! document store. [`Document`] is the tagged union the sync pipeline
//! carries between projection and the store.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::identity::{document_id, DocumentId};

/// The three mirrored entity kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Transaction,
    Account,
    Profile,
}

impl EntityKind {
    pub const ALL: [EntityKind; 3] = [
        EntityKind::Transaction,
        EntityKind::Account,
        EntityKind::Profile,
    ];

    /// Prefix mixed into the identity seed (`"{prefix}_{natural_key}"`).
    pub fn key_prefix(&self) -> &'static str {
        match self {
            EntityKind::Transaction => "transaction",
            EntityKind::Account => "account",
            EntityKind::Profile => "profile",
        }
    }

    /// Name of the document-store collection holding this kind.
    pub fn collection(&self) -> &'static str {
        match self {
            EntityKind::Transaction => "Transaction",
            EntityKind::Account => "Account",
            EntityKind::Profile => "UserProfile",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key_prefix())
    }
}

impl FromStr for EntityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "transaction" | "transactions" => Ok(EntityKind::Transaction),
            "account" | "accounts" => Ok(EntityKind::Account),
            "profile" | "profiles" | "userprofile" => Ok(EntityKind::Profile),
            other => Err(format!(
                "unknown entity kind '{}'. Use transactions, accounts, or profile.",
                other
            )),
        }
    }
}

// ============ Relational rows ============

/// Structured address attached to a transaction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Location {
    pub address: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

impl Location {
    pub fn is_empty(&self) -> bool {
        self.address.is_none()
            && self.city.is_none()
            && self.region.is_none()
            && self.lat.is_none()
            && self.lon.is_none()
    }
}

/// One row of the relational `Transaction` table.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionRow {
    pub transaction_id: String,
    pub user_id: String,
    pub account_id: Option<String>,
    pub amount: Decimal,
    pub name: Option<String>,
    /// Category list as stored: serialized text, parsed at projection.
    pub category: Option<String>,
    pub date: Option<NaiveDate>,
    pub pending: bool,
    pub merchant_name: Option<String>,
    pub payment_channel: Option<String>,
    pub location: Option<Location>,
}

/// One row of the relational `Account` table joined with its institution.
#[derive(Debug, Clone, PartialEq)]
pub struct AccountRow {
    pub account_id: String,
    pub user_id: String,
    pub name: Option<String>,
    pub account_type: Option<String>,
    pub subtype: Option<String>,
    pub balance_current: Option<Decimal>,
    pub balance_available: Option<Decimal>,
    pub balance_limit: Option<Decimal>,
    pub currency: Option<String>,
    pub institution_name: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// The subset of the relational `User` row the profile needs.
#[derive(Debug, Clone, PartialEq)]
pub struct UserRow {
    pub user_id: String,
    pub email: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

// ============ Mirrored documents ============

/// Denormalized transaction as stored in the `Transaction` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionDocument {
    pub transaction_id: String,
    pub user_id: String,
    pub account_id: String,
    pub amount: f64,
    pub name: String,
    pub category: Vec<String>,
    pub date: String,
    pub pending: bool,
    pub merchant_name: String,
    pub payment_channel: String,
    pub location: String,
    /// `YYYY-MM` bucket of `date`, for time-range filtering.
    pub month_year: String,
    /// Free-text search surrogate: name, merchant and categories.
    pub description_blob: String,
}

/// Latest balance snapshot as stored in the `Account` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountDocument {
    pub account_id: String,
    pub user_id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub account_type: String,
    pub subtype: String,
    pub balance_current: f64,
    pub balance_available: f64,
    pub balance_limit: f64,
    pub currency: String,
    pub institution_name: String,
    pub last_updated: String,
}

/// Computed per-user summary as stored in the `UserProfile` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfileDocument {
    pub user_id: String,
    pub email: String,
    pub total_assets: f64,
    pub total_liabilities: f64,
    pub monthly_income: f64,
    pub monthly_expenses: f64,
    pub savings_rate: f64,
    pub risk_tolerance: String,
    pub financial_goals: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// A projected document of any kind, ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub enum Document {
    Transaction(TransactionDocument),
    Account(AccountDocument),
    UserProfile(UserProfileDocument),
}

impl Document {
    pub fn kind(&self) -> EntityKind {
        match self {
            Document::Transaction(_) => EntityKind::Transaction,
            Document::Account(_) => EntityKind::Account,
            Document::UserProfile(_) => EntityKind::Profile,
        }
    }

    pub fn natural_key(&self) -> &str {
        match self {
            Document::Transaction(t) => &t.transaction_id,
            Document::Account(a) => &a.account_id,
            Document::UserProfile(p) => &p.user_id,
        }
    }

    pub fn user_id(&self) -> &str {
        match self {
            Document::Transaction(t) => &t.user_id,
            Document::Account(a) => &a.user_id,
            Document::UserProfile(p) => &p.user_id,
        }
    }

    /// Deterministic store identifier for this document.
    pub fn id(&self) -> DocumentId {
        document_id(self.kind(), self.natural_key())
    }

    /// Flatten into the property map handed to the document store.
    pub fn to_properties(&self) -> serde_json::Result<Map<String, Value>> {
        let value = match self {
            Document::Transaction(t) => serde_json::to_value(t)?,
            Document::Account(a) => serde_json::to_value(a)?,
            Document::UserProfile(p) => serde_json::to_value(p)?,
        };
        into_object(value)
    }
}

fn into_object(value: Value) -> serde_json::Result<Map<String, Value>> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(serde::ser::Error::custom(format!(
            "document serialized to a non-object: {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_non_object_properties_are_an_error() {
        let err = into_object(json!([1, 2])).unwrap_err();
        assert!(err.to_string().contains("non-object"), "{}", err);
        assert!(into_object(json!({ "a": 1 })).is_ok());
    }

    #[test]
    fn test_entity_kind_parse_accepts_plural_and_singular() {
        assert_eq!("transactions".parse::<EntityKind>(), Ok(EntityKind::Transaction));
        assert_eq!("Account".parse::<EntityKind>(), Ok(EntityKind::Account));
        assert_eq!("profile".parse::<EntityKind>(), Ok(EntityKind::Profile));
        assert!("ledger".parse::<EntityKind>().is_err());
    }

    #[test]
    fn test_collections_are_distinct() {
        let names: Vec<&str> = EntityKind::ALL.iter().map(|k| k.collection()).collect();
        assert_eq!(names, vec!["Transaction", "Account", "UserProfile"]);
    }

    #[test]
    fn test_account_type_serializes_as_type() {
        let doc = Document::Account(AccountDocument {
            account_id: "a1".to_string(),
            user_id: "u1".to_string(),
            name: "Checking".to_string(),
            account_type: "depository".to_string(),
            subtype: String::new(),
            balance_current: 10.0,
            balance_available: 0.0,
            balance_limit: 0.0,
            currency: "USD".to_string(),
            institution_name: String::new(),
            last_updated: String::new(),
        });
        let props = doc.to_properties().unwrap();
        assert_eq!(props.get("type"), Some(&Value::String("depository".to_string())));
        assert!(!props.contains_key("account_type"));
        assert_eq!(doc.user_id(), "u1");
        assert_eq!(doc.natural_key(), "a1");
    }
}
