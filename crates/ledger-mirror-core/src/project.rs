//! Relational row → mirrored document projection.
//!
//! Projections are pure: the caller supplies `now` wherever a fallback
//! timestamp is needed. Every projected property is non-null because the
//! store schemas declare non-nullable types:
//!
//! - absent text projects to `""`, absent balances to `0`;
//! - dates and timestamps project to ISO-8601 text, absent ones to `""`,
//!   except `Account.last_updated` which falls back to `now`;
//! - category text is parsed into a list, and anything absent or
//!   unparseable becomes `[]`.
//!
//! Rows that cannot be represented at all (empty natural key, amount that
//! has no `f64` form) are rejected with a [`ProjectionError`] before anything
//! reaches the store.

use chrono::{DateTime, SecondsFormat, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::models::{
    AccountDocument, AccountRow, EntityKind, Location, TransactionDocument, TransactionRow,
    UserProfileDocument, UserRow,
};
use crate::profile::ProfileMetrics;

pub const DEFAULT_CURRENCY: &str = "USD";
pub const DEFAULT_ACCOUNT_TYPE: &str = "unknown";
pub const DEFAULT_RISK_TOLERANCE: &str = "moderate";

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProjectionError {
    #[error("{kind} row has an empty natural key")]
    EmptyKey { kind: EntityKind },

    #[error("{kind} {key} has no user_id")]
    MissingUser { kind: EntityKind, key: String },

    #[error("{kind} {key}: field `{field}` has no finite numeric value")]
    NotFinite {
        kind: EntityKind,
        key: String,
        field: &'static str,
    },
}

pub fn project_transaction(row: &TransactionRow) -> Result<TransactionDocument, ProjectionError> {
    let kind = EntityKind::Transaction;
    check_keys(kind, &row.transaction_id, &row.user_id)?;

    let name = row.name.clone().unwrap_or_default();
    let merchant_name = row.merchant_name.clone().unwrap_or_default();
    let category = parse_categories(row.category.as_deref());
    let description_blob = description_blob(&name, &merchant_name, &category);

    Ok(TransactionDocument {
        transaction_id: row.transaction_id.clone(),
        user_id: row.user_id.clone(),
        account_id: row.account_id.clone().unwrap_or_default(),
        amount: to_number(kind, &row.transaction_id, "amount", row.amount)?,
        name,
        category,
        date: row
            .date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default(),
        pending: row.pending,
        merchant_name,
        payment_channel: row.payment_channel.clone().unwrap_or_default(),
        location: row.location.as_ref().map(format_location).unwrap_or_default(),
        month_year: row
            .date
            .map(|d| d.format("%Y-%m").to_string())
            .unwrap_or_default(),
        description_blob,
    })
}

pub fn project_account(
    row: &AccountRow,
    now: DateTime<Utc>,
) -> Result<AccountDocument, ProjectionError> {
    let kind = EntityKind::Account;
    check_keys(kind, &row.account_id, &row.user_id)?;

    let balance = |field: &'static str, value: Option<Decimal>| {
        to_number(kind, &row.account_id, field, value.unwrap_or(Decimal::ZERO))
    };

    Ok(AccountDocument {
        account_id: row.account_id.clone(),
        user_id: row.user_id.clone(),
        name: row.name.clone().unwrap_or_default(),
        account_type: row
            .account_type
            .clone()
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| DEFAULT_ACCOUNT_TYPE.to_string()),
        subtype: row.subtype.clone().unwrap_or_default(),
        balance_current: balance("balance_current", row.balance_current)?,
        balance_available: balance("balance_available", row.balance_available)?,
        balance_limit: balance("balance_limit", row.balance_limit)?,
        currency: row
            .currency
            .clone()
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
        institution_name: row.institution_name.clone().unwrap_or_default(),
        last_updated: format_timestamp(row.updated_at.unwrap_or(now)),
    })
}

pub fn project_profile(
    user: &UserRow,
    metrics: &ProfileMetrics,
    now: DateTime<Utc>,
) -> Result<UserProfileDocument, ProjectionError> {
    let kind = EntityKind::Profile;
    check_keys(kind, &user.user_id, &user.user_id)?;
    let key = user.user_id.as_str();

    Ok(UserProfileDocument {
        user_id: user.user_id.clone(),
        email: user.email.clone().unwrap_or_default(),
        total_assets: to_number(kind, key, "total_assets", metrics.total_assets)?,
        total_liabilities: to_number(kind, key, "total_liabilities", metrics.total_liabilities)?,
        monthly_income: to_number(kind, key, "monthly_income", metrics.monthly_income)?,
        monthly_expenses: to_number(kind, key, "monthly_expenses", metrics.monthly_expenses)?,
        savings_rate: to_number(kind, key, "savings_rate", metrics.savings_rate)?,
        risk_tolerance: DEFAULT_RISK_TOLERANCE.to_string(),
        financial_goals: Vec::new(),
        created_at: user.created_at.map(format_timestamp).unwrap_or_default(),
        updated_at: format_timestamp(now),
    })
}

/// Parse stored category text into a list.
///
/// Accepts a JSON array (`["Food","Restaurants"]`) or a Postgres array
/// literal (`{Food,Restaurants}`). Non-string JSON elements and blank
/// entries are dropped; anything else yields an empty list.
pub fn parse_categories(raw: Option<&str>) -> Vec<String> {
    let raw = match raw.map(str::trim) {
        Some(r) if !r.is_empty() => r,
        _ => return Vec::new(),
    };

    if let Ok(values) = serde_json::from_str::<Vec<serde_json::Value>>(raw) {
        return values
            .into_iter()
            .filter_map(|v| match v {
                serde_json::Value::String(s) if !s.trim().is_empty() => Some(s),
                _ => None,
            })
            .collect();
    }

    if let Some(inner) = raw.strip_prefix('{').and_then(|r| r.strip_suffix('}')) {
        return inner
            .split(',')
            .map(|part| part.trim().trim_matches('"').to_string())
            .filter(|part| !part.is_empty() && part != "NULL")
            .collect();
    }

    Vec::new()
}

/// Concatenate name, merchant and categories into one search string.
pub fn description_blob(name: &str, merchant_name: &str, categories: &[String]) -> String {
    let joined = categories.join(" ");
    [name, merchant_name, joined.as_str()]
        .iter()
        .map(|part| part.trim())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn format_location(location: &Location) -> String {
    [&location.address, &location.city, &location.region]
        .iter()
        .filter_map(|part| part.as_deref())
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

fn check_keys(kind: EntityKind, key: &str, user_id: &str) -> Result<(), ProjectionError> {
    if key.trim().is_empty() {
        return Err(ProjectionError::EmptyKey { kind });
    }
    if user_id.trim().is_empty() {
        return Err(ProjectionError::MissingUser {
            kind,
            key: key.to_string(),
        });
    }
    Ok(())
}

fn to_number(
    kind: EntityKind,
    key: &str,
    field: &'static str,
    value: Decimal,
) -> Result<f64, ProjectionError> {
    value
        .to_f64()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ProjectionError::NotFinite {
            kind,
            key: key.to_string(),
            field,
        })
}
