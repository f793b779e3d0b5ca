//! Read-side abstraction over the relational system of record.
//!
//! The [`Ledger`] trait is the only path by which the sync pipeline reads
//! source data. It is strictly read-only: the relational store remains the
//! sole writable source of truth, and nothing flows back into it.
//!
//! | Method | Query contract |
//! |--------|----------------|
//! | [`recent_transactions`](Ledger::recent_transactions) | filter by user, `date DESC, id ASC`, limit N |
//! | [`accounts`](Ledger::accounts) | filter by user, left-join institution name |
//! | [`profile_snapshot`](Ledger::profile_snapshot) | user lookup + account/transaction aggregation in one read |

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;

use crate::models::{AccountRow, TransactionRow, UserRow};
use crate::profile::ProfileAggregates;

/// Everything needed to build one user's profile, read consistently.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileSnapshot {
    pub user: UserRow,
    pub aggregates: ProfileAggregates,
}

#[async_trait]
pub trait Ledger: Send + Sync {
    /// Up to `limit` most recent transactions for a user.
    ///
    /// Ordered by date descending (undated rows last), ties broken by
    /// transaction id ascending so a fixed limit selects a fixed set.
    async fn recent_transactions(&self, user_id: &str, limit: usize)
        -> Result<Vec<TransactionRow>>;

    /// All accounts for a user, with institution names joined in.
    async fn accounts(&self, user_id: &str) -> Result<Vec<AccountRow>>;

    /// The user record and its profile aggregates, or `None` when the user
    /// does not exist. Transactions dated before `window_start` are excluded
    /// from the income and expense averages.
    async fn profile_snapshot(
        &self,
        user_id: &str,
        window_start: NaiveDate,
    ) -> Result<Option<ProfileSnapshot>>;
}
