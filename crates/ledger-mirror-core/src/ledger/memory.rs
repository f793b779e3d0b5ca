//! In-memory [`Ledger`] implementation for tests and demos.
//!
//! Holds rows in `Vec`s behind `std::sync::RwLock`. Aggregation is the
//! row-level fold from [`ProfileAggregates::from_rows`].

use std::cmp::Ordering;
use std::sync::RwLock;

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;

use crate::models::{AccountRow, TransactionRow, UserRow};
use crate::profile::ProfileAggregates;

use super::{Ledger, ProfileSnapshot};

#[derive(Default)]
pub struct InMemoryLedger {
    users: RwLock<Vec<UserRow>>,
    accounts: RwLock<Vec<AccountRow>>,
    transactions: RwLock<Vec<TransactionRow>>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a user by id.
    pub fn put_user(&self, user: UserRow) {
        let mut users = self.users.write().unwrap();
        users.retain(|u| u.user_id != user.user_id);
        users.push(user);
    }

    /// Insert or replace an account by id.
    pub fn put_account(&self, account: AccountRow) {
        let mut accounts = self.accounts.write().unwrap();
        accounts.retain(|a| a.account_id != account.account_id);
        accounts.push(account);
    }

    /// Insert or replace a transaction by id.
    pub fn put_transaction(&self, txn: TransactionRow) {
        let mut txns = self.transactions.write().unwrap();
        txns.retain(|t| t.transaction_id != txn.transaction_id);
        txns.push(txn);
    }
}

fn newest_first(a: &TransactionRow, b: &TransactionRow) -> Ordering {
    match (a.date, b.date) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
    .then_with(|| a.transaction_id.cmp(&b.transaction_id))
}

#[async_trait]
impl Ledger for InMemoryLedger {
    async fn recent_transactions(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<TransactionRow>> {
        let txns = self.transactions.read().unwrap();
        let mut rows: Vec<TransactionRow> = txns
            .iter()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by(newest_first);
        rows.truncate(limit);
        Ok(rows)
    }

    async fn accounts(&self, user_id: &str) -> Result<Vec<AccountRow>> {
        let accounts = self.accounts.read().unwrap();
        Ok(accounts
            .iter()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn profile_snapshot(
        &self,
        user_id: &str,
        window_start: NaiveDate,
    ) -> Result<Option<ProfileSnapshot>> {
        let user = match self
            .users
            .read()
            .unwrap()
            .iter()
            .find(|u| u.user_id == user_id)
        {
            Some(u) => u.clone(),
            None => return Ok(None),
        };

        let accounts = self.accounts(user_id).await?;
        let transactions: Vec<TransactionRow> = self
            .transactions
            .read()
            .unwrap()
            .iter()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect();

        Ok(Some(ProfileSnapshot {
            user,
            aggregates: ProfileAggregates::from_rows(&accounts, &transactions, window_start),
        }))
    }
}
