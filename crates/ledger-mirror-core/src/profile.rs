//! Financial profile aggregation.
//!
//! A profile is derived from two source tables:
//!
//! 1. **Accounts** are bucketed by type: `depository`/`investment` are
//!    assets, `credit`/`loan` are liabilities, anything else is ignored.
//!    Current balances are summed per bucket; liability balances contribute
//!    their magnitude, so ledgers that store debt as negative numbers still
//!    produce a positive `total_liabilities`.
//! 2. **Transactions** dated inside the trailing 6-month window yield an
//!    income proxy (mean of positive amounts) and an expense proxy (mean of
//!    the magnitudes of negative amounts). Each is scaled by 30 to
//!    approximate a monthly figure.
//!
//! `savings_rate = (income − expense) / income` when income is positive,
//! otherwise `0`.
//!
//! Relational backends push step 1 and 2 into a single SQL statement and
//! return [`ProfileAggregates`]; [`ProfileAggregates::from_rows`] is the
//! same fold over in-memory rows. Either way [`ProfileMetrics::from_aggregates`]
//! applies the scaling and the savings-rate rule.

use chrono::{Months, NaiveDate};
use rust_decimal::Decimal;

use crate::models::{AccountRow, TransactionRow};

pub const TRAILING_WINDOW_MONTHS: u32 = 6;

/// Multiplier turning a per-transaction average into a monthly figure.
pub const MONTHLY_SCALE: u32 = 30;

/// Account types counted as assets.
pub const ASSET_TYPES: [&str; 2] = ["depository", "investment"];

/// Account types counted as liabilities.
pub const LIABILITY_TYPES: [&str; 2] = ["credit", "loan"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountBucket {
    Asset,
    Liability,
}

impl AccountBucket {
    /// Bucket for an account type; `None` for unrecognized types.
    pub fn classify(account_type: &str) -> Option<Self> {
        if ASSET_TYPES.contains(&account_type) {
            Some(AccountBucket::Asset)
        } else if LIABILITY_TYPES.contains(&account_type) {
            Some(AccountBucket::Liability)
        } else {
            None
        }
    }
}

/// First day (inclusive) of the trailing window ending at `today`.
pub fn window_start(today: NaiveDate) -> NaiveDate {
    today
        .checked_sub_months(Months::new(TRAILING_WINDOW_MONTHS))
        .unwrap_or(NaiveDate::MIN)
}

/// Raw sums and averages as produced by the aggregation query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileAggregates {
    pub total_assets: Decimal,
    pub total_liabilities: Decimal,
    /// Mean positive amount in the window; `None` when there are no inflows.
    pub avg_income: Option<Decimal>,
    /// Mean magnitude of negative amounts; `None` when there are no outflows.
    pub avg_expense: Option<Decimal>,
}

impl ProfileAggregates {
    pub fn from_rows(
        accounts: &[AccountRow],
        transactions: &[TransactionRow],
        window_start: NaiveDate,
    ) -> Self {
        let mut total_assets = Decimal::ZERO;
        let mut total_liabilities = Decimal::ZERO;

        for account in accounts {
            let balance = account.balance_current.unwrap_or(Decimal::ZERO);
            match account.account_type.as_deref().and_then(AccountBucket::classify) {
                Some(AccountBucket::Asset) => total_assets += balance,
                Some(AccountBucket::Liability) => total_liabilities += balance.abs(),
                None => {}
            }
        }

        let in_window = transactions
            .iter()
            .filter(|t| t.date.map(|d| d >= window_start).unwrap_or(false));

        let mut income = Vec::new();
        let mut expense = Vec::new();
        for txn in in_window {
            if txn.amount > Decimal::ZERO {
                income.push(txn.amount);
            } else if txn.amount < Decimal::ZERO {
                expense.push(txn.amount.abs());
            }
        }

        Self {
            total_assets,
            total_liabilities,
            avg_income: mean(&income),
            avg_expense: mean(&expense),
        }
    }
}

fn mean(values: &[Decimal]) -> Option<Decimal> {
    if values.is_empty() {
        return None;
    }
    let sum: Decimal = values.iter().copied().sum();
    Some(sum / Decimal::from(values.len() as u64))
}

/// Derived metrics fed into the `UserProfile` projection.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileMetrics {
    pub total_assets: Decimal,
    pub total_liabilities: Decimal,
    pub monthly_income: Decimal,
    pub monthly_expenses: Decimal,
    pub savings_rate: Decimal,
}

impl ProfileMetrics {
    pub fn from_aggregates(agg: &ProfileAggregates) -> Self {
        let avg_income = agg.avg_income.unwrap_or(Decimal::ZERO);
        let avg_expense = agg.avg_expense.unwrap_or(Decimal::ZERO);
        let scale = Decimal::from(MONTHLY_SCALE);

        let savings_rate = if avg_income > Decimal::ZERO {
            (avg_income - avg_expense) / avg_income
        } else {
            Decimal::ZERO
        };

        Self {
            total_assets: agg.total_assets,
            total_liabilities: agg.total_liabilities,
            monthly_income: avg_income * scale,
            monthly_expenses: avg_expense * scale,
            savings_rate,
        }
    }
}
