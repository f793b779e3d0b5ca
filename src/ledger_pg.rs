//! PostgreSQL-backed [`Ledger`] implementation.
//!
//! Reads the `"User"`, `"Account"`, `"Item"`, and `"Transaction"` tables.
//! Column types vary between deployments (numeric vs. double precision,
//! date vs. timestamp, jsonb vs. text[] categories), so every selected
//! column is cast to one canonical type in SQL before decoding.
//!
//! Timestamps are read as `timestamptz` and decoded straight into
//! `DateTime<Utc>`. sqlx opens every session with `TimeZone = UTC`, so a
//! plain `timestamp` column is taken as UTC and a `timestamptz` column keeps
//! its instant.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use ledger_mirror_core::ledger::{Ledger, ProfileSnapshot};
use ledger_mirror_core::models::{AccountRow, Location, TransactionRow, UserRow};
use ledger_mirror_core::profile::ProfileAggregates;

pub struct PgLedger {
    pool: PgPool,
}

impl PgLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const TRANSACTIONS_SQL: &str = r#"
    SELECT
        t.id::text AS id,
        t.user_id::text AS user_id,
        t.account_id::text AS account_id,
        t.amount::numeric AS amount,
        t.name,
        t.category::text AS category,
        t.date::date AS date,
        COALESCE(t.pending, false) AS pending,
        t.merchant_name,
        t.payment_channel,
        t.location_address,
        t.location_city,
        t.location_region,
        t.location_lat::float8 AS location_lat,
        t.location_lon::float8 AS location_lon
    FROM "Transaction" t
    WHERE t.user_id = $1
    ORDER BY t.date DESC NULLS LAST, t.id ASC
    LIMIT $2
"#;

const ACCOUNTS_SQL: &str = r#"
    SELECT
        a.id::text AS id,
        a.user_id::text AS user_id,
        a.name,
        a.type,
        a.subtype,
        a.balance_current::numeric AS balance_current,
        a.balance_available::numeric AS balance_available,
        a.balance_limit::numeric AS balance_limit,
        a.iso_currency_code,
        i.institution_name,
        a.updated_at::timestamptz AS updated_at
    FROM "Account" a
    LEFT JOIN "Item" i ON a.item_id = i.id
    WHERE a.user_id = $1
    ORDER BY a.id
"#;

const USER_SQL: &str = r#"
    SELECT id::text AS id, email, created_at::timestamptz AS created_at
    FROM "User"
    WHERE id = $1
"#;

const METRICS_SQL: &str = r#"
    WITH account_totals AS (
        SELECT
            COALESCE(SUM(CASE WHEN type IN ('depository', 'investment')
                              THEN balance_current ELSE 0 END), 0)::numeric AS total_assets,
            COALESCE(SUM(CASE WHEN type IN ('credit', 'loan')
                              THEN ABS(balance_current) ELSE 0 END), 0)::numeric AS total_liabilities
        FROM "Account"
        WHERE user_id = $1
    ),
    transaction_stats AS (
        SELECT
            (AVG(amount) FILTER (WHERE amount > 0))::numeric AS avg_income,
            (AVG(ABS(amount)) FILTER (WHERE amount < 0))::numeric AS avg_expense
        FROM "Transaction"
        WHERE user_id = $1
          AND date::date >= $2
    )
    SELECT at.total_assets, at.total_liabilities, ts.avg_income, ts.avg_expense
    FROM account_totals at, transaction_stats ts
"#;

fn transaction_from_row(row: &PgRow) -> Result<TransactionRow> {
    let location = Location {
        address: row.try_get("location_address")?,
        city: row.try_get("location_city")?,
        region: row.try_get("location_region")?,
        lat: row.try_get("location_lat")?,
        lon: row.try_get("location_lon")?,
    };

    Ok(TransactionRow {
        transaction_id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        account_id: row.try_get("account_id")?,
        amount: row.try_get::<Option<Decimal>, _>("amount")?.unwrap_or_default(),
        name: row.try_get("name")?,
        category: row.try_get("category")?,
        date: row.try_get::<Option<NaiveDate>, _>("date")?,
        pending: row.try_get("pending")?,
        merchant_name: row.try_get("merchant_name")?,
        payment_channel: row.try_get("payment_channel")?,
        location: (!location.is_empty()).then_some(location),
    })
}

fn account_from_row(row: &PgRow) -> Result<AccountRow> {
    Ok(AccountRow {
        account_id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        name: row.try_get("name")?,
        account_type: row.try_get("type")?,
        subtype: row.try_get("subtype")?,
        balance_current: row.try_get("balance_current")?,
        balance_available: row.try_get("balance_available")?,
        balance_limit: row.try_get("balance_limit")?,
        currency: row.try_get("iso_currency_code")?,
        institution_name: row.try_get("institution_name")?,
        updated_at: row.try_get::<Option<DateTime<Utc>>, _>("updated_at")?,
    })
}

#[async_trait]
impl Ledger for PgLedger {
    async fn recent_transactions(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<TransactionRow>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = sqlx::query(TRANSACTIONS_SQL)
            .bind(user_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .context("Transaction query failed")?;

        rows.iter().map(transaction_from_row).collect()
    }

    async fn accounts(&self, user_id: &str) -> Result<Vec<AccountRow>> {
        let rows = sqlx::query(ACCOUNTS_SQL)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .context("Account query failed")?;

        rows.iter().map(account_from_row).collect()
    }

    async fn profile_snapshot(
        &self,
        user_id: &str,
        window_start: NaiveDate,
    ) -> Result<Option<ProfileSnapshot>> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION READ ONLY")
            .execute(&mut *tx)
            .await?;

        let user = match sqlx::query(USER_SQL)
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await
            .context("User query failed")?
        {
            Some(row) => UserRow {
                user_id: row.try_get("id")?,
                email: row.try_get("email")?,
                created_at: row.try_get::<Option<DateTime<Utc>>, _>("created_at")?,
            },
            None => return Ok(None),
        };

        let metrics = sqlx::query(METRICS_SQL)
            .bind(user_id)
            .bind(window_start)
            .fetch_one(&mut *tx)
            .await
            .context("Profile metrics query failed")?;

        let aggregates = ProfileAggregates {
            total_assets: metrics.try_get("total_assets")?,
            total_liabilities: metrics.try_get("total_liabilities")?,
            avg_income: metrics.try_get("avg_income")?,
            avg_expense: metrics.try_get("avg_expense")?,
        };

        tx.commit().await?;

        Ok(Some(ProfileSnapshot { user, aggregates }))
    }
}
