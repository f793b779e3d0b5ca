//! SQLite-backed [`Ledger`] implementation.
//!
//! Same tables and query contracts as the Postgres ledger, in SQLite
//! dialect. SQLite has no decimal type, so amounts and balances are read as
//! `REAL` and converted to [`Decimal`]; dates are stored as ISO-8601 text.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use ledger_mirror_core::ledger::{Ledger, ProfileSnapshot};
use ledger_mirror_core::models::{AccountRow, Location, TransactionRow, UserRow};
use ledger_mirror_core::profile::ProfileAggregates;

pub struct SqliteLedger {
    pool: SqlitePool,
}

impl SqliteLedger {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

const TRANSACTIONS_SQL: &str = r#"
    SELECT
        t.id, t.user_id, t.account_id,
        CAST(t.amount AS REAL) AS amount,
        t.name, t.category,
        substr(t.date, 1, 10) AS date,
        COALESCE(t.pending, 0) AS pending,
        t.merchant_name, t.payment_channel,
        t.location_address, t.location_city, t.location_region,
        CAST(t.location_lat AS REAL) AS location_lat,
        CAST(t.location_lon AS REAL) AS location_lon
    FROM "Transaction" t
    WHERE t.user_id = ?1
    ORDER BY t.date IS NULL, t.date DESC, t.id ASC
    LIMIT ?2
"#;

const ACCOUNTS_SQL: &str = r#"
    SELECT
        a.id, a.user_id, a.name, a.type, a.subtype,
        CAST(a.balance_current AS REAL) AS balance_current,
        CAST(a.balance_available AS REAL) AS balance_available,
        CAST(a.balance_limit AS REAL) AS balance_limit,
        a.iso_currency_code,
        i.institution_name,
        a.updated_at
    FROM "Account" a
    LEFT JOIN "Item" i ON a.item_id = i.id
    WHERE a.user_id = ?1
    ORDER BY a.id
"#;

const METRICS_SQL: &str = r#"
    WITH account_totals AS (
        SELECT
            COALESCE(SUM(CASE WHEN type IN ('depository', 'investment')
                              THEN CAST(balance_current AS REAL) ELSE 0 END), 0) AS total_assets,
            COALESCE(SUM(CASE WHEN type IN ('credit', 'loan')
                              THEN ABS(CAST(balance_current AS REAL)) ELSE 0 END), 0) AS total_liabilities
        FROM "Account"
        WHERE user_id = ?1
    ),
    transaction_stats AS (
        SELECT
            AVG(CASE WHEN CAST(amount AS REAL) > 0 THEN CAST(amount AS REAL) END) AS avg_income,
            AVG(CASE WHEN CAST(amount AS REAL) < 0 THEN ABS(CAST(amount AS REAL)) END) AS avg_expense
        FROM "Transaction"
        WHERE user_id = ?1
          AND substr(date, 1, 10) >= ?2
    )
    SELECT
        CAST(at.total_assets AS REAL) AS total_assets,
        CAST(at.total_liabilities AS REAL) AS total_liabilities,
        ts.avg_income,
        ts.avg_expense
    FROM account_totals at, transaction_stats ts
"#;

fn decimal(value: f64, field: &str) -> Result<Decimal> {
    Decimal::from_f64(value).with_context(|| format!("{} value {} is not representable", field, value))
}

fn optional_decimal(row: &SqliteRow, field: &str) -> Result<Option<Decimal>> {
    row.try_get::<Option<f64>, _>(field)?
        .map(|v| decimal(v, field))
        .transpose()
}

fn parse_date(raw: Option<String>) -> Result<Option<NaiveDate>> {
    raw.filter(|s| !s.is_empty())
        .map(|s| {
            NaiveDate::parse_from_str(&s, "%Y-%m-%d")
                .with_context(|| format!("Invalid date '{}'", s))
        })
        .transpose()
}

/// Accepts RFC 3339 or the `YYYY-MM-DD HH:MM:SS` form SQLite's
/// `CURRENT_TIMESTAMP` produces (read as UTC).
pub(crate) fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|ts| ts.and_utc())
        .with_context(|| format!("Invalid timestamp '{}'", raw))
}

fn optional_timestamp(row: &SqliteRow, field: &str) -> Result<Option<DateTime<Utc>>> {
    row.try_get::<Option<String>, _>(field)?
        .filter(|s| !s.is_empty())
        .map(|s| parse_timestamp(&s))
        .transpose()
}

fn transaction_from_row(row: &SqliteRow) -> Result<TransactionRow> {
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
        amount: optional_decimal(row, "amount")?.unwrap_or_default(),
        name: row.try_get("name")?,
        category: row.try_get("category")?,
        date: parse_date(row.try_get("date")?)?,
        pending: row.try_get("pending")?,
        merchant_name: row.try_get("merchant_name")?,
        payment_channel: row.try_get("payment_channel")?,
        location: (!location.is_empty()).then_some(location),
    })
}

fn account_from_row(row: &SqliteRow) -> Result<AccountRow> {
    Ok(AccountRow {
        account_id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        name: row.try_get("name")?,
        account_type: row.try_get("type")?,
        subtype: row.try_get("subtype")?,
        balance_current: optional_decimal(row, "balance_current")?,
        balance_available: optional_decimal(row, "balance_available")?,
        balance_limit: optional_decimal(row, "balance_limit")?,
        currency: row.try_get("iso_currency_code")?,
        institution_name: row.try_get("institution_name")?,
        updated_at: optional_timestamp(row, "updated_at")?,
    })
}

#[async_trait]
impl Ledger for SqliteLedger {
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

        let user = match sqlx::query(r#"SELECT id, email, created_at FROM "User" WHERE id = ?1"#)
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await
            .context("User query failed")?
        {
            Some(row) => UserRow {
                user_id: row.try_get("id")?,
                email: row.try_get("email")?,
                created_at: optional_timestamp(&row, "created_at")?,
            },
            None => return Ok(None),
        };

        let metrics = sqlx::query(METRICS_SQL)
            .bind(user_id)
            .bind(window_start.format("%Y-%m-%d").to_string())
            .fetch_one(&mut *tx)
            .await
            .context("Profile metrics query failed")?;

        let aggregates = ProfileAggregates {
            total_assets: decimal(metrics.try_get("total_assets")?, "total_assets")?,
            total_liabilities: decimal(metrics.try_get("total_liabilities")?, "total_liabilities")?,
            avg_income: optional_decimal(&metrics, "avg_income")?,
            avg_expense: optional_decimal(&metrics, "avg_expense")?,
        };

        tx.commit().await?;

        Ok(Some(ProfileSnapshot { user, aggregates }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_timestamp_forms() {
        let expected = Utc.with_ymd_and_hms(2024, 3, 1, 8, 30, 0).unwrap();
        assert_eq!(parse_timestamp("2024-03-01T08:30:00Z").unwrap(), expected);
        assert_eq!(parse_timestamp("2024-03-01 08:30:00").unwrap(), expected);
        assert_eq!(parse_timestamp("2024-03-01T10:30:00+02:00").unwrap(), expected);
        assert!(parse_timestamp("yesterday").is_err());
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(parse_date(None).unwrap(), None);
        assert_eq!(parse_date(Some(String::new())).unwrap(), None);
        assert_eq!(
            parse_date(Some("2024-02-29".to_string())).unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 29)
        );
        assert!(parse_date(Some("29/02/2024".to_string())).is_err());
    }
}
