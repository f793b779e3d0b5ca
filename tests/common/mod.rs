//! Shared fixtures: a SQLite ledger seeded with two users, plus a config
//! pointing at it and a local SQLite document store.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{Days, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tempfile::TempDir;

pub struct Fixture {
    pub tmp: TempDir,
    pub config_path: PathBuf,
    pub config_text: String,
}

const LEDGER_DDL: &[&str] = &[
    r#"CREATE TABLE "User" (
        id TEXT PRIMARY KEY,
        email TEXT,
        created_at TEXT,
        updated_at TEXT
    )"#,
    r#"CREATE TABLE "Item" (
        id TEXT PRIMARY KEY,
        institution_name TEXT
    )"#,
    r#"CREATE TABLE "Account" (
        id TEXT PRIMARY KEY,
        user_id TEXT NOT NULL,
        item_id TEXT,
        name TEXT,
        type TEXT,
        subtype TEXT,
        balance_current NUMERIC,
        balance_available NUMERIC,
        balance_limit NUMERIC,
        iso_currency_code TEXT,
        updated_at TEXT
    )"#,
    r#"CREATE TABLE "Transaction" (
        id TEXT PRIMARY KEY,
        user_id TEXT NOT NULL,
        account_id TEXT,
        amount NUMERIC NOT NULL,
        name TEXT,
        category TEXT,
        date TEXT,
        pending INTEGER,
        merchant_name TEXT,
        payment_channel TEXT,
        location_lat REAL,
        location_lon REAL,
        location_address TEXT,
        location_city TEXT,
        location_region TEXT
    )"#,
];

fn days_ago(n: u64) -> String {
    Utc::now()
        .date_naive()
        .checked_sub_days(Days::new(n))
        .unwrap()
        .format("%Y-%m-%d")
        .to_string()
}

/// u1: a depository (5000) and a credit card (-1200); +2000, -500 and -300
/// inside the six-month window and one -9999 far outside it.
/// u2: exists but has no accounts or transactions.
pub async fn seed_ledger(path: &Path) {
    let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", path.display()))
        .unwrap()
        .create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .unwrap();

    for ddl in LEDGER_DDL {
        sqlx::query(ddl).execute(&pool).await.unwrap();
    }

    sqlx::query(
        r#"INSERT INTO "User" (id, email, created_at) VALUES
            ('u1', 'u1@example.com', '2023-01-15 09:00:00'),
            ('u2', NULL, NULL)"#,
    )
    .execute(&pool)
    .await
    .unwrap();

    sqlx::query(r#"INSERT INTO "Item" (id, institution_name) VALUES ('i1', 'First Bank')"#)
        .execute(&pool)
        .await
        .unwrap();

    sqlx::query(
        r#"INSERT INTO "Account"
            (id, user_id, item_id, name, type, subtype, balance_current,
             balance_available, balance_limit, iso_currency_code, updated_at)
        VALUES
            ('a1', 'u1', 'i1', 'Checking', 'depository', 'checking', 5000, 4800, NULL, 'USD', '2024-05-01 12:00:00'),
            ('a2', 'u1', 'i1', 'Card', 'credit', 'credit card', -1200, NULL, 5000, 'USD', NULL)"#,
    )
    .execute(&pool)
    .await
    .unwrap();

    let rows: [(&str, f64, String, &str); 4] = [
        ("t1", 2000.0, days_ago(10), r#"["Transfer","Payroll"]"#),
        ("t2", -500.0, days_ago(20), r#"["Food and Drink"]"#),
        ("t3", -300.0, days_ago(30), "{Shops,Groceries}"),
        ("t4", -9999.0, days_ago(200), ""),
    ];
    for (id, amount, date, category) in rows {
        sqlx::query(
            r#"INSERT INTO "Transaction"
                (id, user_id, account_id, amount, name, category, date, pending,
                 merchant_name, payment_channel, location_city, location_region)
            VALUES (?, 'u1', 'a1', ?, ?, ?, ?, 0, 'Corner Store', 'in store', 'Austin', 'TX')"#,
        )
        .bind(id)
        .bind(amount)
        .bind(format!("Purchase {}", id))
        .bind(category)
        .bind(date)
        .execute(&pool)
        .await
        .unwrap();
    }

    pool.close().await;
}

/// Seed a ledger and write a config using it with a SQLite document store.
pub async fn setup() -> Fixture {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();

    let ledger_path = root.join("ledger.sqlite");
    seed_ledger(&ledger_path).await;

    let config_text = format!(
        r#"[ledger]
url = "sqlite:{}"
max_connections = 4

[store]
backend = "sqlite"
path = "{}/data/store.sqlite"

[sync]
transaction_limit = 100

[server]
bind = "127.0.0.1:0"
"#,
        ledger_path.display(),
        root.display()
    );

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();
    let config_path = config_dir.join("mirror.toml");
    fs::write(&config_path, &config_text).unwrap();

    Fixture {
        tmp,
        config_path,
        config_text,
    }
}
