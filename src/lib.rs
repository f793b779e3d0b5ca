//! # Ledger Mirror
//!
//! Keeps a document-store copy of a relational financial ledger.
//!
//! Users, accounts, and transactions are read from Postgres (or SQLite),
//! projected into flat documents with deterministic ids, and upserted into
//! a document/vector store (Weaviate, or a local SQLite-backed store). Each
//! user also gets a profile document with metrics derived from a six-month window.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌──────────────────┐   ┌────────────────┐
//! │   Ledger    │──▶│   SyncService    │──▶│ Document store │
//! │ Postgres/   │   │ project + ids +  │   │ Weaviate/      │
//! │ SQLite      │   │ profile metrics  │   │ SQLite/memory  │
//! └─────────────┘   └────────┬─────────┘   └────────────────┘
//!                            │
//!                  ┌─────────┴────────┐
//!                  ▼                  ▼
//!             ┌──────────┐       ┌──────────┐
//!             │   CLI    │       │   HTTP   │
//!             │ (mirror) │       │  (axum)  │
//!             └──────────┘       └──────────┘
//! ```
//!
//! The domain logic lives in `ledger-mirror-core`; this crate holds the
//! backend adapters and the outer surfaces.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing and validation |
//! | [`db`] | Ledger and store connection pools |
//! | [`ledger_pg`] | Postgres ledger queries |
//! | [`ledger_sqlite`] | SQLite ledger queries |
//! | [`migrate`] | SQLite document-store tables |
//! | [`sqlite_store`] | SQLite document store |
//! | [`weaviate`] | Weaviate REST/GraphQL document store |
//! | [`service`] | Startup wiring and sync dispatch |
//! | [`server`] | HTTP API |
//! | [`logging`] | Tracing subscriber setup |

pub mod config;
pub mod db;
pub mod ledger_pg;
pub mod ledger_sqlite;
pub mod logging;
pub mod migrate;
pub mod server;
pub mod service;
pub mod sqlite_store;
pub mod weaviate;
