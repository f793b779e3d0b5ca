//! # Ledger Mirror Core
//!
//! Runtime-agnostic logic for mirroring financial records (users, accounts,
//! transactions) from a relational system of record into a document store.
//!
//! This crate contains no tokio, sqlx, HTTP, or filesystem dependencies.
//! Concrete database and document-store backends live in the `ledger-mirror`
//! crate and plug in through the [`ledger::Ledger`] and
//! [`store::DocumentStore`] traits.
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`models`] | Relational row shapes and mirrored document shapes |
//! | [`identity`] | Deterministic document identifiers from natural keys |
//! | [`project`] | Row → document projection with default-fill rules |
//! | [`profile`] | Financial profile aggregation (assets, income, savings rate) |
//! | [`ledger`] | Relational read-side trait and in-memory implementation |
//! | [`store`] | Document-store trait, collection schemas, in-memory store |
//! | [`sync`] | Per-entity and composite sync orchestration |

pub mod identity;
pub mod ledger;
pub mod models;
pub mod profile;
pub mod project;
pub mod store;
pub mod sync;

pub use identity::{document_id, DocumentId};
pub use models::EntityKind;
pub use sync::{
    CompositeResult, OverallStatus, SyncOutcome, SyncService, SyncStatus, SyncStatusReport,
};
