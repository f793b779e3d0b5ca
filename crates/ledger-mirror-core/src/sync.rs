//! Sync orchestration: relational rows in, mirrored documents out.
//!
//! [`SyncService`] owns one [`Ledger`] and one [`DocumentStore`] handle and
//! exposes the per-entity operations plus the composite [`SyncService::sync_all`].
//!
//! Each entity operation follows the same pipeline:
//!
//! ```text
//! ledger query ──► project rows ──► document_id(kind, key) ──► upsert_batch
//! ```
//!
//! and returns a status-tagged [`SyncOutcome`] instead of an error. Empty
//! results are `no_data`, a missing user is `user_not_found`, and any
//! upstream failure is caught at the operation boundary, logged, and turned
//! into `error`. `sync_all` therefore always runs all three entities and
//! folds their outcomes into a [`CompositeResult`].

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::{error, info, warn};

use crate::ledger::Ledger;
use crate::models::{Document, EntityKind, UserProfileDocument};
use crate::profile::{window_start, ProfileMetrics};
use crate::project::{format_timestamp, project_account, project_profile, project_transaction};
use crate::store::{ensure_schema, BatchReport, DocumentStore, StoredObject};

/// Default number of transactions mirrored per `sync_transactions` call.
pub const DEFAULT_TRANSACTION_LIMIT: usize = 500;

/// Bare status of a [`SyncOutcome`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    Success,
    NoData,
    UserNotFound,
    Error,
}

/// Result of one entity sync.
///
/// Serializes with a `status` tag, e.g. `{"status":"no_data","synced":0}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SyncOutcome {
    Success {
        synced: usize,
        last_sync: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        profile: Option<UserProfileDocument>,
    },
    NoData {
        synced: usize,
    },
    UserNotFound,
    Error {
        synced: usize,
        error: String,
    },
}

impl SyncOutcome {
    pub fn status(&self) -> SyncStatus {
        match self {
            SyncOutcome::Success { .. } => SyncStatus::Success,
            SyncOutcome::NoData { .. } => SyncStatus::NoData,
            SyncOutcome::UserNotFound => SyncStatus::UserNotFound,
            SyncOutcome::Error { .. } => SyncStatus::Error,
        }
    }

    /// Documents written by this operation.
    pub fn synced(&self) -> usize {
        match self {
            SyncOutcome::Success { synced, .. }
            | SyncOutcome::NoData { synced }
            | SyncOutcome::Error { synced, .. } => *synced,
            SyncOutcome::UserNotFound => 0,
        }
    }

    /// `true` for `success` and `no_data`.
    pub fn is_clean(&self) -> bool {
        matches!(self, SyncOutcome::Success { .. } | SyncOutcome::NoData { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OverallStatus {
    Success,
    Partial,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityResults {
    pub profile: SyncOutcome,
    pub accounts: SyncOutcome,
    pub transactions: SyncOutcome,
}

impl EntityResults {
    pub fn overall_status(&self) -> OverallStatus {
        let clean = [&self.profile, &self.accounts, &self.transactions]
            .iter()
            .all(|outcome| outcome.is_clean());
        if clean {
            OverallStatus::Success
        } else {
            OverallStatus::Partial
        }
    }
}

/// Outcome of [`SyncService::sync_all`] for one user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompositeResult {
    pub user_id: String,
    pub sync_time: String,
    pub results: EntityResults,
    pub overall_status: OverallStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyncStats {
    pub has_transactions: bool,
    pub has_accounts: bool,
    pub has_profile: bool,
    pub transaction_count: usize,
    pub account_count: usize,
    pub profile_count: usize,
}

/// What the document store currently holds for one user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyncStatusReport {
    pub user_id: String,
    /// `updated_at` of the user's profile document, if one exists.
    pub last_sync: Option<String>,
    pub sync_stats: SyncStats,
}

/// Mirrors one relational ledger into one document store.
pub struct SyncService {
    ledger: Arc<dyn Ledger>,
    store: Arc<dyn DocumentStore>,
    transaction_limit: usize,
}

impl SyncService {
    pub fn new(ledger: Arc<dyn Ledger>, store: Arc<dyn DocumentStore>) -> Self {
        Self {
            ledger,
            store,
            transaction_limit: DEFAULT_TRANSACTION_LIMIT,
        }
    }

    /// Override the default `sync_transactions` limit. Zero is ignored.
    pub fn with_transaction_limit(mut self, limit: usize) -> Self {
        if limit > 0 {
            self.transaction_limit = limit;
        }
        self
    }

    pub fn transaction_limit(&self) -> usize {
        self.transaction_limit
    }

    /// Create any missing collections. Startup failures here are fatal to
    /// the caller, unlike per-entity sync failures.
    pub async fn ensure_schema(&self) -> Result<Vec<&'static str>> {
        ensure_schema(self.store.as_ref()).await
    }

    /// Mirror up to `limit` (default: the service limit) most recent
    /// transactions for a user.
    pub async fn sync_transactions(&self, user_id: &str, limit: Option<usize>) -> SyncOutcome {
        let limit = limit
            .filter(|l| *l > 0)
            .unwrap_or(self.transaction_limit);
        let result = self.try_sync_transactions(user_id, limit).await;
        settle("transactions", user_id, result)
    }

    pub async fn sync_accounts(&self, user_id: &str) -> SyncOutcome {
        let result = self.try_sync_accounts(user_id).await;
        settle("accounts", user_id, result)
    }

    pub async fn sync_profile(&self, user_id: &str) -> SyncOutcome {
        let result = self.try_sync_profile(user_id).await;
        settle("profile", user_id, result)
    }

    /// Profile, then accounts, then transactions. A failure in one never
    /// stops the others.
    pub async fn sync_all(&self, user_id: &str) -> CompositeResult {
        let sync_time = format_timestamp(Utc::now());

        let results = EntityResults {
            profile: self.sync_profile(user_id).await,
            accounts: self.sync_accounts(user_id).await,
            transactions: self.sync_transactions(user_id, None).await,
        };
        let overall_status = results.overall_status();

        match overall_status {
            OverallStatus::Success => info!(user_id, "full sync complete"),
            OverallStatus::Partial => warn!(user_id, "full sync completed partially"),
        }

        CompositeResult {
            user_id: user_id.to_string(),
            sync_time,
            results,
            overall_status,
        }
    }

    /// Run [`sync_all`](Self::sync_all) for each user in order.
    pub async fn sync_users(&self, user_ids: &[String]) -> Vec<CompositeResult> {
        let mut results = Vec::with_capacity(user_ids.len());
        for user_id in user_ids {
            results.push(self.sync_all(user_id).await);
        }
        info!(users = user_ids.len(), "batch sync finished");
        results
    }

    pub async fn sync_status(&self, user_id: &str) -> Result<SyncStatusReport> {
        let transaction_count = self.count(EntityKind::Transaction, user_id).await?;
        let account_count = self.count(EntityKind::Account, user_id).await?;
        let profile_count = self.count(EntityKind::Profile, user_id).await?;

        let last_sync = if profile_count > 0 {
            self.fetch_documents(EntityKind::Profile, user_id, Some(1))
                .await?
                .into_iter()
                .next()
                .and_then(|p| match p.properties.get("updated_at") {
                    Some(Value::String(ts)) if !ts.is_empty() => Some(ts.clone()),
                    _ => None,
                })
        } else {
            None
        };

        Ok(SyncStatusReport {
            user_id: user_id.to_string(),
            last_sync,
            sync_stats: SyncStats {
                has_transactions: transaction_count > 0,
                has_accounts: account_count > 0,
                has_profile: profile_count > 0,
                transaction_count,
                account_count,
                profile_count,
            },
        })
    }

    /// Mirrored documents of one kind for a user.
    pub async fn fetch_documents(
        &self,
        kind: EntityKind,
        user_id: &str,
        limit: Option<usize>,
    ) -> Result<Vec<StoredObject>> {
        self.store
            .fetch_by_user(kind.collection(), user_id, limit)
            .await
            .with_context(|| format!("Failed to fetch {} documents for {}", kind, user_id))
    }

    pub async fn list_collections(&self) -> Result<Vec<String>> {
        let mut names = self
            .store
            .list_collections()
            .await
            .context("Failed to list collections")?;
        names.sort();
        Ok(names)
    }

    async fn try_sync_transactions(&self, user_id: &str, limit: usize) -> Result<SyncOutcome> {
        let rows = self
            .ledger
            .recent_transactions(user_id, limit)
            .await
            .context("Failed to fetch transactions")?;
        if rows.is_empty() {
            return Ok(SyncOutcome::NoData { synced: 0 });
        }

        let documents = rows
            .iter()
            .map(|row| project_transaction(row).map(Document::Transaction))
            .collect::<Result<Vec<_>, _>>()?;

        let report = self.write(EntityKind::Transaction, &documents).await?;
        Ok(written(report, None))
    }

    async fn try_sync_accounts(&self, user_id: &str) -> Result<SyncOutcome> {
        let rows = self
            .ledger
            .accounts(user_id)
            .await
            .context("Failed to fetch accounts")?;
        if rows.is_empty() {
            return Ok(SyncOutcome::NoData { synced: 0 });
        }

        let now = Utc::now();
        let documents = rows
            .iter()
            .map(|row| project_account(row, now).map(Document::Account))
            .collect::<Result<Vec<_>, _>>()?;

        let report = self.write(EntityKind::Account, &documents).await?;
        Ok(written(report, None))
    }

    async fn try_sync_profile(&self, user_id: &str) -> Result<SyncOutcome> {
        let now: DateTime<Utc> = Utc::now();
        let snapshot = match self
            .ledger
            .profile_snapshot(user_id, window_start(now.date_naive()))
            .await
            .context("Failed to compute profile metrics")?
        {
            Some(snapshot) => snapshot,
            None => return Ok(SyncOutcome::UserNotFound),
        };

        let metrics = ProfileMetrics::from_aggregates(&snapshot.aggregates);
        let profile = project_profile(&snapshot.user, &metrics, now)?;

        let report = self
            .write(EntityKind::Profile, &[Document::UserProfile(profile.clone())])
            .await?;
        Ok(written(report, Some(profile)))
    }

    async fn write(&self, kind: EntityKind, documents: &[Document]) -> Result<BatchReport> {
        let objects = documents
            .iter()
            .map(|doc| -> Result<StoredObject> {
                Ok(StoredObject {
                    id: doc.id(),
                    properties: doc.to_properties()?,
                })
            })
            .collect::<Result<Vec<_>>>()
            .context("Failed to serialize documents")?;

        self.store
            .upsert_batch(kind.collection(), &objects)
            .await
            .with_context(|| format!("Failed to write {} batch", kind.collection()))
    }

    async fn count(&self, kind: EntityKind, user_id: &str) -> Result<usize> {
        self.store
            .count_by_user(kind.collection(), user_id)
            .await
            .with_context(|| format!("Failed to count {} documents", kind.collection()))
    }
}

/// Turn a batch report into an outcome. Any rejected document makes the
/// whole operation an error; accepted documents stay written.
fn written(report: BatchReport, profile: Option<UserProfileDocument>) -> SyncOutcome {
    if report.is_complete() {
        return SyncOutcome::Success {
            synced: report.accepted,
            last_sync: format_timestamp(Utc::now()),
            profile,
        };
    }

    let first = &report.rejected[0];
    SyncOutcome::Error {
        synced: report.accepted,
        error: format!(
            "{} of {} documents rejected (first {}: {})",
            report.rejected.len(),
            report.accepted + report.rejected.len(),
            first.id,
            first.message
        ),
    }
}

fn settle(operation: &'static str, user_id: &str, result: Result<SyncOutcome>) -> SyncOutcome {
    let outcome = result.unwrap_or_else(|err| SyncOutcome::Error {
        synced: 0,
        error: format!("{:#}", err),
    });

    match &outcome {
        SyncOutcome::Success { synced, .. } => info!(user_id, operation, synced, "synced"),
        SyncOutcome::NoData { .. } => info!(user_id, operation, "nothing to sync"),
        SyncOutcome::UserNotFound => warn!(user_id, operation, "user not found"),
        SyncOutcome::Error { synced, error } => {
            error!(user_id, operation, synced, error = %error, "sync failed")
        }
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::document_id;
    use crate::ledger::memory::InMemoryLedger;
    use crate::ledger::ProfileSnapshot;
    use crate::models::{AccountRow, TransactionRow, UserRow};
    use crate::store::memory::InMemoryStore;
    use crate::store::{CollectionSchema, RejectedObject};
    use anyhow::anyhow;
    use async_trait::async_trait;
    use chrono::{Days, NaiveDate};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn days_ago(n: u64) -> NaiveDate {
        Utc::now().date_naive().checked_sub_days(Days::new(n)).unwrap()
    }

    fn account(id: &str, kind: &str, balance: Decimal) -> AccountRow {
        AccountRow {
            account_id: id.to_string(),
            user_id: "u1".to_string(),
            name: Some(format!("{} account", kind)),
            account_type: Some(kind.to_string()),
            subtype: None,
            balance_current: Some(balance),
            balance_available: None,
            balance_limit: None,
            currency: None,
            institution_name: Some("First Bank".to_string()),
            updated_at: None,
        }
    }

    fn txn(id: &str, amount: Decimal, date: NaiveDate) -> TransactionRow {
        TransactionRow {
            transaction_id: id.to_string(),
            user_id: "u1".to_string(),
            account_id: Some("a1".to_string()),
            amount,
            name: Some(format!("txn {}", id)),
            category: None,
            date: Some(date),
            pending: false,
            merchant_name: None,
            payment_channel: None,
            location: None,
        }
    }

    /// User u1: one depository (5000), one credit (-1200), three recent
    /// transactions (+2000, -500, -300).
    fn seeded_ledger() -> InMemoryLedger {
        let ledger = InMemoryLedger::new();
        ledger.put_user(UserRow {
            user_id: "u1".to_string(),
            email: Some("u1@example.com".to_string()),
            created_at: None,
        });
        ledger.put_account(account("a1", "depository", dec!(5000)));
        ledger.put_account(account("a2", "credit", dec!(-1200)));
        ledger.put_transaction(txn("t1", dec!(2000), days_ago(10)));
        ledger.put_transaction(txn("t2", dec!(-500), days_ago(20)));
        ledger.put_transaction(txn("t3", dec!(-300), days_ago(30)));
        ledger
    }

    async fn service(ledger: Arc<dyn Ledger>) -> (SyncService, Arc<InMemoryStore>) {
        let store = Arc::new(InMemoryStore::new());
        let service = SyncService::new(ledger, store.clone());
        service.ensure_schema().await.unwrap();
        (service, store)
    }

    /// Delegates to an in-memory ledger but fails the account query.
    struct BrokenAccounts(InMemoryLedger);

    #[async_trait]
    impl Ledger for BrokenAccounts {
        async fn recent_transactions(
            &self,
            user_id: &str,
            limit: usize,
        ) -> Result<Vec<TransactionRow>> {
            self.0.recent_transactions(user_id, limit).await
        }

        async fn accounts(&self, _user_id: &str) -> Result<Vec<AccountRow>> {
            Err(anyhow!("connection reset by peer"))
        }

        async fn profile_snapshot(
            &self,
            user_id: &str,
            window_start: NaiveDate,
        ) -> Result<Option<ProfileSnapshot>> {
            self.0.profile_snapshot(user_id, window_start).await
        }
    }

    /// Rejects the first object of every batch.
    struct PickyStore(InMemoryStore);

    #[async_trait]
    impl DocumentStore for PickyStore {
        async fn list_collections(&self) -> Result<Vec<String>> {
            self.0.list_collections().await
        }

        async fn create_collection(&self, schema: &CollectionSchema) -> Result<()> {
            self.0.create_collection(schema).await
        }

        async fn upsert_batch(
            &self,
            collection: &str,
            objects: &[StoredObject],
        ) -> Result<BatchReport> {
            let (first, rest) = match objects.split_first() {
                Some(split) => split,
                None => return Ok(BatchReport::default()),
            };
            let mut report = self.0.upsert_batch(collection, rest).await?;
            report.rejected.insert(
                0,
                RejectedObject {
                    id: first.id,
                    message: "vector index busy".to_string(),
                },
            );
            Ok(report)
        }

        async fn fetch_by_user(
            &self,
            collection: &str,
            user_id: &str,
            limit: Option<usize>,
        ) -> Result<Vec<StoredObject>> {
            self.0.fetch_by_user(collection, user_id, limit).await
        }

        async fn count_by_user(&self, collection: &str, user_id: &str) -> Result<usize> {
            self.0.count_by_user(collection, user_id).await
        }
    }

    #[tokio::test]
    async fn test_sync_all_end_to_end() {
        let (service, store) = service(Arc::new(seeded_ledger())).await;

        let result = service.sync_all("u1").await;
        assert_eq!(result.overall_status, OverallStatus::Success);
        assert_eq!(result.results.accounts.synced(), 2);
        assert_eq!(result.results.transactions.synced(), 3);

        let profile = match &result.results.profile {
            SyncOutcome::Success {
                profile: Some(p), ..
            } => p.clone(),
            other => panic!("unexpected profile outcome: {:?}", other),
        };
        assert_eq!(profile.total_assets, 5000.0);
        assert_eq!(profile.total_liabilities, 1200.0);
        assert!((profile.monthly_income - 60000.0).abs() < 1e-6);
        assert!((profile.monthly_expenses - 12000.0).abs() < 1e-6);
        assert!((profile.savings_rate - 0.8).abs() < 1e-9);

        let stored = store
            .get("UserProfile", &document_id(EntityKind::Profile, "u1"))
            .unwrap();
        assert_eq!(stored.properties.get("email"), Some(&json!("u1@example.com")));
    }

    #[tokio::test]
    async fn test_resync_is_idempotent() {
        let (service, store) = service(Arc::new(seeded_ledger())).await;

        service.sync_all("u1").await;
        let first: Vec<_> = service
            .fetch_documents(EntityKind::Transaction, "u1", None)
            .await
            .unwrap()
            .into_iter()
            .map(|o| o.id)
            .collect();

        service.sync_all("u1").await;
        let second: Vec<_> = service
            .fetch_documents(EntityKind::Transaction, "u1", None)
            .await
            .unwrap()
            .into_iter()
            .map(|o| o.id)
            .collect();

        assert_eq!(first, second);
        assert_eq!(store.len("Transaction"), 3);
        assert_eq!(store.len("Account"), 2);
        assert_eq!(store.len("UserProfile"), 1);
    }

    #[tokio::test]
    async fn test_account_failure_is_isolated() {
        let (service, store) = service(Arc::new(BrokenAccounts(seeded_ledger()))).await;

        let result = service.sync_all("u1").await;
        assert_eq!(result.overall_status, OverallStatus::Partial);
        assert_eq!(result.results.accounts.status(), SyncStatus::Error);
        assert_eq!(result.results.profile.status(), SyncStatus::Success);
        assert_eq!(result.results.transactions.status(), SyncStatus::Success);

        match &result.results.accounts {
            SyncOutcome::Error { synced, error } => {
                assert_eq!(*synced, 0);
                assert!(error.contains("connection reset by peer"), "{}", error);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(store.len("Transaction"), 3);
    }

    #[tokio::test]
    async fn test_no_data_is_not_an_error() {
        let ledger = InMemoryLedger::new();
        ledger.put_user(UserRow {
            user_id: "u2".to_string(),
            email: None,
            created_at: None,
        });
        let (service, _store) = service(Arc::new(ledger)).await;

        let outcome = service.sync_transactions("u2", None).await;
        assert_eq!(outcome, SyncOutcome::NoData { synced: 0 });

        let result = service.sync_all("u2").await;
        assert_eq!(result.overall_status, OverallStatus::Success);
        assert_eq!(result.results.accounts.status(), SyncStatus::NoData);

        match &result.results.profile {
            SyncOutcome::Success {
                profile: Some(p), ..
            } => {
                assert_eq!(p.monthly_income, 0.0);
                assert_eq!(p.monthly_expenses, 0.0);
                assert_eq!(p.savings_rate, 0.0);
            }
            other => panic!("unexpected profile outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unknown_user_downgrades_composite() {
        let (service, _store) = service(Arc::new(seeded_ledger())).await;

        assert_eq!(service.sync_profile("ghost").await, SyncOutcome::UserNotFound);

        let result = service.sync_all("ghost").await;
        assert_eq!(result.overall_status, OverallStatus::Partial);
        assert_eq!(result.results.profile.status(), SyncStatus::UserNotFound);
        assert_eq!(result.results.accounts.status(), SyncStatus::NoData);
    }

    #[tokio::test]
    async fn test_transaction_limit_selects_most_recent() {
        let (service, _store) = service(Arc::new(seeded_ledger())).await;

        let outcome = service.sync_transactions("u1", Some(2)).await;
        assert_eq!(outcome.synced(), 2);

        let mut keys: Vec<String> = service
            .fetch_documents(EntityKind::Transaction, "u1", None)
            .await
            .unwrap()
            .into_iter()
            .filter_map(|o| o.properties.get("transaction_id").cloned())
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect();
        keys.sort();
        assert_eq!(keys, vec!["t1", "t2"]);
    }

    #[tokio::test]
    async fn test_rejected_documents_surface_as_error() {
        let store = Arc::new(PickyStore(InMemoryStore::new()));
        let service = SyncService::new(Arc::new(seeded_ledger()), store);
        service.ensure_schema().await.unwrap();

        match service.sync_transactions("u1", None).await {
            SyncOutcome::Error { synced, error } => {
                assert_eq!(synced, 2);
                assert!(error.starts_with("1 of 3 documents rejected"), "{}", error);
                assert!(error.contains("vector index busy"));
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_collection_is_caught() {
        let store = Arc::new(InMemoryStore::new());
        let service = SyncService::new(Arc::new(seeded_ledger()), store);

        let outcome = service.sync_accounts("u1").await;
        assert_eq!(outcome.status(), SyncStatus::Error);
    }

    #[tokio::test]
    async fn test_sync_status_reports_counts_and_last_sync() {
        let (service, _store) = service(Arc::new(seeded_ledger())).await;

        let before = service.sync_status("u1").await.unwrap();
        assert!(!before.sync_stats.has_profile);
        assert_eq!(before.last_sync, None);

        service.sync_all("u1").await;
        let after = service.sync_status("u1").await.unwrap();
        assert!(after.sync_stats.has_transactions);
        assert!(after.sync_stats.has_accounts);
        assert_eq!(after.sync_stats.transaction_count, 3);
        assert_eq!(after.sync_stats.profile_count, 1);
        assert!(after.last_sync.is_some());
    }

    #[tokio::test]
    async fn test_sync_users_continues_past_failures() {
        let (service, _store) = service(Arc::new(seeded_ledger())).await;

        let results = service
            .sync_users(&["ghost".to_string(), "u1".to_string()])
            .await;
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].overall_status, OverallStatus::Partial);
        assert_eq!(results[1].overall_status, OverallStatus::Success);
        assert_eq!(results[1].user_id, "u1");
    }

    #[test]
    fn test_outcome_wire_shape() {
        assert_eq!(
            serde_json::to_value(SyncOutcome::NoData { synced: 0 }).unwrap(),
            json!({"status": "no_data", "synced": 0})
        );
        assert_eq!(
            serde_json::to_value(SyncOutcome::UserNotFound).unwrap(),
            json!({"status": "user_not_found"})
        );
        let success = serde_json::to_value(SyncOutcome::Success {
            synced: 2,
            last_sync: "2024-06-01T00:00:00Z".to_string(),
            profile: None,
        })
        .unwrap();
        assert_eq!(success["status"], "success");
        assert!(success.get("profile").is_none());
    }
}
