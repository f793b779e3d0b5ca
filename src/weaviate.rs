//! Weaviate-backed [`DocumentStore`] implementation.
//!
//! Talks to Weaviate's REST and GraphQL endpoints:
//!
//! | Operation | Request |
//! |-----------|---------|
//! | list collections | `GET /v1/schema` |
//! | create collection | `POST /v1/schema` (`vectorizer: none`) |
//! | batch upsert | `POST /v1/batch/objects` |
//! | fetch by user | GraphQL `Get` with `where user_id Equal` |
//! | count by user | GraphQL `Aggregate { meta { count } }` |
//!
//! Batch writes are create-or-replace by object id. Per-object failures come
//! back in the batch response and are reported in [`BatchReport::rejected`];
//! an object the response does not mention is rejected too.
//!
//! A fetch without a limit pages through `Get` with `limit`/`offset` until a
//! short page, so the server's default result cap never truncates it.

use std::collections::HashMap;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use ledger_mirror_core::store::{
    schema_named, BatchReport, CollectionSchema, DocumentStore, RejectedObject, StoredObject,
};
use ledger_mirror_core::DocumentId;

use crate::config::StoreConfig;

/// Page size used when a fetch has no caller-supplied limit.
const PAGE_SIZE: usize = 100;

/// Rejection message for objects absent from the batch response.
const MISSING_RESULT: &str = "no batch result returned";

pub struct WeaviateStore {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl WeaviateStore {
    pub fn new(base_url: &str, api_key: Option<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.is_empty()),
        })
    }

    pub fn from_config(config: &StoreConfig) -> Result<Self> {
        let url = config
            .url
            .as_deref()
            .ok_or_else(|| anyhow!("store.url must be set when backend is 'weaviate'"))?;
        Self::new(
            url,
            config.api_key.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let builder = self
            .client
            .request(method, format!("{}{}", self.base_url, path));
        match &self.api_key {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        }
    }

    async fn send(&self, builder: reqwest::RequestBuilder, what: &str) -> Result<Value> {
        let resp = builder
            .send()
            .await
            .with_context(|| format!("Weaviate {} request failed", what))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            bail!("Weaviate {} returned {}: {}", what, status, body);
        }

        resp.json()
            .await
            .with_context(|| format!("Weaviate {} returned invalid JSON", what))
    }

    async fn graphql(&self, query: String) -> Result<Value> {
        let body = self
            .send(
                self.request(reqwest::Method::POST, "/v1/graphql")
                    .json(&json!({ "query": query })),
                "graphql",
            )
            .await?;

        let response: GraphQlResponse = serde_json::from_value(body)?;
        if let Some(first) = response.errors.first() {
            bail!("Weaviate graphql error: {}", first.message);
        }
        response
            .data
            .ok_or_else(|| anyhow!("Weaviate graphql response has no data"))
    }

    /// One `Get` page of a user's objects, `_additional.id` lifted into the id.
    async fn get_page(
        &self,
        collection: &str,
        user_id: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<StoredObject>> {
        let schema = lookup_schema(collection)?;
        let fields: Vec<&str> = schema.property_names().collect();

        let query = format!(
            "{{ Get {{ {}({}, limit: {}, offset: {}) {{ {} _additional {{ id }} }} }} }}",
            collection,
            user_filter(user_id),
            limit,
            offset,
            fields.join(" ")
        );
        let data = self.graphql(query).await?;

        let hits = data
            .pointer(&format!("/Get/{}", collection))
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        hits.into_iter()
            .map(|hit| -> Result<StoredObject> {
                let mut properties: Map<String, Value> = match hit {
                    Value::Object(map) => map,
                    other => bail!("unexpected Get result entry: {}", other),
                };
                let id = properties
                    .remove("_additional")
                    .and_then(|extra| extra.get("id").and_then(Value::as_str).map(str::to_string))
                    .ok_or_else(|| anyhow!("Get result entry has no id"))?;
                Ok(StoredObject {
                    id: id.parse().with_context(|| format!("Invalid object id {}", id))?,
                    properties,
                })
            })
            .collect()
    }
}

#[derive(Deserialize)]
struct SchemaResponse {
    #[serde(default)]
    classes: Vec<ClassEntry>,
}

#[derive(Deserialize)]
struct ClassEntry {
    class: String,
}

#[derive(Deserialize)]
struct GraphQlResponse {
    data: Option<Value>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Deserialize)]
struct BatchItem {
    id: Option<String>,
    result: Option<BatchItemResult>,
}

#[derive(Deserialize)]
struct BatchItemResult {
    errors: Option<BatchErrors>,
}

#[derive(Deserialize)]
struct BatchErrors {
    #[serde(default)]
    error: Vec<GraphQlError>,
}

/// GraphQL filter matching `user_id` exactly.
fn user_filter(user_id: &str) -> String {
    // serde_json quoting doubles as GraphQL string escaping
    let quoted = Value::String(user_id.to_string()).to_string();
    format!(
        r#"where: {{ path: ["user_id"], operator: Equal, valueText: {} }}"#,
        quoted
    )
}

fn lookup_schema(collection: &str) -> Result<&'static CollectionSchema> {
    schema_named(collection).ok_or_else(|| anyhow!("unknown collection {}", collection))
}

#[async_trait]
impl DocumentStore for WeaviateStore {
    async fn list_collections(&self) -> Result<Vec<String>> {
        let body = self
            .send(self.request(reqwest::Method::GET, "/v1/schema"), "schema")
            .await?;
        let schema: SchemaResponse = serde_json::from_value(body)?;
        Ok(schema.classes.into_iter().map(|c| c.class).collect())
    }

    async fn create_collection(&self, schema: &CollectionSchema) -> Result<()> {
        let properties: Vec<Value> = schema
            .properties
            .iter()
            .map(|p| json!({ "name": p.name, "dataType": [p.data_type] }))
            .collect();

        self.send(
            self.request(reqwest::Method::POST, "/v1/schema").json(&json!({
                "class": schema.name,
                "vectorizer": "none",
                "properties": properties,
            })),
            "create class",
        )
        .await?;
        Ok(())
    }

    async fn upsert_batch(
        &self,
        collection: &str,
        objects: &[StoredObject],
    ) -> Result<BatchReport> {
        if objects.is_empty() {
            return Ok(BatchReport::default());
        }

        let payload: Vec<Value> = objects
            .iter()
            .map(|o| {
                json!({
                    "class": collection,
                    "id": o.id,
                    "properties": o.properties,
                })
            })
            .collect();

        let body = self
            .send(
                self.request(reqwest::Method::POST, "/v1/batch/objects")
                    .json(&json!({ "objects": payload })),
                "batch",
            )
            .await?;
        let items: Vec<BatchItem> = serde_json::from_value(body)?;

        let mut results: HashMap<DocumentId, Option<BatchItemResult>> = HashMap::new();
        for item in items {
            if let Some(id) = item.id.and_then(|raw| raw.parse::<DocumentId>().ok()) {
                results.insert(id, item.result);
            }
        }

        let mut report = BatchReport::default();
        for object in objects {
            let message = match results.remove(&object.id) {
                None => Some(MISSING_RESULT.to_string()),
                Some(result) => result
                    .and_then(|r| r.errors)
                    .and_then(|e| e.error.into_iter().next())
                    .map(|first| first.message),
            };
            match message {
                None => report.accepted += 1,
                Some(message) => report.rejected.push(RejectedObject {
                    id: object.id,
                    message,
                }),
            }
        }
        Ok(report)
    }

    async fn fetch_by_user(
        &self,
        collection: &str,
        user_id: &str,
        limit: Option<usize>,
    ) -> Result<Vec<StoredObject>> {
        if let Some(limit) = limit {
            return self.get_page(collection, user_id, limit, 0).await;
        }

        let mut all = Vec::new();
        loop {
            let page = self
                .get_page(collection, user_id, PAGE_SIZE, all.len())
                .await?;
            let short = page.len() < PAGE_SIZE;
            all.extend(page);
            if short {
                return Ok(all);
            }
        }
    }

    async fn count_by_user(&self, collection: &str, user_id: &str) -> Result<usize> {
        let query = format!(
            "{{ Aggregate {{ {}({}) {{ meta {{ count }} }} }} }}",
            collection,
            user_filter(user_id)
        );
        let data = self.graphql(query).await?;

        let count = data
            .pointer(&format!("/Aggregate/{}/0/meta/count", collection))
            .and_then(Value::as_u64)
            .unwrap_or(0);
        Ok(count as usize)
    }
}
