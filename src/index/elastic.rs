//! Elasticsearch-compatible index client
//!
//! Speaks the REST API directly over reqwest: `HEAD /{index}` + `PUT
//! /{index}` to ensure the index, `POST /_bulk?refresh=true` with an NDJSON
//! body to upsert, and `GET /` as the liveness probe.

use crate::config::IndexConfig;
use crate::index::schema::places_mapping;
use crate::index::traits::{BulkOutcome, IndexError, IndexResult, SearchIndex};
use crate::place::PlaceRecord;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

/// Production [`SearchIndex`] backed by an Elasticsearch-compatible node.
pub struct ElasticIndex {
    client: Client,
    node: String,
    index: String,
    startup_retries: u32,
    startup_delay: Duration,
}

#[derive(Debug, Deserialize)]
struct BulkResponse {
    #[serde(default)]
    errors: bool,
    #[serde(default)]
    items: Vec<Value>,
}

impl ElasticIndex {
    pub fn new(config: &IndexConfig) -> IndexResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            node: config.node.trim_end_matches('/').to_string(),
            index: config.index.clone(),
            startup_retries: config.startup_retries,
            startup_delay: config.startup_delay(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.node, path)
    }

    /// Builds the NDJSON bulk body: an action line addressing each document
    /// by its `source_id`, followed by the document itself.
    pub fn bulk_body(index: &str, records: &[PlaceRecord]) -> IndexResult<String> {
        let mut body = String::new();
        for record in records {
            let action = json!({ "index": { "_index": index, "_id": record.source_id } });
            body.push_str(&serde_json::to_string(&action)?);
            body.push('\n');
            body.push_str(&serde_json::to_string(record)?);
            body.push('\n');
        }
        Ok(body)
    }

    /// Extracts one description per errored item from a bulk response.
    fn collect_failures(items: &[Value]) -> Vec<String> {
        items
            .iter()
            .filter_map(|item| item.get("index"))
            .filter_map(|op| {
                let error = op.get("error").filter(|e| !e.is_null())?;
                let id = op.get("_id").and_then(Value::as_str).unwrap_or("<unknown>");
                let kind = error.get("type").and_then(Value::as_str).unwrap_or("error");
                let reason = error.get("reason").and_then(Value::as_str).unwrap_or("");
                Some(format!("{id}: {kind} {reason}"))
            })
            .collect()
    }
}

#[async_trait]
impl SearchIndex for ElasticIndex {
    async fn wait_ready(&self) -> IndexResult<()> {
        let mut last_error = String::new();
        for attempt in 1..=self.startup_retries {
            match self.client.get(self.url("/")).send().await {
                Ok(response) if response.status().is_success() => return Ok(()),
                Ok(response) => last_error = format!("HTTP {}", response.status()),
                Err(e) => last_error = e.to_string(),
            }
            tracing::warn!(
                "index not ready (attempt {}/{}): {}",
                attempt,
                self.startup_retries,
                last_error
            );
            if attempt < self.startup_retries {
                tokio::time::sleep(self.startup_delay).await;
            }
        }
        Err(IndexError::Unavailable {
            attempts: self.startup_retries,
            last_error,
        })
    }

    async fn ensure_index(&self) -> IndexResult<()> {
        let index_url = self.url(&format!("/{}", self.index));
        let head = self.client.head(&index_url).send().await?;

        match head.status() {
            status if status.is_success() => {
                tracing::debug!("index '{}' already exists", self.index);
                Ok(())
            }
            StatusCode::NOT_FOUND => {
                tracing::info!("creating index '{}'", self.index);
                let response = self
                    .client
                    .put(&index_url)
                    .json(&json!({ "mappings": places_mapping() }))
                    .send()
                    .await?;
                let status = response.status();
                if !status.is_success() {
                    let body = response.text().await.unwrap_or_default();
                    return Err(IndexError::BadStatus {
                        status: status.as_u16(),
                        body,
                    });
                }
                Ok(())
            }
            status => {
                let body = head.text().await.unwrap_or_default();
                Err(IndexError::BadStatus {
                    status: status.as_u16(),
                    body,
                })
            }
        }
    }

    async fn bulk_upsert(&self, records: &[PlaceRecord]) -> IndexResult<BulkOutcome> {
        let body = Self::bulk_body(&self.index, records)?;
        let response = self
            .client
            .post(self.url("/_bulk"))
            .query(&[("refresh", "true")])
            .header(reqwest::header::CONTENT_TYPE, "application/x-ndjson")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(IndexError::BadStatus {
                status: status.as_u16(),
                body: text,
            });
        }

        let parsed: BulkResponse = serde_json::from_str(&text)?;
        if !parsed.errors {
            return Ok(BulkOutcome {
                indexed: records.len(),
                failures: Vec::new(),
            });
        }

        let failures = Self::collect_failures(&parsed.items);
        Ok(BulkOutcome {
            indexed: records.len() - failures.len(),
            failures,
        })
    }
}
