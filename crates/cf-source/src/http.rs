//! Paged HTTP row source
//!
//! Speaks the datasets-server row API: `GET {base_url}?dataset=..&config=..
//! &split=..&offset=..&length=..` returning `{"rows": [{"row": {...}}, ..]}`.
//! Transport failures and non-success statuses surface as `SourceError::Http`
//! so the orchestrator can treat them as retryable external-service errors.

use async_trait::async_trait;
use std::time::Duration;

use cf_core::config::FetchConfig;

use crate::error::{SourceError, SourceResult};
use crate::source::{RawRow, RowSource};

/// Row source backed by a paged HTTP row API.
pub struct HttpRowSource {
    client: reqwest::Client,
    base_url: String,
    dataset: String,
    config: String,
    split: String,
}

impl HttpRowSource {
    /// Build a source from fetch configuration. The configured timeout is
    /// the only deadline in the pipeline and applies per request.
    pub fn from_config(fetch: &FetchConfig) -> SourceResult<Self> {
        let dataset = fetch
            .dataset
            .clone()
            .ok_or_else(|| SourceError::Http("no dataset configured".to_string()))?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(fetch.timeout_secs))
            .build()
            .map_err(|e| SourceError::Http(e.to_string()))?;
        Ok(Self {
            client,
            base_url: fetch.base_url.clone(),
            dataset,
            config: fetch.config.clone(),
            split: fetch.split.clone(),
        })
    }

    /// Extract rows from one response payload.
    fn parse_rows(payload: &serde_json::Value, offset: usize) -> SourceResult<Vec<RawRow>> {
        let rows = payload
            .get("rows")
            .and_then(|r| r.as_array())
            .ok_or_else(|| SourceError::Decode("payload has no 'rows' array".to_string()))?;
        rows.iter()
            .map(|entry| {
                entry
                    .get("row")
                    .and_then(|r| r.as_object())
                    .cloned()
                    .ok_or_else(|| SourceError::MalformedRow {
                        offset,
                        message: "entry has no 'row' object".to_string(),
                    })
            })
            .collect()
    }
}

#[async_trait]
impl RowSource for HttpRowSource {
    async fn fetch_page(&self, offset: usize, length: usize) -> SourceResult<Vec<RawRow>> {
        let query = [
            ("dataset", self.dataset.clone()),
            ("config", self.config.clone()),
            ("split", self.split.clone()),
            ("offset", offset.to_string()),
            ("length", length.to_string()),
        ];
        let response = self
            .client
            .get(&self.base_url)
            .query(&query)
            .send()
            .await
            .map_err(|e| SourceError::Http(format!("offset {}: {}", offset, e)))?
            .error_for_status()
            .map_err(|e| SourceError::Http(format!("offset {}: {}", offset, e)))?;

        let payload: serde_json::Value = response
            .json()
            .await
            .map_err(|e| SourceError::Decode(e.to_string()))?;
        Self::parse_rows(&payload, offset)
    }

    fn describe(&self) -> String {
        format!("{} (dataset {})", self.base_url, self.dataset)
    }
}
