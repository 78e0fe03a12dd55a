use crate::config::{ImportConfig, UserAgentConfig};
use crate::harvest::build_http_client;
use crate::output::traits::{RecordSink, SinkError, SinkResult, SinkReport};
use crate::record::EnrichedRecord;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;
use url::Url;

/// Posts records to the downstream import endpoint in fixed-size batches
///
/// Each request carries `{"products": [...]}`. A rejected batch is logged and
/// recorded in the report; later batches are still sent.
pub struct ImportSink {
    client: Client,
    endpoint: Url,
    batch_size: usize,
    api_key: Option<String>,
}

impl ImportSink {
    pub fn new(config: &ImportConfig, user_agent: &UserAgentConfig) -> SinkResult<Self> {
        let endpoint = Url::parse(&config.endpoint)
            .map_err(|e| SinkError::InvalidEndpoint(format!("{}: {}", config.endpoint, e)))?;
        if config.batch_size == 0 {
            return Err(SinkError::InvalidEndpoint(
                "batch-size must be greater than 0".to_string(),
            ));
        }
        let client = build_http_client(user_agent, Duration::from_secs(30), config.api_key.as_deref())?;

        Ok(Self {
            client,
            endpoint,
            batch_size: config.batch_size,
            api_key: config.api_key.clone(),
        })
    }

    async fn post_batch(&self, batch: &[EnrichedRecord]) -> Result<(), String> {
        let products: Vec<Value> = batch
            .iter()
            .map(|record| Value::Object(record.fields().clone()))
            .collect();

        let mut request = self
            .client
            .post(self.endpoint.clone())
            .json(&json!({ "products": products }));
        if let Some(key) = &self.api_key {
            request = request.header("apikey", key);
        }

        let response = request.send().await.map_err(|e| e.to_string())?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(format!("HTTP {}: {}", status.as_u16(), body.trim()))
        }
    }
}

#[async_trait]
impl RecordSink for ImportSink {
    async fn write_all(&mut self, records: &[EnrichedRecord]) -> SinkResult<SinkReport> {
        let mut report = SinkReport::default();
        let batches = records.len().div_ceil(self.batch_size);

        for (index, batch) in records.chunks(self.batch_size).enumerate() {
            let number = index + 1;
            match self.post_batch(batch).await {
                Ok(()) => {
                    tracing::info!("Imported batch {}/{} ({} records)", number, batches, batch.len());
                    report.written += batch.len();
                }
                Err(e) => {
                    tracing::warn!("Import batch {}/{} failed: {}", number, batches, e);
                    report.failed_batches.push(number);
                }
            }
        }

        Ok(report)
    }
}
