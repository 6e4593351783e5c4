//! HTTP client for the ReCog endpoints of the forge server.

use async_trait::async_trait;
use recog_core::{
    Insight, Operation, Pattern, ProcessResult, Progression, RecordId, Report, StatusSnapshot,
    wire,
};
use reqwest::header::{self, HeaderMap, HeaderValue};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::{debug, info};

use crate::api::{ListQuery, Page, RecogApi};
use crate::{ClientConfig, ClientError};

/// HTTP client for `/recog/*`.
///
/// Every response is a JSON envelope carrying `success`; a `false` there is
/// raised as [`ClientError::Application`] with the server's message.
pub struct RecogClient {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Deserialize)]
struct CheckResponse {
    #[serde(default)]
    count: u32,
}

#[derive(Deserialize)]
struct PendingResponse {
    #[serde(default, deserialize_with = "wire::or_default")]
    pending: Vec<Operation>,
}

#[derive(Deserialize)]
struct ProcessResponse {
    #[serde(default, deserialize_with = "wire::or_default")]
    results: Vec<ProcessResult>,
}

#[derive(Deserialize)]
struct InsightsResponse {
    #[serde(default, deserialize_with = "wire::or_default")]
    insights: Vec<Insight>,
    #[serde(default)]
    total: Option<u64>,
}

#[derive(Deserialize)]
struct PatternsResponse {
    #[serde(default, deserialize_with = "wire::or_default")]
    patterns: Vec<Pattern>,
    #[serde(default)]
    total: Option<u64>,
}

#[derive(Deserialize)]
struct ReportsResponse {
    #[serde(default, deserialize_with = "wire::or_default")]
    reports: Vec<Report>,
}

impl RecogClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .user_agent(config.user_agent.as_str())
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/recog/{}", self.base_url, path)
    }

    fn record_url(&self, collection: &str, id: &RecordId, suffix: &str) -> String {
        let mut url = self.url(&format!("{collection}/{}", urlencoding::encode(id.as_str())));
        if !suffix.is_empty() {
            url.push('/');
            url.push_str(suffix);
        }
        url
    }

    async fn get(&self, url: &str, query: &[(String, String)]) -> Result<Value, ClientError> {
        debug!(url = %url, "GET");
        let resp = self.client.get(url).query(query).send().await?;
        read_envelope(resp).await
    }

    async fn post(&self, url: &str, body: Option<Value>) -> Result<Value, ClientError> {
        debug!(url = %url, "POST");
        let req = self.client.post(url);
        let req = match body {
            Some(body) => req.json(&body),
            None => req,
        };
        let resp = req.send().await?;
        read_envelope(resp).await
    }
}

async fn read_envelope(resp: reqwest::Response) -> Result<Value, ClientError> {
    let status = resp.status().as_u16();
    let body = resp.text().await?;
    decode_envelope(status, &body)
}

/// Check the `success` envelope and HTTP status, returning the parsed body.
pub(crate) fn decode_envelope(status: u16, body: &str) -> Result<Value, ClientError> {
    let ok_status = (200..300).contains(&status);
    let value: Value = match serde_json::from_str(body) {
        Ok(v) => v,
        Err(_) if !ok_status => {
            return Err(ClientError::Server {
                status,
                body: body.to_string(),
            });
        }
        Err(e) => return Err(ClientError::Json(e)),
    };

    let success = value.get("success").and_then(Value::as_bool);
    if ok_status && success != Some(false) {
        return Ok(value);
    }

    let message = value
        .get("error")
        .or_else(|| value.get("message"))
        .and_then(Value::as_str)
        .map(str::to_string);
    match message {
        Some(message) => Err(ClientError::Application(message)),
        None if !ok_status => Err(ClientError::Server {
            status,
            body: body.to_string(),
        }),
        None => Err(ClientError::Application("request failed".to_string())),
    }
}

/// Decode a detail payload that is either wrapped (`{"insight": {...}}`) or
/// the bare record.
fn record_field<T: DeserializeOwned>(mut value: Value, field: &str) -> Result<T, ClientError> {
    let inner = match value.get_mut(field) {
        Some(inner) if inner.is_object() => inner.take(),
        _ => value,
    };
    Ok(serde_json::from_value(inner)?)
}

#[async_trait]
impl RecogApi for RecogClient {
    async fn status(&self) -> Result<StatusSnapshot, ClientError> {
        let value = self.get(&self.url("status"), &[]).await?;
        Ok(serde_json::from_value(value)?)
    }

    async fn check(&self) -> Result<u32, ClientError> {
        let value = self.post(&self.url("check"), None).await?;
        let resp: CheckResponse = serde_json::from_value(value)?;
        info!(count = resp.count, "check queued operations");
        Ok(resp.count)
    }

    async fn pending(&self) -> Result<Vec<Operation>, ClientError> {
        let value = self.get(&self.url("pending"), &[]).await?;
        let resp: PendingResponse = serde_json::from_value(value)?;
        debug!(count = resp.pending.len(), "fetched pending operations");
        Ok(resp.pending)
    }

    async fn confirm(&self, id: &RecordId) -> Result<(), ClientError> {
        let url = self.url(&format!("confirm/{}", urlencoding::encode(id.as_str())));
        self.post(&url, None).await?;
        info!(id = %id, "operation confirmed");
        Ok(())
    }

    async fn cancel(&self, id: &RecordId) -> Result<(), ClientError> {
        let url = self.url(&format!("cancel/{}", urlencoding::encode(id.as_str())));
        self.post(&url, None).await?;
        info!(id = %id, "operation unconfirmed");
        Ok(())
    }

    async fn process(&self) -> Result<Vec<ProcessResult>, ClientError> {
        let value = self.post(&self.url("process"), None).await?;
        let resp: ProcessResponse = serde_json::from_value(value)?;
        info!(results = resp.results.len(), "processed batch");
        Ok(resp.results)
    }

    async fn insights(&self, query: &ListQuery) -> Result<Page<Insight>, ClientError> {
        let value = self.get(&self.url("insights"), &query.query_pairs()).await?;
        let resp: InsightsResponse = serde_json::from_value(value)?;
        debug!(count = resp.insights.len(), total = ?resp.total, "fetched insights");
        Ok(Page::new(resp.insights, resp.total))
    }

    async fn insight(&self, id: &RecordId) -> Result<Insight, ClientError> {
        let value = self.get(&self.record_url("insights", id, ""), &[]).await?;
        record_field(value, "insight")
    }

    async fn set_flag(&self, id: &RecordId, flagged: bool) -> Result<bool, ClientError> {
        let url = self.record_url("insights", id, "flag");
        let value = self.post(&url, Some(json!({ "flagged": flagged }))).await?;
        Ok(value
            .get("flagged")
            .and_then(Value::as_bool)
            .unwrap_or(flagged))
    }

    async fn save_context(&self, id: &RecordId, text: &str) -> Result<(), ClientError> {
        let url = self.record_url("insights", id, "context");
        self.post(&url, Some(json!({ "user_context": text })))
            .await?;
        Ok(())
    }

    async fn reject(&self, id: &RecordId, reject: bool) -> Result<(), ClientError> {
        let url = self.record_url("insights", id, "reject");
        self.post(&url, Some(json!({ "reject": reject }))).await?;
        info!(id = %id, reject, "insight reject toggled");
        Ok(())
    }

    async fn patterns(&self, limit: u32) -> Result<Page<Pattern>, ClientError> {
        let query = [("limit".to_string(), limit.to_string())];
        let value = self.get(&self.url("patterns"), &query).await?;
        let resp: PatternsResponse = serde_json::from_value(value)?;
        Ok(Page::new(resp.patterns, resp.total))
    }

    async fn pattern(&self, id: &RecordId) -> Result<Pattern, ClientError> {
        let value = self.get(&self.record_url("patterns", id, ""), &[]).await?;
        record_field(value, "pattern")
    }

    async fn reports(&self) -> Result<Page<Report>, ClientError> {
        let value = self.get(&self.url("reports"), &[]).await?;
        let resp: ReportsResponse = serde_json::from_value(value)?;
        Ok(Page::new(resp.reports, None))
    }

    async fn report(&self, id: &RecordId) -> Result<Report, ClientError> {
        let value = self
            .get(&self.record_url("reports", id, "details"), &[])
            .await?;
        record_field(value, "report")
    }

    async fn progression(&self) -> Result<Progression, ClientError> {
        let value = self.get(&self.url("progression"), &[]).await?;
        Ok(serde_json::from_value(value)?)
    }
}
