//! HTTP client for the audit API.

use crate::CliResult;
use autodev_core::{
    Audit, AuditCreated, AuditDetail, AutodevError, CreateAuditRequest, Statistics,
};
use log::debug;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;

pub(crate) const DEFAULT_API_URL: &str = "http://localhost:8000";
const USER_AGENT: &str = "autodev-cli";

/// Boxed future returned by [`AuditApi`] operations.
pub(crate) type ApiFuture<'a, T> =
    Pin<Box<dyn Future<Output = autodev_core::Result<T>> + Send + 'a>>;

/// Operations offered by the audit API. Calls are pass-through: no caching, no retries.
pub(crate) trait AuditApi: Send + Sync {
    fn create_audit<'a>(&'a self, request: &'a CreateAuditRequest) -> ApiFuture<'a, AuditCreated>;

    fn list_audits(&self) -> ApiFuture<'_, Vec<Audit>>;

    fn get_audit(&self, id: i64) -> ApiFuture<'_, AuditDetail>;

    fn delete_audit(&self, id: i64) -> ApiFuture<'_, ()>;

    fn get_statistics(&self) -> ApiFuture<'_, Statistics>;
}

/// Reqwest-backed audit API client.
pub(crate) struct ReqwestAuditClient {
    client: Client,
    base_url: String,
}

impl ReqwestAuditClient {
    /// Build a client for the API rooted at `base_url`.
    pub(crate) fn new(base_url: &str) -> CliResult<Self> {
        let base_url = normalize_api_url(base_url)?;
        let client = Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self { client, base_url })
    }
}

impl AuditApi for ReqwestAuditClient {
    fn create_audit<'a>(&'a self, request: &'a CreateAuditRequest) -> ApiFuture<'a, AuditCreated> {
        Box::pin(create_audit(&self.client, &self.base_url, request))
    }

    fn list_audits(&self) -> ApiFuture<'_, Vec<Audit>> {
        Box::pin(list_audits(&self.client, &self.base_url))
    }

    fn get_audit(&self, id: i64) -> ApiFuture<'_, AuditDetail> {
        Box::pin(get_audit(&self.client, &self.base_url, id))
    }

    fn delete_audit(&self, id: i64) -> ApiFuture<'_, ()> {
        Box::pin(delete_audit(&self.client, &self.base_url, id))
    }

    fn get_statistics(&self) -> ApiFuture<'_, Statistics> {
        Box::pin(get_statistics(&self.client, &self.base_url))
    }
}

/// Normalize the API base URL for consistent request paths.
pub(crate) fn normalize_api_url(api_url: &str) -> CliResult<String> {
    let trimmed = api_url.trim();
    if trimmed.is_empty() {
        return Err("api url is required".into());
    }
    Ok(trimmed.trim_end_matches('/').to_string())
}

async fn create_audit(
    client: &Client,
    base_url: &str,
    request: &CreateAuditRequest,
) -> autodev_core::Result<AuditCreated> {
    let url = format!("{base_url}/api/audits/");
    debug!("POST {url}");
    let response = client
        .post(url)
        .json(request)
        .send()
        .await
        .map_err(network_error)?;
    decode(ensure_success(response).await?).await
}

async fn list_audits(client: &Client, base_url: &str) -> autodev_core::Result<Vec<Audit>> {
    let url = format!("{base_url}/api/audits/");
    debug!("GET {url}");
    let response = client.get(url).send().await.map_err(network_error)?;
    decode(ensure_success(response).await?).await
}

async fn get_audit(client: &Client, base_url: &str, id: i64) -> autodev_core::Result<AuditDetail> {
    let url = format!("{base_url}/api/audits/{id}");
    debug!("GET {url}");
    let response = client.get(url).send().await.map_err(network_error)?;
    decode(ensure_success(response).await?).await
}

async fn delete_audit(client: &Client, base_url: &str, id: i64) -> autodev_core::Result<()> {
    let url = format!("{base_url}/api/audits/{id}");
    debug!("DELETE {url}");
    let response = client.delete(url).send().await.map_err(network_error)?;
    ensure_success(response).await?;
    Ok(())
}

async fn get_statistics(client: &Client, base_url: &str) -> autodev_core::Result<Statistics> {
    let url = format!("{base_url}/api/stats/");
    debug!("GET {url}");
    let response = client.get(url).send().await.map_err(network_error)?;
    decode(ensure_success(response).await?).await
}

fn network_error(error: reqwest::Error) -> AutodevError {
    AutodevError::Network(error.to_string())
}

/// Turn a non-2xx response into a server error carrying its `detail`.
async fn ensure_success(response: Response) -> autodev_core::Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(AutodevError::Server {
        status: status.as_u16(),
        detail: extract_detail(&body),
    })
}

async fn decode<T: DeserializeOwned>(response: Response) -> autodev_core::Result<T> {
    let body = response.bytes().await.map_err(network_error)?;
    serde_json::from_slice(&body).map_err(|err| AutodevError::Decode(err.to_string()))
}

/// Pull the `detail` field out of an error body.
///
/// Request validation failures carry a list of `{msg}` objects instead of a string.
fn extract_detail(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    match value.get("detail")? {
        Value::String(message) if !message.trim().is_empty() => Some(message.clone()),
        Value::Array(items) => {
            let messages: Vec<&str> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(Value::as_str))
                .collect();
            if messages.is_empty() {
                None
            } else {
                Some(messages.join("; "))
            }
        }
        Value::Null | Value::String(_) => None,
        other => Some(other.to_string()),
    }
}
