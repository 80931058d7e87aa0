//! API client for communicating with the scheduler service

use anyhow::{Context, Result};
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::collections::BTreeMap;
use url::Url;

/// API client for the scheduler service
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    /// Create a new API client
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        let base_url = Url::parse(base_url).context("Invalid API URL")?;

        Ok(Self { client, base_url })
    }

    /// Make a GET request
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.base_url.join(path).context("Invalid path")?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to send request")?;

        Self::parse(response).await
    }

    /// Make a POST request with JSON body
    pub async fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T> {
        let url = self.base_url.join(path).context("Invalid path")?;

        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .context("Failed to send request")?;

        Self::parse(response).await
    }

    /// Make a PUT request with JSON body
    pub async fn put<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T> {
        let url = self.base_url.join(path).context("Invalid path")?;

        let response = self
            .client
            .put(url)
            .json(body)
            .send()
            .await
            .context("Failed to send request")?;

        Self::parse(response).await
    }

    /// Make a DELETE request
    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.base_url.join(path).context("Invalid path")?;

        let response = self
            .client
            .delete(url)
            .send()
            .await
            .context("Failed to send request")?;

        Self::parse(response).await
    }

    async fn parse<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("API error ({}): {}", status, error_message(&body));
        }

        response.json().await.context("Failed to parse response")
    }
}

/// Extract the server's error message from a failure body, falling back
/// to the raw body when it is not the JSON error shape.
fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorResponse>(body)
        .map(|e| e.error)
        .unwrap_or_else(|_| body.to_string())
}

// API response types

/// Aggregated resource quantities as reported in node snapshots
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResourceTotals {
    #[serde(default)]
    pub milli_cpu: i64,
    #[serde(default)]
    pub memory: i64,
    #[serde(default)]
    pub ephemeral_storage: i64,
    #[serde(default)]
    pub scalar: BTreeMap<String, i64>,
}

/// One node snapshot from `GET /nodes`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeView {
    pub node_name: String,
    pub allocatable: ResourceTotals,
    pub requested: ResourceTotals,
    pub pod_count: usize,
    pub allowed_pods: i64,
}

/// Result of a scheduling request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleResultView {
    pub workload: String,
    pub feasible: Vec<String>,
    #[serde(default)]
    pub failures: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub errors: BTreeMap<String, String>,
}

/// Health report from `/healthz`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthView {
    pub status: String,
    #[serde(default)]
    pub components: BTreeMap<String, ComponentView>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentView {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Readiness report from `/readyz`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessView {
    pub ready: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
