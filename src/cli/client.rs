use std::time::Duration;

use anyhow::{anyhow, Context};
use serde_json::Value;

/// Thin HTTP client that unwraps the `{success, data}` envelope.
pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn get(&self, path: &str) -> anyhow::Result<Value> {
        let response = self
            .http
            .get(self.url(path))
            .send()
            .await
            .with_context(|| format!("GET {} failed", path))?;
        unwrap_envelope(response).await
    }

    pub async fn put(&self, path: &str, body: &Value) -> anyhow::Result<Value> {
        let response = self
            .http
            .put(self.url(path))
            .json(body)
            .send()
            .await
            .with_context(|| format!("PUT {} failed", path))?;
        unwrap_envelope(response).await
    }

    pub async fn delete(&self, path: &str) -> anyhow::Result<Value> {
        let response = self
            .http
            .delete(self.url(path))
            .send()
            .await
            .with_context(|| format!("DELETE {} failed", path))?;
        unwrap_envelope(response).await
    }
}

async fn unwrap_envelope(response: reqwest::Response) -> anyhow::Result<Value> {
    let status = response.status();
    let body: Value = response
        .json()
        .await
        .with_context(|| format!("server returned a non-JSON body ({})", status))?;
    envelope_data(status.as_u16(), body)
}

fn envelope_data(status: u16, mut body: Value) -> anyhow::Result<Value> {
    if body["success"].as_bool() == Some(true) {
        return Ok(body["data"].take());
    }

    let message = body["error"].as_str().unwrap_or("request failed");
    let code = body["code"].as_str().unwrap_or("UNKNOWN");
    let mut error = format!("{} {}: {}", status, code, message);
    if let Some(errors) = body["errors"].as_array() {
        for field in errors {
            if let Some(text) = field["message"].as_str() {
                error.push_str(&format!("\n  - {}", text));
            }
        }
    }
    Err(anyhow!(error))
}
