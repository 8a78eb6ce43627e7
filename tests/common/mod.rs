#![allow(dead_code)]

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde_json::Value;

use platform_builder_api::app::app;
use platform_builder_api::config::{AppConfig, StoreBackend};
use platform_builder_api::database::MemoryStore;
use platform_builder_api::state::AppState;

/// An API server running inside the test's runtime over a fresh memory store.
pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    client: reqwest::Client,
}

impl TestServer {
    pub async fn start() -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
            .await
            .with_context(|| format!("failed to bind test port {}", port))?;

        let mut config = AppConfig::development();
        config.store = StoreBackend::Memory;
        let state = AppState::new(Arc::new(MemoryStore::new()), config);
        tokio::spawn(async move {
            let _ = axum::serve(listener, app(state)).await;
        });

        let server = Self {
            port,
            base_url,
            client: reqwest::Client::new(),
        };
        server.wait_ready(Duration::from_secs(5)).await?;
        Ok(server)
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            if let Ok(resp) = self.client.get(self.url("/health")).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn get(&self, path: &str) -> Result<(StatusCode, Value)> {
        let res = self.client.get(self.url(path)).send().await?;
        Ok((res.status(), res.json().await?))
    }

    pub async fn post(&self, path: &str, body: &Value) -> Result<(StatusCode, Value)> {
        let res = self.client.post(self.url(path)).json(body).send().await?;
        Ok((res.status(), res.json().await?))
    }

    pub async fn put(&self, path: &str, body: &Value) -> Result<(StatusCode, Value)> {
        let res = self.client.put(self.url(path)).json(body).send().await?;
        Ok((res.status(), res.json().await?))
    }

    pub async fn delete(&self, path: &str) -> Result<(StatusCode, Value)> {
        let res = self.client.delete(self.url(path)).send().await?;
        Ok((res.status(), res.json().await?))
    }

    pub fn raw(&self) -> &reqwest::Client {
        &self.client
    }

    /// POST a platform and return the `data` of a 200 response.
    pub async fn create_platform(&self, body: Value) -> Result<Value> {
        let (status, res) = self.post("/api/platforms", &body).await?;
        assert_eq!(status, StatusCode::OK, "create failed: {}", res);
        Ok(data(res))
    }

    pub async fn update_platform(&self, id: &str, body: Value) -> Result<Value> {
        let (status, res) = self.put(&format!("/api/platforms/{}", id), &body).await?;
        assert_eq!(status, StatusCode::OK, "update failed: {}", res);
        Ok(data(res))
    }

    pub async fn get_platform(&self, id: &str) -> Result<Value> {
        let (status, res) = self.get(&format!("/api/platforms/{}", id)).await?;
        assert_eq!(status, StatusCode::OK, "get failed: {}", res);
        Ok(data(res))
    }
}

/// Check the success flag and take the payload out of the envelope.
pub fn data(mut body: Value) -> Value {
    assert_eq!(body["success"], true, "success flag false or missing: {}", body);
    body["data"].take()
}

pub fn id_of(value: &Value) -> String {
    value["id"].as_str().expect("id should be a string").to_string()
}
