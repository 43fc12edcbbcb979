#![allow(dead_code)]

use deployment::Deployment;
use reqwest::Client;
use serde_json::Value;
use server::{DeploymentImpl, app};
use services::services::config::StorefrontConfig;
use tokio::net::TcpListener;

pub struct TestServer {
    pub base: String,
    pub client: Client,
}

impl TestServer {
    /// Start the app on an ephemeral port. An HTTP catalog without an explicit
    /// base URL is pointed at the server itself.
    pub async fn spawn(mut config: StorefrontConfig) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let base = format!("http://{addr}");
        if config.catalog.base_url.is_none() {
            config.catalog.base_url = Some(base.clone());
        }

        let deployment = DeploymentImpl::new(config).await.unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app(deployment)).await.unwrap();
        });

        Self {
            base,
            client: Client::new(),
        }
    }

    pub async fn start() -> Self {
        Self::spawn(StorefrontConfig::default()).await
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.base, path)
    }

    pub async fn get(&self, path: &str, session: &str) -> (u16, Value) {
        let res = self
            .client
            .get(self.url(path))
            .header("x-session-id", session)
            .send()
            .await
            .unwrap();
        let status = res.status().as_u16();
        (status, res.json().await.unwrap())
    }

    pub async fn post(&self, path: &str, session: &str, body: Value) -> (u16, Value) {
        let res = self
            .client
            .post(self.url(path))
            .header("x-session-id", session)
            .json(&body)
            .send()
            .await
            .unwrap();
        let status = res.status().as_u16();
        (status, res.json().await.unwrap())
    }

    pub async fn delete(&self, path: &str, session: &str) -> (u16, Value) {
        let res = self
            .client
            .delete(self.url(path))
            .header("x-session-id", session)
            .send()
            .await
            .unwrap();
        let status = res.status().as_u16();
        (status, res.json().await.unwrap())
    }
}
