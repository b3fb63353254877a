use anyhow::{bail, Result};
use common::{EventPage, EventSubmission, SecurityEvent, SecurityStats, StatsPatch, SystemHealth};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};

#[derive(Clone)]
pub struct AgentClient {
    client: Client,
    base_url: String,
}

impl AgentClient {
    pub fn new(base_url: &str) -> Result<Self> {
        Ok(Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(5))
                .build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn status(&self) -> Result<Value> {
        self.send(self.client.get(self.url("/api/status"))).await
    }

    pub async fn events(&self, page: usize, limit: usize) -> Result<EventPage> {
        let request = self
            .client
            .get(self.url("/api/events"))
            .query(&[("page", page), ("limit", limit)]);
        self.send(request).await
    }

    pub async fn submit(&self, submission: &EventSubmission) -> Result<SecurityEvent> {
        self.post("/api/events", submission).await
    }

    pub async fn stats(&self) -> Result<SecurityStats> {
        self.send(self.client.get(self.url("/api/stats"))).await
    }

    pub async fn update_stats(&self, patch: &StatsPatch) -> Result<SecurityStats> {
        self.post("/api/stats", patch).await
    }

    pub async fn health(&self) -> Result<SystemHealth> {
        self.send(self.client.get(self.url("/api/health"))).await
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<Value> {
        self.post("/api/auth/login", &json!({ "username": username, "password": password }))
            .await
    }

    pub async fn verify(&self, token: &str) -> Result<Value> {
        self.send(self.client.get(self.url("/api/auth/verify")).bearer_auth(token))
            .await
    }

    pub async fn logout(&self, token: &str) -> Result<Value> {
        self.send(self.client.post(self.url("/api/auth/logout")).bearer_auth(token))
            .await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        self.send(self.client.post(self.url(path)).json(body)).await
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body: Value = response.json().await.unwrap_or(Value::Null);
            let message = body["error"]["message"]
                .as_str()
                .unwrap_or("no error message")
                .to_string();
            bail!("agent returned {}: {}", status, message);
        }
        Ok(response.json().await?)
    }
}
