use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::{debug, error};

use super::Gateway;
use crate::config::Config;
use crate::errors::AppError;
use crate::models::{ChatRequest, ChatResponse, HealthResponse, HistoryResponse, Statistics};

/// [`Gateway`] over the backend's JSON HTTP API.
#[derive(Clone)]
pub struct HttpGateway {
    client: Client,
    base_url: String,
}

impl HttpGateway {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::invalid_config("http client", e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        Self::new(&config.api_base_url, config.request_timeout)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{endpoint}", self.base_url)
    }

    /// Sends `request` and decodes a JSON body, logging any failure.
    async fn request<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        request: RequestBuilder,
    ) -> Result<T, AppError> {
        let result = self.send(endpoint, request).await;
        if let Err(e) = &result {
            error!("API request failed for {endpoint}: {e}");
        }
        result
    }

    async fn send<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        request: RequestBuilder,
    ) -> Result<T, AppError> {
        let resp = request
            .send()
            .await
            .map_err(|e| AppError::network(endpoint, e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(AppError::HttpStatus {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
            });
        }

        let body = resp.text().await.map_err(|e| AppError::network(endpoint, e))?;
        debug!("{endpoint} -> {status} ({} bytes)", body.len());
        serde_json::from_str(&body).map_err(|e| AppError::malformed(endpoint, e))
    }
}

#[async_trait]
impl Gateway for HttpGateway {
    async fn check_health(&self) -> Result<HealthResponse, AppError> {
        self.request("/health", self.client.get(self.url("/health")))
            .await
    }

    async fn ask(&self, question: &str) -> Result<ChatResponse, AppError> {
        let body = ChatRequest { question: question.to_string() };
        self.request("/chat", self.client.post(self.url("/chat")).json(&body))
            .await
    }

    async fn fetch_statistics(&self) -> Result<Statistics, AppError> {
        self.request("/stats", self.client.get(self.url("/stats")))
            .await
    }

    async fn fetch_history(&self, date: &str) -> Result<HistoryResponse, AppError> {
        if NaiveDate::parse_from_str(date, "%Y-%m-%d").is_err() {
            return Err(AppError::InvalidDate { date: date.to_string() });
        }
        let endpoint = format!("/history/{date}");
        self.request(&endpoint, self.client.get(self.url(&endpoint)))
            .await
    }
}
