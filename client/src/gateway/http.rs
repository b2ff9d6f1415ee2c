//! HTTP implementation of the gateway on top of reqwest

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use shared::{
    CsvPayload, InventoryItem, Job, JobCreated, JobId, PickingList, School, UploadKind,
    UploadOutcome,
};

use super::Gateway;
use crate::config::{ApiConfig, BaseUrlResolver};
use crate::error::{ClientError, ClientResult};

/// Gateway client for the allocation API
#[derive(Clone)]
pub struct HttpGateway {
    client: Client,
    base_url: String,
}

impl HttpGateway {
    /// Create a gateway for whatever base URL the resolver yields
    pub fn new(resolver: &dyn BaseUrlResolver) -> Self {
        Self::with_base_url(resolver.base_url())
    }

    /// Create a gateway with a fixed base URL (for testing)
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Create a gateway from configuration, applying the request timeout
    pub fn from_config(api: &ApiConfig) -> ClientResult<Self> {
        let client = Client::builder()
            .timeout(api.timeout())
            .build()
            .map_err(|e| ClientError::Configuration(format!("HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: api.resolver().base_url(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        tracing::debug!("GET {}", path);
        let response = self.client.get(self.url(path)).send().await?;
        Self::read(response).await
    }

    async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        tracing::debug!("POST {}", path);
        let response = self.client.post(self.url(path)).send().await?;
        Self::read(response).await
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> ClientResult<T>
    where
        B: serde::Serialize + Sync,
        T: DeserializeOwned,
    {
        tracing::debug!("POST {}", path);
        let response = self.client.post(self.url(path)).json(body).send().await?;
        Self::read(response).await
    }

    /// Map a response onto the error taxonomy and decode the body
    async fn read<T: DeserializeOwned>(response: Response) -> ClientResult<T> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        if !status.is_success() {
            return Err(ClientError::Server {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|e| ClientError::MalformedResponse(e.to_string()))
    }
}

#[async_trait]
impl Gateway for HttpGateway {
    async fn fetch_schools(&self) -> ClientResult<Vec<School>> {
        self.get("/schools").await
    }

    async fn fetch_inventory(&self) -> ClientResult<Vec<InventoryItem>> {
        self.get("/inventory").await
    }

    async fn trigger_optimize(&self) -> ClientResult<JobCreated> {
        self.post_empty("/optimize").await
    }

    async fn fetch_job_status(&self, job_id: JobId) -> ClientResult<Job> {
        self.get(&format!("/jobs/{}", job_id)).await
    }

    async fn fetch_picking_list(&self, job_id: JobId) -> ClientResult<PickingList> {
        self.get(&format!("/picking/{}", job_id)).await
    }

    async fn upload_csv(&self, kind: UploadKind, csv_content: &str) -> ClientResult<UploadOutcome> {
        let payload = CsvPayload {
            csv_content: csv_content.to_string(),
        };
        self.post_json(&format!("/upload/{}/text", kind), &payload).await
    }
}
