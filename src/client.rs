//! HTTP client for the PagerDuty REST API

use crate::errors::{ExporterError, Result};
use crate::models::{AnalyticsRequest, AnalyticsResponse, ListPage};
use crate::pagination::ResourceKind;
use async_trait::async_trait;
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use tracing::debug;

pub const ACCEPT_V2: &str = "application/vnd.pagerduty+json;version=2";
pub const ANALYTICS_EARLY_ACCESS: &str = "analytics-v2";
pub const ANALYTICS_SERVICES_PATH: &str = "/analytics/metrics/incidents/services";

/// Operations the collection pipeline needs from the upstream API
#[async_trait]
pub trait IncidentApi: Send + Sync {
    /// Fetch one page of a listing endpoint
    async fn list_page(&self, kind: ResourceKind, offset: usize, limit: usize) -> Result<ListPage>;

    /// Aggregate incident analytics for a set of services
    async fn service_analytics(&self, request: &AnalyticsRequest) -> Result<AnalyticsResponse>;
}

#[derive(Debug, Clone)]
pub struct PagerDutyClient {
    client: Client,
    api_url: String,
}

impl PagerDutyClient {
    /// Create a client authenticating with a static API token
    pub fn new(api_url: impl Into<String>, auth_token: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, HeaderValue::from_static(ACCEPT_V2));

        let mut authorization = HeaderValue::from_str(&format!("Token token={}", auth_token))
            .map_err(|e| ExporterError::Config(format!("invalid auth token: {}", e)))?;
        authorization.set_sensitive(true);
        headers.insert(header::AUTHORIZATION, authorization);

        let client = Client::builder()
            .default_headers(headers)
            .user_agent(format!("pd_exporter/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(ExporterError::Http)?;

        Ok(Self {
            client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Check the status, then decode the body as JSON
    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
        let status = response.status();

        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ExporterError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await.map_err(ExporterError::Http)?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait]
impl IncidentApi for PagerDutyClient {
    async fn list_page(&self, kind: ResourceKind, offset: usize, limit: usize) -> Result<ListPage> {
        let url = format!("{}/{}", self.api_url, kind.path());
        debug!("Listing {} at offset {} from {}", kind, offset, url);

        let response = self
            .client
            .get(&url)
            .query(&[("offset", offset), ("limit", limit)])
            .send()
            .await
            .map_err(ExporterError::Http)?;

        let envelope: serde_json::Value = Self::decode(response).await?;
        ListPage::from_envelope(envelope, kind.collection_key())
    }

    async fn service_analytics(&self, request: &AnalyticsRequest) -> Result<AnalyticsResponse> {
        let url = format!("{}{}", self.api_url, ANALYTICS_SERVICES_PATH);
        debug!(
            "Requesting analytics for {} services from {}",
            request.filters.service_ids.len(),
            url
        );

        let response = self
            .client
            .post(&url)
            .header("X-EARLY-ACCESS", ANALYTICS_EARLY_ACCESS)
            .json(request)
            .send()
            .await
            .map_err(ExporterError::Http)?;

        Self::decode(response).await
    }
}
