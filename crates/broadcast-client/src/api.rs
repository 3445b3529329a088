//! REST session lifecycle client.
//!
//! The backend owns the canonical session record; this client only issues
//! the three lifecycle calls and maps failures into the shared taxonomy.
//! No call here is retried automatically — retry is a user action.

use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use broadcast_core::{CreateSessionRequest, Result, SessionError, SessionRecord};

use crate::config::ApiConfig;

/// Backend session endpoints, as seen by the client.
///
/// The trait seam exists so the controller and viewer can be exercised
/// against in-memory fakes; production uses [`HttpSessionApi`].
#[async_trait(?Send)]
pub trait SessionApi {
    async fn create_session(&self, request: &CreateSessionRequest) -> Result<SessionRecord>;

    async fn stop_session(&self, id: Uuid) -> Result<()>;

    async fn fetch_session(&self, id: Uuid) -> Result<SessionRecord>;
}

/// reqwest-backed implementation with bearer auth.
pub struct HttpSessionApi {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl HttpSessionApi {
    pub fn new(config: &ApiConfig, token: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()
            .map_err(|e| SessionError::network(None, format!("http client init: {e}")))?;

        let base_url = url::Url::parse(&config.base_url)
            .map_err(|e| SessionError::State(format!("invalid API base url: {e}")))?;

        Ok(Self {
            http,
            base_url: base_url.as_str().trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn decode<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(SessionError::network(status.as_u16(), message));
        }
        response
            .json::<T>()
            .await
            .map_err(|e| SessionError::network(None, format!("malformed response body: {e}")))
    }
}

#[async_trait(?Send)]
impl SessionApi for HttpSessionApi {
    async fn create_session(&self, request: &CreateSessionRequest) -> Result<SessionRecord> {
        let response = self
            .http
            .post(self.url("/api/v1/sessions"))
            .bearer_auth(&self.token)
            .json(request)
            .send()
            .await
            .map_err(|e| SessionError::network(None, e.to_string()))?;
        Self::decode(response).await
    }

    async fn stop_session(&self, id: Uuid) -> Result<()> {
        let response = self
            .http
            .post(self.url(&format!("/api/v1/sessions/{id}/stop")))
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| SessionError::network(None, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(SessionError::network(status.as_u16(), message));
        }
        Ok(())
    }

    async fn fetch_session(&self, id: Uuid) -> Result<SessionRecord> {
        let response = self
            .http
            .get(self.url(&format!("/api/v1/sessions/{id}")))
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| SessionError::network(None, e.to_string()))?;
        Self::decode(response).await
    }
}
