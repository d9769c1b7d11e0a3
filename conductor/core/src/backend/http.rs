//! HTTP Backend Implementation
//!
//! Tutor backend that talks to the ai-tutor REST API.
//!
//! # Endpoints
//!
//! - `GET  /api/v1/ai/slides/{deck}` - Slide list for a deck
//! - `GET  /api/v1/ai/slide-image/{deck}/{slide}` - Rendered slide image
//! - `POST /api/v1/ai/explain-slide` - Explanation of one slide
//! - `POST /api/v1/ai/ask` - Free-form question
//! - `GET  /health` - Liveness probe
//!
//! Every request carries the bearer token handed over by the login flow.
//! Non-2xx responses become [`BackendError::Status`] with the `detail` field
//! of the JSON error body when the backend supplied one.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use serde::Deserialize;

use super::traits::{Answer, BackendError, TutorBackend};
use crate::config::ApiConfig;
use crate::slides::{DeckId, SlideRecord, SlidesResponse};

#[derive(Deserialize)]
struct ExplanationResponse {
    explanation: String,
}

/// HTTP tutor backend client
#[derive(Clone)]
pub struct HttpBackend {
    /// API root, without trailing slash
    base_url: String,
    /// Bearer token
    token: String,
    /// HTTP client
    http_client: reqwest::Client,
}

impl HttpBackend {
    /// Create a new HTTP backend
    pub fn new(base_url: impl Into<String>, token: impl Into<String>, timeout: Duration) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            token: token.into(),
            http_client: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
        }
    }

    /// Create from the `[api]` configuration
    #[must_use]
    pub fn from_config(config: &ApiConfig) -> Self {
        Self::new(
            config.base_url.clone(),
            config.token.clone().unwrap_or_default(),
            config.timeout,
        )
    }

    /// Get the base URL
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn slides_url(&self, deck_id: DeckId) -> String {
        format!("{}/api/v1/ai/slides/{deck_id}", self.base_url)
    }

    fn image_url(&self, deck_id: DeckId, slide_number: u32) -> String {
        format!(
            "{}/api/v1/ai/slide-image/{deck_id}/{slide_number}",
            self.base_url
        )
    }

    fn explain_url(&self) -> String {
        format!("{}/api/v1/ai/explain-slide", self.base_url)
    }

    fn ask_url(&self) -> String {
        format!("{}/api/v1/ai/ask", self.base_url)
    }

    fn health_url(&self) -> String {
        format!("{}/health", self.base_url)
    }

    fn authorized(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if self.token.is_empty() {
            builder
        } else {
            builder.bearer_auth(&self.token)
        }
    }

    /// Send a request and turn non-2xx answers into errors
    async fn execute(
        &self,
        builder: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, BackendError> {
        let response = self
            .authorized(builder)
            .send()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        // FastAPI puts a human-readable message in `detail`
        let detail = response
            .json::<serde_json::Value>()
            .await
            .ok()
            .and_then(|body| {
                body.get("detail")
                    .and_then(serde_json::Value::as_str)
                    .map(String::from)
            });

        Err(BackendError::Status {
            status: status.as_u16(),
            detail,
        })
    }
}

#[async_trait]
impl TutorBackend for HttpBackend {
    fn name(&self) -> &'static str {
        "HTTP"
    }

    async fn health_check(&self) -> bool {
        self.http_client
            .get(self.health_url())
            .timeout(Duration::from_secs(5))
            .send()
            .await
            .is_ok_and(|r| r.status().is_success())
    }

    async fn list_slides(&self, deck_id: DeckId) -> Result<Vec<SlideRecord>, BackendError> {
        let response = self
            .execute(self.http_client.get(self.slides_url(deck_id)))
            .await?;

        let data: SlidesResponse = response
            .json()
            .await
            .map_err(|e| BackendError::Decode(e.to_string()))?;

        Ok(data.slides)
    }

    async fn slide_image(
        &self,
        deck_id: DeckId,
        slide_number: u32,
    ) -> Result<Bytes, BackendError> {
        let response = self
            .execute(self.http_client.get(self.image_url(deck_id, slide_number)))
            .await?;

        response
            .bytes()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))
    }

    async fn explain_slide(
        &self,
        deck_id: DeckId,
        slide_number: u32,
    ) -> Result<String, BackendError> {
        let body = serde_json::json!({
            "slide_deck_id": deck_id.get(),
            "slide_number": slide_number,
        });

        let response = self
            .execute(self.http_client.post(self.explain_url()).json(&body))
            .await?;

        let data: ExplanationResponse = response
            .json()
            .await
            .map_err(|e| BackendError::Decode(e.to_string()))?;

        Ok(data.explanation)
    }

    async fn ask(&self, question: &str, deck_id: Option<DeckId>) -> Result<Answer, BackendError> {
        let mut body = serde_json::json!({ "question": question });
        if let Some(deck_id) = deck_id {
            body["slide_deck_id"] = serde_json::json!(deck_id.get());
        }

        let response = self
            .execute(self.http_client.post(self.ask_url()).json(&body))
            .await?;

        response
            .json()
            .await
            .map_err(|e| BackendError::Decode(e.to_string()))
    }
}
