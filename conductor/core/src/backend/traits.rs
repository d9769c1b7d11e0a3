//! Tutor Backend Traits
//!
//! Trait definitions for the tutoring backend. The conductor only talks to
//! the backend through [`TutorBackend`], so tests can drive a session with a
//! scripted backend and the CLI can swap in the HTTP one.
//!
//! # Design Philosophy
//!
//! The TutorBackend trait provides a common interface for:
//! - Listing the slides of a deck
//! - Fetching a rendered slide image
//! - Asking the AI teacher to explain a slide (or answer a question)
//! - Health checking the backend
//!
//! Implementations handle transport details (URLs, auth headers, decoding).

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::slides::{DeckId, SlideRecord};

/// Errors returned by backend operations
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum BackendError {
    /// The backend answered with a non-2xx status
    #[error("Backend returned {status}{}", detail_suffix(.detail))]
    Status {
        /// HTTP status code
        status: u16,
        /// `detail` field of the error body, when present
        detail: Option<String>,
    },

    /// The request never produced a response
    #[error("Request failed: {0}")]
    Transport(String),

    /// The response body could not be decoded
    #[error("Unexpected response: {0}")]
    Decode(String),
}

fn detail_suffix(detail: &Option<String>) -> String {
    detail
        .as_deref()
        .map(|d| format!(": {d}"))
        .unwrap_or_default()
}

impl BackendError {
    /// The structured `detail` message from the failure payload
    #[must_use]
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::Status { detail, .. } => detail.as_deref(),
            Self::Transport(_) | Self::Decode(_) => None,
        }
    }

    /// Text to show the user: the backend's detail, else `default`
    #[must_use]
    pub fn user_message(&self, default: &str) -> String {
        self.detail().unwrap_or(default).to_string()
    }
}

/// Answer to a free-form question
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    /// The answer text
    pub answer: String,
    /// Whether the backend served it from its cache
    #[serde(default)]
    pub cached: bool,
    /// Which model provider produced it (`openai`, `gemini`, `cache`)
    #[serde(default)]
    pub provider: String,
}

/// Tutor backend trait
///
/// Implement this trait to point the conductor at a different backend.
#[async_trait]
pub trait TutorBackend: Send + Sync {
    /// Get the backend name (e.g., "HTTP")
    fn name(&self) -> &str;

    /// Check if the backend is healthy and reachable
    async fn health_check(&self) -> bool;

    /// List the slides of a deck, in order
    async fn list_slides(&self, deck_id: DeckId) -> Result<Vec<SlideRecord>, BackendError>;

    /// Fetch the rendered image of one slide
    async fn slide_image(&self, deck_id: DeckId, slide_number: u32)
        -> Result<Bytes, BackendError>;

    /// Ask the AI teacher to explain one slide
    async fn explain_slide(
        &self,
        deck_id: DeckId,
        slide_number: u32,
    ) -> Result<String, BackendError>;

    /// Ask a free-form question, optionally grounded in a deck
    async fn ask(&self, question: &str, deck_id: Option<DeckId>) -> Result<Answer, BackendError>;
}
