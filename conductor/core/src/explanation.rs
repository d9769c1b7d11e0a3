//! Slide Explanations
//!
//! Tracks the one-shot "explain this slide" request. The requester doesn't
//! serialize calls: a second explain while one is pending simply issues a new
//! ticket, and only the newest ticket is allowed to write the status.
//! Navigation and deck changes void the outstanding ticket, so a late answer
//! for a slide the user has left never shows up.

use serde::{Deserialize, Serialize};

use crate::backend::BackendError;
use crate::slides::DeckId;

/// Shown when the backend gives no reason for a failed explanation
pub const DEFAULT_EXPLANATION_ERROR: &str = "Failed to get explanation";

/// Lifecycle of the explanation for the current slide
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExplanationStatus {
    /// Nothing requested for this slide
    #[default]
    None,
    /// Request in flight
    Pending,
    /// The teacher's explanation
    Fulfilled(String),
    /// Request failed; message is user-facing
    Failed(String),
}

impl ExplanationStatus {
    /// Whether a request is in flight
    #[must_use]
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    /// The explanation text, if one arrived
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Fulfilled(text) => Some(text),
            _ => None,
        }
    }

    /// The failure message, if the request failed
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Failed(message) => Some(message),
            _ => None,
        }
    }
}

/// An explanation request in flight
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExplanationRequest {
    /// Deck of the slide being explained
    pub deck_id: DeckId,
    /// Slide being explained
    pub slide_number: u32,
    /// Invocation order; newest wins
    pub ticket: u64,
}

impl ExplanationRequest {
    /// The `(deck, slide)` this request was issued for
    #[must_use]
    pub fn key(&self) -> (DeckId, u32) {
        (self.deck_id, self.slide_number)
    }
}

/// What happened when an explanation result was applied
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExplanationOutcome {
    /// Explanation stored
    Fulfilled,
    /// Failure stored
    Failed {
        /// User-facing message
        message: String,
    },
    /// Superseded by navigation or a newer request
    Stale,
}

/// Issues explanation requests and records their results
#[derive(Debug, Default)]
pub struct ExplanationRequester {
    status: ExplanationStatus,
    pending: Option<ExplanationRequest>,
    next_ticket: u64,
}

impl ExplanationRequester {
    /// Create a requester with no explanation
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current status
    #[must_use]
    pub fn status(&self) -> &ExplanationStatus {
        &self.status
    }

    /// Start explaining `(deck_id, slide_number)`
    ///
    /// Clears any previous explanation or error and marks the status pending.
    pub fn begin(&mut self, deck_id: DeckId, slide_number: u32) -> ExplanationRequest {
        self.next_ticket += 1;
        let request = ExplanationRequest {
            deck_id,
            slide_number,
            ticket: self.next_ticket,
        };
        self.pending = Some(request);
        self.status = ExplanationStatus::Pending;
        request
    }

    /// Back to `None`, voiding any outstanding request
    pub fn reset(&mut self) {
        self.status = ExplanationStatus::None;
        self.pending = None;
    }

    /// Apply a finished request
    pub fn complete(
        &mut self,
        request: ExplanationRequest,
        result: Result<String, BackendError>,
        live_slide: Option<(DeckId, u32)>,
    ) -> ExplanationOutcome {
        if self.pending != Some(request) || live_slide != Some(request.key()) {
            tracing::debug!(
                deck = %request.deck_id,
                slide = request.slide_number,
                ticket = request.ticket,
                "Discarding superseded explanation"
            );
            return ExplanationOutcome::Stale;
        }

        self.pending = None;
        match result {
            Ok(text) => {
                self.status = ExplanationStatus::Fulfilled(text);
                ExplanationOutcome::Fulfilled
            }
            Err(e) => {
                let message = e.user_message(DEFAULT_EXPLANATION_ERROR);
                tracing::warn!(
                    deck = %request.deck_id,
                    slide = request.slide_number,
                    error = %e,
                    "Explanation request failed"
                );
                self.status = ExplanationStatus::Failed(message.clone());
                ExplanationOutcome::Failed { message }
            }
        }
    }
}
