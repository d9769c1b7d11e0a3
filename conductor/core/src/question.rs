//! Free-form Questions
//!
//! "Ask the AI tutor" requests. Works like the slide explainer: the newest
//! question wins, and a question grounded in a deck is voided when the deck
//! changes. Navigation within a deck leaves it alone.

use serde::{Deserialize, Serialize};

use crate::backend::{Answer, BackendError};
use crate::slides::DeckId;

/// Shown when the backend gives no reason for a failed question
pub const DEFAULT_QUESTION_ERROR: &str = "Failed to get response";

/// Lifecycle of the latest question
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuestionStatus {
    /// No question asked
    #[default]
    None,
    /// Waiting for the answer
    Pending,
    /// The tutor's answer
    Answered(Answer),
    /// Request failed; message is user-facing
    Failed(String),
}

/// A question in flight
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuestionRequest {
    /// Trimmed question text
    pub question: String,
    /// Deck the question is grounded in
    pub deck_id: Option<DeckId>,
    /// Invocation order; newest wins
    pub ticket: u64,
}

/// What happened when an answer was applied
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum QuestionOutcome {
    /// Answer stored
    Answered,
    /// Failure stored
    Failed {
        /// User-facing message
        message: String,
    },
    /// Superseded by a newer question or a deck change
    Stale,
}

/// Issues questions and records their answers
#[derive(Debug, Default)]
pub struct QuestionRequester {
    status: QuestionStatus,
    pending_ticket: Option<u64>,
    next_ticket: u64,
}

impl QuestionRequester {
    /// Create a requester with no question
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current status
    #[must_use]
    pub fn status(&self) -> &QuestionStatus {
        &self.status
    }

    /// Start asking `question`; blank questions are ignored
    pub fn begin(&mut self, question: &str, deck_id: Option<DeckId>) -> Option<QuestionRequest> {
        let question = question.trim();
        if question.is_empty() {
            return None;
        }

        self.next_ticket += 1;
        self.pending_ticket = Some(self.next_ticket);
        self.status = QuestionStatus::Pending;
        Some(QuestionRequest {
            question: question.to_string(),
            deck_id,
            ticket: self.next_ticket,
        })
    }

    /// Forget everything (deck changed)
    pub fn reset(&mut self) {
        self.status = QuestionStatus::None;
        self.pending_ticket = None;
    }

    /// Apply a finished request
    ///
    /// A deck-grounded question is only applied while `live_deck` is still
    /// its deck.
    pub fn complete(
        &mut self,
        request: &QuestionRequest,
        result: Result<Answer, BackendError>,
        live_deck: Option<DeckId>,
    ) -> QuestionOutcome {
        let deck_ok = request.deck_id.is_none() || request.deck_id == live_deck;
        if self.pending_ticket != Some(request.ticket) || !deck_ok {
            tracing::debug!(ticket = request.ticket, "Discarding superseded answer");
            return QuestionOutcome::Stale;
        }

        self.pending_ticket = None;
        match result {
            Ok(answer) => {
                self.status = QuestionStatus::Answered(answer);
                QuestionOutcome::Answered
            }
            Err(e) => {
                let message = e.user_message(DEFAULT_QUESTION_ERROR);
                tracing::warn!(error = %e, "Question request failed");
                self.status = QuestionStatus::Failed(message.clone());
                QuestionOutcome::Failed { message }
            }
        }
    }
}
