//! Surface Events
//!
//! Events sent from a learner-facing surface to the conductor. They describe
//! what the learner did; the conductor decides what it means for the session.

use serde::{Deserialize, Serialize};

use crate::slides::DeckId;

/// Events from a surface to the conductor
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TutorEvent {
    /// A deck was picked, or the picker was cleared
    SelectDeck {
        /// The chosen deck; `None` clears the session
        deck_id: Option<DeckId>,
    },

    /// "Next" pressed
    NextSlide,

    /// "Previous" pressed
    PreviousSlide,

    /// "Explain this slide" pressed
    ExplainSlide,

    /// Free-form question submitted
    AskQuestion {
        /// Question text as typed
        question: String,
    },

    /// Surface wants a full state dump
    RequestSnapshot,

    /// Learner is leaving
    QuitRequested,
}

impl TutorEvent {
    /// Short name for logging
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::SelectDeck { .. } => "select_deck",
            Self::NextSlide => "next_slide",
            Self::PreviousSlide => "previous_slide",
            Self::ExplainSlide => "explain_slide",
            Self::AskQuestion { .. } => "ask_question",
            Self::RequestSnapshot => "request_snapshot",
            Self::QuitRequested => "quit_requested",
        }
    }
}
