//! Conductor Messages
//!
//! Messages sent from the conductor to a surface. Surfaces are renderers:
//! every change to what the learner should see arrives as one of these, and
//! a [`TutorMessage::Snapshot`] can always be requested to resync.

use serde::{Deserialize, Serialize};

use crate::avatar::AvatarState;
use crate::backend::Answer;
use crate::session::SessionSnapshot;
use crate::slides::{DeckId, SlideRecord};

/// Messages from the conductor to a surface
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TutorMessage {
    // ============================================
    // Lifecycle
    // ============================================
    /// Conductor state changed
    State {
        /// New state
        state: ConductorState,
    },

    /// Something worth telling the learner outside the slide view
    Notify {
        /// Severity
        level: NotifyLevel,
        /// Text to show
        message: String,
    },

    /// Full session view
    Snapshot {
        /// The session as it stands
        snapshot: Box<SessionSnapshot>,
    },

    /// Conductor is done; surface should exit
    Quit {
        /// Parting words
        message: Option<String>,
    },

    // ============================================
    // Deck and Slides
    // ============================================
    /// Deck selection changed (`None` = cleared)
    DeckSelected {
        /// Selected deck
        deck_id: Option<DeckId>,
    },

    /// Slide list request went out
    SlidesLoading {
        /// Deck being loaded
        deck_id: DeckId,
    },

    /// Slide list arrived
    SlidesLoaded {
        /// Deck loaded
        deck_id: DeckId,
        /// Number of slides
        count: usize,
    },

    /// Slide list request failed
    SlideListError {
        /// User-facing message
        message: String,
    },

    /// The slide on screen changed
    SlideChanged {
        /// 0-based position
        index: usize,
        /// Total slides
        count: usize,
        /// The slide now on screen
        slide: SlideRecord,
    },

    // ============================================
    // Images
    // ============================================
    /// Image fetch went out for the current slide
    ImageLoading {
        /// Slide number
        slide_number: u32,
    },

    /// Image installed for the current slide
    ImageReady {
        /// Slide number
        slide_number: u32,
        /// Image size in bytes
        bytes: usize,
    },

    /// Image could not be fetched; show a placeholder
    ImageUnavailable {
        /// Slide number
        slide_number: u32,
    },

    // ============================================
    // Teacher
    // ============================================
    /// Avatar state changed
    Avatar {
        /// New state
        state: AvatarState,
        /// Caption to show with it
        caption: String,
        /// Animation hint (`steady`, `pulse`, `smile`)
        animation: String,
    },

    /// Explanation requested
    ExplanationPending {
        /// Slide being explained
        slide_number: u32,
    },

    /// Explanation arrived
    Explanation {
        /// Slide explained
        slide_number: u32,
        /// Explanation text
        text: String,
    },

    /// Explanation request failed
    ExplanationFailed {
        /// User-facing message
        message: String,
    },

    /// Explanation cleared by navigation or deck change
    ExplanationCleared,

    /// Question sent
    QuestionPending {
        /// Trimmed question
        question: String,
    },

    /// Answer arrived
    Answer {
        /// The answer
        answer: Answer,
    },

    /// Question failed
    QuestionFailed {
        /// User-facing message
        message: String,
    },
}

impl TutorMessage {
    /// Avatar message for `state`, with its caption and animation hint
    #[must_use]
    pub fn avatar(state: AvatarState) -> Self {
        Self::Avatar {
            state,
            caption: state.caption().to_string(),
            animation: state.suggested_animation().to_string(),
        }
    }
}

/// Notification levels
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotifyLevel {
    /// Informational
    Info,
    /// Warning
    Warning,
    /// Error
    Error,
}

/// Conductor operational states
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConductorState {
    /// Starting up, not ready
    Initializing,
    /// Ready for input
    Ready,
    /// Shutting down
    ShuttingDown,
}

impl ConductorState {
    /// Human-readable description
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Initializing => "Starting up...",
            Self::Ready => "Ready",
            Self::ShuttingDown => "Goodbye!",
        }
    }
}
