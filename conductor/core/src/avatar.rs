//! Teacher Avatar
//!
//! The avatar has no memory of its own. Its state is re-derived from the
//! explanation status every time, so it can't drift out of step with the
//! request lifecycle.
//!
//! | Explanation          | Avatar      |
//! |----------------------|-------------|
//! | `None` / `Failed`    | `Idle`      |
//! | `Pending`            | `Thinking`  |
//! | `Fulfilled`          | `Answering` |

use serde::{Deserialize, Serialize};

use crate::explanation::ExplanationStatus;

/// Presentation state of the teacher avatar
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AvatarState {
    /// Ready and waiting
    #[default]
    Idle,
    /// Explanation in flight
    Thinking,
    /// Explanation on screen
    Answering,
}

impl AvatarState {
    /// Derive the avatar state from the explanation status
    #[must_use]
    pub fn derive(status: &ExplanationStatus) -> Self {
        match status {
            ExplanationStatus::None | ExplanationStatus::Failed(_) => Self::Idle,
            ExplanationStatus::Pending => Self::Thinking,
            ExplanationStatus::Fulfilled(_) => Self::Answering,
        }
    }

    /// Caption shown under the avatar
    #[must_use]
    pub fn caption(&self) -> &'static str {
        match self {
            Self::Idle => "Your AI Teacher is ready!",
            Self::Thinking => "Thinking...",
            Self::Answering => "Here is your answer!",
        }
    }

    /// Suggested animation name for surfaces that animate
    #[must_use]
    pub fn suggested_animation(&self) -> &'static str {
        match self {
            Self::Idle => "steady",
            Self::Thinking => "pulse",
            Self::Answering => "smile",
        }
    }
}
