//! Session Effects
//!
//! Effects are the async work a session action asks for. The session store
//! returns them from each mutating call; the conductor executes them on the
//! runtime and feeds the resulting [`Completion`]s back, one at a time.
//!
//! This keeps the store free of I/O: it only mutates state and describes
//! what should be fetched, together with the key the result must match.

use std::sync::Arc;

use crate::backend::{Answer, BackendError, TutorBackend};
use crate::explanation::ExplanationRequest;
use crate::image::{HandleTracker, ImageRequest, ResourceHandle};
use crate::question::QuestionRequest;
use crate::slides::{SlideRecord, SlideRequest};

/// Async work requested by a session action
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Effect {
    /// Fetch the slide list of a deck
    LoadSlides(SlideRequest),
    /// Fetch the image of the current slide
    LoadImage(ImageRequest),
    /// Ask for an explanation of the current slide
    Explain(ExplanationRequest),
    /// Ask a free-form question
    Ask(QuestionRequest),
}

impl Effect {
    /// Short name for logging
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::LoadSlides(_) => "load_slides",
            Self::LoadImage(_) => "load_image",
            Self::Explain(_) => "explain",
            Self::Ask(_) => "ask",
        }
    }
}

/// Result of an executed effect, still carrying its request key
#[derive(Debug)]
pub enum Completion {
    /// Slide list fetched (or not)
    Slides {
        /// The request this answers
        request: SlideRequest,
        /// Slides or failure
        result: Result<Vec<SlideRecord>, BackendError>,
    },
    /// Slide image fetched (or not)
    Image {
        /// The request this answers
        request: ImageRequest,
        /// Acquired handle or failure
        result: Result<ResourceHandle, BackendError>,
    },
    /// Explanation received (or not)
    Explanation {
        /// The request this answers
        request: ExplanationRequest,
        /// Explanation text or failure
        result: Result<String, BackendError>,
    },
    /// Answer received (or not)
    Answer {
        /// The request this answers
        request: QuestionRequest,
        /// Answer or failure
        result: Result<Answer, BackendError>,
    },
}

/// Execute one effect against the backend
///
/// Image bytes are wrapped in a tracked handle as soon as they arrive, so a
/// completion that is never applied still releases its handle when dropped.
pub async fn execute<B>(backend: &B, tracker: &Arc<HandleTracker>, effect: Effect) -> Completion
where
    B: TutorBackend + ?Sized,
{
    match effect {
        Effect::LoadSlides(request) => Completion::Slides {
            request,
            result: backend.list_slides(request.deck_id).await,
        },
        Effect::LoadImage(request) => {
            let result = backend
                .slide_image(request.deck_id, request.slide_number)
                .await
                .map(|data| tracker.acquire(data));
            Completion::Image { request, result }
        }
        Effect::Explain(request) => Completion::Explanation {
            request,
            result: backend
                .explain_slide(request.deck_id, request.slide_number)
                .await,
        },
        Effect::Ask(request) => {
            let result = backend.ask(&request.question, request.deck_id).await;
            Completion::Answer { request, result }
        }
    }
}
