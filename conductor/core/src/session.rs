//! Session State
//!
//! The single store behind a teaching session: which deck is selected, its
//! slides, where the learner is, and the explanation, image and question
//! attached to the current position.
//!
//! Every user action is a synchronous method that mutates the store and
//! returns the [`Effect`]s it needs run. Results come back through
//! [`SessionState::apply`], which checks the key captured when the effect was
//! issued against the live position before touching anything.
//!
//! # Invariants
//!
//! - `current_index < slides.len()` whenever slides are loaded, `0` otherwise
//! - an installed image always belongs to the current slide, and the slide
//!   has `has_image` set
//! - at most one image handle is held by the store

use std::sync::Arc;

use serde::Serialize;

use crate::avatar::AvatarState;
use crate::backend::Answer;
use crate::effects::{Completion, Effect};
use crate::explanation::{ExplanationOutcome, ExplanationRequester, ExplanationStatus};
use crate::image::{HandleTracker, ImageOutcome, ImageResourceManager};
use crate::navigation::{Direction, NavigationController};
use crate::question::{QuestionOutcome, QuestionRequester, QuestionStatus};
use crate::slides::{DeckId, SlideFetcher, SlideOutcome, SlideRecord};

/// Shown when the slide list can't be fetched and the backend gives no reason
pub const DEFAULT_LIST_ERROR: &str = "Failed to fetch slides";

/// Result of applying one [`Completion`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AppliedOutcome {
    /// Slide list result
    Slides(SlideOutcome),
    /// Slide image result
    Image(ImageOutcome),
    /// Explanation result
    Explanation(ExplanationOutcome),
    /// Question result
    Question(QuestionOutcome),
}

impl AppliedOutcome {
    /// Whether the completion was discarded as superseded
    #[must_use]
    pub fn is_stale(&self) -> bool {
        matches!(
            self,
            Self::Slides(SlideOutcome::Stale)
                | Self::Image(ImageOutcome::Stale)
                | Self::Explanation(ExplanationOutcome::Stale)
                | Self::Question(QuestionOutcome::Stale)
        )
    }
}

/// What the image area of the current slide shows
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ImageView {
    /// The slide has no image
    NoImage,
    /// Fetch in flight
    Loading,
    /// Image installed
    Ready {
        /// Handle identifier
        handle: String,
        /// Image size in bytes
        bytes: usize,
    },
    /// Fetch failed; show a placeholder
    Unavailable,
}

/// Read-only view of the session for rendering
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    /// Selected deck
    pub deck_id: Option<DeckId>,
    /// Number of slides loaded
    pub slide_count: usize,
    /// 0-based position
    pub current_index: usize,
    /// The slide on screen
    pub current_slide: Option<SlideRecord>,
    /// "Slide n of m", when slides are loaded
    pub position_label: Option<String>,
    /// Slide list request in flight
    pub loading_slides: bool,
    /// Last slide-list failure
    pub list_error: Option<String>,
    /// Explanation of the current slide
    pub explanation: ExplanationStatus,
    /// Derived avatar state
    pub avatar: AvatarState,
    /// Image area of the current slide
    pub image: ImageView,
    /// Latest free-form question
    pub question: QuestionStatus,
    /// Previous is enabled
    pub can_previous: bool,
    /// Next is enabled
    pub can_next: bool,
    /// Explain is enabled
    pub can_explain: bool,
}

/// The teaching session store
#[derive(Debug)]
pub struct SessionState {
    deck_id: Option<DeckId>,
    slides: Vec<SlideRecord>,
    list_error: Option<String>,
    navigation: NavigationController,
    fetcher: SlideFetcher,
    images: ImageResourceManager,
    explanation: ExplanationRequester,
    question: QuestionRequester,
}

impl SessionState {
    /// Create an empty session whose image handles come from `tracker`
    #[must_use]
    pub fn new(tracker: Arc<HandleTracker>) -> Self {
        Self {
            deck_id: None,
            slides: Vec::new(),
            list_error: None,
            navigation: NavigationController::new(),
            fetcher: SlideFetcher::new(),
            images: ImageResourceManager::new(tracker),
            explanation: ExplanationRequester::new(),
            question: QuestionRequester::new(),
        }
    }

    // ============================================
    // Accessors
    // ============================================

    /// Selected deck
    #[must_use]
    pub fn deck_id(&self) -> Option<DeckId> {
        self.deck_id
    }

    /// Loaded slides in deck order
    #[must_use]
    pub fn slides(&self) -> &[SlideRecord] {
        &self.slides
    }

    /// 0-based position within the slides
    #[must_use]
    pub fn current_index(&self) -> usize {
        self.navigation.index()
    }

    /// The slide on screen
    #[must_use]
    pub fn current_slide(&self) -> Option<&SlideRecord> {
        self.slides.get(self.navigation.index())
    }

    /// Last slide-list failure
    #[must_use]
    pub fn list_error(&self) -> Option<&str> {
        self.list_error.as_deref()
    }

    /// Whether a slide list request is outstanding
    #[must_use]
    pub fn is_loading_slides(&self) -> bool {
        self.fetcher.is_loading()
    }

    /// Explanation of the current slide
    #[must_use]
    pub fn explanation(&self) -> &ExplanationStatus {
        self.explanation.status()
    }

    /// Latest free-form question
    #[must_use]
    pub fn question(&self) -> &QuestionStatus {
        self.question.status()
    }

    /// Avatar state, derived from the explanation
    #[must_use]
    pub fn avatar(&self) -> AvatarState {
        AvatarState::derive(self.explanation.status())
    }

    /// The image manager
    #[must_use]
    pub fn images(&self) -> &ImageResourceManager {
        &self.images
    }

    /// The live `(deck, slide)` pair
    #[must_use]
    pub fn live_slide(&self) -> Option<(DeckId, u32)> {
        let deck_id = self.deck_id?;
        self.current_slide().map(|slide| (deck_id, slide.number))
    }

    /// "Slide n of m", where n is the current slide's own number
    #[must_use]
    pub fn position_label(&self) -> Option<String> {
        self.current_slide()
            .map(|slide| format!("Slide {} of {}", slide.number, self.slides.len()))
    }

    /// Whether an explanation can be requested right now
    #[must_use]
    pub fn can_explain(&self) -> bool {
        self.live_slide().is_some() && !self.explanation.status().is_pending()
    }

    // ============================================
    // Actions
    // ============================================

    /// Select a deck, or clear the selection with `None`
    ///
    /// Switching to a different deck drops everything tied to the old one
    /// before the new list is requested. Re-selecting the current deck
    /// re-fetches its list without clearing what's on screen.
    pub fn select_deck(&mut self, deck_id: Option<DeckId>) -> Vec<Effect> {
        let Some(deck_id) = deck_id else {
            tracing::debug!("Deck selection cleared");
            self.clear_deck();
            self.deck_id = None;
            return Vec::new();
        };

        if self.deck_id != Some(deck_id) {
            tracing::debug!(from = ?self.deck_id, to = %deck_id, "Switching deck");
            self.clear_deck();
            self.deck_id = Some(deck_id);
        }

        self.list_error = None;
        vec![Effect::LoadSlides(self.fetcher.begin(deck_id))]
    }

    /// Move to the next slide
    pub fn next(&mut self) -> Vec<Effect> {
        self.navigate(Direction::Next)
    }

    /// Move to the previous slide
    pub fn previous(&mut self) -> Vec<Effect> {
        self.navigate(Direction::Previous)
    }

    /// Step in `direction`
    ///
    /// The explanation is reset even at a boundary. The image is only
    /// reloaded when the position actually changed.
    pub fn navigate(&mut self, direction: Direction) -> Vec<Effect> {
        let moved = self.navigation.step(direction, self.slides.len());
        self.explanation.reset();

        if moved {
            tracing::debug!(index = self.navigation.index(), ?direction, "Slide changed");
            self.refresh_image()
        } else {
            tracing::trace!(?direction, "Already at boundary");
            Vec::new()
        }
    }

    /// Request an explanation of the current slide
    ///
    /// Without a deck or a current slide this is a no-op.
    pub fn explain(&mut self) -> Option<Effect> {
        let Some((deck_id, slide_number)) = self.live_slide() else {
            tracing::trace!("Explain skipped: no deck or slide");
            return None;
        };
        Some(Effect::Explain(self.explanation.begin(deck_id, slide_number)))
    }

    /// Ask a free-form question, grounded in the current deck if one is set
    pub fn ask(&mut self, question: &str) -> Option<Effect> {
        let request = self.question.begin(question, self.deck_id);
        if request.is_none() {
            tracing::trace!("Ask skipped: blank question");
        }
        request.map(Effect::Ask)
    }

    /// Apply a finished effect
    ///
    /// Returns what happened and any follow-up effects (a freshly loaded list
    /// asks for the first slide's image).
    pub fn apply(&mut self, completion: Completion) -> (AppliedOutcome, Vec<Effect>) {
        match completion {
            Completion::Slides { request, result } => {
                if !self.fetcher.accept(request, self.deck_id) {
                    tracing::debug!(deck = %request.deck_id, seq = request.seq, "Discarding stale slide list");
                    return (AppliedOutcome::Slides(SlideOutcome::Stale), Vec::new());
                }

                match result {
                    Ok(slides) => {
                        let count = slides.len();
                        self.slides = slides;
                        self.navigation.reset();
                        self.explanation.reset();
                        self.list_error = None;
                        tracing::debug!(deck = %request.deck_id, count, "Slides loaded");
                        let effects = self.refresh_image();
                        (AppliedOutcome::Slides(SlideOutcome::Loaded { count }), effects)
                    }
                    Err(e) => {
                        let message = e.user_message(DEFAULT_LIST_ERROR);
                        tracing::warn!(deck = %request.deck_id, error = %e, "Slide list request failed");
                        self.list_error = Some(message.clone());
                        (
                            AppliedOutcome::Slides(SlideOutcome::Failed { message }),
                            Vec::new(),
                        )
                    }
                }
            }
            Completion::Image { request, result } => {
                let live = self.live_slide();
                let outcome = self.images.complete(request, result, live);
                (AppliedOutcome::Image(outcome), Vec::new())
            }
            Completion::Explanation { request, result } => {
                let live = self.live_slide();
                let outcome = self.explanation.complete(request, result, live);
                (AppliedOutcome::Explanation(outcome), Vec::new())
            }
            Completion::Answer { request, result } => {
                let outcome = self.question.complete(&request, result, self.deck_id);
                (AppliedOutcome::Question(outcome), Vec::new())
            }
        }
    }

    /// Release everything held by the session
    pub fn teardown(&mut self) {
        self.images.teardown();
        self.fetcher.cancel();
        self.explanation.reset();
        self.question.reset();
    }

    /// Capture the session for rendering
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            deck_id: self.deck_id,
            slide_count: self.slides.len(),
            current_index: self.navigation.index(),
            current_slide: self.current_slide().cloned(),
            position_label: self.position_label(),
            loading_slides: self.fetcher.is_loading(),
            list_error: self.list_error.clone(),
            explanation: self.explanation.status().clone(),
            avatar: self.avatar(),
            image: self.image_view(),
            question: self.question.status().clone(),
            can_previous: self.navigation.can_previous(),
            can_next: self.navigation.can_next(self.slides.len()),
            can_explain: self.can_explain(),
        }
    }

    /// The answer to the latest question, if any
    #[must_use]
    pub fn answer(&self) -> Option<&Answer> {
        match self.question.status() {
            QuestionStatus::Answered(answer) => Some(answer),
            _ => None,
        }
    }

    /// Describe the first broken invariant, if any
    #[must_use]
    pub fn invariant_violation(&self) -> Option<&'static str> {
        if !self.slides.is_empty() && self.navigation.index() >= self.slides.len() {
            return Some("current index out of range");
        }
        if self.slides.is_empty() && self.navigation.index() != 0 {
            return Some("non-zero index without slides");
        }
        if self.images.current().is_some()
            && !self.current_slide().is_some_and(|slide| slide.has_image)
        {
            return Some("image installed for a slide without one");
        }
        None
    }

    fn image_view(&self) -> ImageView {
        if !self.current_slide().is_some_and(|slide| slide.has_image) {
            return ImageView::NoImage;
        }
        if let Some(handle) = self.images.current() {
            return ImageView::Ready {
                handle: handle.id().to_string(),
                bytes: handle.len(),
            };
        }
        if self.images.is_loading() {
            ImageView::Loading
        } else {
            ImageView::Unavailable
        }
    }

    fn refresh_image(&mut self) -> Vec<Effect> {
        match (self.deck_id, self.current_slide()) {
            (Some(deck_id), Some(slide)) if slide.has_image => {
                let slide_number = slide.number;
                vec![Effect::LoadImage(self.images.begin(deck_id, slide_number))]
            }
            _ => {
                self.images.clear();
                Vec::new()
            }
        }
    }

    fn clear_deck(&mut self) {
        self.slides.clear();
        self.list_error = None;
        self.navigation.reset();
        self.fetcher.cancel();
        self.images.clear();
        self.explanation.reset();
        self.question.reset();
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::backend::BackendError;

    fn deck() -> Vec<SlideRecord> {
        vec![
            SlideRecord::new(1, "Intro\nWelcome"),
            SlideRecord::new(2, "Cells").with_image(),
            SlideRecord::new(3, "Summary"),
        ]
    }

    fn loaded(deck_id: u64) -> (SessionState, Arc<HandleTracker>) {
        let tracker = HandleTracker::new();
        let mut session = SessionState::new(Arc::clone(&tracker));
        let effects = session.select_deck(Some(DeckId(deck_id)));
        let Effect::LoadSlides(request) = effects[0] else {
            panic!("expected slide load, got {effects:?}");
        };
        session.apply(Completion::Slides {
            request,
            result: Ok(deck()),
        });
        (session, tracker)
    }

    #[test]
    fn test_select_deck_requests_slides() {
        let mut session = SessionState::new(HandleTracker::new());
        let effects = session.select_deck(Some(DeckId(7)));

        assert_eq!(effects.len(), 1);
        assert!(matches!(effects[0], Effect::LoadSlides(req) if req.deck_id == DeckId(7)));
        assert!(session.is_loading_slides());
        assert_eq!(session.deck_id(), Some(DeckId(7)));
    }

    #[test]
    fn test_load_resets_position() {
        let (session, _) = loaded(1);
        let snapshot = session.snapshot();

        assert_eq!(snapshot.slide_count, 3);
        assert_eq!(snapshot.current_index, 0);
        assert_eq!(snapshot.position_label.as_deref(), Some("Slide 1 of 3"));
        assert_eq!(snapshot.image, ImageView::NoImage);
        assert!(!snapshot.loading_slides);
        assert!(snapshot.can_explain);
    }

    #[test]
    fn test_position_label_uses_slide_number() {
        let tracker = HandleTracker::new();
        let mut session = SessionState::new(tracker);
        let Effect::LoadSlides(request) = session.select_deck(Some(DeckId(4)))[0] else {
            panic!("expected slide load");
        };
        session.apply(Completion::Slides {
            request,
            result: Ok(vec![SlideRecord::new(3, "Mitosis"), SlideRecord::new(5, "Meiosis")]),
        });

        assert_eq!(session.position_label().as_deref(), Some("Slide 3 of 2"));
        session.next();
        assert_eq!(session.snapshot().position_label.as_deref(), Some("Slide 5 of 2"));
    }

    #[test]
    fn test_clear_selection() {
        let (mut session, _) = loaded(1);
        session.next();
        let effects = session.select_deck(None);

        assert!(effects.is_empty());
        assert!(session.slides().is_empty());
        assert_eq!(session.current_index(), 0);
        assert_eq!(session.explanation(), &ExplanationStatus::None);
        assert_eq!(session.deck_id(), None);
    }

    #[test]
    fn test_navigation_to_image_slide_requests_image() {
        let (mut session, _) = loaded(1);
        let effects = session.next();

        assert_eq!(effects.len(), 1);
        assert!(matches!(
            effects[0],
            Effect::LoadImage(req) if req.key() == (DeckId(1), 2)
        ));
        assert_eq!(session.snapshot().image, ImageView::Loading);
    }

    #[test]
    fn test_boundary_navigation_still_resets_explanation() {
        let (mut session, _) = loaded(1);
        let Some(Effect::Explain(request)) = session.explain() else {
            panic!("expected explain effect");
        };
        session.apply(Completion::Explanation {
            request,
            result: Ok("text".to_string()),
        });
        assert_eq!(session.avatar(), AvatarState::Answering);

        let effects = session.previous();
        assert!(effects.is_empty());
        assert_eq!(session.current_index(), 0);
        assert_eq!(session.explanation(), &ExplanationStatus::None);
        assert_eq!(session.avatar(), AvatarState::Idle);
    }

    #[test]
    fn test_explain_without_slides_is_noop() {
        let mut session = SessionState::new(HandleTracker::new());
        assert!(session.explain().is_none());
        assert_eq!(session.explanation(), &ExplanationStatus::None);

        session.select_deck(Some(DeckId(1)));
        assert!(session.explain().is_none());
    }

    #[test]
    fn test_late_slide_list_for_old_deck_dropped() {
        let mut session = SessionState::new(HandleTracker::new());
        let Effect::LoadSlides(old) = session.select_deck(Some(DeckId(1)))[0] else {
            panic!("expected slide load");
        };
        let Effect::LoadSlides(new) = session.select_deck(Some(DeckId(2)))[0] else {
            panic!("expected slide load");
        };

        let (outcome, _) = session.apply(Completion::Slides {
            request: old,
            result: Ok(deck()),
        });
        assert!(outcome.is_stale());
        assert!(session.slides().is_empty());

        let (outcome, _) = session.apply(Completion::Slides {
            request: new,
            result: Ok(vec![SlideRecord::new(1, "Deck two")]),
        });
        assert_eq!(outcome, AppliedOutcome::Slides(SlideOutcome::Loaded { count: 1 }));
    }

    #[test]
    fn test_list_failure_keeps_slides() {
        let (mut session, _) = loaded(1);
        let Effect::LoadSlides(request) = session.select_deck(Some(DeckId(1)))[0] else {
            panic!("expected slide load");
        };
        assert_eq!(session.slides().len(), 3);

        let (outcome, _) = session.apply(Completion::Slides {
            request,
            result: Err(BackendError::Status {
                status: 404,
                detail: None,
            }),
        });

        assert_eq!(
            outcome,
            AppliedOutcome::Slides(SlideOutcome::Failed {
                message: DEFAULT_LIST_ERROR.to_string()
            })
        );
        assert_eq!(session.slides().len(), 3);
        assert_eq!(session.list_error(), Some(DEFAULT_LIST_ERROR));
    }

    #[test]
    fn test_leaving_image_slide_releases_handle() {
        let (mut session, tracker) = loaded(1);
        let Effect::LoadImage(request) = session.next()[0] else {
            panic!("expected image load");
        };
        session.apply(Completion::Image {
            request,
            result: Ok(tracker.acquire(Bytes::from_static(b"png"))),
        });
        assert_eq!(tracker.live_count(), 1);
        assert!(matches!(session.snapshot().image, ImageView::Ready { bytes: 3, .. }));

        session.next();
        assert_eq!(tracker.live_count(), 0);
        assert_eq!(session.snapshot().image, ImageView::NoImage);
        assert_eq!(session.invariant_violation(), None);
    }

    #[test]
    fn test_teardown_releases_image() {
        let (mut session, tracker) = loaded(1);
        let Effect::LoadImage(request) = session.next()[0] else {
            panic!("expected image load");
        };
        session.apply(Completion::Image {
            request,
            result: Ok(tracker.acquire(Bytes::from_static(b"png"))),
        });

        session.teardown();
        assert_eq!(tracker.live_count(), 0);
    }

    #[test]
    fn test_question_voided_by_deck_change_only() {
        let (mut session, _) = loaded(1);
        let Some(Effect::Ask(request)) = session.ask("What is a cell?") else {
            panic!("expected ask effect");
        };
        session.next();
        assert_eq!(session.question(), &QuestionStatus::Pending);

        session.select_deck(Some(DeckId(2)));
        let (outcome, _) = session.apply(Completion::Answer {
            request,
            result: Ok(Answer {
                answer: "late".to_string(),
                cached: false,
                provider: String::new(),
            }),
        });
        assert!(outcome.is_stale());
        assert_eq!(session.question(), &QuestionStatus::None);
    }

    #[test]
    fn test_reselect_same_deck_keeps_slides() {
        let (mut session, _) = loaded(1);
        session.next();
        let effects = session.select_deck(Some(DeckId(1)));

        assert_eq!(effects.len(), 1);
        assert_eq!(session.slides().len(), 3);
        assert_eq!(session.current_index(), 1);
    }
}
