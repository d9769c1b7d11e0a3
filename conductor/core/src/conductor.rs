//! Conductor - The Session Orchestrator
//!
//! The conductor owns a [`SessionState`] and a backend. It turns surface
//! events into session actions, runs the effects those actions request as
//! background tasks, and applies their completions one at a time.
//!
//! # Design Philosophy
//!
//! The conductor is UI-agnostic. It doesn't know whether it's talking to a
//! terminal, a browser or a test harness. It communicates through:
//! - `TutorMessage`: updates sent TO the surface
//! - `TutorEvent`: actions received FROM the surface
//!
//! # Completions
//!
//! ```text
//!   action ──▶ SessionState ──▶ Vec<Effect> ──▶ tokio::spawn ──▶ backend
//!                  ▲                                              │
//!                  └──── apply ◀── completion channel ◀───────────┘
//! ```
//!
//! Only the conductor mutates the session, so completions never race each
//! other: each one is checked against the live position when it is applied.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::avatar::AvatarState;
use crate::backend::TutorBackend;
use crate::effects::{self, Completion, Effect};
use crate::events::TutorEvent;
use crate::explanation::{ExplanationOutcome, ExplanationStatus};
use crate::image::{HandleTracker, ImageOutcome};
use crate::messages::{ConductorState, NotifyLevel, TutorMessage};
use crate::question::QuestionOutcome;
use crate::session::{AppliedOutcome, SessionSnapshot, SessionState};
use crate::slides::{DeckId, SlideOutcome};

/// Default capacity of the completion channel
pub const DEFAULT_COMPLETION_BUFFER: usize = 64;

/// Conductor configuration
#[derive(Clone, Debug)]
pub struct ConductorConfig {
    /// Capacity of the completion channel
    pub completion_buffer: usize,
    /// Whether to probe the backend on startup
    pub check_health_on_start: bool,
}

impl Default for ConductorConfig {
    fn default() -> Self {
        Self {
            completion_buffer: DEFAULT_COMPLETION_BUFFER,
            check_health_on_start: true,
        }
    }
}

/// The conductor - headless session orchestration
pub struct TeachingConductor<B: TutorBackend> {
    /// Configuration
    config: ConductorConfig,
    /// Tutor backend
    backend: Arc<B>,
    /// The session store
    session: SessionState,
    /// Ledger of image handles
    tracker: Arc<HandleTracker>,
    /// Current operational state
    state: ConductorState,
    /// Last avatar state sent to the surface
    avatar: AvatarState,
    /// Channel to send messages to the surface
    tx: mpsc::UnboundedSender<TutorMessage>,
    /// Sender handed to effect tasks
    completion_tx: mpsc::Sender<Completion>,
    /// Finished effects waiting to be applied
    completion_rx: mpsc::Receiver<Completion>,
    /// Effects spawned and not yet received
    in_flight: usize,
}

impl<B: TutorBackend + 'static> TeachingConductor<B> {
    /// Create a new conductor with the given backend
    pub fn new(
        backend: B,
        config: ConductorConfig,
        tx: mpsc::UnboundedSender<TutorMessage>,
    ) -> Self {
        Self::with_tracker(backend, config, tx, HandleTracker::new())
    }

    /// Create a conductor that acquires image handles from `tracker`
    pub fn with_tracker(
        backend: B,
        config: ConductorConfig,
        tx: mpsc::UnboundedSender<TutorMessage>,
        tracker: Arc<HandleTracker>,
    ) -> Self {
        let (completion_tx, completion_rx) = mpsc::channel(config.completion_buffer.max(1));

        Self {
            config,
            backend: Arc::new(backend),
            session: SessionState::new(Arc::clone(&tracker)),
            tracker,
            state: ConductorState::Initializing,
            avatar: AvatarState::default(),
            tx,
            completion_tx,
            completion_rx,
            in_flight: 0,
        }
    }

    /// Get current state
    pub fn state(&self) -> ConductorState {
        self.state
    }

    /// The session store
    pub fn session(&self) -> &SessionState {
        &self.session
    }

    /// Capture the session for rendering
    pub fn snapshot(&self) -> SessionSnapshot {
        self.session.snapshot()
    }

    /// Current avatar state
    pub fn avatar(&self) -> AvatarState {
        self.session.avatar()
    }

    /// Ledger of image handles
    pub fn tracker(&self) -> &Arc<HandleTracker> {
        &self.tracker
    }

    /// Effects spawned whose completion has not been received
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Start the conductor
    pub async fn start(&mut self) -> anyhow::Result<()> {
        self.set_state(ConductorState::Initializing);

        if self.config.check_health_on_start && !self.backend.health_check().await {
            tracing::warn!(backend = self.backend.name(), "Backend health check failed");
            self.notify(
                NotifyLevel::Warning,
                "Tutor backend not reachable - requests may fail",
            );
        }

        self.set_state(ConductorState::Ready);
        self.avatar = self.session.avatar();
        self.send(TutorMessage::avatar(self.avatar));
        Ok(())
    }

    /// Handle an event from the surface
    pub fn handle_event(&mut self, event: TutorEvent) -> anyhow::Result<()> {
        tracing::debug!(event = event.name(), "Surface event");

        match event {
            TutorEvent::SelectDeck { deck_id } => self.select_deck(deck_id),
            TutorEvent::NextSlide => self.next(),
            TutorEvent::PreviousSlide => self.previous(),
            TutorEvent::ExplainSlide => self.explain(),
            TutorEvent::AskQuestion { question } => self.ask(&question),
            TutorEvent::RequestSnapshot => {
                self.send(TutorMessage::Snapshot {
                    snapshot: Box::new(self.session.snapshot()),
                });
            }
            TutorEvent::QuitRequested => self.shutdown()?,
        }

        Ok(())
    }

    // ============================================
    // Actions
    // ============================================

    /// Select a deck, or clear the selection
    pub fn select_deck(&mut self, deck_id: Option<DeckId>) {
        let had_explanation = self.has_explanation();
        let effects = self.session.select_deck(deck_id);

        match deck_id {
            Some(deck) => tracing::info!(deck = %deck, "Deck selected"),
            None => tracing::info!("Deck cleared"),
        }
        self.send(TutorMessage::DeckSelected { deck_id });
        self.finish_action(had_explanation, effects);
    }

    /// Move to the next slide
    pub fn next(&mut self) {
        let had_explanation = self.has_explanation();
        let before = self.session.current_index();
        let effects = self.session.next();
        self.after_navigation(before, had_explanation, effects);
    }

    /// Move to the previous slide
    pub fn previous(&mut self) {
        let had_explanation = self.has_explanation();
        let before = self.session.current_index();
        let effects = self.session.previous();
        self.after_navigation(before, had_explanation, effects);
    }

    /// Request an explanation of the current slide
    pub fn explain(&mut self) {
        let effects: Vec<Effect> = self.session.explain().into_iter().collect();
        self.finish_action(false, effects);
    }

    /// Ask a free-form question
    pub fn ask(&mut self, question: &str) {
        let effects: Vec<Effect> = self.session.ask(question).into_iter().collect();
        self.finish_action(false, effects);
    }

    // ============================================
    // Completions
    // ============================================

    /// Apply every completion that has already arrived
    ///
    /// Call this regularly from a surface loop. Returns true if anything
    /// was applied.
    pub fn poll_completions(&mut self) -> bool {
        let mut ready = Vec::new();
        while let Ok(completion) = self.completion_rx.try_recv() {
            ready.push(completion);
        }

        let applied = !ready.is_empty();
        for completion in ready {
            self.in_flight = self.in_flight.saturating_sub(1);
            self.apply_completion(completion);
        }
        applied
    }

    /// Wait for the next completion without applying it
    ///
    /// Returns `None` immediately when nothing is in flight. Cancel-safe, so
    /// it can sit in a `tokio::select!` next to other inputs.
    pub async fn recv_completion(&mut self) -> Option<Completion> {
        if self.in_flight == 0 {
            return None;
        }
        let completion = self.completion_rx.recv().await?;
        self.in_flight = self.in_flight.saturating_sub(1);
        Some(completion)
    }

    /// Wait for the next completion and apply it
    ///
    /// Returns false when nothing was in flight.
    pub async fn next_completion(&mut self) -> bool {
        match self.recv_completion().await {
            Some(completion) => {
                self.apply_completion(completion);
                true
            }
            None => false,
        }
    }

    /// Apply completions until nothing is in flight
    pub async fn settle(&mut self) {
        while self.next_completion().await {}
    }

    /// Apply one completion and report the change to the surface
    pub fn apply_completion(&mut self, completion: Completion) {
        let had_explanation = self.has_explanation();
        let (outcome, effects) = self.session.apply(completion);

        if outcome.is_stale() {
            tracing::debug!(?outcome, "Completion superseded");
            return;
        }

        match outcome {
            AppliedOutcome::Slides(SlideOutcome::Loaded { count }) => {
                if let Some(deck_id) = self.session.deck_id() {
                    self.send(TutorMessage::SlidesLoaded { deck_id, count });
                }
                self.send_slide_changed();
            }
            AppliedOutcome::Slides(SlideOutcome::Failed { message }) => {
                self.send(TutorMessage::SlideListError { message });
            }
            AppliedOutcome::Image(ImageOutcome::Installed {
                slide_number,
                bytes,
                ..
            }) => {
                self.send(TutorMessage::ImageReady {
                    slide_number,
                    bytes,
                });
            }
            AppliedOutcome::Image(ImageOutcome::Unavailable { slide_number }) => {
                self.send(TutorMessage::ImageUnavailable { slide_number });
            }
            AppliedOutcome::Explanation(ExplanationOutcome::Fulfilled) => {
                let slide_number = self.session.current_slide().map_or(0, |s| s.number);
                if let Some(text) = self.session.explanation().text() {
                    let text = text.to_string();
                    self.send(TutorMessage::Explanation { slide_number, text });
                }
            }
            AppliedOutcome::Explanation(ExplanationOutcome::Failed { message }) => {
                self.send(TutorMessage::ExplanationFailed { message });
            }
            AppliedOutcome::Question(QuestionOutcome::Answered) => {
                if let Some(answer) = self.session.answer().cloned() {
                    self.send(TutorMessage::Answer { answer });
                }
            }
            AppliedOutcome::Question(QuestionOutcome::Failed { message }) => {
                self.send(TutorMessage::QuestionFailed { message });
            }
            AppliedOutcome::Slides(SlideOutcome::Stale)
            | AppliedOutcome::Image(ImageOutcome::Stale)
            | AppliedOutcome::Explanation(ExplanationOutcome::Stale)
            | AppliedOutcome::Question(QuestionOutcome::Stale) => {}
        }

        self.finish_action(had_explanation, effects);
    }

    /// Shut down the conductor, releasing the final image
    pub fn shutdown(&mut self) -> anyhow::Result<()> {
        self.set_state(ConductorState::ShuttingDown);
        self.session.teardown();
        tracing::info!(
            live_handles = self.tracker.live_count(),
            in_flight = self.in_flight,
            "Session torn down"
        );

        self.send(TutorMessage::Quit {
            message: Some("Goodbye!".to_string()),
        });

        Ok(())
    }

    // ============================================
    // Internals
    // ============================================

    fn has_explanation(&self) -> bool {
        !matches!(self.session.explanation(), ExplanationStatus::None)
    }

    fn after_navigation(&mut self, before: usize, had_explanation: bool, effects: Vec<Effect>) {
        if self.session.current_index() != before {
            self.send_slide_changed();
        }
        self.finish_action(had_explanation, effects);
    }

    /// Report cleared explanations, start effects and resync the avatar
    fn finish_action(&mut self, had_explanation: bool, effects: Vec<Effect>) {
        if had_explanation && !self.has_explanation() {
            self.send(TutorMessage::ExplanationCleared);
        }
        for effect in effects {
            self.dispatch(effect);
        }
        self.send_avatar();
    }

    /// Announce an effect and run it in the background
    fn dispatch(&mut self, effect: Effect) {
        let announcement = match &effect {
            Effect::LoadSlides(request) => TutorMessage::SlidesLoading {
                deck_id: request.deck_id,
            },
            Effect::LoadImage(request) => TutorMessage::ImageLoading {
                slide_number: request.slide_number,
            },
            Effect::Explain(request) => TutorMessage::ExplanationPending {
                slide_number: request.slide_number,
            },
            Effect::Ask(request) => TutorMessage::QuestionPending {
                question: request.question.clone(),
            },
        };
        self.send(announcement);

        tracing::trace!(effect = effect.kind(), "Spawning effect");
        let backend = Arc::clone(&self.backend);
        let tracker = Arc::clone(&self.tracker);
        let completion_tx = self.completion_tx.clone();
        self.in_flight += 1;

        tokio::spawn(async move {
            let completion = effects::execute(backend.as_ref(), &tracker, effect).await;
            if completion_tx.send(completion).await.is_err() {
                tracing::debug!("Conductor gone, dropping completion");
            }
        });
    }

    fn send_slide_changed(&self) {
        if let Some(slide) = self.session.current_slide() {
            self.send(TutorMessage::SlideChanged {
                index: self.session.current_index(),
                count: self.session.slides().len(),
                slide: slide.clone(),
            });
        }
    }

    /// Send the avatar state if it changed since the last send
    fn send_avatar(&mut self) {
        let avatar = self.session.avatar();
        if avatar != self.avatar {
            self.avatar = avatar;
            self.send(TutorMessage::avatar(avatar));
        }
    }

    /// Set state and notify the surface
    fn set_state(&mut self, state: ConductorState) {
        self.state = state;
        self.send(TutorMessage::State { state });
    }

    /// Send notification
    fn notify(&self, level: NotifyLevel, message: &str) {
        self.send(TutorMessage::Notify {
            level,
            message: message.to_string(),
        });
    }

    /// Send a message to the surface
    fn send(&self, msg: TutorMessage) {
        if let Err(e) = self.tx.send(msg) {
            tracing::warn!("Failed to send message to surface: {}", e);
        }
    }
}

impl<B: TutorBackend> Drop for TeachingConductor<B> {
    fn drop(&mut self) {
        self.session.teardown();
    }
}
