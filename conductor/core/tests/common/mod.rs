//! Scripted backend shared by the integration tests

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use tokio::sync::Notify;

use lesson_core::{Answer, BackendError, DeckId, SlideRecord, TutorBackend};

/// A backend call, in the order it was made
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Call {
    ListSlides(DeckId),
    SlideImage(DeckId, u32),
    Explain(DeckId, u32),
    Ask(String),
}

#[derive(Default)]
struct Inner {
    decks: Mutex<HashMap<DeckId, Result<Vec<SlideRecord>, BackendError>>>,
    explanations: Mutex<VecDeque<Result<String, BackendError>>>,
    failing_images: Mutex<Vec<(DeckId, u32)>>,
    list_gates: Mutex<HashMap<DeckId, Arc<Notify>>>,
    image_gates: Mutex<HashMap<(DeckId, u32), Arc<Notify>>>,
    explain_gate: Mutex<Option<Arc<Notify>>>,
    next_explain_gate: Mutex<Option<Arc<Notify>>>,
    calls: Mutex<Vec<Call>>,
}

/// Backend whose answers are scripted per test; clones share state
#[derive(Clone, Default)]
pub struct ScriptedBackend {
    inner: Arc<Inner>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_deck(self, deck_id: DeckId, slides: Vec<SlideRecord>) -> Self {
        self.set_deck(deck_id, Ok(slides));
        self
    }

    pub fn set_deck(&self, deck_id: DeckId, result: Result<Vec<SlideRecord>, BackendError>) {
        self.inner.decks.lock().insert(deck_id, result);
    }

    pub fn push_explanation(&self, result: Result<String, BackendError>) {
        self.inner.explanations.lock().push_back(result);
    }

    pub fn fail_image(&self, deck_id: DeckId, slide_number: u32) {
        self.inner.failing_images.lock().push((deck_id, slide_number));
    }

    /// Hold the slide list of `deck_id` until the returned gate is notified
    pub fn gate_list(&self, deck_id: DeckId) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.inner.list_gates.lock().insert(deck_id, Arc::clone(&gate));
        gate
    }

    /// Hold the image of `(deck_id, slide_number)` until notified
    pub fn gate_image(&self, deck_id: DeckId, slide_number: u32) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.inner
            .image_gates
            .lock()
            .insert((deck_id, slide_number), Arc::clone(&gate));
        gate
    }

    /// Hold every explanation until notified (once per request)
    pub fn gate_explanations(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.inner.explain_gate.lock() = Some(Arc::clone(&gate));
        gate
    }

    /// Hold only the next explanation request until notified
    ///
    /// The reply is taken from the script when the request arrives, so a
    /// held request keeps the reply queued for it.
    pub fn gate_next_explanation(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.inner.next_explain_gate.lock() = Some(Arc::clone(&gate));
        gate
    }

    pub fn explain_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Explain(..)))
            .count()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.inner.calls.lock().clone()
    }

    pub fn image_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::SlideImage(..)))
            .count()
    }

    fn record(&self, call: Call) {
        self.inner.calls.lock().push(call);
    }
}

#[async_trait]
impl TutorBackend for ScriptedBackend {
    fn name(&self) -> &str {
        "Scripted"
    }

    async fn health_check(&self) -> bool {
        true
    }

    async fn list_slides(&self, deck_id: DeckId) -> Result<Vec<SlideRecord>, BackendError> {
        self.record(Call::ListSlides(deck_id));
        let gate = self.inner.list_gates.lock().get(&deck_id).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.inner
            .decks
            .lock()
            .get(&deck_id)
            .cloned()
            .unwrap_or(Err(BackendError::Status {
                status: 404,
                detail: Some("Slide deck not found".to_string()),
            }))
    }

    async fn slide_image(&self, deck_id: DeckId, slide_number: u32) -> Result<Bytes, BackendError> {
        self.record(Call::SlideImage(deck_id, slide_number));
        let gate = self
            .inner
            .image_gates
            .lock()
            .get(&(deck_id, slide_number))
            .cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if self.inner.failing_images.lock().contains(&(deck_id, slide_number)) {
            return Err(BackendError::Status {
                status: 404,
                detail: Some("Slide image not found".to_string()),
            });
        }
        Ok(Bytes::from(format!("img-{deck_id}-{slide_number}")))
    }

    async fn explain_slide(&self, deck_id: DeckId, slide_number: u32) -> Result<String, BackendError> {
        self.record(Call::Explain(deck_id, slide_number));
        let reply = self
            .inner
            .explanations
            .lock()
            .pop_front()
            .unwrap_or_else(|| Ok(format!("Slide {slide_number} explained")));
        let gate = self
            .inner
            .next_explain_gate
            .lock()
            .take()
            .or_else(|| self.inner.explain_gate.lock().clone());
        if let Some(gate) = gate {
            gate.notified().await;
        }
        reply
    }

    async fn ask(&self, question: &str, _deck_id: Option<DeckId>) -> Result<Answer, BackendError> {
        self.record(Call::Ask(question.to_string()));
        Ok(Answer {
            answer: format!("About '{question}'"),
            cached: false,
            provider: "scripted".to_string(),
        })
    }
}

/// Two-slide deck: text-only intro, then a diagram with an image
pub fn intro_and_diagram() -> Vec<SlideRecord> {
    vec![
        SlideRecord::new(1, "Intro"),
        SlideRecord::new(2, "Diagram").with_image(),
    ]
}

/// Deck where every slide has an image
pub fn all_images(count: u32) -> Vec<SlideRecord> {
    (1..=count)
        .map(|n| SlideRecord::new(n, format!("Slide {n}")).with_image())
        .collect()
}
