//! Slide Decks
//!
//! Slide data as delivered by the backend, plus the fetcher that loads a
//! deck's slide list into the session.
//!
//! # Design Philosophy
//!
//! The fetcher never mutates the session while a request is in flight. It
//! records which deck the request was issued for and, when the result comes
//! back, checks that the session is still showing that deck. Results for a
//! deck the user has since moved away from are dropped on the floor.

use serde::{Deserialize, Serialize};

/// Slide deck identifier
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeckId(pub u64);

impl DeckId {
    /// Get the numeric value
    #[must_use]
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for DeckId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for DeckId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

/// One slide of a deck
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlideRecord {
    /// 1-based slide number, unique within its deck
    #[serde(rename = "slide_number")]
    pub number: u32,
    /// Extracted slide text (first line is the title)
    #[serde(default)]
    pub content: Option<String>,
    /// Whether the backend has a rendered image for this slide
    #[serde(rename = "image_available", default)]
    pub has_image: bool,
}

impl SlideRecord {
    /// Create a text-only slide
    pub fn new(number: u32, content: impl Into<String>) -> Self {
        Self {
            number,
            content: Some(content.into()),
            has_image: false,
        }
    }

    /// Mark the slide as having an image
    #[must_use]
    pub fn with_image(mut self) -> Self {
        self.has_image = true;
        self
    }

    /// First line of the slide content
    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.content
            .as_deref()
            .and_then(|c| c.split('\n').next())
            .filter(|line| !line.is_empty())
    }

    /// Everything after the first line
    #[must_use]
    pub fn body(&self) -> Option<&str> {
        self.content
            .as_deref()
            .and_then(|c| c.split_once('\n'))
            .map(|(_, rest)| rest)
            .filter(|rest| !rest.is_empty())
    }
}

/// Wire shape of the slide list response
#[derive(Clone, Debug, Default, Deserialize)]
pub struct SlidesResponse {
    /// Slides in deck order (missing means empty)
    #[serde(default)]
    pub slides: Vec<SlideRecord>,
}

/// A slide-list request in flight, keyed by the deck it was issued for
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SlideRequest {
    /// Deck the request was issued for
    pub deck_id: DeckId,
    /// Issue order; re-selecting the same deck still supersedes
    pub seq: u64,
}

/// What happened when a slide-list result was applied
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SlideOutcome {
    /// Slides replaced, navigation reset to the first slide
    Loaded {
        /// Number of slides now in the session
        count: usize,
    },
    /// Fetch failed; existing slides kept
    Failed {
        /// Human-readable failure text
        message: String,
    },
    /// Result belonged to a deck that is no longer selected
    Stale,
}

/// Loads slide lists and applies them to the session
///
/// Tracks the one outstanding slide-list request. A request is "live" only
/// while its deck is the session's deck and no newer request has replaced it.
#[derive(Debug, Default)]
pub struct SlideFetcher {
    pending: Option<SlideRequest>,
    next_seq: u64,
}

impl SlideFetcher {
    /// Create an idle fetcher
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a request for `deck_id`, superseding any outstanding one
    pub fn begin(&mut self, deck_id: DeckId) -> SlideRequest {
        self.next_seq += 1;
        let request = SlideRequest {
            deck_id,
            seq: self.next_seq,
        };
        self.pending = Some(request);
        request
    }

    /// Forget the outstanding request (deck cleared)
    pub fn cancel(&mut self) {
        self.pending = None;
    }

    /// Whether a request is outstanding
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    /// Decide whether a finished request may be applied
    ///
    /// Returns `true` (and clears the outstanding request) when `request` is
    /// the outstanding one and `live_deck` still matches its deck.
    pub fn accept(&mut self, request: SlideRequest, live_deck: Option<DeckId>) -> bool {
        let current = self.pending == Some(request) && live_deck == Some(request.deck_id);
        if current {
            self.pending = None;
        }
        current
    }
}
