//! Lesson Core - Headless Teaching Session Controller for ai-tutor
//!
//! This crate holds the state and async coordination behind a teaching
//! session: pick a slide deck, step through its slides, show each slide's
//! image and ask the AI teacher to explain what's on screen. It has no UI
//! dependencies and can drive a terminal, a browser bridge or a test harness.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         Surfaces                             │
//! │     ┌──────────┐        ┌──────────┐        ┌───────────┐    │
//! │     │   CLI    │        │  Web     │        │ Headless  │    │
//! │     └────┬─────┘        └────┬─────┘        └─────┬─────┘    │
//! │          └───────────────────┼────────────────────┘          │
//! │                 TutorEvent (up) / TutorMessage (down)        │
//! └──────────────────────────────┼───────────────────────────────┘
//!                                │
//! ┌──────────────────────────────┼───────────────────────────────┐
//! │                       LESSON CORE                            │
//! │  ┌───────────────────────────┴────────────────────────────┐  │
//! │  │                  TeachingConductor                     │  │
//! │  │  ┌──────────┐ ┌────────────┐ ┌────────┐ ┌───────────┐  │  │
//! │  │  │ Session  │ │ Explainer  │ │ Images │ │  Backend  │  │  │
//! │  │  │  State   │ │  + Avatar  │ │        │ │  (HTTP)   │  │  │
//! │  │  └──────────┘ └────────────┘ └────────┘ └───────────┘  │  │
//! │  └────────────────────────────────────────────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Key Types
//!
//! - [`TeachingConductor`]: Runs effects and applies their completions
//! - [`SessionState`]: The single session store
//! - [`TutorEvent`]: Events sent from a surface to the conductor
//! - [`TutorMessage`]: Messages sent from the conductor to a surface
//! - [`AvatarState`]: Teacher avatar, derived from the explanation status
//! - [`ResourceHandle`]: Owned slide image, released exactly once
//!
//! # Quick Start
//!
//! ```ignore
//! use lesson_core::{
//!     config::load_config, HttpBackend, TeachingConductor, TutorEvent, DeckId,
//! };
//! use tokio::sync::mpsc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = load_config()?;
//!     let (tx, mut rx) = mpsc::unbounded_channel();
//!
//!     let backend = HttpBackend::from_config(&config.api);
//!     let mut conductor = TeachingConductor::new(backend, config.conductor, tx);
//!     conductor.start().await?;
//!
//!     conductor.handle_event(TutorEvent::SelectDeck { deck_id: Some(DeckId(7)) })?;
//!
//!     loop {
//!         conductor.next_completion().await;
//!         while let Ok(msg) = rx.try_recv() {
//!             // Render message
//!         }
//!     }
//! }
//! ```
//!
//! # Module Overview
//!
//! - [`slides`]: Deck and slide types, slide list fetching
//! - [`navigation`]: Index arithmetic over the slide list
//! - [`explanation`]: "Explain this slide" request lifecycle
//! - [`question`]: Free-form questions to the tutor
//! - [`image`]: Slide image handles and their single-owner manager
//! - [`avatar`]: Avatar state derivation
//! - [`session`]: The session store tying the above together
//! - [`effects`]: Async work requested by the store
//! - [`conductor`]: Main orchestration struct
//! - [`backend`]: Backend trait and the HTTP implementation
//! - [`config`]: TOML / environment configuration

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod avatar;
pub mod backend;
pub mod conductor;
pub mod config;
pub mod effects;
pub mod events;
pub mod explanation;
pub mod image;
pub mod messages;
pub mod navigation;
pub mod question;
pub mod session;
pub mod slides;

// Re-exports for convenience
pub use avatar::AvatarState;
pub use backend::{Answer, BackendError, HttpBackend, TutorBackend};
pub use conductor::{ConductorConfig, TeachingConductor};
pub use effects::{Completion, Effect};
pub use events::TutorEvent;
pub use explanation::{ExplanationRequester, ExplanationStatus};
pub use image::{HandleId, HandleTracker, ImageResourceManager, ResourceHandle};
pub use messages::{ConductorState, NotifyLevel, TutorMessage};
pub use navigation::{Direction, NavigationController};
pub use question::{QuestionRequester, QuestionStatus};
pub use session::{AppliedOutcome, ImageView, SessionSnapshot, SessionState};
pub use slides::{DeckId, SlideFetcher, SlideRecord};

// Config exports
pub use config::{
    default_config_path, load_config, load_config_from_path, ApiConfig, ConfigError,
    ConfigOverrides, ConfigSource, TutorConfig,
};
