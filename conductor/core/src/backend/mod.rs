//! Tutor Backend Integration
//!
//! This module provides abstracted access to the tutoring backend through a
//! common trait interface.
//!
//! # Available Backends
//!
//! - **HTTP**: The ai-tutor REST API (default)
//!
//! # Usage
//!
//! ```ignore
//! use lesson_core::backend::{HttpBackend, TutorBackend};
//! use lesson_core::slides::DeckId;
//!
//! let backend = HttpBackend::new("http://localhost:8000", token, timeout);
//! let slides = backend.list_slides(DeckId(7)).await?;
//! ```

mod http;
mod traits;

pub use http::HttpBackend;
pub use traits::{Answer, BackendError, TutorBackend};
