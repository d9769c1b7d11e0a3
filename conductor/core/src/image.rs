//! Slide Images
//!
//! Owned handles to fetched image bytes, and the manager that keeps at most
//! one of them alive for the slide currently on screen.
//!
//! # Handle Lifecycle
//!
//! A [`ResourceHandle`] is acquired from a [`HandleTracker`] the moment image
//! bytes arrive from the backend, and is released exactly once: either by
//! [`ResourceHandle::release`] or, if the owner forgets, when the handle is
//! dropped. The tracker keeps the set of live handle IDs so callers (and
//! tests) can check that no handle leaks.
//!
//! ```text
//!   begin(slide 2) ──▶ release current ──▶ pending = (D1, 2, #n)
//!                                               │
//!        fetch resolves ──▶ complete(#n) ───────┤
//!                                               ├── still current: install
//!                                               └── superseded:   release now
//! ```

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use parking_lot::Mutex;

use crate::backend::BackendError;
use crate::slides::DeckId;

/// Identifier of an acquired image handle
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct HandleId(pub u64);

impl std::fmt::Display for HandleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "img_{}", self.0)
    }
}

/// Ledger of image handles handed out and not yet released
#[derive(Debug, Default)]
pub struct HandleTracker {
    next_id: AtomicU64,
    released: AtomicU64,
    live: Mutex<HashSet<HandleId>>,
}

impl HandleTracker {
    /// Create an empty tracker
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Wrap freshly fetched bytes in a tracked handle
    pub fn acquire(self: &Arc<Self>, data: Bytes) -> ResourceHandle {
        let id = HandleId(self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        self.live.lock().insert(id);
        tracing::trace!(handle = %id, bytes = data.len(), "Image handle acquired");
        ResourceHandle {
            id,
            data,
            tracker: Arc::clone(self),
            released: false,
        }
    }

    fn release(&self, id: HandleId) {
        if self.live.lock().remove(&id) {
            self.released.fetch_add(1, Ordering::SeqCst);
            tracing::trace!(handle = %id, "Image handle released");
        }
    }

    /// Number of handles acquired and not yet released
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.live.lock().len()
    }

    /// Whether a specific handle is still live
    #[must_use]
    pub fn is_live(&self, id: HandleId) -> bool {
        self.live.lock().contains(&id)
    }

    /// Total handles ever acquired
    #[must_use]
    pub fn acquired_count(&self) -> u64 {
        self.next_id.load(Ordering::SeqCst)
    }

    /// Total handles released
    #[must_use]
    pub fn released_count(&self) -> u64 {
        self.released.load(Ordering::SeqCst)
    }
}

/// Owned reference to one fetched slide image
///
/// Released exactly once, explicitly or on drop.
pub struct ResourceHandle {
    id: HandleId,
    data: Bytes,
    tracker: Arc<HandleTracker>,
    released: bool,
}

impl ResourceHandle {
    /// Handle identifier
    #[must_use]
    pub fn id(&self) -> HandleId {
        self.id
    }

    /// Size of the image in bytes
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the payload is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Release the handle
    pub fn release(mut self) {
        self.release_inner();
    }

    fn release_inner(&mut self) {
        if !self.released {
            self.released = true;
            self.tracker.release(self.id);
        }
    }
}

impl Drop for ResourceHandle {
    fn drop(&mut self) {
        self.release_inner();
    }
}

impl std::fmt::Debug for ResourceHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceHandle")
            .field("id", &self.id)
            .field("bytes", &self.data.len())
            .finish()
    }
}

/// An image request in flight
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImageRequest {
    /// Deck the image belongs to
    pub deck_id: DeckId,
    /// Slide the image belongs to
    pub slide_number: u32,
    /// Issue order within the manager
    pub seq: u64,
}

impl ImageRequest {
    /// The `(deck, slide)` this request was issued for
    #[must_use]
    pub fn key(&self) -> (DeckId, u32) {
        (self.deck_id, self.slide_number)
    }
}

/// What happened when an image result was applied
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImageOutcome {
    /// Handle installed as the current image
    Installed {
        /// Slide now showing the image
        slide_number: u32,
        /// Handle now held
        handle: HandleId,
        /// Image size in bytes
        bytes: usize,
    },
    /// Fetch failed; slide shows a placeholder
    Unavailable {
        /// Slide left without an image
        slide_number: u32,
    },
    /// The slide moved on before the result arrived
    Stale,
}

/// Owner of the single live slide image
#[derive(Debug)]
pub struct ImageResourceManager {
    tracker: Arc<HandleTracker>,
    current: Option<ResourceHandle>,
    pending: Option<ImageRequest>,
    next_seq: u64,
}

impl ImageResourceManager {
    /// Create a manager that acquires handles from `tracker`
    #[must_use]
    pub fn new(tracker: Arc<HandleTracker>) -> Self {
        Self {
            tracker,
            current: None,
            pending: None,
            next_seq: 0,
        }
    }

    /// The tracker handles are acquired from
    #[must_use]
    pub fn tracker(&self) -> &Arc<HandleTracker> {
        &self.tracker
    }

    /// The image currently installed
    #[must_use]
    pub fn current(&self) -> Option<&ResourceHandle> {
        self.current.as_ref()
    }

    /// Whether an image fetch is outstanding
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    /// Start loading the image for `(deck_id, slide_number)`
    ///
    /// The previously installed image is released before the request is
    /// issued so a changed slide never shows the old picture.
    pub fn begin(&mut self, deck_id: DeckId, slide_number: u32) -> ImageRequest {
        self.release_current();
        self.next_seq += 1;
        let request = ImageRequest {
            deck_id,
            slide_number,
            seq: self.next_seq,
        };
        self.pending = Some(request);
        request
    }

    /// Drop the current image and forget any outstanding request
    pub fn clear(&mut self) {
        self.release_current();
        self.pending = None;
    }

    /// Apply a finished fetch
    ///
    /// `live_slide` is the session's current `(deck, slide)`; the result is
    /// only installed when it matches the request and the request is the
    /// latest one issued. Anything else releases the new handle immediately.
    pub fn complete(
        &mut self,
        request: ImageRequest,
        result: Result<ResourceHandle, BackendError>,
        live_slide: Option<(DeckId, u32)>,
    ) -> ImageOutcome {
        let is_current =
            self.pending == Some(request) && live_slide == Some(request.key());

        if !is_current {
            if let Ok(handle) = result {
                tracing::debug!(
                    deck = %request.deck_id,
                    slide = request.slide_number,
                    handle = %handle.id(),
                    "Discarding late slide image"
                );
                handle.release();
            }
            return ImageOutcome::Stale;
        }

        self.pending = None;
        match result {
            Ok(handle) => {
                let outcome = ImageOutcome::Installed {
                    slide_number: request.slide_number,
                    handle: handle.id(),
                    bytes: handle.len(),
                };
                self.install(handle);
                outcome
            }
            Err(e) => {
                tracing::debug!(
                    deck = %request.deck_id,
                    slide = request.slide_number,
                    error = %e,
                    "Slide image unavailable"
                );
                self.release_current();
                ImageOutcome::Unavailable {
                    slide_number: request.slide_number,
                }
            }
        }
    }

    /// Release the final image (controller going away)
    pub fn teardown(&mut self) {
        self.clear();
    }

    fn install(&mut self, handle: ResourceHandle) {
        if let Some(previous) = self.current.replace(handle) {
            previous.release();
        }
    }

    fn release_current(&mut self) {
        if let Some(handle) = self.current.take() {
            handle.release();
        }
    }
}
