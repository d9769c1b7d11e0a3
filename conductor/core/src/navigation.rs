//! Slide Navigation
//!
//! Index arithmetic over the slide list. Everything here is synchronous;
//! the session store layers the explanation reset and the image reload on
//! top of it.

use serde::{Deserialize, Serialize};

/// Navigation direction
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    /// Towards slide 1
    Previous,
    /// Towards the last slide
    Next,
}

/// Current position within the slide list
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NavigationController {
    index: usize,
}

impl NavigationController {
    /// Start at the first slide
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current 0-based index
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Back to the first slide
    pub fn reset(&mut self) {
        self.index = 0;
    }

    /// Move one step in `direction` within a list of `len` slides
    ///
    /// Returns whether the index changed. Stepping past either end is a
    /// no-op.
    pub fn step(&mut self, direction: Direction, len: usize) -> bool {
        let before = self.index;
        self.index = match direction {
            Direction::Previous => self.index.saturating_sub(1),
            Direction::Next => (self.index + 1).min(len.saturating_sub(1)),
        };
        self.index != before
    }

    /// Whether stepping back would move
    #[must_use]
    pub fn can_previous(&self) -> bool {
        self.index > 0
    }

    /// Whether stepping forward would move in a list of `len` slides
    #[must_use]
    pub fn can_next(&self, len: usize) -> bool {
        self.index + 1 < len
    }
}
