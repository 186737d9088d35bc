//! Reader navigation
//!
//! A page flip is a two-step transition: `next`/`prev` start it and
//! `finish_flip` commits it once the animation is over. Navigation is
//! ignored while a flip is in progress.

use serde::Serialize;

/// State of the reader
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum ReaderState {
    Steady { page: usize },
    Flipping { from: usize, to: usize },
}

/// Page navigation over a story of `page_count` pages
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reader {
    page_count: usize,
    state: ReaderState,
}

impl Reader {
    pub fn new(page_count: usize) -> Self {
        Self {
            page_count,
            state: ReaderState::Steady { page: 0 },
        }
    }

    pub fn state(&self) -> ReaderState {
        self.state
    }

    pub fn page_count(&self) -> usize {
        self.page_count
    }

    /// Page shown, or the page being left during a flip
    pub fn current_page(&self) -> usize {
        match self.state {
            ReaderState::Steady { page } => page,
            ReaderState::Flipping { from, .. } => from,
        }
    }

    pub fn is_flipping(&self) -> bool {
        matches!(self.state, ReaderState::Flipping { .. })
    }

    pub fn can_go_next(&self) -> bool {
        !self.is_flipping() && self.current_page() + 1 < self.page_count
    }

    pub fn can_go_prev(&self) -> bool {
        !self.is_flipping() && self.current_page() > 0
    }

    /// Start flipping to the next page; returns whether a flip started
    pub fn next(&mut self) -> bool {
        if !self.can_go_next() {
            return false;
        }
        let from = self.current_page();
        self.state = ReaderState::Flipping { from, to: from + 1 };
        true
    }

    /// Start flipping to the previous page; returns whether a flip started
    pub fn prev(&mut self) -> bool {
        if !self.can_go_prev() {
            return false;
        }
        let from = self.current_page();
        self.state = ReaderState::Flipping { from, to: from - 1 };
        true
    }

    /// Commit the flip in progress
    pub fn finish_flip(&mut self) {
        if let ReaderState::Flipping { to, .. } = self.state {
            self.state = ReaderState::Steady { page: to };
        }
    }
}
