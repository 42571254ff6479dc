//! Bounded score windows
//!
//! Keeps the most recent scores in insertion order, evicting the oldest once
//! the window is full. Used for both answer scores and score history.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Default number of entries kept in a window
pub const DEFAULT_WINDOW_SIZE: usize = 10;

/// Rolling window of recent scores
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreWindow {
    /// Scores, oldest first
    values: VecDeque<f64>,
    /// Maximum window size
    window_size: usize,
}

impl Default for ScoreWindow {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_SIZE)
    }
}

impl ScoreWindow {
    /// Create an empty window; a size of zero is bumped to one
    pub fn new(window_size: usize) -> Self {
        let window_size = window_size.max(1);
        Self {
            values: VecDeque::with_capacity(window_size),
            window_size,
        }
    }

    /// Append a score, evicting from the front while over capacity
    pub fn push(&mut self, value: f64) {
        self.values.push_back(value);
        while self.values.len() > self.window_size {
            self.values.pop_front();
        }
    }

    /// Contiguous copy of the window, oldest first
    pub fn to_vec(&self) -> Vec<f64> {
        self.values.iter().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &f64> {
        self.values.iter()
    }

    /// Restore capacity after deserializing, trimming surplus from the front
    pub(crate) fn normalize(&mut self) {
        self.window_size = self.window_size.max(1);
        while self.values.len() > self.window_size {
            self.values.pop_front();
        }
    }
}
