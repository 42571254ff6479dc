//! Performance scoring
//!
//! Collapses a bounded history of per-answer scores into one recency-weighted
//! performance value. Recent answers weigh up to 10x more than the oldest.

use crate::error::{check_unit_interval, ZoneError};
use crate::types::NEUTRAL_PERFORMANCE;

/// Weight of the oldest sample
const OLDEST_WEIGHT: f64 = 0.1;
/// Weight of the newest sample
const NEWEST_WEIGHT: f64 = 1.0;

/// Scorer for recency-weighted performance
pub struct PerformanceScorer;

impl PerformanceScorer {
    /// Score a history of answer scores ordered oldest to newest.
    ///
    /// Returns the neutral value 0.5 for an empty history. Every entry must be
    /// a finite value in `[0.0, 1.0]`.
    pub fn score(history: &[f64]) -> Result<f64, ZoneError> {
        for (index, value) in history.iter().enumerate() {
            check_unit_interval(*value, &format!("history entry {index}"))?;
        }
        Ok(weighted_mean(history))
    }
}

/// Linearly increasing weights spanning `[0.1, 1.0]`; a single sample gets `1.0`
fn recency_weights(n: usize) -> impl Iterator<Item = f64> {
    (0..n).map(move |i| {
        if n == 1 {
            NEWEST_WEIGHT
        } else {
            OLDEST_WEIGHT + (NEWEST_WEIGHT - OLDEST_WEIGHT) * (i as f64 / (n - 1) as f64)
        }
    })
}

/// Weighted mean of already-validated samples, clamped to `[0, 1]`
fn weighted_mean(history: &[f64]) -> f64 {
    if history.is_empty() {
        return NEUTRAL_PERFORMANCE;
    }

    let (weighted_sum, weight_sum) = recency_weights(history.len())
        .zip(history)
        .fold((0.0, 0.0), |(sum, total), (w, s)| (sum + w * s, total + w));

    (weighted_sum / weight_sum).clamp(0.0, 1.0)
}
