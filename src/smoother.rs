//! Performance smoothing
//!
//! Maintains an exponential moving average of raw performance and its first
//! difference. The trend is diagnostic only and never feeds the adjustment policy.

use crate::types::ControllerState;

/// EMA smoother for raw performance
pub struct PerformanceSmoother;

impl PerformanceSmoother {
    /// Blend `raw_performance` into the state and return `(smoothed, trend)`.
    ///
    /// The trend is measured against the pre-update smoothed value.
    pub fn smooth(state: &mut ControllerState, raw_performance: f64) -> (f64, f64) {
        let alpha = state.config.performance_alpha;
        let previous = state.smoothed_performance;

        let smoothed = alpha * raw_performance + (1.0 - alpha) * previous;
        let trend = smoothed - previous;

        state.smoothed_performance = smoothed;
        state.performance_trend = trend;

        (smoothed, trend)
    }
}
