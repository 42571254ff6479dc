//! Score updating
//!
//! Orchestrates one controller update:
//! 1. PerformanceSmoother - refresh smoothed performance and trend
//! 2. AdjustmentPolicy - raw adjustment and streak state
//! 3. Square-root damping of the adjustment
//! 4. Slow EMA blend toward `old + scaled`, clamp, round to one decimal

use crate::error::{check_unit_interval, ZoneError};
use crate::policy::AdjustmentPolicy;
use crate::smoother::PerformanceSmoother;
use crate::types::{ControllerState, DiagnosticEvent};

/// Multiplier applied after square-root compression
const DAMPING_FACTOR: f64 = 0.5;

/// Round to one decimal place, ties away from zero.
///
/// Fixed explicitly so every consumer agrees on `.x5` boundaries.
pub fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Compress an adjustment: `sign(a) * sqrt(|a|) * 0.5`
pub fn damp(adjustment: f64) -> f64 {
    if adjustment == 0.0 {
        return 0.0;
    }
    adjustment.signum() * adjustment.abs().sqrt() * DAMPING_FACTOR
}

/// Slow EMA step from `old_score` toward `target_score`
pub fn blend(old_score: f64, target_score: f64, beta: f64) -> f64 {
    beta * target_score + (1.0 - beta) * old_score
}

/// Applies performance values to a controller state
pub struct ScoreUpdater;

impl ScoreUpdater {
    /// Apply one raw performance value and return the new score and its event.
    ///
    /// `raw_performance` must be a finite value in `[0.0, 1.0]`; on rejection
    /// the state is left untouched.
    pub fn update(
        state: &mut ControllerState,
        raw_performance: f64,
    ) -> Result<(f64, DiagnosticEvent), ZoneError> {
        check_unit_interval(raw_performance, "raw performance")?;

        let old_score = state.current_score;
        let config = state.config;

        let (smoothed_performance, trend) = PerformanceSmoother::smooth(state, raw_performance);
        let (tier, adjustment) = AdjustmentPolicy::adjust(state, raw_performance);

        let scaled_adjustment = damp(adjustment);
        let target_score = old_score + scaled_adjustment;
        let blended = blend(old_score, target_score, config.score_beta);

        // Round first, then clamp again so a rounded value can never leave the
        // bounds when they are not multiples of 0.1.
        let new_score = round_to_tenth(blended.clamp(config.min_score, config.max_score))
            .clamp(config.min_score, config.max_score);
        state.current_score = new_score;

        let event = DiagnosticEvent {
            old_score,
            raw_performance,
            smoothed_performance,
            trend,
            tier,
            adjustment,
            scaled_adjustment,
            consecutive_successes: state.consecutive_successes,
            new_score,
        };

        Ok((new_score, event))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PerformanceTier, ZoneConfig};

    fn state_at(score: f64) -> ControllerState {
        ControllerState::new(score, ZoneConfig::default()).unwrap()
    }

    #[test]
    fn test_damping_examples() {
        assert!((damp(0.70) - 0.4183).abs() < 1e-4);
        assert!((damp(0.10) - 0.1581).abs() < 1e-4);
        assert!((damp(-0.15) + 0.1936).abs() < 1e-4);
        assert_eq!(damp(0.0), 0.0);
    }

    #[test]
    fn test_blend_moves_fraction_of_gap() {
        assert!((blend(5.0, 6.0, 0.15) - 5.15).abs() < 1e-12);
        assert_eq!(blend(5.0, 6.0, 1.0), 6.0);
        assert!((blend(5.0, 5.0, 0.15) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_round_to_tenth() {
        assert_eq!(round_to_tenth(5.0474), 5.0);
        assert_eq!(round_to_tenth(5.06), 5.1);
        assert_eq!(round_to_tenth(9.96), 10.0);
        assert_eq!(round_to_tenth(1.04), 1.0);
        assert_eq!(round_to_tenth(2.25), 2.3);
    }

    #[test]
    fn test_single_strong_result_scenario() {
        let mut state = state_at(5.0);
        let (new_score, event) = ScoreUpdater::update(&mut state, 0.95).unwrap();

        assert!((event.smoothed_performance - 0.635).abs() < 1e-9);
        assert!((event.trend - 0.135).abs() < 1e-9);
        assert_eq!(event.tier, PerformanceTier::Success);
        assert_eq!(event.consecutive_successes, 1);
        assert!((event.adjustment - 0.40).abs() < 1e-9);
        assert!((event.scaled_adjustment - 0.3162).abs() < 1e-4);
        assert_eq!(event.old_score, 5.0);

        let target = event.old_score + event.scaled_adjustment;
        assert!((target - 5.3162).abs() < 1e-4);
        let blended = blend(event.old_score, target, 0.15);
        assert!((blended - 5.0474).abs() < 1e-4);
        assert_eq!(round_to_tenth(blended), new_score);
        assert_eq!(new_score, 5.0);
        assert_eq!(state.current_score(), 5.0);
    }

    #[test]
    fn test_streak_moves_score_up() {
        let mut state = state_at(5.0);
        for _ in 0..10 {
            ScoreUpdater::update(&mut state, 1.0).unwrap();
        }
        assert!(state.current_score() > 5.0);
        assert_eq!(state.consecutive_successes(), 10);
    }

    #[test]
    fn test_clamped_at_max() {
        let mut state = state_at(10.0);
        for _ in 0..5 {
            let (score, _) = ScoreUpdater::update(&mut state, 1.0).unwrap();
            assert_eq!(score, 10.0);
        }
    }

    #[test]
    fn test_weak_scores_never_below_min() {
        let mut state = state_at(1.0);
        for _ in 0..30 {
            let (score, event) = ScoreUpdater::update(&mut state, 0.0).unwrap();
            assert_eq!(score, 1.0);
            assert!(event.scaled_adjustment < 0.0);
        }
    }

    #[test]
    fn test_single_weak_result_absorbed_by_rounding() {
        // 0.15 * damp(-0.15) is under half a display step
        let mut state = state_at(1.2);
        let (score, _) = ScoreUpdater::update(&mut state, 0.0).unwrap();
        assert_eq!(score, 1.2);
    }

    #[test]
    fn test_rejects_out_of_range_without_mutation() {
        let mut state = state_at(5.0);
        let before = state.clone();

        assert!(matches!(
            ScoreUpdater::update(&mut state, 1.4),
            Err(ZoneError::InvalidInput(_))
        ));
        assert!(ScoreUpdater::update(&mut state, -0.1).is_err());
        assert!(ScoreUpdater::update(&mut state, f64::NAN).is_err());
        assert_eq!(state, before);
    }

    #[test]
    fn test_event_matches_state() {
        let mut state = state_at(6.0);
        let (score, event) = ScoreUpdater::update(&mut state, 0.3).unwrap();
        assert_eq!(event.new_score, score);
        assert_eq!(event.smoothed_performance, state.smoothed_performance());
        assert_eq!(event.trend, state.performance_trend());
        assert_eq!(event.tier, PerformanceTier::Weak);
    }
}
