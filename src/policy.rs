//! Adjustment policy
//!
//! Maps one raw (unsmoothed) performance value to a signed, unscaled score
//! adjustment. Three tiers, boundaries inclusive toward the higher tier:
//! - Success (>= 0.9): base reward plus a streak bonus capped at 3 successes
//! - Partial (0.6 - 0.9): small positive nudge growing with closeness to 0.9
//! - Weak (< 0.6): capped penalty

use crate::types::{ControllerState, PerformanceTier};

/// Raw performance at or above this counts as a success
pub const SUCCESS_THRESHOLD: f64 = 0.9;
/// Raw performance at or above this (and below success) counts as partial
pub const PARTIAL_THRESHOLD: f64 = 0.6;

const SUCCESS_BASE: f64 = 0.25;
const STREAK_BONUS: f64 = 0.15;
/// Successes beyond this count earn no additional bonus
const STREAK_CAP: u32 = 3;

const PARTIAL_BASE: f64 = 0.1;
const PARTIAL_SLOPE: f64 = 0.4;

const WEAK_SLOPE: f64 = 0.3;
const WEAK_PENALTY_CAP: f64 = 0.15;

/// Tiered adjustment policy with streak tracking
pub struct AdjustmentPolicy;

impl AdjustmentPolicy {
    /// Classify a raw performance value
    pub fn tier(raw_performance: f64) -> PerformanceTier {
        if raw_performance >= SUCCESS_THRESHOLD {
            PerformanceTier::Success
        } else if raw_performance >= PARTIAL_THRESHOLD {
            PerformanceTier::Partial
        } else {
            PerformanceTier::Weak
        }
    }

    /// Compute the adjustment and update the success streak.
    ///
    /// The streak counter keeps incrementing past the cap; only the bonus is capped.
    pub fn adjust(state: &mut ControllerState, raw_performance: f64) -> (PerformanceTier, f64) {
        let tier = Self::tier(raw_performance);

        let adjustment = match tier {
            PerformanceTier::Success => {
                state.consecutive_successes = state.consecutive_successes.saturating_add(1);
                let counted = state.consecutive_successes.min(STREAK_CAP);
                SUCCESS_BASE + counted as f64 * STREAK_BONUS
            }
            PerformanceTier::Partial => {
                state.consecutive_successes = 0;
                PARTIAL_BASE + (raw_performance - PARTIAL_THRESHOLD) * PARTIAL_SLOPE
            }
            PerformanceTier::Weak => {
                state.consecutive_successes = 0;
                -((PARTIAL_THRESHOLD - raw_performance) * WEAK_SLOPE).min(WEAK_PENALTY_CAP)
            }
        };

        (tier, adjustment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ZoneConfig;

    fn fresh_state() -> ControllerState {
        ControllerState::new(5.0, ZoneConfig::default()).unwrap()
    }

    #[test]
    fn test_tier_boundaries_inclusive_upward() {
        assert_eq!(AdjustmentPolicy::tier(0.9), PerformanceTier::Success);
        assert_eq!(AdjustmentPolicy::tier(0.8999), PerformanceTier::Partial);
        assert_eq!(AdjustmentPolicy::tier(0.6), PerformanceTier::Partial);
        assert_eq!(AdjustmentPolicy::tier(0.5999), PerformanceTier::Weak);
        assert_eq!(AdjustmentPolicy::tier(0.0), PerformanceTier::Weak);
    }

    #[test]
    fn test_success_streak_bonus_capped() {
        let mut state = fresh_state();
        let adjustments: Vec<f64> = (0..4)
            .map(|_| AdjustmentPolicy::adjust(&mut state, 0.95).1)
            .collect();

        assert!((adjustments[0] - 0.40).abs() < 1e-9);
        assert!((adjustments[1] - 0.55).abs() < 1e-9);
        assert!((adjustments[2] - 0.70).abs() < 1e-9);
        assert_eq!(adjustments[2], adjustments[3]);
        assert_eq!(state.consecutive_successes(), 4);
    }

    #[test]
    fn test_partial_resets_streak() {
        let mut state = fresh_state();
        AdjustmentPolicy::adjust(&mut state, 1.0);
        AdjustmentPolicy::adjust(&mut state, 1.0);
        assert_eq!(state.consecutive_successes(), 2);

        let (tier, adjustment) = AdjustmentPolicy::adjust(&mut state, 0.6);
        assert_eq!(tier, PerformanceTier::Partial);
        assert!((adjustment - 0.1).abs() < 1e-9);
        assert_eq!(state.consecutive_successes(), 0);
    }

    #[test]
    fn test_partial_range() {
        let mut state = fresh_state();
        let (_, high) = AdjustmentPolicy::adjust(&mut state, 0.8999);
        assert!(high > 0.1 && high < 0.22);

        let (_, mid) = AdjustmentPolicy::adjust(&mut state, 0.75);
        assert!((mid - 0.16).abs() < 1e-9);
    }

    #[test]
    fn test_weak_penalty_capped() {
        let mut state = fresh_state();
        AdjustmentPolicy::adjust(&mut state, 0.95);

        let (tier, adjustment) = AdjustmentPolicy::adjust(&mut state, 0.0);
        assert_eq!(tier, PerformanceTier::Weak);
        assert!((adjustment + 0.15).abs() < 1e-9);
        assert_eq!(state.consecutive_successes(), 0);

        // (0.6 - 0.4) * 0.3 = 0.06, below the cap
        let (_, mild) = AdjustmentPolicy::adjust(&mut state, 0.4);
        assert!((mild + 0.06).abs() < 1e-9);
    }

    #[test]
    fn test_weak_near_threshold_is_small() {
        let mut state = fresh_state();
        let (_, adjustment) = AdjustmentPolicy::adjust(&mut state, 0.59);
        assert!(adjustment < 0.0);
        assert!(adjustment > -0.01);
    }
}
