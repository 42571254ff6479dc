//! Pipeline orchestration
//!
//! This module provides the public API for the mastery-zone controller: the
//! stateless entry points over an explicit `ControllerState`, and a stateful
//! per-student processor that keeps bounded answer and score histories.

use crate::error::{check_unit_interval, ZoneError};
use crate::history::{ScoreWindow, DEFAULT_WINDOW_SIZE};
use crate::scorer::PerformanceScorer;
use crate::types::{ControllerState, DiagnosticEvent, ZoneConfig};
use crate::updater::ScoreUpdater;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Create a controller state with the default configuration.
///
/// Fails with `ZoneError::Configuration` if `initial_score` is outside `[1.0, 10.0]`.
///
/// # Example
/// ```
/// let state = mastery_zone::create(5.0).unwrap();
/// assert_eq!(mastery_zone::current_score(&state), 5.0);
/// ```
pub fn create(initial_score: f64) -> Result<ControllerState, ZoneError> {
    ControllerState::new(initial_score, ZoneConfig::default())
}

/// Create a controller state with a custom configuration
pub fn create_with_config(
    initial_score: f64,
    config: ZoneConfig,
) -> Result<ControllerState, ZoneError> {
    ControllerState::new(initial_score, config)
}

/// Recency-weighted performance of a history ordered oldest to newest.
///
/// # Example
/// ```
/// let performance = mastery_zone::compute_performance(&[0.8, 0.9, 1.0]).unwrap();
/// assert!((performance - 0.9545).abs() < 1e-3);
/// ```
pub fn compute_performance(history: &[f64]) -> Result<f64, ZoneError> {
    PerformanceScorer::score(history)
}

/// Apply one raw performance value to `state`, returning the new score and
/// the diagnostic event describing the update.
pub fn update(
    state: &mut ControllerState,
    raw_performance: f64,
) -> Result<(f64, DiagnosticEvent), ZoneError> {
    ScoreUpdater::update(state, raw_performance)
}

/// Current mastery-zone score
pub fn current_score(state: &ControllerState) -> f64 {
    state.current_score()
}

/// Stateful per-student processor.
///
/// Bundles the controller state with a window of recent answer scores (fed to
/// the performance scorer) and a window of past mastery-zone scores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneProcessor {
    state: ControllerState,
    answers: ScoreWindow,
    scores: ScoreWindow,
}

impl ZoneProcessor {
    /// Create a processor with the default configuration and window size
    pub fn new(initial_score: f64) -> Result<Self, ZoneError> {
        Self::with_config(initial_score, ZoneConfig::default(), DEFAULT_WINDOW_SIZE)
    }

    /// Create a processor with a specific configuration and history window
    pub fn with_config(
        initial_score: f64,
        config: ZoneConfig,
        window_size: usize,
    ) -> Result<Self, ZoneError> {
        let state = ControllerState::new(initial_score, config)?;
        let mut scores = ScoreWindow::new(window_size);
        scores.push(state.current_score());

        Ok(Self {
            state,
            answers: ScoreWindow::new(window_size),
            scores,
        })
    }

    /// Record one graded answer.
    ///
    /// The answer joins the recent-answer window, the window is collapsed into a
    /// recency-weighted performance value, and that value drives the update.
    pub fn record_answer(&mut self, answer_score: f64) -> Result<DiagnosticEvent, ZoneError> {
        if let Err(e) = check_unit_interval(answer_score, "answer score") {
            warn!(answer_score, "rejected answer score");
            return Err(e);
        }

        self.answers.push(answer_score);
        let performance = PerformanceScorer::score(&self.answers.to_vec())?;
        self.apply(performance)
    }

    /// Apply an already-aggregated performance value, bypassing the answer window
    pub fn apply_performance(&mut self, raw_performance: f64) -> Result<DiagnosticEvent, ZoneError> {
        if let Err(e) = check_unit_interval(raw_performance, "raw performance") {
            warn!(raw_performance, "rejected performance value");
            return Err(e);
        }
        self.apply(raw_performance)
    }

    fn apply(&mut self, raw_performance: f64) -> Result<DiagnosticEvent, ZoneError> {
        let (new_score, event) = ScoreUpdater::update(&mut self.state, raw_performance)?;
        self.scores.push(new_score);

        debug!(
            old_score = event.old_score,
            new_score = event.new_score,
            raw_performance = event.raw_performance,
            smoothed = event.smoothed_performance,
            trend = event.trend,
            tier = event.tier.as_str(),
            adjustment = event.scaled_adjustment,
            streak = event.consecutive_successes,
            "mastery zone updated"
        );

        Ok(event)
    }

    pub fn current_score(&self) -> f64 {
        self.state.current_score()
    }

    pub fn state(&self) -> &ControllerState {
        &self.state
    }

    /// Recent answer scores, oldest first
    pub fn answer_history(&self) -> Vec<f64> {
        self.answers.to_vec()
    }

    /// Past mastery-zone scores including the seed, oldest first
    pub fn score_history(&self) -> Vec<f64> {
        self.scores.to_vec()
    }

    /// Save processor state to JSON
    pub fn save_state(&self) -> Result<String, ZoneError> {
        let json =
            serde_json::to_string(self).map_err(|e| ZoneError::EncodingError(e.to_string()))?;
        debug!(score = self.state.current_score(), "saved controller state");
        Ok(json)
    }

    /// Replace processor state with one loaded from JSON
    pub fn load_state(&mut self, json: &str) -> Result<(), ZoneError> {
        *self = Self::from_json(json)?;
        Ok(())
    }

    /// Build a processor from saved JSON, re-checking every invariant
    pub fn from_json(json: &str) -> Result<Self, ZoneError> {
        let mut processor: ZoneProcessor =
            serde_json::from_str(json).map_err(|e| ZoneError::ParseError(e.to_string()))?;

        processor.state.validate()?;
        for value in processor.answers.iter() {
            check_unit_interval(*value, "stored answer score")
                .map_err(|e| ZoneError::ParseError(e.to_string()))?;
        }
        let config = *processor.state.config();
        if let Some(bad) = processor.scores.iter().find(|s| !config.contains(**s)) {
            return Err(ZoneError::ParseError(format!(
                "stored score history entry {bad} outside [{}, {}]",
                config.min_score, config.max_score
            )));
        }
        processor.answers.normalize();
        processor.scores.normalize();

        debug!(
            score = processor.state.current_score(),
            answers = processor.answers.len(),
            "loaded controller state"
        );
        Ok(processor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PerformanceTier;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_create_and_accessor() {
        let state = create(5.0).unwrap();
        assert_eq!(current_score(&state), 5.0);
        assert!(matches!(create(0.5), Err(ZoneError::Configuration(_))));
        assert!(matches!(create(11.0), Err(ZoneError::Configuration(_))));
    }

    #[test]
    fn test_create_with_config_checks_custom_bounds() {
        let config = ZoneConfig {
            min_score: 0.0,
            max_score: 5.0,
            ..Default::default()
        };
        assert!(create_with_config(0.5, config).is_ok());
        assert!(create_with_config(6.0, config).is_err());
    }

    #[test]
    fn test_compute_performance() {
        assert_eq!(compute_performance(&[]).unwrap(), 0.5);
        let p = compute_performance(&[0.8, 0.9, 1.0]).unwrap();
        assert!((p - 0.9545).abs() < 1e-4);
    }

    #[test]
    fn test_update_scenario() {
        let mut state = create(5.0).unwrap();
        let (score, event) = update(&mut state, 0.95).unwrap();
        assert_eq!(score, 5.0);
        assert_eq!(event.tier, PerformanceTier::Success);
        assert_eq!(state.consecutive_successes(), 1);
    }

    #[test]
    fn test_independent_students() {
        let mut alice = create(5.0).unwrap();
        let mut bob = create(5.0).unwrap();

        for _ in 0..5 {
            update(&mut alice, 1.0).unwrap();
        }
        update(&mut bob, 0.2).unwrap();

        assert!(current_score(&alice) > current_score(&bob));
        assert_eq!(bob.consecutive_successes(), 0);
    }

    #[test]
    fn test_processor_records_answers() {
        let mut processor = ZoneProcessor::new(5.0).unwrap();
        for _ in 0..6 {
            processor.record_answer(1.0).unwrap();
        }

        assert_eq!(processor.answer_history(), vec![1.0; 6]);
        assert_eq!(processor.score_history().len(), 7);
        assert_eq!(processor.score_history()[0], 5.0);
        assert!(processor.current_score() > 5.0);
    }

    #[test]
    fn test_processor_uses_recency_weighted_window() {
        let mut processor = ZoneProcessor::new(5.0).unwrap();
        processor.record_answer(0.8).unwrap();
        processor.record_answer(0.9).unwrap();
        let event = processor.record_answer(1.0).unwrap();

        assert!((event.raw_performance - 0.954545).abs() < 1e-4);
        assert_eq!(event.tier, PerformanceTier::Success);
    }

    #[test]
    fn test_processor_windows_are_bounded() {
        let mut processor = ZoneProcessor::with_config(5.0, ZoneConfig::default(), 3).unwrap();
        for answer in [0.1, 0.2, 0.3, 0.4, 0.5] {
            processor.record_answer(answer).unwrap();
        }
        assert_eq!(processor.answer_history(), vec![0.3, 0.4, 0.5]);
        assert_eq!(processor.score_history().len(), 3);
    }

    #[test]
    fn test_processor_rejects_invalid_answer() {
        let mut processor = ZoneProcessor::new(5.0).unwrap();
        let before = processor.clone();

        assert!(matches!(
            processor.record_answer(1.5),
            Err(ZoneError::InvalidInput(_))
        ));
        assert!(processor.apply_performance(-1.0).is_err());
        assert_eq!(processor, before);
    }

    #[test]
    fn test_apply_performance_skips_window() {
        let mut processor = ZoneProcessor::new(5.0).unwrap();
        let event = processor.apply_performance(0.95).unwrap();
        assert_eq!(event.raw_performance, 0.95);
        assert!(processor.answer_history().is_empty());
        assert_eq!(processor.score_history(), vec![5.0, 5.0]);
    }

    #[test]
    fn test_state_roundtrip() {
        let mut processor = ZoneProcessor::new(6.5).unwrap();
        processor.record_answer(0.7).unwrap();
        processor.record_answer(1.0).unwrap();

        let saved = processor.save_state().unwrap();
        let mut restored = ZoneProcessor::new(5.0).unwrap();
        restored.load_state(&saved).unwrap();

        assert_eq!(restored, processor);

        // Both continue identically
        let a = processor.record_answer(0.95).unwrap();
        let b = restored.record_answer(0.95).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_state_roundtrip_with_fractional_bounds() {
        let config = ZoneConfig {
            max_score: 9.95,
            ..Default::default()
        };
        let mut processor = ZoneProcessor::with_config(9.95, config, DEFAULT_WINDOW_SIZE).unwrap();
        processor.record_answer(1.0).unwrap();
        assert!(processor.current_score() <= 9.95);

        let restored = ZoneProcessor::from_json(&processor.save_state().unwrap()).unwrap();
        assert_eq!(restored, processor);
    }

    #[test]
    fn test_load_rejects_corrupt_state() {
        let processor = ZoneProcessor::new(5.0).unwrap();
        let mut value: serde_json::Value =
            serde_json::from_str(&processor.save_state().unwrap()).unwrap();
        value["state"]["current_score"] = serde_json::json!(42.0);

        let result = ZoneProcessor::from_json(&value.to_string());
        assert!(matches!(result, Err(ZoneError::ParseError(_))));

        assert!(ZoneProcessor::from_json("not json").is_err());
    }

    #[test]
    fn test_load_rejects_bad_answer_history() {
        let processor = ZoneProcessor::new(5.0).unwrap();
        let mut value: serde_json::Value =
            serde_json::from_str(&processor.save_state().unwrap()).unwrap();
        value["answers"]["values"] = serde_json::json!([0.5, 3.0]);

        assert!(ZoneProcessor::from_json(&value.to_string()).is_err());
    }
}
