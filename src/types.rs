//! Core types for the mastery-zone controller
//!
//! This module defines the configuration, the per-student controller state and
//! the diagnostic event emitted by every update.

use crate::error::ZoneError;
use crate::updater::round_to_tenth;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lowest score the controller will ever report
pub const DEFAULT_MIN_SCORE: f64 = 1.0;
/// Highest score the controller will ever report
pub const DEFAULT_MAX_SCORE: f64 = 10.0;
/// EMA weight for performance smoothing (higher = more reactive)
pub const DEFAULT_PERFORMANCE_ALPHA: f64 = 0.3;
/// EMA weight for score blending (lower = slower-moving score)
pub const DEFAULT_SCORE_BETA: f64 = 0.15;
/// Neutral prior for smoothed performance
pub const NEUTRAL_PERFORMANCE: f64 = 0.5;

/// Immutable controller configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoneConfig {
    pub min_score: f64,
    pub max_score: f64,
    pub performance_alpha: f64,
    pub score_beta: f64,
}

impl Default for ZoneConfig {
    fn default() -> Self {
        Self {
            min_score: DEFAULT_MIN_SCORE,
            max_score: DEFAULT_MAX_SCORE,
            performance_alpha: DEFAULT_PERFORMANCE_ALPHA,
            score_beta: DEFAULT_SCORE_BETA,
        }
    }
}

impl ZoneConfig {
    /// Check bounds ordering and that both EMA weights lie in `(0, 1]`
    pub fn validate(&self) -> Result<(), ZoneError> {
        if !self.min_score.is_finite() || !self.max_score.is_finite() {
            return Err(ZoneError::Configuration(
                "score bounds must be finite".to_string(),
            ));
        }
        if self.min_score >= self.max_score {
            return Err(ZoneError::Configuration(format!(
                "min_score ({}) must be below max_score ({})",
                self.min_score, self.max_score
            )));
        }
        for (name, weight) in [
            ("performance_alpha", self.performance_alpha),
            ("score_beta", self.score_beta),
        ] {
            if !(weight > 0.0 && weight <= 1.0) {
                return Err(ZoneError::Configuration(format!(
                    "{name} must be within (0.0, 1.0], got {weight}"
                )));
            }
        }
        Ok(())
    }

    /// Whether a score lies inside `[min_score, max_score]`
    pub fn contains(&self, score: f64) -> bool {
        score.is_finite() && score >= self.min_score && score <= self.max_score
    }

    /// Load a configuration from JSON and validate it
    pub fn from_json(json: &str) -> Result<Self, ZoneError> {
        let config: ZoneConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }
}

/// Per-student adaptation state.
///
/// Created once per student, then mutated exactly once per evaluated answer.
/// Callers must serialize updates for the same student; separate students'
/// states are fully independent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControllerState {
    /// Current mastery-zone score, rounded to one decimal place
    pub(crate) current_score: f64,
    /// EMA of raw performance (0-1)
    pub(crate) smoothed_performance: f64,
    /// First difference of smoothed performance across the last update
    pub(crate) performance_trend: f64,
    /// Updates in a row whose raw performance reached the success tier
    pub(crate) consecutive_successes: u32,
    /// Configuration fixed at construction
    pub(crate) config: ZoneConfig,
}

impl ControllerState {
    /// Create a state seeded from `initial_score`
    pub fn new(initial_score: f64, config: ZoneConfig) -> Result<Self, ZoneError> {
        config.validate()?;
        if !config.contains(initial_score) {
            return Err(ZoneError::Configuration(format!(
                "initial score must be between {} and {}, got {}",
                config.min_score, config.max_score, initial_score
            )));
        }

        Ok(Self {
            current_score: round_to_tenth(initial_score).clamp(config.min_score, config.max_score),
            smoothed_performance: NEUTRAL_PERFORMANCE,
            performance_trend: 0.0,
            consecutive_successes: 0,
            config,
        })
    }

    pub fn current_score(&self) -> f64 {
        self.current_score
    }

    pub fn smoothed_performance(&self) -> f64 {
        self.smoothed_performance
    }

    pub fn performance_trend(&self) -> f64 {
        self.performance_trend
    }

    pub fn consecutive_successes(&self) -> u32 {
        self.consecutive_successes
    }

    pub fn config(&self) -> &ZoneConfig {
        &self.config
    }

    /// Re-check the state invariants, used after deserializing a stored state
    pub fn validate(&self) -> Result<(), ZoneError> {
        self.config.validate()?;
        if !self.config.contains(self.current_score) {
            return Err(ZoneError::ParseError(format!(
                "stored score {} outside [{}, {}]",
                self.current_score, self.config.min_score, self.config.max_score
            )));
        }
        if !(0.0..=1.0).contains(&self.smoothed_performance) {
            return Err(ZoneError::ParseError(format!(
                "stored smoothed performance {} outside [0.0, 1.0]",
                self.smoothed_performance
            )));
        }
        if !self.performance_trend.is_finite() {
            return Err(ZoneError::ParseError(
                "stored performance trend is not finite".to_string(),
            ));
        }
        Ok(())
    }
}

/// Adjustment tier selected from a raw performance value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PerformanceTier {
    Success,
    Partial,
    Weak,
}

impl PerformanceTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            PerformanceTier::Success => "success",
            PerformanceTier::Partial => "partial",
            PerformanceTier::Weak => "weak",
        }
    }
}

/// Diagnostic snapshot of one update. Purely informational.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticEvent {
    pub old_score: f64,
    pub raw_performance: f64,
    pub smoothed_performance: f64,
    pub trend: f64,
    pub tier: PerformanceTier,
    /// Unscaled policy output
    pub adjustment: f64,
    /// Adjustment after square-root damping
    pub scaled_adjustment: f64,
    pub consecutive_successes: u32,
    pub new_score: f64,
}

impl fmt::Display for DiagnosticEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Old score: {:.1} -> New score: {:.1}, Performance: {:.2} (smoothed: {:.2}), Trend: {:+.3}, Adjustment: {:+.3}",
            self.old_score,
            self.new_score,
            self.raw_performance,
            self.smoothed_performance,
            self.trend,
            self.scaled_adjustment
        )
    }
}
