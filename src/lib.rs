//! Mastery Zone - adaptive difficulty controller
//!
//! Tracks a learner's mastery-zone score (1.0 - 10.0): hard enough to challenge,
//! easy enough to stay solvable. Each graded answer flows one way through a
//! deterministic pipeline: performance scoring → smoothing → tiered adjustment
//! policy → damped, slow-blended score update.
//!
//! ## Modules
//!
//! - **Core**: `scorer`, `smoother`, `policy`, `updater` - pure arithmetic, no I/O
//! - **Processor**: `pipeline` - public API and a stateful per-student processor
//! - **Records**: `encoder` - JSON records for diagnostic events

pub mod encoder;
pub mod error;
pub mod history;
pub mod pipeline;
pub mod policy;
pub mod scorer;
pub mod smoother;
pub mod types;
pub mod updater;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use encoder::{UpdateEncoder, UpdateRecord};
pub use error::ZoneError;
pub use history::ScoreWindow;
pub use pipeline::{
    compute_performance, create, create_with_config, current_score, update, ZoneProcessor,
};
pub use types::{ControllerState, DiagnosticEvent, PerformanceTier, ZoneConfig};

/// Library version embedded in all update records
pub const ZONE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for update records
pub const PRODUCER_NAME: &str = "mastery-zone";
