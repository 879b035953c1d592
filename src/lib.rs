//! Mind City Flux - EEG feedback engine for the Mind City Navigator
//!
//! Turns cognitive metrics streamed from an EEG headset into a liked/disliked
//! verdict and a 1-10 preference score for the city currently on screen:
//! metrics tracking → summary → classification + scoring → assessment encoding.
//!
//! ## Modules
//!
//! - **Core**: [`classify_feedback`] and [`compute_score`], pure functions over one summary
//! - **Tracking**: rolling per-epoch metrics and band-power derivation
//! - **Pipeline**: wire messages in, versioned assessment JSON out

pub mod classifier;
pub mod config;
pub mod encoder;
pub mod error;
pub mod features;
pub mod normalizer;
pub mod pipeline;
pub mod schema;
pub mod tracker;
pub mod types;
pub mod validate;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use classifier::classify_feedback;
pub use config::{ConfigError, EngineConfig};
pub use error::ComputeError;
pub use normalizer::compute_score;
pub use pipeline::{assess_summary, FeedbackProcessor};

// Schema exports
pub use schema::{EegMessage, SchemaAdapter, SCHEMA_VERSION};

/// Engine version embedded in all assessments
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for assessments
pub const PRODUCER_NAME: &str = "mindcity-flux";
