//! EEG message schema
//!
//! This module defines the JSON messages pushed by the metrics streaming
//! collaborator: periodic `summary` messages carrying aggregated metrics and
//! mental-state labels, and high-rate `real_time` electrode frames.

mod adapter;
mod message;

pub use adapter::*;
pub use message::*;

pub(crate) use message::unix_now;
