//! Cast and overlap queries
//!
//! # Module Organization
//!
//! - [`cast`] - Cast requests, modes, flags and results
//! - [`engine`] - Broad phase, narrow phase and terrain combined per mode
//! - [`context`] - Per-caller query handle

pub mod cast;
pub mod context;
pub mod engine;

pub use cast::{CastFlags, CastHit, CastMode, CastQuery, CastResult};
pub use context::QueryContext;
pub use engine::CastEngine;
