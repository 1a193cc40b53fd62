//! Core engine configuration
//!
//! Holds the top-level [`SpatialConfig`](config::SpatialConfig) that wires
//! world bounds, octree tuning, terrain layout and query limits together.

pub mod config;

pub use config::SpatialConfig;
