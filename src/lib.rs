// src/lib.rs
//! GNSS Monitor Library
//!
//! Reduces a stream of decoded NMEA sentences into a live GNSS fix state
//! and drives a position scatterplot with running statistics.

pub mod config;
pub mod display;
pub mod error;
pub mod gps;
pub mod monitor;
pub mod scatter;
pub mod track;

// Re-export main types for convenience
pub use config::MonitorConfig;
pub use error::{GnssError, Result};
pub use gps::{GnssStatus, SentenceReducer};
pub use monitor::{FeedSource, GnssMonitor};
pub use scatter::ScatterEngine;
