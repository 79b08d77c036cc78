// src/display/mod.rs
//! Display contracts and implementations
//!
//! The core never draws widgets itself; it pushes updates through the
//! [`DisplaySink`] trait and draws scatter output through the
//! [`canvas::Canvas`] primitives. Concrete front ends implement whichever
//! methods they care about.

pub mod canvas;
pub mod terminal;

use chrono::NaiveTime;

use crate::gps::satellites::SatelliteView;
use crate::gps::sentence::FixQuality;
use crate::gps::status::StatusUpdate;
use crate::track::TrackPoint;

/// Partial update for the banner/summary display. Only the fields a
/// sentence actually reported are present.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BannerUpdate {
    pub time: Option<NaiveTime>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub alt: Option<f64>,
    pub speed: Option<f64>,
    pub track: Option<f64>,
    pub sip: Option<u16>,
    pub siv: Option<usize>,
    pub fix: Option<FixQuality>,
    pub dop: Option<f64>,
    pub hdop: Option<f64>,
    pub vdop: Option<f64>,
    pub hacc: Option<f64>,
    pub vacc: Option<f64>,
}

/// Downstream consumers notified by the sentence reducer.
///
/// All methods default to no-ops so a sink only implements the channels it
/// displays.
pub trait DisplaySink {
    /// Banner/summary display partial update
    fn update_banner(&mut self, _update: &BannerUpdate) {}

    /// Map display position update
    fn update_map(&mut self, _lat: f64, _lon: f64, _hacc: f64) {}

    /// Sky view satellite list update
    fn update_sats(&mut self, _satellites: &[SatelliteView]) {}

    /// Signal level graph update
    fn update_graph(&mut self, _satellites: &[SatelliteView], _siv: usize) {}

    /// Track recorder point emission
    fn add_trackpoint(&mut self, _point: TrackPoint) {}

    /// User-visible status message (e.g. a malformed field report)
    fn set_status(&mut self, _message: &str) {}

    /// Merge into the shared application status record
    fn merge_status(&mut self, _update: &StatusUpdate) {}
}

/// Sink that discards everything; useful for tests and headless feeds.
pub struct NullSink;

impl DisplaySink for NullSink {}
