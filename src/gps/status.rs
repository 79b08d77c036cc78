// src/gps/status.rs
//! Shared GNSS status record
//!
//! One record holds the latest readings accumulated across all sentence
//! types. It is created once with sentinel values, mutated in place by the
//! reducer for the lifetime of the application, and read by the display
//! layer as cloned snapshots.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use super::sentence::FixQuality;

/// Canonical GNSS status schema. A field keeps its most recent value until
/// a sentence that reports it arrives; no sentence type resets another
/// type's fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GnssStatus {
    /// UTC time of fix
    pub utc: Option<NaiveTime>,
    pub lat: f64,
    pub lon: f64,
    /// Altitude in meters
    pub alt: f64,
    /// Ground speed in m/s
    pub speed: f64,
    /// Track/course in degrees
    pub track: f64,
    pub fix: FixQuality,
    /// Satellites in view
    pub siv: usize,
    /// Satellites in use
    pub sip: u16,
    pub pdop: f64,
    pub hdop: f64,
    pub vdop: f64,
    /// Horizontal accuracy estimate in meters
    pub hacc: f64,
    /// Vertical accuracy estimate in meters
    pub vacc: f64,
    /// Geoid separation in meters
    pub sep: f64,
    /// Age of differential corrections in seconds
    pub diff_age: f64,
    pub diff_station: u16,
}

impl Default for GnssStatus {
    fn default() -> Self {
        Self {
            utc: None,
            lat: 0.0,
            lon: 0.0,
            alt: 0.0,
            speed: 0.0,
            track: 0.0,
            fix: FixQuality::NoFix,
            siv: 0,
            sip: 0,
            pdop: 0.0,
            hdop: 0.0,
            vdop: 0.0,
            hacc: 0.0,
            vacc: 0.0,
            sep: 0.0,
            diff_age: 0.0,
            diff_station: 0,
        }
    }
}

impl GnssStatus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a partial update into the record. Only fields present in the
    /// update are copied; the schema is closed, so there is no such thing
    /// as an unknown key.
    pub fn merge(&mut self, update: &StatusUpdate) {
        macro_rules! take {
            ($($field:ident),*) => {
                $(if let Some(v) = update.$field {
                    self.$field = v;
                })*
            };
        }
        take!(
            lat, lon, alt, speed, track, fix, siv, sip, pdop, hdop, vdop, hacc, vacc, sep,
            diff_age, diff_station
        );
        if let Some(t) = update.utc {
            self.utc = Some(t);
        }
    }
}

/// Partial counterpart of [`GnssStatus`] used for key-by-key merges.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatusUpdate {
    pub utc: Option<NaiveTime>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub alt: Option<f64>,
    pub speed: Option<f64>,
    pub track: Option<f64>,
    pub fix: Option<FixQuality>,
    pub siv: Option<usize>,
    pub sip: Option<u16>,
    pub pdop: Option<f64>,
    pub hdop: Option<f64>,
    pub vdop: Option<f64>,
    pub hacc: Option<f64>,
    pub vacc: Option<f64>,
    pub sep: Option<f64>,
    pub diff_age: Option<f64>,
    pub diff_station: Option<u16>,
}
