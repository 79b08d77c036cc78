// src/gps/sentence.rs
//! Decoded NMEA sentence model
//!
//! The actual NMEA wire decoding is done upstream; the feed delivers
//! already-decoded sentence objects as JSON, one per line. Field presence
//! varies by sentence type, so every field is optional (absent != zero).

use serde::{Deserialize, Serialize};

use chrono::NaiveTime;

/// GNSS constellation, derived from the NMEA talker prefix.
///
/// GPS, SBAS and QZSS satellites all arrive under the generic GP/GN
/// talkers, so they share a single variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Constellation {
    Gps,
    Galileo,
    Beidou,
    Glonass,
}

impl Constellation {
    /// Map a talker id to a constellation. Unrecognized or missing
    /// talkers default to GPS.
    pub fn from_talker(talker: &str) -> Self {
        match talker {
            "GA" => Constellation::Galileo,
            "GB" => Constellation::Beidou,
            "GL" => Constellation::Glonass,
            _ => Constellation::Gps,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Constellation::Gps => "GPS",
            Constellation::Galileo => "GAL",
            Constellation::Beidou => "BDS",
            Constellation::Glonass => "GLO",
        }
    }
}

/// Resolved fix quality grade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FixQuality {
    #[default]
    NoFix,
    Fix2d,
    Fix3d,
    Dgps,
    RtkFloat,
    RtkFixed,
    DeadReckoning,
}

impl FixQuality {
    /// Lookup for the GGA quality code field.
    pub fn from_gga_quality(code: u8) -> Self {
        match code {
            1 => FixQuality::Fix3d,
            2 => FixQuality::Dgps,
            4 => FixQuality::RtkFixed,
            5 => FixQuality::RtkFloat,
            6 => FixQuality::DeadReckoning,
            _ => FixQuality::NoFix,
        }
    }

    /// Lookup for the GSA navMode field, which uses a different code space.
    pub fn from_gsa_nav_mode(code: u8) -> Self {
        match code {
            2 => FixQuality::Fix2d,
            3 => FixQuality::Fix3d,
            _ => FixQuality::NoFix,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            FixQuality::NoFix => "NO FIX",
            FixQuality::Fix2d => "2D",
            FixQuality::Fix3d => "3D",
            FixQuality::Dgps => "DGPS",
            FixQuality::RtkFloat => "RTK FLOAT",
            FixQuality::RtkFixed => "RTK FIXED",
            FixQuality::DeadReckoning => "DR",
        }
    }
}

impl std::fmt::Display for FixQuality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// One satellite slot from a GSV sentence (up to 4 per sentence).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GsvSatellite {
    pub svid: u16,
    pub elevation: Option<f32>,
    pub azimuth: Option<f32>,
    pub cno: Option<u16>,
}

/// A decoded NMEA sentence, tagged by type.
///
/// One variant per sentence category the reducer handles; adding support
/// for a new sentence type means adding a variant and a handler arm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Sentence {
    /// RMC - Recommended minimum data: position, time, speed, course
    #[serde(rename = "RMC")]
    Rmc {
        time: Option<NaiveTime>,
        lat: Option<f64>,
        lon: Option<f64>,
        /// Speed over ground in knots
        speed_knots: Option<f64>,
        /// Course over ground in degrees
        course: Option<f64>,
    },
    /// GGA - Fix data: position, altitude, quality, differential status
    #[serde(rename = "GGA")]
    Gga {
        time: Option<NaiveTime>,
        lat: Option<f64>,
        lon: Option<f64>,
        alt: Option<f64>,
        /// Geoid separation in meters
        sep: Option<f64>,
        num_sv: Option<u16>,
        quality: Option<u8>,
        diff_age: Option<f64>,
        diff_station: Option<u16>,
    },
    /// GLL - Latitude/longitude only
    #[serde(rename = "GLL")]
    Gll {
        time: Option<NaiveTime>,
        lat: Option<f64>,
        lon: Option<f64>,
    },
    /// GSA - DOP and active satellites
    #[serde(rename = "GSA")]
    Gsa {
        pdop: Option<f64>,
        hdop: Option<f64>,
        vdop: Option<f64>,
        nav_mode: Option<u8>,
    },
    /// GSV - Satellites in view; a constellation's full set spans 1-4
    /// sequential sentences of up to 4 slots each
    #[serde(rename = "GSV")]
    Gsv {
        talker: String,
        satellites: Vec<GsvSatellite>,
    },
    /// VTG - Vector track and speed over ground
    #[serde(rename = "VTG")]
    Vtg {
        /// Course over ground in degrees
        course: Option<f64>,
        /// Speed over ground in km/h
        speed_kmh: Option<f64>,
    },
    /// PUBX,00 accuracy extension: explicit accuracy estimates in meters
    #[serde(rename = "UBX00")]
    Ubx00 {
        h_acc: Option<f64>,
        v_acc: Option<f64>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constellation_from_talker() {
        assert_eq!(Constellation::from_talker("GA"), Constellation::Galileo);
        assert_eq!(Constellation::from_talker("GB"), Constellation::Beidou);
        assert_eq!(Constellation::from_talker("GL"), Constellation::Glonass);
        assert_eq!(Constellation::from_talker("GP"), Constellation::Gps);
        assert_eq!(Constellation::from_talker("GN"), Constellation::Gps);
        assert_eq!(Constellation::from_talker(""), Constellation::Gps);
    }

    #[test]
    fn test_fix_quality_lookup() {
        assert_eq!(FixQuality::from_gga_quality(0), FixQuality::NoFix);
        assert_eq!(FixQuality::from_gga_quality(1), FixQuality::Fix3d);
        assert_eq!(FixQuality::from_gga_quality(2), FixQuality::Dgps);
        assert_eq!(FixQuality::from_gga_quality(4), FixQuality::RtkFixed);
        assert_eq!(FixQuality::from_gga_quality(5), FixQuality::RtkFloat);
        assert_eq!(FixQuality::from_gga_quality(99), FixQuality::NoFix);

        // GSA uses a different code space
        assert_eq!(FixQuality::from_gsa_nav_mode(1), FixQuality::NoFix);
        assert_eq!(FixQuality::from_gsa_nav_mode(2), FixQuality::Fix2d);
        assert_eq!(FixQuality::from_gsa_nav_mode(3), FixQuality::Fix3d);
    }

    #[test]
    fn test_sentence_json_decoding() {
        let json = r#"{"type":"RMC","time":"12:35:19","lat":51.5,"lon":-0.1,"speed_knots":10.0,"course":84.4}"#;
        let sentence: Sentence = serde_json::from_str(json).unwrap();
        match sentence {
            Sentence::Rmc { lat, lon, speed_knots, .. } => {
                assert_eq!(lat, Some(51.5));
                assert_eq!(lon, Some(-0.1));
                assert_eq!(speed_knots, Some(10.0));
            }
            other => panic!("wrong variant: {:?}", other),
        }
    }

    #[test]
    fn test_sentence_json_missing_fields() {
        // Absent fields decode as None, not zero
        let json = r#"{"type":"GGA","lat":48.117,"lon":11.517}"#;
        let sentence: Sentence = serde_json::from_str(json).unwrap();
        match sentence {
            Sentence::Gga { lat, alt, quality, .. } => {
                assert_eq!(lat, Some(48.117));
                assert!(alt.is_none());
                assert!(quality.is_none());
            }
            other => panic!("wrong variant: {:?}", other),
        }
    }
}
