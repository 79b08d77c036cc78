// src/gps/reducer.rs
//! Sentence reducer
//!
//! Folds decoded NMEA sentences into the accumulated GNSS status, one
//! sentence at a time. Each sentence type owns its fields: a field not
//! reported by the current sentence keeps its previous value. Malformed
//! field values fail closed with a status message and never corrupt fields
//! set by earlier sentences.

use std::time::{Duration, Instant};

use chrono::{DateTime, NaiveTime, Utc};

use super::satellites::{SatelliteLog, SatelliteRecord, SAT_EXPIRY};
use super::sentence::{Constellation, FixQuality, GsvSatellite, Sentence};
use super::status::{GnssStatus, StatusUpdate};
use crate::display::{BannerUpdate, DisplaySink};
use crate::error::{GnssError, Result};
use crate::track::TrackPoint;

/// Convert a speed over ground from knots to m/s.
pub fn knots_to_ms(knots: f64) -> f64 {
    knots * 1852.0 / 3600.0
}

/// Convert a speed over ground from km/h to m/s.
pub fn kmh_to_ms(kmh: f64) -> f64 {
    kmh / 3.6
}

fn check_lat(lat: f64) -> Result<f64> {
    if lat.is_finite() && (-90.0..=90.0).contains(&lat) {
        Ok(lat)
    } else {
        Err(GnssError::Value(format!("latitude out of range: {}", lat)))
    }
}

fn check_lon(lon: f64) -> Result<f64> {
    if lon.is_finite() && (-180.0..=180.0).contains(&lon) {
        Ok(lon)
    } else {
        Err(GnssError::Value(format!("longitude out of range: {}", lon)))
    }
}

fn check_speed(speed: f64) -> Result<f64> {
    if speed.is_finite() && speed >= 0.0 {
        Ok(speed)
    } else {
        Err(GnssError::Value(format!("speed out of range: {}", speed)))
    }
}

/// Combine an NMEA time-of-day with today's date.
fn time_to_datetime(time: Option<NaiveTime>) -> DateTime<Utc> {
    match time {
        Some(t) => Utc::now().date_naive().and_time(t).and_utc(),
        None => Utc::now(),
    }
}

/// Accumulates the current GNSS fix from the sentence stream and notifies
/// the display consumers.
pub struct SentenceReducer {
    state: GnssStatus,
    sat_log: SatelliteLog,
    sat_expiry: Duration,
    show_zero: bool,
    record_track: bool,
}

impl SentenceReducer {
    pub fn new() -> Self {
        Self {
            state: GnssStatus::new(),
            sat_log: SatelliteLog::new(),
            sat_expiry: SAT_EXPIRY,
            show_zero: false,
            record_track: false,
        }
    }

    pub fn with_options(sat_expiry: Duration, show_zero: bool, record_track: bool) -> Self {
        Self {
            sat_expiry,
            show_zero,
            record_track,
            ..Self::new()
        }
    }

    pub fn status(&self) -> &GnssStatus {
        &self.state
    }

    pub fn satellite_log(&self) -> &SatelliteLog {
        &self.sat_log
    }

    pub fn set_show_zero(&mut self, show_zero: bool) {
        self.show_zero = show_zero;
    }

    pub fn set_record_track(&mut self, record_track: bool) {
        self.record_track = record_track;
    }

    /// Process one decoded sentence, updating the accumulated state and
    /// notifying consumers. A sentence with no backing raw bytes is ignored.
    pub fn process(&mut self, raw: Option<&[u8]>, sentence: &Sentence, sink: &mut dyn DisplaySink) {
        self.process_at(Instant::now(), raw, sentence, sink);
    }

    /// [`process`](Self::process) with an explicit clock, for satellite
    /// expiry tests.
    pub fn process_at(
        &mut self,
        now: Instant,
        raw: Option<&[u8]>,
        sentence: &Sentence,
        sink: &mut dyn DisplaySink,
    ) {
        if raw.is_none() {
            return;
        }

        let result = match sentence {
            Sentence::Rmc {
                time,
                lat,
                lon,
                speed_knots,
                course,
            } => self.process_rmc(sink, *time, *lat, *lon, *speed_knots, *course),
            Sentence::Gga {
                time,
                lat,
                lon,
                alt,
                sep,
                num_sv,
                quality,
                diff_age,
                diff_station,
            } => self.process_gga(
                sink,
                *time,
                *lat,
                *lon,
                *alt,
                *sep,
                *num_sv,
                *quality,
                *diff_age,
                *diff_station,
            ),
            Sentence::Gll { time, lat, lon } => self.process_gll(sink, *time, *lat, *lon),
            Sentence::Gsa {
                pdop,
                hdop,
                vdop,
                nav_mode,
            } => self.process_gsa(sink, *pdop, *hdop, *vdop, *nav_mode),
            Sentence::Gsv { talker, satellites } => {
                self.process_gsv(sink, now, talker, satellites)
            }
            Sentence::Vtg { course, speed_kmh } => self.process_vtg(sink, *course, *speed_kmh),
            Sentence::Ubx00 { h_acc, v_acc } => self.process_ubx00(sink, *h_acc, *v_acc),
        };

        if let Err(err) = result {
            sink.set_status(&format!("NMEA value error: {}", err));
        }

        // Republish the accumulated fields to the shared status record
        sink.merge_status(&self.full_update());
    }

    fn process_rmc(
        &mut self,
        sink: &mut dyn DisplaySink,
        time: Option<NaiveTime>,
        lat: Option<f64>,
        lon: Option<f64>,
        speed_knots: Option<f64>,
        course: Option<f64>,
    ) -> Result<()> {
        if let Some(t) = time {
            self.state.utc = Some(t);
        }
        if let Some(lat) = lat {
            self.state.lat = check_lat(lat)?;
        }
        if let Some(lon) = lon {
            self.state.lon = check_lon(lon)?;
        }
        if let Some(speed) = speed_knots {
            self.state.speed = knots_to_ms(check_speed(speed)?);
        }
        if let Some(course) = course {
            self.state.track = course;
        }

        sink.update_banner(&BannerUpdate {
            time: self.state.utc,
            lat: Some(self.state.lat),
            lon: Some(self.state.lon),
            speed: Some(self.state.speed),
            track: Some(self.state.track),
            ..Default::default()
        });
        sink.update_map(self.state.lat, self.state.lon, self.state.hacc);

        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn process_gga(
        &mut self,
        sink: &mut dyn DisplaySink,
        time: Option<NaiveTime>,
        lat: Option<f64>,
        lon: Option<f64>,
        alt: Option<f64>,
        sep: Option<f64>,
        num_sv: Option<u16>,
        quality: Option<u8>,
        diff_age: Option<f64>,
        diff_station: Option<u16>,
    ) -> Result<()> {
        if let Some(t) = time {
            self.state.utc = Some(t);
        }
        if let Some(sip) = num_sv {
            self.state.sip = sip;
        }
        if let Some(lat) = lat {
            self.state.lat = check_lat(lat)?;
        }
        if let Some(lon) = lon {
            self.state.lon = check_lon(lon)?;
        }
        if let Some(alt) = alt {
            self.state.alt = alt;
        }
        if let Some(sep) = sep {
            self.state.sep = sep;
        }
        if let Some(quality) = quality {
            self.state.fix = FixQuality::from_gga_quality(quality);
        }
        if let Some(age) = diff_age {
            self.state.diff_age = age;
        }
        if let Some(station) = diff_station {
            self.state.diff_station = station;
        }

        sink.update_banner(&BannerUpdate {
            time: self.state.utc,
            lat: Some(self.state.lat),
            lon: Some(self.state.lon),
            alt: Some(self.state.alt),
            sip: Some(self.state.sip),
            fix: Some(self.state.fix),
            ..Default::default()
        });
        sink.update_map(self.state.lat, self.state.lon, self.state.hacc);

        if self.record_track && lat.is_some() && lon.is_some() {
            sink.add_trackpoint(TrackPoint {
                latitude: self.state.lat,
                longitude: self.state.lon,
                elevation: self.state.alt,
                timestamp: time_to_datetime(time),
                satellites: self.state.sip,
            });
        }

        Ok(())
    }

    fn process_gll(
        &mut self,
        sink: &mut dyn DisplaySink,
        time: Option<NaiveTime>,
        lat: Option<f64>,
        lon: Option<f64>,
    ) -> Result<()> {
        if let Some(t) = time {
            self.state.utc = Some(t);
        }
        if let Some(lat) = lat {
            self.state.lat = check_lat(lat)?;
        }
        if let Some(lon) = lon {
            self.state.lon = check_lon(lon)?;
        }

        sink.update_banner(&BannerUpdate {
            time: self.state.utc,
            lat: Some(self.state.lat),
            lon: Some(self.state.lon),
            ..Default::default()
        });
        sink.update_map(self.state.lat, self.state.lon, self.state.hacc);

        Ok(())
    }

    fn process_gsa(
        &mut self,
        sink: &mut dyn DisplaySink,
        pdop: Option<f64>,
        hdop: Option<f64>,
        vdop: Option<f64>,
        nav_mode: Option<u8>,
    ) -> Result<()> {
        if let Some(pdop) = pdop {
            self.state.pdop = pdop;
        }
        if let Some(hdop) = hdop {
            self.state.hdop = hdop;
        }
        if let Some(vdop) = vdop {
            self.state.vdop = vdop;
        }
        if let Some(mode) = nav_mode {
            self.state.fix = FixQuality::from_gsa_nav_mode(mode);
        }

        sink.update_map(self.state.lat, self.state.lon, self.state.hacc);
        sink.update_banner(&BannerUpdate {
            dop: Some(self.state.pdop),
            hdop: Some(self.state.hdop),
            vdop: Some(self.state.vdop),
            fix: Some(self.state.fix),
            ..Default::default()
        });

        Ok(())
    }

    fn process_gsv(
        &mut self,
        sink: &mut dyn DisplaySink,
        now: Instant,
        talker: &str,
        satellites: &[GsvSatellite],
    ) -> Result<()> {
        let constellation = Constellation::from_talker(talker);

        for slot in satellites.iter().take(4) {
            self.sat_log.upsert(SatelliteRecord {
                constellation,
                svid: slot.svid,
                elevation: slot.elevation,
                azimuth: slot.azimuth,
                cno: slot.cno,
                last_seen: now,
            });
        }

        let visible = self.sat_log.visible(now, self.sat_expiry, self.show_zero);
        self.state.siv = visible.len();

        sink.update_sats(&visible);
        sink.update_banner(&BannerUpdate {
            siv: Some(self.state.siv),
            ..Default::default()
        });
        sink.update_graph(&visible, self.state.siv);

        Ok(())
    }

    fn process_vtg(
        &mut self,
        sink: &mut dyn DisplaySink,
        course: Option<f64>,
        speed_kmh: Option<f64>,
    ) -> Result<()> {
        if let Some(course) = course {
            self.state.track = course;
        }
        if let Some(speed) = speed_kmh {
            self.state.speed = kmh_to_ms(check_speed(speed)?);
        }

        sink.update_banner(&BannerUpdate {
            speed: Some(self.state.speed),
            track: Some(self.state.track),
            ..Default::default()
        });

        Ok(())
    }

    fn process_ubx00(
        &mut self,
        sink: &mut dyn DisplaySink,
        h_acc: Option<f64>,
        v_acc: Option<f64>,
    ) -> Result<()> {
        if let Some(hacc) = h_acc {
            self.state.hacc = hacc;
        }
        if let Some(vacc) = v_acc {
            self.state.vacc = vacc;
        }

        sink.update_banner(&BannerUpdate {
            hacc: Some(self.state.hacc),
            vacc: Some(self.state.vacc),
            ..Default::default()
        });

        Ok(())
    }

    fn full_update(&self) -> StatusUpdate {
        StatusUpdate {
            utc: self.state.utc,
            lat: Some(self.state.lat),
            lon: Some(self.state.lon),
            alt: Some(self.state.alt),
            speed: Some(self.state.speed),
            track: Some(self.state.track),
            fix: Some(self.state.fix),
            siv: Some(self.state.siv),
            sip: Some(self.state.sip),
            pdop: Some(self.state.pdop),
            hdop: Some(self.state.hdop),
            vdop: Some(self.state.vdop),
            hacc: Some(self.state.hacc),
            vacc: Some(self.state.vacc),
            sep: Some(self.state.sep),
            diff_age: Some(self.state.diff_age),
            diff_station: Some(self.state.diff_station),
        }
    }
}

impl Default for SentenceReducer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gps::satellites::SatelliteView;

    #[derive(Default)]
    struct RecordingSink {
        banners: Vec<BannerUpdate>,
        maps: Vec<(f64, f64, f64)>,
        sats: Vec<Vec<SatelliteView>>,
        graph_counts: Vec<usize>,
        trackpoints: Vec<TrackPoint>,
        messages: Vec<String>,
        status: GnssStatus,
    }

    impl DisplaySink for RecordingSink {
        fn update_banner(&mut self, update: &BannerUpdate) {
            self.banners.push(update.clone());
        }

        fn update_map(&mut self, lat: f64, lon: f64, hacc: f64) {
            self.maps.push((lat, lon, hacc));
        }

        fn update_sats(&mut self, satellites: &[SatelliteView]) {
            self.sats.push(satellites.to_vec());
        }

        fn update_graph(&mut self, _satellites: &[SatelliteView], siv: usize) {
            self.graph_counts.push(siv);
        }

        fn add_trackpoint(&mut self, point: TrackPoint) {
            self.trackpoints.push(point);
        }

        fn set_status(&mut self, message: &str) {
            self.messages.push(message.to_string());
        }

        fn merge_status(&mut self, update: &StatusUpdate) {
            self.status.merge(update);
        }
    }

    fn rmc(lat: f64, lon: f64, speed_knots: f64) -> Sentence {
        Sentence::Rmc {
            time: None,
            lat: Some(lat),
            lon: Some(lon),
            speed_knots: Some(speed_knots),
            course: Some(84.4),
        }
    }

    fn gsv(talker: &str, svids: &[u16]) -> Sentence {
        Sentence::Gsv {
            talker: talker.to_string(),
            satellites: svids
                .iter()
                .map(|&svid| GsvSatellite {
                    svid,
                    elevation: Some(40.0),
                    azimuth: Some(83.0),
                    cno: Some(42),
                })
                .collect(),
        }
    }

    #[test]
    fn test_rmc_knots_conversion() {
        let mut reducer = SentenceReducer::new();
        let mut sink = RecordingSink::default();

        reducer.process(Some(b"$GPRMC"), &rmc(51.5, -0.1, 10.0), &mut sink);

        assert_eq!(reducer.status().lat, 51.5);
        assert_eq!(reducer.status().lon, -0.1);
        assert!((reducer.status().speed - 5.144).abs() < 1e-3);
        assert_eq!(reducer.status().track, 84.4);
    }

    #[test]
    fn test_missing_raw_is_a_noop() {
        let mut reducer = SentenceReducer::new();
        let mut sink = RecordingSink::default();

        reducer.process(None, &rmc(51.5, -0.1, 10.0), &mut sink);

        assert_eq!(reducer.status().lat, 0.0);
        assert!(sink.banners.is_empty());
        assert_eq!(sink.status, GnssStatus::new());
    }

    #[test]
    fn test_fields_persist_across_sentence_types() {
        let mut reducer = SentenceReducer::new();
        let mut sink = RecordingSink::default();

        reducer.process(
            Some(b"$GPGGA"),
            &Sentence::Gga {
                time: None,
                lat: Some(48.117),
                lon: Some(11.517),
                alt: Some(545.4),
                sep: Some(46.9),
                num_sv: Some(8),
                quality: Some(1),
                diff_age: None,
                diff_station: None,
            },
            &mut sink,
        );
        reducer.process(
            Some(b"$GPGSA"),
            &Sentence::Gsa {
                pdop: Some(1.7),
                hdop: Some(0.9),
                vdop: Some(1.4),
                nav_mode: Some(3),
            },
            &mut sink,
        );

        // GSA owns the DOP fields; everything GGA set is retained
        let status = reducer.status();
        assert_eq!(status.pdop, 1.7);
        assert_eq!(status.lat, 48.117);
        assert_eq!(status.alt, 545.4);
        assert_eq!(status.sip, 8);
        assert_eq!(status.fix, FixQuality::Fix3d);

        // The shared record saw the same merge
        assert_eq!(sink.status.alt, 545.4);
        assert_eq!(sink.status.hdop, 0.9);
    }

    #[test]
    fn test_vtg_kmh_conversion() {
        let mut reducer = SentenceReducer::new();
        let mut sink = RecordingSink::default();

        reducer.process(
            Some(b"$GPVTG"),
            &Sentence::Vtg {
                course: Some(180.0),
                speed_kmh: Some(36.0),
            },
            &mut sink,
        );

        assert!((reducer.status().speed - 10.0).abs() < 1e-9);
        assert_eq!(reducer.status().track, 180.0);
    }

    #[test]
    fn test_ubx00_accuracy_estimates() {
        let mut reducer = SentenceReducer::new();
        let mut sink = RecordingSink::default();

        reducer.process(
            Some(b"$PUBX"),
            &Sentence::Ubx00 {
                h_acc: Some(2.4),
                v_acc: Some(3.9),
            },
            &mut sink,
        );

        assert_eq!(reducer.status().hacc, 2.4);
        assert_eq!(reducer.status().vacc, 3.9);
    }

    #[test]
    fn test_invalid_value_fails_closed() {
        let mut reducer = SentenceReducer::new();
        let mut sink = RecordingSink::default();

        reducer.process(Some(b"$GPRMC"), &rmc(51.5, -0.1, 10.0), &mut sink);
        // Out-of-range latitude: reported once, prior values intact
        reducer.process(Some(b"$GPRMC"), &rmc(123.0, -0.2, 12.0), &mut sink);

        assert_eq!(sink.messages.len(), 1);
        assert!(sink.messages[0].contains("latitude"));
        assert_eq!(reducer.status().lat, 51.5);
        assert!((reducer.status().speed - 5.144).abs() < 1e-3);
        assert_eq!(sink.status.lat, 51.5);
    }

    #[test]
    fn test_gga_emits_trackpoint_when_recording() {
        let mut reducer = SentenceReducer::new();
        reducer.set_record_track(true);
        let mut sink = RecordingSink::default();

        let gga = Sentence::Gga {
            time: None,
            lat: Some(48.117),
            lon: Some(11.517),
            alt: Some(545.4),
            sep: None,
            num_sv: Some(8),
            quality: Some(1),
            diff_age: None,
            diff_station: None,
        };
        reducer.process(Some(b"$GPGGA"), &gga, &mut sink);

        assert_eq!(sink.trackpoints.len(), 1);
        let tp = &sink.trackpoints[0];
        assert_eq!(tp.latitude, 48.117);
        assert_eq!(tp.elevation, 545.4);
        assert_eq!(tp.satellites, 8);

        // No position, no trackpoint
        reducer.process(
            Some(b"$GPGGA"),
            &Sentence::Gga {
                time: None,
                lat: None,
                lon: None,
                alt: None,
                sep: None,
                num_sv: None,
                quality: None,
                diff_age: None,
                diff_station: None,
            },
            &mut sink,
        );
        assert_eq!(sink.trackpoints.len(), 1);
    }

    #[test]
    fn test_gsv_publishes_visible_list() {
        let mut reducer = SentenceReducer::new();
        let mut sink = RecordingSink::default();
        let now = Instant::now();

        reducer.process_at(now, Some(b"$GPGSV"), &gsv("GP", &[1, 2, 3, 4]), &mut sink);
        reducer.process_at(now, Some(b"$GLGSV"), &gsv("GL", &[65, 66]), &mut sink);

        assert_eq!(reducer.status().siv, 6);
        assert_eq!(sink.graph_counts, vec![4, 6]);
        let last = sink.sats.last().unwrap();
        assert_eq!(last.len(), 6);
        assert!(last
            .iter()
            .any(|s| s.constellation == Constellation::Glonass && s.svid == 65));
        assert_eq!(sink.status.siv, 6);
    }

    #[test]
    fn test_gsv_expired_satellites_drop_from_visible() {
        let mut reducer = SentenceReducer::new();
        let mut sink = RecordingSink::default();
        let now = Instant::now();

        // 4 batches of 4 distinct satellites
        for batch in 0..4u16 {
            let base = batch * 4 + 1;
            reducer.process_at(
                now,
                Some(b"$GPGSV"),
                &gsv("GP", &[base, base + 1, base + 2, base + 3]),
                &mut sink,
            );
        }
        assert_eq!(reducer.status().siv, 16);
        assert_eq!(reducer.satellite_log().len(), 16);

        // A later sentence past the expiry window: log intact, none visible
        let later = now + SAT_EXPIRY + Duration::from_secs(1);
        reducer.process_at(later, Some(b"$GAGSV"), &gsv("GA", &[]), &mut sink);
        assert_eq!(reducer.status().siv, 0);
        assert_eq!(reducer.satellite_log().len(), 16);
    }
}
