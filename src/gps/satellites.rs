// src/gps/satellites.rs
//! Satellites-in-view bookkeeping
//!
//! A constellation's satellite set arrives spread across several sequential
//! GSV sentences, so sightings are accumulated in a persistent log keyed by
//! `(constellation, svid)`. Entries never leave the log; they only drop out
//! of the *visible* projection once their last sighting is older than the
//! expiry window.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use super::sentence::Constellation;

/// Default visibility window for a satellite after its last sighting.
pub const SAT_EXPIRY: Duration = Duration::from_secs(10);

/// One logged satellite sighting.
#[derive(Debug, Clone)]
pub struct SatelliteRecord {
    pub constellation: Constellation,
    pub svid: u16,
    /// Elevation in degrees
    pub elevation: Option<f32>,
    /// Azimuth in degrees
    pub azimuth: Option<f32>,
    /// Carrier-to-noise ratio in dB-Hz
    pub cno: Option<u16>,
    pub last_seen: Instant,
}

/// A visible satellite, as published to the sky view and signal graph.
#[derive(Debug, Clone, PartialEq)]
pub struct SatelliteView {
    pub constellation: Constellation,
    pub svid: u16,
    pub elevation: Option<f32>,
    pub azimuth: Option<f32>,
    pub cno: Option<u16>,
}

/// Cumulative log of every satellite seen since startup.
#[derive(Debug, Default)]
pub struct SatelliteLog {
    entries: HashMap<(Constellation, u16), SatelliteRecord>,
}

impl SatelliteLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or refresh a sighting.
    pub fn upsert(&mut self, record: SatelliteRecord) {
        self.entries
            .insert((record.constellation, record.svid), record);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Project the log onto the currently visible satellite list.
    ///
    /// Satellites with no signal are omitted unless `show_zero` is set, and
    /// sightings older than `expiry` are omitted. The output is sorted by
    /// constellation and svid so downstream displays are stable.
    pub fn visible(&self, now: Instant, expiry: Duration, show_zero: bool) -> Vec<SatelliteView> {
        let mut sats: Vec<SatelliteView> = self
            .entries
            .values()
            .filter(|rec| show_zero || rec.cno.map_or(false, |cno| cno > 0))
            .filter(|rec| now.saturating_duration_since(rec.last_seen) < expiry)
            .map(|rec| SatelliteView {
                constellation: rec.constellation,
                svid: rec.svid,
                elevation: rec.elevation,
                azimuth: rec.azimuth,
                cno: rec.cno,
            })
            .collect();
        sats.sort_by_key(|s| (s.constellation, s.svid));
        sats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(svid: u16, cno: Option<u16>, last_seen: Instant) -> SatelliteRecord {
        SatelliteRecord {
            constellation: Constellation::Gps,
            svid,
            elevation: Some(40.0),
            azimuth: Some(83.0),
            cno,
            last_seen,
        }
    }

    #[test]
    fn test_upsert_refreshes_existing_entry() {
        let now = Instant::now();
        let mut log = SatelliteLog::new();
        log.upsert(record(1, Some(30), now));
        log.upsert(record(1, Some(45), now));
        assert_eq!(log.len(), 1);
        let visible = log.visible(now, SAT_EXPIRY, false);
        assert_eq!(visible[0].cno, Some(45));
    }

    #[test]
    fn test_expired_sightings_leave_visible_but_not_log() {
        let now = Instant::now();
        let mut log = SatelliteLog::new();
        // 4 batches of 4 distinct satellites, all with signal
        for svid in 1..=16 {
            log.upsert(record(svid, Some(40), now));
        }
        assert_eq!(log.visible(now, SAT_EXPIRY, false).len(), 16);

        // Advance past the expiry window with no further sightings
        let later = now + SAT_EXPIRY;
        assert!(log.visible(later, SAT_EXPIRY, false).is_empty());
        assert_eq!(log.len(), 16);
    }

    #[test]
    fn test_expiry_boundary_is_exclusive() {
        let now = Instant::now();
        let mut log = SatelliteLog::new();
        log.upsert(record(7, Some(35), now));
        let just_before = now + SAT_EXPIRY - Duration::from_millis(1);
        assert_eq!(log.visible(just_before, SAT_EXPIRY, false).len(), 1);
        // now - last_seen == expiry counts as expired
        assert!(log.visible(now + SAT_EXPIRY, SAT_EXPIRY, false).is_empty());
    }

    #[test]
    fn test_zero_signal_hidden_unless_requested() {
        let now = Instant::now();
        let mut log = SatelliteLog::new();
        log.upsert(record(1, Some(42), now));
        log.upsert(record(2, Some(0), now));
        log.upsert(record(3, None, now));

        let visible = log.visible(now, SAT_EXPIRY, false);
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].svid, 1);

        let with_zero = log.visible(now, SAT_EXPIRY, true);
        assert_eq!(with_zero.len(), 3);
    }

    #[test]
    fn test_visible_sorted_by_constellation_and_svid() {
        let now = Instant::now();
        let mut log = SatelliteLog::new();
        let mut glonass = record(70, Some(33), now);
        glonass.constellation = Constellation::Glonass;
        log.upsert(glonass);
        log.upsert(record(12, Some(39), now));
        log.upsert(record(2, Some(41), now));

        let visible = log.visible(now, SAT_EXPIRY, false);
        let keys: Vec<(Constellation, u16)> =
            visible.iter().map(|s| (s.constellation, s.svid)).collect();
        assert_eq!(
            keys,
            vec![
                (Constellation::Gps, 2),
                (Constellation::Gps, 12),
                (Constellation::Glonass, 70),
            ]
        );
    }
}
