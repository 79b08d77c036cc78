// src/track.rs
//! Track recording and GPX export

use crate::error::{GnssError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// One recorded track position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackPoint {
    pub latitude: f64,
    pub longitude: f64,
    pub elevation: f64,
    pub timestamp: DateTime<Utc>,
    pub satellites: u16,
}

/// Collects trackpoints emitted by the sentence reducer and exports them
/// as a GPX 1.1 track.
pub struct TrackRecorder {
    recording: bool,
    name: String,
    points: Vec<TrackPoint>,
    started: Option<DateTime<Utc>>,
}

impl TrackRecorder {
    pub fn new() -> Self {
        Self {
            recording: false,
            name: String::new(),
            points: Vec::new(),
            started: None,
        }
    }

    pub fn start_recording(&mut self, name: String) {
        self.name = if name.is_empty() {
            format!("Track {}", Utc::now().format("%Y-%m-%d %H:%M"))
        } else {
            name
        };
        self.points.clear();
        self.recording = true;
        self.started = Some(Utc::now());
    }

    pub fn stop_recording(&mut self) -> Vec<TrackPoint> {
        self.recording = false;
        self.started = None;
        std::mem::take(&mut self.points)
    }

    pub fn add_point(&mut self, point: TrackPoint) {
        if self.recording {
            self.points.push(point);
        }
    }

    pub fn is_recording(&self) -> bool {
        self.recording
    }

    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn to_gpx(&self) -> String {
        let mut gpx = String::from(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx version="1.1" creator="GNSS Monitor" xmlns="http://www.topografix.com/GPX/1/1">
  <trk>
"#,
        );

        gpx.push_str(&format!(
            "    <name>{}</name>\n    <trkseg>\n",
            escape_xml(&self.name)
        ));

        for point in &self.points {
            gpx.push_str(&format!(
                r#"      <trkpt lat="{}" lon="{}">
        <ele>{}</ele>
        <time>{}</time>
        <sat>{}</sat>
      </trkpt>
"#,
                point.latitude,
                point.longitude,
                point.elevation,
                point.timestamp.to_rfc3339(),
                point.satellites
            ));
        }

        gpx.push_str("    </trkseg>\n  </trk>\n</gpx>\n");
        gpx
    }

    pub fn export_to_file(&self, path: &Path) -> Result<()> {
        if self.points.is_empty() {
            return Err(GnssError::Other("No trackpoints to export".to_string()));
        }

        let mut file = File::create(path).map_err(GnssError::Io)?;
        file.write_all(self.to_gpx().as_bytes())
            .map_err(GnssError::Io)?;

        Ok(())
    }
}

impl Default for TrackRecorder {
    fn default() -> Self {
        Self::new()
    }
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
