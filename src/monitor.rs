// src/monitor.rs
//! Main monitor coordination
//!
//! One worker task owns the sentence reducer, the scatter engine and the
//! track recorder, and is the only writer of the shared state; display
//! consumers read cloned snapshots.

use crate::{
    config::MonitorConfig,
    display::{canvas::NullCanvas, BannerUpdate, DisplaySink},
    error::{GnssError, Result},
    gps::{
        satellites::SatelliteView,
        sentence::Sentence,
        status::{GnssStatus, StatusUpdate},
        SentenceReducer,
    },
    scatter::{ScatterEngine, ScatterSummary},
    track::{TrackPoint, TrackRecorder},
};
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use std::{
    path::PathBuf,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, RwLock,
    },
    time::Duration,
};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::net::TcpStream;
use tokio_serial::SerialPortBuilderExt;

/// Decoded sentence feed configuration
#[derive(Debug, Clone)]
pub enum FeedSource {
    Serial { port: String, baudrate: u32 },
    Tcp { host: String, port: u16 },
}

/// Snapshot of everything the display layer renders.
#[derive(Debug, Clone, Default)]
pub struct MonitorState {
    pub status: GnssStatus,
    pub satellites: Vec<SatelliteView>,
    pub scatter: ScatterSummary,
    /// Last user-visible status message (e.g. a malformed field report)
    pub message: Option<String>,
    pub last_update: Option<DateTime<Utc>>,
    /// Most recent feed line
    pub raw: String,
}

/// Sink wiring the reducer's notifications into the shared state and the
/// track recorder. The banner is not pushed to directly; it renders from
/// state snapshots.
struct StateSink<'a> {
    state: &'a mut MonitorState,
    recorder: &'a mut TrackRecorder,
}

impl DisplaySink for StateSink<'_> {
    fn update_banner(&mut self, _update: &BannerUpdate) {}

    fn update_map(&mut self, lat: f64, lon: f64, hacc: f64) {
        debug!("map update: {:.6},{:.6} hacc {:.1}m", lat, lon, hacc);
    }

    fn update_sats(&mut self, satellites: &[SatelliteView]) {
        self.state.satellites = satellites.to_vec();
    }

    fn update_graph(&mut self, _satellites: &[SatelliteView], siv: usize) {
        debug!("signal graph update: {} satellites", siv);
    }

    fn add_trackpoint(&mut self, point: TrackPoint) {
        self.recorder.add_point(point);
    }

    fn set_status(&mut self, message: &str) {
        warn!("{}", message);
        self.state.message = Some(message.to_string());
    }

    fn merge_status(&mut self, update: &StatusUpdate) {
        self.state.status.merge(update);
    }
}

/// Coordinates the feed connection and the update worker.
pub struct GnssMonitor {
    state: Arc<RwLock<MonitorState>>,
    running: Arc<AtomicBool>,
}

impl GnssMonitor {
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(MonitorState::default())),
            running: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Start consuming decoded sentences from the specified source.
    pub async fn start(&self, source: FeedSource, config: &MonitorConfig) -> Result<()> {
        match source {
            FeedSource::Serial { port, baudrate } => {
                info!("Connecting to receiver feed on {} at {} baud", port, baudrate);
                let serial = tokio_serial::new(&port, baudrate)
                    .timeout(Duration::from_millis(1000))
                    .open_native_async()
                    .map_err(|e| {
                        GnssError::Connection(format!(
                            "Failed to open serial port {}: {}",
                            port, e
                        ))
                    })?;
                self.spawn_worker(BufReader::new(serial), config);
            }
            FeedSource::Tcp { host, port } => {
                info!("Connecting to feed at {}:{}", host, port);
                let stream = TcpStream::connect(format!("{}:{}", host, port))
                    .await
                    .map_err(|e| {
                        GnssError::Connection(format!(
                            "Failed to connect to {}:{}: {}",
                            host, port, e
                        ))
                    })?;
                self.spawn_worker(BufReader::new(stream), config);
            }
        }
        Ok(())
    }

    /// Spawn the single-writer worker over a line-oriented feed of decoded
    /// sentences (one JSON object per line).
    fn spawn_worker<R>(&self, mut reader: R, config: &MonitorConfig)
    where
        R: AsyncBufRead + Unpin + Send + 'static,
    {
        let state = Arc::clone(&self.state);
        let running = Arc::clone(&self.running);

        let mut reducer = SentenceReducer::with_options(
            Duration::from_secs(config.sat_expiry_secs),
            config.show_zero,
            config.record_track,
        );
        let mut scatter = ScatterEngine::from_config(&config.scatter);
        let mut canvas = NullCanvas::default();
        let mut recorder = TrackRecorder::new();
        if config.record_track {
            recorder.start_recording(String::new());
        }
        let track_file = config.track_file.clone().map(PathBuf::from);

        tokio::spawn(async move {
            let mut line = String::new();

            while running.load(Ordering::Relaxed) {
                line.clear();
                match reader.read_line(&mut line).await {
                    Ok(0) => break, // EOF
                    Ok(_) => {
                        let line = line.trim();
                        if line.is_empty() {
                            continue;
                        }
                        let sentence: Sentence = match serde_json::from_str(line) {
                            Ok(s) => s,
                            Err(e) => {
                                debug!("skipping undecodable feed line: {}", e);
                                continue;
                            }
                        };

                        let mut guard = state.write().unwrap();
                        let mut sink = StateSink {
                            state: &mut *guard,
                            recorder: &mut recorder,
                        };
                        reducer.process(Some(line.as_bytes()), &sentence, &mut sink);

                        let status = guard.status.clone();
                        scatter.update(&status, &mut canvas);
                        guard.scatter = scatter.summary();
                        guard.raw = line.to_string();
                        guard.last_update = Some(Utc::now());
                    }
                    Err(e) => {
                        warn!("Error reading from feed: {}", e);
                        break;
                    }
                }
            }

            if recorder.is_recording() && recorder.point_count() > 0 {
                if let Some(path) = track_file {
                    match recorder.export_to_file(&path) {
                        Ok(()) => info!("Track saved to {}", path.display()),
                        Err(e) => warn!("Failed to save track: {}", e),
                    }
                }
            }
        });
    }

    /// Get a consistent snapshot of the current state.
    pub fn snapshot(&self) -> MonitorState {
        self.state.read().unwrap().clone()
    }

    pub fn state_handle(&self) -> Arc<RwLock<MonitorState>> {
        Arc::clone(&self.state)
    }

    pub fn running_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    /// Stop the monitor
    pub fn stop(&self) {
        self.running.store(false, Ordering::Relaxed);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }
}

impl Default for GnssMonitor {
    fn default() -> Self {
        Self::new()
    }
}

/// List available serial ports
pub fn list_serial_ports() -> Result<()> {
    let ports = tokio_serial::available_ports()
        .map_err(|e| GnssError::Other(format!("Failed to list serial ports: {}", e)))?;

    if ports.is_empty() {
        println!("No serial ports found.");
    } else {
        println!("Available serial ports:");
        for port in ports {
            println!("  {} - {:?}", port.port_name, port.port_type);
        }
    }

    Ok(())
}
