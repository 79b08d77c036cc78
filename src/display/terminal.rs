// src/display/terminal.rs
//! Terminal-based display implementation

use crate::{
    error::{GnssError, Result},
    monitor::MonitorState,
};
use crossterm::{
    cursor::{Hide, MoveTo, Show},
    execute,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{Clear, ClearType, DisableLineWrap, EnableLineWrap},
};
use std::{
    io::{self, Write},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, RwLock,
    },
    time::Duration,
};
use tokio::time::sleep;

pub struct TerminalDisplay;

impl TerminalDisplay {
    pub fn new() -> Self {
        Self
    }

    /// Start the terminal display loop
    pub async fn run(
        &self,
        state: Arc<RwLock<MonitorState>>,
        running: Arc<AtomicBool>,
    ) -> Result<()> {
        let mut stdout = io::stdout();
        execute!(stdout, Hide, DisableLineWrap).map_err(GnssError::Io)?;

        // Set up Ctrl+C handler
        let running_clone = Arc::clone(&running);
        tokio::spawn(async move {
            tokio::signal::ctrl_c().await.ok();
            running_clone.store(false, Ordering::Relaxed);
        });

        while running.load(Ordering::Relaxed) {
            execute!(stdout, Clear(ClearType::All), MoveTo(0, 0)).map_err(GnssError::Io)?;

            let snapshot = state.read().unwrap().clone();
            self.render_display(&mut stdout, &snapshot)?;

            stdout.flush().map_err(GnssError::Io)?;
            sleep(Duration::from_secs(1)).await;
        }

        execute!(stdout, Show, EnableLineWrap).map_err(GnssError::Io)?;
        println!("\nShutting down...");
        Ok(())
    }

    /// Render a state snapshot to the terminal
    fn render_display(&self, stdout: &mut impl Write, state: &MonitorState) -> Result<()> {
        execute!(
            stdout,
            SetForegroundColor(Color::Green),
            Print("=".repeat(60)),
            Print("\n"),
            Print("GNSS Monitor - Receiver Status"),
            Print("\n"),
            Print("=".repeat(60)),
            Print("\n"),
            ResetColor
        )
        .map_err(GnssError::Io)?;

        let last_update = match state.last_update {
            Some(ts) => ts.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            None => "No data received".to_string(),
        };
        execute!(stdout, Print(format!("Last Update: {}\n\n", last_update)))
            .map_err(GnssError::Io)?;

        self.render_position_section(stdout, state)?;
        self.render_quality_section(stdout, state)?;
        self.render_satellite_section(stdout, state)?;
        self.render_scatter_section(stdout, state)?;
        self.render_raw_data_section(stdout, state)?;

        if let Some(ref message) = state.message {
            execute!(
                stdout,
                SetForegroundColor(Color::Red),
                Print(format!("STATUS: {}\n\n", message)),
                ResetColor
            )
            .map_err(GnssError::Io)?;
        }

        execute!(
            stdout,
            SetForegroundColor(Color::Green),
            Print("=".repeat(60)),
            Print("\n"),
            Print("Press Ctrl+C to exit"),
            Print("\n"),
            ResetColor
        )
        .map_err(GnssError::Io)?;

        Ok(())
    }

    fn render_position_section(&self, stdout: &mut impl Write, state: &MonitorState) -> Result<()> {
        execute!(
            stdout,
            SetForegroundColor(Color::Yellow),
            Print("POSITION:\n"),
            ResetColor
        )
        .map_err(GnssError::Io)?;

        let status = &state.status;
        let utc = status
            .utc
            .map(|t| t.format("%H:%M:%S").to_string())
            .unwrap_or_else(|| "--:--:--".to_string());
        execute!(
            stdout,
            Print(format!("  UTC:       {:>12}\n", utc)),
            Print(format!("  Latitude:  {:>12.6}\u{b0}\n", status.lat)),
            Print(format!("  Longitude: {:>12.6}\u{b0}\n", status.lon)),
            Print(format!("  Altitude:  {:>12.1} m\n", status.alt)),
            Print(format!("  Speed:     {:>12.2} m/s\n", status.speed)),
            Print(format!("  Track:     {:>12.1}\u{b0}\n\n", status.track)),
        )
        .map_err(GnssError::Io)?;

        Ok(())
    }

    fn render_quality_section(&self, stdout: &mut impl Write, state: &MonitorState) -> Result<()> {
        execute!(
            stdout,
            SetForegroundColor(Color::Magenta),
            Print("QUALITY:\n"),
            ResetColor
        )
        .map_err(GnssError::Io)?;

        let status = &state.status;
        execute!(
            stdout,
            Print(format!("  Fix:        {:>11}\n", status.fix.label())),
            Print(format!(
                "  DOP (p/h/v): {:.1} / {:.1} / {:.1}\n",
                status.pdop, status.hdop, status.vdop
            )),
            Print(format!(
                "  Acc (h/v):   {:.1} m / {:.1} m\n",
                status.hacc, status.vacc
            )),
            Print(format!(
                "  Sats (use/view): {} / {}\n\n",
                status.sip, status.siv
            )),
        )
        .map_err(GnssError::Io)?;

        Ok(())
    }

    fn render_satellite_section(&self, stdout: &mut impl Write, state: &MonitorState) -> Result<()> {
        execute!(
            stdout,
            SetForegroundColor(Color::Cyan),
            Print("SATELLITES IN VIEW:\n"),
            ResetColor
        )
        .map_err(GnssError::Io)?;

        if state.satellites.is_empty() {
            execute!(stdout, Print("  (none)\n\n")).map_err(GnssError::Io)?;
            return Ok(());
        }

        for sat in &state.satellites {
            execute!(
                stdout,
                Print(format!(
                    "  {:<4} {:>3}  elv {:>4}  az {:>5}  cno {:>3}\n",
                    sat.constellation.label(),
                    sat.svid,
                    sat.elevation.map_or("---".to_string(), |e| format!("{:.0}", e)),
                    sat.azimuth.map_or("---".to_string(), |a| format!("{:.0}", a)),
                    sat.cno.map_or("---".to_string(), |c| c.to_string()),
                ))
            )
            .map_err(GnssError::Io)?;
        }
        execute!(stdout, Print("\n")).map_err(GnssError::Io)?;

        Ok(())
    }

    fn render_scatter_section(&self, stdout: &mut impl Write, state: &MonitorState) -> Result<()> {
        execute!(
            stdout,
            SetForegroundColor(Color::Blue),
            Print("SCATTER:\n"),
            ResetColor
        )
        .map_err(GnssError::Io)?;

        let scatter = &state.scatter;
        execute!(
            stdout,
            Print(format!("  Points:  {}\n", scatter.point_count))
        )
        .map_err(GnssError::Io)?;
        if let Some(avg) = scatter.average {
            execute!(
                stdout,
                Print(format!("  Avg:     {:.9}, {:.9}\n", avg.lat, avg.lon))
            )
            .map_err(GnssError::Io)?;
        }
        if let Some(std) = scatter.stddev {
            execute!(
                stdout,
                Print(format!("  Std:     {:.3e}, {:.3e}\n", std.lat, std.lon))
            )
            .map_err(GnssError::Io)?;
        }
        execute!(stdout, Print(format!("  Range:   {:.2} m\n\n", scatter.range_m)))
            .map_err(GnssError::Io)?;

        Ok(())
    }

    fn render_raw_data_section(&self, stdout: &mut impl Write, state: &MonitorState) -> Result<()> {
        execute!(
            stdout,
            SetForegroundColor(Color::DarkGrey),
            Print("RAW DATA:\n"),
            ResetColor
        )
        .map_err(GnssError::Io)?;

        let raw_display = if state.raw.is_empty() {
            "No data"
        } else {
            &state.raw
        };

        execute!(stdout, Print(format!("  {}\n\n", raw_display))).map_err(GnssError::Io)?;

        Ok(())
    }
}

impl Default for TerminalDisplay {
    fn default() -> Self {
        Self::new()
    }
}
