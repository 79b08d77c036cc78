// src/main.rs
//! GNSS Monitor - live receiver status in the terminal

use clap::Parser;
use gnss_monitor::{
    config::MonitorConfig,
    display::terminal::TerminalDisplay,
    error::{GnssError, Result},
    monitor::{list_serial_ports, FeedSource, GnssMonitor},
};

#[derive(Parser, Debug)]
#[command(name = "gnss-monitor", about = "GNSS receiver monitor", version)]
struct Cli {
    /// Serial port for the decoded sentence feed (overrides config)
    #[arg(short, long)]
    port: Option<String>,

    /// Serial baud rate
    #[arg(short, long, default_value_t = 9600)]
    baudrate: u32,

    /// TCP host for a network feed (overrides config)
    #[arg(long)]
    host: Option<String>,

    /// TCP port for a network feed
    #[arg(long, default_value_t = 2947)]
    tcp_port: u16,

    /// List available serial ports and exit
    #[arg(long)]
    list_ports: bool,

    /// Record trackpoints to a GPX file
    #[arg(long)]
    track: Option<String>,
}

fn select_source(cli: &Cli, config: &MonitorConfig) -> Result<FeedSource> {
    if let Some(ref port) = cli.port {
        return Ok(FeedSource::Serial {
            port: port.clone(),
            baudrate: cli.baudrate,
        });
    }
    if let Some(ref host) = cli.host {
        return Ok(FeedSource::Tcp {
            host: host.clone(),
            port: cli.tcp_port,
        });
    }

    match config.source_type.as_str() {
        "serial" => {
            let port = config.serial_port.clone().ok_or_else(|| {
                GnssError::Other("No serial port configured; pass --port".to_string())
            })?;
            Ok(FeedSource::Serial {
                port,
                baudrate: config.serial_baudrate.unwrap_or(9600),
            })
        }
        "tcp" => Ok(FeedSource::Tcp {
            host: config
                .tcp_host
                .clone()
                .unwrap_or_else(|| "localhost".to_string()),
            port: config.tcp_port.unwrap_or(2947),
        }),
        other => Err(GnssError::Other(format!("Unknown source type: {}", other))),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    if cli.list_ports {
        return list_serial_ports();
    }

    let mut config = MonitorConfig::load().unwrap_or_default();
    if let Some(ref track) = cli.track {
        config.record_track = true;
        config.track_file = Some(track.clone());
    }

    let source = select_source(&cli, &config)?;
    let monitor = GnssMonitor::new();
    monitor.start(source, &config).await?;

    let display = TerminalDisplay::new();
    display
        .run(monitor.state_handle(), monitor.running_handle())
        .await?;

    monitor.stop();
    Ok(())
}
