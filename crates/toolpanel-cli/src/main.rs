//! Tool-checkout station simulator.
//!
//! Runs the full station on simulated sensors, keypad and buzzer, driven by
//! commands typed on stdin. Authorization requests go to the configured HTTP
//! endpoint, or to a local stub with `--offline <status>`.

mod commands;

use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use commands::{Command, HELP};
use toolpanel_core::PositionId;
use toolpanel_hardware::default_sensors;
use toolpanel_hardware::mock::{
    MockAnalog, MockAnalogHandle, MockBuzzer, MockMatrix, MockMatrixHandle, PRESENT_READING,
};
use toolpanel_network::mock::MockTransport;
use toolpanel_network::{AuthClient, AuthTransport};
use toolpanel_station::{DispatchReport, Station, StationConfig};

/// Tool-checkout station simulator
#[derive(Parser)]
#[command(name = "toolpanel")]
#[command(about = "Simulate a tool-checkout station from the terminal")]
#[command(version)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Authorization endpoint, overrides the configuration file
    #[arg(long)]
    endpoint: Option<String>,

    /// Answer every request locally with this status instead of using HTTP
    #[arg(long, value_name = "STATUS")]
    offline: Option<u16>,
}

/// Simulated peripherals the console drives.
struct Simulator {
    sensors: MockAnalogHandle,
    keys: MockMatrixHandle,
}

impl Simulator {
    fn channel_of(position: &PositionId) -> anyhow::Result<u8> {
        default_sensors()
            .into_iter()
            .find(|s| &s.position == position)
            .map(|s| s.channel)
            .with_context(|| format!("no sensor at position {position}"))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => StationConfig::load(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => StationConfig::default(),
    };
    if let Some(endpoint) = cli.endpoint {
        config.endpoint = endpoint;
    }
    config.validate()?;

    match cli.offline {
        Some(status) => {
            let (transport, handle) = MockTransport::new();
            handle.respond_with(status);
            info!(status, "offline mode, requests answered locally");
            run(config, transport).await
        }
        None => {
            let transport = AuthClient::new(config.auth_client_config())?;
            info!(endpoint = %transport.endpoint(), "posting to authorization service");
            run(config, transport).await
        }
    }
}

async fn run<T: AuthTransport + 'static>(
    config: StationConfig,
    transport: T,
) -> anyhow::Result<()> {
    let (analog, sensors) = MockAnalog::new();
    let (matrix, keys) = MockMatrix::new();
    let (buzzer, _) = MockBuzzer::new();
    let simulator = Simulator { sensors, keys };

    let mut station = Station::new(config, analog, matrix, transport, buzzer)?.start();
    println!("{HELP}");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("reading stdin")? else {
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }
                match line.parse::<Command>() {
                    Ok(Command::Quit) => break,
                    Ok(Command::Status) => println!("station is {}", station.status()),
                    Ok(command) => {
                        if let Err(e) = apply(&simulator, command) {
                            println!("error: {e:#}");
                        }
                    }
                    Err(e) => println!("error: {e}"),
                }
            }
            report = station.next_report() => {
                match report {
                    Some(report) => print_report(&report),
                    None => {
                        warn!("consumer loop exited");
                        break;
                    }
                }
            }
        }
    }

    let summary = station.shutdown().await;
    if summary.failed + summary.panicked > 0 {
        bail!("station tasks ended abnormally: {summary:?}");
    }
    Ok(())
}

fn apply(simulator: &Simulator, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Take(position) => {
            let channel = Simulator::channel_of(&position)?;
            simulator.sensors.set_reading(channel, 0);
            println!("tool at position {position} lifted");
        }
        Command::Return(position) => {
            let channel = Simulator::channel_of(&position)?;
            simulator.sensors.set_reading(channel, PRESENT_READING);
            println!("tool at position {position} put back");
        }
        Command::Keys(keys) => {
            for key in keys {
                simulator.keys.press(key);
            }
        }
        Command::Help => println!("{HELP}"),
        Command::Status | Command::Quit => {}
    }
    Ok(())
}

fn print_report(report: &DispatchReport) {
    println!(
        "position {} {} code \"{}\": {}{}",
        report.request.posicao,
        report.request.tipo_operacao,
        report.request.codigo,
        report.outcome,
        if report.feedback_played { " (buzzer)" } else { "" }
    );
}
