//! Sensor Bridge Watch
//!
//! Terminal viewer for the bridge's reading stream.

use chrono::Local;
use clap::{Parser, ValueEnum};
use sensor_bridge::watch::{
    HumidityBand, ReadingHistory, TemperatureBand, WatchClient, WatchEvent, DEFAULT_HISTORY_LEN,
};
use sensor_bridge::{logging, Command, LoggingConfig, Unit};
use std::ops::ControlFlow;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "sensor-bridge-watch")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Watch live sensor readings from a running bridge")]
struct Cli {
    /// Bridge WebSocket URL
    #[arg(long, default_value = "ws://localhost:3001")]
    url: String,

    /// Ask the sensor to switch units after connecting
    #[arg(short, long, value_enum)]
    unit: Option<UnitArg>,

    /// Exit after this many readings
    #[arg(short = 'n', long)]
    count: Option<usize>,

    /// Readings kept for the summary table
    #[arg(long, default_value_t = DEFAULT_HISTORY_LEN)]
    history: usize,

    /// Seconds between reconnect attempts
    #[arg(long, default_value = "3")]
    reconnect: u64,

    /// Output format (table, json)
    #[arg(short, long, default_value = "table")]
    format: String,
}

#[derive(Clone, Copy, ValueEnum)]
enum UnitArg {
    C,
    F,
}

impl From<UnitArg> for Unit {
    fn from(arg: UnitArg) -> Self {
        match arg {
            UnitArg::C => Unit::Celsius,
            UnitArg::F => Unit::Fahrenheit,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    logging::init(&LoggingConfig {
        level: "warn".to_string(),
        ..LoggingConfig::default()
    });

    let mut client =
        WatchClient::new(cli.url.clone()).reconnect_delay(Duration::from_secs(cli.reconnect));
    if let Some(unit) = cli.unit {
        client = client.command(Command::set_unit(unit.into()));
    }

    let json = cli.format == "json";
    let mut history = ReadingHistory::new(cli.history);
    let mut seen = 0usize;

    client
        .run(|event| {
            match event {
                WatchEvent::Connected { message } => {
                    if !json {
                        println!("🔌 {} ({})", message, cli.url);
                    }
                }
                WatchEvent::Reading(reading) => {
                    let entry = history.push(reading, Local::now());
                    if json {
                        match serde_json::to_string(&entry.reading) {
                            Ok(line) => println!("{}", line),
                            Err(e) => eprintln!("Failed to encode reading: {}", e),
                        }
                    } else {
                        let [time, temperature, humidity, _] = entry.row();
                        println!(
                            "{}  {:>8}  {:>6}  {:<11} {:<7}{}",
                            time,
                            temperature,
                            humidity,
                            TemperatureBand::classify(reading.temperature),
                            HumidityBand::classify(reading.humidity),
                            if reading.simulation { " (simulated)" } else { "" }
                        );
                    }
                    seen += 1;
                    if cli.count.is_some_and(|limit| seen >= limit) {
                        return ControlFlow::Break(());
                    }
                }
                WatchEvent::Disconnected { reason } => {
                    eprintln!(
                        "Disconnected: {}. Reconnecting in {}s...",
                        reason, cli.reconnect
                    );
                }
            }
            ControlFlow::Continue(())
        })
        .await;

    if !json && !history.is_empty() {
        print_summary(&history);
    }
    Ok(())
}

fn print_summary(history: &ReadingHistory) {
    println!();
    println!("Last {} readings (newest first):", history.len());
    println!("{:<10} {:>8} {:>6}  {}", "TIME", "TEMP", "HUM", "UNIT");
    println!("{}", "-".repeat(40));
    for entry in history.iter() {
        let [time, temperature, humidity, unit] = entry.row();
        println!("{:<10} {:>8} {:>6}  {}", time, temperature, humidity, unit);
    }
}
