//! Sensor Bridge Server
//!
//! Subscribes to the broker, normalizes readings and streams them to
//! WebSocket viewers.

use anyhow::Context;
use clap::Parser;
use sensor_bridge::{
    api, config::generate_default_config, logging, upstream, AppState, BroadcastHub,
    CommandSink, Config, LogCommandSink, MqttCommandPublisher, Simulator, Subscriber,
    UpstreamStatus,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "sensor-bridge")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Stream MQTT sensor readings to WebSocket dashboards")]
struct Cli {
    /// Path to a TOML config file (default: standard locations, then env)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print a default config file and exit
    #[arg(long)]
    print_config: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.print_config {
        print!("{}", generate_default_config());
        return Ok(());
    }

    let (config, source) = match &cli.config {
        Some(path) => {
            let config = Config::load_with_env(path)
                .with_context(|| format!("loading config from {}", path.display()))?;
            (config, Some(path.clone()))
        }
        None => Config::load_default().context("loading config from a default location")?,
    };
    config.validate().context("invalid configuration")?;

    logging::init(&config.logging);
    tracing::info!("Sensor Bridge v{}", env!("CARGO_PKG_VERSION"));
    match &source {
        Some(path) => tracing::info!("Loaded config from {:?}", path),
        None => tracing::info!("Using default config with environment overrides"),
    }

    let hub = Arc::new(BroadcastHub::new(config.hub.hub_config()));
    let status = Arc::new(UpstreamStatus::new());

    let (client, eventloop) = upstream::connect(&config.mqtt)?;
    tracing::info!(broker = %config.mqtt.url, topics = ?config.mqtt.topics, "Connecting to MQTT broker");

    let commands: Arc<dyn CommandSink> = match &config.mqtt.command_topic {
        Some(topic) => Arc::new(MqttCommandPublisher::new(
            client.clone(),
            topic.clone(),
            upstream::qos_level(config.mqtt.qos),
        )),
        None => Arc::new(LogCommandSink),
    };
    tracing::info!(sink = commands.name(), "Command sink ready");

    let subscriber = Subscriber::new(client, hub.clone(), status.clone(), &config.mqtt);
    let subscriber_handle = tokio::spawn(subscriber.run(eventloop));

    let simulator_handle = config.simulation.enabled.then(|| {
        let simulator = Simulator::new(
            hub.clone(),
            status.clone(),
            Duration::from_millis(config.simulation.interval_ms),
        );
        tokio::spawn(simulator.run())
    });

    let state = AppState::new(hub, status, commands, config.hub.stream_settings());
    tracing::info!("Listening on {}", config.server.addr());

    let result = api::serve(state, &config.server).await;

    subscriber_handle.abort();
    if let Some(handle) = simulator_handle {
        handle.abort();
    }

    result?;
    tracing::info!("Sensor Bridge shutdown complete");
    Ok(())
}
