//! CLI for fabric-bridge
//!
//! Subcommands:
//! - `run`: connect to the configured broker and serve the demo accessories
//! - `describe`: dry run against an in-memory broker, printing every topic
//!   and payload the bridge would produce

use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

use clap::Parser;
use tokio::runtime::Handle;
use tracing::{error, info, warn};

use fabric_bridge::config::{Settings, load_config};
use fabric_bridge::connector::{Connector, ConnectorOptions, RunEvent};
use fabric_bridge::model::catalog::{self, FloatRange};
use fabric_bridge::model::{AccessoryInfo, Container};
use fabric_bridge::transport::memory::{MemoryNetwork, MemoryTransport, ScriptedResolution};
use fabric_bridge::transport::mqtt::MqttTransport;
use fabric_bridge::transport::{HostNetwork, Network, Transport};
use fabric_bridge::utils::error::{FabricError, ModelError};
use fabric_bridge::utils::logging;

#[derive(Parser)]
#[command(name = "fabric-bridge")]
enum Command {
    /// Connect to the broker and serve the demo accessories until ctrl-c
    Run,
    /// Print the topics and payloads produced on connect and shutdown
    Describe,
}

#[tokio::main]
async fn main() {
    let cmd = Command::parse();

    let settings = match load_config() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };
    logging::init(&settings.runtime.log_level);

    let result = match cmd {
        Command::Run => run_bridge(settings).await,
        Command::Describe => describe(&settings),
    };
    if let Err(e) = result {
        error!("Bridge failed: {}", e);
        std::process::exit(1);
    }
}

/// Thermostat and outlet, named after the configured device.
fn demo_container(settings: &Settings) -> Result<Container, ModelError> {
    let device = &settings.device;
    let info = AccessoryInfo::new(device.name.clone())
        .serial_number(device.serial_number.clone())
        .manufacturer(device.manufacturer.clone())
        .model(device.model.clone());

    let mut container = Container::new(settings.fabric.nodename.clone(), info.clone());
    container.add_accessory(catalog::thermostat(
        &info,
        FloatRange::new(20.0, 0.0, 100.0, 0.1),
        FloatRange::new(21.0, 5.0, 30.0, 1.0),
    )?);
    container.add_accessory(catalog::outlet(&info));
    Ok(container)
}

fn prepare<T: Transport, N: Network>(
    settings: &Settings,
    transport: T,
    network: N,
) -> Result<Connector<T, N>, FabricError> {
    let mut connector = Connector::new(ConnectorOptions::from(settings), transport, network)?;
    if let Some(source) = &settings.device.periodic_source {
        connector.enable_periodic_source(source.clone());
    }
    connector.install_command_callback(|command| {
        info!(
            from = %command.address.nodename,
            actor = %command.address.actor_id,
            feed = %command.address.feed_id,
            payload = ?command.payload,
            "command received"
        );
    });
    connector.set_accessories(demo_container(settings)?)?;
    Ok(connector)
}

async fn run_bridge(settings: Settings) -> Result<(), FabricError> {
    let runtime = Handle::current();
    let transport = MqttTransport::new(
        runtime.clone(),
        settings.broker.client_id.clone(),
        settings.broker.keepalive_secs,
        settings.broker.request_capacity,
    );
    let mut connector = prepare(&settings, transport, HostNetwork::new(runtime))?;
    info!(
        broker = %settings.broker.host,
        port = settings.broker.port,
        nodename = %connector.nodename(),
        "bridge starting"
    );

    let mut ticker = tokio::time::interval(Duration::from_millis(settings.runtime.poll_interval_ms.max(1)));
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                for _ in 0..=connector.queued() {
                    match connector.run() {
                        RunEvent::Connected => info!(state = %connector.state(), "bridge online"),
                        RunEvent::Disconnected => warn!(state = %connector.state(), "bridge offline"),
                        RunEvent::Idle => {}
                    }
                }
                while let Some(event) = connector.next_device_event() {
                    info!(
                        aid = event.handle.aid,
                        iid = event.handle.iid,
                        value = %event.value,
                        from = %event.actor_id,
                        "device updated by controller"
                    );
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received. Closing the broker session.");
                break;
            }
        }
    }

    let limit = Duration::from_millis(settings.runtime.shutdown_timeout_ms);
    let closing = async {
        while !connector.close() {
            ticker.tick().await;
        }
    };
    if tokio::time::timeout(limit, closing).await.is_err() {
        warn!(?limit, "broker did not confirm the disconnect in time");
    }
    Ok(())
}

fn describe(settings: &Settings) -> Result<(), FabricError> {
    let network = MemoryNetwork::new(ScriptedResolution::Immediate(IpAddr::V4(Ipv4Addr::LOCALHOST)));
    let mut connector = prepare(settings, MemoryTransport::new().with_auto_connack(), network)?;

    let online = (0..8).any(|_| connector.run() == RunEvent::Connected);
    if !online {
        warn!(state = %connector.state(), "in-memory broker never accepted the session");
    }

    let will = connector.transport().last_will().cloned();
    if let Some(will) = will {
        println!("last will  {}", will.topic);
        println!("           {}", String::from_utf8_lossy(&will.payload));
    }
    for (topic, qos) in connector.transport().subscriptions() {
        println!("subscribe  {} (qos {})", topic, qos.level());
    }

    let closed = (0..8).any(|_| connector.close());
    if !closed {
        warn!(state = %connector.state(), "shutdown did not complete");
    }

    for publish in connector.transport().published() {
        println!("publish    {}", publish.topic);
        println!("           {}", publish.payload_str());
    }
    Ok(())
}
