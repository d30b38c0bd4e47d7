//! Evolution Command-Line Tool
//!
//! Reads and sets HVAC parameters on an Evolution system, over either a
//! directly-attached serial port (`--device`) or the HTTP relay
//! (`--relay`).

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use evo_client::{enumerate_zones, shared_serial_mux, CommandChannel, RelayClient, ZoneClient};
use evo_protocol::Command as WireCommand;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "evolink", author, version, about, long_about = None)]
struct Args {
    /// Serial device the SAM is attached to, e.g. `/dev/ttyUSB0`
    #[arg(short, long, conflicts_with = "relay")]
    device: Option<String>,

    /// Host running the HTTP relay
    #[arg(short, long)]
    relay: Option<String>,

    /// System to address
    #[arg(short, long, default_value_t = 1)]
    system: u8,

    /// Zone to address
    #[arg(short, long, default_value_t = 1)]
    zone: u8,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand, Debug)]
enum CliCommand {
    /// Read temperature, setpoints, mode, and fan for the zone
    Status,
    /// Discover the system's zones and print them as JSON
    Zones,
    /// Set the cooling setpoint
    SetCool { temperature: u32 },
    /// Set the heating setpoint
    SetHeat { temperature: u32 },
    /// Set the system mode (off, heat, cool, auto, heat_cool)
    SetMode { mode: String },
    /// Set the fan mode (auto, low, med, high)
    SetFan { mode: String },
    /// Send a raw command string and print the reply payload
    Send { command: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Include all our crates in the default filter
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "evolink=info,evo_client=info,evo_protocol=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    tracing::debug!("addressing system {} zone {}", args.system, args.zone);

    let channel = open_channel(&args).await?;
    let client = ZoneClient::new(args.system, args.zone, channel.clone());

    match args.command {
        CliCommand::Status => {
            print_reading("temperature", client.read_current_temperature().await);
            print_reading("cooling setpoint", client.read_cooling_setpoint().await);
            print_reading("heating setpoint", client.read_heating_setpoint().await);
            match client.read_hvac_mode().await {
                Some(reading) => println!(
                    "mode:             {} ({})",
                    reading.mode,
                    if reading.active { "running" } else { "idle" }
                ),
                None => println!("mode:             no response"),
            }
            match client.read_fan_mode().await {
                Some(fan) => println!("fan:              {}", fan),
                None => println!("fan:              no response"),
            }
        }
        CliCommand::Zones => {
            let zones = enumerate_zones(&channel, args.system).await;
            println!("{}", serde_json::to_string_pretty(&zones)?);
        }
        CliCommand::SetCool { temperature } => {
            check_set(client.set_cooling_setpoint(temperature).await)?;
        }
        CliCommand::SetHeat { temperature } => {
            check_set(client.set_heating_setpoint(temperature).await)?;
        }
        CliCommand::SetMode { mode } => {
            check_set(client.set_hvac_mode(&mode).await)?;
        }
        CliCommand::SetFan { mode } => {
            check_set(client.set_fan_mode(&mode).await)?;
        }
        CliCommand::Send { command } => {
            match channel.send_command(WireCommand::raw(command)).await {
                Some(payload) => println!("{}", payload),
                None => bail!("no response from device"),
            }
        }
    }

    Ok(())
}

/// Build the transport named on the command line
async fn open_channel(args: &Args) -> Result<Arc<dyn CommandChannel>> {
    match (&args.device, &args.relay) {
        (Some(path), None) => {
            let mux = shared_serial_mux(path)
                .await
                .with_context(|| format!("opening {}", path))?;
            Ok(Arc::new(mux))
        }
        (None, Some(host)) => Ok(Arc::new(RelayClient::new(host))),
        _ => bail!("specify exactly one of --device or --relay"),
    }
}

fn print_reading(label: &str, value: Option<u32>) {
    match value {
        Some(v) => println!("{:<17} {}F", format!("{}:", label), v),
        None => println!("{:<17} no response", format!("{}:", label)),
    }
}

/// A set either took effect or left the device state indeterminate
fn check_set(ok: bool) -> Result<()> {
    if !ok {
        bail!("device did not acknowledge; state is indeterminate");
    }
    println!("ACK");
    Ok(())
}
