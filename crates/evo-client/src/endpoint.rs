//! Typed zone clients
//!
//! A [`ZoneClient`] binds one (system, zone) pair to a command channel and
//! exposes the HVAC parameters as typed reads and sets. All reads resolve to
//! `None` on protocol failure; all sets report success only for an explicit
//! `ACK` from the device. After a failed set the device state is
//! indeterminate, the write may or may not have taken effect.

use evo_protocol::{decode_mode, decode_temperature, Command, ModeReading, Verb, ACK};
use tokio_serial::SerialStream;
use tracing::warn;

use crate::channel::CommandChannel;
use crate::error::ClientError;
use crate::mux::CommandMux;
use crate::registry::shared_serial_mux;
use crate::relay::RelayClient;

/// Client for one zone of one system behind a shared command channel
#[derive(Debug, Clone)]
pub struct ZoneClient<C> {
    system_id: u8,
    zone_id: u8,
    channel: C,
}

impl ZoneClient<CommandMux<SerialStream>> {
    /// Bind to a zone of the serial device at `path`
    ///
    /// Clients for the same path share one multiplexer through the
    /// process-wide registry.
    pub async fn open(system_id: u8, zone_id: u8, path: &str) -> Result<Self, ClientError> {
        let mux = shared_serial_mux(path).await?;
        Ok(Self::new(system_id, zone_id, mux))
    }
}

impl ZoneClient<RelayClient> {
    /// Bind to a zone of the device behind the HTTP relay on `host`
    pub fn relay(system_id: u8, zone_id: u8, host: &str) -> Self {
        Self::new(system_id, zone_id, RelayClient::new(host))
    }
}

impl<C> ZoneClient<C>
where
    C: CommandChannel,
{
    /// Bind to a zone over an already-constructed channel
    pub fn new(system_id: u8, zone_id: u8, channel: C) -> Self {
        Self {
            system_id,
            zone_id,
            channel,
        }
    }

    /// The system this client addresses
    pub fn system_id(&self) -> u8 {
        self.system_id
    }

    /// The zone this client addresses
    pub fn zone_id(&self) -> u8 {
        self.zone_id
    }

    /// The channel this client submits through
    pub fn channel(&self) -> &C {
        &self.channel
    }

    async fn query(&self, verb: Verb) -> Option<String> {
        let zone = zone_segment(verb, self.zone_id);
        self.channel
            .send_command(Command::query(self.system_id, zone, verb))
            .await
    }

    async fn set(&self, verb: Verb, value: impl std::fmt::Display) -> bool {
        let zone = zone_segment(verb, self.zone_id);
        let payload = self
            .channel
            .send_command(Command::set(self.system_id, zone, verb, value))
            .await;
        payload.as_deref() == Some(ACK)
    }

    async fn query_temperature(&self, verb: Verb) -> Option<u32> {
        let payload = self.query(verb).await?;
        decode_temperature(&payload).ok()
    }

    /// Read the current room temperature
    pub async fn read_current_temperature(&self) -> Option<u32> {
        self.query_temperature(Verb::CurrentTemp).await
    }

    /// Read the cooling setpoint
    pub async fn read_cooling_setpoint(&self) -> Option<u32> {
        self.query_temperature(Verb::CoolSetpoint).await
    }

    /// Set the cooling setpoint
    pub async fn set_cooling_setpoint(&self, temperature: u32) -> bool {
        self.set(Verb::CoolSetpoint, temperature).await
    }

    /// Read the heating setpoint
    pub async fn read_heating_setpoint(&self) -> Option<u32> {
        self.query_temperature(Verb::HeatSetpoint).await
    }

    /// Set the heating setpoint
    pub async fn set_heating_setpoint(&self, temperature: u32) -> bool {
        self.set(Verb::HeatSetpoint, temperature).await
    }

    /// Read the system mode and whether the system is actively running
    pub async fn read_hvac_mode(&self) -> Option<ModeReading> {
        let payload = self.query(Verb::Mode).await?;
        match decode_mode(&payload) {
            Ok(reading) => Some(reading),
            Err(e) => {
                warn!("unparseable mode: {}", e);
                None
            }
        }
    }

    /// Set the system mode
    ///
    /// Accepts the caller-facing `heat_cool` alias for the device's `AUTO`
    /// token; everything is upper-cased before transmission.
    pub async fn set_hvac_mode(&self, hvac_mode: &str) -> bool {
        let token = if hvac_mode == "heat_cool" {
            "AUTO".to_string()
        } else {
            hvac_mode.to_uppercase()
        };
        self.set(Verb::Mode, token).await
    }

    /// Read the fan mode
    pub async fn read_fan_mode(&self) -> Option<String> {
        self.query(Verb::Fan).await
    }

    /// Set the fan mode
    pub async fn set_fan_mode(&self, fan_mode: &str) -> bool {
        self.set(Verb::Fan, fan_mode.to_uppercase()).await
    }

    /// Read the zone's display name
    pub async fn read_zone_name(&self) -> Option<String> {
        self.query(Verb::Name).await
    }
}

/// MODE is a system-wide parameter; its commands carry no zone segment
fn zone_segment(verb: Verb, zone_id: u8) -> Option<u8> {
    match verb {
        Verb::Mode => None,
        _ => Some(zone_id),
    }
}
