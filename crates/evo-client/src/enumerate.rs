//! Zone discovery
//!
//! The SAM has no zone directory; the only way to learn which zones exist
//! is to ask each candidate zone for its name and see which ones answer.
//! A zone that answers a `NAME?` read exists; one whose read resolves
//! absent does not.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::channel::CommandChannel;
use crate::endpoint::ZoneClient;
use crate::error::ClientError;
use crate::registry::shared_serial_mux;

/// Highest zone id a system can carry
pub const MAX_ZONES: u8 = 8;

/// A discovered zone
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneInfo {
    /// System the zone belongs to
    pub system_id: u8,
    /// Zone id within the system
    pub zone_id: u8,
    /// Display name reported by the device
    pub name: String,
}

/// Probe every candidate zone of `system_id` over `channel`
///
/// Returns the zones that answered a name read, in ascending zone-id order.
/// Results are never cached; each call probes the device afresh.
pub async fn enumerate_zones<C>(channel: &C, system_id: u8) -> Vec<ZoneInfo>
where
    C: CommandChannel + Clone,
{
    let mut zones = Vec::new();
    for zone_id in 1..=MAX_ZONES {
        let endpoint = ZoneClient::new(system_id, zone_id, channel.clone());
        match endpoint.read_zone_name().await {
            Some(name) => zones.push(ZoneInfo {
                system_id,
                zone_id,
                name,
            }),
            None => debug!("system {} zone {} did not answer", system_id, zone_id),
        }
    }
    zones
}

/// Probe the zones of `system_id` on the serial device at `path`
///
/// Uses the process-wide registry, so probing shares the multiplexer with
/// any zone clients already open on the same device.
pub async fn enumerate_serial_zones(
    system_id: u8,
    path: &str,
) -> Result<Vec<ZoneInfo>, ClientError> {
    let mux = shared_serial_mux(path).await?;
    Ok(enumerate_zones(&mux, system_id).await)
}
