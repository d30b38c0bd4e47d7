//! Evolution SAM Client Library
//!
//! This crate provides the client side of the Evolution command protocol:
//! line-oriented connections, the command multiplexer that shares one
//! physical device among many zone clients, typed per-zone reads and sets,
//! and zone discovery. Two transports are supported: a directly-attached
//! serial port and the HTTP relay.
//!
//! # Architecture
//!
//! The SAM answers one command at a time, so everything funnels through a
//! [`CommandMux`]: zone clients submit command strings, the multiplexer
//! queues them (writes ahead of reads), runs one exchange at a time with
//! retries, and routes each reply back to its submitter. Multiplexers are
//! shared per device path through a process-wide [`DeviceRegistry`], so any
//! number of zone clients can address the same serial port safely.
//!
//! Per-command failures resolve to `None` rather than errors; callers
//! branch on presence, not on fault types. Hard errors are reserved for
//! opening the device.
//!
//! # Example
//!
//! ```rust,no_run
//! use evo_client::ZoneClient;
//!
//! # async fn demo() -> Result<(), evo_client::ClientError> {
//! let client = ZoneClient::open(1, 1, "/dev/ttyUSB0").await?;
//! if let Some(temperature) = client.read_current_temperature().await {
//!     println!("currently {}F", temperature);
//! }
//! # Ok(())
//! # }
//! ```

pub mod channel;
pub mod connection;
pub mod endpoint;
pub mod enumerate;
pub mod error;
pub mod mux;
pub mod registry;
pub mod relay;

pub use channel::CommandChannel;
pub use connection::DeviceConnection;
pub use endpoint::ZoneClient;
pub use enumerate::{enumerate_serial_zones, enumerate_zones, ZoneInfo, MAX_ZONES};
pub use error::ClientError;
pub use mux::{CommandMux, MuxConfig};
pub use registry::{serial_registry, shared_serial_mux, DeviceRegistry};
pub use relay::RelayClient;
