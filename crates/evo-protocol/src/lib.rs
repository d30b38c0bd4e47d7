//! Evolution SAM Protocol Library
//!
//! Parsing and encoding for the ASCII command language spoken by the
//! Evolution SAM (System Access Module) over its serial port and, through
//! the HTTP relay, over the network.
//!
//! # Format
//!
//! - Commands: `S<system>[Z<zone>]<VERB>` followed by `?` (read) or
//!   `!<value>` (write). E.g. `S1Z1RT?`, `S1Z1CLSP!72`, `S1MODE!COOL`.
//! - Replies: the echoed command prefix, `:`, then the payload.
//!   E.g. `S1Z1RT:72F`, `S1Z1CLSP:ACK`, `S1Z9NAME:NAK`.
//! - `MODE` is system-wide; the other verbs address a zone.
//!
//! The device acknowledges accepted writes with `ACK` and rejects commands
//! it does not understand with `NAK`.
//!
//! # Example
//!
//! ```rust
//! use evo_protocol::{decode_temperature, Command, Response, Verb};
//!
//! let cmd = Command::query(1, Some(1), Verb::CurrentTemp);
//! assert_eq!(cmd.as_str(), "S1Z1RT?");
//!
//! assert!(cmd.accepts_reply("S1Z1RT:72F"));
//! let reply = Response::parse("S1Z1RT:72F").unwrap();
//! assert_eq!(decode_temperature(reply.payload()), Ok(72));
//! ```

pub mod command;
pub mod decode;
pub mod error;
pub mod response;

pub use command::{Command, Verb};
pub use decode::{decode_mode, decode_temperature, ModeReading};
pub use error::{DecodeError, ParseError};
pub use response::Response;

/// Positive acknowledgment payload for accepted writes
pub const ACK: &str = "ACK";

/// Negative acknowledgment payload for rejected commands
pub const NAK: &str = "NAK";
