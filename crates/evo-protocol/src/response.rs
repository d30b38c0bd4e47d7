//! Reply parsing for the SAM command language
//!
//! # Format
//! A reply echoes the command prefix, then `:`, then the payload:
//! `S1Z1RT:72F`, `S1Z1CLSP:ACK`, `S1Z9NAME:NAK`. The split is on the first
//! colon, so payloads may themselves contain colons.

use tracing::warn;

use crate::error::ParseError;

/// A parsed `PREFIX:PAYLOAD` reply line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    echoed: String,
    payload: String,
}

impl Response {
    /// Split a raw reply line into its echoed prefix and payload
    pub fn parse(line: &str) -> Result<Self, ParseError> {
        let (echoed, payload) = line.split_once(':').ok_or_else(|| {
            warn!("unparseable reply: {}", line);
            ParseError::MissingSeparator(line.to_string())
        })?;
        Ok(Self {
            echoed: echoed.to_string(),
            payload: payload.to_string(),
        })
    }

    /// The echoed command prefix
    pub fn echoed(&self) -> &str {
        &self.echoed
    }

    /// The payload following the separator
    pub fn payload(&self) -> &str {
        &self.payload
    }

    /// Consume the reply, keeping only the payload
    pub fn into_payload(self) -> String {
        self.payload
    }

    /// Whether the payload is the positive acknowledgment
    pub fn is_ack(&self) -> bool {
        self.payload == crate::ACK
    }
}
