//! Payload decoders for temperature and mode replies
//!
//! The device reports temperatures as a number followed by a unit letter
//! (`72F`), sometimes still carrying the degree decoration when a transport
//! has not stripped it (`75øF`). Mode replies are a bare token when the
//! system is idle (`HEAT`) or a token and an active stage count when it is
//! running (`COOL 1`).

use crate::error::DecodeError;

/// A decoded mode reply: the mode token and whether the system is running
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ModeReading {
    /// Reported mode token, e.g. `HEAT`, `COOL`, `AUTO`, `OFF`
    pub mode: String,
    /// True when the reply carries an active stage count
    pub active: bool,
}

/// Decode a temperature payload by taking the leading run of digits
///
/// `72F` and `75øF` both decode to their leading integer; a payload with no
/// leading digit does not decode.
pub fn decode_temperature(payload: &str) -> Result<u32, DecodeError> {
    let digits_end = payload
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(payload.len());
    if digits_end == 0 {
        return Err(DecodeError::MissingDigits(payload.to_string()));
    }
    payload[..digits_end]
        .parse::<u32>()
        .map_err(|_| DecodeError::TemperatureOutOfRange(payload.to_string()))
}

/// Decode a mode payload into the mode token and activity flag
///
/// The token is the leading run of uppercase letters; the system counts as
/// active when a stage digit follows the token.
pub fn decode_mode(payload: &str) -> Result<ModeReading, DecodeError> {
    let token_end = payload
        .find(|c: char| !c.is_ascii_uppercase())
        .unwrap_or(payload.len());
    if token_end == 0 {
        return Err(DecodeError::InvalidMode(payload.to_string()));
    }
    let stages = payload[token_end..].trim_start_matches(' ');
    Ok(ModeReading {
        mode: payload[..token_end].to_string(),
        active: stages.chars().next().is_some_and(|c| c.is_ascii_digit()),
    })
}
