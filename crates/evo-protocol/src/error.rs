//! Error types for protocol parsing and decoding

use thiserror::Error;

/// Errors from splitting a raw reply line
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Reply line has no `:` separator
    #[error("missing ':' separator in reply: {0}")]
    MissingSeparator(String),
}

/// Errors from decoding typed payload values
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Temperature payload has no leading digits
    #[error("no leading digits in temperature payload: {0}")]
    MissingDigits(String),

    /// Temperature digit run does not fit the value type
    #[error("temperature value out of range: {0}")]
    TemperatureOutOfRange(String),

    /// Mode payload has no leading mode token
    #[error("unparseable mode payload: {0}")]
    InvalidMode(String),
}
