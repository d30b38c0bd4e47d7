//! Error types for the client

use thiserror::Error;

/// Errors that can occur while setting up a device connection
///
/// Per-command failures never surface here; the multiplexer and the zone
/// clients resolve those to absent values instead.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Serial device could not be opened
    #[error("failed to open {path}: {source}")]
    OpenDevice {
        /// Path of the device that failed to open
        path: String,
        /// Underlying serial error
        source: tokio_serial::Error,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
