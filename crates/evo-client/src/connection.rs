//! Line-oriented device connections
//!
//! Wraps a byte stream in the line discipline the SAM speaks: newline
//! terminated ASCII commands and replies. The device decorates temperature
//! replies with an extended-ASCII degree byte that is not valid UTF-8;
//! incoming lines are sanitized so the rest of the client only ever sees
//! clean strings. Replies arrive as the next non-empty line and blank
//! lines on the wire are skipped.

use std::io::ErrorKind;
use std::time::Duration;

use tokio::io::{
    AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, ReadHalf, WriteHalf,
};
use tokio_serial::{SerialPortBuilderExt, SerialStream};
use tracing::trace;

use crate::error::ClientError;

/// Line speed of the SAM serial port (8N1 framing, the port defaults)
pub const BAUD_RATE: u32 = 9600;

/// Buffered line I/O over one device stream
///
/// Generic over the I/O type to support both real serial ports and virtual
/// devices. For virtual devices, use `DuplexStream` from
/// `tokio::io::duplex()`.
pub struct DeviceConnection<T> {
    reader: BufReader<ReadHalf<T>>,
    writer: WriteHalf<T>,
    raw: Vec<u8>,
}

impl DeviceConnection<SerialStream> {
    /// Open the serial device at `path`
    pub fn open(path: &str) -> Result<Self, ClientError> {
        let stream = tokio_serial::new(path, BAUD_RATE)
            .timeout(Duration::from_millis(100))
            .open_native_async()
            .map_err(|source| ClientError::OpenDevice {
                path: path.to_string(),
                source,
            })?;
        Ok(Self::new(stream))
    }
}

impl<T> DeviceConnection<T>
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    /// Wrap an already-open byte stream
    pub fn new(io: T) -> Self {
        let (reader, writer) = tokio::io::split(io);
        Self {
            reader: BufReader::new(reader),
            writer,
            raw: Vec::new(),
        }
    }

    /// Send one command line, appending the terminator
    pub async fn write_line(&mut self, line: &str) -> Result<(), std::io::Error> {
        trace!("sent {}", line);
        self.writer.write_all(line.as_bytes()).await?;
        self.writer.write_all(b"\n").await?;
        self.writer.flush().await
    }

    /// Read the next non-empty line from the device
    ///
    /// Bytes that do not decode as UTF-8 (the degree decoration) are
    /// dropped before the line is trimmed.
    pub async fn read_line(&mut self) -> Result<String, std::io::Error> {
        loop {
            self.raw.clear();
            let n = self.reader.read_until(b'\n', &mut self.raw).await?;
            if n == 0 {
                return Err(std::io::Error::new(
                    ErrorKind::UnexpectedEof,
                    "device stream closed",
                ));
            }
            let sanitized: String = String::from_utf8_lossy(&self.raw)
                .chars()
                .filter(|&c| c != char::REPLACEMENT_CHARACTER)
                .collect();
            let line = sanitized.trim();
            if !line.is_empty() {
                trace!("received {}", line);
                return Ok(line.to_string());
            }
        }
    }
}
