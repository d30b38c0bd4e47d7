//! Virtual SAM module simulation
//!
//! Keeps a table of parameter values keyed by command prefix and answers
//! reads and writes the way the hardware does: reads echo the prefix and the
//! stored value, writes update the table and answer `ACK`, and unknown reads
//! answer `NAK`. Temperature values carry the device's raw `0xF8` degree
//! byte so clients exercise their sanitization path.

use std::collections::HashMap;

use evo_protocol::{ACK, NAK};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::debug;

/// The extended-ASCII degree symbol the device embeds in temperatures
const DEGREE: u8 = 0xF8;

/// A simulated SAM module with a keyed parameter table
#[derive(Debug, Clone)]
pub struct VirtualSam {
    state: HashMap<String, Vec<u8>>,
}

impl VirtualSam {
    /// Create a simulator seeded with a two-system fixture
    pub fn new() -> Self {
        let mut state = HashMap::new();
        state.insert("S1Z1RT".to_string(), vec![b'7', b'2', DEGREE, b'F']);
        state.insert("S1Z1FAN".to_string(), b"AUTO".to_vec());
        state.insert("S1MODE".to_string(), b"HEAT".to_vec());
        state.insert("S1Z1CLSP".to_string(), vec![b'7', b'5', DEGREE, b'F']);
        state.insert("S1Z1HTSP".to_string(), vec![b'7', b'0', DEGREE, b'F']);
        state.insert("S2MODE".to_string(), b"COOL 1".to_vec());
        state.insert("S2Z2CLSP".to_string(), vec![b'6', b'0', DEGREE, b'F']);
        Self { state }
    }

    /// Store a parameter value, replacing any previous one
    pub fn set(&mut self, key: impl Into<String>, value: impl AsRef<[u8]>) {
        self.state.insert(key.into(), value.as_ref().to_vec());
    }

    /// Look up a stored parameter value
    pub fn get(&self, key: &str) -> Option<&[u8]> {
        self.state.get(key).map(Vec::as_slice)
    }

    /// Answer one command line with the raw reply bytes (no terminator)
    pub fn process_command(&mut self, line: &str) -> Vec<u8> {
        if let Some((key, value)) = line.split_once('!') {
            // Write: update the table and acknowledge. Setpoints get the
            // degree suffix appended, as the hardware stores them.
            let mut stored = value.as_bytes().to_vec();
            if key.ends_with("SP") {
                stored.push(DEGREE);
                stored.push(b'F');
            }
            self.state.insert(key.to_string(), stored);
            return format!("{}:{}", key, ACK).into_bytes();
        }

        let key = match line.split_once('?') {
            Some((key, _)) => key,
            None => line,
        };
        match self.state.get(key) {
            Some(value) => {
                let mut reply = key.as_bytes().to_vec();
                reply.push(b':');
                reply.extend_from_slice(value);
                reply
            }
            None => format!("{}:{}", key, NAK).into_bytes(),
        }
    }

    /// Serve the line protocol over a duplex byte stream until EOF
    ///
    /// Reads newline-terminated commands, answers each with
    /// [`VirtualSam::process_command`], and appends the terminator. Intended
    /// for `tokio::io::duplex` ends in tests or a pty during development.
    pub async fn serve<T>(mut self, io: T)
    where
        T: AsyncRead + AsyncWrite + Unpin,
    {
        let (read_half, mut write_half) = tokio::io::split(io);
        let mut reader = BufReader::new(read_half);
        let mut raw = Vec::new();

        loop {
            raw.clear();
            match reader.read_until(b'\n', &mut raw).await {
                Ok(0) => {
                    debug!("virtual SAM stream closed");
                    return;
                }
                Ok(_) => {}
                Err(e) => {
                    debug!("virtual SAM read error: {}", e);
                    return;
                }
            }

            let line = String::from_utf8_lossy(&raw);
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            debug!("virtual SAM command: {}", line);

            let mut reply = self.process_command(line);
            reply.push(b'\n');
            if let Err(e) = write_half.write_all(&reply).await {
                debug!("virtual SAM write error: {}", e);
                return;
            }
            if let Err(e) = write_half.flush().await {
                debug!("virtual SAM flush error: {}", e);
                return;
            }
        }
    }
}

impl Default for VirtualSam {
    fn default() -> Self {
        Self::new()
    }
}
