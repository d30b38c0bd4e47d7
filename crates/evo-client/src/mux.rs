//! Command multiplexer for a shared Evolution device
//!
//! Many zone clients may address the same physical device, but the SAM
//! answers exactly one command at a time. The multiplexer owns the device
//! connection, queues submitted commands, and runs one write/read exchange
//! at a time against the wire, retrying failed attempts before resolving
//! the command as absent.
//!
//! Queued writes are serviced ahead of queued reads; within each class the
//! order is first-in, first-out. A submitted command always resolves, to
//! either the reply payload or `None`.
//!
//! # Virtual Device Support
//!
//! The multiplexer is generic over its I/O type. Tests connect it to a
//! `DuplexStream` from `tokio::io::duplex()` served by a simulated device.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use evo_protocol::{Command, Response};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::{oneshot, Mutex};
use tokio::time::timeout;
use tokio_serial::SerialStream;
use tracing::{debug, warn};

use crate::connection::DeviceConnection;
use crate::error::ClientError;

/// Configuration for the command multiplexer
#[derive(Debug, Clone)]
pub struct MuxConfig {
    /// How long to wait for the reply to one attempt
    pub reply_timeout: Duration,
    /// Physical exchange attempts per command before giving up
    pub attempts: u32,
}

impl Default for MuxConfig {
    fn default() -> Self {
        Self {
            // The device promises a reply within about five seconds
            reply_timeout: Duration::from_secs(6),
            attempts: 3,
        }
    }
}

/// A queued command and the slot its result is delivered through
struct PendingEntry {
    command: Command,
    completion: oneshot::Sender<Option<String>>,
}

/// Queue state guarded by one lock
///
/// `in_flight` is the sole drain guard: it is claimed under this lock when
/// a drain task is spawned and released under it only after both queues
/// have been observed empty.
struct CommandQueues {
    writes: VecDeque<PendingEntry>,
    reads: VecDeque<PendingEntry>,
    in_flight: bool,
}

struct MuxInner<T> {
    queues: Mutex<CommandQueues>,
    link: Mutex<DeviceConnection<T>>,
    config: MuxConfig,
}

/// Shared multiplexer handle for one physical device
///
/// Cloning is cheap; every clone drives the same queues and connection.
pub struct CommandMux<T> {
    inner: Arc<MuxInner<T>>,
}

impl<T> Clone for CommandMux<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl CommandMux<SerialStream> {
    /// Open the serial device at `path` and wrap it in a multiplexer
    pub fn open(path: &str) -> Result<Self, ClientError> {
        Self::open_with_config(path, MuxConfig::default())
    }

    /// Open a serial device with a custom configuration
    pub fn open_with_config(path: &str, config: MuxConfig) -> Result<Self, ClientError> {
        let connection = DeviceConnection::open(path)?;
        Ok(Self::from_connection(connection, config))
    }
}

impl<T> CommandMux<T>
where
    T: AsyncRead + AsyncWrite + Send + Unpin + 'static,
{
    /// Wrap an already-open byte stream with the default configuration
    pub fn new(io: T) -> Self {
        Self::with_config(io, MuxConfig::default())
    }

    /// Wrap an already-open byte stream with a custom configuration
    pub fn with_config(io: T, config: MuxConfig) -> Self {
        Self::from_connection(DeviceConnection::new(io), config)
    }

    fn from_connection(connection: DeviceConnection<T>, config: MuxConfig) -> Self {
        Self {
            inner: Arc::new(MuxInner {
                queues: Mutex::new(CommandQueues {
                    writes: VecDeque::new(),
                    reads: VecDeque::new(),
                    in_flight: false,
                }),
                link: Mutex::new(connection),
                config,
            }),
        }
    }

    /// Submit one command and wait for its payload
    ///
    /// Resolves to the payload after the `:` separator of an accepted
    /// reply, or to `None` when every attempt failed or the accepted reply
    /// had no separator. Never returns an error: interpretation of an
    /// absent result belongs to the caller.
    pub async fn submit(&self, command: Command) -> Option<String> {
        debug!("submitting {}", command);
        let completion = self.enqueue(command).await;
        match completion.await {
            Ok(result) => result,
            Err(_) => None,
        }
    }

    /// Queue a command, starting a drain task if none is running
    async fn enqueue(&self, command: Command) -> oneshot::Receiver<Option<String>> {
        let (tx, rx) = oneshot::channel();
        let entry = PendingEntry {
            command,
            completion: tx,
        };

        let mut queues = self.inner.queues.lock().await;
        if entry.command.is_write() {
            queues.writes.push_back(entry);
        } else {
            queues.reads.push_back(entry);
        }
        if !queues.in_flight {
            queues.in_flight = true;
            tokio::spawn(Arc::clone(&self.inner).drain());
        }
        rx
    }

    /// Whether `other` drives the same physical device as `self`
    pub fn shares_device(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<T> MuxInner<T>
where
    T: AsyncRead + AsyncWrite + Send + Unpin + 'static,
{
    /// Process queued commands until both queues are empty
    async fn drain(self: Arc<Self>) {
        loop {
            let entry = {
                let mut queues = self.queues.lock().await;
                // Writes jump any queued reads
                let next = match queues.writes.pop_front() {
                    Some(entry) => Some(entry),
                    None => queues.reads.pop_front(),
                };
                match next {
                    Some(entry) => entry,
                    None => {
                        queues.in_flight = false;
                        return;
                    }
                }
            };

            let result = self.exchange(&entry.command).await;
            // The submitter may have gone away; the exchange still ran
            let _ = entry.completion.send(result);
        }
    }

    /// Run one command against the device, retrying failed attempts
    async fn exchange(&self, command: &Command) -> Option<String> {
        let attempts = self.config.attempts;
        let mut link = self.link.lock().await;

        for attempt in 1..=attempts {
            if let Err(e) = link.write_line(command.as_str()).await {
                warn!(
                    "write failed on attempt {}/{} for {}: {}",
                    attempt, attempts, command, e
                );
                continue;
            }

            match timeout(self.config.reply_timeout, link.read_line()).await {
                Ok(Ok(line)) => {
                    if command.accepts_reply(&line) {
                        debug!("{} answered {}", command, line);
                        return match Response::parse(&line) {
                            Ok(reply) => Some(reply.into_payload()),
                            Err(e) => {
                                warn!("accepted reply to {} has no payload: {}", command, e);
                                None
                            }
                        };
                    }
                    warn!(
                        "rejected reply on attempt {}/{} for {}: {}",
                        attempt, attempts, command, line
                    );
                }
                Ok(Err(e)) => {
                    warn!(
                        "read failed on attempt {}/{} for {}: {}",
                        attempt, attempts, command, e
                    );
                }
                Err(_) => {
                    warn!(
                        "no reply within {:?} on attempt {}/{} for {}",
                        self.config.reply_timeout, attempt, attempts, command
                    );
                }
            }
        }

        warn!("giving up on {} after {} attempts", command, attempts);
        None
    }
}

#[cfg(test)]
mod tests {
    use super::{CommandMux, MuxConfig};
    use evo_protocol::Command;
    use std::time::{Duration, Instant};
    use tokio::io::{
        AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream, ReadHalf, WriteHalf,
    };
    use tokio::time::timeout;

    type DeviceEnd = (BufReader<ReadHalf<DuplexStream>>, WriteHalf<DuplexStream>);

    fn mux_pair() -> (CommandMux<DuplexStream>, DeviceEnd) {
        let (near, far) = tokio::io::duplex(1024);
        let (device_rx, device_tx) = tokio::io::split(far);
        (CommandMux::new(near), (BufReader::new(device_rx), device_tx))
    }

    /// Extract the echo prefix of a received command line
    fn prefix_of(command: &str) -> String {
        command
            .chars()
            .take_while(|&c| c != '?' && c != '!')
            .collect()
    }

    #[test]
    fn test_default_config() {
        let config = MuxConfig::default();
        assert_eq!(config.reply_timeout, Duration::from_secs(6));
        assert_eq!(config.attempts, 3);
    }

    #[tokio::test]
    async fn test_submit_returns_payload() {
        let (mux, (mut device_rx, mut device_tx)) = mux_pair();

        let (result, _) = tokio::join!(mux.submit(Command::raw("S1Z1RT?")), async {
            let mut line = String::new();
            device_rx.read_line(&mut line).await.unwrap();
            assert_eq!(line, "S1Z1RT?\n");
            device_tx.write_all(b"S1Z1RT:72F\n").await.unwrap();
        });

        assert_eq!(result, Some("72F".to_string()));
    }

    #[tokio::test]
    async fn test_retries_after_nak_reply() {
        let (mux, (mut device_rx, mut device_tx)) = mux_pair();

        let (result, _) = tokio::join!(mux.submit(Command::raw("S1Z1FAN?")), async {
            let mut line = String::new();
            device_rx.read_line(&mut line).await.unwrap();
            device_tx.write_all(b"S1Z1FAN:NAK\n").await.unwrap();

            line.clear();
            device_rx.read_line(&mut line).await.unwrap();
            assert_eq!(line, "S1Z1FAN?\n");
            device_tx.write_all(b"S1Z1FAN:AUTO\n").await.unwrap();
        });

        assert_eq!(result, Some("AUTO".to_string()));
    }

    #[tokio::test]
    async fn test_retries_after_prefix_mismatch() {
        let (mux, (mut device_rx, mut device_tx)) = mux_pair();

        let (result, _) = tokio::join!(mux.submit(Command::raw("S1Z1RT?")), async {
            let mut line = String::new();
            device_rx.read_line(&mut line).await.unwrap();
            // Stale reply from an earlier exchange
            device_tx.write_all(b"S2MODE:COOL\n").await.unwrap();

            line.clear();
            device_rx.read_line(&mut line).await.unwrap();
            device_tx.write_all(b"S1Z1RT:68F\n").await.unwrap();
        });

        assert_eq!(result, Some("68F".to_string()));
    }

    #[tokio::test]
    async fn test_gives_up_after_three_attempts() {
        let (mux, (mut device_rx, mut device_tx)) = mux_pair();

        let (result, seen) = tokio::join!(mux.submit(Command::raw("S1Z1RT?")), async {
            let mut seen = 0u32;
            let mut line = String::new();
            for _ in 0..3 {
                line.clear();
                device_rx.read_line(&mut line).await.unwrap();
                assert_eq!(line, "S1Z1RT?\n");
                seen += 1;
                device_tx.write_all(b"S1Z1RT:NAK\n").await.unwrap();
            }
            seen
        });

        assert_eq!(result, None);
        assert_eq!(seen, 3);

        // No fourth attempt shows up after the command resolved
        let mut line = String::new();
        let extra = timeout(Duration::from_millis(50), device_rx.read_line(&mut line)).await;
        assert!(extra.is_err());
    }

    #[tokio::test]
    async fn test_reply_without_separator_resolves_absent() {
        let (mux, (mut device_rx, mut device_tx)) = mux_pair();

        let (result, _) = tokio::join!(mux.submit(Command::raw("S1Z1RT?")), async {
            let mut line = String::new();
            device_rx.read_line(&mut line).await.unwrap();
            device_tx.write_all(b"S1Z1RT72F\n").await.unwrap();
        });

        assert_eq!(result, None);

        // The malformed reply was accepted, so it is not retried
        let mut line = String::new();
        let extra = timeout(Duration::from_millis(50), device_rx.read_line(&mut line)).await;
        assert!(extra.is_err());
    }

    #[tokio::test]
    async fn test_timeout_resolves_absent_within_bound() {
        let (near, _device) = tokio::io::duplex(1024);
        let config = MuxConfig {
            reply_timeout: Duration::from_millis(50),
            attempts: 3,
        };
        let mux = CommandMux::with_config(near, config);

        let started = Instant::now();
        let result = mux.submit(Command::raw("S1Z1RT?")).await;

        assert_eq!(result, None);
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_writes_jump_queued_reads() {
        let (mux, (mut device_rx, mut device_tx)) = mux_pair();

        // All three are queued before the drain task gets to run
        let first_read = mux.enqueue(Command::raw("S1Z1RT?")).await;
        let second_read = mux.enqueue(Command::raw("S1Z2RT?")).await;
        let write = mux.enqueue(Command::raw("S1Z1CLSP!70")).await;

        let mut order = Vec::new();
        for _ in 0..3 {
            let mut line = String::new();
            device_rx.read_line(&mut line).await.unwrap();
            let command = line.trim().to_string();
            let reply = format!("{}:OK\n", prefix_of(&command));
            device_tx.write_all(reply.as_bytes()).await.unwrap();
            order.push(command);
        }

        assert_eq!(order, vec!["S1Z1CLSP!70", "S1Z1RT?", "S1Z2RT?"]);
        assert_eq!(write.await.unwrap(), Some("OK".to_string()));
        assert_eq!(first_read.await.unwrap(), Some("OK".to_string()));
        assert_eq!(second_read.await.unwrap(), Some("OK".to_string()));
    }

    #[tokio::test]
    async fn test_write_submitted_mid_exchange_runs_next() {
        let (mux, (mut device_rx, mut device_tx)) = mux_pair();

        // Start a read and hold its reply so it stays mid-exchange
        let blocked = mux.enqueue(Command::raw("S1Z1RT?")).await;
        let mut line = String::new();
        device_rx.read_line(&mut line).await.unwrap();
        assert_eq!(line.trim(), "S1Z1RT?");

        // Queue another read, then a write, while the first read is in flight
        let queued_read = mux.enqueue(Command::raw("S1Z2RT?")).await;
        let write = mux.enqueue(Command::raw("S1MODE!COOL")).await;

        // Release the held reply, then serve the rest in arrival order
        device_tx.write_all(b"S1Z1RT:72F\n").await.unwrap();
        let mut order = Vec::new();
        for _ in 0..2 {
            line.clear();
            device_rx.read_line(&mut line).await.unwrap();
            let command = line.trim().to_string();
            let reply = format!("{}:OK\n", prefix_of(&command));
            device_tx.write_all(reply.as_bytes()).await.unwrap();
            order.push(command);
        }

        // The later write overtakes the earlier queued read
        assert_eq!(order, vec!["S1MODE!COOL", "S1Z2RT?"]);
        assert_eq!(blocked.await.unwrap(), Some("72F".to_string()));
        assert_eq!(write.await.unwrap(), Some("OK".to_string()));
        assert_eq!(queued_read.await.unwrap(), Some("OK".to_string()));
    }

    #[tokio::test]
    async fn test_clones_share_the_device() {
        let (mux, _device) = mux_pair();
        let clone = mux.clone();
        let (other, _other_device) = mux_pair();

        assert!(mux.shares_device(&clone));
        assert!(!mux.shares_device(&other));
    }
}
