//! Shared multiplexer registry
//!
//! All zone clients addressing the same physical device must drive the same
//! multiplexer, or their exchanges would interleave on the wire. The
//! registry keys multiplexers by device identity (the serial path) and
//! guarantees at-most-once construction per identity: the placeholder cell
//! is published under the map lock before any opening work happens, so
//! concurrent first-time callers wait on the same cell instead of racing to
//! open the device twice. If an initializer fails, that caller gets the
//! error and the next caller re-attempts.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, OnceLock};

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::{Mutex, OnceCell};
use tokio_serial::SerialStream;
use tracing::info;

use crate::error::ClientError;
use crate::mux::CommandMux;

/// Map from device identity to its shared multiplexer
pub struct DeviceRegistry<T> {
    devices: Mutex<HashMap<String, Arc<OnceCell<CommandMux<T>>>>>,
}

impl<T> DeviceRegistry<T>
where
    T: AsyncRead + AsyncWrite + Send + Unpin + 'static,
{
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            devices: Mutex::new(HashMap::new()),
        }
    }

    /// Get the multiplexer for `identity`, constructing it with `init` if
    /// this is the first (successful) call for that identity
    ///
    /// Concurrent callers for one identity share a single initializer run;
    /// all of them receive clones of the same multiplexer.
    pub async fn get_or_create<F, Fut>(
        &self,
        identity: &str,
        init: F,
    ) -> Result<CommandMux<T>, ClientError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<CommandMux<T>, ClientError>>,
    {
        let cell = {
            let mut devices = self.devices.lock().await;
            Arc::clone(
                devices
                    .entry(identity.to_string())
                    .or_insert_with(|| Arc::new(OnceCell::new())),
            )
        };

        let mux = cell
            .get_or_try_init(|| async {
                info!("opening shared device {}", identity);
                init().await
            })
            .await?;
        Ok(mux.clone())
    }
}

impl<T> Default for DeviceRegistry<T>
where
    T: AsyncRead + AsyncWrite + Send + Unpin + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

static SERIAL_REGISTRY: OnceLock<DeviceRegistry<SerialStream>> = OnceLock::new();

/// The process-wide registry of serial devices
pub fn serial_registry() -> &'static DeviceRegistry<SerialStream> {
    SERIAL_REGISTRY.get_or_init(DeviceRegistry::new)
}

/// Get the shared multiplexer for the serial device at `path`, opening it
/// on first use
pub async fn shared_serial_mux(path: &str) -> Result<CommandMux<SerialStream>, ClientError> {
    serial_registry()
        .get_or_create(path, || async { CommandMux::open(path) })
        .await
}
