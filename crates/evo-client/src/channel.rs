//! Transport-agnostic command submission
//!
//! The zone clients and the zone enumerator only need one capability from a
//! transport: send a command, get back its payload or nothing. Both the
//! serial [`CommandMux`](crate::mux::CommandMux) and the HTTP
//! [`RelayClient`](crate::relay::RelayClient) provide it through this trait,
//! so the typed layer is written once and runs over either.

use std::sync::Arc;

use async_trait::async_trait;
use evo_protocol::Command;
use tokio::io::{AsyncRead, AsyncWrite};

use crate::mux::CommandMux;

/// A channel that can carry one command to the device and return its payload
///
/// Resolves to the reply payload, or `None` when the exchange failed. Per
/// the client's error policy, implementations never surface per-command
/// failures as errors.
#[async_trait]
pub trait CommandChannel: Send + Sync {
    /// Send one command and wait for its payload
    async fn send_command(&self, command: Command) -> Option<String>;
}

#[async_trait]
impl<T> CommandChannel for CommandMux<T>
where
    T: AsyncRead + AsyncWrite + Send + Unpin + 'static,
{
    async fn send_command(&self, command: Command) -> Option<String> {
        self.submit(command).await
    }
}

#[async_trait]
impl<C> CommandChannel for Arc<C>
where
    C: CommandChannel + ?Sized,
{
    async fn send_command(&self, command: Command) -> Option<String> {
        (**self).send_command(command).await
    }
}
