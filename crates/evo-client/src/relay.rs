//! HTTP relay transport
//!
//! The relay is a small service running on the host the SAM is wired to. It
//! accepts a raw command string in a POST body, runs the serial exchange
//! itself (including retries), and answers with a JSON object carrying the
//! reply payload. HTTP or decode errors resolve to an absent result with no
//! client-side retry.

use async_trait::async_trait;
use evo_protocol::Command;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::channel::CommandChannel;

/// TCP port the relay listens on
pub const RELAY_PORT: u16 = 8080;

/// Body of a relay reply
#[derive(Debug, Deserialize)]
struct RelayReply {
    response: String,
}

/// Client for a SAM reachable through the HTTP relay
///
/// Cloning is cheap; clones share one connection pool.
#[derive(Debug, Clone)]
pub struct RelayClient {
    url: String,
    http: reqwest::Client,
}

impl RelayClient {
    /// Create a client for the relay running on `host`
    pub fn new(host: &str) -> Self {
        Self::with_url(format!("http://{}:{}/command", host, RELAY_PORT))
    }

    /// Create a client posting to an explicit command endpoint URL
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            http: reqwest::Client::new(),
        }
    }

    /// The command endpoint this client posts to
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Post one command to the relay and return the reply payload
    pub async fn send(&self, command: &Command) -> Option<String> {
        debug!("posting {} to {}", command, self.url);
        let result = async {
            let resp = self
                .http
                .post(&self.url)
                .body(command.as_str().to_string())
                .send()
                .await?
                .error_for_status()?;
            resp.json::<RelayReply>().await
        }
        .await;

        match result {
            Ok(reply) => Some(reply.response.trim().to_string()),
            Err(e) => {
                warn!("relay request for {} failed: {}", command, e);
                None
            }
        }
    }
}

#[async_trait]
impl CommandChannel for RelayClient {
    async fn send_command(&self, command: Command) -> Option<String> {
        self.send(&command).await
    }
}
