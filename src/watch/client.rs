//! Watch client
//!
//! Connects to the bridge's stream endpoint and turns frames into
//! `WatchEvent`s. Reconnects on a fixed delay after any disconnect, the
//! same way the browser dashboard does.

use futures_util::{SinkExt, StreamExt};
use std::ops::ControlFlow;
use std::time::Duration;
use thiserror::Error;
use tokio_tungstenite::{connect_async, tungstenite::Message};

use crate::reading::Reading;
use crate::websocket::{ClientMessage, Command, Envelope};

/// Delay between reconnect attempts
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(3);

/// Something the watcher observed
#[derive(Debug, Clone, PartialEq)]
pub enum WatchEvent {
    /// Welcome envelope received
    Connected { message: String },
    /// A reading arrived
    Reading(Reading),
    /// The connection ended; a reconnect follows
    Disconnected { reason: String },
}

/// Errors from a single watch session
#[derive(Debug, Error)]
pub enum WatchError {
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("Failed to encode command: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Stream endpoint client
#[derive(Debug, Clone)]
pub struct WatchClient {
    url: String,
    reconnect_delay: Duration,
    command: Option<Command>,
}

impl WatchClient {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            command: None,
        }
    }

    /// Builder method: reconnect delay
    pub fn reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    /// Builder method: command sent after every connect
    pub fn command(mut self, command: Command) -> Self {
        self.command = Some(command);
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Watch until `on_event` breaks, reconnecting forever otherwise
    pub async fn run<F>(&self, mut on_event: F)
    where
        F: FnMut(WatchEvent) -> ControlFlow<()>,
    {
        loop {
            let reason = match self.session(&mut on_event).await {
                Ok(ControlFlow::Break(())) => return,
                Ok(ControlFlow::Continue(())) => "connection closed".to_string(),
                Err(e) => e.to_string(),
            };

            if on_event(WatchEvent::Disconnected { reason }).is_break() {
                return;
            }
            tokio::time::sleep(self.reconnect_delay).await;
        }
    }

    /// One connection, start to close
    pub async fn session<F>(&self, on_event: &mut F) -> Result<ControlFlow<()>, WatchError>
    where
        F: FnMut(WatchEvent) -> ControlFlow<()>,
    {
        let (mut ws, _response) = connect_async(self.url.as_str()).await?;
        tracing::debug!(url = %self.url, "Connected to bridge");

        if let Some(command) = &self.command {
            let text = serde_json::to_string(&ClientMessage::Command(command.clone()))?;
            ws.send(Message::text(text)).await?;
        }

        while let Some(message) = ws.next().await {
            let event = match message? {
                Message::Text(text) => match parse_frame(text.as_str()) {
                    Some(event) => event,
                    None => continue,
                },
                Message::Close(_) => break,
                _ => continue,
            };

            if on_event(event).is_break() {
                let _ = ws.close(None).await;
                return Ok(ControlFlow::Break(()));
            }
        }

        Ok(ControlFlow::Continue(()))
    }
}

/// Map a server frame to an event; unknown frames are skipped
pub fn parse_frame(text: &str) -> Option<WatchEvent> {
    match serde_json::from_str::<Envelope>(text) {
        Ok(Envelope::Connection { message }) => Some(WatchEvent::Connected { message }),
        Ok(Envelope::SensorData { data }) => Some(WatchEvent::Reading(data)),
        Err(e) => {
            tracing::debug!(error = %e, "Skipping unrecognized frame");
            None
        }
    }
}
