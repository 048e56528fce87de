//! WebSocket Handler
//!
//! Handles upgrade requests on the stream endpoint and manages the
//! connection lifecycle: `Connecting → Open → Closed`.
//!
//! A connection is `Open` once the upgrade has completed and the hub has
//! accepted it. Whatever ends the session (client close, transport error,
//! heartbeat timeout, hub shutdown) it leaves through the same exit path,
//! which unregisters the client exactly once.

use axum::{
    extract::{
        ws::{close_code, rejection::WebSocketUpgradeRejection, CloseFrame, Message, WebSocket, WebSocketUpgrade},
        State,
    },
    http::{header, HeaderMap},
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};

use super::hub::{BroadcastHub, Frame};
use super::messages::ClientMessage;
use crate::api::routes::health::liveness_text;
use crate::api::AppState;
use crate::commands::CommandSink;

/// Timing knobs for a single stream connection
#[derive(Debug, Clone, Copy)]
pub struct StreamSettings {
    /// How often the server pings an idle client
    pub heartbeat_interval: Duration,
    /// A client silent for this long is considered gone
    pub client_timeout: Duration,
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            heartbeat_interval: Duration::from_secs(30),
            client_timeout: Duration::from_secs(90),
        }
    }
}

/// Why a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionEnd {
    ClientClosed,
    ReceiveFailed,
    SendFailed,
    TimedOut,
    HubClosed,
}

/// Stream endpoint handler
///
/// Upgrades WebSocket requests. A request that asks for an upgrade but fails
/// the handshake gets the rejection status; a plain request gets the
/// liveness text.
pub async fn stream_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    match ws {
        Ok(ws) => {
            let hub = Arc::clone(&state.hub);
            let commands = Arc::clone(&state.commands);
            let settings = state.stream_settings;
            ws.on_failed_upgrade(|error| {
                tracing::warn!(error = %error, "WebSocket upgrade failed");
            })
            .on_upgrade(move |socket| handle_socket(socket, hub, commands, settings))
        }
        Err(rejection) if wants_upgrade(&headers) => {
            tracing::warn!(
                status = %rejection.status(),
                error = %rejection.body_text(),
                "Rejected WebSocket upgrade"
            );
            rejection.into_response()
        }
        Err(_) => liveness_text().into_response(),
    }
}

/// True when the request carries `Upgrade: websocket`
fn wants_upgrade(headers: &HeaderMap) -> bool {
    headers
        .get(header::UPGRADE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.eq_ignore_ascii_case("websocket"))
        .unwrap_or(false)
}

/// Handle an established WebSocket connection
pub async fn handle_socket(
    mut socket: WebSocket,
    hub: Arc<BroadcastHub>,
    commands: Arc<dyn CommandSink>,
    settings: StreamSettings,
) {
    let (tx, rx) = hub.client_channel();

    let client_id = match hub.register(tx).await {
        Ok(id) => id,
        Err(e) => {
            tracing::error!(error = %e, "Failed to register WebSocket client");
            let _ = socket
                .send(Message::Close(Some(CloseFrame {
                    code: close_code::AGAIN,
                    reason: e.to_string().into(),
                })))
                .await;
            return;
        }
    };

    let end = run_session(&mut socket, rx, &client_id, commands.as_ref(), settings).await;
    tracing::debug!(client_id = %client_id, reason = ?end, "WebSocket session ended");

    hub.unregister(&client_id).await;
}

/// Pump frames both ways until something ends the session
async fn run_session(
    socket: &mut WebSocket,
    mut rx: mpsc::Receiver<Frame>,
    client_id: &str,
    commands: &dyn CommandSink,
    settings: StreamSettings,
) -> SessionEnd {
    let mut heartbeat = tokio::time::interval_at(
        Instant::now() + settings.heartbeat_interval,
        settings.heartbeat_interval,
    );
    heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut last_seen = Instant::now();

    loop {
        tokio::select! {
            frame = rx.recv() => match frame {
                Some(frame) => {
                    let deadline = last_seen + settings.client_timeout;
                    if let Err(end) = send_before(socket, Message::Text(frame.to_string()), deadline).await {
                        tracing::debug!(client_id = %client_id, reason = ?end, "WebSocket send did not complete, closing connection");
                        return end;
                    }
                }
                None => {
                    let close = Message::Close(Some(CloseFrame {
                        code: close_code::AWAY,
                        reason: "bridge shutting down".into(),
                    }));
                    let _ = send_before(socket, close, Instant::now() + settings.heartbeat_interval).await;
                    return SessionEnd::HubClosed;
                }
            },
            inbound = socket.recv() => match inbound {
                Some(Ok(message)) => {
                    last_seen = Instant::now();
                    if !handle_ws_message(client_id, commands, message).await {
                        return SessionEnd::ClientClosed;
                    }
                }
                Some(Err(e)) => {
                    tracing::debug!(client_id = %client_id, error = %e, "WebSocket receive error");
                    return SessionEnd::ReceiveFailed;
                }
                None => return SessionEnd::ClientClosed,
            },
            _ = heartbeat.tick() => {
                if last_seen.elapsed() >= settings.client_timeout {
                    tracing::info!(client_id = %client_id, "WebSocket client timed out");
                    return SessionEnd::TimedOut;
                }
                let deadline = last_seen + settings.client_timeout;
                if let Err(end) = send_before(socket, Message::Ping(Vec::new()), deadline).await {
                    tracing::debug!(client_id = %client_id, reason = ?end, "WebSocket ping did not complete, closing connection");
                    return end;
                }
            }
        }
    }
}

/// Send one message, giving up at `deadline`
///
/// A client that stops reading fills the socket buffers, so a send may never
/// complete on its own.
async fn send_before(socket: &mut WebSocket, message: Message, deadline: Instant) -> Result<(), SessionEnd> {
    match tokio::time::timeout_at(deadline, socket.send(message)).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(_)) => Err(SessionEnd::SendFailed),
        Err(_) => Err(SessionEnd::TimedOut),
    }
}

/// Handle a received WebSocket message
///
/// Returns false if the connection should be closed.
async fn handle_ws_message(client_id: &str, commands: &dyn CommandSink, message: Message) -> bool {
    match message {
        Message::Text(text) => {
            match serde_json::from_str::<ClientMessage>(&text) {
                Ok(ClientMessage::Command(command)) => {
                    if let Err(e) = commands.dispatch(client_id, command).await {
                        tracing::warn!(
                            client_id = %client_id,
                            sink = commands.name(),
                            error = %e,
                            "Failed to dispatch client command"
                        );
                    }
                }
                Err(e) => {
                    tracing::debug!(
                        client_id = %client_id,
                        error = %e,
                        text = %text,
                        "Ignoring client message"
                    );
                }
            }
            true
        }
        Message::Binary(data) => {
            tracing::debug!(client_id = %client_id, bytes = data.len(), "Ignoring binary message");
            true
        }
        Message::Ping(_) => {
            // Axum handles ping/pong automatically
            true
        }
        Message::Pong(_) => {
            // Received pong, connection is alive
            true
        }
        Message::Close(_) => {
            tracing::debug!(client_id = %client_id, "Client requested close");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::CommandError;
    use crate::websocket::Command;
    use async_trait::async_trait;
    use axum::http::HeaderValue;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSink {
        seen: Mutex<Vec<Command>>,
    }

    #[async_trait]
    impl CommandSink for RecordingSink {
        fn name(&self) -> &str {
            "recording"
        }

        async fn dispatch(&self, _client_id: &str, command: Command) -> Result<(), CommandError> {
            self.seen.lock().unwrap().push(command);
            Ok(())
        }
    }

    #[test]
    fn test_wants_upgrade() {
        let mut headers = HeaderMap::new();
        assert!(!wants_upgrade(&headers));

        headers.insert(header::UPGRADE, HeaderValue::from_static("WebSocket"));
        assert!(wants_upgrade(&headers));

        headers.insert(header::UPGRADE, HeaderValue::from_static("h2c"));
        assert!(!wants_upgrade(&headers));
    }

    #[tokio::test]
    async fn test_command_is_dispatched() {
        let sink = RecordingSink::default();
        let keep_open = handle_ws_message(
            "c1",
            &sink,
            Message::Text(r#"{"type":"command","unit":"F"}"#.to_string()),
        )
        .await;

        assert!(keep_open);
        let seen = sink.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].unit, Some(crate::reading::Unit::Fahrenheit));
    }

    #[tokio::test]
    async fn test_garbage_is_discarded() {
        let sink = RecordingSink::default();
        assert!(handle_ws_message("c1", &sink, Message::Text("not json".to_string())).await);
        assert!(handle_ws_message("c1", &sink, Message::Binary(vec![1, 2, 3])).await);
        assert!(sink.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_close_ends_session() {
        let sink = RecordingSink::default();
        assert!(!handle_ws_message("c1", &sink, Message::Close(None)).await);
        assert!(handle_ws_message("c1", &sink, Message::Pong(Vec::new())).await);
    }
}
