//! MQTT Subscriber
//!
//! Drives the rumqttc event loop: subscribes after every connect, decodes
//! each publish and hands the reading to the hub, and keeps retrying the
//! broker forever when the connection drops.

use rumqttc::{AsyncClient, ConnectReturnCode, ConnectionError, Event, EventLoop, Packet, QoS};
use std::sync::Arc;
use std::time::Duration;

use super::backoff::Backoff;
use super::broker::qos_level;
use super::status::UpstreamStatus;
use crate::config::MqttConfig;
use crate::reading::normalize;
use crate::websocket::{BroadcastHub, BroadcastReport};

/// Receives broker messages and forwards readings to the hub
pub struct Subscriber {
    client: AsyncClient,
    hub: Arc<BroadcastHub>,
    status: Arc<UpstreamStatus>,
    topics: Vec<String>,
    qos: QoS,
    backoff: Backoff,
}

impl Subscriber {
    pub fn new(
        client: AsyncClient,
        hub: Arc<BroadcastHub>,
        status: Arc<UpstreamStatus>,
        config: &MqttConfig,
    ) -> Self {
        Self {
            client,
            hub,
            status,
            topics: config.topics.clone(),
            qos: qos_level(config.qos),
            backoff: Backoff::new(
                Duration::from_millis(config.reconnect_initial_ms),
                Duration::from_millis(config.reconnect_max_ms),
            ),
        }
    }

    /// Poll the broker until the task is dropped
    ///
    /// Messages are handled one at a time, so readings reach the hub in
    /// the order the broker delivered them.
    pub async fn run(mut self, mut eventloop: EventLoop) {
        tracing::info!(topics = ?self.topics, "MQTT subscriber started");

        loop {
            match eventloop.poll().await {
                Ok(event) => self.handle_event(event).await,
                Err(e) => {
                    let delay = self.on_connection_error(&e);
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    /// Mark the broker down and pick the next retry delay
    fn on_connection_error(&mut self, error: &ConnectionError) -> Duration {
        let was_connected = self.status.is_connected();
        self.status.set_connected(false);
        let delay = self.backoff.next_delay();
        tracing::warn!(
            error = %error,
            was_connected,
            attempt = self.backoff.attempts(),
            retry_in_ms = delay.as_millis() as u64,
            "MQTT connection error, retrying"
        );
        delay
    }

    /// React to one event from the broker
    pub async fn handle_event(&mut self, event: Event) {
        match event {
            Event::Incoming(Packet::ConnAck(ack)) => {
                if ack.code == ConnectReturnCode::Success {
                    self.on_connected();
                } else {
                    tracing::error!(code = ?ack.code, "MQTT broker refused connection");
                }
            }
            Event::Incoming(Packet::Publish(publish)) => {
                self.handle_publish(&publish.topic, &publish.payload).await;
            }
            Event::Incoming(Packet::SubAck(ack)) => {
                tracing::debug!(pkid = ack.pkid, codes = ?ack.return_codes, "Subscription acknowledged");
            }
            Event::Incoming(Packet::Disconnect) => {
                tracing::warn!("MQTT broker sent disconnect");
                self.status.set_connected(false);
            }
            _ => {}
        }
    }

    fn on_connected(&mut self) {
        self.status.set_connected(true);
        self.backoff.reset();
        tracing::info!("Connected to MQTT broker");

        if self.topics.is_empty() {
            tracing::info!("No topics configured, listening without a subscription");
            return;
        }

        // try_subscribe only queues the request; awaiting here would
        // deadlock against the event loop we are running inside.
        for topic in &self.topics {
            match self.client.try_subscribe(topic.clone(), self.qos) {
                Ok(()) => tracing::info!(topic = %topic, "Subscribed"),
                Err(e) => tracing::error!(topic = %topic, error = %e, "MQTT subscribe failed"),
            }
        }
    }

    /// Decode a payload and broadcast it
    ///
    /// Malformed payloads are logged and dropped; `None` means nothing was
    /// broadcast.
    pub async fn handle_publish(&self, topic: &str, payload: &[u8]) -> Option<BroadcastReport> {
        self.status.record_message();
        tracing::debug!(
            topic = %topic,
            payload = %String::from_utf8_lossy(payload),
            "MQTT message received"
        );

        let reading = match normalize(payload) {
            Ok(reading) => reading,
            Err(e) => {
                self.status.record_decode_failure();
                tracing::warn!(topic = %topic, error = %e, "Dropping undecodable MQTT payload");
                return None;
            }
        };

        match self.hub.broadcast(reading).await {
            Ok(report) => {
                self.status.record_broadcast();
                Some(report)
            }
            Err(e) => {
                tracing::error!(topic = %topic, error = %e, "Failed to broadcast reading");
                None
            }
        }
    }
}
