//! Client Commands
//!
//! Viewers may send `command` envelopes (e.g. a unit change). The bridge
//! only parses the envelope; acting on it belongs to whatever sits behind a
//! `CommandSink`.

use async_trait::async_trait;
use rumqttc::{AsyncClient, QoS};
use thiserror::Error;

use crate::websocket::Command;

/// Receiver of client commands
#[async_trait]
pub trait CommandSink: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Hand a command onward
    async fn dispatch(&self, client_id: &str, command: Command) -> Result<(), CommandError>;
}

/// Errors that can occur while dispatching a command
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Failed to encode command: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Broker rejected command: {0}")]
    Broker(#[from] rumqttc::ClientError),
}

/// Logs commands and does nothing else
#[derive(Debug, Default, Clone)]
pub struct LogCommandSink;

#[async_trait]
impl CommandSink for LogCommandSink {
    fn name(&self) -> &str {
        "log"
    }

    async fn dispatch(&self, client_id: &str, command: Command) -> Result<(), CommandError> {
        tracing::info!(
            client_id = %client_id,
            unit = ?command.unit,
            params = ?command.params,
            "Client command received"
        );
        Ok(())
    }
}

/// Republishes commands as JSON on a broker topic
pub struct MqttCommandPublisher {
    client: AsyncClient,
    topic: String,
    qos: QoS,
}

impl MqttCommandPublisher {
    /// Create a publisher sharing the subscriber's broker connection
    pub fn new(client: AsyncClient, topic: impl Into<String>, qos: QoS) -> Self {
        Self {
            client,
            topic: topic.into(),
            qos,
        }
    }

    /// Topic commands are published to
    pub fn topic(&self) -> &str {
        &self.topic
    }
}

#[async_trait]
impl CommandSink for MqttCommandPublisher {
    fn name(&self) -> &str {
        "mqtt"
    }

    async fn dispatch(&self, client_id: &str, command: Command) -> Result<(), CommandError> {
        let payload = serde_json::to_vec(&command)?;
        // Never wait on the event loop: a down broker must not stall the
        // client's connection task.
        self.client
            .try_publish(self.topic.clone(), self.qos, false, payload)?;
        tracing::info!(
            client_id = %client_id,
            topic = %self.topic,
            "Client command forwarded to broker"
        );
        Ok(())
    }
}
