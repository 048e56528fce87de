//! Broadcast Hub
//!
//! Owns the set of live WebSocket clients and decides what each one is sent.
//!
//! Every client gets its own bounded queue, drained by its connection task.
//! The hub never awaits a client: frames are pushed with `try_send`, so a
//! slow viewer only loses its own frames and never stalls the broker loop.

use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

use super::messages::Envelope;
use crate::reading::Reading;

/// Unique identifier for a WebSocket client
pub type ClientId = String;

/// A serialized envelope, shared by every client it is sent to
pub type Frame = Arc<str>;

/// Sending half of a client's outbound queue
pub type FrameSender = mpsc::Sender<Frame>;

/// Manages all connected stream clients
pub struct BroadcastHub {
    /// Active clients: ClientId → queue sender
    clients: RwLock<HashMap<ClientId, FrameSender>>,
    /// Configuration
    config: HubConfig,
}

/// Configuration for the broadcast hub
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Maximum number of concurrent clients
    pub max_connections: usize,
    /// Outbound queue depth per client
    pub client_queue_capacity: usize,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            max_connections: 1000,
            client_queue_capacity: 64,
        }
    }
}

/// Outcome of a single broadcast
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Clients the frame was queued for
    pub delivered: usize,
    /// Clients whose queue was full; they miss this frame
    pub skipped: usize,
    /// Clients found closed and removed
    pub removed: usize,
}

impl BroadcastHub {
    /// Create a new hub
    pub fn new(config: HubConfig) -> Self {
        Self {
            clients: RwLock::new(HashMap::new()),
            config,
        }
    }

    /// Create a queue sized for one client
    pub fn client_channel(&self) -> (FrameSender, mpsc::Receiver<Frame>) {
        mpsc::channel(self.config.client_queue_capacity.max(1))
    }

    /// Register a new client
    ///
    /// The welcome envelope is queued before the client joins the broadcast
    /// set, so it always precedes any `sensor_data` frame.
    pub async fn register(&self, sender: FrameSender) -> Result<ClientId, HubError> {
        let welcome = Envelope::connection()
            .to_frame()
            .map_err(|e| HubError::Serialization(e.to_string()))?;

        let mut clients = self.clients.write().await;
        if clients.len() >= self.config.max_connections {
            return Err(HubError::TooManyConnections(self.config.max_connections));
        }

        sender
            .try_send(Frame::from(welcome))
            .map_err(|_| HubError::SendFailed)?;

        let id = Uuid::new_v4().to_string();
        clients.insert(id.clone(), sender);

        tracing::info!(client_id = %id, clients = clients.len(), "WebSocket client registered");
        Ok(id)
    }

    /// Unregister a client
    ///
    /// Returns `false` when the client was already gone.
    pub async fn unregister(&self, id: &str) -> bool {
        let mut clients = self.clients.write().await;
        let removed = clients.remove(id).is_some();
        if removed {
            tracing::info!(client_id = %id, clients = clients.len(), "WebSocket client unregistered");
        }
        removed
    }

    /// Send a reading to every registered client
    pub async fn broadcast(&self, reading: Reading) -> Result<BroadcastReport, HubError> {
        let frame: Frame = Envelope::sensor_data(reading)
            .to_frame()
            .map_err(|e| HubError::Serialization(e.to_string()))?
            .into();

        Ok(self.broadcast_frame(frame).await)
    }

    /// Send an already serialized frame to every registered client
    pub async fn broadcast_frame(&self, frame: Frame) -> BroadcastReport {
        let mut report = BroadcastReport::default();
        let mut dead = Vec::new();

        {
            let clients = self.clients.read().await;
            for (id, sender) in clients.iter() {
                match sender.try_send(Arc::clone(&frame)) {
                    Ok(()) => report.delivered += 1,
                    Err(mpsc::error::TrySendError::Full(_)) => {
                        tracing::debug!(client_id = %id, "Client queue full, frame skipped");
                        report.skipped += 1;
                    }
                    Err(mpsc::error::TrySendError::Closed(_)) => dead.push(id.clone()),
                }
            }
        }

        for id in dead {
            if self.unregister(&id).await {
                report.removed += 1;
            }
        }

        tracing::trace!(
            delivered = report.delivered,
            skipped = report.skipped,
            removed = report.removed,
            "Broadcast reading"
        );
        report
    }

    /// Drop every client queue
    ///
    /// Each connection task sees its queue close, sends a close frame and
    /// exits, unregistering itself on the way out.
    pub async fn close_all(&self) -> usize {
        let mut clients = self.clients.write().await;
        let count = clients.len();
        clients.clear();
        tracing::info!(clients = count, "Closed all WebSocket clients");
        count
    }

    /// Get the current client count
    pub async fn connection_count(&self) -> usize {
        self.clients.read().await.len()
    }

    /// Whether a client is currently registered
    pub async fn is_registered(&self, id: &str) -> bool {
        self.clients.read().await.contains_key(id)
    }
}

impl Default for BroadcastHub {
    fn default() -> Self {
        Self::new(HubConfig::default())
    }
}

/// Errors that can occur in the broadcast hub
#[derive(Debug, Error)]
pub enum HubError {
    #[error("Too many connections (limit: {0})")]
    TooManyConnections(usize),

    #[error("Failed to send message")]
    SendFailed,

    #[error("Failed to serialize envelope: {0}")]
    Serialization(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reading::Unit;

    fn reading(temperature: f64) -> Reading {
        Reading::new(temperature, 50.0, Unit::Celsius)
    }

    #[test]
    fn test_default_config() {
        let config = HubConfig::default();
        assert_eq!(config.max_connections, 1000);
        assert_eq!(config.client_queue_capacity, 64);
    }

    #[tokio::test]
    async fn test_register_unregister() {
        let hub = BroadcastHub::default();
        let (tx, _rx) = hub.client_channel();

        let id = hub.register(tx).await.unwrap();
        assert!(!id.is_empty());
        assert_eq!(hub.connection_count().await, 1);

        assert!(hub.unregister(&id).await);
        assert_eq!(hub.connection_count().await, 0);
    }

    #[tokio::test]
    async fn test_unregister_twice_is_noop() {
        let hub = BroadcastHub::default();
        let (tx, _rx) = hub.client_channel();
        let (other_tx, _other_rx) = hub.client_channel();

        let id = hub.register(tx).await.unwrap();
        hub.register(other_tx).await.unwrap();

        assert!(hub.unregister(&id).await);
        assert!(!hub.unregister(&id).await);
        assert_eq!(hub.connection_count().await, 1);
    }

    #[tokio::test]
    async fn test_register_sends_connection_first() {
        let hub = BroadcastHub::default();
        let (tx, mut rx) = hub.client_channel();

        hub.register(tx).await.unwrap();
        hub.broadcast(reading(20.0)).await.unwrap();

        let first: Envelope = serde_json::from_str(&rx.recv().await.unwrap()).unwrap();
        assert_eq!(first, Envelope::connection());

        let second: Envelope = serde_json::from_str(&rx.recv().await.unwrap()).unwrap();
        assert_eq!(second, Envelope::sensor_data(reading(20.0)));

        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_connection_limit() {
        let hub = BroadcastHub::new(HubConfig {
            max_connections: 2,
            client_queue_capacity: 4,
        });

        let (tx1, _rx1) = hub.client_channel();
        let (tx2, _rx2) = hub.client_channel();
        let (tx3, _rx3) = hub.client_channel();

        hub.register(tx1).await.unwrap();
        hub.register(tx2).await.unwrap();
        let result = hub.register(tx3).await;

        assert!(matches!(result, Err(HubError::TooManyConnections(2))));
        assert_eq!(hub.connection_count().await, 2);
    }

    #[tokio::test]
    async fn test_broadcast_identical_frames() {
        let hub = BroadcastHub::default();
        let mut receivers = Vec::new();
        for _ in 0..5 {
            let (tx, mut rx) = hub.client_channel();
            hub.register(tx).await.unwrap();
            rx.recv().await.unwrap();
            receivers.push(rx);
        }

        let report = hub.broadcast(reading(24.5)).await.unwrap();
        assert_eq!(report.delivered, 5);

        let frames: Vec<Frame> = receivers
            .iter_mut()
            .map(|rx| rx.try_recv().unwrap())
            .collect();
        for frame in &frames[1..] {
            assert_eq!(frame.as_bytes(), frames[0].as_bytes());
            assert!(Arc::ptr_eq(frame, &frames[0]));
        }
    }

    #[tokio::test]
    async fn test_closed_client_removed_others_still_served() {
        let hub = BroadcastHub::default();

        let (tx1, mut rx1) = hub.client_channel();
        let (tx2, rx2) = hub.client_channel();
        let (tx3, mut rx3) = hub.client_channel();

        hub.register(tx1).await.unwrap();
        let gone = hub.register(tx2).await.unwrap();
        hub.register(tx3).await.unwrap();

        drop(rx2);

        let report = hub.broadcast(reading(19.0)).await.unwrap();
        assert_eq!(report.delivered, 2);
        assert_eq!(report.removed, 1);
        assert!(!hub.is_registered(&gone).await);
        assert_eq!(hub.connection_count().await, 2);

        // welcome + reading
        assert!(rx1.recv().await.is_some());
        assert!(rx1.recv().await.is_some());
        assert!(rx3.recv().await.is_some());
        assert!(rx3.recv().await.is_some());

        // removal is a real unregister: a second one is a no-op
        assert!(!hub.unregister(&gone).await);
    }

    #[tokio::test]
    async fn test_full_queue_skips_only_that_client() {
        let hub = BroadcastHub::new(HubConfig {
            max_connections: 10,
            client_queue_capacity: 2,
        });

        let (slow_tx, mut slow_rx) = hub.client_channel();
        let (fast_tx, mut fast_rx) = hub.client_channel();
        let slow = hub.register(slow_tx).await.unwrap();
        hub.register(fast_tx).await.unwrap();
        fast_rx.recv().await.unwrap();

        // slow client still holds its welcome frame; one slot left
        hub.broadcast(reading(1.0)).await.unwrap();
        fast_rx.recv().await.unwrap();
        let report = hub.broadcast(reading(2.0)).await.unwrap();

        assert_eq!(report.skipped, 1);
        assert_eq!(report.delivered, 1);
        assert!(hub.is_registered(&slow).await);

        let frame: Envelope = serde_json::from_str(&fast_rx.recv().await.unwrap()).unwrap();
        assert_eq!(frame, Envelope::sensor_data(reading(2.0)));

        assert!(slow_rx.recv().await.is_some());
        assert!(slow_rx.recv().await.is_some());
        assert!(slow_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_broadcast_preserves_order() {
        let hub = BroadcastHub::default();
        let (tx, mut rx) = hub.client_channel();
        hub.register(tx).await.unwrap();
        rx.recv().await.unwrap();

        for i in 0..10 {
            hub.broadcast(reading(i as f64)).await.unwrap();
        }

        for i in 0..10 {
            let envelope: Envelope = serde_json::from_str(&rx.recv().await.unwrap()).unwrap();
            assert_eq!(envelope, Envelope::sensor_data(reading(i as f64)));
        }
    }

    #[tokio::test]
    async fn test_broadcast_with_no_clients() {
        let hub = BroadcastHub::default();
        let report = hub.broadcast(reading(10.0)).await.unwrap();
        assert_eq!(report, BroadcastReport::default());
    }

    #[tokio::test]
    async fn test_close_all_closes_queues() {
        let hub = BroadcastHub::default();
        let (tx, mut rx) = hub.client_channel();
        hub.register(tx).await.unwrap();

        assert_eq!(hub.close_all().await, 1);
        assert_eq!(hub.connection_count().await, 0);

        // welcome is still buffered, then the queue reports closed
        assert!(rx.recv().await.is_some());
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_concurrent_register_and_broadcast() {
        let hub = Arc::new(BroadcastHub::default());
        let mut handles = Vec::new();

        for _ in 0..20 {
            let hub = Arc::clone(&hub);
            handles.push(tokio::spawn(async move {
                let (tx, mut rx) = hub.client_channel();
                let id = hub.register(tx).await.unwrap();
                hub.broadcast(reading(5.0)).await.unwrap();
                let first: Envelope = serde_json::from_str(&rx.recv().await.unwrap()).unwrap();
                hub.unregister(&id).await;
                first
            }));
        }

        for handle in handles {
            assert_eq!(handle.await.unwrap(), Envelope::connection());
        }
        assert_eq!(hub.connection_count().await, 0);
    }
}
