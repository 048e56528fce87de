//! Simulation mode
//!
//! Broadcasts synthetic readings on a fixed interval so dashboards can be
//! exercised without a sensor on the broker.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use std::time::Duration;

use super::status::UpstreamStatus;
use crate::reading::{Reading, Unit};
use crate::websocket::BroadcastHub;

pub struct Simulator {
    hub: Arc<BroadcastHub>,
    status: Arc<UpstreamStatus>,
    interval: Duration,
}

impl Simulator {
    pub fn new(hub: Arc<BroadcastHub>, status: Arc<UpstreamStatus>, interval: Duration) -> Self {
        Self {
            hub,
            status,
            interval,
        }
    }

    /// Broadcast a synthetic reading every interval, forever
    pub async fn run(self) {
        tracing::info!(
            interval_ms = self.interval.as_millis() as u64,
            "Simulation mode enabled"
        );

        let mut rng = StdRng::from_os_rng();
        let mut ticker = tokio::time::interval(self.interval);
        // First tick completes immediately
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let reading = synthetic_reading(&mut rng);
            match self.hub.broadcast(reading).await {
                Ok(report) => {
                    self.status.record_broadcast();
                    tracing::debug!(
                        reading = %reading,
                        delivered = report.delivered,
                        "Simulated reading sent"
                    );
                }
                Err(e) => tracing::error!(error = %e, "Failed to broadcast simulated reading"),
            }
        }
    }
}

/// 20-30 °C and 40-70 % humidity, one decimal place
pub fn synthetic_reading<R: Rng>(rng: &mut R) -> Reading {
    let temperature = round1(rng.random_range(20.0..30.0));
    let humidity = round1(rng.random_range(40.0..70.0));
    Reading::new(temperature, humidity, Unit::Celsius).simulated()
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::websocket::Envelope;

    #[test]
    fn test_synthetic_reading_ranges() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..500 {
            let reading = synthetic_reading(&mut rng);
            assert!((20.0..=30.0).contains(&reading.temperature));
            assert!((40.0..=70.0).contains(&reading.humidity));
            assert_eq!(reading.unit, Unit::Celsius);
            assert!(reading.simulation);
            assert_eq!(round1(reading.temperature), reading.temperature);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_simulator_broadcasts_on_interval() {
        let hub = Arc::new(BroadcastHub::default());
        let status = Arc::new(UpstreamStatus::new());
        let (tx, mut rx) = hub.client_channel();
        hub.register(tx).await.unwrap();
        rx.recv().await.unwrap();

        let simulator = Simulator::new(
            Arc::clone(&hub),
            Arc::clone(&status),
            Duration::from_secs(3),
        );
        let handle = tokio::spawn(simulator.run());

        let frame = rx.recv().await.unwrap();
        match serde_json::from_str::<Envelope>(&frame).unwrap() {
            Envelope::SensorData { data } => assert!(data.simulation),
            other => panic!("Expected SensorData, got {:?}", other),
        }
        assert_eq!(status.snapshot().readings_broadcast, 1);

        handle.abort();
    }
}
