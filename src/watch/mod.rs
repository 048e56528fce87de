//! Terminal Watch Client
//!
//! A small viewer for the bridge's stream: follows the latest reading,
//! keeps a bounded history and can send unit-change commands.
//!
//! - **client**: WebSocket session with reconnect
//! - **history**: Bounded newest-first history and comfort bands

mod client;
mod history;

pub use client::{parse_frame, WatchClient, WatchError, WatchEvent, DEFAULT_RECONNECT_DELAY};
pub use history::{HistoryEntry, HumidityBand, ReadingHistory, TemperatureBand, DEFAULT_HISTORY_LEN};
