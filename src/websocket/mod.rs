//! WebSocket Real-Time Streaming
//!
//! Pushes normalized sensor readings to dashboard clients.
//!
//! ## Architecture
//!
//! - **BroadcastHub**: Owns the set of connected clients and fans frames out
//! - **Handler**: Handles the upgrade and the per-connection lifecycle
//! - **Messages**: Defines client and server envelopes
//!
//! ## Usage
//!
//! Clients connect to `/` (or `/ws`) on the bridge port. They receive one
//! `connection` envelope, then a `sensor_data` envelope per broker message.
//!
//! ## Example
//!
//! ```javascript
//! // Browser
//! const ws = new WebSocket('ws://localhost:3001');
//!
//! ws.onmessage = (event) => {
//!   const msg = JSON.parse(event.data);
//!   if (msg.type === 'sensor_data') console.log(msg.data.temperature);
//! };
//!
//! ws.send(JSON.stringify({type: 'command', unit: 'F'}));
//! ```

mod handler;
mod hub;
mod messages;

pub use handler::{handle_socket, stream_handler, StreamSettings};
pub use hub::{BroadcastHub, BroadcastReport, ClientId, Frame, FrameSender, HubConfig, HubError};
pub use messages::{ClientMessage, Command, Envelope, WELCOME_MESSAGE};
