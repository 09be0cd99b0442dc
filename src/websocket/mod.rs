//! Dashboard Streaming
//!
//! Fans monitor events out to dashboard clients over WebSocket.
//!
//! ## Architecture
//!
//! - **BroadcastHub**: subscriber registry plus the bounded event history
//! - **Handler**: WebSocket upgrade and per-connection pump
//!
//! A client connecting to `/ws` first receives the retained history in
//! arrival order, then every live event. Nothing the client sends is
//! interpreted.
//!
//! ## Example
//!
//! ```javascript
//! const ws = new WebSocket('ws://localhost:8212/ws');
//! ws.onmessage = (event) => {
//!   const msg = JSON.parse(event.data);
//!   if (msg.type === 'tnc_data') console.log(msg.portNum, msg.data);
//! };
//! ```

mod handler;
mod hub;

pub use handler::websocket_handler;
pub use hub::{BroadcastHub, EventText, HubConfig, HubError, SubscriberId, Subscription};
