//! Inbound WebSocket Frames
//!
//! Only the content survives decoding. Clients may include identity
//! fields in the frame; they are dropped here so the server-verified
//! identity from the token is the only one that ever reaches the hub.

use serde::Deserialize;

/// A chat frame as received from a client.
#[derive(Debug, Deserialize)]
pub struct InboundFrame {
    pub content: String,
}
