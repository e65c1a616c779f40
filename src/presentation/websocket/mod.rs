//! WebSocket Layer
//!
//! Broadcast chat over a single shared room: the hub owns the live
//! connection set, the handler runs each connection's lifecycle, and
//! frames define the inbound wire shape.

pub mod frames;
pub mod handler;
pub mod hub;

pub use frames::InboundFrame;
pub use handler::{relay_frame, ws_handler};
pub use hub::{ChatHub, Connection};
