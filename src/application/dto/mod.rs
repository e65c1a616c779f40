//! Data Transfer Objects
//!
//! Request and response shapes for the HTTP and WebSocket boundaries.

pub mod request;
pub mod response;

pub use request::{LoginRequest, RegisterRequest};
pub use response::{MessageResponse, RegisterResponse, TokenResponse, UserResponse};
