//! HTTP Request Handlers

pub mod auth;
pub mod chat;
pub mod health;
