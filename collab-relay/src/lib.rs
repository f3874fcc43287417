//! Collab chat relay library.
//!
//! Exposes the chat server for use in tests and embedding. The server keeps
//! a fixed user roster, per-pair WebSocket rooms, an in-memory message store
//! and per-user notification feeds.

pub mod api;
pub mod auth;
pub mod config;
pub mod directory;
pub mod notifications;
pub mod relay;
pub mod rooms;
pub mod store;
