//! Collab chat client library: REST client, realtime chat socket, view
//! state and terminal UI for the brand/creator marketplace.

pub mod api;
pub mod app;
pub mod chat;
pub mod config;
pub mod net;
pub mod notifications;
pub mod ui;
