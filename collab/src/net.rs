//! Networking coordinator for wiring the TUI to the chat server.
//!
//! This module bridges the synchronous TUI event loop (crossterm poll-based)
//! with the async REST client and chat socket. It spawns background tokio
//! tasks and communicates with the main thread via [`NetCommand`] /
//! [`NetEvent`] channels.
//!
//! # Architecture
//!
//! ```text
//! TUI (main thread)  ←── NetEvent ───  session task ── ChatChannel (socket)
//!                     ─── NetCommand →              └─ notification poller
//! ```
//!
//! The session task owns at most one [`ChatChannel`]. Selecting a partner
//! closes the current socket before the next one is opened.

use std::time::Duration;

use tokio::sync::mpsc;

use collab_proto::frame::{ClientFrame, ControlFrame, OutgoingMessage, ServerFrame};
use collab_proto::models::{ChatPartner, HistoryEntry, MessageId, UserId};
use collab_proto::typing::TypingSignal;

use crate::api::{ApiClient, ApiError};
use crate::chat::{ChannelEvent, ChatChannel};
use crate::notifications::{self, NotificationFeed};

/// Commands sent from the TUI main loop to the networking background tasks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetCommand {
    /// Re-fetch the chat partner list.
    RefreshUsers,
    /// Switch the conversation to this partner.
    SelectPartner(UserId),
    /// Send a chat message to the selected partner.
    SendMessage {
        /// The message text to send.
        text: String,
    },
    /// Announce a typing transition to the selected partner.
    Typing(TypingSignal),
    /// Replace the text of one of the user's messages.
    EditMessage {
        /// Message to edit.
        message_id: MessageId,
        /// Replacement text.
        text: String,
    },
    /// Delete one of the user's messages.
    DeleteMessage {
        /// Message to delete.
        message_id: MessageId,
    },
    /// Mark a notification read on the server.
    MarkNotificationRead {
        /// Notification id.
        id: u64,
    },
    /// Gracefully shut down the networking tasks.
    Shutdown,
}

/// Events sent from the networking background tasks to the TUI main loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetEvent {
    /// The chat partner list was fetched.
    UsersLoaded(Vec<ChatPartner>),
    /// History for a partner was fetched.
    HistoryLoaded {
        /// Whose conversation this is.
        partner: UserId,
        /// Messages, oldest first.
        entries: Vec<HistoryEntry>,
    },
    /// A chat socket opened or closed.
    ConnectionStatus {
        /// Partner of the socket.
        partner: UserId,
        /// Whether it is open.
        connected: bool,
    },
    /// A frame arrived on the chat socket.
    Frame {
        /// Partner of the socket.
        partner: UserId,
        /// The decoded frame.
        frame: ServerFrame,
    },
    /// A fresh notification feed.
    Notifications(NotificationFeed),
    /// The server rejected the session token.
    Unauthorized,
    /// A request or send failed.
    Error(String),
}

/// Configuration for the networking layer.
#[derive(Debug, Clone)]
pub struct NetConfig {
    /// REST base URL (e.g., `http://127.0.0.1:9000`).
    pub base_url: String,
    /// WebSocket base URL (e.g., `ws://127.0.0.1:9000/ws`).
    pub ws_base_url: String,
    /// Bearer token.
    pub token: String,
    /// The session user.
    pub user_id: UserId,
    /// Timeout for socket connects and REST requests.
    pub connect_timeout: Duration,
    /// Channel capacity for command/event mpsc channels.
    pub channel_capacity: usize,
    /// Interval between notification fetches.
    pub notification_poll: Duration,
}

impl NetConfig {
    /// Creates a `NetConfig` with default timeouts and capacities.
    #[must_use]
    pub const fn new(base_url: String, ws_base_url: String, token: String, user_id: UserId) -> Self {
        Self {
            base_url,
            ws_base_url,
            token,
            user_id,
            connect_timeout: Duration::from_secs(10),
            channel_capacity: 256,
            notification_poll: Duration::from_secs(10),
        }
    }
}

/// Spawn the networking background tasks and return channel handles.
///
/// Spawns the session task, which immediately fetches the partner list, and
/// the notification poller.
///
/// # Errors
///
/// Returns [`ApiError`] if the HTTP client cannot be built.
pub fn spawn_net(
    config: NetConfig,
) -> Result<(mpsc::Sender<NetCommand>, mpsc::Receiver<NetEvent>), ApiError> {
    let api = ApiClient::new(&config.base_url, &config.token, config.connect_timeout)?;

    let (cmd_tx, cmd_rx) = mpsc::channel::<NetCommand>(config.channel_capacity);
    let (evt_tx, evt_rx) = mpsc::channel::<NetEvent>(config.channel_capacity);

    let poller = notifications::spawn_poller(api.clone(), config.notification_poll, evt_tx.clone());

    let (chan_tx, chan_rx) = mpsc::channel::<ChannelEvent>(config.channel_capacity);
    let session = Session {
        config,
        api,
        channel: None,
        events: evt_tx,
        channel_events: chan_tx,
    };

    tokio::spawn(async move {
        session.run(cmd_rx, chan_rx).await;
        poller.abort();
    });

    Ok((cmd_tx, evt_rx))
}

/// State owned by the session task.
struct Session {
    config: NetConfig,
    api: ApiClient,
    channel: Option<ChatChannel>,
    events: mpsc::Sender<NetEvent>,
    channel_events: mpsc::Sender<ChannelEvent>,
}

impl Session {
    async fn run(
        mut self,
        mut cmd_rx: mpsc::Receiver<NetCommand>,
        mut chan_rx: mpsc::Receiver<ChannelEvent>,
    ) {
        self.load_users().await;

        loop {
            tokio::select! {
                cmd = cmd_rx.recv() => match cmd {
                    Some(NetCommand::Shutdown) | None => break,
                    Some(cmd) => self.handle_command(cmd).await,
                },
                Some(event) = chan_rx.recv() => self.forward_channel_event(event).await,
            }
        }

        if let Some(channel) = self.channel.take() {
            channel.close().await;
        }
        tracing::info!("net session shutting down");
    }

    async fn handle_command(&mut self, cmd: NetCommand) {
        match cmd {
            NetCommand::RefreshUsers => self.load_users().await,
            NetCommand::SelectPartner(partner) => self.select_partner(partner).await,
            NetCommand::SendMessage { text } => {
                let Some(partner) = self.partner() else {
                    self.emit(NetEvent::Error("No conversation selected".into()))
                        .await;
                    return;
                };
                let frame = ClientFrame::Message(OutgoingMessage {
                    message: text,
                    sender_id: self.config.user_id,
                    receiver_id: partner,
                });
                self.send_frame(&frame, true).await;
            }
            NetCommand::Typing(signal) => {
                if let Some(partner) = self.partner() {
                    let frame =
                        ClientFrame::Control(signal.to_frame(self.config.user_id, partner));
                    self.send_frame(&frame, false).await;
                }
            }
            NetCommand::EditMessage { message_id, text } => {
                let frame = ClientFrame::Control(ControlFrame::EditMessage {
                    message_id,
                    new_message: text,
                });
                self.send_frame(&frame, true).await;
            }
            NetCommand::DeleteMessage { message_id } => {
                let frame = ClientFrame::Control(ControlFrame::DeleteMessage { message_id });
                self.send_frame(&frame, true).await;
            }
            NetCommand::MarkNotificationRead { id } => {
                if let Err(e) = self.api.mark_notification_read(id).await {
                    self.report(e, "Could not mark notification read").await;
                }
            }
            NetCommand::Shutdown => {}
        }
    }

    fn partner(&self) -> Option<UserId> {
        self.channel.as_ref().map(ChatChannel::partner)
    }

    async fn load_users(&self) {
        match self.api.chat_users().await {
            Ok(users) => self.emit(NetEvent::UsersLoaded(users)).await,
            Err(e) => self.report(e, "Could not load users").await,
        }
    }

    /// Closes the current socket, loads history, then opens the new socket.
    async fn select_partner(&mut self, partner: UserId) {
        if let Some(old) = self.channel.take() {
            let old_partner = old.partner();
            old.close().await;
            self.emit(NetEvent::ConnectionStatus {
                partner: old_partner,
                connected: false,
            })
            .await;
        }

        match self.api.chat_history(partner).await {
            Ok(entries) => {
                self.emit(NetEvent::HistoryLoaded { partner, entries })
                    .await;
            }
            Err(e) => self.report(e, "Could not load history").await,
        }

        match ChatChannel::open(
            &self.config.ws_base_url,
            &self.config.token,
            partner,
            self.config.connect_timeout,
            self.channel_events.clone(),
        )
        .await
        {
            Ok(channel) => {
                self.channel = Some(channel);
                self.emit(NetEvent::ConnectionStatus {
                    partner,
                    connected: true,
                })
                .await;
            }
            Err(e) => {
                self.emit(NetEvent::Error(format!("Could not connect: {e}")))
                    .await;
            }
        }
    }

    /// Sends over the current socket. Failures are logged; `surface` also
    /// reports them to the UI.
    async fn send_frame(&self, frame: &ClientFrame, surface: bool) {
        let result = match &self.channel {
            Some(channel) => channel.send(frame),
            None => {
                tracing::warn!("dropping frame: no chat socket");
                Err(crate::chat::ChannelError::Closed)
            }
        };
        if let Err(e) = result
            && surface
        {
            self.emit(NetEvent::Error(format!("Not sent: {e}"))).await;
        }
    }

    /// Forwards events from the current socket, dropping stale ones.
    async fn forward_channel_event(&self, event: ChannelEvent) {
        let Some(current) = &self.channel else {
            return;
        };
        match event {
            ChannelEvent::Frame { partner, frame } if partner == current.partner() => {
                self.emit(NetEvent::Frame { partner, frame }).await;
            }
            ChannelEvent::Closed { partner }
                if partner == current.partner() && !current.is_connected() =>
            {
                self.emit(NetEvent::ConnectionStatus {
                    partner,
                    connected: false,
                })
                .await;
            }
            _ => {
                tracing::debug!("dropping event from a closed chat socket");
            }
        }
    }

    async fn report(&self, err: ApiError, context: &str) {
        let event = match err {
            ApiError::Unauthorized => NetEvent::Unauthorized,
            other => NetEvent::Error(format!("{context}: {other}")),
        };
        self.emit(event).await;
    }

    async fn emit(&self, event: NetEvent) {
        if self.events.send(event).await.is_err() {
            tracing::debug!("TUI dropped the event channel");
        }
    }
}
