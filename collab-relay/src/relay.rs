//! Relay server core: shared state, chat WebSocket handler, and routing.
//!
//! A socket is opened per (user, partner) pair at `/ws/chat/{partner}/`
//! with the bearer token in the `token` query parameter. The handshake is
//! refused for bad tokens or unknown partners. Once accepted, the socket
//! joins the pair's room and every frame it sends is applied to the
//! [`MessageStore`] and broadcast to the room.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use uuid::Uuid;

use collab_proto::codec;
use collab_proto::frame::{ClientFrame, ControlFrame, IncomingMessage, ServerFrame};
use collab_proto::models::{NotificationData, UserId};

use crate::api;
use crate::auth::{self, AuthError};
use crate::config::RelayConfig;
use crate::directory::UserDirectory;
use crate::notifications::NotificationStore;
use crate::rooms::{Member, RoomHub, RoomKey};
use crate::store::MessageStore;

/// Default maximum accepted chat message length in bytes.
const DEFAULT_MAX_MESSAGE_LEN: usize = 4096;

/// Shared relay server state.
pub struct RelayState {
    /// Known users and presence.
    pub directory: UserDirectory,
    /// Persisted chat messages.
    pub store: MessageStore,
    /// Open rooms.
    pub rooms: RoomHub,
    /// Per-user notification feeds.
    pub notifications: NotificationStore,
    jwt_secret: String,
    max_message_len: usize,
}

impl RelayState {
    /// Creates state for the given roster and token secret with default
    /// limits.
    pub fn new(users: impl IntoIterator<Item = (UserId, String)>, jwt_secret: impl Into<String>) -> Self {
        Self {
            directory: UserDirectory::new(users),
            store: MessageStore::new(),
            rooms: RoomHub::new(),
            notifications: NotificationStore::new(),
            jwt_secret: jwt_secret.into(),
            max_message_len: DEFAULT_MAX_MESSAGE_LEN,
        }
    }

    /// Creates state from a resolved [`RelayConfig`].
    #[must_use]
    pub fn with_config(config: &RelayConfig) -> Self {
        Self {
            directory: UserDirectory::new(
                config
                    .users
                    .iter()
                    .map(|u| (u.id, u.username.clone())),
            ),
            store: MessageStore::new(),
            rooms: RoomHub::new(),
            notifications: NotificationStore::with_max_per_user(config.max_notifications),
            jwt_secret: config.jwt_secret.clone(),
            max_message_len: config.max_message_len,
        }
    }

    /// Resolves a bearer token to a known user.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError`] if the token is invalid or names an unknown
    /// user.
    pub fn authenticate(&self, token: &str) -> Result<UserId, AuthError> {
        let user = auth::verify_token(&self.jwt_secret, token)?;
        if self.directory.contains(user) {
            Ok(user)
        } else {
            Err(AuthError::UnknownUser(user))
        }
    }
}

/// The identity a chat socket runs under.
#[derive(Debug, Clone)]
struct Session {
    user_id: UserId,
    username: String,
    partner_id: UserId,
    room: RoomKey,
}

/// axum handler that authenticates and upgrades a chat socket.
async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<RelayState>>,
    Path(partner): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let user_id = match params.get("token").map(|t| state.authenticate(t)) {
        Some(Ok(id)) => id,
        Some(Err(e)) => {
            tracing::warn!(error = %e, "chat socket refused: bad token");
            return StatusCode::FORBIDDEN.into_response();
        }
        None => {
            tracing::warn!("chat socket refused: no token");
            return StatusCode::FORBIDDEN.into_response();
        }
    };

    let Ok(partner_id) = partner.parse::<UserId>() else {
        tracing::warn!(partner = %partner, "chat socket refused: bad partner id");
        return StatusCode::FORBIDDEN.into_response();
    };
    if !state.directory.contains(partner_id) {
        tracing::warn!(partner = %partner_id, "chat socket refused: unknown partner");
        return StatusCode::FORBIDDEN.into_response();
    }

    let username = state
        .directory
        .username(user_id)
        .unwrap_or_default()
        .to_string();
    let session = Session {
        user_id,
        username,
        partner_id,
        room: RoomKey::new(user_id, partner_id),
    };

    ws.on_upgrade(move |socket| handle_socket(socket, state, session))
}

/// Runs one accepted chat socket until either side closes it.
///
/// The connection lifecycle:
/// 1. Mark the user online and join the pair's room.
/// 2. Announce `user_online` to the room.
/// 3. Pump frames: the reader applies them, the writer drains the room
///    channel.
/// 4. On close, leave the room and announce `user_offline` if this was the
///    user's last socket.
async fn handle_socket(socket: WebSocket, state: Arc<RelayState>, session: Session) {
    let (mut ws_sender, mut ws_receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<Message>();
    let conn_id = Uuid::now_v7();

    state.directory.connect(session.user_id).await;
    state
        .rooms
        .join(
            session.room,
            conn_id,
            Member {
                user_id: session.user_id,
                sender: tx,
            },
        )
        .await;

    tracing::info!(
        user = %session.username,
        room = %session.room,
        conn = %conn_id,
        "chat socket connected"
    );

    state
        .rooms
        .broadcast(
            session.room,
            &ServerFrame::UserOnline {
                user_id: session.user_id,
            },
            None,
        )
        .await;

    let writer_conn = conn_id;
    let mut write_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if ws_sender.send(msg).await.is_err() {
                tracing::warn!(conn = %writer_conn, "WebSocket write failed");
                break;
            }
        }
    });

    let reader_state = Arc::clone(&state);
    let reader_session = session.clone();
    let mut read_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = ws_receiver.next().await {
            match msg {
                Message::Text(text) => {
                    handle_text(&reader_session, text.as_str(), &reader_state).await;
                }
                Message::Close(_) => {
                    tracing::debug!(user = %reader_session.username, "received close frame");
                    break;
                }
                _ => {
                    // Binary, ping and pong frames carry nothing for chat.
                }
            }
        }
    });

    tokio::select! {
        _ = &mut read_task => {
            write_task.abort();
        }
        _ = &mut write_task => {
            read_task.abort();
        }
    }

    state.rooms.leave(session.room, conn_id).await;
    if state.directory.disconnect(session.user_id).await {
        state
            .rooms
            .broadcast(
                session.room,
                &ServerFrame::UserOffline {
                    user_id: session.user_id,
                },
                None,
            )
            .await;
    }
    tracing::info!(user = %session.username, room = %session.room, "chat socket disconnected");
}

/// Applies one text frame from a connected socket.
async fn handle_text(session: &Session, text: &str, state: &Arc<RelayState>) {
    let frame = match codec::decode_client(text) {
        Ok(f) => f,
        Err(e) => {
            tracing::warn!(user = %session.username, error = %e, "dropping malformed frame");
            return;
        }
    };

    match frame {
        ClientFrame::Control(ControlFrame::TypingStart { .. }) => {
            let out = ServerFrame::TypingStart {
                sender_username: session.username.clone(),
            };
            state
                .rooms
                .broadcast(session.room, &out, Some(session.user_id))
                .await;
        }
        ClientFrame::Control(ControlFrame::TypingStop { .. }) => {
            let out = ServerFrame::TypingStop {
                sender_username: session.username.clone(),
            };
            state
                .rooms
                .broadcast(session.room, &out, Some(session.user_id))
                .await;
        }
        ClientFrame::Control(ControlFrame::EditMessage {
            message_id,
            new_message,
        }) => {
            let Some(new_text) = accept_text(session, &new_message, state) else {
                return;
            };
            match state
                .store
                .edit(message_id, session.user_id, session.room, new_text)
                .await
            {
                Ok(msg) => {
                    let out = ServerFrame::MessageEdited {
                        message_id: msg.id,
                        new_message: msg.message,
                        edited_at: msg.edited_at.unwrap_or_else(chrono::Utc::now),
                    };
                    state.rooms.broadcast(session.room, &out, None).await;
                }
                Err(e) => {
                    tracing::warn!(user = %session.username, error = %e, "edit refused");
                }
            }
        }
        ClientFrame::Control(ControlFrame::DeleteMessage { message_id }) => {
            match state
                .store
                .delete(message_id, session.user_id, session.room)
                .await
            {
                Ok(msg) => {
                    let out = ServerFrame::MessageDeleted { message_id: msg.id };
                    state.rooms.broadcast(session.room, &out, None).await;
                }
                Err(e) => {
                    tracing::warn!(user = %session.username, error = %e, "delete refused");
                }
            }
        }
        ClientFrame::Message(outgoing) => {
            let Some(body) = accept_text(session, &outgoing.message, state) else {
                return;
            };
            let stored = state
                .store
                .create(session.user_id, session.partner_id, body)
                .await;

            tracing::debug!(
                from = %session.user_id,
                to = %session.partner_id,
                id = %stored.id,
                "message stored"
            );

            let out = ServerFrame::NewMessage(IncomingMessage {
                id: Some(stored.id),
                sender_id: session.user_id,
                sender_username: session.username.clone(),
                message: stored.message,
            });
            state
                .rooms
                .broadcast(session.room, &out, Some(session.user_id))
                .await;

            if !state.rooms.has_member(session.room, session.partner_id).await {
                state
                    .notifications
                    .push(
                        session.partner_id,
                        format!("New message from {}", session.username),
                        Some(NotificationData::ChatMessage {
                            sender_id: session.user_id,
                        }),
                    )
                    .await;
            }
        }
    }
}

/// Trims chat text and enforces the length limit. Returns `None` for text
/// that should be dropped.
fn accept_text<'a>(session: &Session, raw: &'a str, state: &RelayState) -> Option<&'a str> {
    let text = raw.trim();
    if text.is_empty() {
        return None;
    }
    if text.len() > state.max_message_len {
        tracing::warn!(
            user = %session.username,
            size = text.len(),
            max = state.max_message_len,
            "message exceeds size limit"
        );
        return None;
    }
    Some(text)
}

/// Builds the relay's router: chat socket plus REST endpoints.
pub fn router(state: Arc<RelayState>) -> axum::Router {
    axum::Router::new()
        .route("/ws/chat/{partner}/", axum::routing::get(ws_handler))
        .route("/chat/users/", axum::routing::get(api::list_users))
        .route(
            "/chat/history/{user_id}/",
            axum::routing::get(api::chat_history),
        )
        .route(
            "/api/notifications/",
            axum::routing::get(api::list_notifications),
        )
        .route(
            "/api/notifications/{id}/read/",
            axum::routing::post(api::mark_notification_read),
        )
        .with_state(state)
}

/// Starts the relay server with a pre-configured [`RelayState`].
///
/// Returns the bound address and the serving task's handle. Binding to
/// port 0 picks a free port, which tests rely on.
///
/// # Errors
///
/// Returns an error if the TCP listener cannot bind to the given address.
pub async fn start_server_with_state(
    addr: &str,
    state: Arc<RelayState>,
) -> Result<
    (std::net::SocketAddr, tokio::task::JoinHandle<()>),
    Box<dyn std::error::Error + Send + Sync>,
> {
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let bound_addr = listener.local_addr()?;

    let handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!(error = %e, "relay server error");
        }
    });

    Ok((bound_addr, handle))
}
