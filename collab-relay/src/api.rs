//! REST endpoints: chat partner list, conversation history, notifications.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde_json::{Value, json};

use collab_proto::models::{ChatPartner, HistoryEntry, Notification, UserId};

use crate::auth::AuthUser;
use crate::relay::RelayState;
use crate::store::StoredMessage;

/// `GET /chat/users/`: every known user with presence. Unauthenticated.
pub async fn list_users(State(state): State<Arc<RelayState>>) -> Json<Vec<ChatPartner>> {
    Json(state.directory.partners().await)
}

/// `GET /chat/history/{user_id}/`: the caller's conversation with a partner,
/// oldest first.
pub async fn chat_history(
    State(state): State<Arc<RelayState>>,
    AuthUser(me): AuthUser,
    Path(partner): Path<u64>,
) -> Result<Json<Vec<HistoryEntry>>, (StatusCode, Json<Value>)> {
    let partner = UserId::new(partner);
    if !state.directory.contains(partner) {
        return Err((
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "User not found" })),
        ));
    }

    let entries = state
        .store
        .conversation(me, partner)
        .await
        .into_iter()
        .map(|m| history_entry(&state, me, m))
        .collect();
    Ok(Json(entries))
}

fn history_entry(state: &RelayState, me: UserId, m: StoredMessage) -> HistoryEntry {
    let name = |id| state.directory.username(id).unwrap_or_default().to_string();
    HistoryEntry {
        id: m.id,
        sender_id: m.sender_id,
        sender_username: name(m.sender_id),
        receiver_id: m.receiver_id,
        receiver_username: name(m.receiver_id),
        message: m.message,
        is_self: m.sender_id == me,
        timestamp: m.created_at,
        edited_at: m.edited_at,
        is_deleted: m.is_deleted,
    }
}

/// `GET /api/notifications/`: the caller's feed, newest first.
pub async fn list_notifications(
    State(state): State<Arc<RelayState>>,
    AuthUser(me): AuthUser,
) -> Json<Vec<Notification>> {
    Json(state.notifications.list(me).await)
}

/// `POST /api/notifications/{id}/read/`
pub async fn mark_notification_read(
    State(state): State<Arc<RelayState>>,
    AuthUser(me): AuthUser,
    Path(id): Path<u64>,
) -> StatusCode {
    if state.notifications.mark_read(me, id).await {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}
