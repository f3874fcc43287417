//! Integration tests for the REST client against the relay's endpoints.

mod common;

use std::net::SocketAddr;
use std::time::Duration;

use reqwest::StatusCode;

use collab::api::{ApiClient, ApiError};
use collab::net::{self, NetCommand, NetEvent};
use collab_proto::models::{NotificationData, UserId};

use common::{ACME, ANA, open_chat, sign_in, start_relay, token, wait_for};

fn client(addr: SocketAddr, token: &str) -> ApiClient {
    ApiClient::new(&format!("http://{addr}"), token, Duration::from_secs(5)).expect("client")
}

#[tokio::test]
async fn users_carry_presence() {
    let (addr, _state) = start_relay().await;
    let mut ana = sign_in(addr, ANA).await;
    open_chat(&mut ana, ACME).await;

    let acme = client(addr, &token(ACME));
    let mut users = acme.chat_users().await.unwrap();
    // The socket may still be settling on the server side.
    for _ in 0..50 {
        if users.iter().any(|u| u.id == ANA && u.is_online) {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
        users = acme.chat_users().await.unwrap();
    }
    assert!(users.iter().any(|u| u.id == ANA && u.is_online));
    assert!(users.iter().any(|u| u.id == ACME && !u.is_online));
}

#[tokio::test]
async fn history_for_unknown_user_is_not_found() {
    let (addr, _state) = start_relay().await;
    let ana = client(addr, &token(ANA));
    match ana.chat_history(UserId::new(404)).await {
        Err(ApiError::Status { status, .. }) => assert_eq!(status, StatusCode::NOT_FOUND),
        other => panic!("expected 404, got {other:?}"),
    }
}

#[tokio::test]
async fn rejected_token_maps_to_unauthorized() {
    let (addr, _state) = start_relay().await;
    let ana = client(addr, "not-a-token");
    assert!(matches!(
        ana.chat_history(ACME).await,
        Err(ApiError::Unauthorized)
    ));
    assert!(matches!(
        ana.notifications().await,
        Err(ApiError::Unauthorized)
    ));
}

#[tokio::test]
async fn session_with_rejected_token_reports_unauthorized() {
    let (addr, _state) = start_relay().await;
    let mut config = common::net_config(addr, ANA, "expired".to_string());
    config.notification_poll = Duration::from_millis(100);
    let (_tx, mut rx) = net::spawn_net(config).expect("spawn_net");

    wait_for(&mut rx, |e| matches!(e, NetEvent::Unauthorized)).await;
}

#[tokio::test]
async fn offline_partner_is_notified_and_can_mark_read() {
    let (addr, _state) = start_relay().await;
    let mut ana = sign_in(addr, ANA).await;
    open_chat(&mut ana, ACME).await;
    ana.0
        .send(NetCommand::SendMessage {
            text: "Are you free next week?".into(),
        })
        .await
        .unwrap();

    let acme = client(addr, &token(ACME));
    let mut feed = acme.notifications().await.unwrap();
    for _ in 0..50 {
        if !feed.is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
        feed = acme.notifications().await.unwrap();
    }
    assert_eq!(feed.len(), 1);
    assert_eq!(feed[0].message, "New message from ana");
    assert_eq!(
        feed[0].data,
        Some(NotificationData::ChatMessage { sender_id: ANA })
    );
    assert!(!feed[0].is_read);

    acme.mark_notification_read(feed[0].id).await.unwrap();
    assert!(acme.notifications().await.unwrap()[0].is_read);

    match acme.mark_notification_read(9999).await {
        Err(ApiError::Status { status, .. }) => assert_eq!(status, StatusCode::NOT_FOUND),
        other => panic!("expected 404, got {other:?}"),
    }
}

#[tokio::test]
async fn poller_delivers_notification_feed() {
    let (addr, state) = start_relay().await;
    state
        .notifications
        .push(ANA, "Acme invited you to a project", None)
        .await;

    let mut config = common::net_config(addr, ANA, token(ANA));
    config.notification_poll = Duration::from_millis(100);
    let (_tx, mut rx) = net::spawn_net(config).expect("spawn_net");

    match wait_for(&mut rx, |e| matches!(e, NetEvent::Notifications(_))).await {
        NetEvent::Notifications(feed) => {
            assert_eq!(feed.unread_count(), 1);
            assert_eq!(feed.items[0].message, "Acme invited you to a project");
        }
        _ => unreachable!(),
    }
}
