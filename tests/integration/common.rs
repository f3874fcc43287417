//! Shared harness: an in-process relay and helpers for driving `spawn_net`.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use collab::net::{self, NetCommand, NetConfig, NetEvent};
use collab_proto::frame::ServerFrame;
use collab_proto::models::UserId;
use collab_relay::auth::issue_token;
use collab_relay::relay::{RelayState, start_server_with_state};

pub const SECRET: &str = "integration-secret";
pub const ANA: UserId = UserId::new(1);
pub const ACME: UserId = UserId::new(2);
pub const BOLT: UserId = UserId::new(3);

pub type Net = (mpsc::Sender<NetCommand>, mpsc::Receiver<NetEvent>);

/// Start a relay with three users on a free port.
pub async fn start_relay() -> (SocketAddr, Arc<RelayState>) {
    let state = Arc::new(RelayState::new(
        [
            (ANA, "ana".to_string()),
            (ACME, "acme".to_string()),
            (BOLT, "bolt".to_string()),
        ],
        SECRET,
    ));
    let (addr, _handle) = start_server_with_state("127.0.0.1:0", Arc::clone(&state))
        .await
        .expect("failed to start relay server");
    (addr, state)
}

pub fn token(user: UserId) -> String {
    issue_token(SECRET, user, Duration::from_secs(3600)).expect("token")
}

pub fn net_config(addr: SocketAddr, user: UserId, token: String) -> NetConfig {
    let mut config = NetConfig::new(
        format!("http://{addr}"),
        format!("ws://{addr}/ws"),
        token,
        user,
    );
    config.connect_timeout = Duration::from_secs(5);
    config.notification_poll = Duration::from_secs(3600);
    config
}

/// Spawn a session for `user` and wait for the partner list.
pub async fn sign_in(addr: SocketAddr, user: UserId) -> Net {
    let (tx, mut rx) = net::spawn_net(net_config(addr, user, token(user))).expect("spawn_net");
    wait_for(&mut rx, |e| matches!(e, NetEvent::UsersLoaded(_))).await;
    (tx, rx)
}

/// Receive events until one matches, panicking after five seconds.
pub async fn wait_for(
    rx: &mut mpsc::Receiver<NetEvent>,
    mut pred: impl FnMut(&NetEvent) -> bool,
) -> NetEvent {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    loop {
        match tokio::time::timeout_at(deadline, rx.recv()).await {
            Ok(Some(event)) if pred(&event) => return event,
            Ok(Some(_)) => {}
            Ok(None) => panic!("event channel closed"),
            Err(_) => panic!("timed out waiting for event"),
        }
    }
}

/// Receive the next frame from the given partner's socket.
pub async fn next_frame(rx: &mut mpsc::Receiver<NetEvent>, from: UserId) -> ServerFrame {
    match wait_for(rx, |e| matches!(e, NetEvent::Frame { partner, .. } if *partner == from)).await {
        NetEvent::Frame { frame, .. } => frame,
        _ => unreachable!(),
    }
}

/// Whether any event matching `pred` arrives within `window`.
pub async fn arrives_within(
    rx: &mut mpsc::Receiver<NetEvent>,
    window: Duration,
    mut pred: impl FnMut(&NetEvent) -> bool,
) -> bool {
    let deadline = tokio::time::Instant::now() + window;
    while let Ok(Some(event)) = tokio::time::timeout_at(deadline, rx.recv()).await {
        if pred(&event) {
            return true;
        }
    }
    false
}

/// Select `partner` and wait until the socket is open.
pub async fn open_chat(net: &mut Net, partner: UserId) {
    net.0
        .send(NetCommand::SelectPartner(partner))
        .await
        .expect("session task gone");
    wait_for(&mut net.1, |e| {
        matches!(e, NetEvent::ConnectionStatus { partner: p, connected: true } if *p == partner)
    })
    .await;
}

/// Open a conversation between `ana` and `acme` on both ends and wait until
/// both sockets have joined the room.
pub async fn connected_pair(addr: SocketAddr) -> (Net, Net) {
    let mut ana = sign_in(addr, ANA).await;
    let mut acme = sign_in(addr, ACME).await;
    open_chat(&mut ana, ACME).await;
    open_chat(&mut acme, ANA).await;
    // Joins are announced to the whole room, so both sides see acme's.
    for net in [&mut ana, &mut acme] {
        wait_for(&mut net.1, |e| {
            matches!(
                e,
                NetEvent::Frame { frame: ServerFrame::UserOnline { user_id }, .. } if *user_id == ACME
            )
        })
        .await;
    }
    (ana, acme)
}

/// Poll `check` until it holds, panicking after two seconds.
pub async fn eventually<F, Fut>(what: &str, mut check: F)
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while !check().await {
        assert!(tokio::time::Instant::now() < deadline, "timed out: {what}");
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}
