//! Integration tests for the chat session: partner list, history, message
//! exchange and switching conversations against an in-process relay.

mod common;

use std::time::Duration;

use collab::app::App;
use collab::net::{NetCommand, NetEvent};
use collab_proto::frame::ServerFrame;
use collab_relay::rooms::RoomKey;

use common::{
    ACME, ANA, BOLT, connected_pair, eventually, next_frame, open_chat, sign_in, start_relay,
    wait_for,
};

#[tokio::test]
async fn partner_list_is_loaded_on_start() {
    let (addr, _state) = start_relay().await;
    let (_tx, mut rx) = collab::net::spawn_net(common::net_config(addr, ANA, common::token(ANA)))
        .expect("spawn_net");

    match wait_for(&mut rx, |e| matches!(e, NetEvent::UsersLoaded(_))).await {
        NetEvent::UsersLoaded(users) => {
            let names: Vec<&str> = users.iter().map(|u| u.username.as_str()).collect();
            assert_eq!(names, ["ana", "acme", "bolt"]);
            assert!(users.iter().all(|u| !u.is_online));
        }
        _ => unreachable!(),
    }
}

#[tokio::test]
async fn history_is_loaded_before_socket_opens() {
    let (addr, state) = start_relay().await;
    state.store.create(ACME, ANA, "earlier from acme").await;
    state.store.create(ANA, ACME, "earlier from ana").await;

    let mut ana = sign_in(addr, ANA).await;
    ana.0.send(NetCommand::SelectPartner(ACME)).await.unwrap();

    let history = wait_for(&mut ana.1, |e| {
        matches!(e, NetEvent::HistoryLoaded { .. } | NetEvent::ConnectionStatus { .. })
    })
    .await;
    let NetEvent::HistoryLoaded { partner, entries } = history else {
        panic!("history must arrive before the socket opens, got {history:?}");
    };
    assert_eq!(partner, ACME);
    assert_eq!(entries.len(), 2);
    assert!(!entries[0].is_self);
    assert!(entries[1].is_self);
    assert_eq!(entries[1].message, "earlier from ana");

    wait_for(&mut ana.1, |e| {
        matches!(e, NetEvent::ConnectionStatus { partner, connected: true } if *partner == ACME)
    })
    .await;
}

#[tokio::test]
async fn messages_flow_between_partners() {
    let (addr, state) = start_relay().await;
    let (ana, mut acme) = connected_pair(addr).await;

    ana.0
        .send(NetCommand::SendMessage {
            text: "Loved your reel, want to collaborate?".into(),
        })
        .await
        .unwrap();

    match next_frame(&mut acme.1, ANA).await {
        ServerFrame::NewMessage(msg) => {
            assert_eq!(msg.sender_id, ANA);
            assert_eq!(msg.sender_username, "ana");
            assert_eq!(msg.message, "Loved your reel, want to collaborate?");
            assert!(msg.id.is_some());
        }
        other => panic!("expected new message, got {other:?}"),
    }
    assert_eq!(state.store.len().await, 1);
}

#[tokio::test]
async fn incoming_message_lands_in_the_app_view() {
    let (addr, _state) = start_relay().await;
    let (ana, mut acme) = connected_pair(addr).await;

    let mut app = App::new(ACME, Duration::from_secs(2));
    app.view.select(ANA);
    app.apply_net_event(NetEvent::ConnectionStatus {
        partner: ANA,
        connected: true,
    });

    ana.0
        .send(NetCommand::SendMessage { text: "hi acme".into() })
        .await
        .unwrap();
    let frame = next_frame(&mut acme.1, ANA).await;
    app.apply_net_event(NetEvent::Frame {
        partner: ANA,
        frame,
    });

    let last = app.view.messages.lines().last().expect("a line");
    assert_eq!(last.rendered_text(), "hi acme");
    assert_eq!(last.sender_label(), "ana");
    assert!(!last.is_system());
}

#[tokio::test]
async fn switching_partner_closes_previous_socket() {
    let (addr, state) = start_relay().await;
    let rooms = &state.rooms;
    let mut ana = sign_in(addr, ANA).await;
    open_chat(&mut ana, ACME).await;
    eventually("ana joins the acme room", move || async move {
        rooms.member_count(RoomKey::new(ANA, ACME)).await == 1
    })
    .await;

    ana.0.send(NetCommand::SelectPartner(BOLT)).await.unwrap();
    wait_for(&mut ana.1, |e| {
        matches!(e, NetEvent::ConnectionStatus { partner, connected: false } if *partner == ACME)
    })
    .await;
    wait_for(&mut ana.1, |e| {
        matches!(e, NetEvent::ConnectionStatus { partner, connected: true } if *partner == BOLT)
    })
    .await;

    eventually("ana leaves the acme room", move || async move {
        rooms.member_count(RoomKey::new(ANA, ACME)).await == 0
    })
    .await;
    eventually("ana joins the bolt room", move || async move {
        rooms.member_count(RoomKey::new(ANA, BOLT)).await == 1
    })
    .await;
}

#[tokio::test]
async fn sending_without_a_conversation_reports_error() {
    let (addr, state) = start_relay().await;
    let mut ana = sign_in(addr, ANA).await;

    ana.0
        .send(NetCommand::SendMessage { text: "hello?".into() })
        .await
        .unwrap();
    wait_for(&mut ana.1, |e| matches!(e, NetEvent::Error(_))).await;
    assert!(state.store.is_empty().await);
}
