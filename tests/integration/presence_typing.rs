//! Integration tests for presence announcements and typing indicators.

mod common;

use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent};

use collab::app::App;
use collab::net::{NetCommand, NetEvent};
use collab_proto::frame::ServerFrame;
use collab_proto::typing::TypingSignal;

use common::{ACME, ANA, connected_pair, next_frame, open_chat, sign_in, start_relay, wait_for};

#[tokio::test]
async fn partner_presence_follows_their_socket() {
    let (addr, state) = start_relay().await;
    let mut ana = sign_in(addr, ANA).await;
    open_chat(&mut ana, ACME).await;

    let mut acme = sign_in(addr, ACME).await;
    open_chat(&mut acme, ANA).await;
    // Ana first hears her own join, then acme's.
    wait_for(&mut ana.1, |e| {
        matches!(
            e,
            NetEvent::Frame { frame: ServerFrame::UserOnline { user_id }, .. } if *user_id == ACME
        )
    })
    .await;
    assert!(state.directory.is_online(ACME).await);

    acme.0.send(NetCommand::Shutdown).await.unwrap();
    assert_eq!(
        next_frame(&mut ana.1, ACME).await,
        ServerFrame::UserOffline { user_id: ACME }
    );
    assert!(!state.directory.is_online(ACME).await);
}

#[tokio::test]
async fn typing_start_and_stop_reach_partner_with_username() {
    let (addr, _state) = start_relay().await;
    let (ana, mut acme) = connected_pair(addr).await;

    ana.0
        .send(NetCommand::Typing(TypingSignal::Start))
        .await
        .unwrap();
    assert_eq!(
        next_frame(&mut acme.1, ANA).await,
        ServerFrame::TypingStart {
            sender_username: "ana".into()
        }
    );

    ana.0
        .send(NetCommand::Typing(TypingSignal::Stop))
        .await
        .unwrap();
    assert_eq!(
        next_frame(&mut acme.1, ANA).await,
        ServerFrame::TypingStop {
            sender_username: "ana".into()
        }
    );
}

#[tokio::test]
async fn typing_burst_shows_then_clears_indicator() {
    let (addr, _state) = start_relay().await;
    let (mut ana, mut acme) = connected_pair(addr).await;

    // Ana's app drives the debounce; her session carries the signals.
    let mut ana_app = App::new(ANA, Duration::from_millis(200));
    ana_app.view.select(ACME);
    ana_app.apply_net_event(NetEvent::ConnectionStatus {
        partner: ACME,
        connected: true,
    });
    ana_app.focus = collab::app::PanelFocus::Input;

    let mut acme_app = App::new(ACME, Duration::from_millis(200));
    acme_app.view.select(ANA);

    let start = Instant::now();
    let mut sent = Vec::new();
    for c in "hey".chars() {
        sent.extend(ana_app.handle_key_event(KeyEvent::from(KeyCode::Char(c)), start));
    }
    assert_eq!(sent, vec![NetCommand::Typing(TypingSignal::Start)]);
    for cmd in sent {
        ana.0.send(cmd).await.unwrap();
    }

    let frame = next_frame(&mut acme.1, ANA).await;
    acme_app.apply_net_event(NetEvent::Frame {
        partner: ANA,
        frame,
    });
    assert_eq!(acme_app.view.typing_user(), Some("ana"));

    let stop = ana_app
        .tick(start + Duration::from_millis(250))
        .expect("idle composer stops typing");
    ana.0.send(stop).await.unwrap();

    let frame = next_frame(&mut acme.1, ANA).await;
    acme_app.apply_net_event(NetEvent::Frame {
        partner: ANA,
        frame,
    });
    assert_eq!(acme_app.view.typing_user(), None);

    // Ana's own session never sees her typing frames.
    assert!(
        !common::arrives_within(&mut ana.1, Duration::from_millis(200), |e| {
            matches!(e, NetEvent::Frame { frame: ServerFrame::TypingStart { .. }, .. })
        })
        .await
    );
}
