//! Integration tests for editing and deleting messages over the chat socket.
//!
//! Edits and deletes are applied by the server and echoed to both members;
//! clients only patch their view from that echo.

mod common;

use std::time::Duration;

use collab::chat::{ChatView, DELETED_PLACEHOLDER, FrameEffect};
use collab::net::{NetCommand, NetEvent};
use collab_proto::frame::ServerFrame;
use collab_proto::models::MessageId;

use common::{ACME, ANA, Net, arrives_within, connected_pair, next_frame, start_relay};

/// Ana sends `text`; acme folds it into `view`. Returns the stored id.
async fn ana_says(ana: &Net, acme: &mut Net, text: &str, view: &mut ChatView) -> MessageId {
    ana.0
        .send(NetCommand::SendMessage { text: text.into() })
        .await
        .unwrap();
    let frame = next_frame(&mut acme.1, ANA).await;
    let ServerFrame::NewMessage(ref msg) = frame else {
        panic!("expected new message, got {frame:?}");
    };
    let id = msg.id.expect("stored messages carry an id");
    assert_eq!(view.apply_frame(ANA, frame), FrameEffect::Appended);
    id
}

#[tokio::test]
async fn author_edit_is_echoed_to_both_members() {
    let (addr, state) = start_relay().await;
    let (mut ana, mut acme) = connected_pair(addr).await;
    let mut acme_view = ChatView::new(ACME);
    acme_view.select(ANA);

    let id = ana_says(&ana, &mut acme, "rate is 500", &mut acme_view).await;
    ana.0
        .send(NetCommand::EditMessage {
            message_id: id,
            text: "rate is 450".into(),
        })
        .await
        .unwrap();

    let to_ana = next_frame(&mut ana.1, ACME).await;
    let to_acme = next_frame(&mut acme.1, ANA).await;
    assert_eq!(to_ana, to_acme);
    let ServerFrame::MessageEdited {
        message_id,
        ref new_message,
        ..
    } = to_acme
    else {
        panic!("expected edit echo, got {to_acme:?}");
    };
    assert_eq!(message_id, id);
    assert_eq!(new_message, "rate is 450");

    assert_eq!(acme_view.apply_frame(ANA, to_acme), FrameEffect::Patched);
    let line = acme_view.messages.find(id).expect("line kept");
    assert_eq!(line.rendered_text(), "rate is 450");
    assert!(line.edited_at.is_some());

    let stored = state.store.conversation(ANA, ACME).await;
    assert_eq!(stored[0].message, "rate is 450");
}

#[tokio::test]
async fn author_delete_leaves_placeholder() {
    let (addr, state) = start_relay().await;
    let (mut ana, mut acme) = connected_pair(addr).await;
    let mut acme_view = ChatView::new(ACME);
    acme_view.select(ANA);

    let keep = ana_says(&ana, &mut acme, "first", &mut acme_view).await;
    let gone = ana_says(&ana, &mut acme, "second", &mut acme_view).await;
    ana.0
        .send(NetCommand::DeleteMessage { message_id: gone })
        .await
        .unwrap();

    assert_eq!(
        next_frame(&mut ana.1, ACME).await,
        ServerFrame::MessageDeleted { message_id: gone }
    );
    let frame = next_frame(&mut acme.1, ANA).await;
    assert_eq!(acme_view.apply_frame(ANA, frame), FrameEffect::Patched);

    let lines = acme_view.messages.lines();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0].id, Some(keep));
    assert_eq!(lines[1].rendered_text(), DELETED_PLACEHOLDER);

    let stored = state.store.conversation(ANA, ACME).await;
    assert!(stored[1].is_deleted);
    assert!(!stored[0].is_deleted);
}

#[tokio::test]
async fn partner_cannot_modify_foreign_message() {
    let (addr, state) = start_relay().await;
    let (ana, mut acme) = connected_pair(addr).await;
    let mut acme_view = ChatView::new(ACME);
    acme_view.select(ANA);

    let id = ana_says(&ana, &mut acme, "mine", &mut acme_view).await;
    acme.0
        .send(NetCommand::EditMessage {
            message_id: id,
            text: "hijacked".into(),
        })
        .await
        .unwrap();
    acme.0
        .send(NetCommand::DeleteMessage { message_id: id })
        .await
        .unwrap();

    let echoed = arrives_within(&mut acme.1, Duration::from_millis(300), |e| {
        matches!(
            e,
            NetEvent::Frame {
                frame: ServerFrame::MessageEdited { .. } | ServerFrame::MessageDeleted { .. },
                ..
            }
        )
    })
    .await;
    assert!(!echoed);

    let stored = state.store.conversation(ANA, ACME).await;
    assert_eq!(stored[0].message, "mine");
    assert!(!stored[0].is_deleted);
}
