//! Property tests for chat frame decoding.
//!
//! Uses proptest to verify:
//! 1. Arbitrary text never panics the decoders.
//! 2. Any server frame decodes back to itself.
//! 3. A plain-shaped frame with an unknown `type` is always read as a message.

use chrono::{TimeZone, Utc};
use collab_proto::codec;
use collab_proto::frame::{IncomingMessage, ServerFrame};
use collab_proto::models::{MessageId, UserId};
use proptest::prelude::*;

fn arb_text() -> impl Strategy<Value = String> {
    "[^\x00]{0,256}"
}

fn arb_incoming() -> impl Strategy<Value = IncomingMessage> {
    (
        proptest::option::of(any::<u32>()),
        any::<u32>(),
        "[a-z]{1,16}",
        arb_text(),
    )
        .prop_map(|(id, sender, username, message)| IncomingMessage {
            id: id.map(|n| MessageId::new(u64::from(n))),
            sender_id: UserId::new(u64::from(sender)),
            sender_username: username,
            message,
        })
}

fn arb_server_frame() -> impl Strategy<Value = ServerFrame> {
    prop_oneof![
        "[a-z]{1,16}".prop_map(|sender_username| ServerFrame::TypingStart { sender_username }),
        "[a-z]{1,16}".prop_map(|sender_username| ServerFrame::TypingStop { sender_username }),
        (any::<u32>(), arb_text(), 0i64..4_000_000_000).prop_map(|(id, text, secs)| {
            ServerFrame::MessageEdited {
                message_id: MessageId::new(u64::from(id)),
                new_message: text,
                edited_at: Utc.timestamp_opt(secs, 0).single().unwrap_or_default(),
            }
        }),
        any::<u32>().prop_map(|id| ServerFrame::MessageDeleted {
            message_id: MessageId::new(u64::from(id)),
        }),
        any::<u32>().prop_map(|id| ServerFrame::UserOnline {
            user_id: UserId::new(u64::from(id)),
        }),
        any::<u32>().prop_map(|id| ServerFrame::UserOffline {
            user_id: UserId::new(u64::from(id)),
        }),
        arb_incoming().prop_map(ServerFrame::NewMessage),
    ]
}

proptest! {
    /// Random text never causes a panic in either decoder.
    #[test]
    fn random_text_decode_no_panic(text in ".{0,512}") {
        let _ = codec::decode_server(&text);
        let _ = codec::decode_client(&text);
    }

    /// Every server frame decodes back to the same frame.
    #[test]
    fn server_frame_decodes_to_itself(frame in arb_server_frame()) {
        let text = codec::encode_server(&frame).expect("encode should succeed");
        let decoded = codec::decode_server(&text).expect("decode should succeed");
        prop_assert_eq!(frame, decoded);
    }

    /// Unknown `type` values never hide a plain chat message.
    #[test]
    fn unknown_type_falls_back_to_message(
        msg in arb_incoming(),
        tag in "[a-z_]{1,12}".prop_filter("known tag", |t| !ServerFrame::TAGS.contains(&t.as_str())),
    ) {
        let mut value = serde_json::to_value(&msg).expect("to_value should succeed");
        value["type"] = serde_json::Value::String(tag);
        let decoded = codec::decode_server(&value.to_string()).expect("decode should succeed");
        prop_assert_eq!(decoded, ServerFrame::NewMessage(msg));
    }
}
