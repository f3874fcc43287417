//! Property tests for the conversation model and the typing debounce.
//!
//! Uses proptest to verify:
//! 1. Edits and deletes never reorder, add or drop lines.
//! 2. After an edit exactly one line carries the id, with the new text.
//! 3. A deleted line never renders its text again, even after later edits.
//! 4. Every typing burst that starts is eventually stopped.

use std::time::{Duration, Instant};

use chrono::{TimeZone, Utc};
use collab::chat::{DELETED_PLACEHOLDER, MessageList, TypingDebounce};
use collab_proto::frame::IncomingMessage;
use collab_proto::models::{HistoryEntry, MessageId, UserId};
use collab_proto::typing::TypingSignal;
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Edit(usize, String),
    Delete(usize),
    Incoming(String),
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (any::<usize>(), "[a-zA-Z0-9 ]{1,24}").prop_map(|(i, t)| Op::Edit(i, t)),
        any::<usize>().prop_map(Op::Delete),
        "[a-zA-Z0-9 ]{1,24}".prop_map(Op::Incoming),
    ]
}

fn history(texts: &[String]) -> Vec<HistoryEntry> {
    texts
        .iter()
        .enumerate()
        .map(|(i, text)| {
            let mine = i % 2 == 0;
            HistoryEntry {
                id: MessageId::new(i as u64 + 1),
                sender_id: UserId::new(if mine { 1 } else { 2 }),
                sender_username: if mine { "ana" } else { "acme" }.into(),
                receiver_id: UserId::new(if mine { 2 } else { 1 }),
                receiver_username: if mine { "acme" } else { "ana" }.into(),
                message: text.clone(),
                is_self: mine,
                timestamp: Utc.timestamp_opt(1_700_000_000 + i as i64, 0).unwrap(),
                edited_at: None,
                is_deleted: false,
            }
        })
        .collect()
}

fn ids(list: &MessageList) -> Vec<Option<MessageId>> {
    list.lines().iter().map(|l| l.id).collect()
}

proptest! {
    #[test]
    fn patches_keep_order_and_length(
        texts in prop::collection::vec("[a-z]{1,12}", 1..20),
        ops in prop::collection::vec(arb_op(), 0..40),
    ) {
        let mut list = MessageList::new();
        list.load_history(history(&texts));
        let edited_at = Utc::now();
        let mut next_id = texts.len() as u64 + 1;

        for op in ops {
            let before = ids(&list);
            match op {
                Op::Edit(i, text) => {
                    let id = MessageId::new((i % (next_id as usize - 1)) as u64 + 1);
                    prop_assert!(list.apply_edit(id, &text, edited_at));
                    prop_assert_eq!(ids(&list), before);
                    let holders: Vec<_> = list.lines().iter().filter(|l| l.id == Some(id)).collect();
                    prop_assert_eq!(holders.len(), 1);
                    prop_assert_eq!(&holders[0].text, &text);
                    prop_assert_eq!(holders[0].edited_at, Some(edited_at));
                }
                Op::Delete(i) => {
                    let id = MessageId::new((i % (next_id as usize - 1)) as u64 + 1);
                    prop_assert!(list.apply_delete(id));
                    prop_assert_eq!(ids(&list), before);
                }
                Op::Incoming(text) => {
                    list.push_incoming(IncomingMessage {
                        id: Some(MessageId::new(next_id)),
                        sender_id: UserId::new(2),
                        sender_username: "acme".into(),
                        message: text,
                    });
                    next_id += 1;
                    prop_assert_eq!(list.len(), before.len() + 1);
                    prop_assert_eq!(&ids(&list)[..before.len()], &before[..]);
                }
            }
        }
    }

    #[test]
    fn deleted_text_is_never_rendered(
        texts in prop::collection::vec("[a-z]{4,12}", 1..10),
        victim in any::<usize>(),
        late_edit in "[A-Z]{4,12}",
    ) {
        let mut list = MessageList::new();
        list.load_history(history(&texts));
        let id = MessageId::new((victim % texts.len()) as u64 + 1);

        prop_assert!(list.apply_delete(id));
        // An edit that races the delete must not resurrect the text.
        list.apply_edit(id, &late_edit, Utc::now());

        let line = list.find(id).unwrap();
        prop_assert_eq!(line.rendered_text(), DELETED_PLACEHOLDER);
        prop_assert!(!line.is_modifiable());
        prop_assert_eq!(list.len(), texts.len());
    }

    #[test]
    fn unknown_ids_change_nothing(
        texts in prop::collection::vec("[a-z]{1,12}", 0..10),
        extra in 1u64..1000,
    ) {
        let mut list = MessageList::new();
        list.load_history(history(&texts));
        let missing = MessageId::new(texts.len() as u64 + extra);

        prop_assert!(!list.apply_edit(missing, "x", Utc::now()));
        prop_assert!(!list.apply_delete(missing));
        let rendered: Vec<&str> = list.lines().iter().map(|l| l.rendered_text()).collect();
        let expected: Vec<&str> = texts.iter().map(String::as_str).collect();
        prop_assert_eq!(rendered, expected);
    }

    #[test]
    fn every_typing_burst_is_stopped(
        gaps_ms in prop::collection::vec(0u64..5000, 1..30),
        timeout_ms in 100u64..3000,
    ) {
        let timeout = Duration::from_millis(timeout_ms);
        let mut debounce = TypingDebounce::new(timeout);
        let base = Instant::now();
        let mut now = base;
        let mut signals = Vec::new();

        for gap in gaps_ms {
            now += Duration::from_millis(gap);
            signals.extend(debounce.tick(now));
            signals.extend(debounce.on_input(now));
        }
        signals.extend(debounce.tick(now + timeout));

        prop_assert!(!debounce.is_typing());
        prop_assert_eq!(signals.first(), Some(&TypingSignal::Start));
        prop_assert_eq!(signals.last(), Some(&TypingSignal::Stop));
        // Start and Stop strictly alternate.
        for pair in signals.windows(2) {
            prop_assert_ne!(pair[0], pair[1]);
        }
    }
}
