// Integration tests for the conversation store
//
// These tests verify append-only ordering, id-keyed patching and the
// change notifications the view renders from.

use plant_chat::{
    ConversationStore, Message, MessageId, MessagePatch, Sender, StoreError, StoreEvent,
};

#[tokio::test]
async fn test_all_returns_messages_in_append_order() {
    let store = ConversationStore::new();

    // ids deliberately out of numeric order; order follows the append calls
    let ids = [MessageId(5), MessageId(2), MessageId(9), MessageId(1)];
    for (i, id) in ids.iter().enumerate() {
        store
            .append(Message::own_text(*id, format!("message {}", i)))
            .await
            .unwrap();
    }

    let all = store.all().await;
    let order: Vec<MessageId> = all.iter().map(|m| m.id).collect();
    assert_eq!(order, ids.to_vec());
    assert_eq!(all[2].final_text, "message 2");
}

#[tokio::test]
async fn test_next_id_is_monotonic() {
    let store = ConversationStore::new();
    let a = store.next_id();
    let b = store.next_id();
    let c = store.next_id();
    assert!(a < b && b < c);
}

#[tokio::test]
async fn test_duplicate_id_is_rejected() {
    let store = ConversationStore::new();
    store.append(Message::own_text(MessageId(1), "first")).await.unwrap();

    let err = store
        .append(Message::own_text(MessageId(1), "second"))
        .await
        .unwrap_err();

    assert_eq!(err, StoreError::DuplicateId(MessageId(1)));
    let all = store.all().await;
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].final_text, "first");
}

#[tokio::test]
async fn test_patch_unknown_id_is_noop() {
    let store = ConversationStore::new();
    store.append(Message::own_text(MessageId(1), "hi")).await.unwrap();

    let applied = store
        .patch(MessageId(42), MessagePatch::displayed("x").with_final("x"))
        .await;

    assert!(!applied);
    assert_eq!(store.len().await, 1);
    assert!(store.get(MessageId(42)).await.is_none());
}

#[tokio::test]
async fn test_patch_targets_by_id_not_position() {
    let store = ConversationStore::new();
    store.append(Message::remote_placeholder(MessageId(1))).await.unwrap();
    store.append(Message::remote_placeholder(MessageId(2))).await.unwrap();

    // patch the first message while a later one exists
    store
        .patch(
            MessageId(1),
            MessagePatch::displayed("Wa").with_final("Water"),
        )
        .await;

    let all = store.all().await;
    assert_eq!(all[0].displayed_text, "Wa");
    assert_eq!(all[1].displayed_text, "");
}

#[tokio::test]
async fn test_patch_rejects_broken_invariants() {
    let store = ConversationStore::new();
    store.append(Message::remote_text(MessageId(1), "settled")).await.unwrap();

    // a settled message cannot start revealing again
    let restarted = store
        .patch(MessageId(1), MessagePatch::default().with_revealing(true))
        .await;
    assert!(!restarted);

    // displayed text must stay a prefix of the final text
    let overlong = store
        .patch(MessageId(1), MessagePatch::displayed("settled and more"))
        .await;
    assert!(!overlong);

    let msg = store.get(MessageId(1)).await.unwrap();
    assert!(!msg.revealing);
    assert_eq!(msg.displayed_text, "settled");
}

#[tokio::test]
async fn test_snapshot_is_not_affected_by_later_writes() {
    let store = ConversationStore::new();
    store.append(Message::remote_placeholder(MessageId(1))).await.unwrap();

    let snapshot = store.all().await;
    store
        .patch(MessageId(1), MessagePatch::displayed("a").with_final("abc"))
        .await;
    store.append(Message::own_text(MessageId(2), "later")).await.unwrap();

    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot[0].displayed_text, "");
    assert_eq!(snapshot[0].sender, Sender::Remote);
}

#[tokio::test]
async fn test_writes_emit_change_events() {
    let store = ConversationStore::new();
    let mut events = store.subscribe();

    store.append(Message::remote_placeholder(MessageId(1))).await.unwrap();
    store
        .patch(MessageId(1), MessagePatch::displayed("o").with_final("ok"))
        .await;

    match events.recv().await.unwrap() {
        StoreEvent::Appended(id) => assert_eq!(id, MessageId(1)),
        other => panic!("expected append event, got {:?}", other),
    }
    match events.recv().await.unwrap() {
        StoreEvent::Patched(msg) => {
            assert_eq!(msg.id, MessageId(1));
            assert_eq!(msg.displayed_text, "o");
        }
        other => panic!("expected patch event, got {:?}", other),
    }
}
