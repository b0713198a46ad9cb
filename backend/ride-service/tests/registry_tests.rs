//! Connection registry and notifier behaviour against the in-memory store
//!
//! Covers:
//! - initial count on register and per-call pushes
//! - offline users and unregistering
//! - replacement of an older socket
//! - fan-out to many users
//! - the get_number frame targeting another user
//! - concurrent register, push and unregister on a multi-threaded runtime

use chrono::NaiveDate;
use ride_service::clock::LocalClock;
use ride_service::models::{NewNotification, UserId};
use ride_service::services::{MemoryNotificationStore, NotificationStore, Notifier};
use ride_service::websocket::{
    ConnectionHandle, ConnectionRegistry, FanOutSummary, InboundFrame, Outbound, PushOutcome,
};
use futures::future::join_all;
use std::sync::Arc;
use tokio::sync::mpsc::error::TryRecvError;

fn setup() -> (Arc<MemoryNotificationStore>, ConnectionRegistry) {
    let store = Arc::new(MemoryNotificationStore::new());
    let registry = ConnectionRegistry::new(store.clone());
    (store, registry)
}

async fn add_unread(store: &MemoryNotificationStore, user_id: UserId) {
    store
        .insert(&NewNotification {
            route_id: None,
            user_id,
            text: "Водій відмінив маршрут 'Київ - Львів', 01.06.24 14:35".into(),
            created: NaiveDate::from_ymd_opt(2024, 6, 1)
                .unwrap()
                .and_hms_opt(14, 35, 0)
                .unwrap(),
        })
        .await
        .unwrap();
}

#[tokio::test]
async fn test_unread_count_lifecycle() {
    let (store, registry) = setup();
    let (handle, mut rx) = ConnectionHandle::channel(8);

    let initial = registry.register(42, handle).await.unwrap();
    assert_eq!(initial, PushOutcome::Delivered);
    assert_eq!(rx.recv().await, Some(Outbound::UnreadCount(0)));

    add_unread(&store, 42).await;
    assert_eq!(registry.push_unread_count(42).await.unwrap(), PushOutcome::Delivered);
    assert_eq!(rx.recv().await, Some(Outbound::UnreadCount(1)));

    store.mark_all_read(42).await.unwrap();
    assert_eq!(store.unread_count(42).await.unwrap(), 0);
    registry.push_unread_count(42).await.unwrap();
    assert_eq!(rx.recv().await, Some(Outbound::UnreadCount(0)));
}

#[tokio::test]
async fn test_one_message_per_push() {
    let (store, registry) = setup();
    let (handle, mut rx) = ConnectionHandle::channel(8);
    registry.register(1, handle).await.unwrap();
    rx.recv().await.unwrap();

    add_unread(&store, 1).await;
    add_unread(&store, 1).await;
    registry.push_unread_count(1).await.unwrap();
    registry.push_unread_count(1).await.unwrap();

    assert_eq!(rx.recv().await, Some(Outbound::UnreadCount(2)));
    assert_eq!(rx.recv().await, Some(Outbound::UnreadCount(2)));
    assert_eq!(rx.try_recv(), Err(TryRecvError::Empty));
}

#[tokio::test]
async fn test_never_registered_user_is_offline() {
    let (_store, registry) = setup();
    assert_eq!(registry.push_unread_count(7).await.unwrap(), PushOutcome::Offline);
    assert!(!registry.is_connected(7).await);
}

#[tokio::test]
async fn test_push_after_unregister_is_noop() {
    let (_store, registry) = setup();
    let (handle, mut rx) = ConnectionHandle::channel(8);
    registry.register(3, handle).await.unwrap();
    rx.recv().await.unwrap();

    registry.unregister(3).await;
    // Unregistering twice is harmless
    registry.unregister(3).await;

    assert_eq!(registry.push_unread_count(3).await.unwrap(), PushOutcome::Offline);
    // The registry held the only sender, so the channel is now closed
    assert_eq!(rx.recv().await, None);
}

#[tokio::test]
async fn test_second_connection_replaces_first() {
    let (store, registry) = setup();
    let (first, mut rx1) = ConnectionHandle::channel(8);
    let (second, mut rx2) = ConnectionHandle::channel(8);

    registry.register(5, first).await.unwrap();
    assert_eq!(rx1.recv().await, Some(Outbound::UnreadCount(0)));

    registry.register(5, second).await.unwrap();
    assert_eq!(rx2.recv().await, Some(Outbound::UnreadCount(0)));
    // Old socket is closed, not left dangling
    assert_eq!(rx1.recv().await, None);

    add_unread(&store, 5).await;
    registry.push_unread_count(5).await.unwrap();
    assert_eq!(rx2.recv().await, Some(Outbound::UnreadCount(1)));
    assert_eq!(registry.connected_count().await, 1);
}

#[tokio::test]
async fn test_fan_out_skips_offline_users() {
    let (store, registry) = setup();
    let (h1, mut rx1) = ConnectionHandle::channel(8);
    let (h3, mut rx3) = ConnectionHandle::channel(8);
    registry.register(1, h1).await.unwrap();
    registry.register(3, h3).await.unwrap();
    rx1.recv().await.unwrap();
    rx3.recv().await.unwrap();

    add_unread(&store, 1).await;
    add_unread(&store, 2).await;
    add_unread(&store, 3).await;
    add_unread(&store, 3).await;

    let summary = registry.push_unread_count_to_many(vec![3, 2, 1, 3]).await;
    assert_eq!(
        summary,
        FanOutSummary {
            delivered: 2,
            offline: 1,
            dropped: 0,
            failed: 0,
        }
    );
    assert_eq!(rx1.recv().await, Some(Outbound::UnreadCount(1)));
    assert_eq!(rx3.recv().await, Some(Outbound::UnreadCount(2)));
    // Duplicate ids produce a single push
    assert_eq!(rx3.try_recv(), Err(TryRecvError::Empty));
}

#[tokio::test]
async fn test_store_failure_is_error_not_offline() {
    let (store, registry) = setup();
    let (handle, _rx) = ConnectionHandle::channel(8);
    registry.register(8, handle).await.unwrap();

    store.set_failing(true);
    assert!(registry.push_unread_count(8).await.is_err());

    let summary = registry.push_unread_count_to_many([8, 9]).await;
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.offline, 1);
}

#[tokio::test]
async fn test_get_number_frame_pushes_to_target_only() {
    let (store, registry) = setup();
    let (requester, mut rx_requester) = ConnectionHandle::channel(8);
    let (target, mut rx_target) = ConnectionHandle::channel(8);
    registry.register(10, requester).await.unwrap();
    registry.register(42, target).await.unwrap();
    rx_requester.recv().await.unwrap();
    rx_target.recv().await.unwrap();

    add_unread(&store, 42).await;

    let frame = InboundFrame::parse(r#"{"kind": "get_number", "id": "42"}"#).unwrap();
    let id = match frame {
        InboundFrame::GetNumber { id } => id,
        other => panic!("expected get_number, got {other:?}"),
    };
    registry.push_unread_count(id).await.unwrap();

    assert_eq!(rx_target.recv().await, Some(Outbound::UnreadCount(1)));
    assert_eq!(rx_requester.try_recv(), Err(TryRecvError::Empty));
}

#[tokio::test]
async fn test_close_all_closes_every_socket() {
    let (_store, registry) = setup();
    let (h1, mut rx1) = ConnectionHandle::channel(8);
    let (h2, mut rx2) = ConnectionHandle::channel(8);
    registry.register(1, h1).await.unwrap();
    registry.register(2, h2).await.unwrap();
    assert_eq!(registry.connected_user_ids().await, vec![1, 2]);

    assert_eq!(registry.close_all().await, 2);
    rx1.recv().await.unwrap();
    rx2.recv().await.unwrap();
    assert_eq!(rx1.recv().await, None);
    assert_eq!(rx2.recv().await, None);
    assert_eq!(registry.connected_count().await, 0);
}

#[tokio::test]
async fn test_notifier_stores_then_pushes() {
    let (store, registry) = setup();
    let notifier = Notifier::new(store.clone(), registry.clone(), LocalClock::new(3));
    let (handle, mut rx) = ConnectionHandle::channel(8);
    registry.register(42, handle).await.unwrap();
    rx.recv().await.unwrap();

    let report = notifier.notify(None, 42, "Вам запропонували маршрут").await;
    assert!(report.stored);
    assert_eq!(report.push, Some(PushOutcome::Delivered));
    assert_eq!(rx.recv().await, Some(Outbound::UnreadCount(1)));

    let offline = notifier.notify(None, 7, "Водій вилучив вас з маршруту").await;
    assert!(offline.stored);
    assert_eq!(offline.push, Some(PushOutcome::Offline));
    assert_eq!(store.unread_count(7).await.unwrap(), 1);

    let stored = store.all();
    assert_eq!(stored.len(), 2);
    assert!(stored.iter().all(|n| !n.read));
}

#[tokio::test]
async fn test_notifier_failure_is_reported_not_raised() {
    let (store, registry) = setup();
    let notifier = Notifier::new(store.clone(), registry.clone(), LocalClock::new(3));
    let (handle, mut rx) = ConnectionHandle::channel(8);
    registry.register(1, handle).await.unwrap();
    rx.recv().await.unwrap();

    store.set_failing(true);
    let report = notifier.notify(None, 1, "text").await;
    assert!(!report.stored);
    assert_eq!(report.push, None);
    assert_eq!(rx.try_recv(), Err(TryRecvError::Empty));

    let summary = notifier.notify_many(None, &[1, 2], "text").await;
    assert_eq!(summary.failed, 2);
    assert_eq!(summary.total(), 2);
}

#[tokio::test]
async fn test_notify_many_pushes_each_passenger_once() {
    let (store, registry) = setup();
    let notifier = Notifier::new(store.clone(), registry.clone(), LocalClock::new(3));
    let (handle, mut rx) = ConnectionHandle::channel(8);
    registry.register(11, handle).await.unwrap();
    rx.recv().await.unwrap();

    let summary = notifier
        .notify_many(None, &[11, 12, 11], "Водій відмінив маршрут")
        .await;
    assert_eq!(summary.delivered, 1);
    assert_eq!(summary.offline, 1);
    assert_eq!(store.unread_count(11).await.unwrap(), 1);
    assert_eq!(rx.recv().await, Some(Outbound::UnreadCount(1)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_registers_for_distinct_users() {
    let (_store, registry) = setup();

    let mut outboxes = Vec::new();
    let mut tasks = Vec::new();
    for user_id in 1..=200 {
        let (handle, outbox) = ConnectionHandle::channel(4);
        outboxes.push(outbox);
        let registry = registry.clone();
        tasks.push(tokio::spawn(async move {
            registry.register(user_id, handle).await
        }));
    }

    for result in join_all(tasks).await {
        assert_eq!(result.unwrap().unwrap(), PushOutcome::Delivered);
    }
    assert_eq!(registry.connected_count().await, 200);
    assert_eq!(
        registry.connected_user_ids().await,
        (1..=200).collect::<Vec<UserId>>()
    );
    for outbox in outboxes.iter_mut() {
        assert_eq!(outbox.try_recv(), Ok(Outbound::UnreadCount(0)));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_push_racing_unregister_fails_soft() {
    let (store, registry) = setup();
    add_unread(&store, 999).await;

    for _ in 0..200 {
        let (handle, _outbox) = ConnectionHandle::channel(4);
        let connection_id = handle.id();
        registry.register(999, handle).await.unwrap();

        let pusher = {
            let registry = registry.clone();
            tokio::spawn(async move { registry.push_unread_count(999).await })
        };
        let remover = {
            let registry = registry.clone();
            tokio::spawn(async move { registry.unregister_connection(999, connection_id).await })
        };

        let outcome = pusher.await.unwrap().unwrap();
        assert!(
            matches!(outcome, PushOutcome::Delivered | PushOutcome::Offline),
            "unexpected outcome {outcome:?}"
        );
        assert!(remover.await.unwrap());
        assert!(!registry.is_connected(999).await);
    }
    assert_eq!(registry.connected_count().await, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_reconnects_leave_one_entry() {
    let (_store, registry) = setup();

    let mut outboxes = Vec::new();
    let mut tasks = Vec::new();
    for _ in 0..50 {
        let (handle, outbox) = ConnectionHandle::channel(4);
        outboxes.push(outbox);
        let registry = registry.clone();
        tasks.push(tokio::spawn(async move { registry.register(77, handle).await }));
    }
    for result in join_all(tasks).await {
        result.unwrap().unwrap();
    }

    assert_eq!(registry.connected_count().await, 1);
    // Exactly one outbox is still open: the winner's
    let mut open = 0;
    for outbox in outboxes.iter_mut() {
        while outbox.try_recv().is_ok() {}
        if !matches!(outbox.try_recv(), Err(TryRecvError::Disconnected)) {
            open += 1;
        }
    }
    assert_eq!(open, 1);
}
