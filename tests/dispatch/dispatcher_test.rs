use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use gerrit_events::config::DispatchConfig;
use gerrit_events::dispatch::{EventDispatcher, EventListener, Work};
use gerrit_events::events::{GerritEvent, Provider};
use serde_json::{json, Map, Value};

use crate::support::{patchset_created, Gate, Recorder};

fn config(queue_capacity: usize, workers: usize) -> DispatchConfig {
    DispatchConfig {
        queue_capacity,
        workers,
    }
}

#[tokio::test]
async fn test_same_producer_is_fifo() {
    let dispatcher = EventDispatcher::new(&config(16, 4));
    let recorder = Arc::new(Recorder::default());
    dispatcher.add_listener(recorder.clone());

    let sender = dispatcher.sender();
    let provider = Some(Provider::named("review"));
    for number in 1..=20 {
        sender
            .enqueue(Work::from_line(patchset_created(number), provider.clone()))
            .await
            .unwrap();
    }
    dispatcher.shutdown().await.unwrap();

    let expected: Vec<String> = (1..=20).map(|n| n.to_string()).collect();
    assert_eq!(recorder.change_numbers(), expected);
}

#[tokio::test]
async fn test_every_listener_is_notified() {
    let dispatcher = EventDispatcher::new(&config(4, 1));
    let first = Arc::new(Recorder::default());
    let second = Arc::new(Recorder::default());
    dispatcher.add_listener(first.clone());
    dispatcher.add_listener(second.clone());

    dispatcher
        .enqueue(Work::from_line(patchset_created(1), None))
        .await
        .unwrap();
    dispatcher.shutdown().await.unwrap();

    assert_eq!(first.events().len(), 1);
    assert_eq!(second.events().len(), 1);
}

#[tokio::test]
async fn test_removed_listener_is_not_notified() {
    let dispatcher = EventDispatcher::new(&config(4, 1));
    let kept = Arc::new(Recorder::default());
    let removed = Arc::new(Recorder::default());
    dispatcher.add_listener(kept.clone());
    let id = dispatcher.add_listener(removed.clone());

    assert!(dispatcher.remove_listener(id));
    assert_eq!(dispatcher.listener_count(), 1);

    dispatcher
        .enqueue(Work::from_line(patchset_created(1), None))
        .await
        .unwrap();
    dispatcher.shutdown().await.unwrap();

    assert_eq!(kept.events().len(), 1);
    assert!(removed.events().is_empty());
}

struct PanickingListener;

#[async_trait]
impl EventListener for PanickingListener {
    async fn on_event(&self, _event: &GerritEvent) {
        panic!("listener failure");
    }
}

#[tokio::test]
async fn test_panicking_listener_does_not_stop_dispatch() {
    let dispatcher = EventDispatcher::new(&config(4, 1));
    let recorder = Arc::new(Recorder::default());
    dispatcher.add_listener(Arc::new(PanickingListener));
    dispatcher.add_listener(recorder.clone());

    for number in 1..=3 {
        dispatcher
            .enqueue(Work::from_line(patchset_created(number), None))
            .await
            .unwrap();
    }
    dispatcher.shutdown().await.unwrap();

    assert_eq!(recorder.change_numbers(), vec!["1", "2", "3"]);
}

#[tokio::test]
async fn test_enqueue_json_filters_unusable() {
    let dispatcher = EventDispatcher::new(&config(4, 1));
    let recorder = Arc::new(Recorder::default());
    dispatcher.add_listener(recorder.clone());
    let sender = dispatcher.sender();

    let Value::Object(unusable) = json!({"type": "patchset-created"}) else {
        unreachable!()
    };
    let usable: Map<String, Value> = serde_json::from_str(&patchset_created(5)).unwrap();

    assert!(!sender.enqueue_json(unusable, None).await.unwrap());
    assert!(sender.enqueue_json(usable, None).await.unwrap());
    dispatcher.shutdown().await.unwrap();

    assert_eq!(recorder.change_numbers(), vec!["5"]);
}

#[tokio::test]
async fn test_full_queue_suspends_producer() {
    let dispatcher = EventDispatcher::new(&config(1, 1));
    let gate = Arc::new(Gate::default());
    dispatcher.add_listener(gate.clone());
    let sender = dispatcher.sender();

    // The worker takes the first unit and blocks in the listener.
    sender
        .enqueue(Work::from_line(patchset_created(1), None))
        .await
        .unwrap();
    gate.entered.notified().await;

    // Fills the queue.
    sender
        .enqueue(Work::from_line(patchset_created(2), None))
        .await
        .unwrap();

    let blocked = tokio::time::timeout(
        Duration::from_millis(50),
        sender.enqueue(Work::from_line(patchset_created(3), None)),
    )
    .await;
    assert!(blocked.is_err(), "Enqueue should wait while the queue is full");

    gate.release.add_permits(3);
    tokio::time::timeout(
        Duration::from_secs(5),
        sender.enqueue(Work::from_line(patchset_created(3), None)),
    )
    .await
    .expect("Enqueue should resume once the queue drains")
    .unwrap();

    dispatcher.shutdown().await.unwrap();
}
