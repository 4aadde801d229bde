use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use gerrit_events::config::DispatchConfig;
use gerrit_events::dispatch::EventDispatcher;
use gerrit_events::events::{EventKind, Provider};
use gerrit_events::stream::{StreamError, StreamEventsReader, STREAM_EVENTS_COMMAND};
use gerrit_events::transport::TransportError;
use tokio_util::sync::CancellationToken;

use crate::support::{patchset_created, FakeSource, Gate, PendingSource, Recorder};

#[tokio::test]
async fn test_stream_lines_reach_listeners() {
    let first = patchset_created(1);
    let second = patchset_created(2);
    let source = Arc::new(FakeSource::new(&[
        first.as_str(),
        "",
        r#"{"type":"some-plugin-event"}"#,
        "garbage",
        r#"{"type":"change-merged","change":{"number":3},"patchSet":{"number":1}}"#,
        second.as_str(),
    ]));
    let dispatcher = EventDispatcher::new(&DispatchConfig::default());
    let recorder = Arc::new(Recorder::default());
    dispatcher.add_listener(recorder.clone());

    let reader = StreamEventsReader::new(
        source.clone(),
        Some(Provider::named("review")),
        dispatcher.sender(),
    );
    let enqueued = reader.run(&CancellationToken::new()).await.unwrap();
    dispatcher.shutdown().await.unwrap();

    assert_eq!(enqueued, 5);
    assert_eq!(source.close_count(), 1);
    assert_eq!(source.last_command().as_deref(), Some(STREAM_EVENTS_COMMAND));

    let events = recorder.events();
    let kinds: Vec<_> = events.iter().map(|e| e.kind()).collect();
    assert_eq!(
        kinds,
        vec![
            EventKind::PatchsetCreated,
            EventKind::ChangeMerged,
            EventKind::PatchsetCreated
        ]
    );
    assert!(events
        .iter()
        .all(|e| e.provider == Some(Provider::named("review")) && e.received_on.is_some()));
}

#[tokio::test]
async fn test_stream_transport_error_closes_source() {
    let line = patchset_created(1);
    let source = Arc::new(FakeSource::new(&[line.as_str(), line.as_str()]).failing_after(1));
    let dispatcher = EventDispatcher::new(&DispatchConfig::default());

    let reader = StreamEventsReader::new(source.clone(), None, dispatcher.sender());
    let err = reader.run(&CancellationToken::new()).await.unwrap_err();
    dispatcher.shutdown().await.unwrap();

    assert!(matches!(err, StreamError::Transport(TransportError::Closed)));
    assert_eq!(source.close_count(), 1);
}

#[tokio::test]
async fn test_stream_cancellation_closes_source() {
    let closed = Arc::new(AtomicUsize::new(0));
    let source = Arc::new(PendingSource {
        closed: Arc::clone(&closed),
    });
    let dispatcher = EventDispatcher::new(&DispatchConfig::default());
    let reader = StreamEventsReader::new(source, None, dispatcher.sender());

    let cancel = CancellationToken::new();
    let canceller = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        canceller.cancel();
    });

    let enqueued = reader.run(&cancel).await.unwrap();
    dispatcher.shutdown().await.unwrap();

    assert_eq!(enqueued, 0);
    assert_eq!(closed.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_cancel_while_queue_full_keeps_read_line() {
    let lines: Vec<String> = (1..=4).map(patchset_created).collect();
    let lines: Vec<&str> = lines.iter().map(String::as_str).collect();
    let source = Arc::new(FakeSource::new(&lines));
    let dispatcher = EventDispatcher::new(&DispatchConfig {
        queue_capacity: 1,
        workers: 1,
    });
    let gate = Arc::new(Gate::default());
    dispatcher.add_listener(gate.clone());

    let reader = StreamEventsReader::new(source.clone(), None, dispatcher.sender());
    let cancel = CancellationToken::new();
    let run = {
        let cancel = cancel.clone();
        tokio::spawn(async move { reader.run(&cancel).await })
    };

    // Unit 1 is held by the listener, unit 2 fills the queue and the reader
    // waits with unit 3 in hand.
    gate.entered.notified().await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    cancel.cancel();
    tokio::time::sleep(Duration::from_millis(20)).await;
    gate.release.add_permits(10);

    let enqueued = tokio::time::timeout(Duration::from_secs(5), run)
        .await
        .expect("Reader should stop once the queue drains")
        .unwrap()
        .unwrap();
    dispatcher.shutdown().await.unwrap();

    assert_eq!(enqueued, 3);
    assert_eq!(gate.seen.change_numbers(), vec!["1", "2", "3"]);
    assert_eq!(source.close_count(), 1);
}
