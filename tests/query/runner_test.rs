use std::sync::atomic::AtomicUsize;
use std::sync::Arc;

use gerrit_events::query::{Query, QueryError, QueryHandler};
use gerrit_events::transport::TransportError;
use tokio_util::sync::CancellationToken;

use crate::support::{FakeSource, PendingSource, UnreachableSource};

fn handler(source: &Arc<FakeSource>) -> QueryHandler {
    QueryHandler::new(source.clone())
}

#[tokio::test]
async fn test_strict_query_returns_records_in_order() {
    let source = Arc::new(FakeSource::new(&[
        r#"{"number":1}"#,
        "",
        r#"{"number":2}"#,
        "   ",
        r#"{"number":3}"#,
    ]));

    let records = handler(&source)
        .query_objects(&Query::new("status:open"))
        .await
        .unwrap();

    let numbers: Vec<_> = records.iter().map(|r| r["number"].as_i64().unwrap()).collect();
    assert_eq!(numbers, vec![1, 2, 3]);
    assert_eq!(source.close_count(), 1);
    assert_eq!(
        source.last_command().as_deref(),
        Some("gerrit query --format=JSON \"status:open\"")
    );
}

#[tokio::test]
async fn test_strict_query_fails_on_error_record() {
    let source = Arc::new(FakeSource::new(&[
        r#"{"number":1}"#,
        r#"{"type":"error","message":"permission denied"}"#,
        r#"{"number":3}"#,
    ]));

    let err = handler(&source)
        .query_objects(&Query::new("status:open"))
        .await
        .unwrap_err();

    assert!(matches!(err, QueryError::Remote { ref message } if message == "permission denied"));
    assert_eq!(source.close_count(), 1);
}

#[tokio::test]
async fn test_lenient_query_keeps_error_line() {
    let error_line = r#"{"type":"error","message":"permission denied"}"#;
    let source = Arc::new(FakeSource::new(&[r#"{"number":1}"#, error_line, r#"{"number":3}"#]));

    let lines = handler(&source)
        .query_strings(&Query::new("status:open"))
        .await
        .unwrap();

    assert_eq!(lines.len(), 3);
    assert_eq!(lines[1], error_line);
}

#[tokio::test]
async fn test_malformed_line_fails_strict_query() {
    let source = Arc::new(FakeSource::new(&[r#"{"number":1}"#, "not json"]));

    let err = handler(&source)
        .query_objects(&Query::new("status:open"))
        .await
        .unwrap_err();

    assert!(matches!(err, QueryError::MalformedRecord { ref line, .. } if line == "not json"));
}

#[tokio::test]
async fn test_transport_error_propagates_and_closes() {
    let source = Arc::new(FakeSource::new(&[r#"{"number":1}"#, r#"{"number":2}"#]).failing_after(1));

    let err = handler(&source)
        .query_strings(&Query::new("status:open"))
        .await
        .unwrap_err();

    assert!(matches!(err, QueryError::Transport(TransportError::Closed)));
    assert_eq!(source.close_count(), 1);
}

#[tokio::test]
async fn test_open_failure_propagates() {
    let handler = QueryHandler::new(Arc::new(UnreachableSource));

    let err = handler.query("status:open").await.unwrap_err();

    assert!(matches!(
        err,
        QueryError::Transport(TransportError::ConnectionFailed { .. })
    ));
}

#[tokio::test]
async fn test_visitor_error_aborts_query() {
    let source = Arc::new(FakeSource::new(&["a", "b", "c"]));
    let mut seen = Vec::new();

    let result = handler(&source)
        .run_query(&Query::new("x"), &mut |line: &str| {
            seen.push(line.to_string());
            if line == "b" {
                return Err(QueryError::Cancelled);
            }
            Ok(())
        })
        .await;

    assert!(matches!(result, Err(QueryError::Cancelled)));
    assert_eq!(seen, vec!["a", "b"]);
    assert_eq!(source.close_count(), 1);
}

#[tokio::test]
async fn test_cancelled_query_closes_stream() {
    let closed = Arc::new(AtomicUsize::new(0));
    let handler = QueryHandler::new(Arc::new(PendingSource {
        closed: Arc::clone(&closed),
    }));
    let cancel = CancellationToken::new();

    let canceller = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        canceller.cancel();
    });

    let mut visitor = |_: &str| Ok::<(), QueryError>(());
    let result = handler
        .run_query_until(&Query::new("status:open"), &mut visitor, &cancel)
        .await;

    assert!(matches!(result, Err(QueryError::Cancelled)));
    assert_eq!(closed.load(std::sync::atomic::Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_convenience_commands() {
    let source = Arc::new(FakeSource::new(&[]));
    let handler = handler(&source);

    handler.query("q").await.unwrap();
    assert_eq!(
        source.last_command().as_deref(),
        Some("gerrit query --format=JSON --patch-sets --current-patch-set \"q\"")
    );

    handler.query_files("q").await.unwrap();
    assert_eq!(
        source.last_command().as_deref(),
        Some("gerrit query --format=JSON --current-patch-set --files \"q\"")
    );

    handler.query_current_patch_sets("q").await.unwrap();
    assert_eq!(
        source.last_command().as_deref(),
        Some("gerrit query --format=JSON --current-patch-set \"q\"")
    );

    handler.query_raw("q").await.unwrap();
    assert_eq!(
        source.last_command().as_deref(),
        Some("gerrit query --format=JSON --patch-sets --current-patch-set \"q\"")
    );
}
