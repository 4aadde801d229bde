use std::sync::Arc;

use gerrit_events::query::QueryHandler;

use crate::support::{FakeSource, UnreachableSource};

#[tokio::test]
async fn test_files_by_change() {
    let source = Arc::new(FakeSource::new(&[
        r#"{"project":"p","currentPatchSet":{"number":2,"files":[{"file":"a.txt"},{"file":"b.txt"}]}}"#,
        r#"{"type":"stats","rowCount":1,"runTimeMilliseconds":3}"#,
    ]));
    let handler = QueryHandler::new(source.clone());

    let files = handler.files_by_change("12345").await;

    assert_eq!(files, vec!["a.txt", "b.txt"]);
    assert_eq!(
        source.last_command().as_deref(),
        Some("gerrit query --format=JSON --current-patch-set --files \"change:12345\"")
    );
}

#[tokio::test]
async fn test_files_by_change_empty_on_error_record() {
    let source = Arc::new(FakeSource::new(&[r#"{"type":"error","message":"nope"}"#]));
    let handler = QueryHandler::new(source);

    assert!(handler.files_by_change("1").await.is_empty());
}

#[tokio::test]
async fn test_files_by_change_empty_on_transport_failure() {
    let handler = QueryHandler::new(Arc::new(UnreachableSource));

    assert!(handler.files_by_change("1").await.is_empty());
}
