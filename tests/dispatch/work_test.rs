use gerrit_events::dispatch::{Work, WorkInput};
use gerrit_events::events::{EventKind, Provider};
use serde_json::{json, Map, Value};

use crate::support::{patchset_created, Recorder};

#[tokio::test]
async fn test_raw_patchset_created_notifies_once() {
    let recorder = Recorder::default();
    let provider = Provider {
        name: Some("review".to_string()),
        host: Some("review.example.org".to_string()),
        port: Some("29418".to_string()),
        scheme: Some("ssh".to_string()),
        ..Default::default()
    };

    let work = Work::from_line(patchset_created(7), Some(provider.clone()));
    let created_on = work.created_on();
    work.perform(&recorder).await;

    let events = recorder.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind(), EventKind::PatchsetCreated);
    assert_eq!(events[0].provider.as_ref(), Some(&provider));
    assert_eq!(events[0].received_on, Some(created_on));
}

#[tokio::test]
async fn test_unusable_json_never_notifies() {
    let recorder = Recorder::default();
    let Value::Object(json) = json!({"type": "comment-added", "change": {"number": 1}}) else {
        unreachable!()
    };

    Work::from_json(json, None).perform(&recorder).await;

    assert!(recorder.events().is_empty());
}

#[tokio::test]
async fn test_malformed_line_never_notifies() {
    let recorder = Recorder::default();

    Work::from_line("{\"type\":", None).perform(&recorder).await;
    Work::from_line("\"patchset-created\"", None)
        .perform(&recorder)
        .await;

    assert!(recorder.events().is_empty());
}

#[test]
fn test_json_work_keeps_input() {
    let json: Map<String, Value> = serde_json::from_str(&patchset_created(1)).unwrap();
    let work = Work::from_json(json.clone(), None);

    assert_eq!(work.input(), &WorkInput::Json(json));
    assert!(work.provider().is_none());
}
