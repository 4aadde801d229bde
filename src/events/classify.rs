//! Classification of raw JSON payloads into typed events.

use serde_json::{Map, Value};

use super::event::{EventPayload, GerritEvent};
use super::kind::EventKind;

/// Attribute holding the record discriminator.
pub const TYPE_KEY: &str = "type";

/// Read the event kind named by a payload's `type` attribute.
///
/// Returns `None` when the attribute is missing, not a string, or names a kind
/// this crate does not know.
#[must_use]
pub fn event_kind(json: &Map<String, Value>) -> Option<EventKind> {
    json.get(TYPE_KEY)
        .and_then(Value::as_str)
        .and_then(EventKind::from_type_value)
}

/// Classify a JSON payload into a typed event.
///
/// Unknown kinds yield `None`; they are dropped, not treated as failures. The
/// returned event has no provider and no receipt timestamp.
#[must_use]
pub fn classify(json: &Map<String, Value>) -> Option<GerritEvent> {
    let kind = event_kind(json)?;
    match serde_json::from_value::<EventPayload>(Value::Object(json.clone())) {
        Ok(payload) => Some(GerritEvent::new(payload)),
        Err(e) => {
            tracing::warn!(kind = %kind, error = %e, "Event attributes could not be read");
            None
        }
    }
}

/// Whether a payload is a known event kind carrying the attributes needed to
/// identify what it is about.
///
/// Used to filter payloads before any work is built for them.
#[must_use]
pub fn is_interesting_and_usable(json: &Map<String, Value>) -> bool {
    event_kind(json).is_some_and(|kind| {
        kind.required_fields()
            .iter()
            .all(|field| field.is_present(json))
    })
}
