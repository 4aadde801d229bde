//! Units of work carried by the dispatch queue.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use super::Coordinator;
use crate::events::{classify, is_interesting_and_usable, GerritEvent, Provider};

/// What a [`Work`] unit was built from.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkInput {
    /// An already-parsed JSON object.
    Json(Map<String, Value>),
    /// A raw stream line, parsed when the unit is performed.
    Raw(String),
    /// A classified event, delivered as is.
    Event(Box<GerritEvent>),
}

/// One pending delivery.
///
/// The creation time is captured once, when the unit is built, and becomes the
/// event's receipt timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct Work {
    created_on: DateTime<Utc>,
    provider: Option<Provider>,
    input: WorkInput,
}

impl Work {
    /// Build a unit from a parsed JSON object.
    #[must_use]
    pub fn from_json(json: Map<String, Value>, provider: Option<Provider>) -> Self {
        Self::with_input(WorkInput::Json(json), provider)
    }

    /// Build a unit from a raw JSON line.
    #[must_use]
    pub fn from_line(line: impl Into<String>, provider: Option<Provider>) -> Self {
        Self::with_input(WorkInput::Raw(line.into()), provider)
    }

    /// Build a unit that delivers `event` unchanged.
    #[must_use]
    pub fn from_event(event: GerritEvent) -> Self {
        let provider = event.provider.clone();
        Self::with_input(WorkInput::Event(Box::new(event)), provider)
    }

    fn with_input(input: WorkInput, provider: Option<Provider>) -> Self {
        Self {
            created_on: Utc::now(),
            provider,
            input,
        }
    }

    #[must_use]
    pub fn created_on(&self) -> DateTime<Utc> {
        self.created_on
    }

    #[must_use]
    pub fn provider(&self) -> Option<&Provider> {
        self.provider.as_ref()
    }

    #[must_use]
    pub fn input(&self) -> &WorkInput {
        &self.input
    }

    /// Turn the unit into the event it describes.
    ///
    /// Returns `None` for malformed lines, unknown kinds and payloads missing
    /// their identifying attributes. Events built here carry the unit's
    /// provider and creation time.
    #[must_use]
    pub fn into_event(self) -> Option<GerritEvent> {
        let json = match self.input {
            WorkInput::Event(event) => return Some(*event),
            WorkInput::Json(json) => json,
            WorkInput::Raw(line) => match serde_json::from_str::<Value>(&line) {
                Ok(Value::Object(json)) => json,
                Ok(_) => {
                    tracing::warn!(line = %line, "Dropping non-object stream line");
                    return None;
                }
                Err(e) => {
                    tracing::warn!(line = %line, error = %e, "Dropping malformed stream line");
                    return None;
                }
            },
        };

        if !is_interesting_and_usable(&json) {
            tracing::trace!("Payload is not an interesting event");
            return None;
        }

        let mut event = classify(&json)?;
        event.stamp(self.provider, self.created_on);
        Some(event)
    }

    /// Deliver the unit's event, if any, to `coordinator`.
    pub async fn perform(self, coordinator: &dyn Coordinator) {
        if let Some(event) = self.into_event() {
            tracing::debug!(kind = %event.kind(), "Event classified");
            coordinator.notify_listeners(event).await;
        }
    }
}
