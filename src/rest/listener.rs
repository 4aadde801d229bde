//! Listener posting reviews for scorable events.

use std::sync::Arc;

use async_trait::async_trait;

use super::{ChangeId, ReviewInput, ReviewPoster};
use crate::dispatch::EventListener;
use crate::events::GerritEvent;

type ReviewBuilder = dyn Fn(&GerritEvent) -> Option<ReviewInput> + Send + Sync;

/// Posts a review for every scorable change-based event.
///
/// The review itself comes from a caller-supplied builder; returning `None`
/// skips the event.
pub struct ReviewListener {
    poster: ReviewPoster,
    build: Arc<ReviewBuilder>,
}

impl std::fmt::Debug for ReviewListener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReviewListener")
            .field("poster", &self.poster)
            .finish_non_exhaustive()
    }
}

impl ReviewListener {
    #[must_use]
    pub fn new<F>(poster: ReviewPoster, build: F) -> Self
    where
        F: Fn(&GerritEvent) -> Option<ReviewInput> + Send + Sync + 'static,
    {
        Self {
            poster,
            build: Arc::new(build),
        }
    }
}

/// The change and revision a review for `event` would target.
#[must_use]
pub fn review_target(event: &GerritEvent) -> Option<(ChangeId, String)> {
    let change = ChangeId::from_change(event.change()?)?;
    let revision = event.patch_set()?.revision.clone()?;
    Some((change, revision))
}

#[async_trait]
impl EventListener for ReviewListener {
    async fn on_event(&self, event: &GerritEvent) {
        if !event.is_scorable() {
            return;
        }
        let Some((change, revision)) = review_target(event) else {
            tracing::debug!(kind = %event.kind(), "Event has no reviewable revision");
            return;
        };
        let Some(review) = (self.build)(event) else {
            return;
        };

        let body = self.poster.post(&change, &revision, &review).await;
        tracing::debug!(change = %change.id, revision = %revision, response = %body, "Review posted");
    }
}
