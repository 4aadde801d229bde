//! Typed Gerrit events.
//!
//! [`EventPayload`] is tagged by the JSON `type` attribute, one variant per
//! [`EventKind`]. [`GerritEvent`] adds the ingestion metadata: which server the
//! event came from and when it was received.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::attrs::{Account, Approval, Change, PatchSet, Provider, RefUpdate};
use super::kind::EventKind;

/// Attributes shared by every change-based event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeAttrs {
    #[serde(default, deserialize_with = "super::attrs::lenient")]
    pub change: Option<Change>,
    #[serde(default, deserialize_with = "super::attrs::lenient")]
    pub patch_set: Option<PatchSet>,
    /// Server-side creation time of the event.
    #[serde(default, with = "super::attrs::epoch_seconds")]
    pub event_created_on: Option<DateTime<Utc>>,
}

/// `patchset-created` and `draft-published`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatchsetUploaded {
    #[serde(flatten)]
    pub attrs: ChangeAttrs,
    #[serde(default, deserialize_with = "super::attrs::lenient")]
    pub uploader: Option<Account>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChangeAbandoned {
    #[serde(flatten)]
    pub attrs: ChangeAttrs,
    #[serde(default, deserialize_with = "super::attrs::lenient")]
    pub abandoner: Option<Account>,
    #[serde(default, deserialize_with = "super::attrs::lenient")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeMerged {
    #[serde(flatten)]
    pub attrs: ChangeAttrs,
    #[serde(default, deserialize_with = "super::attrs::lenient")]
    pub submitter: Option<Account>,
    #[serde(default, deserialize_with = "super::attrs::lenient")]
    pub new_rev: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChangeRestored {
    #[serde(flatten)]
    pub attrs: ChangeAttrs,
    #[serde(default, deserialize_with = "super::attrs::lenient")]
    pub restorer: Option<Account>,
    #[serde(default, deserialize_with = "super::attrs::lenient")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChangeDeleted {
    #[serde(flatten)]
    pub attrs: ChangeAttrs,
    #[serde(default, deserialize_with = "super::attrs::lenient")]
    pub deleter: Option<Account>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommentAdded {
    #[serde(flatten)]
    pub attrs: ChangeAttrs,
    #[serde(default, deserialize_with = "super::attrs::lenient")]
    pub author: Option<Account>,
    #[serde(default, deserialize_with = "super::attrs::lenient")]
    pub approvals: Vec<Approval>,
    #[serde(default, deserialize_with = "super::attrs::lenient")]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReviewerAdded {
    #[serde(flatten)]
    pub attrs: ChangeAttrs,
    #[serde(default, deserialize_with = "super::attrs::lenient")]
    pub reviewer: Option<Account>,
    #[serde(default, deserialize_with = "super::attrs::lenient")]
    pub adder: Option<Account>,
}

/// `reviewer-deleted` and `vote-deleted`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReviewRemoved {
    #[serde(flatten)]
    pub attrs: ChangeAttrs,
    #[serde(default, deserialize_with = "super::attrs::lenient")]
    pub reviewer: Option<Account>,
    #[serde(default, deserialize_with = "super::attrs::lenient")]
    pub remover: Option<Account>,
    #[serde(default, deserialize_with = "super::attrs::lenient")]
    pub approvals: Vec<Approval>,
    #[serde(default, deserialize_with = "super::attrs::lenient")]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicChanged {
    #[serde(flatten)]
    pub attrs: ChangeAttrs,
    #[serde(default, deserialize_with = "super::attrs::lenient")]
    pub changer: Option<Account>,
    #[serde(default, deserialize_with = "super::attrs::lenient")]
    pub old_topic: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HashtagsChanged {
    #[serde(flatten)]
    pub attrs: ChangeAttrs,
    #[serde(default, deserialize_with = "super::attrs::lenient")]
    pub editor: Option<Account>,
    #[serde(default, deserialize_with = "super::attrs::lenient")]
    pub added: Vec<String>,
    #[serde(default, deserialize_with = "super::attrs::lenient")]
    pub removed: Vec<String>,
    #[serde(default, deserialize_with = "super::attrs::lenient")]
    pub hashtags: Vec<String>,
}

/// `wip-state-changed` and `private-state-changed`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StateChanged {
    #[serde(flatten)]
    pub attrs: ChangeAttrs,
    #[serde(default, deserialize_with = "super::attrs::lenient")]
    pub changer: Option<Account>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatchsetNotified {
    #[serde(flatten)]
    pub attrs: ChangeAttrs,
    #[serde(default, deserialize_with = "super::attrs::lenient")]
    pub notifier: Option<Account>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefUpdated {
    #[serde(default, deserialize_with = "super::attrs::lenient")]
    pub submitter: Option<Account>,
    #[serde(default, deserialize_with = "super::attrs::lenient")]
    pub ref_update: Option<RefUpdate>,
    #[serde(default, with = "super::attrs::epoch_seconds")]
    pub event_created_on: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefReplicated {
    #[serde(default, deserialize_with = "super::attrs::lenient")]
    pub project: Option<String>,
    #[serde(default, rename = "ref", deserialize_with = "super::attrs::lenient")]
    pub git_ref: Option<String>,
    #[serde(default, deserialize_with = "super::attrs::lenient")]
    pub target_node: Option<String>,
    #[serde(default, deserialize_with = "super::attrs::lenient")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "super::attrs::lenient")]
    pub ref_status: Option<String>,
    #[serde(default, with = "super::attrs::epoch_seconds")]
    pub event_created_on: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefReplicationDone {
    #[serde(default, deserialize_with = "super::attrs::lenient")]
    pub project: Option<String>,
    #[serde(default, rename = "ref", deserialize_with = "super::attrs::lenient")]
    pub git_ref: Option<String>,
    #[serde(default, deserialize_with = "super::attrs::lenient")]
    pub nodes_count: Option<u32>,
    #[serde(default, with = "super::attrs::epoch_seconds")]
    pub event_created_on: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectCreated {
    #[serde(default, deserialize_with = "super::attrs::lenient")]
    pub project_name: Option<String>,
    #[serde(default, deserialize_with = "super::attrs::lenient")]
    pub project_head: Option<String>,
    #[serde(default, with = "super::attrs::epoch_seconds")]
    pub event_created_on: Option<DateTime<Utc>>,
}

/// Event payload, tagged by the Gerrit `type` attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum EventPayload {
    PatchsetCreated(PatchsetUploaded),
    DraftPublished(PatchsetUploaded),
    ChangeAbandoned(ChangeAbandoned),
    ChangeMerged(ChangeMerged),
    ChangeRestored(ChangeRestored),
    ChangeDeleted(ChangeDeleted),
    CommentAdded(CommentAdded),
    ReviewerAdded(ReviewerAdded),
    ReviewerDeleted(ReviewRemoved),
    TopicChanged(TopicChanged),
    HashtagsChanged(HashtagsChanged),
    WipStateChanged(StateChanged),
    PrivateStateChanged(StateChanged),
    VoteDeleted(ReviewRemoved),
    PatchsetNotified(PatchsetNotified),
    RefUpdated(RefUpdated),
    RefReplicated(RefReplicated),
    RefReplicationDone(RefReplicationDone),
    ProjectCreated(ProjectCreated),
}

impl EventPayload {
    /// The kind of this payload.
    #[must_use]
    pub fn kind(&self) -> EventKind {
        match self {
            Self::PatchsetCreated(_) => EventKind::PatchsetCreated,
            Self::DraftPublished(_) => EventKind::DraftPublished,
            Self::ChangeAbandoned(_) => EventKind::ChangeAbandoned,
            Self::ChangeMerged(_) => EventKind::ChangeMerged,
            Self::ChangeRestored(_) => EventKind::ChangeRestored,
            Self::ChangeDeleted(_) => EventKind::ChangeDeleted,
            Self::CommentAdded(_) => EventKind::CommentAdded,
            Self::ReviewerAdded(_) => EventKind::ReviewerAdded,
            Self::ReviewerDeleted(_) => EventKind::ReviewerDeleted,
            Self::TopicChanged(_) => EventKind::TopicChanged,
            Self::HashtagsChanged(_) => EventKind::HashtagsChanged,
            Self::WipStateChanged(_) => EventKind::WipStateChanged,
            Self::PrivateStateChanged(_) => EventKind::PrivateStateChanged,
            Self::VoteDeleted(_) => EventKind::VoteDeleted,
            Self::PatchsetNotified(_) => EventKind::PatchsetNotified,
            Self::RefUpdated(_) => EventKind::RefUpdated,
            Self::RefReplicated(_) => EventKind::RefReplicated,
            Self::RefReplicationDone(_) => EventKind::RefReplicationDone,
            Self::ProjectCreated(_) => EventKind::ProjectCreated,
        }
    }

    /// Change and patch set attributes, for change-based events.
    #[must_use]
    pub fn change_attrs(&self) -> Option<&ChangeAttrs> {
        match self {
            Self::PatchsetCreated(e) | Self::DraftPublished(e) => Some(&e.attrs),
            Self::ChangeAbandoned(e) => Some(&e.attrs),
            Self::ChangeMerged(e) => Some(&e.attrs),
            Self::ChangeRestored(e) => Some(&e.attrs),
            Self::ChangeDeleted(e) => Some(&e.attrs),
            Self::CommentAdded(e) => Some(&e.attrs),
            Self::ReviewerAdded(e) => Some(&e.attrs),
            Self::ReviewerDeleted(e) | Self::VoteDeleted(e) => Some(&e.attrs),
            Self::TopicChanged(e) => Some(&e.attrs),
            Self::HashtagsChanged(e) => Some(&e.attrs),
            Self::WipStateChanged(e) | Self::PrivateStateChanged(e) => Some(&e.attrs),
            Self::PatchsetNotified(e) => Some(&e.attrs),
            Self::RefUpdated(_)
            | Self::RefReplicated(_)
            | Self::RefReplicationDone(_)
            | Self::ProjectCreated(_) => None,
        }
    }

    /// The account that caused the event, in the role this kind names it.
    #[must_use]
    pub fn account(&self) -> Option<&Account> {
        match self {
            Self::PatchsetCreated(e) | Self::DraftPublished(e) => e.uploader.as_ref(),
            Self::ChangeAbandoned(e) => e.abandoner.as_ref(),
            Self::ChangeMerged(e) => e.submitter.as_ref(),
            Self::ChangeRestored(e) => e.restorer.as_ref(),
            Self::ChangeDeleted(e) => e.deleter.as_ref(),
            Self::CommentAdded(e) => e.author.as_ref(),
            Self::ReviewerAdded(e) => e.adder.as_ref(),
            Self::ReviewerDeleted(e) | Self::VoteDeleted(e) => e.remover.as_ref(),
            Self::TopicChanged(e) => e.changer.as_ref(),
            Self::HashtagsChanged(e) => e.editor.as_ref(),
            Self::WipStateChanged(e) | Self::PrivateStateChanged(e) => e.changer.as_ref(),
            Self::PatchsetNotified(e) => e.notifier.as_ref(),
            Self::RefUpdated(e) => e.submitter.as_ref(),
            Self::RefReplicated(_) | Self::RefReplicationDone(_) | Self::ProjectCreated(_) => None,
        }
    }

    /// Server-side creation time, when the server sent one.
    #[must_use]
    pub fn event_created_on(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::RefUpdated(e) => e.event_created_on,
            Self::RefReplicated(e) => e.event_created_on,
            Self::RefReplicationDone(e) => e.event_created_on,
            Self::ProjectCreated(e) => e.event_created_on,
            other => other.change_attrs().and_then(|a| a.event_created_on),
        }
    }
}

/// A classified Gerrit event with its ingestion metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GerritEvent {
    #[serde(flatten)]
    pub payload: EventPayload,
    /// Server the event came from.
    pub provider: Option<Provider>,
    /// When this process received the event. Distinct from
    /// [`EventPayload::event_created_on`].
    pub received_on: Option<DateTime<Utc>>,
}

impl GerritEvent {
    /// Wrap a payload with no ingestion metadata.
    #[must_use]
    pub fn new(payload: EventPayload) -> Self {
        Self {
            payload,
            provider: None,
            received_on: None,
        }
    }

    /// Record where and when the event was received.
    pub fn stamp(&mut self, provider: Option<Provider>, received_on: DateTime<Utc>) {
        self.provider = provider;
        self.received_on = Some(received_on);
    }

    #[must_use]
    pub fn kind(&self) -> EventKind {
        self.payload.kind()
    }

    /// Whether this event takes part in a review/voting workflow.
    #[must_use]
    pub fn is_scorable(&self) -> bool {
        self.kind().is_scorable()
    }

    #[must_use]
    pub fn change(&self) -> Option<&Change> {
        self.payload.change_attrs().and_then(|a| a.change.as_ref())
    }

    #[must_use]
    pub fn patch_set(&self) -> Option<&PatchSet> {
        self.payload.change_attrs().and_then(|a| a.patch_set.as_ref())
    }

    #[must_use]
    pub fn account(&self) -> Option<&Account> {
        self.payload.account()
    }
}
