//! The closed set of Gerrit event kinds.

use std::fmt;

use serde_json::{Map, Value};

/// A JSON attribute an event kind cannot be used without, and the JSON type
/// it must have.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequiredField {
    Object(&'static str),
    String(&'static str),
}

impl RequiredField {
    /// Whether `json` carries this field with the expected type.
    #[must_use]
    pub fn is_present(self, json: &Map<String, Value>) -> bool {
        match self {
            Self::Object(key) => json.get(key).is_some_and(Value::is_object),
            Self::String(key) => json.get(key).is_some_and(Value::is_string),
        }
    }
}

const CHANGE_AND_PATCH_SET: &[RequiredField] = &[
    RequiredField::Object("change"),
    RequiredField::Object("patchSet"),
];
const CHANGE_ONLY: &[RequiredField] = &[RequiredField::Object("change")];
const REF_UPDATE: &[RequiredField] = &[RequiredField::Object("refUpdate")];
const PROJECT_AND_REF: &[RequiredField] = &[
    RequiredField::String("project"),
    RequiredField::String("ref"),
];
const PROJECT_NAME: &[RequiredField] = &[RequiredField::String("projectName")];

/// Kind of a Gerrit event, as named by its `type` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    PatchsetCreated,
    DraftPublished,
    ChangeAbandoned,
    ChangeMerged,
    ChangeRestored,
    ChangeDeleted,
    CommentAdded,
    ReviewerAdded,
    ReviewerDeleted,
    TopicChanged,
    HashtagsChanged,
    WipStateChanged,
    PrivateStateChanged,
    VoteDeleted,
    /// Sent by the notify-patchset plugin.
    PatchsetNotified,
    RefUpdated,
    RefReplicated,
    RefReplicationDone,
    ProjectCreated,
}

impl EventKind {
    /// Every known kind.
    pub const ALL: [EventKind; 19] = [
        Self::PatchsetCreated,
        Self::DraftPublished,
        Self::ChangeAbandoned,
        Self::ChangeMerged,
        Self::ChangeRestored,
        Self::ChangeDeleted,
        Self::CommentAdded,
        Self::ReviewerAdded,
        Self::ReviewerDeleted,
        Self::TopicChanged,
        Self::HashtagsChanged,
        Self::WipStateChanged,
        Self::PrivateStateChanged,
        Self::VoteDeleted,
        Self::PatchsetNotified,
        Self::RefUpdated,
        Self::RefReplicated,
        Self::RefReplicationDone,
        Self::ProjectCreated,
    ];

    /// The `type` attribute value Gerrit uses for this kind.
    #[must_use]
    pub fn type_value(self) -> &'static str {
        match self {
            Self::PatchsetCreated => "patchset-created",
            Self::DraftPublished => "draft-published",
            Self::ChangeAbandoned => "change-abandoned",
            Self::ChangeMerged => "change-merged",
            Self::ChangeRestored => "change-restored",
            Self::ChangeDeleted => "change-deleted",
            Self::CommentAdded => "comment-added",
            Self::ReviewerAdded => "reviewer-added",
            Self::ReviewerDeleted => "reviewer-deleted",
            Self::TopicChanged => "topic-changed",
            Self::HashtagsChanged => "hashtags-changed",
            Self::WipStateChanged => "wip-state-changed",
            Self::PrivateStateChanged => "private-state-changed",
            Self::VoteDeleted => "vote-deleted",
            Self::PatchsetNotified => "patchset-notified",
            Self::RefUpdated => "ref-updated",
            Self::RefReplicated => "ref-replicated",
            Self::RefReplicationDone => "ref-replication-done",
            Self::ProjectCreated => "project-created",
        }
    }

    /// Look up a kind by exact `type` value.
    #[must_use]
    pub fn from_type_value(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.type_value() == value)
    }

    /// Whether events of this kind take part in a review/voting workflow.
    #[must_use]
    pub fn is_scorable(self) -> bool {
        matches!(
            self,
            Self::PatchsetCreated
                | Self::DraftPublished
                | Self::ChangeMerged
                | Self::ChangeRestored
                | Self::CommentAdded
                | Self::WipStateChanged
                | Self::PrivateStateChanged
                | Self::PatchsetNotified
        )
    }

    /// Attributes an event of this kind must carry to be usable.
    #[must_use]
    pub fn required_fields(self) -> &'static [RequiredField] {
        match self {
            Self::ChangeDeleted | Self::TopicChanged | Self::HashtagsChanged => CHANGE_ONLY,
            Self::RefUpdated => REF_UPDATE,
            Self::RefReplicated | Self::RefReplicationDone => PROJECT_AND_REF,
            Self::ProjectCreated => PROJECT_NAME,
            _ => CHANGE_AND_PATCH_SET,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_value())
    }
}
