//! Review payloads for the Gerrit REST API.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::events::Change;

/// A comment on one line of a file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct LineComment {
    pub line: u32,
    pub message: String,
}

impl LineComment {
    #[must_use]
    pub fn new(line: u32, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

/// Line comments grouped under one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentedFile {
    file_name: String,
    comments: Vec<LineComment>,
}

impl CommentedFile {
    #[must_use]
    pub fn new(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            comments: Vec::new(),
        }
    }

    #[must_use]
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    #[must_use]
    pub fn line_comments(&self) -> &[LineComment] {
        &self.comments
    }

    /// Add a comment. Returns `false` if an identical comment is already
    /// present.
    pub fn add_line_comment(&mut self, comment: LineComment) -> bool {
        if self.comments.contains(&comment) {
            return false;
        }
        self.comments.push(comment);
        true
    }
}

/// Body of a `POST .../review` request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReviewInput {
    pub message: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, i32>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub comments: BTreeMap<String, Vec<LineComment>>,
}

impl ReviewInput {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Default::default()
        }
    }

    /// Vote `value` on `label`.
    #[must_use]
    pub fn label(mut self, label: impl Into<String>, value: i32) -> Self {
        self.labels.insert(label.into(), value);
        self
    }

    /// Attach line comments for a file. Comments for a file already present are
    /// merged.
    #[must_use]
    pub fn commented_file(mut self, file: CommentedFile) -> Self {
        let entry = self.comments.entry(file.file_name).or_default();
        for comment in file.comments {
            if !entry.contains(&comment) {
                entry.push(comment);
            }
        }
        self
    }
}

/// Fully qualified change identifier, `project~branch~Change-Id`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChangeId {
    pub project: String,
    pub branch: String,
    pub id: String,
}

impl ChangeId {
    #[must_use]
    pub fn new(
        project: impl Into<String>,
        branch: impl Into<String>,
        id: impl Into<String>,
    ) -> Self {
        Self {
            project: project.into(),
            branch: branch.into(),
            id: id.into(),
        }
    }

    /// Build the identifier from change attributes. Returns `None` if any
    /// part is missing.
    #[must_use]
    pub fn from_change(change: &Change) -> Option<Self> {
        Some(Self::new(
            change.project.as_deref()?,
            change.branch.as_deref()?,
            change.id.as_deref()?,
        ))
    }

    /// Render the identifier for use in a REST path, each part URL-encoded.
    #[must_use]
    pub fn as_url_part(&self) -> String {
        [&self.project, &self.branch, &self.id]
            .iter()
            .map(|part| url::form_urlencoded::byte_serialize(part.as_bytes()).collect::<String>())
            .collect::<Vec<_>>()
            .join("~")
    }
}
