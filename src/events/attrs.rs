//! Attribute types shared by Gerrit events.
//!
//! Every field is optional: Gerrit omits attributes freely between versions and
//! event kinds, and an absent attribute is never an error. Timestamps arrive as
//! epoch seconds; numbers such as change and patch set numbers may arrive as
//! either strings or integers depending on the server version.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Deserialize an attribute, treating `null` or a value of the wrong shape as
/// unset.
pub(crate) fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_else(|e| {
        tracing::debug!(error = %e, "Ignoring unreadable attribute");
        T::default()
    }))
}

/// Epoch-second timestamps. Unreadable values deserialize as unset.
pub(crate) mod epoch_seconds {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};
    use serde_json::Value;

    pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        chrono::serde::ts_seconds_option::serialize(value, serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let seconds = match Option::<Value>::deserialize(deserializer)? {
            Some(Value::Number(n)) => n.as_i64(),
            Some(Value::String(s)) => s.trim().parse().ok(),
            _ => None,
        };
        Ok(seconds.and_then(|secs| DateTime::from_timestamp(secs, 0)))
    }
}

/// Deserialize a JSON string or number into `Option<String>`.
fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

/// A Gerrit user account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

impl Account {
    /// Create an account from a display name and email.
    #[must_use]
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            email: Some(email.into()),
            username: None,
        }
    }

    /// Render the account as `"name" <email>`.
    ///
    /// Returns `None` when neither name nor email is known, and an empty
    /// string when both are empty.
    #[must_use]
    pub fn name_and_email(&self) -> Option<String> {
        match (self.name.as_deref(), self.email.as_deref()) {
            (None, None) => None,
            (Some(""), Some("")) => Some(String::new()),
            (name, email) => Some(format!(
                "\"{}\" <{}>",
                name.unwrap_or_default(),
                email.unwrap_or_default()
            )),
        }
    }
}

/// Review status of a change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeStatus {
    New,
    Merged,
    Abandoned,
    Draft,
    /// Status value this crate does not know about.
    #[serde(other)]
    Unknown,
}

/// A review message left on a change.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    #[serde(default, deserialize_with = "lenient")]
    pub message: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub reviewer: Option<Account>,
}

/// A Gerrit change.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Change {
    #[serde(default, deserialize_with = "lenient")]
    pub project: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub branch: Option<String>,
    /// The `Change-Id` footer value.
    #[serde(default, deserialize_with = "lenient")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub number: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub subject: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub owner: Option<Account>,
    #[serde(default, deserialize_with = "lenient")]
    pub url: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub commit_message: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub status: Option<ChangeStatus>,
    #[serde(default, deserialize_with = "lenient")]
    pub topic: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub hashtags: Vec<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub wip: bool,
    #[serde(default, deserialize_with = "lenient")]
    pub private: bool,
    #[serde(default, with = "epoch_seconds")]
    pub created_on: Option<DateTime<Utc>>,
    #[serde(default, with = "epoch_seconds")]
    pub last_updated: Option<DateTime<Utc>>,
    /// `None` when the query did not ask for comments.
    #[serde(default, deserialize_with = "lenient")]
    pub comments: Option<Vec<Comment>>,
}

/// A vote on a label.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Approval {
    /// Label name, e.g. `Code-Review`.
    #[serde(default, rename = "type", deserialize_with = "lenient")]
    pub label: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub value: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub old_value: Option<String>,
    #[serde(default, with = "epoch_seconds")]
    pub granted_on: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient")]
    pub by: Option<Account>,
}

/// A file touched by a patch set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchSetFile {
    #[serde(default, deserialize_with = "lenient")]
    pub file: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub file_old: Option<String>,
    /// `ADDED`, `MODIFIED`, `DELETED`, `RENAMED`, ...
    #[serde(default, rename = "type", deserialize_with = "lenient")]
    pub change_type: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub insertions: Option<i64>,
    #[serde(default, deserialize_with = "lenient")]
    pub deletions: Option<i64>,
}

/// A patch set of a change.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchSet {
    #[serde(default, deserialize_with = "string_or_number")]
    pub number: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub revision: Option<String>,
    #[serde(default, rename = "ref", deserialize_with = "lenient")]
    pub git_ref: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub parents: Vec<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub uploader: Option<Account>,
    #[serde(default, deserialize_with = "lenient")]
    pub author: Option<Account>,
    #[serde(default, with = "epoch_seconds")]
    pub created_on: Option<DateTime<Utc>>,
    /// `REWORK`, `TRIVIAL_REBASE`, `NO_CODE_CHANGE`, ...
    #[serde(default, deserialize_with = "lenient")]
    pub kind: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub approvals: Vec<Approval>,
    #[serde(default, deserialize_with = "lenient")]
    pub files: Vec<PatchSetFile>,
}

/// A ref update pushed to a project.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefUpdate {
    #[serde(default, deserialize_with = "lenient")]
    pub old_rev: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub new_rev: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub ref_name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub project: Option<String>,
}

/// Identity of the Gerrit server an event came from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provider {
    #[serde(default, deserialize_with = "lenient")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub host: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub port: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub scheme: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub url: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub version: Option<String>,
}

impl Provider {
    /// Create a provider known only by name.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }
}
