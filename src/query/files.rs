//! File list lookup for a single change.

use serde_json::{Map, Value};

use super::{Query, QueryHandler};

/// Record type Gerrit appends to every query result.
const STATS_TYPE: &str = "stats";

impl QueryHandler {
    /// List the files touched by the current patch set of a change.
    ///
    /// Any failure is logged and yields an empty list.
    pub async fn files_by_change(&self, change_id: &str) -> Vec<String> {
        let query = Query::new(format!("change:{change_id}"))
            .current_patch_set(true)
            .files(true);

        match self.query_objects(&query).await {
            Ok(records) => current_patch_set_files(&records),
            Err(e) => {
                tracing::error!(change_id = %change_id, error = %e, "File list query failed");
                Vec::new()
            }
        }
    }
}

/// Extract file paths from the first change record that has a current patch
/// set. Statistics records are skipped.
#[must_use]
pub fn current_patch_set_files(records: &[Map<String, Value>]) -> Vec<String> {
    records
        .iter()
        .filter(|record| record.get("type").and_then(Value::as_str) != Some(STATS_TYPE))
        .find_map(|record| record.get("currentPatchSet").and_then(Value::as_object))
        .and_then(|patch_set| patch_set.get("files"))
        .and_then(Value::as_array)
        .map(|files| {
            files
                .iter()
                .filter_map(|f| f.get("file").and_then(Value::as_str))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}
