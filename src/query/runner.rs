//! Query execution.
//!
//! A query result is consumed one line at a time by a [`LineVisitor`]; nothing
//! is buffered beyond the current line unless the visitor chooses to collect.

use std::sync::Arc;

use serde_json::{Map, Value};
use tokio_util::sync::CancellationToken;

use super::{Query, QueryError};
use crate::events::TYPE_KEY;
use crate::transport::{LineSource, LineStream};

/// Per-line callback for query results.
pub trait LineVisitor: Send {
    /// Handle one non-blank result line.
    ///
    /// # Errors
    ///
    /// Returning an error aborts the query; remaining lines are not visited.
    fn visit(&mut self, line: &str) -> Result<(), QueryError>;
}

impl<F> LineVisitor for F
where
    F: FnMut(&str) -> Result<(), QueryError> + Send,
{
    fn visit(&mut self, line: &str) -> Result<(), QueryError> {
        self(line)
    }
}

/// A parsed query result line.
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    /// A data record.
    Data(Map<String, Value>),
    /// An in-band error reported by Gerrit.
    Error { message: String },
}

/// Parse a result line into a [`Record`].
///
/// A record whose `type` is `error` (any case) is an in-band error.
///
/// # Errors
///
/// Returns `QueryError::MalformedRecord` if the line is not a JSON object.
pub fn parse_record(line: &str) -> Result<Record, QueryError> {
    let malformed = |reason: String| QueryError::MalformedRecord {
        line: line.to_string(),
        reason,
    };

    match serde_json::from_str::<Value>(line) {
        Ok(Value::Object(json)) => {
            let is_error = json
                .get(TYPE_KEY)
                .and_then(Value::as_str)
                .is_some_and(|t| t.eq_ignore_ascii_case("error"));
            if is_error {
                let message = json
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                Ok(Record::Error { message })
            } else {
                Ok(Record::Data(json))
            }
        }
        Ok(other) => Err(malformed(format!("expected a JSON object, got {other}"))),
        Err(e) => Err(malformed(e.to_string())),
    }
}

/// Collects every line as a JSON object, failing on in-band errors.
#[derive(Debug, Default)]
pub struct ObjectCollector {
    records: Vec<Map<String, Value>>,
}

impl ObjectCollector {
    /// Take the collected records.
    #[must_use]
    pub fn into_records(self) -> Vec<Map<String, Value>> {
        self.records
    }
}

impl LineVisitor for ObjectCollector {
    fn visit(&mut self, line: &str) -> Result<(), QueryError> {
        match parse_record(line.trim())? {
            Record::Data(json) => {
                self.records.push(json);
                Ok(())
            }
            Record::Error { message } => Err(QueryError::Remote { message }),
        }
    }
}

/// Collects every line as a trimmed string.
///
/// In-band error records are logged and kept like any other line; this
/// collector never fails a query.
#[derive(Debug, Default)]
pub struct StringCollector {
    lines: Vec<String>,
}

impl StringCollector {
    /// Take the collected lines.
    #[must_use]
    pub fn into_lines(self) -> Vec<String> {
        self.lines
    }
}

impl LineVisitor for StringCollector {
    fn visit(&mut self, line: &str) -> Result<(), QueryError> {
        let trimmed = line.trim();
        if let Ok(Record::Error { message }) = parse_record(trimmed) {
            tracing::warn!(message = %message, "Gerrit reported a query error");
        }
        self.lines.push(trimmed.to_string());
        Ok(())
    }
}

/// Runs Gerrit queries over a [`LineSource`].
#[derive(Clone)]
pub struct QueryHandler {
    source: Arc<dyn LineSource>,
}

impl std::fmt::Debug for QueryHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryHandler").finish_non_exhaustive()
    }
}

impl QueryHandler {
    /// Create a handler that runs queries on `source`.
    #[must_use]
    pub fn new(source: Arc<dyn LineSource>) -> Self {
        Self { source }
    }

    /// Run a query, handing each non-blank result line to `visitor` in
    /// arrival order.
    ///
    /// The line stream is closed before this returns, whatever the outcome.
    ///
    /// # Errors
    ///
    /// Returns `QueryError::Transport` if the stream cannot be opened or read,
    /// or whatever error the visitor returned.
    pub async fn run_query(
        &self,
        query: &Query,
        visitor: &mut dyn LineVisitor,
    ) -> Result<(), QueryError> {
        self.run_query_until(query, visitor, &CancellationToken::new())
            .await
    }

    /// Like [`run_query`](Self::run_query), stopping early when `cancel` fires.
    ///
    /// # Errors
    ///
    /// Returns `QueryError::Cancelled` if cancelled before end of stream, and
    /// otherwise the same errors as `run_query`.
    pub async fn run_query_until(
        &self,
        query: &Query,
        visitor: &mut dyn LineVisitor,
        cancel: &CancellationToken,
    ) -> Result<(), QueryError> {
        let command = query.build_command();
        tracing::debug!(command = %command, "Running query");

        let mut stream = self.source.open(&command).await?;
        let result = drain(stream.as_mut(), visitor, cancel).await;
        tracing::trace!("Closing line stream");
        stream.close().await;
        result
    }

    /// Run a query and collect every record as a JSON object.
    ///
    /// # Errors
    ///
    /// Returns `QueryError::Remote` if Gerrit reports an error,
    /// `QueryError::MalformedRecord` for a non-object line, or a transport
    /// error.
    pub async fn query_objects(
        &self,
        query: &Query,
    ) -> Result<Vec<Map<String, Value>>, QueryError> {
        let mut collector = ObjectCollector::default();
        self.run_query(query, &mut collector).await?;
        Ok(collector.into_records())
    }

    /// Run a query and collect every line as a trimmed string.
    ///
    /// In-band error records are returned as ordinary lines.
    ///
    /// # Errors
    ///
    /// Returns `QueryError::Transport` if the command channel fails.
    pub async fn query_strings(&self, query: &Query) -> Result<Vec<String>, QueryError> {
        let mut collector = StringCollector::default();
        self.run_query(query, &mut collector).await?;
        Ok(collector.into_lines())
    }

    /// Query with all patch sets and the current patch set included.
    ///
    /// # Errors
    ///
    /// See [`query_objects`](Self::query_objects).
    pub async fn query(&self, text: &str) -> Result<Vec<Map<String, Value>>, QueryError> {
        let query = Query::new(text).patch_sets(true).current_patch_set(true);
        self.query_objects(&query).await
    }

    /// Query the current patch set and its file list.
    ///
    /// # Errors
    ///
    /// See [`query_objects`](Self::query_objects).
    pub async fn query_files(&self, text: &str) -> Result<Vec<Map<String, Value>>, QueryError> {
        let query = Query::new(text).current_patch_set(true).files(true);
        self.query_objects(&query).await
    }

    /// Query the current patch set only.
    ///
    /// # Errors
    ///
    /// See [`query_objects`](Self::query_objects).
    pub async fn query_current_patch_sets(
        &self,
        text: &str,
    ) -> Result<Vec<Map<String, Value>>, QueryError> {
        let query = Query::new(text).current_patch_set(true);
        self.query_objects(&query).await
    }

    /// Raw-line variant of [`query`](Self::query).
    ///
    /// # Errors
    ///
    /// See [`query_strings`](Self::query_strings).
    pub async fn query_raw(&self, text: &str) -> Result<Vec<String>, QueryError> {
        let query = Query::new(text).patch_sets(true).current_patch_set(true);
        self.query_strings(&query).await
    }
}

async fn drain(
    stream: &mut dyn LineStream,
    visitor: &mut dyn LineVisitor,
    cancel: &CancellationToken,
) -> Result<(), QueryError> {
    loop {
        let next = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(QueryError::Cancelled),
            next = stream.next_line() => next?,
        };
        let Some(line) = next else {
            return Ok(());
        };

        tracing::trace!(line = %line, "Incoming line");
        if line.trim().is_empty() {
            continue;
        }
        visitor.visit(&line)?;
    }
}
