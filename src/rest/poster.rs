//! Posting reviews over the Gerrit REST API.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, Proxy};
use thiserror::Error;

use super::{ChangeId, ReviewInput};
use crate::config::RestConfig;

/// Connection timeout for review requests.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Overall request timeout for review requests.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors from review posting.
#[derive(Error, Debug)]
pub enum ReviewError {
    #[error("Invalid proxy URL {url}: {source}")]
    InvalidProxy {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Gerrit response {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
}

/// Secondary destination for review failures, such as a build log.
pub trait LogSink: Send + Sync {
    fn log(&self, message: &str);
}

impl<F> LogSink for F
where
    F: Fn(&str) + Send + Sync,
{
    fn log(&self, message: &str) {
        self(message);
    }
}

/// Posts reviews to a Gerrit front end.
#[derive(Clone)]
pub struct ReviewPoster {
    client: Client,
    frontend_url: String,
    credentials: Option<(String, Option<String>)>,
    alt_log: Option<Arc<dyn LogSink>>,
}

impl std::fmt::Debug for ReviewPoster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReviewPoster")
            .field("frontend_url", &self.frontend_url)
            .field("user", &self.credentials.as_ref().map(|(user, _)| user))
            .finish_non_exhaustive()
    }
}

impl ReviewPoster {
    /// Create a poster from REST settings.
    ///
    /// The HTTP password is read from the configured environment variable. An
    /// unusable proxy URL is logged and ignored.
    ///
    /// # Errors
    ///
    /// Returns `ReviewError::Http` if the HTTP client cannot be built.
    pub fn new(config: &RestConfig) -> Result<Self, ReviewError> {
        let credentials = config.http_user.clone().map(|user| {
            let password = std::env::var(&config.http_password_env).ok();
            (user, password)
        });

        let client = match config.proxy.as_deref().filter(|p| !p.is_empty()) {
            Some(proxy) => match build_client(Some(proxy)) {
                Ok(client) => client,
                Err(e) => {
                    tracing::error!(error = %e, "Could not use proxy, continuing without it");
                    build_client(None)?
                }
            },
            None => build_client(None)?,
        };

        Ok(Self {
            client,
            frontend_url: config.frontend_url.clone(),
            credentials,
            alt_log: None,
        })
    }

    /// Also report failures to `sink`.
    #[must_use]
    pub fn with_alt_log(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.alt_log = Some(sink);
        self
    }

    /// The review endpoint for a revision of a change.
    #[must_use]
    pub fn endpoint(&self, change: &ChangeId, revision: &str) -> String {
        let mut url = self.frontend_url.clone();
        if !url.ends_with('/') {
            url.push('/');
        }
        format!(
            "{url}a/changes/{}/revisions/{revision}/review",
            change.as_url_part()
        )
    }

    /// Post a review and return the response body.
    ///
    /// Failures are logged, never returned; a failed request yields an empty
    /// body. A non-success status still returns whatever body Gerrit sent.
    pub async fn post(&self, change: &ChangeId, revision: &str, review: &ReviewInput) -> String {
        match self.try_post(change, revision, review).await {
            Ok(body) => body,
            Err(ReviewError::Status { status, body }) => {
                self.report(&format!("Gerrit response: {status}"));
                body
            }
            Err(e) => {
                self.report(&format!("Failed to submit result to Gerrit: {e}"));
                String::new()
            }
        }
    }

    /// Post a review, returning any failure to the caller.
    ///
    /// # Errors
    ///
    /// Returns `ReviewError::Http` on transport failure and
    /// `ReviewError::Status` for a non-success response.
    pub async fn try_post(
        &self,
        change: &ChangeId,
        revision: &str,
        review: &ReviewInput,
    ) -> Result<String, ReviewError> {
        let url = self.endpoint(change, revision);
        tracing::debug!(url = %url, "Posting review");

        let mut request = self.client.post(&url).json(review);
        if let Some((user, password)) = &self.credentials {
            request = request.basic_auth(user, password.as_deref());
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;
        if status.is_success() {
            Ok(body)
        } else {
            Err(ReviewError::Status { status, body })
        }
    }

    fn report(&self, message: &str) {
        tracing::error!(frontend = %self.frontend_url, "{message}");
        if let Some(sink) = &self.alt_log {
            sink.log(&format!("ERROR {message}"));
        }
    }
}

fn build_client(proxy: Option<&str>) -> Result<Client, ReviewError> {
    let mut builder = Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .timeout(REQUEST_TIMEOUT);
    if let Some(url) = proxy {
        let proxy = Proxy::all(url).map_err(|source| ReviewError::InvalidProxy {
            url: url.to_string(),
            source,
        })?;
        builder = builder.proxy(proxy);
    }
    Ok(builder.build()?)
}
