//! Configuration types.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::events::Provider;

/// Default Gerrit SSH port.
pub const DEFAULT_SSH_PORT: u16 = 29418;

/// SSH connection settings for the Gerrit command channel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SshConfig {
    /// Gerrit host name.
    pub host: String,
    /// Gerrit SSH daemon port.
    pub port: u16,
    /// User to connect as; falls back to the ssh client default.
    pub user: Option<String>,
    /// Private key to authenticate with.
    pub key_file: Option<PathBuf>,
    /// Connection timeout in seconds.
    pub connect_timeout_secs: u64,
}

impl Default for SshConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: DEFAULT_SSH_PORT,
            user: None,
            key_file: None,
            connect_timeout_secs: 10,
        }
    }
}

impl SshConfig {
    /// Provider identity stamped on events received over this connection.
    #[must_use]
    pub fn provider(&self) -> Provider {
        Provider {
            name: Some(self.host.clone()),
            host: Some(self.host.clone()),
            port: Some(self.port.to_string()),
            scheme: Some("ssh".to_string()),
            url: None,
            version: None,
        }
    }
}

/// REST settings used when posting reviews.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RestConfig {
    /// Gerrit web front end URL.
    pub frontend_url: String,
    /// HTTP user name.
    pub http_user: Option<String>,
    /// Environment variable holding the HTTP password.
    pub http_password_env: String,
    /// Optional HTTP proxy URL.
    pub proxy: Option<String>,
}

impl Default for RestConfig {
    fn default() -> Self {
        Self {
            frontend_url: "http://localhost:8080/".to_string(),
            http_user: None,
            http_password_env: "GERRIT_HTTP_PASSWORD".to_string(),
            proxy: None,
        }
    }
}

/// Dispatch pipeline sizing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DispatchConfig {
    /// Capacity of each worker queue.
    pub queue_capacity: usize,
    /// Number of worker tasks.
    pub workers: usize,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 1024,
            workers: 3,
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GerritConfig {
    pub ssh: SshConfig,
    pub rest: RestConfig,
    pub dispatch: DispatchConfig,
}

impl GerritConfig {
    /// Reject settings the ssh channel or the dispatcher cannot run with.
    ///
    /// # Errors
    ///
    /// Returns a message naming the first offending key.
    pub fn validate(&self) -> Result<(), String> {
        if self.ssh.host.trim().is_empty() {
            return Err("ssh.host must not be empty".to_string());
        }
        if self.ssh.port == 0 {
            return Err("ssh.port must not be 0".to_string());
        }
        if self.dispatch.workers == 0 {
            return Err("dispatch.workers must be at least 1".to_string());
        }
        if self.dispatch.queue_capacity == 0 {
            return Err("dispatch.queue_capacity must be at least 1".to_string());
        }
        url::Url::parse(&self.rest.frontend_url)
            .map_err(|e| format!("rest.frontend_url {:?} is not a URL: {e}", self.rest.frontend_url))?;
        Ok(())
    }
}
