//! Error taxonomy for a monitor run.
//!
//! Every variant of [`MonitorError`] is fatal to the run except
//! [`MonitorError::Notify`], which the pipeline only logs.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while extracting the follower count from page HTML.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScrapeError {
    /// The followers link is missing, usually a page layout change.
    #[error("follower count element not found for @{username} (looked for {selector})")]
    ElementNotFound { username: String, selector: String },

    /// The element exists but does not start with a number.
    #[error("follower count is not numeric: {text:?}")]
    NotNumeric { text: String },
}

/// Errors raised by a [`Sampler`](crate::sampler::Sampler).
#[derive(Debug, Error)]
pub enum SampleError {
    /// The credential was rejected or could not be applied.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// The page loaded but the count could not be extracted.
    #[error(transparent)]
    Scrape(#[from] ScrapeError),

    /// The browser could not be launched or driven.
    #[error("browser session failed: {0}")]
    Browser(String),
}

/// Errors raised by the persistent state store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The state file exists but could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The state file is not a valid history document.
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// A state or snapshot file could not be written.
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A document could not be serialized.
    #[error("failed to serialize {}: {source}", path.display())]
    Serialize {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Top-level error for one pipeline invocation.
#[derive(Debug, Error)]
pub enum MonitorError {
    /// Bad or expired credential.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Page/DOM mismatch.
    #[error("scrape failed: {0}")]
    Scrape(#[from] ScrapeError),

    /// State store unreadable or unwritable.
    #[error("state store I/O failed: {0}")]
    Io(#[from] StoreError),

    /// Webhook delivery failed. Never fatal.
    #[error("notification failed: {0}")]
    Notify(#[from] notify::ChannelError),

    /// Browser launch or CDP failure.
    #[error("browser session failed: {0}")]
    Browser(String),

    /// Missing or invalid configuration.
    #[error("configuration error: {0}")]
    Config(String),
}

impl MonitorError {
    /// Whether this error aborts the run.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        !matches!(self, Self::Notify(_))
    }
}

impl From<SampleError> for MonitorError {
    fn from(err: SampleError) -> Self {
        match err {
            SampleError::Auth(reason) => Self::Auth(reason),
            SampleError::Scrape(e) => Self::Scrape(e),
            SampleError::Browser(reason) => Self::Browser(reason),
        }
    }
}

/// Result alias for monitor operations.
pub type MonitorResult<T> = Result<T, MonitorError>;
