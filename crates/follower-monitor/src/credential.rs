//! Opaque session credential.

use std::fmt;
use std::path::Path;

use crate::error::MonitorError;

/// Session cookie blob used to act as the monitored account.
///
/// The pipeline only passes it through; the browser sampler is the one
/// place that interprets it. `Debug` never prints the value.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Wrap a raw cookie blob.
    pub fn new(blob: impl Into<String>) -> Self {
        Self(blob.into())
    }

    /// Resolve the credential from a cookie file or an environment value.
    ///
    /// The file wins when it exists, matching how the job was historically
    /// deployed (a checked-out `cookies.json` overriding the CI secret).
    pub fn resolve(file: &Path, env_value: Option<String>) -> Result<Self, MonitorError> {
        if file.exists() {
            tracing::info!(path = %file.display(), "Loading cookies from file");
            let blob = std::fs::read_to_string(file).map_err(|e| {
                MonitorError::Config(format!("failed to read {}: {e}", file.display()))
            })?;
            return Self::non_empty(blob, &file.display().to_string());
        }

        match env_value {
            Some(blob) => {
                tracing::info!("Loading cookies from environment variable");
                Self::non_empty(blob, "X_COOKIES")
            }
            None => Err(MonitorError::Config(format!(
                "X_COOKIES environment variable or {} file is required",
                file.display()
            ))),
        }
    }

    fn non_empty(blob: String, source: &str) -> Result<Self, MonitorError> {
        if blob.trim().is_empty() {
            Err(MonitorError::Config(format!("cookie source {source} is empty")))
        } else {
            Ok(Self(blob))
        }
    }

    /// Raw blob, for the browser boundary only.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Credential").field(&"<redacted>").finish()
    }
}
