//! Follower count sampling.
//!
//! The [`Sampler`] trait is the seam between the pipeline and the remote
//! page. [`BrowserSampler`] drives headless Chromium with the session
//! cookies; [`FollowerCountParser`] turns the rendered HTML into a number.

mod browser;
pub mod cookies;
mod parser;

pub use browser::{BrowserSampler, SamplerConfig};
pub use parser::FollowerCountParser;

use async_trait::async_trait;

use crate::credential::Credential;
use crate::error::SampleError;

/// Source of the current follower count.
#[async_trait]
pub trait Sampler: Send + Sync {
    /// Authenticate with `credential` and return the profile's follower count.
    async fn fetch(&self, credential: &Credential) -> Result<u64, SampleError>;
}
