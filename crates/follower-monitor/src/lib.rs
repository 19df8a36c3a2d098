//! Follower-count monitor for X (formerly Twitter) profiles.
//!
//! This crate provides:
//! - Follower count sampling via a headless browser with session cookies
//! - A JSON history store with timestamped snapshot archives
//! - Signed delta computation between runs
//! - Webhook notifications (Discord, Slack) on non-zero deltas
//! - A one-shot pipeline suited to a scheduled job

pub mod credential;
pub mod differ;
pub mod error;
pub mod notifier;
pub mod pipeline;
pub mod sampler;
pub mod store;

// Re-export main types
pub use credential::Credential;
pub use differ::diff;
pub use error::{MonitorError, MonitorResult, SampleError, ScrapeError, StoreError};
pub use notifier::{ChangeNotifier, NotifyOutcome};
pub use pipeline::{Pipeline, PipelineConfig, RunReport, RunState};
pub use sampler::{BrowserSampler, FollowerCountParser, Sampler, SamplerConfig};
pub use store::{ArchivedSnapshot, FollowerSnapshot, HistoryStore, StateStore};
