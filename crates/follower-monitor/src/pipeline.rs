//! Monitor pipeline - orchestrates the load-sample-diff-persist-notify flow.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;

use crate::credential::Credential;
use crate::differ::diff;
use crate::error::{MonitorError, MonitorResult};
use crate::notifier::{ChangeNotifier, NotifyOutcome};
use crate::sampler::Sampler;
use crate::store::{FollowerSnapshot, StateStore};

/// Position of a run in its linear lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Init,
    Loaded,
    Sampled,
    Diffed,
    Persisted,
    Notified,
    Done,
    Failed,
}

impl RunState {
    /// The only state reachable from this one on success.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Init => Some(Self::Loaded),
            Self::Loaded => Some(Self::Sampled),
            Self::Sampled => Some(Self::Diffed),
            Self::Diffed => Some(Self::Persisted),
            Self::Persisted => Some(Self::Notified),
            Self::Notified => Some(Self::Done),
            Self::Done | Self::Failed => None,
        }
    }

    /// Name of the step that runs while leaving this state.
    #[must_use]
    pub const fn pending_step(self) -> &'static str {
        match self {
            Self::Init => "load",
            Self::Loaded => "sample",
            Self::Sampled => "diff",
            Self::Diffed => "persist",
            Self::Persisted => "notify",
            Self::Notified => "finish",
            Self::Done | Self::Failed => "none",
        }
    }

    /// Whether the run has ended.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Init => "INIT",
            Self::Loaded => "LOADED",
            Self::Sampled => "SAMPLED",
            Self::Diffed => "DIFFED",
            Self::Persisted => "PERSISTED",
            Self::Notified => "NOTIFIED",
            Self::Done => "DONE",
            Self::Failed => "FAILED",
        };
        f.write_str(name)
    }
}

/// Tracks and logs state transitions for one run.
#[derive(Debug)]
struct RunTracker {
    trail: Vec<RunState>,
}

impl RunTracker {
    fn new() -> Self {
        Self {
            trail: vec![RunState::Init],
        }
    }

    fn current(&self) -> RunState {
        self.trail.last().copied().unwrap_or(RunState::Init)
    }

    fn advance(&mut self) {
        let from = self.current();
        if let Some(to) = from.next() {
            tracing::debug!(%from, %to, "Run state transition");
            self.trail.push(to);
        }
    }

    fn fail(&mut self, err: &MonitorError) {
        let from = self.current();
        tracing::error!(%from, step = from.pending_step(), error = %err, "Run failed");
        self.trail.push(RunState::Failed);
    }
}

/// Configuration for the monitor pipeline.
#[derive(Debug, Clone, Default)]
pub struct PipelineConfig {
    /// Monitored profile (without @).
    pub username: String,
    /// Send a failure alert to the channels when a run aborts.
    pub alert_on_failure: bool,
}

/// Result of a single successful run.
#[derive(Debug)]
pub struct RunReport {
    /// Count stored before this run, `None` on the baseline run.
    pub previous_count: Option<u64>,
    /// Freshly sampled count.
    pub new_count: u64,
    /// Signed change; 0 on the baseline run.
    pub delta: i64,
    /// Snapshot appended to the history.
    pub snapshot: FollowerSnapshot,
    /// Timestamped snapshot file written this run.
    pub archive_path: PathBuf,
    /// Number of snapshots after this run.
    pub history_len: usize,
    /// Notification result.
    pub notification: NotifyOutcome,
    /// States visited, `INIT` through `DONE`.
    pub states: Vec<RunState>,
}

impl RunReport {
    /// Whether this run established the first data point.
    #[must_use]
    pub fn is_baseline(&self) -> bool {
        self.previous_count.is_none()
    }
}

/// Monitor pipeline orchestrator.
pub struct Pipeline {
    config: PipelineConfig,
    credential: Credential,
    sampler: Arc<dyn Sampler>,
    notifier: ChangeNotifier,
}

impl Pipeline {
    /// Create a new pipeline.
    #[must_use]
    pub fn new(
        config: PipelineConfig,
        credential: Credential,
        sampler: Arc<dyn Sampler>,
        notifier: ChangeNotifier,
    ) -> Self {
        Self {
            config,
            credential,
            sampler,
            notifier,
        }
    }

    /// Run the pipeline once against `store`.
    ///
    /// Any error returned is fatal to the run; notification failures are
    /// reported inside the [`RunReport`] instead.
    pub async fn run(&self, store: &StateStore) -> MonitorResult<RunReport> {
        let mut tracker = RunTracker::new();
        tracing::info!(username = %self.config.username, "Starting monitor run");

        match self.execute(store, &mut tracker).await {
            Ok(report) => Ok(report),
            Err(err) => {
                let step = tracker.current().pending_step();
                tracker.fail(&err);

                if self.config.alert_on_failure {
                    let outcome = self.notifier.alert_failure(step, &err.to_string()).await;
                    tracing::debug!(?outcome, "Failure alert dispatched");
                }

                Err(err)
            }
        }
    }

    async fn execute(
        &self,
        store: &StateStore,
        tracker: &mut RunTracker,
    ) -> MonitorResult<RunReport> {
        // LOADED
        let mut history = store.load()?;
        match history.username.as_deref() {
            Some(stored) if !stored.eq_ignore_ascii_case(&self.config.username) => {
                tracing::warn!(
                    stored,
                    configured = %self.config.username,
                    "State file belongs to a different username"
                );
            }
            Some(_) => {}
            None => history.username = Some(self.config.username.clone()),
        }
        tracing::debug!(snapshots = history.len(), last_count = history.last_count, "Loaded state");
        tracker.advance();

        // SAMPLED
        let new_count = self
            .sampler
            .fetch(&self.credential)
            .await
            .map_err(MonitorError::from)?;
        tracker.advance();

        // DIFFED
        let previous_count = history.previous_count();
        let delta = match previous_count {
            Some(last) => diff(new_count, last),
            None => {
                tracing::info!(new_count, "First run - no previous data to compare");
                0
            }
        };
        tracing::info!(previous = ?previous_count, new_count, delta, "Computed follower delta");
        tracker.advance();

        // PERSISTED
        let snapshot = history.record(new_count, Utc::now());
        let archive_path = store.archive(&self.config.username, snapshot)?;
        store.save(&history)?;
        tracing::info!(
            path = %store.state_path().display(),
            snapshots = history.len(),
            "Data saved"
        );
        tracker.advance();

        // NOTIFIED
        let notification = self.notifier.notify(delta, new_count).await;
        if let NotifyOutcome::Failed { errors } = &notification {
            for error in errors {
                tracing::warn!(%error, "Notification failed, sample is still recorded");
            }
        }
        tracker.advance();

        // DONE
        tracker.advance();
        tracing::info!(new_count, delta, "Monitor run complete");

        Ok(RunReport {
            previous_count,
            new_count,
            delta,
            snapshot,
            archive_path,
            history_len: history.len(),
            notification,
            states: tracker.trail.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_states_form_a_line() {
        let mut state = RunState::Init;
        let mut visited = vec![state];
        while let Some(next) = state.next() {
            visited.push(next);
            state = next;
        }

        assert_eq!(
            visited,
            vec![
                RunState::Init,
                RunState::Loaded,
                RunState::Sampled,
                RunState::Diffed,
                RunState::Persisted,
                RunState::Notified,
                RunState::Done,
            ]
        );
        assert!(RunState::Done.is_terminal());
        assert!(RunState::Failed.is_terminal());
        assert_eq!(RunState::Failed.next(), None);
    }

    #[test]
    fn test_pending_step_names() {
        assert_eq!(RunState::Init.pending_step(), "load");
        assert_eq!(RunState::Loaded.pending_step(), "sample");
        assert_eq!(RunState::Diffed.pending_step(), "persist");
    }

    #[test]
    fn test_tracker_records_failure() {
        let mut tracker = RunTracker::new();
        tracker.advance();
        tracker.fail(&MonitorError::Auth("expired".to_string()));

        assert_eq!(
            tracker.trail,
            vec![RunState::Init, RunState::Loaded, RunState::Failed]
        );
        assert_eq!(tracker.current(), RunState::Failed);
    }

    #[test]
    fn test_display_uses_upper_case_names() {
        assert_eq!(RunState::Persisted.to_string(), "PERSISTED");
    }
}
