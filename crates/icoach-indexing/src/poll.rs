//! Bounded polling for collaborator jobs.
//!
//! Job completion is awaited with a fixed-interval poll against an overall
//! deadline: submitted -> polling -> ready | failed | timed-out. The loop
//! only suspends inside `tokio::time::sleep`, so dropping the future (the
//! caller aborting the request) cancels the poll cleanly.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use crate::error::{InsightError, InsightResult};

/// One observed job status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    /// Still processing; keep polling
    Pending,
    /// Terminal success
    Ready,
    /// Terminal failure reported by the collaborator, with its state string
    Failed(String),
}

/// Poll interval and overall deadline for one job.
#[derive(Debug, Clone, Copy)]
pub struct PollConfig {
    /// Fixed sleep between status checks
    pub interval: Duration,
    /// Overall deadline; exceeding it yields [`InsightError::Timeout`]
    pub deadline: Duration,
}

impl PollConfig {
    pub fn new(interval: Duration, deadline: Duration) -> Self {
        Self { interval, deadline }
    }
}

/// Drive `check` until the job is ready, fails, or the deadline passes.
///
/// `what` names the job kind in logs. A collaborator-reported failure maps
/// to [`InsightError::JobFailed`]; an exhausted deadline maps to
/// [`InsightError::Timeout`] — the final state is unknown in that case and
/// the two are never conflated.
pub async fn poll_until_ready<F, Fut>(
    config: PollConfig,
    what: &str,
    mut check: F,
) -> InsightResult<()>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = InsightResult<JobStatus>>,
{
    let started = Instant::now();
    let mut polls: u32 = 0;

    loop {
        match check().await? {
            JobStatus::Ready => {
                debug!(what, polls, elapsed = ?started.elapsed(), "job ready");
                return Ok(());
            }
            JobStatus::Failed(state) => {
                return Err(InsightError::JobFailed { state });
            }
            JobStatus::Pending => {}
        }

        if started.elapsed() >= config.deadline {
            return Err(InsightError::Timeout {
                waited_secs: config.deadline.as_secs(),
            });
        }

        polls += 1;
        tokio::time::sleep(config.interval).await;
    }
}
