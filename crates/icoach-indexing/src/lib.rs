//! Client for the external video-understanding service.
//!
//! The service indexes a video, runs a coarse semantic analysis and returns
//! shot boundaries, action events and auxiliary annotations. This crate
//! treats it as an opaque collaborator: submit, poll with a bounded
//! deadline, hand the raw analysis to the vision pipeline.
//!
//! The polling contract distinguishes two terminal failures:
//! - [`InsightError::JobFailed`] — the collaborator reported a terminal
//!   error for the job.
//! - [`InsightError::Timeout`] — the deadline elapsed with the final state
//!   unknown.

pub mod client;
pub mod error;
pub mod poll;
pub mod types;

pub use client::{InsightClient, InsightConfig, VideoUnderstanding};
pub use error::{InsightError, InsightResult};
pub use poll::{poll_until_ready, JobStatus, PollConfig};
pub use types::{RawInterval, VideoAnalysis};
