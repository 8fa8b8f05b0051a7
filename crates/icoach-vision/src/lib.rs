//! Vision analysis core for the Interview Coach backend.
//!
//! Estimates non-verbal interview signals (eye contact, blinking, posture,
//! gestures) from a recorded video: frames are sampled inside externally
//! supplied time segments, per-frame geometric metrics are extracted from
//! landmark detections, and the collection is reduced to summary
//! statistics.
//!
//! The stages, leaves first:
//! - [`segments`] — filters and orders raw intervals into a bounded plan
//! - [`sampler`] — decodes frames at a target rate within each segment
//! - [`face`] / [`headpose`] — facial geometry and PnP head orientation
//! - [`posture`] — body geometry (lean, symmetry, hand heuristics)
//! - [`analyzer`] — one metric record per usable frame
//! - [`aggregate`] — pure reduction into summary statistics
//! - [`pipeline`] — orchestration, working copy lifetime, result envelope
//!
//! Detector backends live behind capability traits in [`detect`]; the
//! OpenCV-based ones are gated behind the `opencv` feature.

pub mod aggregate;
pub mod analyzer;
pub mod config;
pub mod detect;
pub mod error;
pub mod face;
pub mod frame;
pub mod headpose;
pub mod pipeline;
pub mod posture;
pub mod probe;
pub mod sampler;
pub mod segments;
pub mod workcopy;

pub use aggregate::aggregate as aggregate_records;
pub use analyzer::FrameAnalyzer;
pub use config::AnalysisConfig;
pub use detect::DetectorSet;
pub use error::{VisionError, VisionResult};
pub use frame::Frame;
pub use pipeline::{analyze_segments, Pipeline};
pub use sampler::{FrameSource, FrameStream, SampledFrame};
pub use segments::select_segments;
pub use workcopy::WorkingCopy;

/// Shared denominator guard for the geometric ratios.
pub(crate) const EPS: f64 = 1e-6;
