//! Pipeline result envelope.

use serde::{Deserialize, Serialize};

use crate::segment::Segment;
use crate::summary::SummaryStatistics;

/// What the external video-understanding service contributed to one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsightEnvelope {
    /// Collaborator analysis, filtered to the keys relevant downstream
    pub raw: serde_json::Value,
    /// Segments selected for frame analysis, in analysis order
    pub segments_used: Vec<Segment>,
}

/// Final output of one pipeline invocation.
///
/// Owned solely by the orchestrator for the duration of one request;
/// nothing here is shared across invocations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineResult {
    /// External video-understanding contribution
    pub insight: InsightEnvelope,
    /// Aggregated facial and posture metrics
    pub face_metrics: SummaryStatistics,
    /// Every analyzed segment, recorded even when it yielded no usable frames
    pub timeline: Vec<Segment>,
    /// Total retained per-frame records across all segments
    pub samples_count: usize,
}
