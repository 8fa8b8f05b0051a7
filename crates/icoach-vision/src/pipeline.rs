//! Pipeline orchestration.
//!
//! Sequences the full analysis of one request: collaborator analysis ->
//! segment selection -> working copy -> frame sampling + per-frame
//! analysis -> one aggregation -> result envelope.
//!
//! Failure taxonomy (see the error module): collaborator failures and an
//! unopenable working copy are fatal; per-frame detection misses are
//! swallowed below the analyzer and only shrink the sample set.

use std::sync::Arc;

use icoach_indexing::{VideoAnalysis, VideoUnderstanding};
use icoach_models::{AnalyzeOptions, InsightEnvelope, MetricRecord, PipelineResult, Segment};
use metrics::counter;
use tracing::{info, warn};

use crate::aggregate::aggregate;
use crate::analyzer::FrameAnalyzer;
use crate::config::AnalysisConfig;
use crate::detect::DetectorSet;
use crate::error::VisionResult;
use crate::probe::probe_video;
use crate::sampler::{FrameSource, FrameStream};
use crate::segments::select_segments;
use crate::workcopy::WorkingCopy;

/// Collaborator analysis keys carried into the result envelope.
pub const ENVELOPE_KEYS: &[&str] = &["shots", "actions", "captions", "ocr", "logos"];

/// One-invocation pipeline orchestrator.
///
/// Single-threaded and sequential by design: decode state is inherently
/// serial, and each stage consumes the previous stage's output. Nothing
/// here is shared across invocations except the detector instances, which
/// serialize access internally.
pub struct Pipeline {
    provider: Arc<dyn VideoUnderstanding>,
    detectors: Arc<DetectorSet>,
    config: AnalysisConfig,
}

impl Pipeline {
    pub fn new(
        provider: Arc<dyn VideoUnderstanding>,
        detectors: Arc<DetectorSet>,
        config: AnalysisConfig,
    ) -> Self {
        Self {
            provider,
            detectors,
            config,
        }
    }

    /// Run the full pipeline for one video.
    ///
    /// The two collaborator polls inside `analyze_video` are the only long
    /// suspension points; dropping this future (caller abort) cancels them.
    pub async fn run(
        &self,
        video_url: &str,
        options: &AnalyzeOptions,
    ) -> VisionResult<PipelineResult> {
        let analysis = self.provider.analyze_video(video_url).await?;

        let segments = self.plan_segments(&analysis, options);
        info!(segments = segments.len(), fps = options.fps, "analysis plan ready");

        // Scoped acquisition: the copy is deleted when this scope unwinds,
        // on success and on every error path.
        let copy = WorkingCopy::fetch(video_url).await?;

        match probe_video(copy.path()).await {
            Ok(video) => info!(
                duration = video.duration,
                width = video.width,
                height = video.height,
                fps = video.fps,
                codec = %video.codec,
                "working copy probed"
            ),
            Err(e) => warn!(error = %e, "ffprobe unavailable, continuing without container info"),
        }

        let (records, timeline) = self.collect(copy.path(), &segments, options.fps)?;
        counter!("icoach_segments_analyzed_total").increment(timeline.len() as u64);
        counter!("icoach_frames_retained_total").increment(records.len() as u64);
        info!(
            retained = records.len(),
            segments = timeline.len(),
            "frame analysis complete"
        );

        let face_metrics = aggregate(&records, &self.config);

        Ok(PipelineResult {
            insight: InsightEnvelope {
                raw: analysis.filtered(ENVELOPE_KEYS),
                segments_used: segments,
            },
            face_metrics,
            samples_count: records.len(),
            timeline,
        })
    }

    /// Segment selection plus the caller's cap.
    fn plan_segments(&self, analysis: &VideoAnalysis, options: &AnalyzeOptions) -> Vec<Segment> {
        let mut segments =
            select_segments(&analysis.shots(), &analysis.actions(), &self.config);
        if let Some(cap) = options.max_segments {
            segments.truncate(cap as usize);
        }
        segments
    }

    #[cfg(feature = "opencv")]
    fn collect(
        &self,
        path: &std::path::Path,
        segments: &[Segment],
        fps: u32,
    ) -> VisionResult<(Vec<MetricRecord>, Vec<Segment>)> {
        let source = crate::sampler::OpenCvFrameSource::open(path)?;
        Ok(analyze_segments(
            source,
            segments,
            fps,
            &self.detectors,
            &self.config,
        ))
    }

    #[cfg(not(feature = "opencv"))]
    fn collect(
        &self,
        _path: &std::path::Path,
        _segments: &[Segment],
        _fps: u32,
    ) -> VisionResult<(Vec<MetricRecord>, Vec<Segment>)> {
        Err(crate::error::VisionError::internal(
            "built without video decoding (enable the opencv feature)",
        ))
    }
}

/// Sample and analyze every segment over one frame source.
///
/// Every segment gets a timeline entry, even when it yielded zero usable
/// frames — "we looked here" is part of the result.
pub fn analyze_segments<S: FrameSource>(
    source: S,
    segments: &[Segment],
    fps: u32,
    detectors: &DetectorSet,
    config: &AnalysisConfig,
) -> (Vec<MetricRecord>, Vec<Segment>) {
    let analyzer = FrameAnalyzer::new(config.clone());

    let mut records = Vec::new();
    for sample in FrameStream::new(source, segments, fps) {
        if let Some(record) = analyzer.analyze(&sample, detectors) {
            records.push(record);
        }
    }

    (records, segments.to_vec())
}
