//! Per-frame analysis: facial and posture extractors combined into one
//! metric record, or nothing.

use icoach_models::MetricRecord;
use tracing::debug;

use crate::config::AnalysisConfig;
use crate::detect::DetectorSet;
use crate::face::FaceGeometryExtractor;
use crate::posture::{PostureGeometryExtractor, PostureMetrics};
use crate::sampler::SampledFrame;

/// Runs both extractors on a sampled frame.
///
/// A frame contributes to aggregation only when face detection, mesh
/// landmarks and the head-pose solve all succeeded. Posture data may be
/// absent without excluding the frame. Detector errors are swallowed here —
/// they degrade a single frame, never the run.
pub struct FrameAnalyzer {
    face: FaceGeometryExtractor,
    posture: PostureGeometryExtractor,
}

impl FrameAnalyzer {
    pub fn new(config: AnalysisConfig) -> Self {
        Self {
            face: FaceGeometryExtractor::new(config.clone()),
            posture: PostureGeometryExtractor::new(config),
        }
    }

    /// Analyze one frame. `None` means the frame is dropped.
    pub fn analyze(&self, sample: &SampledFrame, detectors: &DetectorSet) -> Option<MetricRecord> {
        let face = match self.face.extract(&sample.frame, detectors) {
            Ok(Some(face)) => face,
            Ok(None) => return None,
            Err(e) => {
                debug!(t = sample.timestamp, error = %e, "face extraction failed, frame dropped");
                return None;
            }
        };

        let posture = match self
            .posture
            .extract(&sample.frame, &face.face_box, detectors)
        {
            Ok(posture) => posture,
            Err(e) => {
                debug!(t = sample.timestamp, error = %e, "posture extraction failed, fields absent");
                PostureMetrics::default()
            }
        };

        Some(MetricRecord {
            t: sample.timestamp,
            label: sample.label.clone(),
            ear: face.ear,
            smile_idx: face.smile_idx,
            yaw: face.yaw,
            pitch: face.pitch,
            roll: face.roll,
            bbox_area: face.bbox_area,
            luma: face.luma,
            torso_lean_deg: posture.torso_lean_deg,
            shoulder_level_diff: posture.shoulder_level_diff,
            hands_visible: posture.hands_visible,
            hands_near_face: posture.hands_near_face,
            arms_crossed: posture.arms_crossed,
        })
    }
}
