//! Facial geometry metrics from per-frame landmark detections.

use icoach_models::BoundingBox;
use nalgebra::Point2;
use tracing::debug;

use crate::config::AnalysisConfig;
use crate::detect::{mesh_index, DetectorSet, Landmark};
use crate::error::VisionResult;
use crate::frame::Frame;
use crate::headpose::{solve_head_pose, CameraIntrinsics};
use crate::EPS;

/// Facial subset of the per-frame metrics, plus the face box the posture
/// extractor needs for hand proximity.
#[derive(Debug, Clone)]
pub struct FaceMetrics {
    pub ear: f64,
    pub smile_idx: f64,
    pub yaw: f64,
    pub pitch: f64,
    pub roll: f64,
    pub bbox_area: f64,
    pub luma: f64,
    pub face_box: BoundingBox,
}

/// Eye aspect ratio from 4 keypoints of one eye: vertical pair first,
/// horizontal pair second. Scale invariant — both distances grow together.
pub fn eye_aspect_ratio(points: &[Point2<f64>; 4]) -> f64 {
    let vertical = (points[0] - points[1]).norm();
    let horizontal = (points[2] - points[3]).norm() + EPS;
    vertical / horizontal
}

fn landmark_point(landmarks: &[Landmark], index: usize) -> Option<Point2<f64>> {
    landmarks.get(index).map(|lm| Point2::new(lm.x, lm.y))
}

fn eye_points(landmarks: &[Landmark], indices: &[usize; 4]) -> Option<[Point2<f64>; 4]> {
    Some([
        landmark_point(landmarks, indices[0])?,
        landmark_point(landmarks, indices[1])?,
        landmark_point(landmarks, indices[2])?,
        landmark_point(landmarks, indices[3])?,
    ])
}

/// Computes the facial metrics for one frame.
pub struct FaceGeometryExtractor {
    config: AnalysisConfig,
}

impl FaceGeometryExtractor {
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    /// Extract facial metrics, or `None` when the frame has no usable face
    /// data (no detection, no mesh, or a non-converging pose solve). Such
    /// frames are dropped from aggregation entirely.
    pub fn extract(
        &self,
        frame: &Frame,
        detectors: &DetectorSet,
    ) -> VisionResult<Option<FaceMetrics>> {
        let luma = frame.mean_luma();

        let Some(face) = detectors.face.detect_face(frame)? else {
            return Ok(None);
        };

        let Some(mesh) = detectors.mesh.detect_mesh(frame, &face.bbox)? else {
            debug!("face without mesh landmarks");
            return Ok(None);
        };
        let landmarks = &mesh.0;

        let (Some(left), Some(right)) = (
            eye_points(landmarks, &mesh_index::LEFT_EYE),
            eye_points(landmarks, &mesh_index::RIGHT_EYE),
        ) else {
            return Ok(None);
        };
        let ear = (eye_aspect_ratio(&left) + eye_aspect_ratio(&right)) / 2.0;

        let (Some(mouth_left), Some(mouth_right)) = (
            landmark_point(landmarks, mesh_index::MOUTH_CORNERS[0]),
            landmark_point(landmarks, mesh_index::MOUTH_CORNERS[1]),
        ) else {
            return Ok(None);
        };
        let smile_idx = (mouth_left - mouth_right).norm() / (face.bbox.width + EPS);

        let pose_indices = [
            mesh_index::NOSE_TIP,
            mesh_index::EYE_OUTER[0],
            mesh_index::EYE_OUTER[1],
            mesh_index::MOUTH_CORNERS[0],
            mesh_index::MOUTH_CORNERS[1],
        ];
        let mut image_points = [Point2::new(0.0, 0.0); 5];
        for (slot, index) in image_points.iter_mut().zip(pose_indices) {
            match landmark_point(landmarks, index) {
                Some(point) => *slot = point,
                None => return Ok(None),
            }
        }

        let intrinsics = CameraIntrinsics::approximate(frame.width(), frame.height());
        let Some(pose) = solve_head_pose(
            &image_points,
            &intrinsics,
            self.config.pnp_max_iterations,
            self.config.pnp_convergence_eps,
        ) else {
            debug!("head pose solve did not converge");
            return Ok(None);
        };

        Ok(Some(FaceMetrics {
            ear,
            smile_idx,
            yaw: pose.yaw,
            pitch: pose.pitch,
            roll: pose.roll,
            bbox_area: face.bbox.area_ratio(frame.width(), frame.height()),
            luma,
            face_box: face.bbox,
        }))
    }
}
