//! Posture and gesture metrics from per-frame body landmarks.

use icoach_models::BoundingBox;
use nalgebra::Point2;
use tracing::debug;

use crate::config::AnalysisConfig;
use crate::detect::{pose_index, DetectorSet, Landmark};
use crate::error::VisionResult;
use crate::frame::Frame;
use crate::EPS;

/// Posture subset of the per-frame metrics. Every field is independently
/// absent/false when no body was detected — facial metrics are unaffected.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostureMetrics {
    pub torso_lean_deg: Option<f64>,
    pub shoulder_level_diff: Option<f64>,
    pub hands_visible: bool,
    pub hands_near_face: bool,
    pub arms_crossed: bool,
}

/// Angle in degrees between a vector and the vertical axis (0 = upright).
///
/// Image coordinates grow downward, so an upright torso vector points in
/// negative y.
pub fn angle_to_vertical(vx: f64, vy: f64) -> f64 {
    vx.atan2(-vy).to_degrees().abs()
}

/// Distance between two points normalized by a reference length.
fn norm_dist(a: &Point2<f64>, b: &Point2<f64>, reference: f64) -> f64 {
    (a - b).norm() / (reference + EPS)
}

/// Computes the posture metrics for one frame.
pub struct PostureGeometryExtractor {
    config: AnalysisConfig,
}

impl PostureGeometryExtractor {
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    /// Extract posture metrics. A missing body detection yields the default
    /// (all-absent) metrics, never an error.
    pub fn extract(
        &self,
        frame: &Frame,
        face_box: &BoundingBox,
        detectors: &DetectorSet,
    ) -> VisionResult<PostureMetrics> {
        match detectors.pose.detect_pose(frame)? {
            Some(pose) => Ok(metrics_from_landmarks(
                &pose.0,
                frame.width(),
                frame.height(),
                face_box,
                &self.config,
            )),
            None => {
                debug!("no body landmarks, posture fields absent");
                Ok(PostureMetrics::default())
            }
        }
    }
}

/// Pure posture geometry over pixel-coordinate body landmarks.
pub fn metrics_from_landmarks(
    points: &[Landmark],
    frame_width: u32,
    frame_height: u32,
    face_box: &BoundingBox,
    config: &AnalysisConfig,
) -> PostureMetrics {
    use pose_index::*;

    let point = |index: usize| -> Option<Point2<f64>> {
        points.get(index).map(|lm| Point2::new(lm.x, lm.y))
    };

    let (Some(l_sh), Some(r_sh), Some(l_hp), Some(r_hp), Some(l_wr), Some(r_wr)) = (
        point(LEFT_SHOULDER),
        point(RIGHT_SHOULDER),
        point(LEFT_HIP),
        point(RIGHT_HIP),
        point(LEFT_WRIST),
        point(RIGHT_WRIST),
    ) else {
        return PostureMetrics::default();
    };

    let mid_sh = nalgebra::center(&l_sh, &r_sh);
    let mid_hp = nalgebra::center(&l_hp, &r_hp);
    let shoulder_width = (l_sh - r_sh).norm();

    let torso = mid_sh - mid_hp;
    let torso_lean_deg = Some(angle_to_vertical(torso.x, torso.y));

    let shoulder_level_diff = Some((l_sh.y - r_sh.y).abs() / (shoulder_width + EPS));

    let w = frame_width as f64;
    let h = frame_height as f64;
    let in_frame =
        |p: &Point2<f64>| (0.0..=w).contains(&p.x) && (0.0..=h).contains(&p.y);
    let hands_visible = in_frame(&l_wr) || in_frame(&r_wr);

    let face_center = Point2::new(face_box.cx(), face_box.cy());
    let near = |wrist: &Point2<f64>| {
        norm_dist(wrist, &face_center, face_box.width) < config.hand_near_face_ratio
    };
    let hands_near_face = near(&l_wr) || near(&r_wr);

    // A true cross, not a single-arm reach: both wrists past the shoulder
    // midline AND below the higher shoulder, simultaneously.
    let higher_shoulder_y = l_sh.y.min(r_sh.y);
    let below_left = l_wr.y > higher_shoulder_y;
    let below_right = r_wr.y > higher_shoulder_y;
    let mid_x = mid_sh.x;
    let arms_crossed = (l_wr.x > mid_x && below_left) && (r_wr.x < mid_x && below_right);

    PostureMetrics {
        torso_lean_deg,
        shoulder_level_diff,
        hands_visible,
        hands_near_face,
        arms_crossed,
    }
}
