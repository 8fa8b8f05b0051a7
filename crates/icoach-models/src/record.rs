//! Per-frame metric records.

use serde::{Deserialize, Serialize};

/// Metrics computed from one analyzed frame.
///
/// Facial fields are always present: a frame is only retained when face
/// detection, mesh landmarks and the head-pose solve all succeeded. Posture
/// fields are independently nullable — a frame without a body detection
/// still contributes its facial metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRecord {
    /// Frame timestamp in seconds
    pub t: f64,
    /// Label of the segment the frame was sampled from
    pub label: String,

    // === Facial metrics ===
    /// Eye aspect ratio, averaged over both eyes
    pub ear: f64,
    /// Mouth-corner distance normalized by face width
    pub smile_idx: f64,
    /// Head yaw in degrees
    pub yaw: f64,
    /// Head pitch in degrees
    pub pitch: f64,
    /// Head roll in degrees
    pub roll: f64,
    /// Face bounding-box area as a fraction of frame area
    pub bbox_area: f64,
    /// Mean luminance of the full frame
    pub luma: f64,

    // === Posture metrics (absent when no body was detected) ===
    /// Torso lean from vertical, in degrees
    pub torso_lean_deg: Option<f64>,
    /// Shoulder height difference normalized by shoulder width
    pub shoulder_level_diff: Option<f64>,
    /// Either wrist inside frame bounds
    pub hands_visible: bool,
    /// Either wrist within the near-face radius of the face box center
    pub hands_near_face: bool,
    /// Both wrists across the shoulder midline and below the higher shoulder
    pub arms_crossed: bool,
}
