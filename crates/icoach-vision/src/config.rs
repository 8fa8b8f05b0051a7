//! Configuration for the analysis pipeline.
//!
//! The thresholds are empirically chosen calibration constants carried over
//! from field use. They are deliberately exposed as named fields instead of
//! inline literals so deployments can override them without code changes.

use serde::{Deserialize, Serialize};

/// Tunable parameters for segment selection, metric extraction and
/// aggregation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    // === Segment selection ===
    /// Minimum eligible segment duration in seconds (default: 2.0)
    pub min_segment_len_s: f64,

    /// Hard cap on selected segments, before any caller cap (default: 20)
    pub max_selected_segments: usize,

    // === Blink / eye contact ===
    /// EAR below this counts as a blink (default: 0.18)
    pub blink_ear_threshold: f64,

    /// Eye contact requires |yaw| within this many degrees (default: 10.0)
    pub eye_contact_max_yaw_deg: f64,

    /// Eye contact requires |pitch| within this many degrees (default: 10.0)
    pub eye_contact_max_pitch_deg: f64,

    // === Gestures ===
    /// Wrist-to-face-center distance, in face widths, below which a hand
    /// counts as near the face (default: 0.6)
    pub hand_near_face_ratio: f64,

    // === Detection ===
    /// Minimum confidence for a face detection (default: 0.6)
    pub min_face_confidence: f64,

    // === Head pose solver ===
    /// Iteration cap for the PnP solve (default: 50)
    pub pnp_max_iterations: usize,

    /// Step-norm threshold that counts as convergence (default: 1e-7)
    pub pnp_convergence_eps: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            min_segment_len_s: 2.0,
            max_selected_segments: 20,
            blink_ear_threshold: 0.18,
            eye_contact_max_yaw_deg: 10.0,
            eye_contact_max_pitch_deg: 10.0,
            hand_near_face_ratio: 0.6,
            min_face_confidence: 0.6,
            pnp_max_iterations: 50,
            pnp_convergence_eps: 1e-7,
        }
    }
}
