//! Aggregated summary statistics over one pipeline run.

use serde::{Deserialize, Serialize};

/// Summary statistics reduced from all retained [`MetricRecord`]s.
///
/// `frames == 0` is the defined empty state: every other field is zero and
/// the aggregation never errors on empty input.
///
/// [`MetricRecord`]: crate::record::MetricRecord
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SummaryStatistics {
    /// Count of retained per-frame records
    pub frames: usize,
    /// Median eye aspect ratio
    pub ear_median: f64,
    /// Count of frames with EAR below the blink threshold
    pub blink_count: usize,
    /// Median smile index
    pub smile_median: f64,
    /// Fraction of frames with |yaw| and |pitch| inside the eye-contact window
    pub eye_contact_pct: f64,
    /// Population standard deviation of the pooled yaw/pitch values
    pub head_movement_std: f64,
    /// Mean face bounding-box area ratio
    pub framing_avg: f64,
    /// Mean frame luminance
    pub lighting_mean: f64,
    /// Median torso lean among frames with a body detection
    pub torso_lean_median_deg: f64,
    /// Mean shoulder asymmetry among frames with a body detection
    pub shoulder_level_diff_mean: f64,
    /// Fraction of all retained frames with a visible wrist
    pub hands_visible_pct: f64,
    /// Fraction of all retained frames with a wrist near the face
    pub hands_near_face_pct: f64,
    /// Fraction of all retained frames with crossed arms
    pub arms_crossed_pct: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_empty_state() {
        let s = SummaryStatistics::default();
        assert_eq!(s.frames, 0);
        assert_eq!(s.blink_count, 0);
        assert_eq!(s.ear_median, 0.0);
        assert_eq!(s.eye_contact_pct, 0.0);
        assert_eq!(s.arms_crossed_pct, 0.0);
    }
}
