//! Labeled time intervals selected for detailed frame analysis.

use serde::{Deserialize, Serialize};

/// A labeled time interval of the source video.
///
/// Segments are produced by the segment selector from the external
/// video-understanding analysis and are immutable afterwards: the frame
/// sampler consumes them and the orchestrator propagates them into the
/// result timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// Start time in seconds (>= 0)
    pub start: f64,
    /// End time in seconds (> start)
    pub end: f64,
    /// `"shot"` or `"action:<label>"`
    pub label: String,
}

impl Segment {
    /// Create a new segment.
    pub fn new(start: f64, end: f64, label: impl Into<String>) -> Self {
        Self {
            start,
            end,
            label: label.into(),
        }
    }

    /// Segment duration in seconds.
    #[inline]
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration() {
        let seg = Segment::new(2.5, 7.0, "shot");
        assert!((seg.duration() - 4.5).abs() < 1e-9);
    }

    #[test]
    fn test_serde_round_trip() {
        let seg = Segment::new(0.0, 3.0, "action:point");
        let json = serde_json::to_string(&seg).unwrap();
        let back: Segment = serde_json::from_str(&json).unwrap();
        assert_eq!(seg, back);
    }
}
