//! Caller-supplied analysis options.

use serde::{Deserialize, Serialize};
use validator::Validate;

fn default_fps() -> u32 {
    2
}

/// Options for one analysis run.
///
/// Ranges mirror the service contract: sampling rate 1–10 fps, optional
/// segment cap 1–50. Validate with [`validator::Validate::validate`] before
/// handing the options to the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AnalyzeOptions {
    /// Target frame sampling rate inside each segment
    #[serde(default = "default_fps")]
    #[validate(range(min = 1, max = 10))]
    pub fps: u32,

    /// Cap on the number of segments analyzed, applied after selection
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 1, max = 50))]
    pub max_segments: Option<u32>,
}

impl Default for AnalyzeOptions {
    fn default() -> Self {
        Self {
            fps: default_fps(),
            max_segments: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[test]
    fn test_defaults_are_valid() {
        assert!(AnalyzeOptions::default().validate().is_ok());
    }

    #[test]
    fn test_fps_range_enforced() {
        let mut opts = AnalyzeOptions::default();
        opts.fps = 0;
        assert!(opts.validate().is_err());
        opts.fps = 11;
        assert!(opts.validate().is_err());
        opts.fps = 10;
        assert!(opts.validate().is_ok());
    }

    #[test]
    fn test_max_segments_range_enforced() {
        let mut opts = AnalyzeOptions::default();
        opts.max_segments = Some(0);
        assert!(opts.validate().is_err());
        opts.max_segments = Some(51);
        assert!(opts.validate().is_err());
        opts.max_segments = Some(50);
        assert!(opts.validate().is_ok());
    }

    #[test]
    fn test_fps_defaults_when_missing() {
        let opts: AnalyzeOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(opts.fps, 2);
        assert!(opts.max_segments.is_none());
    }
}
