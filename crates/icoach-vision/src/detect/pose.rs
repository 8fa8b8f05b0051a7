//! Body landmarks via ONNX Runtime (33-point pose topology).
//!
//! Single-person, static-image mode: every frame is inferred independently
//! on a full-frame resize, matching the upstream landmark model's expected
//! 256x256 RGB input. A pose-presence flag below threshold reports "no
//! body" and the posture metrics for that frame stay absent.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::debug;

use super::mesh::{load_session, rgb_to_chw_tensor};
use super::{Landmark, PoseDetect, PoseLandmarks};
use crate::error::{VisionError, VisionResult};
use crate::frame::Frame;

/// Environment override for the model location.
const MODEL_ENV: &str = "ICOACH_POSE_MODEL";

/// Model paths in preference order.
const MODEL_PATHS: &[&str] = &[
    "/app/models/pose/pose_landmark_full.onnx",
    "/app/models/pose_landmark_full.onnx",
    "./models/pose/pose_landmark_full.onnx",
];

/// Model input edge length.
const INPUT_SIZE: u32 = 256;

/// Landmark count of the pose topology.
const NUM_LANDMARKS: usize = 33;

/// Values per landmark in the model output: x, y, z, visibility, presence.
const VALUES_PER_LANDMARK: usize = 5;

/// Pose-presence score below this means no usable body detection.
const PRESENCE_THRESHOLD: f32 = 0.5;

/// Exported graph output names (landmarks tensor, presence flag).
const LANDMARKS_OUTPUT: &str = "Identity";
const FLAG_OUTPUT: &str = "Identity_1";

fn find_model_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var(MODEL_ENV) {
        let path = PathBuf::from(path);
        if path.exists() {
            return Some(path);
        }
    }
    MODEL_PATHS
        .iter()
        .map(PathBuf::from)
        .find(|p| p.exists())
}

/// ONNX Runtime-backed pose landmark detector.
pub struct OrtPoseDetector {
    session: Mutex<ort::session::Session>,
}

impl OrtPoseDetector {
    /// Load from the default model search paths.
    pub fn new_default() -> VisionResult<Self> {
        let model_path = find_model_path().ok_or_else(|| {
            VisionError::model_not_found(
                "pose_landmark_full.onnx (set ICOACH_POSE_MODEL or place under /app/models/pose/)",
            )
        })?;
        Self::new_with_model(&model_path)
    }

    /// Load from an explicit model path.
    pub fn new_with_model(model_path: &Path) -> VisionResult<Self> {
        let session = load_session(model_path)?;
        debug!(model = %model_path.display(), "pose session loaded");
        Ok(Self {
            session: Mutex::new(session),
        })
    }
}

impl PoseDetect for OrtPoseDetector {
    fn detect_pose(&self, frame: &Frame) -> VisionResult<Option<PoseLandmarks>> {
        let tensor = rgb_to_chw_tensor(frame.pixels(), INPUT_SIZE, false)?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| VisionError::detection_failed("ORT session poisoned"))?;

        let outputs = session
            .run(ort::inputs![tensor])
            .map_err(|e| VisionError::detection_failed(format!("ORT run failed: {e}")))?;

        // Presence flag gates the whole detection.
        if let Some(flag) = outputs.get(FLAG_OUTPUT) {
            let (_, flag_data) = flag
                .try_extract_tensor::<f32>()
                .map_err(|e| VisionError::detection_failed(format!("ORT extract: {e}")))?;
            if flag_data.first().copied().unwrap_or(0.0) < PRESENCE_THRESHOLD {
                debug!("no body detected");
                return Ok(None);
            }
        }

        let output = outputs
            .get(LANDMARKS_OUTPUT)
            .ok_or_else(|| VisionError::detection_failed("ORT returned no pose output"))?;

        let (_, data) = output
            .try_extract_tensor::<f32>()
            .map_err(|e| VisionError::detection_failed(format!("ORT extract: {e}")))?;

        if data.len() < NUM_LANDMARKS * VALUES_PER_LANDMARK {
            return Err(VisionError::detection_failed(format!(
                "unexpected pose output length: {}",
                data.len()
            )));
        }

        // Model coordinates are in input pixels; scale to frame pixels.
        let sx = frame.width() as f64 / INPUT_SIZE as f64;
        let sy = frame.height() as f64 / INPUT_SIZE as f64;

        let landmarks = (0..NUM_LANDMARKS)
            .map(|i| {
                let base = i * VALUES_PER_LANDMARK;
                Landmark {
                    x: data[base] as f64 * sx,
                    y: data[base + 1] as f64 * sy,
                    z: data[base + 2] as f64,
                }
            })
            .collect();

        Ok(Some(PoseLandmarks(landmarks)))
    }
}
