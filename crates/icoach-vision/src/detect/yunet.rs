//! YuNet face detection backend (OpenCV `FaceDetectorYN`).
//!
//! YuNet is a lightweight CNN face detector exposed through OpenCV's
//! objdetect module. This backend reports the single highest-confidence
//! face per frame — the pipeline analyzes one interviewee, and multi-person
//! tracking is out of scope.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use icoach_models::BoundingBox;
use opencv::core::{Mat, Size};
use opencv::objdetect::FaceDetectorYN;
use opencv::prelude::{FaceDetectorYNTrait, MatTraitConst};
use tracing::{debug, info};

use super::{FaceDetect, FaceDetection};
use crate::error::{VisionError, VisionResult};
use crate::frame::Frame;

/// Environment override for the model location.
const MODEL_ENV: &str = "ICOACH_YUNET_MODEL";

/// Model paths in preference order.
const MODEL_PATHS: &[&str] = &[
    "/app/models/face_detection/face_detection_yunet_2023mar.onnx",
    "/app/models/face_detection_yunet_2023mar.onnx",
    "./models/face_detection/face_detection_yunet_2023mar.onnx",
];

/// Default minimum detection confidence.
const DEFAULT_SCORE_THRESHOLD: f32 = 0.6;

/// Non-maximum-suppression threshold.
const NMS_THRESHOLD: f32 = 0.3;

/// Candidate faces kept before scoring.
const TOP_K: i32 = 10;

/// Columns in a YuNet output row:
/// [x, y, w, h, 5 x (landmark x, landmark y), score]
const OUTPUT_COLS: i32 = 15;

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

/// OpenCV YuNet face detector.
///
/// The underlying `FaceDetectorYN` is stateful and not reentrant; the mutex
/// serializes callers. One instance per process (or per worker).
pub struct YuNetFaceDetector {
    detector: Mutex<opencv::core::Ptr<FaceDetectorYN>>,
    score_threshold: f32,
}

impl YuNetFaceDetector {
    /// Create a detector from the default model search paths.
    pub fn new_default() -> VisionResult<Self> {
        let model_path = find_model_path().ok_or_else(|| {
            VisionError::model_not_found(
                "face_detection_yunet_2023mar.onnx (set ICOACH_YUNET_MODEL or place under /app/models/face_detection/)",
            )
        })?;
        Self::new_with_model(&model_path, DEFAULT_SCORE_THRESHOLD)
    }

    /// Create a detector with an explicit model path and score threshold.
    pub fn new_with_model(model_path: &Path, score_threshold: f32) -> VisionResult<Self> {
        let metadata = std::fs::metadata(model_path)
            .map_err(|e| VisionError::detection_failed(format!("cannot read YuNet model: {e}")))?;
        if metadata.len() < 50_000 {
            return Err(VisionError::detection_failed(format!(
                "YuNet model file appears corrupted ({} bytes)",
                metadata.len()
            )));
        }

        let model_str = model_path
            .to_str()
            .ok_or_else(|| VisionError::model_not_found(model_path.display().to_string()))?;

        // Input size is re-set per frame; the creation size is a placeholder.
        let detector = FaceDetectorYN::create(
            model_str,
            "",
            Size::new(320, 320),
            score_threshold,
            NMS_THRESHOLD,
            TOP_K,
            0,
            0,
        )
        .map_err(|e| VisionError::detection_failed(format!("YuNet create failed: {e}")))?;

        info!(model = %model_path.display(), "YuNet detector initialized");

        Ok(Self {
            detector: Mutex::new(detector),
            score_threshold,
        })
    }

    /// Parse the detection matrix and keep the highest-confidence face.
    fn best_face(
        &self,
        faces: &Mat,
        frame_width: u32,
        frame_height: u32,
    ) -> VisionResult<Option<FaceDetection>> {
        let rows = faces.rows();
        if rows <= 0 {
            return Ok(None);
        }
        if faces.cols() < OUTPUT_COLS {
            return Err(VisionError::detection_failed(format!(
                "unexpected YuNet output: {} columns",
                faces.cols()
            )));
        }

        let mut best: Option<FaceDetection> = None;
        for i in 0..rows {
            let at = |col: i32| -> VisionResult<f64> {
                faces
                    .at_2d::<f32>(i, col)
                    .map(|v| *v as f64)
                    .map_err(|e| VisionError::detection_failed(format!("YuNet output read: {e}")))
            };

            let score = at(14)?;
            if score < self.score_threshold as f64 {
                continue;
            }

            let bbox = BoundingBox::new(at(0)?, at(1)?, at(2)?, at(3)?)
                .clamp(frame_width, frame_height);
            if bbox.width <= 0.0 || bbox.height <= 0.0 {
                continue;
            }

            if best.map_or(true, |b| score > b.confidence) {
                best = Some(FaceDetection {
                    bbox,
                    confidence: score,
                });
            }
        }

        Ok(best)
    }
}

impl FaceDetect for YuNetFaceDetector {
    fn detect_face(&self, frame: &Frame) -> VisionResult<Option<FaceDetection>> {
        let mat = frame.to_bgr_mat()?;

        let mut detector = self
            .detector
            .lock()
            .map_err(|_| VisionError::detection_failed("YuNet detector poisoned"))?;

        detector
            .set_input_size(Size::new(frame.width() as i32, frame.height() as i32))
            .map_err(|e| VisionError::detection_failed(format!("YuNet input size: {e}")))?;

        let mut faces = Mat::default();
        detector
            .detect(&mat, &mut faces)
            .map_err(|e| VisionError::detection_failed(format!("YuNet detect failed: {e}")))?;

        let best = self.best_face(&faces, frame.width(), frame.height())?;
        if best.is_none() {
            debug!("no face detected");
        }
        Ok(best)
    }
}
