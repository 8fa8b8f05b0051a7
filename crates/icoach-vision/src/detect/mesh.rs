//! Dense face mesh landmarks via ONNX Runtime.
//!
//! Runs the 468-point refined face mesh model on a square crop around the
//! detected face box. Coordinates are mapped back to frame space with a
//! center-based transform so clamped crops do not drift.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use icoach_models::BoundingBox;
use image::imageops::{self, FilterType};
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::{Tensor, Value};
use tracing::debug;

use super::{Landmark, MeshDetect, MeshLandmarks};
use crate::error::{VisionError, VisionResult};
use crate::frame::Frame;

/// Environment override for the model location.
const MODEL_ENV: &str = "ICOACH_FACE_MESH_MODEL";

/// Model paths in preference order.
const MODEL_PATHS: &[&str] = &[
    "/app/models/face_mesh/face_landmark_with_attention.onnx",
    "/app/models/face_landmark_with_attention.onnx",
    "./models/face_mesh/face_landmark_with_attention.onnx",
];

/// Model input edge length.
const INPUT_SIZE: u32 = 192;

/// Crop expansion around the face box before squaring.
const CROP_PAD_RATIO: f64 = 0.25;

/// Smallest usable crop edge, in pixels.
const MIN_CROP_SIZE: f64 = 8.0;

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

/// Square pixel region used for mesh inference.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropRect {
    pub x: u32,
    pub y: u32,
    pub size: u32,
}

/// Expand the face box, square it and clamp to the frame.
///
/// Returns `None` when the clamped region is too small to be usable.
pub fn square_crop(
    roi: &BoundingBox,
    frame_width: u32,
    frame_height: u32,
    pad_ratio: f64,
) -> Option<CropRect> {
    let size = roi.width.max(roi.height) * (1.0 + pad_ratio);

    let mut x = roi.cx() - size / 2.0;
    let mut y = roi.cy() - size / 2.0;
    let mut s = size;

    let fw = frame_width as f64;
    let fh = frame_height as f64;

    if x < 0.0 {
        s += x;
        x = 0.0;
    }
    if y < 0.0 {
        s += y;
        y = 0.0;
    }
    if x + s > fw {
        s = fw - x;
    }
    if y + s > fh {
        s = fh - y;
    }

    if s < MIN_CROP_SIZE {
        return None;
    }

    Some(CropRect {
        x: x.round() as u32,
        y: y.round() as u32,
        size: s.round() as u32,
    })
}

/// Center-based mapping from normalized crop coordinates to frame pixels.
#[inline]
pub fn map_normalized_to_frame(nx: f64, ny: f64, crop: &CropRect) -> (f64, f64) {
    let center_x = crop.x as f64 + crop.size as f64 / 2.0;
    let center_y = crop.y as f64 + crop.size as f64 / 2.0;
    let edge = crop.size as f64;
    (center_x + (nx - 0.5) * edge, center_y + (ny - 0.5) * edge)
}

/// ONNX Runtime-backed face mesh detector.
pub struct OrtFaceMesh {
    session: Mutex<Session>,
}

impl OrtFaceMesh {
    /// Load from the default model search paths.
    pub fn new_default() -> VisionResult<Self> {
        let model_path = find_model_path().ok_or_else(|| {
            VisionError::model_not_found(
                "face_landmark_with_attention.onnx (set ICOACH_FACE_MESH_MODEL or place under /app/models/face_mesh/)",
            )
        })?;
        Self::new_with_model(&model_path)
    }

    /// Load from an explicit model path.
    pub fn new_with_model(model_path: &Path) -> VisionResult<Self> {
        let session = load_session(model_path)?;
        debug!(model = %model_path.display(), "face mesh session loaded");
        Ok(Self {
            session: Mutex::new(session),
        })
    }
}

/// Build an ORT session from a model file.
pub(crate) fn load_session(model_path: &Path) -> VisionResult<Session> {
    if !model_path.exists() {
        return Err(VisionError::model_not_found(
            model_path.display().to_string(),
        ));
    }

    let model_bytes = std::fs::read(model_path)
        .map_err(|e| VisionError::detection_failed(format!("ORT read model file: {e}")))?;

    Session::builder()
        .map_err(|e| VisionError::detection_failed(format!("ORT session builder: {e}")))?
        .with_optimization_level(GraphOptimizationLevel::Level3)
        .map_err(|e| VisionError::detection_failed(format!("ORT opt level: {e}")))?
        .commit_from_memory(model_bytes.as_slice())
        .map_err(|e| VisionError::detection_failed(format!("ORT load model: {e}")))
}

/// Resize an RGB crop and pack it as a `(1,3,H,W)` tensor in `[-1,1]`.
pub(crate) fn rgb_to_chw_tensor(
    image: &image::RgbImage,
    edge: u32,
    zero_centered: bool,
) -> VisionResult<Value> {
    let resized = imageops::resize(image, edge, edge, FilterType::Triangle);

    let plane = (edge * edge) as usize;
    let mut chw = vec![0f32; plane * 3];
    for (x, y, pixel) in resized.enumerate_pixels() {
        let offset = (y * edge + x) as usize;
        for c in 0..3 {
            let v = pixel[c] as f32 / 255.0;
            chw[c * plane + offset] = if zero_centered { v * 2.0 - 1.0 } else { v };
        }
    }

    let shape = vec![1usize, 3, edge as usize, edge as usize];
    Tensor::from_array((shape, chw.into_boxed_slice()))
        .map(Value::from)
        .map_err(|e| VisionError::detection_failed(format!("ORT tensor: {e}")))
}

impl MeshDetect for OrtFaceMesh {
    fn detect_mesh(
        &self,
        frame: &Frame,
        roi: &BoundingBox,
    ) -> VisionResult<Option<MeshLandmarks>> {
        let Some(crop) = square_crop(roi, frame.width(), frame.height(), CROP_PAD_RATIO) else {
            debug!("face box too small for mesh inference");
            return Ok(None);
        };

        let region =
            imageops::crop_imm(frame.pixels(), crop.x, crop.y, crop.size, crop.size).to_image();
        let tensor = rgb_to_chw_tensor(&region, INPUT_SIZE, true)?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| VisionError::detection_failed("ORT session poisoned"))?;

        let outputs = session
            .run(ort::inputs![tensor])
            .map_err(|e| VisionError::detection_failed(format!("ORT run failed: {e}")))?;

        let output = outputs
            .get("output")
            .ok_or_else(|| VisionError::detection_failed("ORT returned no outputs"))?;

        let (shape, data) = output
            .try_extract_tensor::<f32>()
            .map_err(|e| VisionError::detection_failed(format!("ORT extract: {e}")))?;

        // Accept (1,468,3) or (468,3).
        let (points, stride) = match shape.len() {
            3 if shape[0] == 1 => (shape[1] as usize, shape[2] as usize),
            2 => (shape[0] as usize, shape[1] as usize),
            _ => {
                return Err(VisionError::detection_failed(format!(
                    "unexpected face mesh output shape: {shape:?}"
                )))
            }
        };

        if stride < 3 || data.len() < points * stride {
            return Err(VisionError::detection_failed(
                "face mesh output missing Z channel",
            ));
        }

        let mut landmarks = Vec::with_capacity(points);
        for i in 0..points {
            let base = i * stride;
            let (x, y) = map_normalized_to_frame(data[base] as f64, data[base + 1] as f64, &crop);
            landmarks.push(Landmark {
                x,
                y,
                z: data[base + 2] as f64,
            });
        }

        Ok(Some(MeshLandmarks(landmarks)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_square_crop_expands_and_squares() {
        let roi = BoundingBox::new(100.0, 100.0, 80.0, 100.0);
        let crop = square_crop(&roi, 640, 480, 0.25).unwrap();
        // max(80,100) * 1.25 = 125, centered on (140, 150)
        assert_eq!(crop.size, 125);
        assert_eq!(crop.x, 78);
        assert_eq!(crop.y, 88);
    }

    #[test]
    fn test_square_crop_clamps_at_edges() {
        let roi = BoundingBox::new(0.0, 0.0, 100.0, 100.0);
        let crop = square_crop(&roi, 640, 480, 0.25).unwrap();
        assert_eq!(crop.x, 0);
        assert_eq!(crop.y, 0);
        assert!(crop.size < 125);
    }

    #[test]
    fn test_square_crop_rejects_tiny_rois() {
        let roi = BoundingBox::new(5.0, 5.0, 2.0, 2.0);
        assert!(square_crop(&roi, 640, 480, 0.25).is_none());
    }

    #[test]
    fn test_center_mapping_round_trips_center() {
        let crop = CropRect {
            x: 100,
            y: 50,
            size: 200,
        };
        let (x, y) = map_normalized_to_frame(0.5, 0.5, &crop);
        assert_eq!(x, 200.0);
        assert_eq!(y, 150.0);

        let (x, y) = map_normalized_to_frame(0.0, 1.0, &crop);
        assert_eq!(x, 100.0);
        assert_eq!(y, 250.0);
    }
}
