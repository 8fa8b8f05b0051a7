//! Detector capability interfaces and process-wide detector state.
//!
//! The landmark detectors are modeled as capability traits rather than
//! concrete library bindings: the geometry extractors only see
//! `detect_face` / `detect_mesh` / `detect_pose`, so any backend can be
//! substituted without touching the metric logic.
//!
//! The default backends hold ONNX sessions (and an OpenCV detector) behind
//! mutexes: one instance of each model per process, reused across every
//! frame, never constructed per frame. They are NOT safe for concurrent
//! reentrant use — the mutexes serialize callers; a parallel deployment
//! should build one [`DetectorSet`] per worker instead.

use std::sync::{Arc, Mutex};

use icoach_models::BoundingBox;
use tracing::info;

use crate::error::{VisionError, VisionResult};
use crate::frame::Frame;

pub mod mesh;
pub mod pose;
#[cfg(feature = "opencv")]
pub mod yunet;

/// One landmark in frame pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Landmark {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// A detected face: bounding box plus detector confidence.
#[derive(Debug, Clone, Copy)]
pub struct FaceDetection {
    pub bbox: BoundingBox,
    pub confidence: f64,
}

/// Dense facial landmarks (468-point refined mesh topology).
#[derive(Debug, Clone)]
pub struct MeshLandmarks(pub Vec<Landmark>);

/// Body landmarks (33-point pose topology).
#[derive(Debug, Clone)]
pub struct PoseLandmarks(pub Vec<Landmark>);

/// Face detection capability. `None` means no face in the frame.
pub trait FaceDetect: Send + Sync {
    fn detect_face(&self, frame: &Frame) -> VisionResult<Option<FaceDetection>>;
}

/// Dense facial landmark capability over a detected face region.
pub trait MeshDetect: Send + Sync {
    fn detect_mesh(&self, frame: &Frame, roi: &BoundingBox) -> VisionResult<Option<MeshLandmarks>>;
}

/// Single-person body landmark capability (static-image mode).
pub trait PoseDetect: Send + Sync {
    fn detect_pose(&self, frame: &Frame) -> VisionResult<Option<PoseLandmarks>>;
}

/// Mesh landmark indices used by the facial geometry.
pub mod mesh_index {
    /// Per-eye EAR points: vertical pair then horizontal pair.
    pub const LEFT_EYE: [usize; 4] = [159, 145, 33, 133];
    pub const RIGHT_EYE: [usize; 4] = [386, 374, 263, 362];
    pub const NOSE_TIP: usize = 1;
    pub const EYE_OUTER: [usize; 2] = [33, 263];
    pub const MOUTH_CORNERS: [usize; 2] = [61, 291];
}

/// Pose landmark indices used by the posture geometry.
pub mod pose_index {
    pub const LEFT_SHOULDER: usize = 11;
    pub const RIGHT_SHOULDER: usize = 12;
    pub const LEFT_WRIST: usize = 15;
    pub const RIGHT_WRIST: usize = 16;
    pub const LEFT_HIP: usize = 23;
    pub const RIGHT_HIP: usize = 24;
}

/// The three detector capabilities used by one pipeline invocation.
pub struct DetectorSet {
    pub face: Box<dyn FaceDetect>,
    pub mesh: Box<dyn MeshDetect>,
    pub pose: Box<dyn PoseDetect>,
}

/// Process-wide detector instances, lazily initialized.
static GLOBAL: Mutex<Option<Arc<DetectorSet>>> = Mutex::new(None);

impl DetectorSet {
    /// Build a set from explicit backends (tests, per-worker instances).
    pub fn new(
        face: Box<dyn FaceDetect>,
        mesh: Box<dyn MeshDetect>,
        pose: Box<dyn PoseDetect>,
    ) -> Self {
        Self { face, mesh, pose }
    }

    /// The process-wide detector set, constructing the default backends on
    /// first use. Model loading failures surface here, not at first frame.
    pub fn global() -> VisionResult<Arc<DetectorSet>> {
        let mut slot = GLOBAL
            .lock()
            .map_err(|_| VisionError::internal("detector registry poisoned"))?;

        if let Some(existing) = slot.as_ref() {
            return Ok(Arc::clone(existing));
        }

        let set = Arc::new(Self::default_backends()?);
        info!("detector set initialized");
        *slot = Some(Arc::clone(&set));
        Ok(set)
    }

    /// Drop the process-wide instances. The next [`global`](Self::global)
    /// call re-initializes them.
    pub fn teardown() {
        if let Ok(mut slot) = GLOBAL.lock() {
            if slot.take().is_some() {
                info!("detector set torn down");
            }
        }
    }

    #[cfg(feature = "opencv")]
    fn default_backends() -> VisionResult<Self> {
        Ok(Self {
            face: Box::new(yunet::YuNetFaceDetector::new_default()?),
            mesh: Box::new(mesh::OrtFaceMesh::new_default()?),
            pose: Box::new(pose::OrtPoseDetector::new_default()?),
        })
    }

    #[cfg(not(feature = "opencv"))]
    fn default_backends() -> VisionResult<Self> {
        Err(VisionError::detection_failed(
            "face detection requires the opencv feature; supply a custom DetectorSet",
        ))
    }
}
