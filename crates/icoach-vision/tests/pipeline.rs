//! End-to-end tests of the sampling + analysis + aggregation chain using
//! synthetic frame sources and stub detector backends. No video decoding
//! or model inference involved, so every run is fully deterministic.

use std::sync::atomic::{AtomicUsize, Ordering};

use icoach_models::{BoundingBox, Segment, SummaryStatistics};
use icoach_vision::detect::{
    mesh_index, pose_index, DetectorSet, FaceDetect, FaceDetection, Landmark, MeshDetect,
    MeshLandmarks, PoseDetect, PoseLandmarks,
};
use icoach_vision::headpose::{CameraIntrinsics, FACE_MODEL_POINTS};
use icoach_vision::{analyze_segments, AnalysisConfig, Frame, FrameSource, VisionResult};

const WIDTH: u32 = 640;
const HEIGHT: u32 = 480;

// === Synthetic frame source ===

struct SyntheticSource {
    fps: f64,
    next_frame: u64,
    grabbed: bool,
}

impl SyntheticSource {
    fn new() -> Self {
        Self {
            fps: 30.0,
            next_frame: 0,
            grabbed: false,
        }
    }
}

impl FrameSource for SyntheticSource {
    fn native_fps(&self) -> Option<f64> {
        Some(self.fps)
    }

    fn seek_seconds(&mut self, seconds: f64) -> VisionResult<()> {
        self.next_frame = (seconds * self.fps).round() as u64;
        self.grabbed = false;
        Ok(())
    }

    fn position_seconds(&self) -> f64 {
        self.next_frame as f64 / self.fps
    }

    fn grab(&mut self) -> VisionResult<bool> {
        self.next_frame += 1;
        self.grabbed = true;
        Ok(true)
    }

    fn frame_index(&self) -> u64 {
        self.next_frame
    }

    fn retrieve(&mut self) -> VisionResult<Option<Frame>> {
        if !self.grabbed {
            return Ok(None);
        }
        let frame = Frame::from_raw(WIDTH, HEIGHT, vec![0u8; (WIDTH * HEIGHT * 3) as usize])
            .expect("synthetic frame");
        Ok(Some(frame))
    }
}

// === Stub detector backends ===

/// Reports a fixed face box, optionally missing every `miss_every`-th call.
struct StubFace {
    calls: AtomicUsize,
    miss_every: Option<usize>,
}

impl StubFace {
    fn always() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            miss_every: None,
        }
    }

    fn missing_every(n: usize) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            miss_every: Some(n),
        }
    }
}

impl FaceDetect for StubFace {
    fn detect_face(&self, _frame: &Frame) -> VisionResult<Option<FaceDetection>> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(n) = self.miss_every {
            if call % n == 0 {
                return Ok(None);
            }
        }
        Ok(Some(FaceDetection {
            bbox: BoundingBox::new(280.0, 60.0, 80.0, 80.0),
            confidence: 0.9,
        }))
    }
}

/// Never finds a face.
struct NoFace;

impl FaceDetect for NoFace {
    fn detect_face(&self, _frame: &Frame) -> VisionResult<Option<FaceDetection>> {
        Ok(None)
    }
}

/// Synthesizes a frontal face mesh: the five head-pose landmarks are exact
/// projections of the canonical model at identity rotation, so the PnP
/// solve recovers ~zero angles.
struct StubMesh {
    blink: bool,
}

impl StubMesh {
    fn frontal() -> Self {
        Self { blink: false }
    }

    fn blinking() -> Self {
        Self { blink: true }
    }

    fn project(model: [f64; 3]) -> (f64, f64) {
        let intr = CameraIntrinsics::approximate(WIDTH, HEIGHT);
        let depth = 400.0;
        let z = model[2] + depth;
        (
            intr.fx * model[0] / z + intr.cx,
            intr.fy * model[1] / z + intr.cy,
        )
    }
}

impl MeshDetect for StubMesh {
    fn detect_mesh(
        &self,
        _frame: &Frame,
        _roi: &BoundingBox,
    ) -> VisionResult<Option<MeshLandmarks>> {
        let mut points = vec![
            Landmark {
                x: 0.0,
                y: 0.0,
                z: 0.0
            };
            468
        ];
        let mut set = |idx: usize, (x, y): (f64, f64)| {
            points[idx] = Landmark { x, y, z: 0.0 };
        };

        set(mesh_index::NOSE_TIP, Self::project(FACE_MODEL_POINTS[0]));
        set(mesh_index::EYE_OUTER[0], Self::project(FACE_MODEL_POINTS[1]));
        set(mesh_index::EYE_OUTER[1], Self::project(FACE_MODEL_POINTS[2]));
        set(
            mesh_index::MOUTH_CORNERS[0],
            Self::project(FACE_MODEL_POINTS[3]),
        );
        set(
            mesh_index::MOUTH_CORNERS[1],
            Self::project(FACE_MODEL_POINTS[4]),
        );

        // Eye corners around the projected outer corners; vertical opening
        // collapses when blinking.
        let opening = if self.blink { 1.0 } else { 10.0 };
        set(mesh_index::LEFT_EYE[0], (280.0, 188.0 - opening / 2.0));
        set(mesh_index::LEFT_EYE[1], (280.0, 188.0 + opening / 2.0));
        set(mesh_index::LEFT_EYE[3], (300.0, 188.0));
        set(mesh_index::RIGHT_EYE[0], (360.0, 188.0 - opening / 2.0));
        set(mesh_index::RIGHT_EYE[1], (360.0, 188.0 + opening / 2.0));
        set(mesh_index::RIGHT_EYE[3], (340.0, 188.0));
        // LEFT_EYE[2] (index 33) and RIGHT_EYE[2] (index 263) are the outer
        // corners already set from the projection.

        Ok(Some(MeshLandmarks(points)))
    }
}

/// Crossed-arms skeleton, or no body at all.
struct StubPose {
    present: bool,
}

impl PoseDetect for StubPose {
    fn detect_pose(&self, _frame: &Frame) -> VisionResult<Option<PoseLandmarks>> {
        if !self.present {
            return Ok(None);
        }
        let mut points = vec![
            Landmark {
                x: 0.0,
                y: 0.0,
                z: 0.0
            };
            33
        ];
        let mut set = |idx: usize, x: f64, y: f64| {
            points[idx] = Landmark { x, y, z: 0.0 };
        };
        set(pose_index::LEFT_SHOULDER, 360.0, 200.0);
        set(pose_index::RIGHT_SHOULDER, 280.0, 200.0);
        set(pose_index::LEFT_HIP, 350.0, 400.0);
        set(pose_index::RIGHT_HIP, 290.0, 400.0);
        // Wrists crossed past the midline, below the shoulders.
        set(pose_index::LEFT_WRIST, 360.0, 280.0);
        set(pose_index::RIGHT_WRIST, 280.0, 280.0);
        Ok(Some(PoseLandmarks(points)))
    }
}

fn detectors(face: Box<dyn FaceDetect>, mesh: StubMesh, pose_present: bool) -> DetectorSet {
    DetectorSet::new(
        face,
        Box::new(mesh),
        Box::new(StubPose {
            present: pose_present,
        }),
    )
}

fn segments() -> Vec<Segment> {
    vec![
        Segment::new(0.0, 2.0, "shot"),
        Segment::new(5.0, 7.0, "action:point"),
    ]
}

fn run(face: Box<dyn FaceDetect>, mesh: StubMesh, pose_present: bool) -> SummaryStatistics {
    let config = AnalysisConfig::default();
    let set = detectors(face, mesh, pose_present);
    let (records, _) = analyze_segments(SyntheticSource::new(), &segments(), 2, &set, &config);
    icoach_vision::aggregate_records(&records, &config)
}

#[test]
fn test_all_frames_usable() {
    let config = AnalysisConfig::default();
    let set = detectors(Box::new(StubFace::always()), StubMesh::frontal(), true);
    let (records, timeline) =
        analyze_segments(SyntheticSource::new(), &segments(), 2, &set, &config);

    // Two 2-second segments at 30 fps, stride 15: 4 frames each.
    assert_eq!(records.len(), 8);
    assert_eq!(timeline.len(), 2);
    assert!(records.iter().take(4).all(|r| r.label == "shot"));
    assert!(records.iter().skip(4).all(|r| r.label == "action:point"));

    let summary = icoach_vision::aggregate_records(&records, &config);
    assert_eq!(summary.frames, 8);
    // Frontal face: every frame inside the eye-contact window, no blinks.
    assert_eq!(summary.eye_contact_pct, 1.0);
    assert_eq!(summary.blink_count, 0);
    // Crossed-arms skeleton on every frame.
    assert_eq!(summary.arms_crossed_pct, 1.0);
    assert_eq!(summary.hands_visible_pct, 1.0);
    assert!(summary.torso_lean_median_deg.abs() < 1e-9);
}

#[test]
fn test_blinking_frames_counted() {
    let summary = run(Box::new(StubFace::always()), StubMesh::blinking(), true);
    assert_eq!(summary.frames, 8);
    // Opening 1px over ~52px width: EAR well below the 0.18 threshold.
    assert_eq!(summary.blink_count, 8);
}

#[test]
fn test_missed_faces_shrink_sample_set_not_timeline() {
    let config = AnalysisConfig::default();
    let set = detectors(Box::new(StubFace::missing_every(2)), StubMesh::frontal(), true);
    let (records, timeline) =
        analyze_segments(SyntheticSource::new(), &segments(), 2, &set, &config);

    // Every other frame dropped; both segments still in the timeline.
    assert_eq!(records.len(), 4);
    assert_eq!(timeline.len(), 2);
}

#[test]
fn test_no_faces_at_all_is_zero_state() {
    let summary = run(Box::new(NoFace), StubMesh::frontal(), true);
    assert_eq!(summary, SummaryStatistics::default());
}

#[test]
fn test_absent_body_keeps_facial_metrics() {
    let summary = run(Box::new(StubFace::always()), StubMesh::frontal(), false);
    assert_eq!(summary.frames, 8);
    // Posture sources empty: medians/means default, percentages count the
    // absent data as false.
    assert_eq!(summary.torso_lean_median_deg, 0.0);
    assert_eq!(summary.shoulder_level_diff_mean, 0.0);
    assert_eq!(summary.arms_crossed_pct, 0.0);
    // Facial side unaffected.
    assert_eq!(summary.eye_contact_pct, 1.0);
    assert!(summary.ear_median > 0.1);
}

#[test]
fn test_two_runs_are_bit_identical() {
    let first = run(Box::new(StubFace::always()), StubMesh::frontal(), true);
    let second = run(Box::new(StubFace::always()), StubMesh::frontal(), true);
    // Deterministic detectors + deterministic reduction: exact equality,
    // not approximate.
    assert_eq!(first, second);
}
