//! Frame sampling inside selected segments.
//!
//! The sampler walks the native frame sequence of each segment and
//! materializes pixel data only for every `step`-th native frame, where
//! `step` approximates the requested sampling rate. Advancing uses the
//! decoder's cheap grab/peek operations so discarded frames are never
//! decoded.
//!
//! Decode state is inherently sequential, so the stream is lazy,
//! single-pass and non-restartable.

use icoach_models::Segment;
use tracing::{debug, warn};

use crate::error::VisionResult;
use crate::frame::Frame;

/// Assumed native frame rate when the container reports none.
pub const FALLBACK_NATIVE_FPS: f64 = 30.0;

/// Stride between materialized native frames for a target sampling rate.
pub fn sample_step(native_fps: f64, target_fps: u32) -> u64 {
    let target = target_fps.max(1) as f64;
    ((native_fps / target).round() as i64).max(1) as u64
}

/// Sequential access to a video's decoded frame sequence.
///
/// Implementations wrap a decoder (OpenCV `VideoCapture` in production,
/// synthetic sources in tests). The contract follows the decoder model:
///
/// - [`position_seconds`](FrameSource::position_seconds) peeks the timestamp
///   of the next frame without decoding anything.
/// - [`grab`](FrameSource::grab) advances by one native frame without
///   materializing pixel data; `false` means the stream is exhausted.
/// - [`frame_index`](FrameSource::frame_index) is the zero-based index of
///   the *next* frame the decoder would produce (so immediately after a
///   grab it is one past the grabbed frame).
/// - [`retrieve`](FrameSource::retrieve) materializes the last grabbed
///   frame.
pub trait FrameSource {
    /// Native frame rate, when the container reports one.
    fn native_fps(&self) -> Option<f64>;

    /// Seek so the next frame is at (or just after) `seconds`.
    fn seek_seconds(&mut self, seconds: f64) -> VisionResult<()>;

    /// Timestamp of the next frame, in seconds. Cheap; never decodes.
    fn position_seconds(&self) -> f64;

    /// Advance one native frame without decoding. `false` at end of stream.
    fn grab(&mut self) -> VisionResult<bool>;

    /// Zero-based index of the next frame the decoder would produce.
    fn frame_index(&self) -> u64;

    /// Decode the last grabbed frame. `None` when the decoder has nothing.
    fn retrieve(&mut self) -> VisionResult<Option<Frame>>;
}

/// One sampled frame, tagged with its timestamp and segment label.
pub struct SampledFrame {
    /// Timestamp in seconds, from the decoder position
    pub timestamp: f64,
    /// Materialized pixel data
    pub frame: Frame,
    /// Label of the segment the frame belongs to
    pub label: String,
}

/// Lazy, single-pass stream of sampled frames over an ordered segment list.
pub struct FrameStream<'a, S: FrameSource> {
    source: S,
    segments: &'a [Segment],
    step: u64,
    current: usize,
    seeked: bool,
}

impl<'a, S: FrameSource> FrameStream<'a, S> {
    /// Create a stream sampling at `target_fps` within each segment.
    pub fn new(source: S, segments: &'a [Segment], target_fps: u32) -> Self {
        let native = source
            .native_fps()
            .filter(|fps| *fps > 0.0)
            .unwrap_or(FALLBACK_NATIVE_FPS);
        let step = sample_step(native, target_fps);
        debug!(native_fps = native, target_fps, step, "frame stream opened");

        Self {
            source,
            segments,
            step,
            current: 0,
            seeked: false,
        }
    }

    /// The computed native-frame stride.
    pub fn step(&self) -> u64 {
        self.step
    }

    /// Move to the next segment, forcing a fresh seek.
    fn next_segment(&mut self) {
        self.current += 1;
        self.seeked = false;
    }
}

impl<'a, S: FrameSource> Iterator for FrameStream<'a, S> {
    type Item = SampledFrame;

    fn next(&mut self) -> Option<SampledFrame> {
        loop {
            let segment = self.segments.get(self.current)?;

            if !self.seeked {
                if let Err(e) = self.source.seek_seconds(segment.start) {
                    warn!(start = segment.start, error = %e, "seek failed, skipping segment");
                    self.next_segment();
                    continue;
                }
                self.seeked = true;
            }

            loop {
                // Peek before grabbing so the frame past the segment end is
                // left for the next segment's seek to deal with.
                let position = self.source.position_seconds();
                if position > segment.end {
                    break;
                }

                match self.source.grab() {
                    Ok(true) => {}
                    // End of stream or decode failure: abandon this segment,
                    // the remaining ones still get their chance after a seek.
                    Ok(false) => break,
                    Err(e) => {
                        warn!(position, error = %e, "decode failed mid-segment");
                        break;
                    }
                }

                if self.source.frame_index() % self.step != 0 {
                    continue;
                }

                match self.source.retrieve() {
                    Ok(Some(frame)) => {
                        return Some(SampledFrame {
                            timestamp: position,
                            frame,
                            label: segment.label.clone(),
                        });
                    }
                    Ok(None) => break,
                    Err(e) => {
                        warn!(position, error = %e, "retrieve failed mid-segment");
                        break;
                    }
                }
            }

            self.next_segment();
        }
    }
}

#[cfg(feature = "opencv")]
mod cv {
    use std::path::Path;

    use opencv::core::Mat;
    use opencv::prelude::{VideoCaptureTrait, VideoCaptureTraitConst};
    use opencv::videoio::{
        VideoCapture, CAP_ANY, CAP_PROP_FPS, CAP_PROP_POS_FRAMES, CAP_PROP_POS_MSEC,
    };

    use super::FrameSource;
    use crate::error::{VisionError, VisionResult};
    use crate::frame::Frame;

    /// OpenCV-backed frame source.
    pub struct OpenCvFrameSource {
        capture: VideoCapture,
    }

    impl OpenCvFrameSource {
        /// Open a video file. Failing to open is pipeline-fatal.
        pub fn open(path: &Path) -> VisionResult<Self> {
            let path_str = path
                .to_str()
                .ok_or_else(|| VisionError::VideoOpen(path.to_path_buf()))?;

            let capture = VideoCapture::from_file(path_str, CAP_ANY)
                .map_err(|_| VisionError::VideoOpen(path.to_path_buf()))?;

            if !capture.is_opened().unwrap_or(false) {
                return Err(VisionError::VideoOpen(path.to_path_buf()));
            }

            Ok(Self { capture })
        }
    }

    impl FrameSource for OpenCvFrameSource {
        fn native_fps(&self) -> Option<f64> {
            self.capture.get(CAP_PROP_FPS).ok().filter(|fps| *fps > 0.0)
        }

        fn seek_seconds(&mut self, seconds: f64) -> VisionResult<()> {
            self.capture
                .set(CAP_PROP_POS_MSEC, seconds * 1000.0)
                .map_err(|e| VisionError::internal(format!("seek failed: {e}")))?;
            Ok(())
        }

        fn position_seconds(&self) -> f64 {
            self.capture.get(CAP_PROP_POS_MSEC).unwrap_or(0.0) / 1000.0
        }

        fn grab(&mut self) -> VisionResult<bool> {
            self.capture
                .grab()
                .map_err(|e| VisionError::internal(format!("grab failed: {e}")))
        }

        fn frame_index(&self) -> u64 {
            self.capture.get(CAP_PROP_POS_FRAMES).unwrap_or(0.0).max(0.0) as u64
        }

        fn retrieve(&mut self) -> VisionResult<Option<Frame>> {
            let mut mat = Mat::default();
            let ok = self
                .capture
                .retrieve(&mut mat, 0)
                .map_err(|e| VisionError::internal(format!("retrieve failed: {e}")))?;
            if !ok {
                return Ok(None);
            }
            Frame::from_bgr_mat(&mat).map(Some)
        }
    }
}

#[cfg(feature = "opencv")]
pub use cv::OpenCvFrameSource;
