//! Decoded video frames.
//!
//! A [`Frame`] is the fully materialized RGB pixel data of one decoded
//! video frame. Decoding backends convert into this type at the boundary so
//! everything downstream (geometry, luma, ONNX preprocessing) is backend
//! independent.

use image::RgbImage;

/// One decoded color frame, RGB, row-major.
#[derive(Debug, Clone)]
pub struct Frame {
    pixels: RgbImage,
}

impl Frame {
    /// Wrap an RGB image buffer.
    pub fn new(pixels: RgbImage) -> Self {
        Self { pixels }
    }

    /// Build a frame from raw interleaved RGB bytes.
    ///
    /// Returns `None` when the buffer length does not match the dimensions.
    pub fn from_raw(width: u32, height: u32, rgb: Vec<u8>) -> Option<Self> {
        RgbImage::from_raw(width, height, rgb).map(Self::new)
    }

    /// Frame width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    /// Frame height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// The underlying RGB buffer.
    pub fn pixels(&self) -> &RgbImage {
        &self.pixels
    }

    /// Mean luminance of the full frame (BT.601 weights), 0..255.
    ///
    /// Matches the Y channel mean a YUV conversion would give; used as a
    /// lighting-condition proxy.
    pub fn mean_luma(&self) -> f64 {
        let n = (self.width() as u64 * self.height() as u64).max(1);
        let sum: f64 = self
            .pixels
            .pixels()
            .map(|p| 0.299 * p[0] as f64 + 0.587 * p[1] as f64 + 0.114 * p[2] as f64)
            .sum();
        sum / n as f64
    }
}

#[cfg(feature = "opencv")]
mod cv {
    use opencv::core::Mat;
    use opencv::prelude::{MatTraitConst, MatTraitConstManual};

    use super::Frame;
    use crate::error::{VisionError, VisionResult};

    impl Frame {
        /// Convert an 8UC3 BGR `Mat` (OpenCV's decode format) into a frame.
        pub fn from_bgr_mat(mat: &Mat) -> VisionResult<Self> {
            if mat.empty() {
                return Err(VisionError::internal("empty Mat"));
            }
            if mat.channels() != 3 {
                return Err(VisionError::internal(format!(
                    "expected 3-channel BGR Mat, got {} channels",
                    mat.channels()
                )));
            }

            let owned;
            let mat = if mat.is_continuous() {
                mat
            } else {
                owned = mat
                    .try_clone()
                    .map_err(|e| VisionError::internal(format!("Mat clone: {e}")))?;
                &owned
            };

            let width = mat.cols() as u32;
            let height = mat.rows() as u32;
            let data = mat
                .data_bytes()
                .map_err(|e| VisionError::internal(format!("Mat data: {e}")))?;

            let mut rgb = Vec::with_capacity(data.len());
            for bgr in data.chunks_exact(3) {
                rgb.push(bgr[2]);
                rgb.push(bgr[1]);
                rgb.push(bgr[0]);
            }

            Frame::from_raw(width, height, rgb)
                .ok_or_else(|| VisionError::internal("Mat buffer size mismatch"))
        }

        /// Convert the frame into an owned 8UC3 BGR `Mat`.
        pub fn to_bgr_mat(&self) -> VisionResult<Mat> {
            let mut bgr = Vec::with_capacity(self.pixels().as_raw().len());
            for rgb in self.pixels().as_raw().chunks_exact(3) {
                bgr.push(rgb[2]);
                bgr.push(rgb[1]);
                bgr.push(rgb[0]);
            }

            let flat = Mat::from_slice(&bgr)
                .map_err(|e| VisionError::internal(format!("Mat from_slice: {e}")))?;
            let shaped = flat
                .reshape(3, self.height() as i32)
                .map_err(|e| VisionError::internal(format!("Mat reshape: {e}")))?;
            shaped
                .try_clone()
                .map_err(|e| VisionError::internal(format!("Mat clone: {e}")))
        }
    }
}
