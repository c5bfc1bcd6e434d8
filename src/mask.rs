//! Region masks and mask-image conversion.

use crate::internal::cv::{self, ThresholdType};
use crate::{Error, FlowField, Result};
use image::RgbImage;
use nalgebra::DMatrix;

/// A per-pixel region weight in [0, 1], normally binary.
///
/// Shape is `height x width`, matching [`FlowField`].
#[derive(Debug, Clone, PartialEq)]
pub struct Mask(DMatrix<f32>);

impl Mask {
    /// Wrap a weight matrix.
    pub fn new(weights: DMatrix<f32>) -> Self {
        Self(weights)
    }

    /// Mask selecting every pixel.
    pub fn ones(height: usize, width: usize) -> Self {
        Self(DMatrix::from_element(height, width, 1.0))
    }

    /// Mask selecting no pixel.
    pub fn zeros(height: usize, width: usize) -> Self {
        Self(DMatrix::zeros(height, width))
    }

    /// Build a binary mask from a predicate on `(row, col)`.
    pub fn from_fn<F>(height: usize, width: usize, mut f: F) -> Self
    where
        F: FnMut(usize, usize) -> bool,
    {
        Self(DMatrix::from_fn(height, width, |r, c| if f(r, c) { 1.0 } else { 0.0 }))
    }

    /// Validity mask of a ground-truth field: 1 where `|gt| <= cutoff`.
    ///
    /// Pixels with larger magnitude mark unknown or implausible flow.
    pub fn valid_magnitude(gt: &FlowField, cutoff: f32) -> Self {
        Self(cv::threshold(&gt.magnitude(), cutoff, 1.0, ThresholdType::BinaryInv))
    }

    /// Pixels whose intensity is at or below `threshold`.
    pub fn below(intensity: &DMatrix<f32>, threshold: f32) -> Self {
        Self(cv::threshold(intensity, threshold, 1.0, ThresholdType::BinaryInv))
    }

    /// Pixels whose intensity is strictly above `threshold`.
    pub fn above(intensity: &DMatrix<f32>, threshold: f32) -> Self {
        Self(cv::threshold(intensity, threshold, 1.0, ThresholdType::Binary))
    }

    /// Element-wise product (logical AND for binary masks).
    pub fn intersect(&self, other: &Mask) -> Result<Mask> {
        self.ensure_same_shape(other.shape())?;
        Ok(Self(self.0.component_mul(&other.0)))
    }

    /// Element-wise maximum (logical OR for binary masks).
    pub fn union(&self, other: &Mask) -> Result<Mask> {
        self.ensure_same_shape(other.shape())?;
        Ok(Self(self.0.zip_map(&other.0, f32::max)))
    }

    /// Sum of mask weights (the pixel count for binary masks).
    pub fn count(&self) -> f64 {
        cv::sum_elems(&self.0)
    }

    pub fn weights(&self) -> &DMatrix<f32> {
        &self.0
    }

    /// `(height, width)` of the mask.
    pub fn shape(&self) -> (usize, usize) {
        self.0.shape()
    }

    /// Fail with `InvalidShape` unless the mask has the given `(height, width)`.
    pub fn ensure_same_shape(&self, shape: (usize, usize)) -> Result<()> {
        if self.shape() != shape {
            return Err(Error::InvalidShape {
                expected: format!("mask of shape {:?}", shape),
                got: format!("{:?}", self.shape()),
            });
        }
        Ok(())
    }
}

/// Foreground / background masks derived from a mask image.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentationMasks {
    pub foreground: Mask,
    pub background: Mask,
    /// Union of foreground and background.
    pub total: Mask,
}

impl SegmentationMasks {
    /// Segment a gray intensity matrix: foreground at or below `threshold`,
    /// background above it.
    pub fn from_intensity(intensity: &DMatrix<f32>, threshold: f32) -> Result<Self> {
        let foreground = Mask::below(intensity, threshold);
        let background = Mask::above(intensity, threshold);
        let total = foreground.union(&background)?;
        Ok(Self {
            foreground,
            background,
            total,
        })
    }

    /// Segment a 3-channel 8-bit mask image.
    pub fn from_image(image: &RgbImage, threshold: f32) -> Result<Self> {
        Self::from_intensity(&gray_intensity(image), threshold)
    }

    /// `(height, width)` of the masks.
    pub fn shape(&self) -> (usize, usize) {
        self.total.shape()
    }
}

/// Convert an RGB image to a `height x width` matrix of 8-bit gray values.
pub fn gray_intensity(image: &RgbImage) -> DMatrix<f32> {
    let (width, height) = image.dimensions();
    DMatrix::from_fn(height as usize, width as usize, |row, col| {
        let p = image.get_pixel(col as u32, row as u32);
        cv::rgb_to_gray(p[0], p[1], p[2]) as f32
    })
}
