//! Dense optical flow field.

use crate::internal::cv;
use crate::{Error, Result};
use nalgebra::DMatrix;

/// A dense 2D flow field.
///
/// Stores the horizontal (`u`) and vertical (`v`) displacement components as
/// two `height x width` matrices. Index `(row, col)` addresses the pixel at
/// `y = row`, `x = col`.
#[derive(Debug, Clone, PartialEq)]
pub struct FlowField {
    /// Horizontal displacement per pixel.
    pub u: DMatrix<f32>,
    /// Vertical displacement per pixel.
    pub v: DMatrix<f32>,
}

impl FlowField {
    /// Create a flow field from its two component matrices.
    pub fn new(u: DMatrix<f32>, v: DMatrix<f32>) -> Result<Self> {
        if u.shape() != v.shape() {
            return Err(Error::InvalidShape {
                expected: format!("v with shape {:?}", u.shape()),
                got: format!("{:?}", v.shape()),
            });
        }
        Ok(Self { u, v })
    }

    /// Create a field of zero displacement.
    pub fn zeros(height: usize, width: usize) -> Self {
        Self {
            u: DMatrix::zeros(height, width),
            v: DMatrix::zeros(height, width),
        }
    }

    /// Create a field with the same displacement `(u, v)` at every pixel.
    pub fn constant(height: usize, width: usize, u: f32, v: f32) -> Self {
        Self {
            u: DMatrix::from_element(height, width, u),
            v: DMatrix::from_element(height, width, v),
        }
    }

    /// Build a field from a function of `(row, col)` returning `(u, v)`.
    pub fn from_fn<F>(height: usize, width: usize, mut f: F) -> Self
    where
        F: FnMut(usize, usize) -> (f32, f32),
    {
        let mut field = Self::zeros(height, width);
        for row in 0..height {
            for col in 0..width {
                let (u, v) = f(row, col);
                field.u[(row, col)] = u;
                field.v[(row, col)] = v;
            }
        }
        field
    }

    /// Create a field from an interleaved `(height, width, channels)` array in
    /// row-major order, channels varying fastest.
    ///
    /// Fails with `InvalidShape` unless `channels == 2` and the data length is
    /// `height * width * 2`.
    pub fn from_interleaved(
        height: usize,
        width: usize,
        channels: usize,
        data: &[f32],
    ) -> Result<Self> {
        if channels != 2 {
            return Err(Error::InvalidShape {
                expected: "2 flow components per pixel".to_string(),
                got: format!("({}, {}, {})", height, width, channels),
            });
        }
        let expected = height.checked_mul(width).and_then(|n| n.checked_mul(2));
        if expected != Some(data.len()) {
            return Err(Error::InvalidShape {
                expected: format!("height * width * 2 values for ({}, {}, 2)", height, width),
                got: format!("{} values", data.len()),
            });
        }

        Ok(Self::from_fn(height, width, |row, col| {
            let idx = (row * width + col) * 2;
            (data[idx], data[idx + 1])
        }))
    }

    /// Flatten to an interleaved row-major `(height, width, 2)` vector.
    pub fn to_interleaved(&self) -> Vec<f32> {
        let (height, width) = self.shape();
        let mut data = Vec::with_capacity(height * width * 2);
        for row in 0..height {
            for col in 0..width {
                data.push(self.u[(row, col)]);
                data.push(self.v[(row, col)]);
            }
        }
        data
    }

    /// `(height, width)` of the field.
    pub fn shape(&self) -> (usize, usize) {
        self.u.shape()
    }

    pub fn height(&self) -> usize {
        self.u.nrows()
    }

    pub fn width(&self) -> usize {
        self.u.ncols()
    }

    /// Displacement at `(row, col)`.
    pub fn get(&self, row: usize, col: usize) -> (f32, f32) {
        (self.u[(row, col)], self.v[(row, col)])
    }

    /// Per-pixel flow magnitude.
    pub fn magnitude(&self) -> DMatrix<f32> {
        cv::magnitude(&self.u, &self.v)
    }

    /// Fail with `InvalidShape` unless `other` has the same dimensions.
    pub fn ensure_same_shape(&self, other: &FlowField) -> Result<()> {
        if self.shape() != other.shape() {
            return Err(Error::InvalidShape {
                expected: format!("flow field of shape {:?}", self.shape()),
                got: format!("{:?}", other.shape()),
            });
        }
        Ok(())
    }
}
