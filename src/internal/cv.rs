//! Image-processing primitives ported from OpenCV.
//!
//! Only the operations the evaluation protocol depends on are ported, with
//! the exact integer arithmetic OpenCV uses so that masks derived from the
//! same PNG files select the same pixels.

use nalgebra::DMatrix;

/// Fixed-point shift used by OpenCV's RGB -> gray conversion.
const GRAY_SHIFT: u32 = 14;
const R2Y: u32 = 4899;
const G2Y: u32 = 9617;
const B2Y: u32 = 1868;

/// Thresholding modes (subset of `cv::ThresholdTypes`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThresholdType {
    /// `dst = src > thresh ? maxval : 0`
    Binary,
    /// `dst = src > thresh ? 0 : maxval`
    BinaryInv,
    /// `dst = src > thresh ? thresh : src`
    Trunc,
}

/// Convert one 8-bit RGB pixel to gray (`cv::COLOR_RGB2GRAY`).
///
/// Uses the 14-bit fixed-point BT.601 weights with rounding.
#[inline]
pub fn rgb_to_gray(r: u8, g: u8, b: u8) -> u8 {
    let acc = r as u32 * R2Y + g as u32 * G2Y + b as u32 * B2Y + (1 << (GRAY_SHIFT - 1));
    (acc >> GRAY_SHIFT).min(255) as u8
}

/// Apply a scalar threshold.
///
/// NaN never compares greater than `thresh`, so it maps like a small value.
#[inline]
pub fn threshold_value(src: f32, thresh: f32, maxval: f32, kind: ThresholdType) -> f32 {
    let above = src > thresh;
    match kind {
        ThresholdType::Binary => {
            if above {
                maxval
            } else {
                0.0
            }
        }
        ThresholdType::BinaryInv => {
            if above {
                0.0
            } else {
                maxval
            }
        }
        ThresholdType::Trunc => {
            if above {
                thresh
            } else {
                src
            }
        }
    }
}

/// Apply a threshold element-wise (`cv::threshold`).
pub fn threshold(src: &DMatrix<f32>, thresh: f32, maxval: f32, kind: ThresholdType) -> DMatrix<f32> {
    src.map(|v| threshold_value(v, thresh, maxval, kind))
}

/// Element-wise magnitude of a 2-vector field (`cv::sqrt(x*x + y*y)`).
///
/// Both matrices must have the same shape; callers check it.
pub fn magnitude(x: &DMatrix<f32>, y: &DMatrix<f32>) -> DMatrix<f32> {
    x.zip_map(y, |a, b| (a * a + b * b).sqrt())
}

/// Sum of all elements accumulated in double precision (`cv::sumElems`).
pub fn sum_elems(src: &DMatrix<f32>) -> f64 {
    src.iter().map(|&v| v as f64).sum()
}

/// Convert HSV to 8-bit RGB.
///
/// `hue` is in degrees (any value, wrapped to [0, 360)), `saturation` and
/// `value` are in [0, 1].
pub fn hsv_to_rgb(hue: f32, saturation: f32, value: f32) -> [u8; 3] {
    let h = hue.rem_euclid(360.0) / 60.0;
    let s = saturation.clamp(0.0, 1.0);
    let v = value.clamp(0.0, 1.0);

    let sector = h.floor();
    let f = h - sector;
    let p = v * (1.0 - s);
    let q = v * (1.0 - s * f);
    let t = v * (1.0 - s * (1.0 - f));

    let (r, g, b) = match sector as i32 {
        0 => (v, t, p),
        1 => (q, v, p),
        2 => (p, v, t),
        3 => (p, q, v),
        4 => (t, p, v),
        _ => (v, p, q),
    };

    let to_u8 = |c: f32| (c * 255.0).round().clamp(0.0, 255.0) as u8;
    [to_u8(r), to_u8(g), to_u8(b)]
}
