//! Color-coded visualization of flow fields.
//!
//! Direction maps to hue and magnitude to saturation; value is always full,
//! so zero flow renders white.

use crate::internal::cv::{self, ThresholdType};
use crate::{Error, FlowField, Result};
use image::{Rgb, RgbImage};
use std::path::Path;

/// Default magnitude mapped to (almost) full saturation.
pub const DEFAULT_MAX_MAGNITUDE: f32 = 5.0;

/// Render a flow field as an RGB image.
///
/// # Arguments
/// * `flow` - Flow field to render
/// * `max_magnitude` - Magnitude normalizing the saturation; `None`, or a
///   value that is not positive and finite, uses the largest finite magnitude
///   in the field
pub fn flow_to_rgb(flow: &FlowField, max_magnitude: Option<f32>) -> RgbImage {
    let (height, width) = flow.shape();
    let magnitude = flow.magnitude();

    let max = match max_magnitude {
        Some(max) if max.is_finite() && max > 0.0 => max,
        _ => magnitude
            .iter()
            .copied()
            .filter(|m| m.is_finite())
            .fold(0.0_f32, f32::max),
    };
    let scale = if max > 0.0 { 220.0 / max } else { 0.0 };
    let saturation = cv::threshold(&(magnitude * scale), 255.0, 255.0, ThresholdType::Trunc);

    RgbImage::from_fn(width as u32, height as u32, |x, y| {
        let (row, col) = (y as usize, x as usize);
        let (u, v) = flow.get(row, col);
        let angle = v.atan2(u).to_degrees();
        Rgb(cv::hsv_to_rgb(angle, saturation[(row, col)] / 255.0, 1.0))
    })
}

/// Render a flow field and save it as an image file.
pub fn draw_flow_field<P: AsRef<Path>>(
    path: P,
    flow: &FlowField,
    max_magnitude: Option<f32>,
) -> Result<()> {
    let path = path.as_ref();
    flow_to_rgb(flow, max_magnitude).save(path).map_err(|e| {
        Error::IoError(std::io::Error::new(
            std::io::ErrorKind::Other,
            format!("failed to write '{}': {}", path.display(), e),
        ))
    })
}
