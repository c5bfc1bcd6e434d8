//! Evaluation of a single frame pair.

use super::error_metrics::{endpoint_error, region_errors, RegionMetrics};
use crate::discovery::FrameRecord;
use crate::flo::read_flow_file;
use crate::mask::SegmentationMasks;
use crate::utils::warn_once;
use crate::{Error, EvaluationConfig, FlowField, Mask, Result};
use image::{ColorType, RgbImage};
use serde::{Deserialize, Serialize};
use std::ops::AddAssign;
use std::path::Path;

/// Error sums of one frame, split by region.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameMetrics {
    /// Foreground (subject motion) pixels.
    #[serde(rename = "FG")]
    pub fg: RegionMetrics,
    /// Background (scene motion) pixels.
    #[serde(rename = "BG")]
    pub bg: RegionMetrics,
    /// Foreground and background together.
    #[serde(rename = "Total")]
    pub total: RegionMetrics,
}

impl FrameMetrics {
    /// Metrics of a region.
    pub fn region(&self, region: Region) -> &RegionMetrics {
        match region {
            Region::Foreground => &self.fg,
            Region::Background => &self.bg,
            Region::Total => &self.total,
        }
    }
}

impl AddAssign<&FrameMetrics> for FrameMetrics {
    fn add_assign(&mut self, rhs: &FrameMetrics) {
        self.fg += rhs.fg;
        self.bg += rhs.bg;
        self.total += rhs.total;
    }
}

/// Pixel regions every frame is evaluated on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Region {
    Foreground,
    Background,
    Total,
}

impl Region {
    pub const ALL: [Region; 3] = [Region::Foreground, Region::Background, Region::Total];

    pub fn label(&self) -> &'static str {
        match self {
            Region::Foreground => "FG",
            Region::Background => "BG",
            Region::Total => "Total",
        }
    }
}

/// Evaluates estimated flow against ground truth for one frame pair.
#[derive(Debug, Clone)]
pub struct FrameEvaluator {
    /// Ground-truth magnitudes above this are excluded from every region.
    pub magnitude_cutoff: f32,
    /// Gray intensity separating foreground (at or below) from background.
    pub mask_threshold: f32,
}

impl Default for FrameEvaluator {
    fn default() -> Self {
        Self::from_config(&EvaluationConfig::default())
    }
}

impl FrameEvaluator {
    pub fn new(magnitude_cutoff: f32, mask_threshold: f32) -> Self {
        Self {
            magnitude_cutoff,
            mask_threshold,
        }
    }

    pub fn from_config(config: &EvaluationConfig) -> Self {
        Self::new(config.magnitude_cutoff, config.mask_threshold)
    }

    /// Load the record's ground truth, estimate and mask image and evaluate them.
    pub fn evaluate_record(&self, record: &FrameRecord) -> Result<FrameMetrics> {
        let gt_path = required_path(record, record.gt_flow.as_deref(), "ground-truth flow")?;
        let est_path = required_path(record, record.est_flow.as_deref(), "estimated flow")?;
        let mask_path = required_path(record, record.mask.as_deref(), "mask")?;

        let gt = read_flow_file(gt_path)?;
        let mask_image = load_mask_image(mask_path)?;
        let est = read_flow_file(est_path)?;

        log::debug!("evaluating {}/{}", record.sequence, record.filename);
        self.evaluate(&est, &gt, &mask_image)
    }

    /// Evaluate an estimate against ground truth with a mask image.
    pub fn evaluate(
        &self,
        est: &FlowField,
        gt: &FlowField,
        mask_image: &RgbImage,
    ) -> Result<FrameMetrics> {
        let segmentation = SegmentationMasks::from_image(mask_image, self.mask_threshold)?;
        self.evaluate_segmented(est, gt, &segmentation)
    }

    /// Evaluate with precomputed segmentation masks.
    pub fn evaluate_segmented(
        &self,
        est: &FlowField,
        gt: &FlowField,
        segmentation: &SegmentationMasks,
    ) -> Result<FrameMetrics> {
        let valid = Mask::valid_magnitude(gt, self.magnitude_cutoff);
        valid.ensure_same_shape(segmentation.shape())?;

        let ee_base = endpoint_error(est, gt)?;

        Ok(FrameMetrics {
            fg: region_errors(&ee_base, &segmentation.foreground.intersect(&valid)?)?,
            bg: region_errors(&ee_base, &segmentation.background.intersect(&valid)?)?,
            total: region_errors(&ee_base, &segmentation.total.intersect(&valid)?)?,
        })
    }
}

/// Load a mask image as 8-bit RGB.
///
/// Other color types are converted; the conversion is logged once per type.
pub fn load_mask_image<P: AsRef<Path>>(path: P) -> Result<RgbImage> {
    let path = path.as_ref();
    let image = image::open(path).map_err(|e| Error::load(path, e))?;
    if image.color() != ColorType::Rgb8 {
        warn_once(&format!(
            "mask images of color type {:?} are converted to 8-bit RGB",
            image.color()
        ));
    }
    Ok(image.to_rgb8())
}

fn required_path<'a>(
    record: &FrameRecord,
    path: Option<&'a Path>,
    what: &str,
) -> Result<&'a Path> {
    path.ok_or_else(|| {
        Error::load(
            &record.prev_image,
            format!("frame record has no {} path", what),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    /// Left half black (foreground), right half white (background).
    fn half_mask(height: u32, width: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, _| {
            if x < width / 2 {
                Rgb([0, 0, 0])
            } else {
                Rgb([255, 255, 255])
            }
        })
    }

    #[test]
    fn test_perfect_estimate() {
        let gt = FlowField::from_fn(4, 4, |r, c| (r as f32, c as f32));
        let metrics = FrameEvaluator::default().evaluate(&gt, &gt, &half_mask(4, 4)).unwrap();

        assert_eq!(metrics.fg.no_points, 8.0);
        assert_eq!(metrics.bg.no_points, 8.0);
        assert_eq!(metrics.total.no_points, 16.0);
        assert_eq!(metrics.total.ee, 0.0);
    }

    #[test]
    fn test_regions_split_errors() {
        let gt = FlowField::zeros(2, 4);
        // error 2.5 in the foreground half, 0.5 in the background half
        let est = FlowField::from_fn(2, 4, |_, c| if c < 2 { (2.5, 0.0) } else { (0.0, 0.5) });
        let metrics = FrameEvaluator::default().evaluate(&est, &gt, &half_mask(2, 4)).unwrap();

        assert_eq!(metrics.fg.r2, 4.0);
        assert_eq!(metrics.fg.r3, 0.0);
        assert_eq!(metrics.bg.r1, 0.0);
        assert!((metrics.fg.ee - 10.0).abs() < 1e-6);
        assert!((metrics.bg.ee - 2.0).abs() < 1e-6);
        assert!((metrics.total.ee - 12.0).abs() < 1e-6);
        assert_eq!(metrics.total.r1, 4.0);
    }

    #[test]
    fn test_invalid_ground_truth_is_excluded_everywhere() {
        // one pixel per half carries "unknown" ground truth
        let gt = FlowField::from_fn(1, 4, |_, c| if c == 0 || c == 3 { (1e9, 1e9) } else { (0.0, 0.0) });
        let est = FlowField::zeros(1, 4);
        let metrics = FrameEvaluator::default().evaluate(&est, &gt, &half_mask(1, 4)).unwrap();

        assert_eq!(metrics.fg.no_points, 1.0);
        assert_eq!(metrics.bg.no_points, 1.0);
        assert_eq!(metrics.total.no_points, 2.0);
        assert_eq!(metrics.total.ee, 0.0);
    }

    #[test]
    fn test_mask_shape_mismatch() {
        let gt = FlowField::zeros(4, 4);
        let err = FrameEvaluator::default()
            .evaluate(&gt, &gt, &half_mask(4, 6))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidShape { .. }));
    }

    #[test]
    fn test_gray_mask_image_is_converted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mask.png");
        image::GrayImage::from_fn(4, 2, |x, _| image::Luma([if x < 2 { 0 } else { 255 }]))
            .save(&path)
            .unwrap();

        let mask = load_mask_image(&path).unwrap();
        assert_eq!(mask.dimensions(), (4, 2));
        assert_eq!(mask.get_pixel(0, 0).0, [0, 0, 0]);
        assert_eq!(mask.get_pixel(3, 1).0, [255, 255, 255]);

        let gt = FlowField::zeros(2, 4);
        let metrics = FrameEvaluator::default().evaluate(&gt, &gt, &mask).unwrap();
        assert_eq!(metrics.fg.no_points, 4.0);
    }

    #[test]
    fn test_record_without_paths_is_load_error() {
        let record = FrameRecord::default();
        let err = FrameEvaluator::default().evaluate_record(&record).unwrap_err();
        assert!(matches!(err, Error::Load { .. }));
    }

    #[test]
    fn test_frame_metrics_serde_keys() {
        let json = serde_json::to_value(FrameMetrics::default()).unwrap();
        assert!(json.get("FG").is_some());
        assert!(json["Total"].get("noPoints").is_some());
        assert!(json["BG"].get("R2").is_some());
    }
}
