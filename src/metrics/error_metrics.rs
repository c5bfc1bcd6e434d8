//! Endpoint error and threshold counts over a masked region.

use crate::internal::cv::{self, ThresholdType};
use crate::{FlowField, Mask, Result};
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign};

/// Endpoint-error thresholds for R1, R2 and R3.
pub const ERROR_THRESHOLDS: [f32; 3] = [1.0, 2.0, 3.0];

/// Error sums over one region of one frame.
///
/// All fields are sums, not averages: `ee` is the summed endpoint error,
/// `r1..r3` count pixels whose endpoint error strictly exceeds 1, 2 and 3,
/// and `no_points` is the summed mask weight.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RegionMetrics {
    pub ee: f64,
    #[serde(rename = "R1")]
    pub r1: f64,
    #[serde(rename = "R2")]
    pub r2: f64,
    #[serde(rename = "R3")]
    pub r3: f64,
    #[serde(rename = "noPoints")]
    pub no_points: f64,
}

impl RegionMetrics {
    /// Per-pixel averages, or `None` when the region has no valid pixel.
    pub fn averaged(&self) -> Option<RegionAverages> {
        if self.no_points <= 0.0 {
            return None;
        }
        Some(RegionAverages {
            ee: self.ee / self.no_points,
            r1: self.r1 / self.no_points,
            r2: self.r2 / self.no_points,
            r3: self.r3 / self.no_points,
            no_points: self.no_points,
        })
    }
}

impl Add for RegionMetrics {
    type Output = RegionMetrics;

    fn add(mut self, rhs: RegionMetrics) -> RegionMetrics {
        self += rhs;
        self
    }
}

impl AddAssign for RegionMetrics {
    fn add_assign(&mut self, rhs: RegionMetrics) {
        self.ee += rhs.ee;
        self.r1 += rhs.r1;
        self.r2 += rhs.r2;
        self.r3 += rhs.r3;
        self.no_points += rhs.no_points;
    }
}

/// Pixel-weighted averages of a region.
///
/// `ee` is the average endpoint error; `r1..r3` are fractions in [0, 1].
/// `no_points` keeps the pixel count the averages were taken over.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegionAverages {
    pub ee: f64,
    pub r1: f64,
    pub r2: f64,
    pub r3: f64,
    pub no_points: f64,
}

/// Per-pixel endpoint error `sqrt((u_e - u_g)^2 + (v_e - v_g)^2)`.
///
/// Fails with `InvalidShape` if the fields differ in size.
pub fn endpoint_error(est: &FlowField, gt: &FlowField) -> Result<DMatrix<f32>> {
    gt.ensure_same_shape(est)?;
    let du = &est.u - &gt.u;
    let dv = &est.v - &gt.v;
    Ok(cv::magnitude(&du, &dv))
}

/// Accumulate error sums of a per-pixel endpoint error map over a mask.
///
/// The error map is multiplied by the mask before thresholding, so pixels
/// outside the region never count towards R1..R3.
pub fn region_errors(ee_base: &DMatrix<f32>, mask: &Mask) -> Result<RegionMetrics> {
    mask.ensure_same_shape(ee_base.shape())?;

    let masked = ee_base.component_mul(mask.weights());
    let [t1, t2, t3] = ERROR_THRESHOLDS;

    Ok(RegionMetrics {
        ee: cv::sum_elems(&masked),
        r1: cv::sum_elems(&cv::threshold(&masked, t1, 1.0, ThresholdType::Binary)),
        r2: cv::sum_elems(&cv::threshold(&masked, t2, 1.0, ThresholdType::Binary)),
        r3: cv::sum_elems(&cv::threshold(&masked, t3, 1.0, ThresholdType::Binary)),
        no_points: mask.count(),
    })
}

/// Error sums of an estimate against ground truth over a mask.
pub fn compute_errors(est: &FlowField, gt: &FlowField, mask: &Mask) -> Result<RegionMetrics> {
    let ee_base = endpoint_error(est, gt)?;
    region_errors(&ee_base, mask)
}
