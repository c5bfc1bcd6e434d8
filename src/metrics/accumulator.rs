//! Per-sequence accumulation of frame metrics.

use super::error_metrics::RegionAverages;
use super::frame::{FrameMetrics, Region};
use serde::{Deserialize, Serialize};

/// Accumulator for the frames of one sequence.
///
/// Collects frame-by-frame error sums; [`SequenceAccumulator::finalize`]
/// divides the summed errors by the summed pixel counts, so every pixel of
/// the sequence carries the same weight regardless of which frame it is in.
#[derive(Debug, Clone, Default)]
pub struct SequenceAccumulator {
    /// Summed error metrics of all frames seen so far.
    sums: FrameMetrics,

    /// Number of frames seen so far.
    num_frames: usize,
}

/// Pixel-weighted averages of one sequence.
///
/// A region without any valid pixel has no average (`None`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequenceMetrics {
    /// Sequence name.
    pub sequence: String,
    /// Number of frames averaged.
    pub num_frames: usize,
    #[serde(rename = "FG")]
    pub fg: Option<RegionAverages>,
    #[serde(rename = "BG")]
    pub bg: Option<RegionAverages>,
    #[serde(rename = "Total")]
    pub total: Option<RegionAverages>,
}

impl SequenceMetrics {
    /// Regions without any valid pixel, in `Region::ALL` order.
    pub fn empty_regions(&self) -> Vec<Region> {
        Region::ALL
            .into_iter()
            .filter(|&region| self.region(region).is_none())
            .collect()
    }

    /// Averages of a region.
    pub fn region(&self, region: Region) -> Option<&RegionAverages> {
        match region {
            Region::Foreground => self.fg.as_ref(),
            Region::Background => self.bg.as_ref(),
            Region::Total => self.total.as_ref(),
        }
    }
}

impl SequenceAccumulator {
    /// Create a new accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one frame's metrics.
    pub fn update(&mut self, metrics: &FrameMetrics) {
        self.sums += metrics;
        self.num_frames += 1;
    }

    /// Get the summed metrics.
    pub fn sums(&self) -> &FrameMetrics {
        &self.sums
    }

    /// Get the number of frames.
    pub fn num_frames(&self) -> usize {
        self.num_frames
    }

    /// Compute the per-pixel averages of `method` on `sequence`.
    ///
    /// Regions with zero valid pixels are logged for this (method, sequence)
    /// key and left without an average.
    pub fn finalize(&self, method: &str, sequence: &str) -> SequenceMetrics {
        let average = |region: Region| {
            let averaged = self.sums.region(region).averaged();
            if averaged.is_none() {
                log::warn!(
                    "method '{}', sequence '{}': no valid {} pixels in {} frames; region left out of averages",
                    method,
                    sequence,
                    region.label(),
                    self.num_frames
                );
            }
            averaged
        };

        SequenceMetrics {
            sequence: sequence.to_string(),
            num_frames: self.num_frames,
            fg: average(Region::Foreground),
            bg: average(Region::Background),
            total: average(Region::Total),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::RegionMetrics;

    fn region(ee: f64, r2: f64, no_points: f64) -> RegionMetrics {
        RegionMetrics {
            ee,
            r1: r2,
            r2,
            r3: 0.0,
            no_points,
        }
    }

    fn frame(ee: f64, r2: f64, no_points: f64) -> FrameMetrics {
        FrameMetrics {
            fg: region(ee, r2, no_points),
            bg: region(ee, r2, no_points),
            total: region(2.0 * ee, 2.0 * r2, 2.0 * no_points),
        }
    }

    #[test]
    fn test_accumulator_empty() {
        let acc = SequenceAccumulator::new();
        assert_eq!(acc.num_frames(), 0);

        let seq = acc.finalize("ACPM", "empty");
        assert!(seq.fg.is_none());
        assert!(seq.total.is_none());
    }

    #[test]
    fn test_pixel_weighted_average() {
        let mut acc = SequenceAccumulator::new();
        acc.update(&frame(5.0, 1.0, 10.0));
        acc.update(&frame(8.0, 5.0, 20.0));

        let seq = acc.finalize("ACPM", "IM01");
        let fg = seq.fg.unwrap();

        assert_eq!(seq.num_frames, 2);
        // (5 + 8) / (10 + 20), not (5/10 + 8/20) / 2
        assert!((fg.ee - 13.0 / 30.0).abs() < 1e-12);
        assert!((fg.r2 - 0.2).abs() < 1e-12);
        assert_eq!(fg.no_points, 30.0);
        assert!((seq.total.unwrap().ee - 13.0 / 30.0).abs() < 1e-12);
    }

    #[test]
    fn test_empty_region_has_no_average() {
        let mut acc = SequenceAccumulator::new();
        let mut metrics = frame(1.0, 0.0, 4.0);
        metrics.fg = RegionMetrics::default();
        acc.update(&metrics);

        let seq = acc.finalize("ACPM", "IM02");
        assert!(seq.region(Region::Foreground).is_none());
        assert!(seq.region(Region::Background).is_some());
        assert_eq!(seq.empty_regions(), vec![Region::Foreground]);
    }
}
