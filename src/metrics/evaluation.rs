//! Aggregation of frame results into per-method summaries.
//!
//! Averaging happens on two levels:
//!
//! 1. Within a sequence, error sums of all frames are added and divided by
//!    the summed pixel count ([`SequenceAccumulator`]).
//! 2. Within a method, the per-sequence averages are combined with an
//!    unweighted arithmetic mean, separately for static sequences, dynamic
//!    sequences and all sequences.
//!
//! The second level keeps long sequences from dominating a method's score.

use super::accumulator::{SequenceAccumulator, SequenceMetrics};
use super::error_metrics::RegionAverages;
use super::frame::Region;
use super::results::FrameResult;
use crate::utils::{contains_any, mean};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Category of a sequence for aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SequenceClass {
    /// Left out of every average.
    Excluded,
    /// Scene without camera motion.
    Static,
    /// Scene with camera motion.
    Dynamic,
}

/// Assigns sequences to aggregation categories by name.
pub trait SequenceClassifier: Send + Sync {
    fn classify(&self, sequence: &str) -> SequenceClass;
}

/// Classifies sequences by marker substrings in their names.
///
/// Exclusion markers take precedence over dynamic markers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerClassifier {
    exclude: Vec<String>,
    dynamic: Vec<String>,
}

impl MarkerClassifier {
    pub fn new(exclude: Vec<String>, dynamic: Vec<String>) -> Self {
        Self { exclude, dynamic }
    }
}

impl SequenceClassifier for MarkerClassifier {
    fn classify(&self, sequence: &str) -> SequenceClass {
        if contains_any(sequence, &self.exclude) {
            SequenceClass::Excluded
        } else if contains_any(sequence, &self.dynamic) {
            SequenceClass::Dynamic
        } else {
            SequenceClass::Static
        }
    }
}

/// Subset of a method's sequences to average over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subset {
    Static,
    Dynamic,
    All,
}

impl Subset {
    /// Whether a sequence of the given class belongs to the subset.
    pub fn contains(&self, class: SequenceClass) -> bool {
        match (self, class) {
            (_, SequenceClass::Excluded) => false,
            (Subset::All, _) => true,
            (Subset::Static, SequenceClass::Static) => true,
            (Subset::Dynamic, SequenceClass::Dynamic) => true,
            _ => false,
        }
    }
}

/// Unweighted means of one region over the sequences of a subset.
///
/// `ee` is the mean endpoint error; the `*_percent` fields are the mean
/// threshold ratios scaled by 100. Every value is `None` when no sequence
/// of the subset has valid pixels in this region.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RegionSummary {
    pub ee: Option<f64>,
    pub r1_percent: Option<f64>,
    pub r2_percent: Option<f64>,
    pub r3_percent: Option<f64>,
    /// Sequences that contributed to the means.
    pub num_sequences: usize,
}

/// Region summaries of one subset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubsetSummary {
    /// Sequences belonging to the subset.
    pub num_sequences: usize,
    #[serde(rename = "FG")]
    pub fg: RegionSummary,
    #[serde(rename = "BG")]
    pub bg: RegionSummary,
    #[serde(rename = "Total")]
    pub total: RegionSummary,
}

impl SubsetSummary {
    pub fn region(&self, region: Region) -> &RegionSummary {
        match region {
            Region::Foreground => &self.fg,
            Region::Background => &self.bg,
            Region::Total => &self.total,
        }
    }
}

/// A (sequence, region) of one method without any valid pixel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmptyRegion {
    pub sequence: String,
    pub region: Region,
}

/// Aggregated results of one method, ready for rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodSummary {
    pub method: String,
    /// Per-sequence averages of every sequence that was not excluded.
    pub sequences: Vec<SequenceMetrics>,
    pub static_scenes: SubsetSummary,
    pub dynamic_scenes: SubsetSummary,
    pub overall: SubsetSummary,
    /// Regions left out of the means because they had no valid pixel.
    #[serde(default)]
    pub empty_regions: Vec<EmptyRegion>,
}

/// Group frame results by method and sequence.
///
/// Results of excluded sequences are dropped here, before any averaging.
pub fn collect_sequences(
    results: &[FrameResult],
    classifier: &dyn SequenceClassifier,
) -> BTreeMap<String, BTreeMap<String, SequenceAccumulator>> {
    let mut methods: BTreeMap<String, BTreeMap<String, SequenceAccumulator>> = BTreeMap::new();

    for result in results {
        let sequence = &result.record.sequence;
        if classifier.classify(sequence) == SequenceClass::Excluded {
            continue;
        }

        methods
            .entry(result.record.method.clone())
            .or_default()
            .entry(sequence.clone())
            .or_default()
            .update(&result.metrics);
    }

    methods
}

/// Unweighted mean over the sequences of a subset, per region.
pub fn average_sequences(
    sequences: &[SequenceMetrics],
    subset: Subset,
    classifier: &dyn SequenceClassifier,
) -> SubsetSummary {
    let members: Vec<&SequenceMetrics> = sequences
        .iter()
        .filter(|s| subset.contains(classifier.classify(&s.sequence)))
        .collect();

    let summarize = |region: Region| {
        let averages: Vec<&RegionAverages> =
            members.iter().filter_map(|s| s.region(region)).collect();
        let percent = |m: f64| 100.0 * m;

        RegionSummary {
            ee: column_mean(&averages, |a| a.ee),
            r1_percent: column_mean(&averages, |a| a.r1).map(percent),
            r2_percent: column_mean(&averages, |a| a.r2).map(percent),
            r3_percent: column_mean(&averages, |a| a.r3).map(percent),
            num_sequences: averages.len(),
        }
    };

    SubsetSummary {
        num_sequences: members.len(),
        fg: summarize(Region::Foreground),
        bg: summarize(Region::Background),
        total: summarize(Region::Total),
    }
}

fn column_mean<F>(averages: &[&RegionAverages], field: F) -> Option<f64>
where
    F: Fn(&RegionAverages) -> f64,
{
    let values: Vec<f64> = averages.iter().map(|a| field(a)).collect();
    mean(&values)
}

/// Summarize one method from its per-sequence accumulators.
pub fn summarize_method(
    method: &str,
    sequences: &BTreeMap<String, SequenceAccumulator>,
    classifier: &dyn SequenceClassifier,
) -> MethodSummary {
    let sequences: Vec<SequenceMetrics> = sequences
        .iter()
        .map(|(name, acc)| acc.finalize(method, name))
        .collect();

    let empty_regions = sequences
        .iter()
        .flat_map(|s| {
            s.empty_regions().into_iter().map(|region| EmptyRegion {
                sequence: s.sequence.clone(),
                region,
            })
        })
        .collect();

    MethodSummary {
        method: method.to_string(),
        static_scenes: average_sequences(&sequences, Subset::Static, classifier),
        dynamic_scenes: average_sequences(&sequences, Subset::Dynamic, classifier),
        overall: average_sequences(&sequences, Subset::All, classifier),
        sequences,
        empty_regions,
    }
}

/// Summarize every method found in `results`, in method name order.
pub fn summarize_methods(
    results: &[FrameResult],
    classifier: &dyn SequenceClassifier,
) -> Vec<MethodSummary> {
    collect_sequences(results, classifier)
        .iter()
        .map(|(method, sequences)| summarize_method(method, sequences, classifier))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::FrameRecord;
    use crate::metrics::{FrameMetrics, RegionMetrics};

    fn classifier() -> MarkerClassifier {
        MarkerClassifier::new(vec!["_dyn".to_string()], vec!["_hDyn".to_string()])
    }

    fn result(method: &str, sequence: &str, ee: f64, no_points: f64) -> FrameResult {
        let region = RegionMetrics {
            ee,
            r1: 0.0,
            r2: 0.25 * no_points,
            r3: 0.0,
            no_points,
        };
        FrameResult {
            record: FrameRecord {
                method: method.to_string(),
                sequence: sequence.to_string(),
                ..Default::default()
            },
            metrics: FrameMetrics {
                fg: region,
                bg: region,
                total: region,
            },
        }
    }

    fn averages(ee: f64) -> Option<RegionAverages> {
        Some(RegionAverages {
            ee,
            r1: 0.0,
            r2: 0.1,
            r3: 0.0,
            no_points: 1.0,
        })
    }

    fn sequence(name: &str, ee: f64) -> SequenceMetrics {
        SequenceMetrics {
            sequence: name.to_string(),
            num_frames: 1,
            fg: averages(ee),
            bg: averages(ee),
            total: averages(ee),
        }
    }

    #[test]
    fn test_marker_classifier() {
        let c = classifier();
        assert_eq!(c.classify("IM01"), SequenceClass::Static);
        assert_eq!(c.classify("IM01_hDyn"), SequenceClass::Dynamic);
        assert_eq!(c.classify("IM05_dyn"), SequenceClass::Excluded);
    }

    #[test]
    fn test_subset_membership() {
        assert!(Subset::All.contains(SequenceClass::Static));
        assert!(Subset::All.contains(SequenceClass::Dynamic));
        assert!(!Subset::All.contains(SequenceClass::Excluded));
        assert!(!Subset::Static.contains(SequenceClass::Dynamic));
        assert!(Subset::Dynamic.contains(SequenceClass::Dynamic));
    }

    #[test]
    fn test_unweighted_sequence_mean() {
        let sequences = vec![sequence("IM01", 0.2), sequence("IM02", 0.6)];
        let summary = average_sequences(&sequences, Subset::All, &classifier());

        assert_eq!(summary.num_sequences, 2);
        assert!((summary.fg.ee.unwrap() - 0.4).abs() < 1e-12);
        assert!((summary.fg.r2_percent.unwrap() - 10.0).abs() < 1e-12);
    }

    #[test]
    fn test_two_level_averaging() {
        // IM01: one frame, ee 0.2 per pixel; IM02: three frames, ee 0.6 per pixel
        let results = vec![
            result("ACPM", "IM01", 2.0, 10.0),
            result("ACPM", "IM02", 6.0, 10.0),
            result("ACPM", "IM02", 30.0, 50.0),
            result("ACPM", "IM02", 60.0, 100.0),
        ];
        let summaries = summarize_methods(&results, &classifier());

        assert_eq!(summaries.len(), 1);
        let overall = &summaries[0].overall;
        // a pixel-weighted mean would give 98 / 170
        assert!((overall.total.ee.unwrap() - 0.4).abs() < 1e-12);
        assert!((overall.total.r2_percent.unwrap() - 25.0).abs() < 1e-12);
    }

    #[test]
    fn test_subsets_and_exclusion() {
        let results = vec![
            result("ACPM", "IM01", 1.0, 10.0),
            result("ACPM", "IM02_hDyn", 3.0, 10.0),
            result("ACPM", "IM03_dyn", 100.0, 10.0),
            result("FlowNet", "IM01", 5.0, 10.0),
        ];
        let summaries = summarize_methods(&results, &classifier());

        assert_eq!(summaries.len(), 2);
        let acpm = &summaries[0];
        assert_eq!(acpm.method, "ACPM");
        assert_eq!(acpm.sequences.len(), 2);
        assert_eq!(acpm.static_scenes.num_sequences, 1);
        assert_eq!(acpm.dynamic_scenes.num_sequences, 1);
        assert_eq!(acpm.overall.num_sequences, 2);
        assert!((acpm.static_scenes.fg.ee.unwrap() - 0.1).abs() < 1e-12);
        assert!((acpm.dynamic_scenes.bg.ee.unwrap() - 0.3).abs() < 1e-12);
        assert!((acpm.overall.total.ee.unwrap() - 0.2).abs() < 1e-12);

        let flownet = &summaries[1];
        assert_eq!(flownet.dynamic_scenes.num_sequences, 0);
        assert_eq!(flownet.dynamic_scenes.fg.ee, None);
        assert!((flownet.overall.fg.ee.unwrap() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_empty_regions_reported_per_method() {
        let mut acpm = result("ACPM", "IM01", 2.0, 10.0);
        acpm.metrics.fg = RegionMetrics::default();
        let mut flownet = result("FlowNet", "IM01", 4.0, 10.0);
        flownet.metrics.fg = RegionMetrics::default();
        let results = vec![acpm, flownet];

        let expected = vec![EmptyRegion {
            sequence: "IM01".to_string(),
            region: Region::Foreground,
        }];
        // same keys on every call
        for _ in 0..2 {
            let summaries = summarize_methods(&results, &classifier());
            assert_eq!(summaries.len(), 2);
            for summary in &summaries {
                assert_eq!(summary.empty_regions, expected, "method {}", summary.method);
                assert_eq!(summary.overall.fg.ee, None);
                assert!(summary.overall.bg.ee.is_some());
            }
        }
    }

    #[test]
    fn test_empty_region_left_out_of_mean() {
        let mut empty_fg = sequence("IM02", 0.6);
        empty_fg.fg = None;
        let sequences = vec![sequence("IM01", 0.2), empty_fg];
        let summary = average_sequences(&sequences, Subset::All, &classifier());

        assert_eq!(summary.num_sequences, 2);
        assert_eq!(summary.fg.num_sequences, 1);
        assert!((summary.fg.ee.unwrap() - 0.2).abs() < 1e-12);
        assert!((summary.bg.ee.unwrap() - 0.4).abs() < 1e-12);
    }
}
