//! Optical flow evaluation metrics.
//!
//! This module provides the evaluation pipeline for estimated flow fields:
//!
//! - `error_metrics` - Endpoint error and R1/R2/R3 counts over a region
//! - `FrameEvaluator` - Foreground/background/total metrics of one frame pair
//! - `SequenceAccumulator` - Pixel-weighted per-sequence averages
//! - `summarize_methods` - Unweighted per-method averages over sequences
//! - `ResultsFile` - Persist per-frame results as JSON
//! - `render_latex` / `render_text` - Result tables

mod accumulator;
mod error_metrics;
mod evaluation;
mod frame;
mod results;
mod table;

pub use accumulator::{SequenceAccumulator, SequenceMetrics};
pub use error_metrics::{
    compute_errors, endpoint_error, region_errors, RegionAverages, RegionMetrics, ERROR_THRESHOLDS,
};
pub use evaluation::{
    average_sequences, collect_sequences, summarize_method, summarize_methods, EmptyRegion,
    MarkerClassifier, MethodSummary, RegionSummary, SequenceClass, SequenceClassifier, Subset,
    SubsetSummary,
};
pub use frame::{load_mask_image, FrameEvaluator, FrameMetrics, Region};
pub use results::{FrameResult, ResultsFile};
pub use table::{render_latex, render_table, render_text, TableFormat};
