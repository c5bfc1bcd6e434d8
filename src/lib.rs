//! # floweval - Optical Flow Evaluation
//!
//! Evaluates estimated optical flow fields against ground truth for datasets of
//! short image sequences, following the CrowdFlow evaluation protocol.
//!
//! ## Features
//!
//! - Bit-exact `.flo` reader/writer
//! - Endpoint error (EPE) and R1/R2/R3 threshold counts per region
//! - Foreground / background / total segmentation from mask images
//! - Pixel-weighted per-sequence averaging, unweighted per-method averaging
//!   split into static and dynamic sequences
//! - LaTeX and plain-text result tables
//!
//! ## Example
//!
//! ```rust,ignore
//! use floweval_rs::metrics::render_text;
//! use floweval_rs::{discover_frames, summarize_methods, DatasetPaths, EvaluationConfig, Evaluator};
//!
//! let config = EvaluationConfig::default();
//! let paths = DatasetPaths::new("CrowdFlow", "estimates", "ACPM", &config.layout);
//! let records = discover_frames(&paths).unwrap();
//!
//! let run = Evaluator::new(config.clone()).unwrap().evaluate(&records).unwrap();
//! let summaries = summarize_methods(&run.results, &config.classifier());
//! println!("{}", render_text(&summaries));
//! ```

// Internal modules (ports of the image-processing primitives the protocol relies on)
pub(crate) mod internal;

// Public modules
pub mod config;
pub mod discovery;
pub mod flo;
pub mod flow_field;
pub mod mask;
pub mod metrics;
pub mod pipeline;
pub mod utils;
pub mod visualize;

// Re-exports for convenience
pub use config::{DatasetLayout, EvaluationConfig, FailurePolicy};
pub use discovery::{discover_frames, DatasetPaths, FrameRecord};
pub use flo::{read_flow_file, write_flow_file, FLO_MAGIC};
pub use flow_field::FlowField;
pub use mask::Mask;
pub use metrics::{
    summarize_methods, FrameEvaluator, FrameMetrics, MarkerClassifier, MethodSummary,
    RegionMetrics, SequenceClass, SequenceClassifier, SequenceMetrics,
};
pub use pipeline::{EvaluationRun, Evaluator};

// Error types
pub use crate::error::{Error, Result};

mod error {
    use thiserror::Error;

    /// Errors that can occur while evaluating optical flow.
    #[derive(Error, Debug)]
    pub enum Error {
        #[error("Invalid configuration: {0}")]
        InvalidConfig(String),

        #[error("Invalid .flo file '{path}': magic number {magic} does not match 202021.25")]
        FlowFormat { path: String, magic: f32 },

        #[error("Invalid shape: expected {expected}, got {got}")]
        InvalidShape { expected: String, got: String },

        #[error("Failed to load '{path}': {reason}")]
        Load { path: String, reason: String },

        #[error("IO error: {0}")]
        IoError(#[from] std::io::Error),

        #[error("Serialization error: {0}")]
        Serialization(#[from] serde_json::Error),
    }

    impl Error {
        /// Whether the error belongs to a single frame record (bad or missing
        /// input files) rather than to the run as a whole.
        pub fn is_frame_local(&self) -> bool {
            matches!(
                self,
                Error::FlowFormat { .. } | Error::InvalidShape { .. } | Error::Load { .. }
            )
        }

        pub(crate) fn load(path: impl AsRef<std::path::Path>, reason: impl ToString) -> Self {
            Error::Load {
                path: path.as_ref().display().to_string(),
                reason: reason.to_string(),
            }
        }
    }

    /// Result type for floweval operations
    pub type Result<T> = std::result::Result<T, Error>;
}
