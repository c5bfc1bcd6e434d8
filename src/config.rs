//! Evaluation configuration.

use crate::metrics::MarkerClassifier;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// What to do when a single frame cannot be evaluated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Fail the whole run on the first bad frame.
    #[default]
    Abort,
    /// Log the frame and leave it out of every sum.
    Skip,
}

/// Names of the first-level dataset directories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetLayout {
    /// Image sequences.
    pub images: String,
    /// Ground-truth `.flo` files.
    pub gt_flow: String,
    /// Foreground/background mask images.
    pub masks: String,
}

impl Default for DatasetLayout {
    fn default() -> Self {
        Self {
            images: "clean".to_string(),
            gt_flow: "flow".to_string(),
            masks: "occlusions".to_string(),
        }
    }
}

/// Configuration of an evaluation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationConfig {
    /// Ground-truth flow magnitudes above this are treated as invalid.
    pub magnitude_cutoff: f32,

    /// Gray intensity (0-255) separating foreground (at or below) from background.
    pub mask_threshold: f32,

    /// Sequences whose name contains any of these are left out entirely.
    pub exclude_markers: Vec<String>,

    /// Sequences whose name contains any of these form the dynamic subset.
    pub dynamic_markers: Vec<String>,

    /// Handling of frames that fail to load.
    pub failure_policy: FailurePolicy,

    /// Dataset directory names.
    pub layout: DatasetLayout,

    /// Worker threads for frame evaluation (None = rayon default).
    pub threads: Option<usize>,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            magnitude_cutoff: 900.0,
            mask_threshold: 0.5,
            exclude_markers: vec!["_dyn".to_string()],
            dynamic_markers: vec!["_hDyn".to_string()],
            failure_policy: FailurePolicy::Abort,
            layout: DatasetLayout::default(),
            threads: None,
        }
    }
}

impl EvaluationConfig {
    /// Load a configuration from a JSON file; missing fields take defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|e| {
            Error::IoError(std::io::Error::new(
                e.kind(),
                format!("failed to read config file '{}': {}", path.display(), e),
            ))
        })?;
        let config: Self = serde_json::from_str(&json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<()> {
        if !self.magnitude_cutoff.is_finite() || self.magnitude_cutoff <= 0.0 {
            return Err(Error::InvalidConfig(format!(
                "magnitude_cutoff must be positive and finite, got {}",
                self.magnitude_cutoff
            )));
        }

        if !(0.0..=255.0).contains(&self.mask_threshold) {
            return Err(Error::InvalidConfig(format!(
                "mask_threshold must be within [0, 255], got {}",
                self.mask_threshold
            )));
        }

        if self
            .exclude_markers
            .iter()
            .chain(&self.dynamic_markers)
            .any(|m| m.is_empty())
        {
            return Err(Error::InvalidConfig(
                "sequence markers must not be empty".to_string(),
            ));
        }

        if self.threads == Some(0) {
            return Err(Error::InvalidConfig(
                "threads must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    /// Sequence classifier built from the configured markers.
    pub fn classifier(&self) -> MarkerClassifier {
        MarkerClassifier::new(self.exclude_markers.clone(), self.dynamic_markers.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults_are_valid() {
        let config = EvaluationConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.magnitude_cutoff, 900.0);
        assert_eq!(config.failure_policy, FailurePolicy::Abort);
    }

    #[test]
    fn test_from_file_partial() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"{{ "failure_policy": "skip", "dynamic_markers": ["_moving"], "layout": {{ "images": "images" }} }}"#
        )
        .unwrap();

        let config = EvaluationConfig::from_file(file.path()).unwrap();
        assert_eq!(config.failure_policy, FailurePolicy::Skip);
        assert_eq!(config.dynamic_markers, vec!["_moving".to_string()]);
        assert_eq!(config.layout.images, "images");
        assert_eq!(config.layout.gt_flow, "flow");
        assert_eq!(config.magnitude_cutoff, 900.0);
    }

    #[test]
    fn test_invalid_values() {
        let mut config = EvaluationConfig::default();
        config.magnitude_cutoff = -1.0;
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));

        let mut config = EvaluationConfig::default();
        config.exclude_markers.push(String::new());
        assert!(config.validate().is_err());

        let mut config = EvaluationConfig::default();
        config.threads = Some(0);
        assert!(config.validate().is_err());

        let mut config = EvaluationConfig::default();
        config.mask_threshold = 300.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_malformed_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "not json").unwrap();
        assert!(matches!(
            EvaluationConfig::from_file(file.path()),
            Err(Error::Serialization(_))
        ));
    }
}
