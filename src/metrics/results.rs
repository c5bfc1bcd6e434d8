//! Persistence of per-frame evaluation results.

use super::frame::FrameMetrics;
use crate::discovery::FrameRecord;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

/// Metrics of one evaluated frame together with the record it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameResult {
    pub record: FrameRecord,
    pub metrics: FrameMetrics,
}

/// All per-frame results of a run, as stored on disk.
///
/// Stored as JSON so a run can be re-aggregated and re-rendered later
/// without evaluating the flow files again.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultsFile {
    pub result: Vec<FrameResult>,
}

impl ResultsFile {
    pub fn new(result: Vec<FrameResult>) -> Self {
        Self { result }
    }

    /// Write the results as pretty-printed JSON.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| {
            Error::IoError(std::io::Error::new(
                e.kind(),
                format!("failed to create results file '{}': {}", path.display(), e),
            ))
        })?;

        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.flush()?;
        log::info!("saved {} frame results to {}", self.result.len(), path.display());
        Ok(())
    }

    /// Read results written by [`ResultsFile::save`].
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            Error::IoError(std::io::Error::new(
                e.kind(),
                format!("failed to open results file '{}': {}", path.display(), e),
            ))
        })?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }

    /// Number of stored frame results.
    pub fn len(&self) -> usize {
        self.result.len()
    }

    pub fn is_empty(&self) -> bool {
        self.result.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::RegionMetrics;
    use tempfile::NamedTempFile;

    #[test]
    fn test_save_and_load() {
        let file = NamedTempFile::new().unwrap();
        let region = RegionMetrics {
            ee: 12.5,
            r1: 4.0,
            r2: 3.0,
            r3: 1.0,
            no_points: 100.0,
        };
        let results = ResultsFile::new(vec![FrameResult {
            record: FrameRecord {
                sequence: "IM01_hDyn".to_string(),
                filename: "frame_0001".to_string(),
                method: "ACPM".to_string(),
                gt_flow: Some("flow/IM01_hDyn/frame_0001.flo".into()),
                ..Default::default()
            },
            metrics: FrameMetrics {
                fg: region,
                bg: region,
                total: region + region,
            },
        }]);

        results.save(file.path()).unwrap();
        let loaded = ResultsFile::load(file.path()).unwrap();

        assert_eq!(loaded, results);
        assert_eq!(loaded.len(), 1);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            ResultsFile::load(dir.path().join("nope.json")),
            Err(Error::IoError(_))
        ));
    }
}
