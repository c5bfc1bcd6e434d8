//! Discovery of evaluable frame pairs in a dataset directory tree.
//!
//! Expected layout (names of the first-level directories come from
//! [`DatasetLayout`]):
//!
//! ```text
//! <dataset>/<images>/<sequence>/<frame>.png
//! <dataset>/<gt_flow>/<sequence>/<frame>.flo
//! <dataset>/<masks>/<sequence>/<frame>.png
//! <estimates>/<method>/<sequence>/<frame>.flo
//! ```
//!
//! Every pair of consecutive images in a sequence yields one [`FrameRecord`];
//! the flow and mask files are named after the first image of the pair.

use crate::{DatasetLayout, Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// One evaluable frame pair and the files belonging to it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameRecord {
    /// First image of the pair.
    pub prev_image: PathBuf,
    /// Second image of the pair.
    pub curr_image: PathBuf,
    /// Ground-truth flow from `prev_image` to `curr_image`.
    pub gt_flow: Option<PathBuf>,
    /// Estimated flow from `prev_image` to `curr_image`.
    pub est_flow: Option<PathBuf>,
    /// Foreground/background mask image.
    pub mask: Option<PathBuf>,
    /// Sequence (directory) name.
    pub sequence: String,
    /// File stem of `prev_image`.
    pub filename: String,
    /// Dataset root directory.
    pub base_path: PathBuf,
    /// Directory holding this sequence's estimated flow files.
    pub estimate_path: Option<PathBuf>,
    /// Name of the evaluated flow method.
    pub method: String,
}

/// Root directories of one method's evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetPaths {
    /// Dataset root directory.
    pub base_path: PathBuf,
    /// Directory whose sub-directories are the image sequences.
    pub images: PathBuf,
    /// Ground-truth flow root, if available.
    pub gt_flow: Option<PathBuf>,
    /// Estimated flow root of the method, if available.
    pub estimate: Option<PathBuf>,
    /// Mask image root, if available.
    pub masks: Option<PathBuf>,
    /// Name of the evaluated flow method.
    pub method: String,
}

impl DatasetPaths {
    /// Resolve all roots of a dataset following `layout`.
    ///
    /// # Arguments
    /// * `dataset_root` - Directory containing images, ground truth and masks
    /// * `estimates_root` - Directory containing one sub-directory per method
    /// * `method` - Name of the method to evaluate
    /// * `layout` - Names of the first-level dataset directories
    pub fn new<P1: AsRef<Path>, P2: AsRef<Path>>(
        dataset_root: P1,
        estimates_root: P2,
        method: &str,
        layout: &DatasetLayout,
    ) -> Self {
        let root = dataset_root.as_ref();
        Self {
            base_path: root.to_path_buf(),
            images: root.join(&layout.images),
            gt_flow: Some(root.join(&layout.gt_flow)),
            estimate: Some(estimates_root.as_ref().join(method)),
            masks: Some(root.join(&layout.masks)),
            method: method.to_string(),
        }
    }
}

/// List all frame pairs of a dataset.
///
/// Sequences are visited in name order and images within a sequence in path
/// order, so the output is deterministic.
pub fn discover_frames(paths: &DatasetPaths) -> Result<Vec<FrameRecord>> {
    let mut records = Vec::new();

    for (sequence, dir) in list_sequences(&paths.images)? {
        let images = list_images(&dir)?;
        if images.len() < 2 {
            log::debug!("sequence '{}' has fewer than two frames, skipping", sequence);
            continue;
        }

        for pair in images.windows(2) {
            let (prev, curr) = (&pair[0], &pair[1]);
            let filename = prev
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();

            let estimate_path = paths.estimate.as_ref().map(|root| root.join(&sequence));
            records.push(FrameRecord {
                prev_image: prev.clone(),
                curr_image: curr.clone(),
                gt_flow: paths
                    .gt_flow
                    .as_ref()
                    .map(|root| root.join(&sequence).join(format!("{}.flo", filename))),
                est_flow: estimate_path
                    .as_ref()
                    .map(|dir| dir.join(format!("{}.flo", filename))),
                mask: paths
                    .masks
                    .as_ref()
                    .map(|root| root.join(&sequence).join(format!("{}.png", filename))),
                sequence: sequence.clone(),
                filename,
                base_path: paths.base_path.clone(),
                estimate_path,
                method: paths.method.clone(),
            });
        }
    }

    log::info!(
        "discovered {} frame pairs for method '{}' in {}",
        records.len(),
        paths.method,
        paths.images.display()
    );
    Ok(records)
}

/// Immediate sub-directories of `images`, sorted by name.
fn list_sequences(images: &Path) -> Result<Vec<(String, PathBuf)>> {
    let entries = fs::read_dir(images).map_err(|e| Error::load(images, e))?;

    let mut sequences = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| Error::load(images, e))?;
        let path = entry.path();
        if path.is_dir() {
            sequences.push((entry.file_name().to_string_lossy().into_owned(), path));
        }
    }
    sequences.sort();
    Ok(sequences)
}

/// `*.png` files directly inside `dir`, sorted by path.
fn list_images(dir: &Path) -> Result<Vec<PathBuf>> {
    let dir_str = dir
        .to_str()
        .ok_or_else(|| Error::load(dir, "path is not valid UTF-8"))?;
    let pattern = format!("{}/*.png", glob::Pattern::escape(dir_str));

    let mut images = Vec::new();
    for entry in glob::glob(&pattern).map_err(|e| Error::load(dir, e))? {
        images.push(entry.map_err(|e| Error::load(dir, e))?);
    }
    images.sort();
    Ok(images)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        File::create(path).unwrap();
    }

    #[test]
    fn test_pairs_consecutive_frames() {
        let dir = tempfile::tempdir().unwrap();
        let layout = DatasetLayout::default();
        let images = dir.path().join(&layout.images);
        for seq in ["b_seq", "a_seq"] {
            for i in 1..=3 {
                touch(&images.join(seq).join(format!("frame_{:04}.png", i)));
            }
        }
        touch(&images.join("a_seq").join("notes.txt"));

        let paths = DatasetPaths::new(dir.path(), dir.path().join("est"), "ACPM", &layout);
        let records = discover_frames(&paths).unwrap();

        assert_eq!(records.len(), 4);
        assert_eq!(records[0].sequence, "a_seq");
        assert_eq!(records[0].filename, "frame_0001");
        assert_eq!(records[1].filename, "frame_0002");
        assert_eq!(records[2].sequence, "b_seq");
        assert!(records[0].curr_image.ends_with("a_seq/frame_0002.png"));

        let first = &records[0];
        assert_eq!(
            first.gt_flow.as_deref(),
            Some(dir.path().join("flow/a_seq/frame_0001.flo").as_path())
        );
        assert_eq!(
            first.est_flow.as_deref(),
            Some(dir.path().join("est/ACPM/a_seq/frame_0001.flo").as_path())
        );
        assert_eq!(
            first.mask.as_deref(),
            Some(dir.path().join("occlusions/a_seq/frame_0001.png").as_path())
        );
        assert_eq!(first.method, "ACPM");
    }

    #[test]
    fn test_single_frame_sequence_yields_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let layout = DatasetLayout::default();
        touch(&dir.path().join(&layout.images).join("lonely").join("frame_0001.png"));

        let paths = DatasetPaths::new(dir.path(), dir.path(), "m", &layout);
        assert!(discover_frames(&paths).unwrap().is_empty());
    }

    #[test]
    fn test_missing_images_dir_is_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let paths = DatasetPaths::new(dir.path(), dir.path(), "m", &DatasetLayout::default());
        assert!(matches!(discover_frames(&paths), Err(Error::Load { .. })));
    }
}
