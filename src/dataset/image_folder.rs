use std::{
    fs,
    num::NonZeroUsize,
    path::{Path, PathBuf},
};

use log::{debug, warn};
use ndarray::{Array1, Array2};
use rayon::{ThreadPoolBuilder, prelude::*};

use super::{Decode, InMemoryDataset};
use crate::{MlErr, Result};

/// A dataset laid out as `root/<class>/<sample>`.
///
/// Classes are the subdirectories of `root` sorted by name, and a sample's label is the index of
/// the class directory it was found under. Nested directories inside a class are walked too.
#[derive(Debug, Clone)]
pub struct ImageFolder {
    root: PathBuf,
    classes: Vec<String>,
    files: Vec<(PathBuf, usize)>,
}

impl ImageFolder {
    /// Indexes the class directories and every file under them, without reading any sample.
    ///
    /// # Returns
    /// An error if `root` can't be read or has no class subdirectories.
    pub fn scan(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();

        let mut classes = Vec::new();
        for entry in fs::read_dir(&root)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                classes.push(entry.file_name().to_string_lossy().into_owned());
            }
        }

        if classes.is_empty() {
            return Err(MlErr::Dataset(format!(
                "couldn't find any class folder in '{}'",
                root.display()
            )));
        }

        classes.sort();

        let mut files = Vec::new();
        for (label, class) in classes.iter().enumerate() {
            let mut class_files = Vec::new();
            walk(&root.join(class), &mut class_files)?;
            class_files.sort();
            files.extend(class_files.into_iter().map(|path| (path, label)));
        }

        Ok(Self {
            root,
            classes,
            files,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the class names, indexed by label.
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Decodes every sample the decoder accepts, on `num_workers` threads (all CPUs if `None`).
    ///
    /// # Returns
    /// The decoded dataset, or an error if no sample was accepted, a sample fails to decode or
    /// the samples don't all have the same length.
    pub fn load<D: Decode>(
        &self,
        decoder: &D,
        num_workers: Option<NonZeroUsize>,
    ) -> Result<InMemoryDataset> {
        let (samples, skipped): (Vec<_>, Vec<_>) = self
            .files
            .iter()
            .partition(|(path, _)| decoder.accepts(path));

        for (path, _) in &skipped {
            warn!("skipping unsupported file '{}'", path.display());
        }

        if samples.is_empty() {
            return Err(MlErr::Dataset(format!(
                "found no valid sample for the classes {:?} in '{}'",
                self.classes,
                self.root.display()
            )));
        }

        let pool = ThreadPoolBuilder::new()
            .num_threads(num_workers.map_or(0, NonZeroUsize::get))
            .build()
            .map_err(|e| MlErr::Dataset(format!("failed to start the loading pool: {e}")))?;

        let decoded: Vec<Vec<f32>> = pool.install(|| {
            samples
                .par_iter()
                .map(|(path, _)| decoder.decode(path))
                .collect::<Result<_>>()
        })?;

        let features = decoded[0].len();
        if let Some((i, sample)) = decoded
            .iter()
            .enumerate()
            .find(|(_, sample)| sample.len() != features)
        {
            return Err(MlErr::Decode {
                path: samples[i].0.clone(),
                reason: format!(
                    "decoded {} values, other samples have {features}",
                    sample.len()
                ),
            });
        }

        let n = decoded.len();
        let data = decoded.concat();
        let got = data.len();
        let inputs =
            Array2::from_shape_vec((n, features), data).map_err(|_| MlErr::ShapeMismatch {
                what: "decoded samples",
                got,
                expected: n * features,
            })?;
        let labels = Array1::from_iter(samples.iter().map(|&&(_, label)| label));

        debug!(
            "loaded image folder '{}': samples={n} features={features} classes={}",
            self.root.display(),
            self.classes.len()
        );

        InMemoryDataset::new(inputs, labels, self.classes.clone())
    }
}

/// Collects every file under `dir`, recursively.
fn walk(dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();

        if path.is_dir() {
            walk(&path, files)?;
        } else {
            files.push(path);
        }
    }

    Ok(())
}
