use std::{num::NonZeroUsize, path::Path};

use log::debug;
use ndarray::Axis;
use rand::{SeedableRng, rngs::StdRng, seq::SliceRandom};

use super::{Batch, BatchSource, Batches, Decode, ImageFolder, InMemoryDataset};
use crate::{MlErr, Result};

/// Splits a dataset into batches of `batch_size` samples, the last one possibly smaller.
///
/// A shuffling loader draws a new sample order at the start of every pass, a plain one always
/// yields the samples in dataset order.
#[derive(Debug, Clone)]
pub struct DataLoader {
    dataset: InMemoryDataset,
    batch_size: NonZeroUsize,
    // Drives the per-pass shuffles, a loader without one keeps dataset order.
    rng: Option<StdRng>,
    order: Vec<usize>,
}

impl DataLoader {
    /// Creates a loader that yields the samples in dataset order.
    pub fn new(dataset: InMemoryDataset, batch_size: NonZeroUsize) -> Self {
        Self::build(dataset, batch_size, None)
    }

    /// Creates a loader that reshuffles the samples on every pass.
    ///
    /// # Arguments
    /// * `dataset` - The samples to batch.
    /// * `batch_size` - The maximum amount of samples per batch.
    /// * `rng` - The random number generator driving the shuffles.
    pub fn shuffled(dataset: InMemoryDataset, batch_size: NonZeroUsize, rng: StdRng) -> Self {
        Self::build(dataset, batch_size, Some(rng))
    }

    fn build(dataset: InMemoryDataset, batch_size: NonZeroUsize, rng: Option<StdRng>) -> Self {
        let order = (0..dataset.len()).collect();

        Self {
            dataset,
            batch_size,
            rng,
            order,
        }
    }

    #[inline]
    pub fn dataset(&self) -> &InMemoryDataset {
        &self.dataset
    }

    #[inline]
    pub fn batch_size(&self) -> usize {
        self.batch_size.get()
    }

    /// Whether every pass draws a new sample order.
    #[inline]
    pub fn is_shuffled(&self) -> bool {
        self.rng.is_some()
    }
}

impl BatchSource for DataLoader {
    fn len(&self) -> usize {
        self.dataset.len().div_ceil(self.batch_size.get())
    }

    fn batches(&mut self) -> Batches<'_> {
        if let Some(rng) = &mut self.rng {
            self.order.shuffle(rng);
        }

        let dataset = &self.dataset;
        let batches = self.order.chunks(self.batch_size.get()).map(move |idxs| {
            let inputs = dataset.inputs().select(Axis(0), idxs);
            let labels = dataset.labels().select(Axis(0), idxs);
            Batch::new(inputs, labels)
        });

        Box::new(batches)
    }
}

/// Creates the train and test loaders for an image-folder dataset.
///
/// The train loader reshuffles on every pass, the test loader doesn't.
///
/// # Arguments
/// * `train_dir` - The root of the train split, one subdirectory per class.
/// * `test_dir` - The root of the test split, with the same class subdirectories.
/// * `decoder` - How to turn a sample file into a flat tensor.
/// * `batch_size` - The maximum amount of samples per batch.
/// * `num_workers` - How many threads decode samples, all CPUs if `None`.
/// * `seed` - The seed for the train shuffles, drawn from the OS if `None`.
///
/// # Returns
/// The train loader, the test loader and the class names indexed by label.
pub fn create_dataloaders<D: Decode>(
    train_dir: impl AsRef<Path>,
    test_dir: impl AsRef<Path>,
    decoder: &D,
    batch_size: NonZeroUsize,
    num_workers: Option<NonZeroUsize>,
    seed: Option<u64>,
) -> Result<(DataLoader, DataLoader, Vec<String>)> {
    let train_data = ImageFolder::scan(train_dir)?.load(decoder, num_workers)?;
    let test_data = ImageFolder::scan(test_dir)?.load(decoder, num_workers)?;

    if train_data.classes() != test_data.classes() {
        return Err(MlErr::Dataset(format!(
            "train classes {:?} don't match test classes {:?}",
            train_data.classes(),
            test_data.classes()
        )));
    }

    if train_data.features() != test_data.features() {
        return Err(MlErr::ShapeMismatch {
            what: "test sample length",
            got: test_data.features(),
            expected: train_data.features(),
        });
    }

    let class_names = train_data.classes().to_vec();
    debug!(
        "created dataloaders: classes={} train_samples={} test_samples={} batch_size={}",
        class_names.len(),
        train_data.len(),
        test_data.len(),
        batch_size
    );

    let rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    let train_loader = DataLoader::shuffled(train_data, batch_size, rng);
    let test_loader = DataLoader::new(test_data, batch_size);

    Ok((train_loader, test_loader, class_names))
}
