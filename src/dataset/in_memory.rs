use ndarray::{Array1, Array2};

use crate::{MlErr, Result};

/// A labeled dataset held in memory: one flattened sample per row of `inputs`.
#[derive(Debug, Clone)]
pub struct InMemoryDataset {
    inputs: Array2<f32>,
    labels: Array1<usize>,
    classes: Vec<String>,
}

impl InMemoryDataset {
    /// Creates a new dataset from owned buffers.
    ///
    /// # Returns
    /// An error if the inputs and labels aren't aligned or a label doesn't name a class.
    pub fn new(inputs: Array2<f32>, labels: Array1<usize>, classes: Vec<String>) -> Result<Self> {
        if inputs.nrows() != labels.len() {
            return Err(MlErr::ShapeMismatch {
                what: "dataset labels",
                got: labels.len(),
                expected: inputs.nrows(),
            });
        }

        let num_classes = classes.len();
        if let Some(&label) = labels.iter().find(|&&label| label >= num_classes) {
            return Err(MlErr::LabelOutOfRange { label, num_classes });
        }

        Ok(Self {
            inputs,
            labels,
            classes,
        })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Returns the length of every flattened sample.
    #[inline]
    pub fn features(&self) -> usize {
        self.inputs.ncols()
    }

    #[inline]
    pub fn inputs(&self) -> &Array2<f32> {
        &self.inputs
    }

    #[inline]
    pub fn labels(&self) -> &Array1<usize> {
        &self.labels
    }

    /// Returns the class names, indexed by label.
    #[inline]
    pub fn classes(&self) -> &[String] {
        &self.classes
    }
}
