use ndarray::{Array1, Array2};

use crate::{MlErr, Result, device::Device};

/// A batch of samples: one flattened input per row of `inputs` and its class index at the same
/// position of `labels`.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    pub inputs: Array2<f32>,
    pub labels: Array1<usize>,
}

impl Batch {
    /// Creates a new `Batch`.
    ///
    /// # Returns
    /// An error if there's not exactly one label per input row.
    pub fn new(inputs: Array2<f32>, labels: Array1<usize>) -> Result<Self> {
        if inputs.nrows() != labels.len() {
            return Err(MlErr::ShapeMismatch {
                what: "labels per batch",
                got: labels.len(),
                expected: inputs.nrows(),
            });
        }

        Ok(Self { inputs, labels })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Moves the batch onto `device`.
    pub fn to_device(self, device: Device) -> Result<Self> {
        device.ensure_available()?;
        Ok(self)
    }
}

/// The batches of a single pass over a source.
pub type Batches<'a> = Box<dyn Iterator<Item = Result<Batch>> + 'a>;

/// A finite, restartable sequence of batches.
pub trait BatchSource {
    /// Returns the amount of batches a full pass yields.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Starts a new pass over the source.
    fn batches(&mut self) -> Batches<'_>;
}

impl BatchSource for Vec<Batch> {
    fn len(&self) -> usize {
        self.as_slice().len()
    }

    fn batches(&mut self) -> Batches<'_> {
        Box::new(self.iter().cloned().map(Ok))
    }
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;

    #[test]
    fn batch_requires_one_label_per_row() {
        assert!(Batch::new(array![[1., 2.], [3., 4.]], array![0, 1]).is_ok());
        assert!(Batch::new(array![[1., 2.], [3., 4.]], array![0]).is_err());
    }

    #[test]
    fn vec_source_is_restartable() {
        let mut source = vec![
            Batch::new(array![[1.]], array![0]).unwrap(),
            Batch::new(array![[2.]], array![1]).unwrap(),
        ];

        assert_eq!(BatchSource::len(&source), 2);
        assert_eq!(source.batches().count(), 2);
        assert_eq!(source.batches().count(), 2);
    }
}
