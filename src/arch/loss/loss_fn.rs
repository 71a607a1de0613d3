use ndarray::{Array2, ArrayView1, ArrayView2};

use crate::{MlErr, Result};

/// A loss over a batch of logits and their integer class labels.
pub trait LossFn {
    /// Returns the scalar loss of the batch.
    fn loss(&self, logits: ArrayView2<f32>, labels: ArrayView1<usize>) -> Result<f32>;

    /// Returns the derivative of `loss` with respect to every logit.
    fn loss_prime(&self, logits: ArrayView2<f32>, labels: ArrayView1<usize>)
    -> Result<Array2<f32>>;
}

/// Checks that there's one label per row of `logits` and that every label names a column.
pub(crate) fn check_labels(logits: ArrayView2<f32>, labels: ArrayView1<usize>) -> Result<()> {
    if logits.nrows() != labels.len() {
        return Err(MlErr::ShapeMismatch {
            what: "labels per batch",
            got: labels.len(),
            expected: logits.nrows(),
        });
    }

    let num_classes = logits.ncols();
    if let Some(&label) = labels.iter().find(|&&label| label >= num_classes) {
        return Err(MlErr::LabelOutOfRange { label, num_classes });
    }

    Ok(())
}
