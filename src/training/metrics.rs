use ndarray::{ArrayView1, ArrayView2, Axis};
use serde::Serialize;

use crate::{
    MlErr, Result,
    arch::loss::{check_labels, softmax},
};

/// The loss and accuracy of a full pass over a batch source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct EpochMetrics {
    pub loss: f32,
    pub accuracy: f32,
}

impl EpochMetrics {
    /// Averages per-batch sums over the amount of batches.
    ///
    /// Every batch weighs the same regardless of its size, so a smaller last batch skews the
    /// means slightly.
    ///
    /// # Returns
    /// `MlErr::EmptyBatchSource` if no batch was seen.
    pub(crate) fn average(loss_sum: f32, accuracy_sum: f32, num_batches: usize) -> Result<Self> {
        if num_batches == 0 {
            return Err(MlErr::EmptyBatchSource);
        }

        let n = num_batches as f32;
        Ok(Self {
            loss: loss_sum / n,
            accuracy: accuracy_sum / n,
        })
    }
}

/// The fraction of rows whose most likely class, after a softmax, is the label.
///
/// # Returns
/// An error if the labels don't match the logits or the batch is empty.
pub fn accuracy(logits: ArrayView2<f32>, labels: ArrayView1<usize>) -> Result<f32> {
    check_labels(logits, labels)?;

    if labels.is_empty() {
        return Err(MlErr::ShapeMismatch {
            what: "samples per batch",
            got: 0,
            expected: 1,
        });
    }

    let probs = softmax(logits);
    let correct = probs
        .axis_iter(Axis(0))
        .zip(labels)
        .filter(|(row, label)| argmax(row.view()) == **label)
        .count();

    Ok(correct as f32 / labels.len() as f32)
}

/// Index of the first maximum of `row`.
fn argmax(row: ArrayView1<f32>) -> usize {
    let mut best = 0;

    for (i, &v) in row.iter().enumerate() {
        if v > row[best] {
            best = i;
        }
    }

    best
}
