use serde::Serialize;

use super::EpochMetrics;

/// The per-epoch metrics of a training run, in epoch order.
///
/// The four series always have the same length, one entry per completed epoch.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct History {
    train_loss: Vec<f32>,
    train_acc: Vec<f32>,
    test_loss: Vec<f32>,
    test_acc: Vec<f32>,
}

impl History {
    pub fn with_capacity(epochs: usize) -> Self {
        Self {
            train_loss: Vec::with_capacity(epochs),
            train_acc: Vec::with_capacity(epochs),
            test_loss: Vec::with_capacity(epochs),
            test_acc: Vec::with_capacity(epochs),
        }
    }

    /// Records the metrics of one more epoch.
    pub(crate) fn push(&mut self, train: EpochMetrics, test: EpochMetrics) {
        self.train_loss.push(train.loss);
        self.train_acc.push(train.accuracy);
        self.test_loss.push(test.loss);
        self.test_acc.push(test.accuracy);
    }

    /// Returns the amount of recorded epochs.
    pub fn len(&self) -> usize {
        self.train_loss.len()
    }

    pub fn is_empty(&self) -> bool {
        self.train_loss.is_empty()
    }

    pub fn train_loss(&self) -> &[f32] {
        &self.train_loss
    }

    pub fn train_acc(&self) -> &[f32] {
        &self.train_acc
    }

    pub fn test_loss(&self) -> &[f32] {
        &self.test_loss
    }

    pub fn test_acc(&self) -> &[f32] {
        &self.test_acc
    }
}
