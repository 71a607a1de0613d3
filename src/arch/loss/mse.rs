use ndarray::{Array2, ArrayView1, ArrayView2};

use super::{LossFn, check_labels};
use crate::Result;

/// Mean squared error between the logits and the one-hot encoding of the labels.
#[derive(Debug, Default, Clone, Copy)]
pub struct Mse;

impl Mse {
    /// Returns a new `Mse`.
    pub fn new() -> Self {
        Self
    }

    fn diff(logits: ArrayView2<f32>, labels: ArrayView1<usize>) -> Array2<f32> {
        let mut diff = logits.to_owned();

        for (i, &label) in labels.iter().enumerate() {
            diff[[i, label]] -= 1.;
        }

        diff
    }
}

impl LossFn for Mse {
    fn loss(&self, logits: ArrayView2<f32>, labels: ArrayView1<usize>) -> Result<f32> {
        check_labels(logits, labels)?;

        let loss = Self::diff(logits, labels)
            .mapv(|x| x.powi(2))
            .mean()
            .unwrap_or_default();

        Ok(loss)
    }

    fn loss_prime(
        &self,
        logits: ArrayView2<f32>,
        labels: ArrayView1<usize>,
    ) -> Result<Array2<f32>> {
        check_labels(logits, labels)?;

        let len = logits.len().max(1) as f32;
        Ok(Self::diff(logits, labels) * (2.0 / len))
    }
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;

    #[test]
    fn perfect_one_hot_costs_nothing() {
        let logits = array![[1., 0.], [0., 1.]];
        let labels = array![0, 1];

        assert_eq!(Mse.loss(logits.view(), labels.view()).unwrap(), 0.);
    }

    #[test]
    fn loss_and_gradient() {
        let logits = array![[0., 0.]];
        let labels = array![0];

        assert_eq!(Mse.loss(logits.view(), labels.view()).unwrap(), 0.5);
        assert_eq!(
            Mse.loss_prime(logits.view(), labels.view()).unwrap(),
            array![[-1., 0.]]
        );
    }
}
