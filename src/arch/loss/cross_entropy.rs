use ndarray::{Array2, ArrayView1, ArrayView2, Axis};

use super::{LossFn, check_labels};
use crate::Result;

/// Softmax followed by the negative log likelihood of the true class, averaged over the batch.
#[derive(Debug, Default, Clone, Copy)]
pub struct CrossEntropy;

impl CrossEntropy {
    /// Returns a new `CrossEntropy`.
    pub fn new() -> Self {
        Self
    }
}

/// Row-wise softmax, shifted by each row's maximum.
pub fn softmax(logits: ArrayView2<f32>) -> Array2<f32> {
    let mut out = logits.to_owned();

    for mut row in out.axis_iter_mut(Axis(0)) {
        let max = row.fold(f32::NEG_INFINITY, |m, &v| m.max(v));
        row.mapv_inplace(|v| (v - max).exp());
        let sum = row.sum();
        row /= sum;
    }

    out
}

impl LossFn for CrossEntropy {
    fn loss(&self, logits: ArrayView2<f32>, labels: ArrayView1<usize>) -> Result<f32> {
        check_labels(logits, labels)?;

        let n = logits.nrows();
        if n == 0 {
            return Ok(0.);
        }

        let total: f32 = logits
            .axis_iter(Axis(0))
            .zip(labels)
            .map(|(row, &label)| {
                let max = row.fold(f32::NEG_INFINITY, |m, &v| m.max(v));
                let log_sum_exp = row.mapv(|v| (v - max).exp()).sum().ln() + max;
                log_sum_exp - row[label]
            })
            .sum();

        Ok(total / n as f32)
    }

    fn loss_prime(
        &self,
        logits: ArrayView2<f32>,
        labels: ArrayView1<usize>,
    ) -> Result<Array2<f32>> {
        check_labels(logits, labels)?;

        let n = logits.nrows().max(1) as f32;
        let mut d = softmax(logits);

        for (mut row, &label) in d.axis_iter_mut(Axis(0)).zip(labels) {
            row[label] -= 1.;
        }

        d /= n;
        Ok(d)
    }
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;
    use crate::MlErr;

    #[test]
    fn softmax_rows_sum_to_one() {
        let p = softmax(array![[1., 2., 3.], [1000., 1000., 1000.]].view());

        for row in p.axis_iter(Axis(0)) {
            assert!((row.sum() - 1.).abs() < 1e-6);
        }
        assert!((p[[1, 0]] - 1. / 3.).abs() < 1e-6);
    }

    #[test]
    fn uniform_logits_cost_log_classes() {
        let logits = array![[0., 0.], [0., 0.]];
        let labels = array![0, 1];

        let loss = CrossEntropy.loss(logits.view(), labels.view()).unwrap();

        assert!((loss - 2f32.ln()).abs() < 1e-6);
    }

    #[test]
    fn gradient_is_softmax_minus_one_hot() {
        let logits = array![[0., 0.]];
        let labels = array![1];

        let d = CrossEntropy.loss_prime(logits.view(), labels.view()).unwrap();

        assert_eq!(d, array![[0.5, -0.5]]);
    }

    #[test]
    fn rejects_out_of_range_labels() {
        let logits = array![[0., 0.]];
        let labels = array![2];

        let err = CrossEntropy.loss(logits.view(), labels.view()).unwrap_err();
        assert!(matches!(
            err,
            MlErr::LabelOutOfRange {
                label: 2,
                num_classes: 2
            }
        ));
    }

    #[test]
    fn rejects_misaligned_labels() {
        let logits = array![[0., 0.], [1., 1.]];
        let labels = array![0];

        assert!(CrossEntropy.loss(logits.view(), labels.view()).is_err());
    }
}
