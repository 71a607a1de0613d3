use ndarray::{linalg, prelude::*};

use crate::{MlErr, Result, arch::activations::ActFn};

/// A fully connected layer: `a = act_fn(x · W + b)`.
///
/// The layer doesn't own its parameters, it views a slice of the model's flat buffer laid out as
/// the row-major `dim.0 × dim.1` weight matrix followed by the `dim.1` biases.
#[derive(Debug, Clone)]
pub struct Dense {
    dim: (usize, usize),
    act_fn: Option<ActFn>,
    size: usize,

    // Forward metadata, only kept while training and cleared by any uncached forward.
    x: Array2<f32>,
    z: Array2<f32>,
}

impl Dense {
    /// Creates a new `Dense` layer.
    ///
    /// # Arguments
    /// * `dim` - The input and output widths.
    /// * `act_fn` - An optional activation applied to the affine output.
    pub fn new(dim: (usize, usize), act_fn: Option<ActFn>) -> Self {
        let zeros = Array2::zeros((0, 0));

        Self {
            dim,
            size: (dim.0 + 1) * dim.1,
            act_fn,
            x: zeros.clone(),
            z: zeros,
        }
    }

    /// Returns the amount of parameters this layer has.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Returns the input and output widths.
    pub fn dim(&self) -> (usize, usize) {
        self.dim
    }

    /// Computes the layer's output for the batch `x`.
    ///
    /// # Arguments
    /// * `params` - This layer's slice of parameters.
    /// * `x` - The input batch, one sample per row.
    /// * `cache` - Whether to keep the metadata needed by `backward`.
    pub fn forward(
        &mut self,
        params: &[f32],
        x: ArrayView2<f32>,
        cache: bool,
    ) -> Result<Array2<f32>> {
        if x.ncols() != self.dim.0 {
            return Err(MlErr::ShapeMismatch {
                what: "dense layer input features",
                got: x.ncols(),
                expected: self.dim.0,
            });
        }

        let (w, b) = self.view_params(params)?;
        let mut z = x.dot(&w);
        z += &b;

        let a = match &self.act_fn {
            Some(act_fn) => z.mapv(|z| act_fn.f(z)),
            None => z.clone(),
        };

        if cache {
            self.x = x.to_owned();
            self.z = z;
        } else {
            self.x = Array2::zeros((0, 0));
            self.z = Array2::zeros((0, 0));
        }

        Ok(a)
    }

    /// Accumulates this layer's gradient into `grad` and returns the delta for the previous layer.
    ///
    /// # Arguments
    /// * `params` - This layer's slice of parameters.
    /// * `grad` - This layer's slice of the gradient buffer.
    /// * `d` - The derivative of the loss with respect to this layer's output.
    pub fn backward(
        &mut self,
        params: &[f32],
        grad: &mut [f32],
        mut d: Array2<f32>,
    ) -> Result<Array2<f32>> {
        if d.dim() != self.z.dim() {
            return Err(MlErr::ShapeMismatch {
                what: "dense layer delta rows",
                got: d.nrows(),
                expected: self.z.nrows(),
            });
        }

        if let Some(act_fn) = &self.act_fn {
            d.zip_mut_with(&self.z, |d, &z| *d *= act_fn.df(z));
        }

        let (mut dw, mut db) = self.view_grad(grad)?;
        linalg::general_mat_mul(1.0, &self.x.t(), &d, 1.0, &mut dw);
        db += &d.sum_axis(Axis(0));

        let (w, _) = self.view_params(params)?;
        Ok(d.dot(&w.t()))
    }

    /// Gives a view of the raw gradient slice as the delta weights and delta biases of this layer.
    fn view_grad<'a>(
        &self,
        grad: &'a mut [f32],
    ) -> Result<(ArrayViewMut2<'a, f32>, ArrayViewMut1<'a, f32>)> {
        self.check_len("dense layer gradient", grad.len())?;

        let w_size = self.size - self.dim.1;
        let (dw_raw, db_raw) = grad.split_at_mut(w_size);
        let dw = ArrayViewMut2::from_shape(self.dim, dw_raw).map_err(|_| self.mismatch(w_size))?;
        let db = ArrayViewMut1::from(db_raw);
        Ok((dw, db))
    }

    /// Gives a view of the raw parameter slice as the weights and biases of this layer.
    fn view_params<'a>(&self, params: &'a [f32]) -> Result<(ArrayView2<'a, f32>, ArrayView1<'a, f32>)> {
        self.check_len("dense layer parameters", params.len())?;

        let w_size = self.size - self.dim.1;
        let (w_raw, b_raw) = params.split_at(w_size);
        let w = ArrayView2::from_shape(self.dim, w_raw).map_err(|_| self.mismatch(w_size))?;
        let b = ArrayView1::from(b_raw);
        Ok((w, b))
    }

    fn check_len(&self, what: &'static str, got: usize) -> Result<()> {
        if got != self.size {
            return Err(MlErr::ShapeMismatch {
                what,
                got,
                expected: self.size,
            });
        }

        Ok(())
    }

    fn mismatch(&self, got: usize) -> MlErr {
        MlErr::ShapeMismatch {
            what: "dense layer weights",
            got,
            expected: self.dim.0 * self.dim.1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_is_affine() {
        // w = [[1, 2], [3, 4]], b = [10, 20]
        let params = [1., 2., 3., 4., 10., 20.];
        let mut dense = Dense::new((2, 2), None);
        let x = array![[1., 1.], [0., 2.]];

        let a = dense.forward(&params, x.view(), false).unwrap();

        assert_eq!(a, array![[14., 26.], [16., 28.]]);
    }

    #[test]
    fn backward_accumulates_into_grad() {
        let params = [1., 2., 3., 4., 0., 0.];
        let mut dense = Dense::new((2, 2), None);
        let x = array![[1., 2.]];
        dense.forward(&params, x.view(), true).unwrap();

        let mut grad = [0.; 6];
        let d = array![[1., -1.]];
        let prev = dense.backward(&params, &mut grad, d.clone()).unwrap();
        assert_eq!(grad, [1., -1., 2., -2., 1., -1.]);
        assert_eq!(prev, array![[-1., -1.]]);

        dense.backward(&params, &mut grad, d).unwrap();
        assert_eq!(grad, [2., -2., 4., -4., 2., -2.]);
    }

    #[test]
    fn rejects_wrong_input_width() {
        let params = [0.; 6];
        let mut dense = Dense::new((2, 2), None);
        let x = array![[1., 2., 3.]];

        let err = dense.forward(&params, x.view(), false).unwrap_err();
        assert!(matches!(
            err,
            MlErr::ShapeMismatch {
                got: 3,
                expected: 2,
                ..
            }
        ));
    }

    #[test]
    fn backward_without_cached_forward_fails() {
        let params = [0.; 6];
        let mut dense = Dense::new((2, 2), None);
        dense.forward(&params, array![[1., 2.]].view(), false).unwrap();

        let mut grad = [0.; 6];
        assert!(dense.backward(&params, &mut grad, array![[1., 1.]]).is_err());
    }

    #[test]
    fn uncached_forward_drops_training_metadata() {
        let params = [1., 0., 0., 1., 0., 0.];
        let mut dense = Dense::new((2, 2), None);
        let x = array![[1., 2.]];

        dense.forward(&params, x.view(), true).unwrap();
        dense.forward(&params, x.view(), false).unwrap();

        let mut grad = [0.; 6];
        assert!(dense.backward(&params, &mut grad, array![[1., 1.]]).is_err());
        assert_eq!(grad, [0.; 6]);
    }
}
