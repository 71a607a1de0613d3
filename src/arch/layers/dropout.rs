use ndarray::{Array2, ArrayView2};
use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::{MlErr, Result};

/// Inverted dropout.
///
/// While training, every activation is zeroed with probability `p` and the survivors are scaled
/// by `1 / (1 - p)`, so the layer is the identity in expectation and can be skipped entirely when
/// evaluating.
#[derive(Debug, Clone)]
pub struct Dropout {
    p: f32,
    rng: StdRng,
    mask: Option<Array2<f32>>,
}

impl Dropout {
    /// Creates a new `Dropout` layer.
    ///
    /// # Arguments
    /// * `p` - The probability of dropping an activation, in `[0, 1)`.
    /// * `seed` - The seed for the masks' random number generator.
    ///
    /// # Returns
    /// A new `Dropout` or an error if `p` is out of range.
    pub fn new(p: f32, seed: u64) -> Result<Self> {
        if !(0.0..1.0).contains(&p) {
            return Err(MlErr::Config(format!(
                "dropout probability must be in [0, 1), got {p}"
            )));
        }

        Ok(Self {
            p,
            rng: StdRng::seed_from_u64(seed),
            mask: None,
        })
    }

    pub fn p(&self) -> f32 {
        self.p
    }

    pub fn forward(&mut self, x: ArrayView2<f32>, training: bool) -> Array2<f32> {
        if !training {
            self.mask = None;
            return x.to_owned();
        }

        let keep = 1. / (1. - self.p);
        let p = self.p;
        let rng = &mut self.rng;
        let mask = Array2::from_shape_fn(x.dim(), |_| {
            if rng.random::<f32>() < p { 0. } else { keep }
        });

        let a = &x * &mask;
        self.mask = Some(mask);
        a
    }

    pub fn backward(&mut self, mut d: Array2<f32>) -> Result<Array2<f32>> {
        let mask = self.mask.take().ok_or(MlErr::ShapeMismatch {
            what: "dropout mask",
            got: 0,
            expected: d.len(),
        })?;

        if mask.dim() != d.dim() {
            return Err(MlErr::ShapeMismatch {
                what: "dropout delta",
                got: d.len(),
                expected: mask.len(),
            });
        }

        d *= &mask;
        Ok(d)
    }
}
