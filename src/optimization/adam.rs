use super::{Optimizer, check_sizes, check_state};
use crate::Result;

/// Adam: per-parameter step sizes from running estimates of the gradient's first and second
/// moments, bias-corrected by the amount of steps taken.
#[derive(Debug, Clone)]
pub struct Adam {
    learning_rate: f32,
    beta1: f32,
    beta2: f32,
    epsilon: f32,
    m: Vec<f32>,
    v: Vec<f32>,
    steps: usize,
}

impl Adam {
    /// Creates a new `Adam` optimizer.
    ///
    /// # Arguments
    /// * `len` - The amount of parameters this instance should hold.
    /// * `learning_rate` - The small coefficient that modulates the amount of training per update.
    /// * `beta1`, `beta2` - The decay rates of the first and second moment estimates.
    /// * `epsilon` - Added to the denominator to keep updates finite.
    pub fn new(len: usize, learning_rate: f32, beta1: f32, beta2: f32, epsilon: f32) -> Self {
        Self {
            learning_rate,
            beta1,
            beta2,
            epsilon,
            m: vec![0.; len],
            v: vec![0.; len],
            steps: 0,
        }
    }
}

impl Optimizer for Adam {
    fn update_params(&mut self, params: &mut [f32], grad: &[f32]) -> Result<()> {
        check_sizes(params, grad)?;
        check_state(&self.m, params)?;

        let t = (self.steps + 1) as i32;
        let (b1, b2) = (self.beta1, self.beta2);
        let m_corr = 1. - b1.powi(t);
        let v_corr = 1. - b2.powi(t);

        for (i, (p, &g)) in params.iter_mut().zip(grad).enumerate() {
            let m = &mut self.m[i];
            let v = &mut self.v[i];

            *m = b1 * *m + (1. - b1) * g;
            *v = b2 * *v + (1. - b2) * g * g;

            let m_hat = *m / m_corr;
            let v_hat = *v / v_corr;
            *p -= self.learning_rate * m_hat / (v_hat.sqrt() + self.epsilon);
        }

        self.steps += 1;
        Ok(())
    }

    fn learning_rate(&self) -> f32 {
        self.learning_rate
    }

    fn set_learning_rate(&mut self, learning_rate: f32) {
        self.learning_rate = learning_rate;
    }

    fn steps(&self) -> usize {
        self.steps
    }
}
