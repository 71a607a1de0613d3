use ndarray::{Array2, ArrayView2};

use crate::{Result, device::Device};

/// Whether the stochastic paths of a model (dropout and the like) are active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Train,
    Eval,
}

/// A differentiable function from a batch of inputs to per-class scores.
///
/// A model owns its flat parameter buffer and a gradient buffer of the same length. Optimizers
/// are bound to it through `params_and_grad`.
pub trait Model {
    /// Returns the amount of parameters in the model.
    fn size(&self) -> usize;

    /// Returns the mode the model is currently in.
    fn mode(&self) -> Mode;

    /// Switches between training and evaluation behaviour.
    fn set_mode(&mut self, mode: Mode);

    /// Places the model's buffers on `device`.
    ///
    /// # Errors
    /// `MlErr::DeviceUnavailable` if the device can't be used.
    fn to_device(&mut self, device: Device) -> Result<()>;

    /// Computes the logits for the batch `x`, one sample per row.
    ///
    /// In `Mode::Train` the layers keep whatever they need for `backward`, in `Mode::Eval`
    /// nothing is retained.
    fn forward(&mut self, x: ArrayView2<f32>) -> Result<Array2<f32>>;

    /// Sets every entry of the gradient buffer to zero.
    fn zero_grad(&mut self);

    /// Accumulates into the gradient buffer the gradient of the loss, given the derivative of the
    /// loss with respect to the logits of the last `forward` call.
    fn backward(&mut self, d: Array2<f32>) -> Result<()>;

    /// Returns the model's parameters.
    fn params(&self) -> &[f32];

    /// Returns the model's gradient buffer.
    fn grad(&self) -> &[f32];

    /// Splits the model into its mutable parameters and its gradient, for an optimizer step.
    fn params_and_grad(&mut self) -> (&mut [f32], &[f32]);
}
