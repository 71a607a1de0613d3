use ndarray::{Array2, ArrayView2};
use rand::Rng;
use rand_distr::{Distribution, Uniform};

use super::{Mode, Model, layers::Layer};
use crate::{MlErr, Result, device::Device};

/// A sequential model: information flows forward when computing an output and backward when
/// computing the *deltas* of its layers.
///
/// Every layer views a contiguous slice of one flat parameter buffer, in layer order.
#[derive(Debug, Clone)]
pub struct Sequential {
    layers: Vec<Layer>,
    params: Vec<f32>,
    grad: Vec<f32>,
    mode: Mode,
    device: Device,
}

impl Sequential {
    /// Creates a new `Sequential` with every parameter set to zero.
    ///
    /// # Arguments
    /// * `layers` - The layers the sequential is composed of.
    pub fn new<I>(layers: I) -> Self
    where
        I: IntoIterator<Item = Layer>,
    {
        let layers: Vec<_> = layers.into_iter().collect();
        let size = layers.iter().map(Layer::size).sum();

        Self {
            layers,
            params: vec![0.; size],
            grad: vec![0.; size],
            mode: Mode::default(),
            device: Device::Cpu,
        }
    }

    /// Creates a new `Sequential` with the given parameters.
    ///
    /// # Returns
    /// An error if `params` doesn't hold exactly as many values as the layers need.
    pub fn with_params<I>(layers: I, params: Vec<f32>) -> Result<Self>
    where
        I: IntoIterator<Item = Layer>,
    {
        let mut model = Self::new(layers);

        if params.len() != model.params.len() {
            return Err(MlErr::ShapeMismatch {
                what: "sequential parameters",
                got: params.len(),
                expected: model.params.len(),
            });
        }

        model.params = params;
        Ok(model)
    }

    /// Draws Xavier-uniform weights and zero biases for every dense layer.
    pub fn init_params<R: Rng>(&mut self, rng: &mut R) -> Result<()> {
        let mut offset = 0;

        for layer in &self.layers {
            let size = layer.size();

            if let Layer::Dense(dense) = layer {
                let (fan_in, fan_out) = dense.dim();
                let limit = (6. / (fan_in + fan_out) as f32).sqrt();
                let dist = Uniform::new_inclusive(-limit, limit)
                    .map_err(|e| MlErr::Config(format!("invalid init range: {e}")))?;

                let w_size = fan_in * fan_out;
                let (w, b) = self.params[offset..offset + size].split_at_mut(w_size);
                w.iter_mut().for_each(|w| *w = dist.sample(rng));
                b.fill(0.);
            }

            offset += size;
        }

        Ok(())
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn device(&self) -> Device {
        self.device
    }
}

impl Model for Sequential {
    fn size(&self) -> usize {
        self.params.len()
    }

    fn mode(&self) -> Mode {
        self.mode
    }

    fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
    }

    fn to_device(&mut self, device: Device) -> Result<()> {
        device.ensure_available()?;
        self.device = device;
        Ok(())
    }

    fn forward(&mut self, x: ArrayView2<f32>) -> Result<Array2<f32>> {
        let training = self.mode == Mode::Train;
        let mut params = &self.params[..];
        let mut a = x.to_owned();

        for layer in self.layers.iter_mut() {
            let (layer_params, rest) = params.split_at(layer.size());
            a = layer.forward(layer_params, a.view(), training)?;
            params = rest;
        }

        Ok(a)
    }

    fn zero_grad(&mut self) {
        self.grad.fill(0.);
    }

    fn backward(&mut self, mut d: Array2<f32>) -> Result<()> {
        let Self {
            layers,
            params,
            grad,
            ..
        } = self;

        let mut end = params.len();

        for layer in layers.iter_mut().rev() {
            let start = end - layer.size();
            d = layer.backward(&params[start..end], &mut grad[start..end], d)?;
            end = start;
        }

        Ok(())
    }

    fn params(&self) -> &[f32] {
        &self.params
    }

    fn grad(&self) -> &[f32] {
        &self.grad
    }

    fn params_and_grad(&mut self) -> (&mut [f32], &[f32]) {
        (&mut self.params, &self.grad)
    }
}

#[cfg(test)]
mod tests {
    use ndarray::array;
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;
    use crate::arch::activations::ActFn;

    fn mlp() -> Sequential {
        Sequential::new([
            Layer::dense((2, 3), Some(ActFn::relu())),
            Layer::dropout(0.5, 0).unwrap(),
            Layer::dense((3, 2), None),
        ])
    }

    #[test]
    fn size_is_the_sum_of_layer_sizes() {
        let model = mlp();
        assert_eq!(model.size(), 3 * 3 + 4 * 2);
        assert_eq!(model.grad().len(), model.size());
    }

    #[test]
    fn with_params_checks_length() {
        let layers = [Layer::dense((2, 1), None)];
        assert!(Sequential::with_params(layers.clone(), vec![0.; 2]).is_err());
        assert!(Sequential::with_params(layers, vec![0.; 3]).is_ok());
    }

    #[test]
    fn init_params_zeroes_biases() {
        let mut model = mlp();
        model.init_params(&mut StdRng::seed_from_u64(1)).unwrap();

        let params = model.params();
        assert!(params[..6].iter().any(|&w| w != 0.));
        assert!(params[6..9].iter().all(|&b| b == 0.));
        assert!(params[15..].iter().all(|&b| b == 0.));
    }

    #[test]
    fn eval_forward_is_deterministic() {
        let mut model = mlp();
        model.init_params(&mut StdRng::seed_from_u64(3)).unwrap();
        model.set_mode(Mode::Eval);

        let x = array![[0.5, -1.], [2., 0.25]];
        let a = model.forward(x.view()).unwrap();
        let b = model.forward(x.view()).unwrap();

        assert_eq!(a, b);
        assert_eq!(a.dim(), (2, 2));
    }

    #[test]
    fn backward_fills_the_gradient() {
        let mut model = Sequential::with_params(
            [Layer::dense((2, 1), None)],
            vec![1., 1., 0.],
        )
        .unwrap();

        let x = array![[1., 2.]];
        model.forward(x.view()).unwrap();
        model.zero_grad();
        model.backward(array![[1.]]).unwrap();

        assert_eq!(model.grad(), &[1., 2., 1.]);

        model.zero_grad();
        assert!(model.grad().iter().all(|&g| g == 0.));
    }

    #[test]
    fn rejects_unavailable_device() {
        let mut model = mlp();
        assert!(model.to_device(Device::Accelerator).is_err());
        assert_eq!(model.device(), Device::Cpu);
    }
}
