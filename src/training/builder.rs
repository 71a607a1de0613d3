use rand::{Rng, SeedableRng, rngs::StdRng};

use super::{History, Trainer};
use crate::{
    Result,
    arch::{
        Model, Sequential,
        activations::ActFn,
        layers::Layer,
        loss::{CrossEntropy, LossFn, Mse},
    },
    config::{ActFnSpec, LayerSpec, LossFnSpec, ModelSpec, OptimizerSpec, RunConfig},
    dataset::BatchSource,
    optimization::{Adam, GradientDescent, GradientDescentWithMomentum, Optimizer},
};

/// A training run whose model, loss function and optimizer were picked at runtime.
pub trait Run {
    /// Trains and evaluates for every configured epoch.
    fn run(
        &mut self,
        train_batches: &mut dyn BatchSource,
        test_batches: &mut dyn BatchSource,
    ) -> Result<History>;
}

impl<M, L, O> Run for Trainer<M, L, O>
where
    M: Model,
    L: LossFn,
    O: Optimizer,
{
    fn run(
        &mut self,
        train_batches: &mut dyn BatchSource,
        test_batches: &mut dyn BatchSource,
    ) -> Result<History> {
        self.train(train_batches, test_batches)
    }
}

/// Builds `Trainer`s given a run configuration.
#[derive(Debug, Default)]
pub struct TrainerBuilder;

impl TrainerBuilder {
    /// Creates a new `TrainerBuilder`.
    pub fn new() -> Self {
        Self
    }

    /// Builds a new `Trainer` following a configuration, with freshly initialized parameters.
    ///
    /// # Arguments
    /// * `config` - The configuration of the run, expected to be already validated.
    ///
    /// # Returns
    /// The trainer, or an error if a layer's configuration is invalid.
    pub fn build(&self, config: &RunConfig) -> Result<Box<dyn Run>> {
        let mut rng = self.generate_rng(config.seed);
        self.resolve_model(config, &mut rng)
    }

    fn resolve_model(&self, config: &RunConfig, rng: &mut StdRng) -> Result<Box<dyn Run>> {
        match &config.model {
            ModelSpec::Sequential {
                layers: layer_specs,
            } => {
                let layers = layer_specs
                    .iter()
                    .map(|ls| self.resolve_layer(*ls, rng))
                    .collect::<Result<Vec<_>>>()?;

                let mut model = Sequential::new(layers);
                model.init_params(rng)?;
                Ok(self.resolve_optimizer(config, model))
            }
        }
    }

    fn resolve_layer(&self, spec: LayerSpec, rng: &mut StdRng) -> Result<Layer> {
        match spec {
            LayerSpec::Dense { dim, act_fn } => Ok(Layer::dense(dim, self.resolve_act_fn(act_fn))),
            LayerSpec::Dropout { p, seed } => {
                let seed = seed.unwrap_or_else(|| rng.random());
                Layer::dropout(p, seed)
            }
        }
    }

    fn resolve_act_fn(&self, spec: Option<ActFnSpec>) -> Option<ActFn> {
        spec.map(|act_fn| match act_fn {
            ActFnSpec::Sigmoid { amp } => ActFn::sigmoid(amp),
            ActFnSpec::Relu => ActFn::relu(),
        })
    }

    fn resolve_optimizer<M>(&self, config: &RunConfig, model: M) -> Box<dyn Run>
    where
        M: Model + 'static,
    {
        let len = model.size();

        match config.optimizer {
            OptimizerSpec::Adam {
                learning_rate,
                beta1,
                beta2,
                epsilon,
            } => {
                let optimizer = Adam::new(len, learning_rate, beta1, beta2, epsilon);
                self.resolve_loss(config, model, optimizer)
            }
            OptimizerSpec::GradientDescent { learning_rate } => {
                let optimizer = GradientDescent::new(learning_rate);
                self.resolve_loss(config, model, optimizer)
            }
            OptimizerSpec::GradientDescentWithMomentum {
                learning_rate,
                momentum,
            } => {
                let optimizer = GradientDescentWithMomentum::new(len, learning_rate, momentum);
                self.resolve_loss(config, model, optimizer)
            }
        }
    }

    fn resolve_loss<M, O>(&self, config: &RunConfig, model: M, optimizer: O) -> Box<dyn Run>
    where
        M: Model + 'static,
        O: Optimizer + 'static,
    {
        match config.loss {
            LossFnSpec::CrossEntropy => {
                self.terminate_build(config, model, optimizer, CrossEntropy::new())
            }
            LossFnSpec::Mse => self.terminate_build(config, model, optimizer, Mse::new()),
        }
    }

    fn terminate_build<M, O, L>(
        &self,
        config: &RunConfig,
        model: M,
        optimizer: O,
        loss_fn: L,
    ) -> Box<dyn Run>
    where
        M: Model + 'static,
        O: Optimizer + 'static,
        L: LossFn + 'static,
    {
        let mut trainer = Trainer::new(model, loss_fn, optimizer).with_epochs(config.epochs);

        if let Some(device) = config.device {
            trainer = trainer.with_device(device);
        }

        Box::new(trainer)
    }

    fn generate_rng(&self, seed: Option<u64>) -> StdRng {
        match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroUsize;

    use ndarray::{Array1, Array2};

    use super::*;
    use crate::{
        MlErr,
        config::DecoderSpec,
        dataset::{DataLoader, InMemoryDataset},
        device::Device,
    };

    fn config(optimizer: OptimizerSpec, loss: LossFnSpec) -> RunConfig {
        RunConfig {
            train_dir: "train".into(),
            test_dir: "test".into(),
            decoder: DecoderSpec::RawF32,
            batch_size: NonZeroUsize::new(2).unwrap(),
            num_workers: None,
            epochs: 2,
            seed: Some(3),
            device: None,
            model: ModelSpec::Sequential {
                layers: vec![
                    LayerSpec::Dense {
                        dim: (2, 4),
                        act_fn: Some(ActFnSpec::Sigmoid { amp: 1. }),
                    },
                    LayerSpec::Dropout { p: 0.1, seed: None },
                    LayerSpec::Dense {
                        dim: (4, 2),
                        act_fn: None,
                    },
                ],
            },
            optimizer,
            loss,
        }
    }

    fn loader() -> DataLoader {
        let inputs = Array2::from_shape_vec((4, 2), vec![0., 0., 0., 1., 1., 0., 1., 1.]).unwrap();
        let labels = Array1::from(vec![0, 1, 1, 0]);
        let dataset = InMemoryDataset::new(inputs, labels, vec!["a".into(), "b".into()]).unwrap();
        DataLoader::new(dataset, NonZeroUsize::new(2).unwrap())
    }

    #[test]
    fn builds_every_optimizer_and_loss() {
        let optimizers = [
            OptimizerSpec::Adam {
                learning_rate: 0.01,
                beta1: 0.9,
                beta2: 0.999,
                epsilon: 1e-8,
            },
            OptimizerSpec::GradientDescent { learning_rate: 0.1 },
            OptimizerSpec::GradientDescentWithMomentum {
                learning_rate: 0.1,
                momentum: 0.9,
            },
        ];

        for optimizer in optimizers {
            for loss in [LossFnSpec::CrossEntropy, LossFnSpec::Mse] {
                let mut run = TrainerBuilder::new()
                    .build(&config(optimizer, loss))
                    .unwrap();

                let history = run.run(&mut loader(), &mut loader()).unwrap();
                assert_eq!(history.len(), 2);
                assert!(history.train_loss().iter().all(|l| l.is_finite()));
            }
        }
    }

    #[test]
    fn honors_configured_device() {
        let mut config = config(
            OptimizerSpec::GradientDescent { learning_rate: 0.1 },
            LossFnSpec::CrossEntropy,
        );
        config.device = Some(Device::Accelerator);

        let mut run = TrainerBuilder::new().build(&config).unwrap();
        assert!(matches!(
            run.run(&mut loader(), &mut loader()),
            Err(MlErr::DeviceUnavailable { .. })
        ));
    }

    #[test]
    fn rejects_invalid_dropout() {
        let mut config = config(
            OptimizerSpec::GradientDescent { learning_rate: 0.1 },
            LossFnSpec::Mse,
        );
        config.model = ModelSpec::Sequential {
            layers: vec![LayerSpec::Dropout {
                p: 1.5,
                seed: Some(0),
            }],
        };

        assert!(matches!(
            TrainerBuilder::new().build(&config),
            Err(MlErr::Config(_))
        ));
    }
}
