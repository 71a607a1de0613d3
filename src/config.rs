use std::{
    fs,
    num::NonZeroUsize,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::{
    MlErr, Result,
    dataset::{Decode, Netpbm, RawF32},
    device::Device,
    training::DEFAULT_EPOCHS,
};

/// The specification for the `ActFn` enum.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActFnSpec {
    Sigmoid { amp: f32 },
    Relu,
}

/// The specification for the `Layer` enum.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerSpec {
    Dense {
        dim: (usize, usize),
        act_fn: Option<ActFnSpec>,
    },
    Dropout {
        p: f32,
        seed: Option<u64>,
    },
}

/// The specification for the `Model` trait.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelSpec {
    Sequential { layers: Vec<LayerSpec> },
}

/// The specification for the `Optimizer` trait.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizerSpec {
    Adam {
        learning_rate: f32,
        beta1: f32,
        beta2: f32,
        epsilon: f32,
    },
    GradientDescent {
        learning_rate: f32,
    },
    GradientDescentWithMomentum {
        learning_rate: f32,
        momentum: f32,
    },
}

/// The specification for the `LossFn` trait.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LossFnSpec {
    CrossEntropy,
    Mse,
}

/// How the sample files of a dataset folder are decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecoderSpec {
    Netpbm,
    RawF32,
}

impl Decode for DecoderSpec {
    fn accepts(&self, path: &Path) -> bool {
        match self {
            DecoderSpec::Netpbm => Netpbm.accepts(path),
            DecoderSpec::RawF32 => RawF32.accepts(path),
        }
    }

    fn decode(&self, path: &Path) -> Result<Vec<f32>> {
        match self {
            DecoderSpec::Netpbm => Netpbm.decode(path),
            DecoderSpec::RawF32 => RawF32.decode(path),
        }
    }
}

fn default_epochs() -> usize {
    DEFAULT_EPOCHS
}

/// The configuration of a whole training run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    pub train_dir: PathBuf,
    pub test_dir: PathBuf,
    pub decoder: DecoderSpec,
    pub batch_size: NonZeroUsize,
    #[serde(default)]
    pub num_workers: Option<NonZeroUsize>,
    #[serde(default = "default_epochs")]
    pub epochs: usize,
    #[serde(default)]
    pub seed: Option<u64>,
    /// The device to train on, the best available one if absent.
    #[serde(default)]
    pub device: Option<Device>,
    pub model: ModelSpec,
    pub optimizer: OptimizerSpec,
    pub loss: LossFnSpec,
}

impl RunConfig {
    /// Reads a `RunConfig` from a JSON file.
    ///
    /// # Returns
    /// An error if the file can't be read or isn't a valid configuration.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;

        serde_json::from_str(&content)
            .map_err(|e| MlErr::Config(format!("'{}' is not valid JSON: {e}", path.display())))
    }

    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content).map_err(|e| MlErr::Config(format!("invalid JSON: {e}")))
    }

    /// Checks that the model can consume the loaded dataset.
    ///
    /// # Arguments
    /// * `features` - The length of every sample.
    /// * `num_classes` - The amount of classes in the dataset.
    ///
    /// # Returns
    /// `MlErr::Config` if the model has no dense layer, two consecutive dense layers don't fit
    /// together, the first one doesn't take `features` inputs or the last one doesn't output
    /// one logit per class.
    pub fn validate(&self, features: usize, num_classes: usize) -> Result<()> {
        let ModelSpec::Sequential { layers } = &self.model;

        let mut width = features;
        let mut dense_layers = 0;

        for (i, layer) in layers.iter().enumerate() {
            if let LayerSpec::Dense { dim: (input, output), .. } = *layer {
                if input != width {
                    return Err(MlErr::Config(format!(
                        "layer {i} takes {input} inputs but receives {width}"
                    )));
                }

                width = output;
                dense_layers += 1;
            }
        }

        if dense_layers == 0 {
            return Err(MlErr::Config("the model has no dense layer".into()));
        }

        if width != num_classes {
            return Err(MlErr::Config(format!(
                "the model outputs {width} values but the dataset has {num_classes} classes"
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"{
        "train_dir": "data/train",
        "test_dir": "data/test",
        "decoder": "netpbm",
        "batch_size": 32,
        "seed": 7,
        "model": {
            "sequential": {
                "layers": [
                    { "dense": { "dim": [4, 8], "act_fn": "relu" } },
                    { "dropout": { "p": 0.2, "seed": null } },
                    { "dense": { "dim": [8, 3], "act_fn": null } }
                ]
            }
        },
        "optimizer": { "adam": { "learning_rate": 0.001, "beta1": 0.9, "beta2": 0.999, "epsilon": 1e-8 } },
        "loss": "cross_entropy"
    }"#;

    #[test]
    fn parses_with_defaults() {
        let config = RunConfig::from_json(CONFIG).unwrap();

        assert_eq!(config.epochs, 5);
        assert_eq!(config.batch_size.get(), 32);
        assert_eq!(config.num_workers, None);
        assert_eq!(config.device, None);
        assert_eq!(config.decoder, DecoderSpec::Netpbm);
        assert_eq!(config.loss, LossFnSpec::CrossEntropy);

        let ModelSpec::Sequential { layers } = &config.model;
        assert_eq!(layers.len(), 3);
        assert_eq!(
            layers[0],
            LayerSpec::Dense {
                dim: (4, 8),
                act_fn: Some(ActFnSpec::Relu)
            }
        );
    }

    #[test]
    fn parses_device() {
        let json = CONFIG.replacen('{', r#"{ "device": "accelerator","#, 1);
        let config = RunConfig::from_json(&json).unwrap();
        assert_eq!(config.device, Some(Device::Accelerator));
    }

    #[test]
    fn rejects_zero_batch_size() {
        let json = CONFIG.replace(r#""batch_size": 32"#, r#""batch_size": 0"#);
        assert!(matches!(
            RunConfig::from_json(&json),
            Err(MlErr::Config(_))
        ));
    }

    #[test]
    fn validate_accepts_matching_dataset() {
        let config = RunConfig::from_json(CONFIG).unwrap();
        assert!(config.validate(4, 3).is_ok());
    }

    #[test]
    fn validate_rejects_wrong_class_count() {
        let config = RunConfig::from_json(CONFIG).unwrap();
        assert!(matches!(config.validate(4, 2), Err(MlErr::Config(_))));
    }

    #[test]
    fn validate_rejects_wrong_input_width() {
        let config = RunConfig::from_json(CONFIG).unwrap();
        assert!(matches!(config.validate(5, 3), Err(MlErr::Config(_))));
    }

    #[test]
    fn validate_rejects_incompatible_layers() {
        let mut config = RunConfig::from_json(CONFIG).unwrap();
        config.model = ModelSpec::Sequential {
            layers: vec![
                LayerSpec::Dense {
                    dim: (4, 8),
                    act_fn: None,
                },
                LayerSpec::Dense {
                    dim: (7, 3),
                    act_fn: None,
                },
            ],
        };

        assert!(matches!(config.validate(4, 3), Err(MlErr::Config(_))));
    }

    #[test]
    fn validate_rejects_model_without_dense_layers() {
        let mut config = RunConfig::from_json(CONFIG).unwrap();
        config.model = ModelSpec::Sequential { layers: vec![] };

        assert!(matches!(config.validate(4, 3), Err(MlErr::Config(_))));
    }
}
