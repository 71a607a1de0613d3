use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

use crate::{MlErr, Result};

/// The compute device a model and its batches live on.
///
/// There's no accelerator backend compiled into this crate, every buffer is a host `ndarray`,
/// so `Accelerator` can be requested but never used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Device {
    #[default]
    Cpu,
    Accelerator,
}

impl Device {
    /// Returns the best device available in this process.
    pub fn detect() -> Self {
        if Self::Accelerator.is_available() {
            Self::Accelerator
        } else {
            Self::Cpu
        }
    }

    /// Whether this device can hold tensors.
    pub fn is_available(self) -> bool {
        match self {
            Device::Cpu => true,
            Device::Accelerator => false,
        }
    }

    /// Fails with `MlErr::DeviceUnavailable` if this device can't be used.
    pub fn ensure_available(self) -> Result<()> {
        if !self.is_available() {
            return Err(MlErr::DeviceUnavailable { device: self });
        }

        Ok(())
    }
}

impl Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Device::Cpu => "cpu",
            Device::Accelerator => "accelerator",
        };

        write!(f, "{s}")
    }
}
