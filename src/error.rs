use std::{
    error::Error,
    fmt::{self, Display},
    io,
    path::PathBuf,
};

use crate::device::Device;

/// The result type used in the entire crate.
pub type Result<T> = std::result::Result<T, MlErr>;

/// The training engine's error type.
#[derive(Debug)]
pub enum MlErr {
    /// A batch, buffer or layer has a shape the consumer can't work with.
    ShapeMismatch {
        what: &'static str,
        got: usize,
        expected: usize,
    },
    /// A label is not a valid class index.
    LabelOutOfRange { label: usize, num_classes: usize },
    /// A pass over a batch source yielded no batches at all.
    EmptyBatchSource,
    /// The requested compute device can't be used.
    DeviceUnavailable { device: Device },
    /// The on-disk dataset layout is not usable.
    Dataset(String),
    /// A sample file could not be decoded.
    Decode { path: PathBuf, reason: String },
    /// The run configuration is invalid.
    Config(String),
    Io(io::Error),
}

impl Display for MlErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MlErr::ShapeMismatch {
                what,
                got,
                expected,
            } => write!(
                f,
                "There's a shape mismatch in {what}, got {got} and expected {expected}"
            ),
            MlErr::LabelOutOfRange { label, num_classes } => write!(
                f,
                "Label {label} is out of range for a problem with {num_classes} classes"
            ),
            MlErr::EmptyBatchSource => {
                write!(f, "The batch source yielded no batches, can't average metrics")
            }
            MlErr::DeviceUnavailable { device } => {
                write!(f, "The requested device ({device}) is not available")
            }
            MlErr::Dataset(msg) => write!(f, "invalid dataset: {msg}"),
            MlErr::Decode { path, reason } => {
                write!(f, "failed to decode '{}': {reason}", path.display())
            }
            MlErr::Config(msg) => write!(f, "invalid config: {msg}"),
            MlErr::Io(e) => write!(f, "io error: {e}"),
        }
    }
}

impl Error for MlErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            MlErr::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for MlErr {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}
