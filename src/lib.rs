pub mod arch;
pub mod config;
pub mod dataset;
pub mod device;
pub mod error;
pub mod optimization;
pub mod training;

pub use device::Device;
pub use error::{MlErr, Result};
