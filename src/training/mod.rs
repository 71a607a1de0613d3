mod builder;
mod history;
mod metrics;
mod observer;
mod schedule;
mod step;
mod trainer;

pub use builder::{Run, TrainerBuilder};
pub use history::History;
pub use metrics::{EpochMetrics, accuracy};
pub use observer::{EpochReport, LogProgress, Observer, Silent};
pub use schedule::Schedule;
pub use step::{evaluate, optimize};
pub use trainer::{DEFAULT_EPOCHS, Trainer};
