use std::fmt::{self, Display};

use log::info;
use serde::Serialize;

use super::{EpochMetrics, History};

/// What a training run reports at the end of every epoch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EpochReport {
    /// 1-based epoch number.
    pub epoch: usize,
    /// Total epochs requested for this run.
    pub epochs: usize,
    pub train: EpochMetrics,
    pub test: EpochMetrics,
}

impl Display for EpochReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Epoch number: {} | train loss: {:.4} | test loss: {:.4} | train accuracy: {:.4} | test_acc: {:.4}",
            self.epoch, self.train.loss, self.test.loss, self.train.accuracy, self.test.accuracy
        )
    }
}

/// Watches the progress of a training run. Observers can't influence the run.
pub trait Observer {
    /// Called once before the first epoch of a run with at least one epoch.
    fn on_train_start(&mut self, _epochs: usize) {}

    /// Called after every completed epoch, once its metrics are recorded.
    fn on_epoch_end(&mut self, report: &EpochReport);

    /// Called once after the last epoch.
    fn on_train_end(&mut self, _history: &History) {}
}

impl<F> Observer for F
where
    F: FnMut(&EpochReport),
{
    fn on_epoch_end(&mut self, report: &EpochReport) {
        self(report)
    }
}

/// Logs one line per epoch, prefixed by the overall progress of the run.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogProgress;

impl Observer for LogProgress {
    fn on_train_start(&mut self, epochs: usize) {
        info!("training for {epochs} epochs");
    }

    fn on_epoch_end(&mut self, report: &EpochReport) {
        let percent = 100 * report.epoch / report.epochs.max(1);
        info!("[{}/{} {percent:>3}%] {report}", report.epoch, report.epochs);
    }

    fn on_train_end(&mut self, history: &History) {
        info!("training finished after {} epochs", history.len());
    }
}

/// Reports nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct Silent;

impl Observer for Silent {
    fn on_epoch_end(&mut self, _report: &EpochReport) {}
}
