use super::{EpochReport, History, LogProgress, Observer, Schedule, evaluate, optimize};
use crate::{
    Result,
    arch::{Model, loss::LossFn},
    dataset::BatchSource,
    device::Device,
    optimization::Optimizer,
};

/// The amount of epochs a `Trainer` runs unless told otherwise.
pub const DEFAULT_EPOCHS: usize = 5;

/// A model `Trainer`. Contains the relevant components needed for training a model, including the
/// model itself, and alternates training and evaluation passes for a fixed amount of epochs.
pub struct Trainer<M, L, O>
where
    M: Model,
    L: LossFn,
    O: Optimizer,
{
    model: M,
    loss_fn: L,
    optimizer: O,

    epochs: usize,
    device: Device,
    schedule: Option<Box<dyn Schedule>>,
    observer: Box<dyn Observer>,
}

impl<M, L, O> Trainer<M, L, O>
where
    M: Model,
    L: LossFn,
    O: Optimizer,
{
    /// Returns a new `Trainer` running `DEFAULT_EPOCHS` epochs on the best available device,
    /// without a schedule and logging its progress.
    ///
    /// # Arguments
    /// * `model` - The model that will be trained.
    /// * `loss_fn` - The loss function used to measure the difference between a model's output
    ///   and the expected one.
    /// * `optimizer` - The optimizer bound to the model's parameters.
    pub fn new(model: M, loss_fn: L, optimizer: O) -> Self {
        Self {
            model,
            loss_fn,
            optimizer,
            epochs: DEFAULT_EPOCHS,
            device: Device::detect(),
            schedule: None,
            observer: Box::new(LogProgress),
        }
    }

    pub fn with_epochs(mut self, epochs: usize) -> Self {
        self.epochs = epochs;
        self
    }

    pub fn with_device(mut self, device: Device) -> Self {
        self.device = device;
        self
    }

    /// Advances `schedule` after every optimizer update.
    pub fn with_schedule<S: Schedule + 'static>(mut self, schedule: S) -> Self {
        self.schedule = Some(Box::new(schedule));
        self
    }

    /// Reports the run's progress to `observer` instead of the log.
    pub fn with_observer<B: Observer + 'static>(mut self, observer: B) -> Self {
        self.observer = Box::new(observer);
        self
    }

    pub fn epochs(&self) -> usize {
        self.epochs
    }

    pub fn device(&self) -> Device {
        self.device
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn model_mut(&mut self) -> &mut M {
        &mut self.model
    }

    pub fn optimizer(&self) -> &O {
        &self.optimizer
    }

    /// Gives back the model, the loss function and the optimizer.
    pub fn into_parts(self) -> (M, L, O) {
        (self.model, self.loss_fn, self.optimizer)
    }

    /// Runs every configured epoch: a training pass over `train_batches` followed by an
    /// evaluation pass over `test_batches`.
    ///
    /// # Returns
    /// The metrics of every epoch, or the first error any pass hits. A failed run records
    /// nothing for the epoch that failed, the observer has already seen the previous ones.
    pub fn train<T, V>(&mut self, train_batches: &mut T, test_batches: &mut V) -> Result<History>
    where
        T: BatchSource + ?Sized,
        V: BatchSource + ?Sized,
    {
        let Self {
            model,
            loss_fn,
            optimizer,
            epochs,
            device,
            schedule,
            observer,
        } = self;

        let (epochs, device) = (*epochs, *device);
        let mut history = History::with_capacity(epochs);

        if epochs == 0 {
            return Ok(history);
        }

        observer.on_train_start(epochs);

        for epoch in 0..epochs {
            let schedule: Option<&mut dyn Schedule> = match schedule.as_mut() {
                Some(schedule) => Some(&mut **schedule),
                None => None,
            };

            let train = optimize(
                model,
                loss_fn,
                optimizer,
                train_batches,
                schedule,
                device,
            )?;
            let test = evaluate(model, loss_fn, test_batches, device)?;

            history.push(train, test);

            let report = EpochReport {
                epoch: epoch + 1,
                epochs,
                train,
                test,
            };
            observer.on_epoch_end(&report);
        }

        observer.on_train_end(&history);
        Ok(history)
    }
}
