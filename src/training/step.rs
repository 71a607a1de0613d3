use log::debug;

use super::{EpochMetrics, Schedule, accuracy};
use crate::{
    Result,
    arch::{Mode, Model, loss::LossFn},
    dataset::{Batch, BatchSource},
    device::Device,
    optimization::Optimizer,
};

/// Trains `model` for one full pass over `batches`, updating its parameters after every batch.
///
/// # Arguments
/// * `model` - The model to train, switched to `Mode::Train` before every forward pass.
/// * `loss_fn` - The loss function to minimize.
/// * `optimizer` - The optimizer bound to the model's parameters.
/// * `batches` - The training batches.
/// * `schedule` - An optional hook advanced right after every optimizer update.
/// * `device` - Where the model and every batch are placed.
///
/// # Returns
/// The mean of the per-batch losses and accuracies.
///
/// # Errors
/// `MlErr::DeviceUnavailable` before touching any batch if `device` can't be used,
/// `MlErr::EmptyBatchSource` if the pass yields no batch, and whatever shape error a batch
/// triggers in the model, the loss or the optimizer.
pub fn optimize<M, L, O, S>(
    model: &mut M,
    loss_fn: &L,
    optimizer: &mut O,
    batches: &mut S,
    mut schedule: Option<&mut dyn Schedule>,
    device: Device,
) -> Result<EpochMetrics>
where
    M: Model + ?Sized,
    L: LossFn + ?Sized,
    O: Optimizer,
    S: BatchSource + ?Sized,
{
    model.to_device(device)?;

    let mut total_loss = 0.0;
    let mut total_acc = 0.0;
    let mut num_batches = 0;

    for batch in batches.batches() {
        let Batch { inputs, labels } = batch?.to_device(device)?;

        model.set_mode(Mode::Train);
        let logits = model.forward(inputs.view())?;
        let loss = loss_fn.loss(logits.view(), labels.view())?;

        model.zero_grad();
        model.backward(loss_fn.loss_prime(logits.view(), labels.view())?)?;

        let (params, grad) = model.params_and_grad();
        optimizer.update_params(params, grad)?;

        if let Some(schedule) = schedule.as_deref_mut() {
            schedule.advance(&mut *optimizer);
        }

        total_loss += loss;
        total_acc += accuracy(logits.view(), labels.view())?;
        num_batches += 1;
    }

    let metrics = EpochMetrics::average(total_loss, total_acc, num_batches)?;
    debug!(
        batches = num_batches,
        loss = metrics.loss,
        accuracy = metrics.accuracy;
        "optimization pass finished"
    );

    Ok(metrics)
}

/// Measures `model` over one full pass of `batches` without changing it.
///
/// The model is switched to `Mode::Eval` before every forward pass, nothing is retained for a
/// backward pass and no optimizer or schedule is involved.
///
/// # Returns
/// The mean of the per-batch losses and accuracies.
///
/// # Errors
/// The same as `optimize`, minus the optimizer's.
pub fn evaluate<M, L, S>(
    model: &mut M,
    loss_fn: &L,
    batches: &mut S,
    device: Device,
) -> Result<EpochMetrics>
where
    M: Model + ?Sized,
    L: LossFn + ?Sized,
    S: BatchSource + ?Sized,
{
    model.to_device(device)?;

    let mut total_loss = 0.0;
    let mut total_acc = 0.0;
    let mut num_batches = 0;

    for batch in batches.batches() {
        let Batch { inputs, labels } = batch?.to_device(device)?;

        model.set_mode(Mode::Eval);
        let logits = model.forward(inputs.view())?;

        total_loss += loss_fn.loss(logits.view(), labels.view())?;
        total_acc += accuracy(logits.view(), labels.view())?;
        num_batches += 1;
    }

    let metrics = EpochMetrics::average(total_loss, total_acc, num_batches)?;
    debug!(
        batches = num_batches,
        loss = metrics.loss,
        accuracy = metrics.accuracy;
        "evaluation pass finished"
    );

    Ok(metrics)
}
