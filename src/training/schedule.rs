use crate::optimization::Optimizer;

/// A hook advanced once per training batch, right after the optimizer's update.
///
/// Learning-rate schedules implement this to adjust the optimizer they drive. It's never advanced
/// while evaluating.
pub trait Schedule {
    fn advance(&mut self, optimizer: &mut dyn Optimizer);
}

impl<F> Schedule for F
where
    F: FnMut(&mut dyn Optimizer),
{
    fn advance(&mut self, optimizer: &mut dyn Optimizer) {
        self(optimizer)
    }
}
