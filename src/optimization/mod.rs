mod adam;
mod gradient_descent;
mod gradient_descent_with_momentum;
mod optimizer;

pub use adam::Adam;
pub use gradient_descent::GradientDescent;
pub use gradient_descent_with_momentum::GradientDescentWithMomentum;
pub use optimizer::Optimizer;

use crate::{MlErr, Result};

/// Fails if the gradient and the parameters don't have the same length.
fn check_sizes(params: &[f32], grad: &[f32]) -> Result<()> {
    if grad.len() != params.len() {
        return Err(MlErr::ShapeMismatch {
            what: "optimizer gradient",
            got: grad.len(),
            expected: params.len(),
        });
    }

    Ok(())
}

/// Fails if the optimizer's state was sized for a different amount of parameters.
fn check_state(state: &[f32], params: &[f32]) -> Result<()> {
    if state.len() != params.len() {
        return Err(MlErr::ShapeMismatch {
            what: "optimizer state",
            got: params.len(),
            expected: state.len(),
        });
    }

    Ok(())
}
