use super::{relu, sigmoid};

/// An element-wise activation applied after a dense layer's affine map.
#[derive(Debug, Clone)]
pub enum ActFn {
    Sigmoid(sigmoid::Sigmoid),
    Relu(relu::Relu),
}
use ActFn::*;

impl ActFn {
    pub fn sigmoid(amp: f32) -> Self {
        Sigmoid(sigmoid::Sigmoid::new(amp))
    }

    pub fn relu() -> Self {
        Relu(relu::Relu)
    }

    pub fn f(&self, x: f32) -> f32 {
        match self {
            Sigmoid(a) => a.f(x),
            Relu(a) => a.f(x),
        }
    }

    pub fn df(&self, x: f32) -> f32 {
        match self {
            Sigmoid(a) => a.df(x),
            Relu(a) => a.df(x),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatches_to_relu() {
        let act_fn = ActFn::relu();

        assert!(matches!(act_fn, ActFn::Relu(_)));
        assert_eq!(act_fn.f(-2.), 0.);
        assert_eq!(act_fn.f(3.), 3.);
        assert_eq!(act_fn.df(3.), 1.);
    }

    #[test]
    fn dispatches_to_sigmoid() {
        let act_fn = ActFn::sigmoid(1.);

        assert!(matches!(act_fn, ActFn::Sigmoid(_)));
        assert_eq!(act_fn.f(0.), 0.5);
        assert_eq!(act_fn.df(0.), 0.25);
    }
}
