use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Activation {
    /// Saturating nonlinearity, `max(0, x)`.
    ReLU,
    /// Bounded to the unit interval, `1 / (1 + e^-x)`.
    Sigmoid,
}

impl fmt::Display for Activation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ReLU => "relu",
            Self::Sigmoid => "sigmoid",
        };

        write!(f, "{name}")
    }
}

impl Activation {
    pub fn activate(self, x: f32) -> f32 {
        match self {
            Self::ReLU => ReLU::activate(x),
            Self::Sigmoid => Sigmoid::activate(x),
        }
    }

    pub fn activate_slice(self, xs: &mut [f32]) {
        for x in xs {
            *x = self.activate(*x);
        }
    }

    /// Name of the graph op computing this activation.
    pub fn op_name(self) -> &'static str {
        match self {
            Self::ReLU => "Relu",
            Self::Sigmoid => "Sigmoid",
        }
    }
}

pub struct ReLU;
impl ReLU {
    pub fn activate(x: f32) -> f32 {
        x.max(0.0)
    }
}

pub struct Sigmoid;
impl Sigmoid {
    pub fn activate(x: f32) -> f32 {
        1.0 / (1.0 + (-x).exp())
    }
}
