use std::collections::HashSet;

use super::{Dense, Sequential};
use crate::{
    activation::Activation,
    rng::{InitSettings, WeightRng},
};

struct LayerType {
    name: String,
    units: usize,
    activation: Activation,
}

#[derive(Default)]
pub struct ModelBuilder {
    input_dim: Option<usize>,
    layers: Vec<LayerType>,
    ids: HashSet<String>,
    seed: Option<u64>,
}

impl ModelBuilder {
    pub fn input(mut self, size: usize) -> Self {
        assert!(self.layers.is_empty(), "You need to set the input size before adding any layers!");
        assert!(size > 0, "Cannot have an input of size 0!");
        self.input_dim = Some(size);
        self
    }

    pub fn dense(mut self, name: &str, units: usize, activation: Activation) -> Self {
        assert!(units > 0, "Cannot have a layer with 0 units!");
        assert!(self.ids.insert(name.to_string()), "Layer name '{name}' is already in use!");
        self.layers.push(LayerType { name: name.to_string(), units, activation });
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn build(self) -> Sequential {
        let input_dim = self.input_dim.expect("Input size must be set before building!");
        assert!(!self.layers.is_empty(), "Model must have at least one layer!");

        let mut rng = WeightRng::new(self.seed);
        let mut fan_in = input_dim;
        let mut layers = Vec::with_capacity(self.layers.len());

        for LayerType { name, units, activation } in self.layers {
            let kernel = rng.vec_f32(fan_in * units, InitSettings::glorot_uniform(fan_in, units));
            let bias = rng.vec_f32(units, InitSettings::Zeroed);

            layers.push(Dense { name, units, activation, kernel, bias, input_dim: fan_in });
            fan_in = units;
        }

        Sequential { input_dim, layers }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chains_input_dims() {
        let model = ModelBuilder::default()
            .input(3)
            .dense("a", 5, Activation::ReLU)
            .dense("b", 2, Activation::Sigmoid)
            .seed(0)
            .build();

        assert_eq!(model.layers()[0].input_dim(), 3);
        assert_eq!(model.layers()[1].input_dim(), 5);
        assert_eq!(model.layers()[1].kernel().len(), 10);
        assert_eq!(model.output_dim(), 2);
    }

    #[test]
    #[should_panic(expected = "already in use")]
    fn duplicate_names() {
        let _ = ModelBuilder::default().input(3).dense("a", 5, Activation::ReLU).dense("a", 2, Activation::ReLU);
    }

    #[test]
    #[should_panic(expected = "Input size")]
    fn missing_input() {
        ModelBuilder::default().dense("a", 5, Activation::ReLU).build();
    }

    #[test]
    #[should_panic(expected = "at least one layer")]
    fn no_layers() {
        ModelBuilder::default().input(3).build();
    }
}
