mod builder;

pub use builder::ModelBuilder;

use std::fmt;

use crate::{activation::Activation, error::GraphError, shape::Shape};

/// Number of features describing a card decision.
pub const INPUT_SIZE: usize = 8;
/// Width of both hidden layers.
pub const HIDDEN_SIZE: usize = 256;
/// One score per candidate card.
pub const OUTPUT_SIZE: usize = 8;

/// Builds the card evaluation network: `8 -> 256 -> 256 -> 8`,
/// activated with relu, relu and sigmoid.
pub fn create_model() -> Sequential {
    create_model_with_seed(None)
}

pub fn create_model_with_seed(seed: Option<u64>) -> Sequential {
    let builder = ModelBuilder::default()
        .input(INPUT_SIZE)
        .dense("input", HIDDEN_SIZE, Activation::ReLU)
        .dense("hidden_1", HIDDEN_SIZE, Activation::ReLU)
        .dense("output", OUTPUT_SIZE, Activation::Sigmoid);

    match seed {
        Some(seed) => builder.seed(seed).build(),
        None => builder.build(),
    }
}

/// A fully-connected layer. The kernel is stored row-major with shape
/// `input_dim x units`, so a row-major batch multiplies it from the left.
#[derive(Clone, Debug)]
pub struct Dense {
    name: String,
    units: usize,
    activation: Activation,
    kernel: Vec<f32>,
    bias: Vec<f32>,
    input_dim: usize,
}

impl Dense {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn units(&self) -> usize {
        self.units
    }

    pub fn input_dim(&self) -> usize {
        self.input_dim
    }

    pub fn activation(&self) -> Activation {
        self.activation
    }

    pub fn kernel(&self) -> &[f32] {
        &self.kernel
    }

    pub fn bias(&self) -> &[f32] {
        &self.bias
    }

    pub fn kernel_shape(&self) -> Shape {
        Shape::new(self.input_dim, self.units)
    }

    pub fn param_count(&self) -> usize {
        self.kernel.len() + self.bias.len()
    }

    fn forward(&self, inputs: &[f32], batch_size: usize) -> Vec<f32> {
        let mut outputs = affine(inputs, batch_size, self.kernel_shape(), &self.kernel, &self.bias);
        self.activation.activate_slice(&mut outputs);
        outputs
    }
}

/// Computes `inputs * kernel + bias` for a row-major batch.
pub(crate) fn affine(inputs: &[f32], batch_size: usize, kernel_shape: Shape, kernel: &[f32], bias: &[f32]) -> Vec<f32> {
    let (rows, cols) = (kernel_shape.rows(), kernel_shape.cols());
    assert_eq!(inputs.len(), batch_size * rows);
    assert_eq!(kernel.len(), kernel_shape.size());
    assert_eq!(bias.len(), cols);

    let mut outputs = Vec::with_capacity(batch_size * cols);

    for sample in inputs.chunks_exact(rows) {
        let start = outputs.len();
        outputs.extend_from_slice(bias);
        let out = &mut outputs[start..];

        for (&x, weights) in sample.iter().zip(kernel.chunks_exact(cols)) {
            if x == 0.0 {
                continue;
            }

            for (o, &w) in out.iter_mut().zip(weights) {
                *o += x * w;
            }
        }
    }

    outputs
}

/// A stack of dense layers fed by a single input of fixed width.
#[derive(Clone, Debug)]
pub struct Sequential {
    input_dim: usize,
    layers: Vec<Dense>,
}

impl Sequential {
    pub fn layers(&self) -> &[Dense] {
        &self.layers
    }

    pub fn input_dim(&self) -> usize {
        self.input_dim
    }

    pub fn output_dim(&self) -> usize {
        self.layers.last().map_or(self.input_dim, Dense::units)
    }

    pub fn param_count(&self) -> usize {
        self.layers.iter().map(Dense::param_count).sum()
    }

    /// Runs a row-major batch of inputs through every layer.
    pub fn forward(&self, inputs: &[f32]) -> Result<Vec<f32>, GraphError> {
        let batch_size = batch_size(inputs.len(), self.input_dim)?;

        let mut values = inputs.to_vec();

        for layer in &self.layers {
            values = layer.forward(&values, batch_size);
        }

        Ok(values)
    }
}

pub(crate) fn batch_size(len: usize, width: usize) -> Result<usize, GraphError> {
    if len == 0 || len % width != 0 {
        return Err(GraphError::InputWidth { width, len });
    }

    Ok(len / width)
}

impl fmt::Display for Sequential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "=".repeat(60);

        writeln!(f, "Model: \"sequential\"")?;
        writeln!(f, "{rule}")?;
        writeln!(f, "{:<28}{:<20}{:>12}", "Layer (type)", "Output Shape", "Param #")?;
        writeln!(f, "{rule}")?;

        for layer in &self.layers {
            let name = format!("{} (Dense, {})", layer.name, layer.activation);
            let shape = format!("(None, {})", layer.units);
            writeln!(f, "{name:<28}{shape:<20}{:>12}", layer.param_count())?;
        }

        writeln!(f, "{rule}")?;
        writeln!(f, "Total params: {}", self.param_count())?;
        writeln!(f, "Trainable params: {}", self.param_count())?;
        write!(f, "Non-trainable params: 0")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn architecture() {
        let model = create_model();

        let units: Vec<_> = model.layers().iter().map(Dense::units).collect();
        let activations: Vec<_> = model.layers().iter().map(Dense::activation).collect();
        let names: Vec<_> = model.layers().iter().map(Dense::name).collect();

        assert_eq!(model.layers().len(), 3);
        assert_eq!(units, [256, 256, 8]);
        assert_eq!(activations, [Activation::ReLU, Activation::ReLU, Activation::Sigmoid]);
        assert_eq!(names, ["input", "hidden_1", "output"]);
        assert_eq!(model.input_dim(), 8);
        assert_eq!(model.output_dim(), 8);
    }

    #[test]
    fn parameter_counts() {
        let model = create_model();
        let counts: Vec<_> = model.layers().iter().map(Dense::param_count).collect();

        assert_eq!(counts, [2304, 65792, 2056]);
        assert_eq!(model.param_count(), 70152);
        assert_eq!(model.layers()[1].kernel_shape(), Shape::new(256, 256));
    }

    #[test]
    fn biases_start_at_zero() {
        let model = create_model();
        assert!(model.layers().iter().all(|layer| layer.bias().iter().all(|&b| b == 0.0)));
    }

    #[test]
    fn forward_is_bounded() {
        let model = create_model_with_seed(Some(1));
        let inputs: Vec<f32> = (0..3 * INPUT_SIZE).map(|i| i as f32 / 10.0 - 1.0).collect();

        let outputs = model.forward(&inputs).unwrap();

        assert_eq!(outputs.len(), 3 * OUTPUT_SIZE);
        assert!(outputs.iter().all(|x| (0.0..=1.0).contains(x)));
    }

    #[test]
    fn forward_rejects_partial_batch() {
        let model = create_model();
        assert!(matches!(model.forward(&[0.0; 9]), Err(GraphError::InputWidth { width: 8, len: 9 })));
        assert!(model.forward(&[]).is_err());
    }

    #[test]
    fn affine_small() {
        // [1, 2] * [[1, 0, 2], [0, 1, -1]] + [0.5, 0.5, 0.5]
        let kernel = [1.0, 0.0, 2.0, 0.0, 1.0, -1.0];
        let out = affine(&[1.0, 2.0, 0.0, 1.0], 2, Shape::new(2, 3), &kernel, &[0.5; 3]);
        assert_eq!(out, [1.5, 2.5, 0.5, 0.5, 1.5, -0.5]);
    }

    #[test]
    fn seeded_models_match() {
        let a = create_model_with_seed(Some(9));
        let b = create_model_with_seed(Some(9));
        assert_eq!(a.layers()[0].kernel(), b.layers()[0].kernel());
    }

    #[test]
    fn summary() {
        let summary = create_model().to_string();
        assert!(summary.contains("hidden_1 (Dense, relu)"));
        assert!(summary.contains("(None, 8)"));
        assert!(summary.contains("Total params: 70152"));
    }
}
