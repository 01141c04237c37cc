mod proto;

pub use proto::{encode_graph_def, DataType, GRAPH_DEF_VERSION};

use std::collections::HashMap;

use crate::{
    activation::Activation,
    error::GraphError,
    model::{self, Sequential},
    shape::Shape,
};

pub const INPUT_NODE: &str = "x";
pub const OUTPUT_NODE: &str = "Identity";

/// A constant tensor baked into the graph.
#[derive(Clone, Debug, PartialEq)]
pub struct Constant {
    pub dims: Vec<usize>,
    pub values: Vec<f32>,
}

impl Constant {
    pub fn matrix(shape: Shape, values: &[f32]) -> Self {
        assert_eq!(shape.size(), values.len());
        Self { dims: vec![shape.rows(), shape.cols()], values: values.to_vec() }
    }

    pub fn vector(values: &[f32]) -> Self {
        Self { dims: vec![values.len()], values: values.to_vec() }
    }

    fn rows(&self) -> usize {
        if self.dims.len() == 2 {
            self.dims[0]
        } else {
            1
        }
    }

    fn cols(&self) -> usize {
        self.dims.last().copied().unwrap_or(1)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Operation {
    /// Batch of row vectors fed in at inference time, shape `[-1, width]`.
    Placeholder { width: usize },
    Const(Constant),
    MatMul,
    BiasAdd,
    Activate(Activation),
    Identity,
}

impl Operation {
    pub fn op_name(&self) -> &'static str {
        match self {
            Self::Placeholder { .. } => "Placeholder",
            Self::Const(_) => "Const",
            Self::MatMul => "MatMul",
            Self::BiasAdd => "BiasAdd",
            Self::Activate(activation) => activation.op_name(),
            Self::Identity => "Identity",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    pub name: String,
    pub op: Operation,
    pub inputs: Vec<String>,
}

impl Node {
    fn new(name: impl Into<String>, op: Operation, inputs: &[&str]) -> Self {
        Self { name: name.into(), op, inputs: inputs.iter().map(|x| x.to_string()).collect() }
    }
}

/// Inference-only computation graph, with every weight stored as a constant.
/// Nodes are kept in topological order.
#[derive(Clone, Debug)]
pub struct FrozenGraph {
    nodes: Vec<Node>,
}

struct Value {
    cols: usize,
    data: Vec<f32>,
}

impl FrozenGraph {
    /// Replaces each layer's variables with constants, producing
    /// `x -> (MatMul -> BiasAdd -> activation)* -> Identity`.
    pub fn freeze(model: &Sequential) -> Self {
        let mut nodes = vec![Node::new(INPUT_NODE, Operation::Placeholder { width: model.input_dim() }, &[])];
        let mut prev = INPUT_NODE.to_string();

        for layer in model.layers() {
            let name = layer.name();
            let kernel = format!("{name}/kernel");
            let bias = format!("{name}/bias");
            let matmul = format!("{name}/MatMul");
            let bias_add = format!("{name}/BiasAdd");
            let activate = format!("{name}/{}", layer.activation().op_name());

            let kernel_values = Constant::matrix(layer.kernel_shape(), layer.kernel());
            let bias_values = Constant::vector(layer.bias());

            nodes.push(Node::new(&kernel, Operation::Const(kernel_values), &[]));
            nodes.push(Node::new(&bias, Operation::Const(bias_values), &[]));
            nodes.push(Node::new(&matmul, Operation::MatMul, &[prev.as_str(), kernel.as_str()]));
            nodes.push(Node::new(&bias_add, Operation::BiasAdd, &[matmul.as_str(), bias.as_str()]));
            nodes.push(Node::new(&activate, Operation::Activate(layer.activation()), &[bias_add.as_str()]));

            prev = activate;
        }

        nodes.push(Node::new(OUTPUT_NODE, Operation::Identity, &[prev.as_str()]));

        Self { nodes }
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn get_node(&self, name: &str) -> Option<&Node> {
        self.nodes.iter().find(|node| node.name == name)
    }

    pub fn input_width(&self) -> Result<usize, GraphError> {
        match self.get_node(INPUT_NODE).map(|node| &node.op) {
            Some(Operation::Placeholder { width }) => Ok(*width),
            _ => Err(GraphError::MissingNode(INPUT_NODE.to_string())),
        }
    }

    /// Shape of the input placeholder, with a dynamic batch dimension.
    pub fn input_shape(&self) -> Result<[i64; 2], GraphError> {
        Ok([-1, self.input_width()? as i64])
    }

    pub fn output_width(&self) -> Result<usize, GraphError> {
        let widths = self.infer_widths()?;
        widths.get(OUTPUT_NODE).copied().ok_or_else(|| GraphError::MissingNode(OUTPUT_NODE.to_string()))
    }

    fn inputs_of<'a, T>(
        node: &Node,
        values: &'a HashMap<&str, T>,
        expected: usize,
    ) -> Result<Vec<&'a T>, GraphError> {
        assert_eq!(node.inputs.len(), expected, "{} takes {expected} inputs!", node.op.op_name());

        node.inputs
            .iter()
            .map(|input| values.get(input.as_str()).ok_or_else(|| GraphError::MissingNode(input.clone())))
            .collect()
    }

    fn mismatch(node: &Node, expected: usize, found: usize) -> GraphError {
        GraphError::WidthMismatch { node: node.name.clone(), expected, found }
    }

    /// Static check of every node's output width, without running anything.
    fn infer_widths(&self) -> Result<HashMap<&str, usize>, GraphError> {
        let mut widths = HashMap::new();
        let mut inner = HashMap::new();

        for node in &self.nodes {
            let width = match &node.op {
                Operation::Placeholder { width } => *width,
                Operation::Const(constant) => {
                    inner.insert(node.name.as_str(), constant.rows());
                    constant.cols()
                }
                Operation::MatMul => {
                    let args = Self::inputs_of(node, &widths, 2)?;
                    let rows = inner.get(node.inputs[1].as_str()).copied().unwrap_or(1);
                    if *args[0] != rows {
                        return Err(Self::mismatch(node, rows, *args[0]));
                    }
                    *args[1]
                }
                Operation::BiasAdd => {
                    let args = Self::inputs_of(node, &widths, 2)?;
                    if args[0] != args[1] {
                        return Err(Self::mismatch(node, *args[0], *args[1]));
                    }
                    *args[0]
                }
                Operation::Activate(_) | Operation::Identity => *Self::inputs_of(node, &widths, 1)?[0],
            };

            widths.insert(node.name.as_str(), width);
        }

        Ok(widths)
    }

    /// Runs a row-major batch through the graph and returns the output node's values.
    pub fn evaluate(&self, inputs: &[f32]) -> Result<Vec<f32>, GraphError> {
        let mut values: HashMap<&str, Value> = HashMap::new();

        for node in &self.nodes {
            let value = match &node.op {
                Operation::Placeholder { width } => {
                    model::batch_size(inputs.len(), *width)?;
                    Value { cols: *width, data: inputs.to_vec() }
                }
                Operation::Const(constant) => Value { cols: constant.cols(), data: constant.values.clone() },
                Operation::MatMul => {
                    let args = Self::inputs_of(node, &values, 2)?;
                    let (lhs, rhs) = (args[0], args[1]);
                    let rows = rhs.data.len() / rhs.cols;

                    if lhs.cols != rows {
                        return Err(Self::mismatch(node, rows, lhs.cols));
                    }

                    let batch_size = lhs.data.len() / lhs.cols;
                    let zeros = vec![0.0; rhs.cols];
                    let data = model::affine(&lhs.data, batch_size, Shape::new(rows, rhs.cols), &rhs.data, &zeros);
                    Value { cols: rhs.cols, data }
                }
                Operation::BiasAdd => {
                    let args = Self::inputs_of(node, &values, 2)?;
                    let (lhs, bias) = (args[0], args[1]);

                    if lhs.cols != bias.data.len() {
                        return Err(Self::mismatch(node, lhs.cols, bias.data.len()));
                    }

                    let mut data = lhs.data.clone();
                    for row in data.chunks_exact_mut(lhs.cols) {
                        for (x, &b) in row.iter_mut().zip(&bias.data) {
                            *x += b;
                        }
                    }

                    Value { cols: lhs.cols, data }
                }
                Operation::Activate(activation) => {
                    let arg = Self::inputs_of(node, &values, 1)?[0];
                    let mut data = arg.data.clone();
                    activation.activate_slice(&mut data);
                    Value { cols: arg.cols, data }
                }
                Operation::Identity => {
                    let arg = Self::inputs_of(node, &values, 1)?[0];
                    Value { cols: arg.cols, data: arg.data.clone() }
                }
            };

            values.insert(node.name.as_str(), value);
        }

        values
            .remove(OUTPUT_NODE)
            .map(|value| value.data)
            .ok_or_else(|| GraphError::MissingNode(OUTPUT_NODE.to_string()))
    }
}
