/// Contains the `Activation` functions supported by dense layers.
pub mod activation;
/// Error types for freezing, evaluating and exporting networks.
pub mod error;
/// Writing a model to disk as a frozen graph.
pub mod export;
/// Contains the `FrozenGraph` struct and its binary encoding.
pub mod graph;
pub mod logger;
/// Contains the `Sequential` model, its builder and the fixed card
/// evaluation architecture.
pub mod model;
pub mod rng;
pub mod shape;

pub use activation::Activation;
pub use error::{ExportError, GraphError};
pub use export::{export_model_as_pb, ExportSettings};
pub use graph::FrozenGraph;
pub use model::{create_model, create_model_with_seed, ModelBuilder, Sequential};
pub use shape::Shape;
