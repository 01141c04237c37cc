use std::{io, path::PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("input of {len} values is not a whole batch of width {width}")]
    InputWidth { width: usize, len: usize },
    #[error("node '{0}' is referenced before it is defined")]
    MissingNode(String),
    #[error("node '{node}' expected width {expected} but found {found}")]
    WidthMismatch { node: String, expected: usize, found: usize },
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to write frozen graph: {0}")]
    Io(#[from] io::Error),
    #[error("frozen graph does not match model: expected {expected}, found {found}")]
    ShapeMismatch { expected: String, found: String },
    #[error(transparent)]
    Graph(#[from] GraphError),
    #[error("output path '{}' does not name a file", .0.display())]
    InvalidPath(PathBuf),
}
