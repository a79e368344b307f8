use thiserror::Error;

use super::NodeId;


/// Errors raised while building or solving an assignment problem.
#[derive(Error, Debug)]
pub enum TapError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A network or trips file could not be understood.
    #[error("Parse error on line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Node {node} is out of range for a network of {num_nodes} nodes")]
    InvalidNode { node: NodeId, num_nodes: usize },

    /// Demand was declared towards nodes that no path from the origin reaches.
    #[error("Destinations {destinations:?} are unreachable from origin {origin}")]
    UnreachableDestination { origin: NodeId, destinations: Vec<NodeId> },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] yaml_rust::ScanError),
}

pub type TapResult<T> = Result<T, TapError>;

impl TapError {
    pub fn parse(line: usize, message: impl Into<String>) -> TapError {
        TapError::Parse { line, message: message.into() }
    }
}
