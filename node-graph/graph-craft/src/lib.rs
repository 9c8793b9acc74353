pub mod document;
pub mod error;
pub mod executor;

#[cfg(test)]
mod test_nodes;

pub use document::{DocumentNode, InputConnector, NodeInput, NodeNetwork, OutputConnector, RemovedNode};
pub use error::GraphError;
pub use executor::{EvaluationStats, GraphExecutor};
