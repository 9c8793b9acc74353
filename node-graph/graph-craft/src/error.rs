use crate::document::{InputConnector, OutputConnector};
use core_types::{NodeId, Type};

/// Structural failures of graph edits and lookups. A failed edit leaves the network unchanged.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
	#[error("Node {0} not found")]
	NodeNotFound(NodeId),
	#[error("Node {0} already exists")]
	DuplicateNodeId(NodeId),
	#[error("Node {node_id} has no input {index}")]
	InvalidInputIndex { node_id: NodeId, index: usize },
	#[error("Node {node_id} has no output {index}")]
	InvalidOutputIndex { node_id: NodeId, index: usize },
	#[error("The {0} is already connected")]
	InputAlreadyConnected(InputConnector),
	#[error("The {0} is not connected")]
	InputNotConnected(InputConnector),
	#[error("Cannot connect a {found} output to a {expected} input")]
	TypeMismatch { expected: Type, found: Type },
	#[error("Connecting {output} to {input} would create a cycle")]
	CycleDetected { output: OutputConnector, input: InputConnector },
	#[error("Cycle detected involving node {0}")]
	CycleInvolving(NodeId),
}
