use crate::structure::MemberKind;
use core_types::NodeId;
use graph_craft::GraphError;
use raster_types::SurfaceError;
use thiserror::Error;

/// Why a change could not be applied or reverted. The document is left as it was before the attempt.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ChangeError {
	#[error(transparent)]
	Graph(#[from] GraphError),

	#[error(transparent)]
	Surface(#[from] SurfaceError),

	#[error("Structure member {0} does not exist")]
	MemberNotFound(NodeId),

	#[error("Node {0} does not exist")]
	NodeNotFound(NodeId),

	#[error("Node {0} backs a structure member and must be removed through the structure tree")]
	NodeIsStructureMember(NodeId),

	#[error("The document output node {0} cannot be removed")]
	OutputNodeRemoval(NodeId),

	#[error("Cannot move member {member}: {reason}")]
	InvalidStructureMove { member: NodeId, reason: &'static str },

	#[error("Unknown node kind '{0}'")]
	UnknownNodeKind(String),

	#[error("Invalid parameter: {0}")]
	InvalidParameter(String),

	#[error("The change was reverted before it was applied")]
	NotApplied,
}

/// Misuse of the change tracker's start, update and end protocol.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum TrackerError {
	#[error("An interactive change is in progress and must be ended first")]
	ChangeInProgress,

	#[error("There is no interactive change to update or end")]
	NoActiveChange,

	#[error("The action does not target the interactive change in progress")]
	MismatchedChange,

	#[error("Changes were recorded since the last change boundary")]
	PacketOpen,
}

#[derive(Debug, Error)]
pub enum PersistenceError {
	#[error("Failed to read JSON: {0}")]
	Json(#[from] serde_json::Error),

	#[error("Failed to read RON: {0}")]
	Ron(#[from] ron::error::SpannedError),

	#[error("Unknown node kind '{identifier}' for node {id}")]
	UnknownNodeKind { id: NodeId, identifier: String },

	#[error("Connection into node {0} refers to a missing node or port")]
	DanglingConnection(NodeId),

	#[error("Structure member {0} has no backing node")]
	MissingMemberNode(NodeId),

	#[error("Structure member {id} is a {kind:?} but its node is a '{identifier}'")]
	MismatchedMemberNode { id: NodeId, kind: MemberKind, identifier: String },

	#[error("Unsupported file format version {0}")]
	UnsupportedVersion(u32),

	#[error(transparent)]
	Graph(#[from] GraphError),
}

/// The error type of the public [`crate::document::Document`] API.
#[derive(Debug, Error)]
pub enum DocumentError {
	#[error(transparent)]
	Change(#[from] ChangeError),

	#[error(transparent)]
	Tracker(#[from] TrackerError),

	#[error(transparent)]
	Persistence(#[from] PersistenceError),

	#[error(transparent)]
	Graph(#[from] GraphError),
}
