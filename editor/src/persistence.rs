//! Saving and loading documents.
//!
//! A document is stored as the list of its nodes, each with the registry identifier of its kind and its inputs,
//! plus the structure tree and canvas size. Layer images travel inside their `Image` literals.

use crate::config::DocumentConfig;
use crate::consts::FILE_FORMAT_VERSION;
use crate::document::{Document, DocumentState};
use crate::error::PersistenceError;
use crate::structure::StructureTree;
use core_types::NodeId;
use glam::UVec2;
use graph_craft::{GraphError, InputConnector, NodeInput, NodeNetwork};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializedNode {
	pub id: NodeId,
	pub identifier: String,
	pub inputs: Vec<NodeInput>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializedDocument {
	pub version: u32,
	pub size: UVec2,
	pub output_node: NodeId,
	/// Sorted by id.
	pub nodes: Vec<SerializedNode>,
	pub structure: StructureTree,
}

impl Document {
	pub fn serialize(&self) -> SerializedDocument {
		let state = self.state();
		let mut nodes: Vec<_> = state
			.network
			.nodes()
			.map(|(id, node)| SerializedNode {
				id,
				identifier: node.metadata().identifier.to_string(),
				inputs: node.inputs().to_vec(),
			})
			.collect();
		nodes.sort_by_key(|node| node.id);

		SerializedDocument {
			version: FILE_FORMAT_VERSION,
			size: state.size,
			output_node: state.output_node,
			nodes,
			structure: state.structure.clone(),
		}
	}

	/// Rebuilds a document from its serialized form. The history starts out empty.
	pub fn from_serialized(serialized: SerializedDocument, config: DocumentConfig) -> Result<Self, PersistenceError> {
		if serialized.version != FILE_FORMAT_VERSION {
			return Err(PersistenceError::UnsupportedVersion(serialized.version));
		}

		let mut network = NodeNetwork::new();
		for node in &serialized.nodes {
			let implementation = raster_nodes::create_node(&node.identifier).ok_or_else(|| PersistenceError::UnknownNodeKind {
				id: node.id,
				identifier: node.identifier.clone(),
			})?;
			network.insert_node(node.id, implementation)?;
		}

		// Connections go in once every node exists, so their order in the file does not matter
		for node in serialized.nodes {
			for (index, input) in node.inputs.into_iter().enumerate() {
				let connector = InputConnector::node(node.id, index);
				network.set_input_value(connector, input.value)?;
				if let Some(source) = input.source {
					network.connect(source, connector).map_err(|error| match error {
						GraphError::NodeNotFound(_) | GraphError::InvalidOutputIndex { .. } => PersistenceError::DanglingConnection(node.id),
						error => error.into(),
					})?;
				}
			}
		}

		if !network.contains(serialized.output_node) {
			return Err(GraphError::NodeNotFound(serialized.output_node).into());
		}
		for id in serialized.structure.descendants(None) {
			let (Some(member), Some(node)) = (serialized.structure.member(id), network.node(id)) else {
				return Err(PersistenceError::MissingMemberNode(id));
			};
			let identifier = node.metadata().identifier;
			if identifier != member.kind.node_identifier() {
				return Err(PersistenceError::MismatchedMemberNode {
					id,
					kind: member.kind,
					identifier: identifier.to_string(),
				});
			}
		}

		log::debug!("Loaded a document of {} nodes", network.len());
		let state = DocumentState::from_parts(network, serialized.structure, serialized.size, serialized.output_node);
		Ok(Document::from_state(state, config))
	}

	pub fn to_json(&self) -> Result<String, PersistenceError> {
		Ok(serde_json::to_string(&self.serialize())?)
	}

	pub fn from_json(source: &str, config: DocumentConfig) -> Result<Self, PersistenceError> {
		Self::from_serialized(serde_json::from_str(source)?, config)
	}
}
