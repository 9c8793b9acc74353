use super::{Change, ChangeOutcome, UpdateableChange, same_kind};
use crate::document::DocumentState;
use crate::error::ChangeError;
use crate::response::DocumentResponse;
use core_types::{NodeId, TaggedValue};
use graph_craft::{GraphError, InputConnector, OutputConnector, RemovedNode};

#[derive(Debug)]
pub struct CreateNode {
	id: NodeId,
	identifier: String,
}

impl CreateNode {
	pub fn new(id: NodeId, identifier: String) -> Self {
		Self { id, identifier }
	}
}

impl Change for CreateNode {
	fn initialize(&mut self, target: &DocumentState) -> Result<(), ChangeError> {
		if target.network.contains(self.id) {
			return Err(GraphError::DuplicateNodeId(self.id).into());
		}
		if raster_nodes::create_node(&self.identifier).is_none() {
			return Err(ChangeError::UnknownNodeKind(self.identifier.clone()));
		}
		Ok(())
	}

	fn apply(&mut self, target: &mut DocumentState, _first_apply: bool) -> Result<ChangeOutcome, ChangeError> {
		let node = raster_nodes::create_node(&self.identifier).ok_or_else(|| ChangeError::UnknownNodeKind(self.identifier.clone()))?;
		target.network.insert_node(self.id, node)?;
		Ok(vec![DocumentResponse::NodeCreated(self.id)].into())
	}

	fn revert(&mut self, target: &mut DocumentState) -> Result<Vec<DocumentResponse>, ChangeError> {
		target.network.remove_node(self.id)?;
		Ok(vec![DocumentResponse::NodeDeleted(self.id)])
	}
}

/// Removes a node that is not part of the structure tree. Every consumer it fed falls back to its literal input.
#[derive(Debug)]
pub struct DeleteNode {
	id: NodeId,
	removed: Option<RemovedNode>,
}

impl DeleteNode {
	pub fn new(id: NodeId) -> Self {
		Self { id, removed: None }
	}
}

impl Change for DeleteNode {
	fn initialize(&mut self, target: &DocumentState) -> Result<(), ChangeError> {
		if !target.network.contains(self.id) {
			return Err(ChangeError::NodeNotFound(self.id));
		}
		if target.structure.contains(self.id) {
			return Err(ChangeError::NodeIsStructureMember(self.id));
		}
		if target.output_node == self.id {
			return Err(ChangeError::OutputNodeRemoval(self.id));
		}
		Ok(())
	}

	fn apply(&mut self, target: &mut DocumentState, _first_apply: bool) -> Result<ChangeOutcome, ChangeError> {
		let removed = target.network.remove_node(self.id)?;
		let mut responses = vec![DocumentResponse::NodeDeleted(self.id)];
		responses.extend(removed.severed().iter().map(|(_, input)| DocumentResponse::ConnectionChanged(*input)));
		self.removed = Some(removed);
		Ok(responses.into())
	}

	fn revert(&mut self, target: &mut DocumentState) -> Result<Vec<DocumentResponse>, ChangeError> {
		let removed = self.removed.take().ok_or(ChangeError::NotApplied)?;
		let mut responses = vec![DocumentResponse::NodeCreated(self.id)];
		responses.extend(removed.severed().iter().map(|(_, input)| DocumentResponse::ConnectionChanged(*input)));
		target.network.restore_node(removed)?;
		Ok(responses)
	}
}

/// Connects an output to an input, replacing whatever fed that input before.
#[derive(Debug)]
pub struct ConnectProperties {
	output: OutputConnector,
	input: InputConnector,
	previous: Option<OutputConnector>,
}

impl ConnectProperties {
	pub fn new(output: OutputConnector, input: InputConnector) -> Self {
		Self { output, input, previous: None }
	}
}

impl Change for ConnectProperties {
	fn initialize(&mut self, target: &DocumentState) -> Result<(), ChangeError> {
		if !target.network.contains(self.output.node_id) {
			return Err(GraphError::NodeNotFound(self.output.node_id).into());
		}
		self.previous = target.network.input(self.input)?.source;
		Ok(())
	}

	fn apply(&mut self, target: &mut DocumentState, _first_apply: bool) -> Result<ChangeOutcome, ChangeError> {
		if self.previous == Some(self.output) {
			return Ok(ChangeOutcome::ignored());
		}

		target.network.disconnect(self.input)?;
		if let Err(error) = target.network.connect(self.output, self.input) {
			if let Some(previous) = self.previous {
				target.network.connect(previous, self.input)?;
			}
			return Err(error.into());
		}
		Ok(vec![DocumentResponse::ConnectionChanged(self.input)].into())
	}

	fn revert(&mut self, target: &mut DocumentState) -> Result<Vec<DocumentResponse>, ChangeError> {
		target.network.disconnect(self.input)?;
		if let Some(previous) = self.previous {
			target.network.connect(previous, self.input)?;
		}
		Ok(vec![DocumentResponse::ConnectionChanged(self.input)])
	}
}

#[derive(Debug)]
pub struct DisconnectProperty {
	input: InputConnector,
	previous: Option<OutputConnector>,
}

impl DisconnectProperty {
	pub fn new(input: InputConnector) -> Self {
		Self { input, previous: None }
	}
}

impl Change for DisconnectProperty {
	fn initialize(&mut self, target: &DocumentState) -> Result<(), ChangeError> {
		self.previous = target.network.input(self.input)?.source;
		if self.previous.is_none() {
			return Err(GraphError::InputNotConnected(self.input).into());
		}
		Ok(())
	}

	fn apply(&mut self, target: &mut DocumentState, _first_apply: bool) -> Result<ChangeOutcome, ChangeError> {
		target.network.disconnect(self.input)?;
		Ok(vec![DocumentResponse::ConnectionChanged(self.input)].into())
	}

	fn revert(&mut self, target: &mut DocumentState) -> Result<Vec<DocumentResponse>, ChangeError> {
		let previous = self.previous.ok_or(GraphError::InputNotConnected(self.input))?;
		target.network.connect(previous, self.input)?;
		Ok(vec![DocumentResponse::ConnectionChanged(self.input)])
	}
}

/// Sets the literal value of an input. Only edits of the same input to the same value merge into one undo entry.
#[derive(Debug)]
pub struct UpdatePropertyValue {
	input: InputConnector,
	value: TaggedValue,
	original: TaggedValue,
}

impl UpdatePropertyValue {
	pub fn new(input: InputConnector, value: TaggedValue) -> Self {
		Self {
			input,
			value,
			original: TaggedValue::None,
		}
	}

	pub fn update(&mut self, input: InputConnector, value: TaggedValue) {
		if input != self.input {
			log::warn!("Ignoring an update of {input} sent to the edit of {}", self.input);
			return;
		}
		self.value = value;
	}
}

impl Change for UpdatePropertyValue {
	fn initialize(&mut self, target: &DocumentState) -> Result<(), ChangeError> {
		let node = target.network.node(self.input.node_id).ok_or(ChangeError::NodeNotFound(self.input.node_id))?;
		let declaration = node.signature().inputs.get(self.input.input_index).ok_or(GraphError::InvalidInputIndex {
			node_id: self.input.node_id,
			index: self.input.input_index,
		})?;
		if !declaration.ty.accepts(&self.value) {
			return Err(GraphError::TypeMismatch {
				expected: declaration.ty,
				found: self.value.ty(),
			}
			.into());
		}
		self.original = target.network.input(self.input)?.value.clone();
		Ok(())
	}

	fn apply(&mut self, target: &mut DocumentState, first_apply: bool) -> Result<ChangeOutcome, ChangeError> {
		target.network.set_input_value(self.input, self.value.clone())?;
		if first_apply && self.value == self.original {
			return Ok(ChangeOutcome::ignored());
		}
		Ok(vec![DocumentResponse::InputValueChanged(self.input)].into())
	}

	fn revert(&mut self, target: &mut DocumentState) -> Result<Vec<DocumentResponse>, ChangeError> {
		target.network.set_input_value(self.input, self.original.clone())?;
		Ok(vec![DocumentResponse::InputValueChanged(self.input)])
	}

	fn is_mergeable_with(&self, other: &dyn Change) -> bool {
		same_kind(self, other).is_some_and(|other| other.input == self.input && other.value == self.value)
	}
}

impl UpdateableChange for UpdatePropertyValue {
	fn apply_temporarily(&mut self, target: &mut DocumentState) -> Result<Vec<DocumentResponse>, ChangeError> {
		target.network.set_input_value(self.input, self.value.clone())?;
		Ok(vec![DocumentResponse::InputValueChanged(self.input)])
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::test_utils::{assert_reverts, init_logger, observe, shape_over_layer};
	use pretty_assertions::assert_eq;

	#[test]
	fn delete_node_restores_every_consumer() {
		init_logger();
		let (mut state, ids) = shape_over_layer();
		let consumers = state.network.outward_links(ids.shape);
		assert_eq!(consumers.len(), 2);

		assert_reverts(&mut state, DeleteNode::new(ids.shape));
		assert_eq!(state.network.outward_links(ids.shape), consumers);
	}

	#[test]
	fn structure_nodes_are_not_deleted_directly() {
		let (state, ids) = shape_over_layer();
		assert_eq!(DeleteNode::new(ids.layer).initialize(&state), Err(ChangeError::NodeIsStructureMember(ids.layer)));
		assert_eq!(DeleteNode::new(state.output_node).initialize(&state), Err(ChangeError::OutputNodeRemoval(state.output_node)));
	}

	#[test]
	fn connect_replaces_and_restores_previous_source() {
		let (mut state, ids) = shape_over_layer();
		let input = InputConnector::node(ids.filter, 0);
		let previous = state.network.input(input).unwrap().source;
		assert!(previous.is_some());

		assert_reverts(&mut state, ConnectProperties::new(OutputConnector::node(ids.layer, 0), input));
		assert_eq!(state.network.input(input).unwrap().source, previous);
	}

	#[test]
	fn connect_rejects_cycles_without_touching_the_graph() {
		let (mut state, ids) = shape_over_layer();
		state.network.connect(OutputConnector::node(ids.filter, 0), InputConnector::node(ids.layer, 0)).unwrap();
		let before = observe(&state);

		let mut change = ConnectProperties::new(OutputConnector::node(ids.layer, 0), InputConnector::node(ids.filter, 0));
		change.initialize(&state).unwrap();
		assert!(matches!(change.apply(&mut state, true), Err(ChangeError::Graph(GraphError::CycleDetected { .. }))));
		assert_eq!(observe(&state), before);

		let mut self_loop = ConnectProperties::new(OutputConnector::node(ids.filter, 0), InputConnector::node(ids.filter, 0));
		self_loop.initialize(&state).unwrap();
		assert!(self_loop.apply(&mut state, true).is_err());
		assert_eq!(observe(&state), before);
	}

	#[test]
	fn disconnect_requires_a_connection() {
		let (mut state, ids) = shape_over_layer();
		let mut change = DisconnectProperty::new(InputConnector::node(ids.shape, 0));
		assert_eq!(change.initialize(&state), Err(GraphError::InputNotConnected(InputConnector::node(ids.shape, 0)).into()));

		assert_reverts(&mut state, DisconnectProperty::new(InputConnector::node(ids.filter, 0)));
	}

	#[test]
	fn property_values_are_type_checked_and_reverted() {
		let (mut state, ids) = shape_over_layer();
		let input = InputConnector::node(ids.shape, 1);
		let mut wrong = UpdatePropertyValue::new(input, TaggedValue::Bool(true));
		assert!(matches!(wrong.initialize(&state), Err(ChangeError::Graph(GraphError::TypeMismatch { .. }))));

		assert_reverts(&mut state, UpdatePropertyValue::new(input, TaggedValue::DVec2(glam::DVec2::new(3., 4.))));
	}

	#[test]
	fn setting_the_current_value_is_ignored() {
		let (mut state, ids) = shape_over_layer();
		let input = InputConnector::node(ids.shape, 1);
		let current = state.network.input(input).unwrap().value.clone();
		let mut change = UpdatePropertyValue::new(input, current);
		change.initialize(&state).unwrap();
		assert!(change.apply(&mut state, true).unwrap().ignore_in_undo);
	}

	#[test]
	fn only_equal_edits_of_the_same_input_merge() {
		let input = InputConnector::node(NodeId(1), 0);
		let first = UpdatePropertyValue::new(input, TaggedValue::F64(1.));
		assert!(first.is_mergeable_with(&UpdatePropertyValue::new(input, TaggedValue::F64(1.))));
		assert!(!first.is_mergeable_with(&UpdatePropertyValue::new(input, TaggedValue::F64(2.))));
		assert!(!first.is_mergeable_with(&UpdatePropertyValue::new(InputConnector::node(NodeId(1), 1), TaggedValue::F64(1.))));
		assert!(!first.is_mergeable_with(&DisconnectProperty::new(input)));
	}
}
