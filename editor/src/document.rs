use crate::actions::Action;
use crate::changes::Change;
use crate::config::DocumentConfig;
use crate::error::{ChangeError, DocumentError};
use crate::history::ChangeTracker;
use crate::response::DocumentResponse;
use crate::structure::{self, MemberKind, StructureMember, StructureTree};
use core_types::{NodeId, RenderParams, TaggedValue};
use glam::UVec2;
use graph_craft::{EvaluationStats, GraphExecutor, InputConnector, NodeInput, NodeNetwork, OutputConnector};
use raster_nodes::{ImageLayerNode, OutputNode};
use raster_types::{RectI, Resolution, Surface};

/// Everything changes operate on: the node graph, the structure tree mirroring part of it, and the canvas size.
#[derive(Debug)]
pub struct DocumentState {
	pub network: NodeNetwork,
	pub structure: StructureTree,
	pub size: UVec2,
	/// The node whose primary output is the rendered document. It can never be deleted.
	pub output_node: NodeId,
}

impl DocumentState {
	pub fn new(size: UVec2) -> Self {
		let output_node = NodeId::new();
		let mut network = NodeNetwork::new();
		if let Err(error) = network.insert_node(output_node, Box::new(OutputNode)) {
			log::warn!("Failed to create the output node: {error}");
		}
		Self {
			network,
			structure: StructureTree::new(),
			size,
			output_node,
		}
	}

	pub(crate) fn from_parts(network: NodeNetwork, structure: StructureTree, size: UVec2, output_node: NodeId) -> Self {
		Self { network, structure, size, output_node }
	}

	/// Fails unless `id` is a layer of the structure tree.
	pub fn check_layer(&self, id: NodeId) -> Result<(), ChangeError> {
		match self.structure.member(id) {
			Some(member) if member.kind == MemberKind::Layer => Ok(()),
			Some(_) => Err(ChangeError::InvalidParameter(format!("member {id} is a folder, not a layer"))),
			None => Err(ChangeError::MemberNotFound(id)),
		}
	}

	/// The image a layer draws, stored as the literal of its image input.
	pub fn layer_image(&self, layer: NodeId) -> Result<&Surface, ChangeError> {
		self.check_layer(layer)?;
		self.network
			.input(InputConnector::node(layer, ImageLayerNode::IMAGE))?
			.value
			.as_surface()
			.ok_or_else(|| ChangeError::InvalidParameter(format!("layer {layer} has no image")))
	}

	pub fn layer_image_mut(&mut self, layer: NodeId) -> Result<&mut Surface, ChangeError> {
		self.check_layer(layer)?;
		let size = self.size;
		let value = self.network.input_value_mut(InputConnector::node(layer, ImageLayerNode::IMAGE))?;
		if value.as_surface().is_none() {
			*value = TaggedValue::Surface(Surface::new(size));
		}
		value.as_surface_mut().ok_or_else(|| ChangeError::InvalidParameter(format!("layer {layer} has no image")))
	}

	/// Every layer in the structure tree, folders excluded, in pre-order.
	pub fn layers(&self) -> Vec<NodeId> {
		self.structure
			.descendants(None)
			.into_iter()
			.filter(|id| self.structure.member(*id).is_some_and(|member| member.kind == MemberKind::Layer))
			.collect()
	}

	/// Rewires the layer chain after the structure tree was edited.
	pub fn sync_structure(&mut self) -> Result<Vec<DocumentResponse>, ChangeError> {
		structure::sync_structure(&mut self.network, &self.structure, self.output_node)
	}
}

/// A document: its state, the undo history of the changes applied to it, and the executor rendering it.
#[derive(Debug)]
pub struct Document {
	state: DocumentState,
	history: ChangeTracker,
	executor: GraphExecutor,
	config: DocumentConfig,
}

impl Default for Document {
	fn default() -> Self {
		Self::new()
	}
}

impl Document {
	pub fn new() -> Self {
		Self::with_config(DocumentConfig::default())
	}

	pub fn with_config(config: DocumentConfig) -> Self {
		let state = DocumentState::new(config.default_document_size);
		Self::from_state(state, config)
	}

	pub(crate) fn from_state(state: DocumentState, config: DocumentConfig) -> Self {
		Self {
			state,
			history: ChangeTracker::new(&config),
			executor: GraphExecutor::new(),
			config,
		}
	}

	pub fn config(&self) -> &DocumentConfig {
		&self.config
	}

	pub fn state(&self) -> &DocumentState {
		&self.state
	}

	/// Handles one action. On failure the document and its history are left as they were.
	pub fn process_action(&mut self, action: impl Into<Action>) -> Result<Vec<DocumentResponse>, DocumentError> {
		let action = action.into();
		log::trace!("Processing {action:?}");

		let target = &mut self.state;
		let result = match action {
			Action::Make(action) => self.history.make_change(target, action.create_change()),
			Action::StartOrUpdate(action) => self.history.start_or_update(target, action.as_ref()),
			Action::End(action) => self.history.end(target, action.as_ref()),
			Action::Undo => self.history.undo(target),
			Action::Redo => self.history.redo(target),
			Action::ChangeBoundary => {
				self.history.change_boundary();
				Ok(Vec::new())
			}
			Action::DeleteRecordedChanges => self.history.delete_recorded_changes().map(|_| Vec::new()).map_err(DocumentError::from),
		};
		if let Err(error) = &result {
			log::warn!("Rejected action: {error}");
		}
		result
	}

	/// Handles actions in order, stopping at the first that fails.
	pub fn process_actions(&mut self, actions: impl IntoIterator<Item = Action>) -> Result<Vec<DocumentResponse>, DocumentError> {
		let mut responses = Vec::new();
		for action in actions {
			responses.extend(self.process_action(action)?);
		}
		Ok(responses)
	}

	/// Handles an action as its own undo step.
	pub fn execute(&mut self, action: impl Into<Action>) -> Result<Vec<DocumentResponse>, DocumentError> {
		let result = self.process_action(action);
		if !self.history.has_active_change() {
			self.history.change_boundary();
		}
		result
	}

	/// Applies an already built change as its own undo step.
	pub fn apply_change(&mut self, change: Box<dyn Change>) -> Result<Vec<DocumentResponse>, DocumentError> {
		let result = self.history.make_change(&mut self.state, change);
		self.history.change_boundary();
		result
	}

	pub fn undo(&mut self) -> Result<Vec<DocumentResponse>, DocumentError> {
		self.process_action(Action::Undo)
	}

	pub fn redo(&mut self) -> Result<Vec<DocumentResponse>, DocumentError> {
		self.process_action(Action::Redo)
	}

	pub fn can_undo(&self) -> bool {
		self.history.can_undo()
	}

	pub fn can_redo(&self) -> bool {
		self.history.can_redo()
	}

	pub fn undo_len(&self) -> usize {
		self.history.undo_len()
	}

	pub fn redo_len(&self) -> usize {
		self.history.redo_len()
	}

	pub fn structure(&self) -> &StructureTree {
		&self.state.structure
	}

	pub fn member(&self, id: NodeId) -> Option<&StructureMember> {
		self.state.structure.member(id)
	}

	pub fn network(&self) -> &NodeNetwork {
		&self.state.network
	}

	pub fn size(&self) -> UVec2 {
		self.state.size
	}

	pub fn output_node(&self) -> NodeId {
		self.state.output_node
	}

	pub fn node_inputs(&self, id: NodeId) -> Option<&[NodeInput]> {
		self.state.network.node(id).map(|node| node.inputs())
	}

	/// The value an output held after the last evaluation that executed its node.
	pub fn node_output(&self, id: NodeId, index: usize) -> Option<&TaggedValue> {
		self.state.network.cached_output(OutputConnector::node(id, index))
	}

	fn params(&self) -> RenderParams {
		RenderParams::new(self.state.size)
	}

	/// Renders the primary output of `node`, executing only what changed since the last render.
	pub fn render_with_stats(&mut self, node: NodeId, resolution: Resolution) -> Result<(Surface, EvaluationStats), DocumentError> {
		let params = self.params();
		let (value, stats) = self.executor.evaluate_with_stats(&mut self.state.network, node, params)?;
		if self.config.check_pool_leaks && stats.leaked_surfaces > 0 {
			log::error!("Rendering node {node} leaked {} pooled surfaces", stats.leaked_surfaces);
		}
		Ok((self.present(value, resolution), stats))
	}

	pub fn render(&mut self, node: NodeId, resolution: Resolution) -> Result<Surface, DocumentError> {
		self.render_with_stats(node, resolution).map(|(surface, _)| surface)
	}

	pub fn render_document(&mut self, resolution: Resolution) -> Result<Surface, DocumentError> {
		self.render(self.state.output_node, resolution)
	}

	/// Renders `node` from scratch, without consulting or filling any cache.
	pub fn render_uncached(&mut self, node: NodeId, resolution: Resolution) -> Result<Surface, DocumentError> {
		let params = self.params();
		let value = self.executor.evaluate_uncached(&self.state.network, node, params)?;
		Ok(self.present(value, resolution))
	}

	/// Turns an evaluation result into a surface at the requested resolution. Anything that is not an image renders empty.
	fn present(&self, value: TaggedValue, resolution: Resolution) -> Surface {
		let Some(surface) = value.into_surface() else {
			log::trace!("Render produced no image");
			return Surface::new(self.state.size);
		};
		if resolution == Resolution::Full {
			return surface;
		}

		let factor = resolution.downscale_factor();
		let size = (surface.size() + UVec2::splat(factor - 1)) / factor;
		let pixels = surface.read_region(RectI::from_size(size), resolution);
		Surface::from_pixels(size, &pixels).unwrap_or_else(|error| {
			log::warn!("Failed to downsample a render: {error}");
			Surface::new(size)
		})
	}
}
