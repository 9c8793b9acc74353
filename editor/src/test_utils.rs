use crate::changes::{Change, CreateStructureMember};
use crate::document::DocumentState;
use crate::structure::{MemberKind, MemberLocation, StructureTree};
use core_types::{NodeId, RenderParams, TaggedValue};
use glam::{DVec2, UVec2};
use graph_craft::{GraphExecutor, InputConnector, NodeInput, OutputConnector};
use pretty_assertions::assert_eq;
use raster_nodes::{ImageLayerNode, InvertNode, RectangleNode};
use raster_types::Surface;

pub fn init_logger() {
	let _ = env_logger::builder().is_test(true).try_init();
}

pub struct FixtureIds {
	pub shape: NodeId,
	pub filter: NodeId,
	pub layer: NodeId,
}

/// A 128×128 document with one root layer. A rectangle node feeds both the layer's image and an invert filter.
pub fn shape_over_layer() -> (DocumentState, FixtureIds) {
	let mut state = DocumentState::new(UVec2::splat(128));
	let ids = FixtureIds {
		shape: NodeId::new(),
		filter: NodeId::new(),
		layer: NodeId::new(),
	};

	let mut create = CreateStructureMember::new(ids.layer, "Layer".into(), MemberKind::Layer, MemberLocation::root(0));
	create.initialize(&state).unwrap();
	create.apply(&mut state, true).unwrap();

	let network = &mut state.network;
	network.insert_node(ids.shape, Box::new(RectangleNode)).unwrap();
	network.set_input_value(InputConnector::node(ids.shape, 0), DVec2::splat(16.).into()).unwrap();
	network.set_input_value(InputConnector::node(ids.shape, 1), DVec2::new(64., 48.).into()).unwrap();
	network.insert_node(ids.filter, Box::new(InvertNode)).unwrap();
	network.connect(OutputConnector::node(ids.shape, 0), InputConnector::node(ids.filter, 0)).unwrap();
	network.connect(OutputConnector::node(ids.shape, 0), InputConnector::node(ids.layer, ImageLayerNode::IMAGE)).unwrap();

	(state, ids)
}

/// Everything about a document a user could notice.
#[derive(Debug, PartialEq)]
pub struct Observation {
	pub nodes: Vec<(NodeId, &'static str, Vec<NodeInput>)>,
	pub structure: StructureTree,
	pub size: UVec2,
	pub render: TaggedValue,
}

pub fn observe(state: &DocumentState) -> Observation {
	let mut nodes: Vec<_> = state.network.nodes().map(|(id, node)| (id, node.metadata().identifier, node.inputs().to_vec())).collect();
	nodes.sort_by_key(|(id, _, _)| *id);
	let render = GraphExecutor::new().evaluate_uncached(&state.network, state.output_node, RenderParams::new(state.size)).unwrap();

	Observation {
		nodes,
		structure: state.structure.clone(),
		size: state.size,
		render,
	}
}

/// Applies `change`, then checks that reverting and redoing it move the document exactly between the two states.
/// Leaves the document as it was before.
pub fn assert_reverts(state: &mut DocumentState, mut change: impl Change) {
	let before = observe(state);
	change.initialize(state).unwrap();
	change.apply(state, true).unwrap();
	let after = observe(state);

	change.revert(state).unwrap();
	assert_eq!(observe(state), before, "reverting {change:?}");

	change.apply(state, false).unwrap();
	assert_eq!(observe(state), after, "redoing {change:?}");

	change.revert(state).unwrap();
	assert_eq!(observe(state), before, "reverting the redone {change:?}");
}

pub fn layer_image(state: &DocumentState, layer: NodeId) -> &Surface {
	state.layer_image(layer).unwrap()
}
