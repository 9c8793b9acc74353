use crate::GraphError;
use core_types::{CacheTriggers, Node, NodeId, NodeMetadata, NodeSignature, TaggedValue, Type};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

/// Addresses one output port of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OutputConnector {
	pub node_id: NodeId,
	pub output_index: usize,
}

impl OutputConnector {
	pub fn node(node_id: NodeId, output_index: usize) -> Self {
		Self { node_id, output_index }
	}
}

impl std::fmt::Display for OutputConnector {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "output {} of node {}", self.output_index, self.node_id)
	}
}

/// Addresses one input port of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InputConnector {
	pub node_id: NodeId,
	pub input_index: usize,
}

impl InputConnector {
	pub fn node(node_id: NodeId, input_index: usize) -> Self {
		Self { node_id, input_index }
	}
}

impl std::fmt::Display for InputConnector {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "input {} of node {}", self.input_index, self.node_id)
	}
}

/// Runtime state of an input port. The literal value is kept while the port is connected,
/// so disconnecting falls back to it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeInput {
	pub value: TaggedValue,
	pub source: Option<OutputConnector>,
}

impl NodeInput {
	pub fn value(value: impl Into<TaggedValue>) -> Self {
		Self { value: value.into(), source: None }
	}

	pub fn is_connected(&self) -> bool {
		self.source.is_some()
	}
}

/// What the executor remembers about a node between evaluations.
#[derive(Debug, Default)]
pub(crate) struct NodeCache {
	pub key: Option<u64>,
	pub outputs: Vec<TaggedValue>,
	pub output_hash: Option<u64>,
	/// Bumped only when the outputs actually change, so downstream keys stay stable otherwise.
	pub version: u64,
	/// Counter for explicit invalidation, mixed into every cache key.
	pub invalidation: u64,
}

#[derive(Debug)]
pub struct DocumentNode {
	implementation: Box<dyn Node>,
	signature: NodeSignature,
	triggers: CacheTriggers,
	pub(crate) inputs: Vec<NodeInput>,
	pub(crate) cache: NodeCache,
}

impl DocumentNode {
	pub fn new(implementation: Box<dyn Node>) -> Self {
		let signature = implementation.signature();
		let triggers = implementation.cache_triggers();
		let inputs = signature.inputs.iter().map(|input| NodeInput::value(input.default.clone())).collect();
		Self {
			implementation,
			signature,
			triggers,
			inputs,
			cache: NodeCache::default(),
		}
	}

	pub fn implementation(&self) -> &dyn Node {
		self.implementation.as_ref()
	}

	pub fn metadata(&self) -> NodeMetadata {
		self.implementation.metadata()
	}

	pub fn signature(&self) -> &NodeSignature {
		&self.signature
	}

	pub fn cache_triggers(&self) -> CacheTriggers {
		self.triggers
	}

	pub fn inputs(&self) -> &[NodeInput] {
		&self.inputs
	}

	pub fn input(&self, index: usize) -> Option<&NodeInput> {
		self.inputs.get(index)
	}

	/// Outputs produced by the most recent execution, empty if the node never ran.
	pub fn cached_outputs(&self) -> &[TaggedValue] {
		&self.cache.outputs
	}

	/// Version of the cached outputs. `0` means the node has not produced outputs yet.
	pub fn version(&self) -> u64 {
		self.cache.version
	}

	fn output_type(&self, index: usize) -> Option<Type> {
		self.signature.outputs.get(index).map(|output| output.ty)
	}

	fn input_type(&self, index: usize) -> Option<Type> {
		self.signature.inputs.get(index).map(|input| input.ty)
	}
}

/// A node taken out of a network together with the downstream connections its removal severed.
#[derive(Debug)]
pub struct RemovedNode {
	id: NodeId,
	node: DocumentNode,
	severed: Vec<(OutputConnector, InputConnector)>,
}

impl RemovedNode {
	pub fn id(&self) -> NodeId {
		self.id
	}

	pub fn node(&self) -> &DocumentNode {
		&self.node
	}

	pub fn severed(&self) -> &[(OutputConnector, InputConnector)] {
		&self.severed
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeState {
	Unvisited,
	Visiting,
	Visited,
}

/// Owns every node of a graph. Connections are stored on the inputs as node id pairs.
#[derive(Debug, Default)]
pub struct NodeNetwork {
	nodes: FxHashMap<NodeId, DocumentNode>,
	topology_version: u64,
	next_cache_version: u64,
	order_cache: FxHashMap<NodeId, Vec<NodeId>>,
}

impl NodeNetwork {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn len(&self) -> usize {
		self.nodes.len()
	}

	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}

	pub fn contains(&self, id: NodeId) -> bool {
		self.nodes.contains_key(&id)
	}

	pub fn node(&self, id: NodeId) -> Option<&DocumentNode> {
		self.nodes.get(&id)
	}

	pub(crate) fn node_mut(&mut self, id: NodeId) -> Option<&mut DocumentNode> {
		self.nodes.get_mut(&id)
	}

	fn node_or_err(&self, id: NodeId) -> Result<&DocumentNode, GraphError> {
		self.nodes.get(&id).ok_or(GraphError::NodeNotFound(id))
	}

	/// Node ids in ascending order.
	pub fn node_ids(&self) -> Vec<NodeId> {
		let mut ids: Vec<_> = self.nodes.keys().copied().collect();
		ids.sort_unstable();
		ids
	}

	pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &DocumentNode)> {
		self.nodes.iter().map(|(id, node)| (*id, node))
	}

	/// Incremented by every change to the set of nodes or connections.
	pub fn topology_version(&self) -> u64 {
		self.topology_version
	}

	fn topology_changed(&mut self) {
		self.topology_version += 1;
		self.order_cache.clear();
	}

	pub(crate) fn next_cache_version(&mut self) -> u64 {
		self.next_cache_version += 1;
		self.next_cache_version
	}

	pub fn insert_node(&mut self, id: NodeId, implementation: Box<dyn Node>) -> Result<(), GraphError> {
		self.insert_document_node(id, DocumentNode::new(implementation))
	}

	/// Inserts a node whose inputs were prepared elsewhere. Every connection must point at an existing node and port.
	pub fn insert_document_node(&mut self, id: NodeId, node: DocumentNode) -> Result<(), GraphError> {
		if self.nodes.contains_key(&id) {
			return Err(GraphError::DuplicateNodeId(id));
		}
		for source in node.inputs.iter().filter_map(|input| input.source) {
			let upstream = self.node_or_err(source.node_id)?;
			if upstream.output_type(source.output_index).is_none() {
				return Err(GraphError::InvalidOutputIndex {
					node_id: source.node_id,
					index: source.output_index,
				});
			}
		}

		log::trace!("Inserting node {id} ({})", node.metadata().identifier);
		self.nodes.insert(id, node);
		self.topology_changed();
		Ok(())
	}

	/// Removes a node, disconnecting every input it fed. The node keeps its own upstream connections
	/// so [`NodeNetwork::restore_node`] can put everything back.
	pub fn remove_node(&mut self, id: NodeId) -> Result<RemovedNode, GraphError> {
		let severed = self.outward_links(id);
		let node = self.nodes.remove(&id).ok_or(GraphError::NodeNotFound(id))?;
		for (_, input) in &severed {
			if let Some(node_input) = self.nodes.get_mut(&input.node_id).and_then(|node| node.inputs.get_mut(input.input_index)) {
				node_input.source = None;
			}
		}

		log::trace!("Removed node {id}, severing {} connections", severed.len());
		self.topology_changed();
		Ok(RemovedNode { id, node, severed })
	}

	/// Reinserts a removed node and reconnects the inputs its removal severed.
	pub fn restore_node(&mut self, removed: RemovedNode) -> Result<(), GraphError> {
		let RemovedNode { id, node, severed } = removed;
		self.insert_document_node(id, node)?;
		for (output, input) in severed {
			self.disconnect(input)?;
			self.connect(output, input)?;
		}
		Ok(())
	}

	pub fn input(&self, connector: InputConnector) -> Result<&NodeInput, GraphError> {
		self.node_or_err(connector.node_id)?.inputs.get(connector.input_index).ok_or(GraphError::InvalidInputIndex {
			node_id: connector.node_id,
			index: connector.input_index,
		})
	}

	fn input_mut(&mut self, connector: InputConnector) -> Result<&mut NodeInput, GraphError> {
		let node = self.nodes.get_mut(&connector.node_id).ok_or(GraphError::NodeNotFound(connector.node_id))?;
		node.inputs.get_mut(connector.input_index).ok_or(GraphError::InvalidInputIndex {
			node_id: connector.node_id,
			index: connector.input_index,
		})
	}

	/// Connects `output` to `input`. Fails without modifying the network if the input is already connected,
	/// the port types differ, or the connection would close a cycle.
	pub fn connect(&mut self, output: OutputConnector, input: InputConnector) -> Result<(), GraphError> {
		let source = self.node_or_err(output.node_id)?;
		let output_type = source.output_type(output.output_index).ok_or(GraphError::InvalidOutputIndex {
			node_id: output.node_id,
			index: output.output_index,
		})?;
		let target = self.node_or_err(input.node_id)?;
		let input_type = target.input_type(input.input_index).ok_or(GraphError::InvalidInputIndex {
			node_id: input.node_id,
			index: input.input_index,
		})?;

		if self.input(input)?.is_connected() {
			return Err(GraphError::InputAlreadyConnected(input));
		}
		if output_type != input_type {
			return Err(GraphError::TypeMismatch {
				expected: input_type,
				found: output_type,
			});
		}
		if self.is_loop(output.node_id, input.node_id) {
			return Err(GraphError::CycleDetected { output, input });
		}

		self.input_mut(input)?.source = Some(output);
		self.topology_changed();
		Ok(())
	}

	/// Removes the connection feeding `input`, returning where it came from.
	pub fn disconnect(&mut self, input: InputConnector) -> Result<Option<OutputConnector>, GraphError> {
		let previous = self.input_mut(input)?.source.take();
		if previous.is_some() {
			self.topology_changed();
		}
		Ok(previous)
	}

	/// Replaces the literal value of an input, returning the previous literal. The value must satisfy the input's declared type.
	pub fn set_input_value(&mut self, input: InputConnector, value: TaggedValue) -> Result<TaggedValue, GraphError> {
		let node = self.node_or_err(input.node_id)?;
		let ty = node.input_type(input.input_index).ok_or(GraphError::InvalidInputIndex {
			node_id: input.node_id,
			index: input.input_index,
		})?;
		if !ty.accepts(&value) {
			return Err(GraphError::TypeMismatch { expected: ty, found: value.ty() });
		}
		Ok(std::mem::replace(&mut self.input_mut(input)?.value, value))
	}

	/// Mutable access to an input's literal for in-place edits, such as painting into a surface.
	/// The caller is responsible for keeping the value's type unchanged.
	pub fn input_value_mut(&mut self, input: InputConnector) -> Result<&mut TaggedValue, GraphError> {
		Ok(&mut self.input_mut(input)?.value)
	}

	/// Forces the node to execute on its next evaluation, whatever its cache triggers say.
	pub fn invalidate_node(&mut self, id: NodeId) -> Result<(), GraphError> {
		let node = self.nodes.get_mut(&id).ok_or(GraphError::NodeNotFound(id))?;
		node.cache.invalidation += 1;
		Ok(())
	}

	/// Drops every cached output.
	pub fn clear_caches(&mut self) {
		for node in self.nodes.values_mut() {
			node.cache = NodeCache {
				invalidation: node.cache.invalidation,
				..Default::default()
			};
		}
	}

	/// The last value computed for an output, if the node has run.
	pub fn cached_output(&self, output: OutputConnector) -> Option<&TaggedValue> {
		self.nodes.get(&output.node_id).and_then(|node| node.cache.outputs.get(output.output_index))
	}

	/// Every connection leaving the node, sorted by target.
	pub fn outward_links(&self, id: NodeId) -> Vec<(OutputConnector, InputConnector)> {
		let mut links: Vec<_> = self
			.nodes
			.iter()
			.flat_map(|(node_id, node)| {
				node.inputs.iter().enumerate().filter_map(move |(input_index, input)| {
					let source = input.source?;
					(source.node_id == id).then_some((source, InputConnector::node(*node_id, input_index)))
				})
			})
			.collect();
		links.sort_unstable_by_key(|(_, input)| *input);
		links
	}

	/// Every connection in the network as `(output, input)` pairs, sorted by target.
	pub fn connections(&self) -> Vec<(OutputConnector, InputConnector)> {
		let mut links: Vec<_> = self
			.nodes
			.iter()
			.flat_map(|(node_id, node)| {
				node.inputs
					.iter()
					.enumerate()
					.filter_map(move |(input_index, input)| input.source.map(|source| (source, InputConnector::node(*node_id, input_index))))
			})
			.collect();
		links.sort_unstable_by_key(|(_, input)| *input);
		links
	}

	/// All nodes the given node transitively depends on, excluding itself.
	pub fn upstream_nodes(&self, id: NodeId) -> FxHashSet<NodeId> {
		let mut visited = FxHashSet::default();
		let mut stack: Vec<_> = self.nodes.get(&id).into_iter().flat_map(|node| node.inputs.iter().filter_map(|input| input.source)).collect();
		while let Some(source) = stack.pop() {
			if !visited.insert(source.node_id) {
				continue;
			}
			if let Some(node) = self.nodes.get(&source.node_id) {
				stack.extend(node.inputs.iter().filter_map(|input| input.source));
			}
		}
		visited
	}

	/// Whether feeding an output of `source` into an input of `target` would close a cycle.
	pub fn is_loop(&self, source: NodeId, target: NodeId) -> bool {
		source == target || self.upstream_nodes(source).contains(&target)
	}

	/// Execution order of the nodes `output` depends on, ending with `output` itself. Cached until the topology changes.
	pub fn evaluation_order(&mut self, output: NodeId) -> Result<Vec<NodeId>, GraphError> {
		if let Some(order) = self.order_cache.get(&output) {
			return Ok(order.clone());
		}
		let order = self.topological_sort(output)?;
		self.order_cache.insert(output, order.clone());
		Ok(order)
	}

	/// Depth-first post-order over input connections. Nodes unreachable from `output` are left out.
	pub fn topological_sort(&self, output: NodeId) -> Result<Vec<NodeId>, GraphError> {
		self.node_or_err(output)?;
		let mut sorted = Vec::new();
		let mut state: FxHashMap<NodeId, NodeState> = FxHashMap::default();
		let mut stack = vec![output];

		while let Some(&node_id) = stack.last() {
			match state.get(&node_id).copied().unwrap_or(NodeState::Unvisited) {
				NodeState::Unvisited => {
					state.insert(node_id, NodeState::Visiting);
					let node = self.node_or_err(node_id)?;
					for source in node.inputs.iter().rev().filter_map(|input| input.source) {
						match state.get(&source.node_id).copied().unwrap_or(NodeState::Unvisited) {
							NodeState::Visiting => return Err(GraphError::CycleInvolving(source.node_id)),
							NodeState::Unvisited => stack.push(source.node_id),
							NodeState::Visited => {}
						}
					}
				}
				NodeState::Visiting => {
					stack.pop();
					state.insert(node_id, NodeState::Visited);
					sorted.push(node_id);
				}
				NodeState::Visited => {
					stack.pop();
				}
			}
		}

		Ok(sorted)
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::test_nodes::*;
	use pretty_assertions::assert_eq;

	fn chain() -> (NodeNetwork, [NodeId; 3]) {
		let mut network = NodeNetwork::new();
		let ids = [NodeId(1), NodeId(2), NodeId(3)];
		for id in ids {
			network.insert_node(id, Box::new(AddNode)).unwrap();
		}
		network.connect(OutputConnector::node(ids[0], 0), InputConnector::node(ids[1], 0)).unwrap();
		network.connect(OutputConnector::node(ids[1], 0), InputConnector::node(ids[2], 0)).unwrap();
		(network, ids)
	}

	#[test]
	fn cycles_are_rejected_without_changes() {
		let (mut network, [a, b, c]) = chain();
		let before = network.connections();
		let version = network.topology_version();

		let result = network.connect(OutputConnector::node(c, 0), InputConnector::node(a, 1));
		assert!(matches!(result, Err(GraphError::CycleDetected { .. })));
		let result = network.connect(OutputConnector::node(b, 0), InputConnector::node(b, 1));
		assert!(matches!(result, Err(GraphError::CycleDetected { .. })));

		assert_eq!(network.connections(), before);
		assert_eq!(network.topology_version(), version);
	}

	#[test]
	fn duplicate_and_mistyped_connections_are_rejected() {
		let (mut network, [a, _, c]) = chain();
		network.insert_node(NodeId(10), Box::new(FlagNode)).unwrap();

		let result = network.connect(OutputConnector::node(a, 0), InputConnector::node(c, 0));
		assert_eq!(result, Err(GraphError::InputAlreadyConnected(InputConnector::node(c, 0))));

		let result = network.connect(OutputConnector::node(NodeId(10), 0), InputConnector::node(c, 1));
		assert_eq!(result, Err(GraphError::TypeMismatch { expected: Type::F64, found: Type::Bool }));

		let result = network.connect(OutputConnector::node(a, 3), InputConnector::node(c, 1));
		assert_eq!(result, Err(GraphError::InvalidOutputIndex { node_id: a, index: 3 }));
	}

	#[test]
	fn literal_values_are_type_checked() {
		let (mut network, [a, ..]) = chain();
		let input = InputConnector::node(a, 0);
		assert_eq!(network.set_input_value(input, TaggedValue::F64(4.)), Ok(TaggedValue::F64(0.)));
		assert!(network.set_input_value(input, TaggedValue::Bool(true)).is_err());
		assert_eq!(network.set_input_value(input, TaggedValue::None), Ok(TaggedValue::F64(4.)));
	}

	#[test]
	fn order_excludes_unreachable_nodes() {
		let (mut network, [a, b, c]) = chain();
		network.insert_node(NodeId(99), Box::new(AddNode)).unwrap();
		assert_eq!(network.evaluation_order(c).unwrap(), vec![a, b, c]);
		assert_eq!(network.evaluation_order(b).unwrap(), vec![a, b]);
	}

	#[test]
	fn order_is_rebuilt_after_topology_changes() {
		let (mut network, [a, b, c]) = chain();
		assert_eq!(network.evaluation_order(c).unwrap(), vec![a, b, c]);

		network.disconnect(InputConnector::node(b, 0)).unwrap();
		assert_eq!(network.evaluation_order(c).unwrap(), vec![b, c]);
	}

	#[test]
	fn diamond_orders_shared_dependency_once() {
		let mut network = NodeNetwork::new();
		let [top, left, right, bottom] = [NodeId(1), NodeId(2), NodeId(3), NodeId(4)];
		for id in [top, left, right, bottom] {
			network.insert_node(id, Box::new(AddNode)).unwrap();
		}
		network.connect(OutputConnector::node(top, 0), InputConnector::node(left, 0)).unwrap();
		network.connect(OutputConnector::node(top, 0), InputConnector::node(right, 0)).unwrap();
		network.connect(OutputConnector::node(left, 0), InputConnector::node(bottom, 0)).unwrap();
		network.connect(OutputConnector::node(right, 0), InputConnector::node(bottom, 1)).unwrap();

		assert_eq!(network.evaluation_order(bottom).unwrap(), vec![top, left, right, bottom]);
	}

	#[test]
	fn removal_severs_and_restoration_reconnects() {
		let (mut network, [a, b, c]) = chain();
		network.connect(OutputConnector::node(b, 0), InputConnector::node(c, 1)).unwrap();
		let before = network.connections();

		let removed = network.remove_node(b).unwrap();
		assert_eq!(removed.severed(), &[(OutputConnector::node(b, 0), InputConnector::node(c, 0)), (OutputConnector::node(b, 0), InputConnector::node(c, 1))]);
		assert!(!network.input(InputConnector::node(c, 0)).unwrap().is_connected());
		assert_eq!(network.evaluation_order(c).unwrap(), vec![c]);
		assert_eq!(network.upstream_nodes(c).len(), 0);

		network.restore_node(removed).unwrap();
		assert_eq!(network.connections(), before);
		assert_eq!(network.evaluation_order(c).unwrap(), vec![a, b, c]);
	}

	#[test]
	fn missing_nodes_are_reported() {
		let mut network = NodeNetwork::new();
		assert_eq!(network.evaluation_order(NodeId(5)), Err(GraphError::NodeNotFound(NodeId(5))));
		assert!(matches!(network.remove_node(NodeId(5)), Err(GraphError::NodeNotFound(_))));
		network.insert_node(NodeId(5), Box::new(AddNode)).unwrap();
		assert_eq!(network.insert_node(NodeId(5), Box::new(AddNode)), Err(GraphError::DuplicateNodeId(NodeId(5))));
	}
}
