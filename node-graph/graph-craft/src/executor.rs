use crate::document::{DocumentNode, NodeNetwork};
use crate::GraphError;
use core_types::{CacheTriggers, EvaluationContext, NodeId, NodeIo, RenderParams, TaggedValue};
use raster_types::SurfacePool;
use rustc_hash::{FxHashMap, FxHasher};
use std::hash::{Hash, Hasher};

/// What happened during one call to [`GraphExecutor::evaluate_with_stats`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EvaluationStats {
	/// Nodes whose `execute` ran, in execution order.
	pub executed: Vec<NodeId>,
	/// Nodes whose cached outputs were reused.
	pub reused: Vec<NodeId>,
	/// Scratch surfaces nodes leased from the pool and never released.
	pub leaked_surfaces: usize,
}

impl EvaluationStats {
	pub fn executed_count(&self) -> usize {
		self.executed.len()
	}

	pub fn reused_count(&self) -> usize {
		self.reused.len()
	}

	pub fn was_executed(&self, id: NodeId) -> bool {
		self.executed.contains(&id)
	}
}

/// Drives evaluation of a [`NodeNetwork`], consulting and updating the per-node caches it stores.
#[derive(Debug, Default)]
pub struct GraphExecutor {
	pool: SurfacePool,
}

impl GraphExecutor {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_pool(pool: SurfacePool) -> Self {
		Self { pool }
	}

	pub fn pool(&self) -> &SurfacePool {
		&self.pool
	}

	/// Evaluates the primary output of `output`.
	pub fn evaluate(&mut self, network: &mut NodeNetwork, output: NodeId, params: RenderParams) -> Result<TaggedValue, GraphError> {
		self.evaluate_with_stats(network, output, params).map(|(value, _)| value)
	}

	/// Evaluates the primary output of `output`, executing only nodes whose cache key changed.
	pub fn evaluate_with_stats(&mut self, network: &mut NodeNetwork, output: NodeId, params: RenderParams) -> Result<(TaggedValue, EvaluationStats), GraphError> {
		let order = network.evaluation_order(output)?;
		let mut stats = EvaluationStats::default();

		for node_id in order {
			let node = network.node(node_id).ok_or(GraphError::NodeNotFound(node_id))?;
			let triggers = node.cache_triggers();
			let key = cache_key(network, node, params);
			if !triggers.contains(CacheTriggers::ALWAYS) && node.cache.key == Some(key) {
				log::trace!("Reusing cached outputs of node {node_id}");
				stats.reused.push(node_id);
				continue;
			}

			log::trace!("Executing node {node_id} ({})", node.metadata().identifier);
			let outputs = self.execute_node(network, node, params);
			let output_hash = hash_value(&outputs);

			let changed = node.cache.output_hash != Some(output_hash);
			let previous_version = node.version();
			let version = if changed { network.next_cache_version() } else { previous_version };
			let cache = &mut network_node_mut(network, node_id)?.cache;
			cache.key = Some(key);
			cache.output_hash = Some(output_hash);
			cache.version = version;
			let previous = std::mem::replace(&mut cache.outputs, outputs);
			for surface in previous.into_iter().filter_map(TaggedValue::into_surface) {
				self.pool.recycle(surface);
			}
			stats.executed.push(node_id);
		}

		stats.leaked_surfaces = self.pool.end_evaluation();
		let result = network.cached_output(crate::OutputConnector::node(output, 0)).cloned().unwrap_or_default();
		log::debug!("Evaluated node {output}: {} executed, {} reused", stats.executed_count(), stats.reused_count());
		Ok((result, stats))
	}

	/// Evaluates `output` executing every node it depends on, without reading or writing any cache.
	/// Used as the reference the cached path must agree with.
	pub fn evaluate_uncached(&mut self, network: &NodeNetwork, output: NodeId, params: RenderParams) -> Result<TaggedValue, GraphError> {
		let order = network.topological_sort(output)?;
		let mut values: FxHashMap<NodeId, Vec<TaggedValue>> = FxHashMap::default();

		for node_id in order {
			let node = network.node(node_id).ok_or(GraphError::NodeNotFound(node_id))?;
			let inputs = node
				.inputs()
				.iter()
				.map(|input| match input.source {
					Some(source) => values.get(&source.node_id).and_then(|outputs| outputs.get(source.output_index)).cloned().unwrap_or_default(),
					None => input.value.clone(),
				})
				.collect();
			let outputs = self.run(node, inputs, params);
			values.insert(node_id, outputs);
		}

		self.pool.end_evaluation();
		Ok(values.remove(&output).and_then(|outputs| outputs.into_iter().next()).unwrap_or_default())
	}

	fn execute_node(&mut self, network: &NodeNetwork, node: &DocumentNode, params: RenderParams) -> Vec<TaggedValue> {
		let inputs = node
			.inputs()
			.iter()
			.map(|input| match input.source {
				Some(source) => network.cached_output(source).cloned().unwrap_or_default(),
				None => input.value.clone(),
			})
			.collect();
		self.run(node, inputs, params)
	}

	fn run(&mut self, node: &DocumentNode, inputs: Vec<TaggedValue>, params: RenderParams) -> Vec<TaggedValue> {
		let declared = &node.signature().outputs;
		let mut io = NodeIo::new(inputs, declared.len());
		let mut context = EvaluationContext::new(params, &mut self.pool);
		let primary = node.implementation().execute(&mut io, &mut context);

		let mut outputs = io.into_outputs(primary);
		outputs.resize(declared.len().max(1), TaggedValue::None);
		for (value, declaration) in outputs.iter_mut().zip(declared) {
			if !declaration.ty.accepts(value) {
				log::warn!("Node {} produced {} for its {} output '{}'", node.metadata().identifier, value.ty(), declaration.ty, declaration.name);
				*value = TaggedValue::None;
			}
		}
		outputs
	}
}

fn network_node_mut(network: &mut NodeNetwork, id: NodeId) -> Result<&mut DocumentNode, GraphError> {
	network.node_mut(id).ok_or(GraphError::NodeNotFound(id))
}

/// Hashes everything the node's cache triggers declare relevant. The explicit invalidation counter is always included.
fn cache_key(network: &NodeNetwork, node: &DocumentNode, params: RenderParams) -> u64 {
	let triggers = node.cache_triggers();
	let mut hasher = FxHasher::default();
	node.cache.invalidation.hash(&mut hasher);

	for (index, input) in node.inputs().iter().enumerate() {
		match input.source {
			Some(source) if triggers.contains(CacheTriggers::UPSTREAM) => {
				index.hash(&mut hasher);
				source.hash(&mut hasher);
				network.node(source.node_id).map(DocumentNode::version).hash(&mut hasher);
			}
			None if triggers.contains(CacheTriggers::LITERAL_INPUTS) => {
				index.hash(&mut hasher);
				input.value.hash(&mut hasher);
			}
			_ => {}
		}
	}
	if triggers.contains(CacheTriggers::CONTEXT) {
		params.hash(&mut hasher);
	}
	hasher.finish()
}

fn hash_value<T: Hash>(value: &T) -> u64 {
	let mut hasher = FxHasher::default();
	value.hash(&mut hasher);
	hasher.finish()
}
