use crate::{BrightnessNode, EllipseNode, FolderNode, ImageLayerNode, InvertNode, OpacityNode, OutputNode, RasterizeNode, RectangleNode};
use core_types::{Node, NodeMetadata};
use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;

pub type NodeConstructor = fn() -> Box<dyn Node>;

fn construct<N: Node + Default + 'static>() -> Box<dyn Node> {
	Box::new(N::default())
}

fn node_registry() -> FxHashMap<&'static str, (NodeMetadata, NodeConstructor)> {
	let constructors: [NodeConstructor; 9] = [
		construct::<RectangleNode>,
		construct::<EllipseNode>,
		construct::<RasterizeNode>,
		construct::<InvertNode>,
		construct::<BrightnessNode>,
		construct::<OpacityNode>,
		construct::<ImageLayerNode>,
		construct::<FolderNode>,
		construct::<OutputNode>,
	];

	let mut map = FxHashMap::default();
	for constructor in constructors {
		let metadata = constructor().metadata();
		if map.insert(metadata.identifier, (metadata, constructor)).is_some() {
			log::error!("Node identifier {} is registered twice", metadata.identifier);
		}
	}
	map
}

/// Every node kind that can be created by identifier, for persistence and node creation changes.
pub static NODE_REGISTRY: Lazy<FxHashMap<&'static str, (NodeMetadata, NodeConstructor)>> = Lazy::new(node_registry);

pub fn create_node(identifier: &str) -> Option<Box<dyn Node>> {
	NODE_REGISTRY.get(identifier).map(|(_, constructor)| constructor())
}

/// Metadata of every registered node kind, sorted by category and then display name.
pub fn node_kinds() -> Vec<NodeMetadata> {
	let mut kinds: Vec<_> = NODE_REGISTRY.values().map(|(metadata, _)| *metadata).collect();
	kinds.sort_unstable_by_key(|metadata| (metadata.category, metadata.display_name));
	kinds
}
