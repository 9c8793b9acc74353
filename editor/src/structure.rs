//! The user visible layer and folder hierarchy, and how it maps onto graph connections.
//!
//! Every member is backed by a graph node with the same id: an [`ImageLayerNode`] for layers and a
//! [`FolderNode`] for folders. Member lists are ordered bottom first. Visibility, opacity and blend mode
//! live on the backing node's inputs, so the tree itself only records names and nesting.

use crate::error::ChangeError;
use crate::response::DocumentResponse;
use core_types::{Node, NodeId};
use graph_craft::{InputConnector, NodeNetwork, OutputConnector};
use raster_nodes::{FolderNode, ImageLayerNode};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MemberKind {
	Layer,
	Folder,
}

impl MemberKind {
	/// Registry identifier of the node kind backing members of this kind.
	pub fn node_identifier(self) -> &'static str {
		match self {
			MemberKind::Layer => ImageLayerNode.metadata().identifier,
			MemberKind::Folder => FolderNode.metadata().identifier,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructureMember {
	pub id: NodeId,
	pub name: String,
	pub kind: MemberKind,
	/// Bottom first. Always empty for layers.
	pub children: Vec<NodeId>,
}

impl StructureMember {
	pub fn new(id: NodeId, name: impl Into<String>, kind: MemberKind) -> Self {
		Self {
			id,
			name: name.into(),
			kind,
			children: Vec::new(),
		}
	}

	pub fn is_folder(&self) -> bool {
		self.kind == MemberKind::Folder
	}
}

/// Where a member sits: its parent folder, or the root when `None`, and its index in that list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MemberLocation {
	pub parent: Option<NodeId>,
	pub index: usize,
}

impl MemberLocation {
	pub fn root(index: usize) -> Self {
		Self { parent: None, index }
	}

	pub fn inside(parent: NodeId, index: usize) -> Self {
		Self { parent: Some(parent), index }
	}
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "SerializedStructure", into = "SerializedStructure")]
pub struct StructureTree {
	members: FxHashMap<NodeId, StructureMember>,
	root: Vec<NodeId>,
	parents: FxHashMap<NodeId, NodeId>,
}

#[derive(Serialize, Deserialize)]
struct SerializedStructure {
	root: Vec<NodeId>,
	members: Vec<StructureMember>,
}

impl From<SerializedStructure> for StructureTree {
	fn from(serialized: SerializedStructure) -> Self {
		let mut tree = StructureTree {
			root: serialized.root,
			..Default::default()
		};
		for member in serialized.members {
			for child in &member.children {
				tree.parents.insert(*child, member.id);
			}
			tree.members.insert(member.id, member);
		}
		tree
	}
}

impl From<StructureTree> for SerializedStructure {
	fn from(tree: StructureTree) -> Self {
		let members = tree.descendants(None).into_iter().filter_map(|id| tree.members.get(&id).cloned()).collect();
		SerializedStructure { root: tree.root, members }
	}
}

impl StructureTree {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn len(&self) -> usize {
		self.members.len()
	}

	pub fn is_empty(&self) -> bool {
		self.members.is_empty()
	}

	pub fn contains(&self, id: NodeId) -> bool {
		self.members.contains_key(&id)
	}

	pub fn member(&self, id: NodeId) -> Option<&StructureMember> {
		self.members.get(&id)
	}

	pub(crate) fn member_mut(&mut self, id: NodeId) -> Option<&mut StructureMember> {
		self.members.get_mut(&id)
	}

	pub fn root(&self) -> &[NodeId] {
		&self.root
	}

	/// The members of a folder, or of the root when `parent` is `None`. Unknown or non-folder parents have no children.
	pub fn children(&self, parent: Option<NodeId>) -> &[NodeId] {
		match parent {
			None => &self.root,
			Some(parent) => self.members.get(&parent).map(|member| member.children.as_slice()).unwrap_or(&[]),
		}
	}

	pub fn parent(&self, id: NodeId) -> Option<NodeId> {
		self.parents.get(&id).copied()
	}

	pub fn location(&self, id: NodeId) -> Option<MemberLocation> {
		let parent = self.parent(id);
		let index = self.children(parent).iter().position(|child| *child == id)?;
		Some(MemberLocation { parent, index })
	}

	/// Every member below `parent` in pre-order, parents before their children.
	pub fn descendants(&self, parent: Option<NodeId>) -> Vec<NodeId> {
		let mut result = Vec::new();
		let mut stack: Vec<_> = self.children(parent).iter().rev().copied().collect();
		while let Some(id) = stack.pop() {
			result.push(id);
			stack.extend(self.children(Some(id)).iter().rev());
		}
		result
	}

	/// Whether `id` is `ancestor` or lies somewhere inside it.
	pub fn is_within(&self, id: NodeId, ancestor: NodeId) -> bool {
		let mut current = Some(id);
		while let Some(member) = current {
			if member == ancestor {
				return true;
			}
			current = self.parent(member);
		}
		false
	}

	fn check_location(&self, location: MemberLocation, member: NodeId) -> Result<(), ChangeError> {
		if let Some(parent) = location.parent {
			match self.members.get(&parent) {
				Some(folder) if folder.is_folder() => {}
				Some(_) => {
					return Err(ChangeError::InvalidStructureMove {
						member,
						reason: "the target parent is not a folder",
					});
				}
				None => return Err(ChangeError::MemberNotFound(parent)),
			}
		}
		if location.index > self.children(location.parent).len() {
			return Err(ChangeError::InvalidStructureMove {
				member,
				reason: "the target index is out of range",
			});
		}
		Ok(())
	}

	/// Checks that a member with this id could be inserted at `location`.
	pub fn check_insert(&self, id: NodeId, location: MemberLocation) -> Result<(), ChangeError> {
		if self.members.contains_key(&id) {
			return Err(ChangeError::InvalidParameter(format!("member {id} already exists")));
		}
		self.check_location(location, id)
	}

	pub fn insert(&mut self, mut member: StructureMember, location: MemberLocation) -> Result<(), ChangeError> {
		self.check_insert(member.id, location)?;
		if member.kind == MemberKind::Layer {
			member.children.clear();
		}
		let id = member.id;
		self.list_mut(location.parent).insert(location.index, id);
		if let Some(parent) = location.parent {
			self.parents.insert(id, parent);
		}
		self.members.insert(id, member);
		Ok(())
	}

	/// Removes a member that has no children, returning it with the location it was removed from.
	pub fn remove(&mut self, id: NodeId) -> Result<(StructureMember, MemberLocation), ChangeError> {
		let location = self.location(id).ok_or(ChangeError::MemberNotFound(id))?;
		if !self.children(Some(id)).is_empty() {
			return Err(ChangeError::InvalidParameter(format!("folder {id} still has children")));
		}
		self.list_mut(location.parent).remove(location.index);
		self.parents.remove(&id);
		let member = self.members.remove(&id).ok_or(ChangeError::MemberNotFound(id))?;
		Ok((member, location))
	}

	/// Moves a member, with its contents, to `to`. The index is interpreted after the member left its old list.
	/// Returns the location it was moved from.
	pub fn move_member(&mut self, id: NodeId, to: MemberLocation) -> Result<MemberLocation, ChangeError> {
		let from = self.location(id).ok_or(ChangeError::MemberNotFound(id))?;
		if to.parent.is_some_and(|parent| self.is_within(parent, id)) {
			return Err(ChangeError::InvalidStructureMove {
				member: id,
				reason: "a folder cannot be moved into itself",
			});
		}

		self.list_mut(from.parent).remove(from.index);
		if let Err(error) = self.check_location(to, id) {
			self.list_mut(from.parent).insert(from.index, id);
			return Err(error);
		}
		self.list_mut(to.parent).insert(to.index, id);
		match to.parent {
			Some(parent) => self.parents.insert(id, parent),
			None => self.parents.remove(&id),
		};
		Ok(from)
	}

	fn list_mut(&mut self, parent: Option<NodeId>) -> &mut Vec<NodeId> {
		match parent.and_then(|parent| self.members.get_mut(&parent)) {
			Some(folder) => &mut folder.children,
			None => &mut self.root,
		}
	}

	/// The connection every structure driven input should have: each member's background is the member below it,
	/// each folder's content is its topmost child, and the output node shows the topmost root member.
	pub fn desired_connections(&self, output_node: NodeId) -> Vec<(InputConnector, Option<OutputConnector>)> {
		let mut connections = Vec::new();
		let mut chain = |members: &[NodeId], target: InputConnector| {
			let mut below = None;
			for member in members {
				connections.push((InputConnector::node(*member, ImageLayerNode::BACKGROUND), below));
				below = Some(OutputConnector::node(*member, 0));
			}
			connections.push((target, below));
		};

		chain(&self.root, InputConnector::node(output_node, 0));
		for id in self.descendants(None) {
			if self.members.get(&id).is_some_and(StructureMember::is_folder) {
				chain(self.children(Some(id)), InputConnector::node(id, FolderNode::CONTENT));
			}
		}
		connections
	}
}

/// Rewires the structure driven inputs of `network` to match `structure`, touching only connections that differ.
/// On failure every connection already changed is put back.
pub fn sync_structure(network: &mut NodeNetwork, structure: &StructureTree, output_node: NodeId) -> Result<Vec<DocumentResponse>, ChangeError> {
	let mut stale = Vec::new();
	for (input, desired) in structure.desired_connections(output_node) {
		let current = network.input(input)?.source;
		if current != desired {
			stale.push((input, current, desired));
		}
	}
	if stale.is_empty() {
		return Ok(Vec::new());
	}

	// Disconnect everything first so an intermediate state never looks like a cycle
	for (input, _, _) in &stale {
		network.disconnect(*input)?;
	}
	for (position, (input, _, desired)) in stale.iter().enumerate() {
		let Some(desired) = desired else { continue };
		if let Err(error) = network.connect(*desired, *input) {
			log::warn!("Failed to rewire {input} to {desired}: {error}");
			for (input, _, desired) in &stale[..position] {
				if desired.is_some()
					&& let Err(error) = network.disconnect(*input)
				{
					log::warn!("Failed to disconnect {input} while rolling back: {error}");
				}
			}
			for (input, current, _) in &stale {
				if let Some(current) = current
					&& let Err(error) = network.connect(*current, *input)
				{
					log::warn!("Failed to restore {input} from {current} while rolling back: {error}");
				}
			}
			return Err(error.into());
		}
	}

	log::trace!("Rewired {} structure connections", stale.len());
	Ok(stale.into_iter().map(|(input, _, _)| DocumentResponse::ConnectionChanged(input)).collect())
}

#[cfg(test)]
mod test {
	use super::*;
	use pretty_assertions::assert_eq;

	fn id(value: u64) -> NodeId {
		NodeId(value)
	}

	/// Root: layer 1, folder 2 containing layers 3 and 4, layer 5.
	fn tree() -> StructureTree {
		let mut tree = StructureTree::new();
		tree.insert(StructureMember::new(id(1), "Background", MemberKind::Layer), MemberLocation::root(0)).unwrap();
		tree.insert(StructureMember::new(id(2), "Group", MemberKind::Folder), MemberLocation::root(1)).unwrap();
		tree.insert(StructureMember::new(id(3), "Inner bottom", MemberKind::Layer), MemberLocation::inside(id(2), 0)).unwrap();
		tree.insert(StructureMember::new(id(4), "Inner top", MemberKind::Layer), MemberLocation::inside(id(2), 1)).unwrap();
		tree.insert(StructureMember::new(id(5), "Top", MemberKind::Layer), MemberLocation::root(2)).unwrap();
		tree
	}

	#[test]
	fn descendants_are_pre_order() {
		assert_eq!(tree().descendants(None), vec![id(1), id(2), id(3), id(4), id(5)]);
		assert_eq!(tree().descendants(Some(id(2))), vec![id(3), id(4)]);
	}

	#[test]
	fn insert_rejects_bad_locations() {
		let mut tree = tree();
		let orphan = StructureMember::new(id(9), "Orphan", MemberKind::Layer);
		assert_eq!(tree.insert(orphan.clone(), MemberLocation::inside(id(7), 0)), Err(ChangeError::MemberNotFound(id(7))));
		assert!(matches!(tree.insert(orphan.clone(), MemberLocation::inside(id(1), 0)), Err(ChangeError::InvalidStructureMove { .. })));
		assert!(matches!(tree.insert(orphan, MemberLocation::root(4)), Err(ChangeError::InvalidStructureMove { .. })));
		assert_eq!(tree, self::tree());
	}

	#[test]
	fn move_and_move_back_restores_order() {
		let mut tree = tree();
		let from = tree.move_member(id(5), MemberLocation::inside(id(2), 1)).unwrap();
		assert_eq!(from, MemberLocation::root(2));
		assert_eq!(tree.children(Some(id(2))), &[id(3), id(5), id(4)]);
		assert_eq!(tree.parent(id(5)), Some(id(2)));

		tree.move_member(id(5), from).unwrap();
		assert_eq!(tree, self::tree());
	}

	#[test]
	fn folder_cannot_move_into_itself() {
		let mut tree = tree();
		let result = tree.move_member(id(2), MemberLocation::inside(id(2), 0));
		assert!(matches!(result, Err(ChangeError::InvalidStructureMove { .. })));
		assert_eq!(tree, self::tree());
	}

	#[test]
	fn remove_requires_empty_folder() {
		let mut tree = tree();
		assert!(tree.remove(id(2)).is_err());
		let (member, location) = tree.remove(id(4)).unwrap();
		assert_eq!(member.name, "Inner top");
		assert_eq!(location, MemberLocation::inside(id(2), 1));
	}

	#[test]
	fn connections_chain_bottom_up() {
		let output = id(100);
		let connections = tree().desired_connections(output);
		let source_of = |input: InputConnector| connections.iter().find(|(target, _)| *target == input).and_then(|(_, source)| *source);

		assert_eq!(source_of(InputConnector::node(id(1), 0)), None);
		assert_eq!(source_of(InputConnector::node(id(2), 0)), Some(OutputConnector::node(id(1), 0)));
		assert_eq!(source_of(InputConnector::node(id(4), 0)), Some(OutputConnector::node(id(3), 0)));
		assert_eq!(source_of(InputConnector::node(id(2), FolderNode::CONTENT)), Some(OutputConnector::node(id(4), 0)));
		assert_eq!(source_of(InputConnector::node(output, 0)), Some(OutputConnector::node(id(5), 0)));
	}

	#[test]
	fn serde_keeps_nesting() {
		let tree = tree();
		let json = serde_json::to_string(&tree).unwrap();
		let restored: StructureTree = serde_json::from_str(&json).unwrap();
		assert_eq!(restored, tree);
	}
}
