use super::{Change, ChangeOutcome, UpdateableChange};
use crate::document::DocumentState;
use crate::error::ChangeError;
use crate::response::DocumentResponse;
use crate::structure::{MemberKind, MemberLocation, StructureMember};
use core_types::{NodeId, TaggedValue};
use graph_craft::{GraphError, InputConnector, RemovedNode};
use raster_nodes::{FolderNode, ImageLayerNode};
use raster_types::{BlendMode, Surface};

/// Adds a layer or folder along with the graph node backing it.
#[derive(Debug)]
pub struct CreateStructureMember {
	id: NodeId,
	name: String,
	kind: MemberKind,
	location: MemberLocation,
}

impl CreateStructureMember {
	pub fn new(id: NodeId, name: String, kind: MemberKind, location: MemberLocation) -> Self {
		Self { id, name, kind, location }
	}
}

impl Change for CreateStructureMember {
	fn initialize(&mut self, target: &DocumentState) -> Result<(), ChangeError> {
		if target.network.contains(self.id) {
			return Err(GraphError::DuplicateNodeId(self.id).into());
		}
		target.structure.check_insert(self.id, self.location)
	}

	fn apply(&mut self, target: &mut DocumentState, _first_apply: bool) -> Result<ChangeOutcome, ChangeError> {
		match self.kind {
			MemberKind::Layer => {
				target.network.insert_node(self.id, Box::new(ImageLayerNode))?;
				target
					.network
					.set_input_value(InputConnector::node(self.id, ImageLayerNode::IMAGE), TaggedValue::Surface(Surface::new(target.size)))?;
			}
			MemberKind::Folder => target.network.insert_node(self.id, Box::new(FolderNode))?,
		}

		let member = StructureMember::new(self.id, self.name.clone(), self.kind);
		let synced = target.structure.insert(member, self.location).and_then(|_| target.sync_structure());
		match synced {
			Ok(rewired) => {
				let mut responses = vec![DocumentResponse::NodeCreated(self.id), DocumentResponse::MemberCreated(self.id)];
				responses.extend(rewired);
				Ok(responses.into())
			}
			Err(error) => {
				if let Err(remove_error) = target.structure.remove(self.id) {
					log::warn!("Member {} was not in the structure while rolling back its creation: {remove_error}", self.id);
				}
				target.network.remove_node(self.id)?;
				Err(error)
			}
		}
	}

	fn revert(&mut self, target: &mut DocumentState) -> Result<Vec<DocumentResponse>, ChangeError> {
		target.structure.remove(self.id)?;
		target.network.remove_node(self.id)?;
		let mut responses = vec![DocumentResponse::MemberDeleted(self.id), DocumentResponse::NodeDeleted(self.id)];
		responses.extend(target.sync_structure()?);
		Ok(responses)
	}
}

/// Removes a member with everything inside it.
#[derive(Debug)]
pub struct DeleteStructureMember {
	id: NodeId,
	/// Pre-order, so reinserting in order puts parents back before their children.
	members: Vec<(StructureMember, MemberLocation)>,
	/// Downstream first, so restoring in reverse brings back every source before its consumers.
	nodes: Vec<RemovedNode>,
}

impl DeleteStructureMember {
	pub fn new(id: NodeId) -> Self {
		Self {
			id,
			members: Vec::new(),
			nodes: Vec::new(),
		}
	}
}

impl Change for DeleteStructureMember {
	fn initialize(&mut self, target: &DocumentState) -> Result<(), ChangeError> {
		if !target.structure.contains(self.id) {
			return Err(ChangeError::MemberNotFound(self.id));
		}
		Ok(())
	}

	fn apply(&mut self, target: &mut DocumentState, _first_apply: bool) -> Result<ChangeOutcome, ChangeError> {
		let mut subtree = vec![self.id];
		subtree.extend(target.structure.descendants(Some(self.id)));

		self.members.clear();
		for id in subtree.iter().rev() {
			self.members.push(target.structure.remove(*id)?);
		}
		self.members.reverse();

		// A node always has more upstream nodes than any node it feeds
		subtree.sort_by_cached_key(|id| std::cmp::Reverse(target.network.upstream_nodes(*id).len()));
		self.nodes.clear();
		for id in &subtree {
			self.nodes.push(target.network.remove_node(*id)?);
		}

		let mut responses: Vec<_> = self.members.iter().map(|(member, _)| DocumentResponse::MemberDeleted(member.id)).collect();
		responses.extend(target.sync_structure()?);
		Ok(responses.into())
	}

	fn revert(&mut self, target: &mut DocumentState) -> Result<Vec<DocumentResponse>, ChangeError> {
		if self.nodes.is_empty() {
			return Err(ChangeError::NotApplied);
		}
		for (member, location) in self.members.drain(..) {
			target.structure.insert(member, location)?;
		}
		while let Some(removed) = self.nodes.pop() {
			target.network.restore_node(removed)?;
		}

		let mut responses = vec![DocumentResponse::MemberCreated(self.id)];
		responses.extend(target.sync_structure()?);
		Ok(responses)
	}
}

#[derive(Debug)]
pub struct MoveStructureMember {
	id: NodeId,
	to: MemberLocation,
	from: Option<MemberLocation>,
}

impl MoveStructureMember {
	pub fn new(id: NodeId, to: MemberLocation) -> Self {
		Self { id, to, from: None }
	}
}

impl Change for MoveStructureMember {
	fn initialize(&mut self, target: &DocumentState) -> Result<(), ChangeError> {
		if !target.structure.contains(self.id) {
			return Err(ChangeError::MemberNotFound(self.id));
		}
		if self.to.parent.is_some_and(|parent| target.structure.is_within(parent, self.id)) {
			return Err(ChangeError::InvalidStructureMove {
				member: self.id,
				reason: "a folder cannot be moved into itself",
			});
		}
		Ok(())
	}

	fn apply(&mut self, target: &mut DocumentState, first_apply: bool) -> Result<ChangeOutcome, ChangeError> {
		let from = target.structure.move_member(self.id, self.to)?;
		if first_apply && from == self.to {
			return Ok(ChangeOutcome::ignored());
		}
		self.from = Some(from);

		match target.sync_structure() {
			Ok(rewired) => {
				let mut responses = vec![DocumentResponse::MemberMoved(self.id)];
				responses.extend(rewired);
				Ok(responses.into())
			}
			Err(error) => {
				target.structure.move_member(self.id, from)?;
				Err(error)
			}
		}
	}

	fn revert(&mut self, target: &mut DocumentState) -> Result<Vec<DocumentResponse>, ChangeError> {
		let from = self.from.ok_or(ChangeError::NotApplied)?;
		target.structure.move_member(self.id, from)?;
		let mut responses = vec![DocumentResponse::MemberMoved(self.id)];
		responses.extend(target.sync_structure()?);
		Ok(responses)
	}
}

/// One compositing input of a member's backing node.
#[derive(Debug)]
struct MemberInput {
	member: NodeId,
	index: usize,
	value: TaggedValue,
	previous: TaggedValue,
}

impl MemberInput {
	fn new(member: NodeId, index: usize, value: impl Into<TaggedValue>) -> Self {
		Self {
			member,
			index,
			value: value.into(),
			previous: TaggedValue::None,
		}
	}

	fn connector(&self) -> InputConnector {
		InputConnector::node(self.member, self.index)
	}

	fn initialize(&mut self, target: &DocumentState) -> Result<(), ChangeError> {
		if !target.structure.contains(self.member) {
			return Err(ChangeError::MemberNotFound(self.member));
		}
		self.previous = target.network.input(self.connector())?.value.clone();
		Ok(())
	}

	fn set(&self, target: &mut DocumentState, value: TaggedValue) -> Result<Vec<DocumentResponse>, ChangeError> {
		target.network.set_input_value(self.connector(), value)?;
		Ok(vec![DocumentResponse::MemberPropertiesChanged(self.member)])
	}

	fn apply(&self, target: &mut DocumentState, first_apply: bool) -> Result<ChangeOutcome, ChangeError> {
		let responses = self.set(target, self.value.clone())?;
		if first_apply && self.value == self.previous {
			return Ok(ChangeOutcome::ignored());
		}
		Ok(responses.into())
	}

	fn revert(&self, target: &mut DocumentState) -> Result<Vec<DocumentResponse>, ChangeError> {
		self.set(target, self.previous.clone())
	}
}

#[derive(Debug)]
pub struct SetMemberVisibility(MemberInput);

impl SetMemberVisibility {
	pub fn new(member: NodeId, visible: bool) -> Self {
		Self(MemberInput::new(member, ImageLayerNode::IS_VISIBLE, visible))
	}
}

impl Change for SetMemberVisibility {
	fn initialize(&mut self, target: &DocumentState) -> Result<(), ChangeError> {
		self.0.initialize(target)
	}

	fn apply(&mut self, target: &mut DocumentState, first_apply: bool) -> Result<ChangeOutcome, ChangeError> {
		self.0.apply(target, first_apply)
	}

	fn revert(&mut self, target: &mut DocumentState) -> Result<Vec<DocumentResponse>, ChangeError> {
		self.0.revert(target)
	}
}

/// Sets a member's opacity, clamped to `0.0..=1.0`. Can be previewed while dragging a slider.
#[derive(Debug)]
pub struct SetMemberOpacity(MemberInput);

impl SetMemberOpacity {
	pub fn new(member: NodeId, opacity: f64) -> Self {
		Self(MemberInput::new(member, ImageLayerNode::OPACITY, opacity.clamp(0., 1.)))
	}

	pub fn update(&mut self, _member: NodeId, opacity: f64) {
		self.0.value = TaggedValue::F64(opacity.clamp(0., 1.));
	}
}

impl Change for SetMemberOpacity {
	fn initialize(&mut self, target: &DocumentState) -> Result<(), ChangeError> {
		self.0.initialize(target)
	}

	fn apply(&mut self, target: &mut DocumentState, first_apply: bool) -> Result<ChangeOutcome, ChangeError> {
		self.0.apply(target, first_apply)
	}

	fn revert(&mut self, target: &mut DocumentState) -> Result<Vec<DocumentResponse>, ChangeError> {
		self.0.revert(target)
	}
}

impl UpdateableChange for SetMemberOpacity {
	fn apply_temporarily(&mut self, target: &mut DocumentState) -> Result<Vec<DocumentResponse>, ChangeError> {
		self.0.set(target, self.0.value.clone())
	}
}

#[derive(Debug)]
pub struct SetMemberBlendMode(MemberInput);

impl SetMemberBlendMode {
	pub fn new(member: NodeId, blend_mode: BlendMode) -> Self {
		Self(MemberInput::new(member, ImageLayerNode::BLEND_MODE, blend_mode))
	}
}

impl Change for SetMemberBlendMode {
	fn initialize(&mut self, target: &DocumentState) -> Result<(), ChangeError> {
		self.0.initialize(target)
	}

	fn apply(&mut self, target: &mut DocumentState, first_apply: bool) -> Result<ChangeOutcome, ChangeError> {
		self.0.apply(target, first_apply)
	}

	fn revert(&mut self, target: &mut DocumentState) -> Result<Vec<DocumentResponse>, ChangeError> {
		self.0.revert(target)
	}
}

#[derive(Debug)]
pub struct RenameMember {
	member: NodeId,
	name: String,
	previous: String,
}

impl RenameMember {
	pub fn new(member: NodeId, name: String) -> Self {
		Self {
			member,
			name,
			previous: String::new(),
		}
	}

	fn set_name(&self, target: &mut DocumentState, name: &str) -> Result<Vec<DocumentResponse>, ChangeError> {
		let member = target.structure.member_mut(self.member).ok_or(ChangeError::MemberNotFound(self.member))?;
		member.name = name.to_string();
		Ok(vec![DocumentResponse::MemberPropertiesChanged(self.member)])
	}
}

impl Change for RenameMember {
	fn initialize(&mut self, target: &DocumentState) -> Result<(), ChangeError> {
		let member = target.structure.member(self.member).ok_or(ChangeError::MemberNotFound(self.member))?;
		self.previous = member.name.clone();
		Ok(())
	}

	fn apply(&mut self, target: &mut DocumentState, first_apply: bool) -> Result<ChangeOutcome, ChangeError> {
		if first_apply && self.name == self.previous {
			return Ok(ChangeOutcome::ignored());
		}
		Ok(self.set_name(target, &self.name)?.into())
	}

	fn revert(&mut self, target: &mut DocumentState) -> Result<Vec<DocumentResponse>, ChangeError> {
		self.set_name(target, &self.previous)
	}
}
