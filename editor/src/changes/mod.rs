//! Reversible document mutations.
//!
//! A [`Change`] is created by an action, initialized against the document once, and then applied and reverted any
//! number of times by the change tracker. `apply` followed by `revert` must leave the document observably as it was.

mod graph;
mod raster;
mod structure;

pub use graph::{ConnectProperties, CreateNode, DeleteNode, DisconnectProperty, UpdatePropertyValue};
pub use raster::{ClearLayer, DrawRectangle, PenStroke, ResizeCanvas, ShiftLayer};
pub use structure::{CreateStructureMember, DeleteStructureMember, MoveStructureMember, RenameMember, SetMemberBlendMode, SetMemberOpacity, SetMemberVisibility};

use crate::document::DocumentState;
use crate::error::ChangeError;
use crate::response::DocumentResponse;
use std::any::Any;

/// What applying a change did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeOutcome {
	pub responses: Vec<DocumentResponse>,
	/// The change had no effect and should not be recorded in the undo history.
	pub ignore_in_undo: bool,
}

impl ChangeOutcome {
	pub fn new(responses: Vec<DocumentResponse>) -> Self {
		Self { responses, ignore_in_undo: false }
	}

	pub fn ignored() -> Self {
		Self {
			responses: Vec::new(),
			ignore_in_undo: true,
		}
	}
}

impl From<Vec<DocumentResponse>> for ChangeOutcome {
	fn from(responses: Vec<DocumentResponse>) -> Self {
		Self::new(responses)
	}
}

pub trait Change: Any + std::fmt::Debug + Send {
	/// Validates the change against the document and captures whatever the first application needs.
	/// Called exactly once, before anything else.
	fn initialize(&mut self, target: &DocumentState) -> Result<(), ChangeError>;

	/// Applies the change. `first_apply` is false when the change is being redone.
	fn apply(&mut self, target: &mut DocumentState, first_apply: bool) -> Result<ChangeOutcome, ChangeError>;

	/// Undoes the most recent application, including a temporary one of an interactive change.
	fn revert(&mut self, target: &mut DocumentState) -> Result<Vec<DocumentResponse>, ChangeError>;

	/// Whether `other`, recorded right after this change, may share its undo entry.
	fn is_mergeable_with(&self, _other: &dyn Change) -> bool {
		false
	}
}

/// A change that can be previewed repeatedly while its parameters are still being edited, as during a drag.
pub trait UpdateableChange: Change {
	/// Shows the change with its current parameters, replacing the previous preview.
	fn apply_temporarily(&mut self, target: &mut DocumentState) -> Result<Vec<DocumentResponse>, ChangeError>;
}

/// Whether `other` is a change of the same concrete type as `change` and, if so, it.
pub(crate) fn same_kind<'a, T: Change>(_change: &T, other: &'a dyn Change) -> Option<&'a T> {
	(other as &dyn Any).downcast_ref::<T>()
}
