//! User facing requests. The UI builds actions and hands them to the document, which turns them into changes.
//!
//! Every change declares its constructor parameters once through `change_action!` or `interactive_change_actions!`,
//! which generate the action types for it.

use crate::changes::*;
use crate::structure::{MemberKind, MemberLocation};
use core_types::{NodeId, TaggedValue};
use glam::{IVec2, UVec2};
use graph_craft::{InputConnector, OutputConnector};
use raster_types::{BlendMode, Color, RectI};
use std::any::Any;
use std::fmt::Debug;

/// Creates a change that is applied once.
pub trait MakeChangeAction: Debug + Send {
	fn create_change(&self) -> Box<dyn Change>;
}

/// Starts an interactive change, or feeds new parameters into the one in progress.
pub trait StartOrUpdateChangeAction: Debug + Send {
	fn create_change(&self) -> Box<dyn UpdateableChange>;

	/// Updates `change` with this action's parameters. Returns false if `change` is of another type.
	fn update_change(&self, change: &mut dyn UpdateableChange) -> bool;
}

/// Finishes the interactive change in progress.
pub trait EndChangeAction: Debug + Send {
	fn is_change_type_matching(&self, change: &dyn UpdateableChange) -> bool;

	/// Whether the change is discarded instead of applied.
	fn cancels(&self) -> bool {
		false
	}
}

#[derive(Debug)]
pub enum Action {
	Make(Box<dyn MakeChangeAction>),
	StartOrUpdate(Box<dyn StartOrUpdateChangeAction>),
	End(Box<dyn EndChangeAction>),
	Undo,
	Redo,
	/// Closes the current undo packet. Everything recorded since the previous boundary is undone as one step.
	ChangeBoundary,
	DeleteRecordedChanges,
}

/// Declares the fire-and-forget action of a change.
///
/// ```ignore
/// change_action!(ClearLayer => ClearLayerAction { layer: NodeId });
/// ```
macro_rules! change_action {
	($change:ident => $action:ident { $($field:ident: $ty:ty),* $(,)? }) => {
		#[derive(Debug, Clone)]
		pub struct $action {
			$(pub $field: $ty,)*
		}

		impl $action {
			pub fn new($($field: $ty),*) -> Self {
				Self { $($field),* }
			}
		}

		impl MakeChangeAction for $action {
			fn create_change(&self) -> Box<dyn Change> {
				Box::new($change::new($(self.$field.clone()),*))
			}
		}

		impl From<$action> for Action {
			fn from(action: $action) -> Self {
				Action::Make(Box::new(action))
			}
		}
	};
}

/// Declares all three actions of an interactive change: applied at once, started or updated, and ended or cancelled.
/// The change needs a `new` and an `update` taking the declared parameters in order.
///
/// ```ignore
/// interactive_change_actions!(ShiftLayer => ShiftLayerAction, StartShiftLayer, EndShiftLayer { layer: NodeId, offset: IVec2 });
/// ```
macro_rules! interactive_change_actions {
	($change:ident => $action:ident, $start:ident, $end:ident { $($field:ident: $ty:ty),* $(,)? }) => {
		change_action!($change => $action { $($field: $ty),* });

		#[derive(Debug, Clone)]
		pub struct $start {
			$(pub $field: $ty,)*
		}

		impl $start {
			pub fn new($($field: $ty),*) -> Self {
				Self { $($field),* }
			}
		}

		impl StartOrUpdateChangeAction for $start {
			fn create_change(&self) -> Box<dyn UpdateableChange> {
				Box::new($change::new($(self.$field.clone()),*))
			}

			fn update_change(&self, change: &mut dyn UpdateableChange) -> bool {
				let Some(change) = (change as &mut dyn Any).downcast_mut::<$change>() else { return false };
				change.update($(self.$field.clone()),*);
				true
			}
		}

		impl From<$start> for Action {
			fn from(action: $start) -> Self {
				Action::StartOrUpdate(Box::new(action))
			}
		}

		#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
		pub struct $end {
			pub cancel: bool,
		}

		impl $end {
			pub fn new() -> Self {
				Self { cancel: false }
			}

			pub fn cancelled() -> Self {
				Self { cancel: true }
			}
		}

		impl EndChangeAction for $end {
			fn is_change_type_matching(&self, change: &dyn UpdateableChange) -> bool {
				(change as &dyn Any).is::<$change>()
			}

			fn cancels(&self) -> bool {
				self.cancel
			}
		}

		impl From<$end> for Action {
			fn from(action: $end) -> Self {
				Action::End(Box::new(action))
			}
		}
	};
}

// Graph
change_action!(CreateNode => CreateNodeAction { id: NodeId, identifier: String });
change_action!(DeleteNode => DeleteNodeAction { id: NodeId });
change_action!(ConnectProperties => ConnectPropertiesAction { output: OutputConnector, input: InputConnector });
change_action!(DisconnectProperty => DisconnectPropertyAction { input: InputConnector });
interactive_change_actions!(UpdatePropertyValue => UpdatePropertyValueAction, StartUpdatePropertyValue, EndUpdatePropertyValue { input: InputConnector, value: TaggedValue });

// Structure
change_action!(CreateStructureMember => CreateStructureMemberAction { id: NodeId, name: String, kind: MemberKind, location: MemberLocation });
change_action!(DeleteStructureMember => DeleteStructureMemberAction { id: NodeId });
change_action!(MoveStructureMember => MoveStructureMemberAction { id: NodeId, to: MemberLocation });
change_action!(SetMemberVisibility => SetMemberVisibilityAction { member: NodeId, visible: bool });
interactive_change_actions!(SetMemberOpacity => SetMemberOpacityAction, StartSetMemberOpacity, EndSetMemberOpacity { member: NodeId, opacity: f64 });
change_action!(SetMemberBlendMode => SetMemberBlendModeAction { member: NodeId, blend_mode: BlendMode });
change_action!(RenameMember => RenameMemberAction { member: NodeId, name: String });

// Raster
interactive_change_actions!(DrawRectangle => DrawRectangleAction, StartDrawRectangle, EndDrawRectangle { layer: NodeId, rect: RectI, color: Color, blend_mode: BlendMode });
interactive_change_actions!(PenStroke => PenStrokeAction, StartPenStroke, EndPenStroke { layer: NodeId, points: Vec<IVec2>, color: Color, width: u32 });
interactive_change_actions!(ShiftLayer => ShiftLayerAction, StartShiftLayer, EndShiftLayer { layer: NodeId, offset: IVec2 });
change_action!(ClearLayer => ClearLayerAction { layer: NodeId });
change_action!(ResizeCanvas => ResizeCanvasAction { size: UVec2 });

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn start_actions_only_update_their_own_change() {
		let layer = NodeId(1);
		let mut shift = StartShiftLayer::new(layer, IVec2::ONE).create_change();
		assert!(StartShiftLayer::new(layer, IVec2::new(3, 0)).update_change(shift.as_mut()));
		assert!(!StartSetMemberOpacity::new(layer, 0.5).update_change(shift.as_mut()));

		assert!(EndShiftLayer::new().is_change_type_matching(shift.as_ref()));
		assert!(!EndDrawRectangle::new().is_change_type_matching(shift.as_ref()));
		assert!(EndShiftLayer::cancelled().cancels());
	}

	#[test]
	fn actions_convert_into_their_shape() {
		assert!(matches!(Action::from(ClearLayerAction::new(NodeId(1))), Action::Make(_)));
		assert!(matches!(Action::from(StartPenStroke::new(NodeId(1), vec![IVec2::ZERO], Color::BLACK, 2)), Action::StartOrUpdate(_)));
		assert!(matches!(Action::from(EndPenStroke::cancelled()), Action::End(_)));
	}
}
