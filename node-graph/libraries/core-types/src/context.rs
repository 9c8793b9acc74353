use bitflags::bitflags;
use glam::UVec2;
use raster_types::SurfacePool;
use serde::{Deserialize, Serialize};

bitflags! {
	/// Which categories of change make a node execute again instead of reusing its cached outputs.
	///
	/// An explicit invalidation of the node always forces execution. [`CacheTriggers::ALWAYS`] overrides every other
	/// flag, while the empty set means the node only runs on its first evaluation and after explicit invalidation.
	#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
	pub struct CacheTriggers: u8 {
		/// A value stored directly on one of the node's unconnected inputs changed.
		const LITERAL_INPUTS = 1 << 0;
		/// An upstream node feeding one of the inputs produced new outputs, or an input was rewired.
		const UPSTREAM = 1 << 1;
		/// The [`RenderParams`] of the evaluation changed.
		const CONTEXT = 1 << 2;
		/// Execute on every evaluation.
		const ALWAYS = 1 << 3;
	}
}

impl Default for CacheTriggers {
	fn default() -> Self {
		CacheTriggers::LITERAL_INPUTS | CacheTriggers::UPSTREAM | CacheTriggers::CONTEXT
	}
}

impl CacheTriggers {
	pub fn name(&self) -> &'static str {
		match *self {
			CacheTriggers::LITERAL_INPUTS => "LiteralInputs",
			CacheTriggers::UPSTREAM => "Upstream",
			CacheTriggers::CONTEXT => "Context",
			CacheTriggers::ALWAYS => "Always",
			_ if self.is_empty() => "ExplicitOnly",
			_ => "Multiple Triggers",
		}
	}
}

/// Parameters shared by every node of one evaluation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RenderParams {
	/// Size in pixels of the canvas nodes render onto.
	pub document_size: UVec2,
}

impl RenderParams {
	pub fn new(document_size: UVec2) -> Self {
		Self { document_size }
	}
}

pub struct EvaluationContext<'a> {
	pub params: RenderParams,
	/// Scratch surfaces leased from here must be released before `execute` returns.
	pub pool: &'a mut SurfacePool,
}

impl<'a> EvaluationContext<'a> {
	pub fn new(params: RenderParams, pool: &'a mut SurfacePool) -> Self {
		Self { params, pool }
	}

	pub fn document_size(&self) -> UVec2 {
		self.params.document_size
	}
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn default_triggers_cover_inputs_and_context() {
		let triggers = CacheTriggers::default();
		assert!(triggers.contains(CacheTriggers::LITERAL_INPUTS | CacheTriggers::UPSTREAM | CacheTriggers::CONTEXT));
		assert!(!triggers.contains(CacheTriggers::ALWAYS));
		assert_eq!(CacheTriggers::empty().name(), "ExplicitOnly");
	}
}
