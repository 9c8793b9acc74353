use crate::{CacheTriggers, EvaluationContext, TaggedValue, Type};
use raster_types::Surface;

/// How a node kind presents itself in a node palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeMetadata {
	/// Stable internal name, used to recreate the node when a document is loaded.
	pub identifier: &'static str,
	pub display_name: &'static str,
	pub category: &'static str,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InputDeclaration {
	pub name: &'static str,
	pub ty: Type,
	/// Literal value an input holds when the node is created.
	pub default: TaggedValue,
}

impl InputDeclaration {
	pub fn new(name: &'static str, ty: Type, default: impl Into<TaggedValue>) -> Self {
		Self { name, ty, default: default.into() }
	}

	/// An input with no meaningful literal, which evaluates to [`TaggedValue::None`] until connected.
	pub fn connection_only(name: &'static str, ty: Type) -> Self {
		Self {
			name,
			ty,
			default: TaggedValue::None,
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputDeclaration {
	pub name: &'static str,
	pub ty: Type,
}

impl OutputDeclaration {
	pub const fn new(name: &'static str, ty: Type) -> Self {
		Self { name, ty }
	}
}

/// The ordered ports of a node. Fixed for the lifetime of the node.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeSignature {
	pub inputs: Vec<InputDeclaration>,
	pub outputs: Vec<OutputDeclaration>,
}

impl NodeSignature {
	pub fn new(inputs: Vec<InputDeclaration>, outputs: Vec<OutputDeclaration>) -> Self {
		Self { inputs, outputs }
	}

	pub fn input_index(&self, name: &str) -> Option<usize> {
		self.inputs.iter().position(|input| input.name == name)
	}

	pub fn output_index(&self, name: &str) -> Option<usize> {
		self.outputs.iter().position(|output| output.name == name)
	}
}

/// Resolved input values handed to [`Node::execute`], and the slots for the secondary outputs it writes.
#[derive(Debug, Default)]
pub struct NodeIo {
	inputs: Vec<TaggedValue>,
	outputs: Vec<TaggedValue>,
}

impl NodeIo {
	pub fn new(inputs: Vec<TaggedValue>, output_count: usize) -> Self {
		Self {
			inputs,
			outputs: vec![TaggedValue::None; output_count],
		}
	}

	/// The value of an input. Out of range indices read as [`TaggedValue::None`].
	pub fn input(&self, index: usize) -> &TaggedValue {
		static NONE: TaggedValue = TaggedValue::None;
		self.inputs.get(index).unwrap_or(&NONE)
	}

	/// Moves an input value out, leaving [`TaggedValue::None`] behind.
	pub fn take_input(&mut self, index: usize) -> TaggedValue {
		self.inputs.get_mut(index).map(std::mem::take).unwrap_or_default()
	}

	/// Moves a surface input out, or `None` if the input is empty or of another type.
	pub fn take_surface(&mut self, index: usize) -> Option<Surface> {
		self.take_input(index).into_surface()
	}

	pub fn f64_or(&self, index: usize, default: f64) -> f64 {
		self.input(index).as_f64().unwrap_or(default)
	}

	pub fn bool_or(&self, index: usize, default: bool) -> bool {
		self.input(index).as_bool().unwrap_or(default)
	}

	/// Writes a secondary output. Index `0` is reserved for the value returned from [`Node::execute`].
	pub fn set_output(&mut self, index: usize, value: impl Into<TaggedValue>) {
		match self.outputs.get_mut(index) {
			Some(slot) if index > 0 => *slot = value.into(),
			_ => log::warn!("Node wrote to output {index}, which is not a secondary output"),
		}
	}

	/// All outputs, with `primary` placed at index `0`.
	pub fn into_outputs(mut self, primary: TaggedValue) -> Vec<TaggedValue> {
		match self.outputs.first_mut() {
			Some(slot) => *slot = primary,
			None => self.outputs.push(primary),
		}
		self.outputs
	}
}

/// A unit of computation with a fixed set of typed ports.
///
/// The engine only ever sees this interface. Inputs arrive already resolved, with connections followed
/// through the network, so an implementation never looks at other nodes.
pub trait Node: std::fmt::Debug + Send + Sync {
	fn metadata(&self) -> NodeMetadata;

	fn signature(&self) -> NodeSignature;

	fn cache_triggers(&self) -> CacheTriggers {
		CacheTriggers::default()
	}

	/// Computes the primary output, which becomes output `0`. Secondary outputs are written through `io`.
	/// Missing inputs must degrade to an empty result rather than panic.
	fn execute(&self, io: &mut NodeIo, context: &mut EvaluationContext) -> TaggedValue;
}
