//! Small numeric nodes for exercising the network and executor.

use core_types::{CacheTriggers, EvaluationContext, InputDeclaration, Node, NodeIo, NodeMetadata, NodeSignature, OutputDeclaration, TaggedValue, Type};

fn metadata(identifier: &'static str) -> NodeMetadata {
	NodeMetadata {
		identifier,
		display_name: identifier,
		category: "Test",
	}
}

fn numeric(inputs: &[&'static str]) -> NodeSignature {
	NodeSignature::new(
		inputs.iter().map(|name| InputDeclaration::new(*name, Type::F64, 0.)).collect(),
		vec![OutputDeclaration::new("Result", Type::F64)],
	)
}

#[derive(Debug)]
pub struct AddNode;

impl Node for AddNode {
	fn metadata(&self) -> NodeMetadata {
		metadata("test::Add")
	}

	fn signature(&self) -> NodeSignature {
		numeric(&["A", "B"])
	}

	fn execute(&self, io: &mut NodeIo, _: &mut EvaluationContext) -> TaggedValue {
		TaggedValue::F64(io.f64_or(0, 0.) + io.f64_or(1, 0.))
	}
}

/// Outputs its input, floored at zero.
#[derive(Debug)]
pub struct ClampNode;

impl Node for ClampNode {
	fn metadata(&self) -> NodeMetadata {
		metadata("test::Clamp")
	}

	fn signature(&self) -> NodeSignature {
		numeric(&["Value"])
	}

	fn execute(&self, io: &mut NodeIo, _: &mut EvaluationContext) -> TaggedValue {
		TaggedValue::F64(io.f64_or(0, 0.).max(0.))
	}
}

/// Doubles its input, or yields nothing when the input is missing.
#[derive(Debug)]
pub struct DoubleNode;

impl Node for DoubleNode {
	fn metadata(&self) -> NodeMetadata {
		metadata("test::Double")
	}

	fn signature(&self) -> NodeSignature {
		NodeSignature::new(vec![InputDeclaration::connection_only("Input", Type::F64)], vec![OutputDeclaration::new("Result", Type::F64)])
	}

	fn execute(&self, io: &mut NodeIo, _: &mut EvaluationContext) -> TaggedValue {
		match io.input(0).as_f64() {
			Some(value) => TaggedValue::F64(value * 2.),
			None => TaggedValue::None,
		}
	}
}

#[derive(Debug)]
pub struct FlagNode;

impl Node for FlagNode {
	fn metadata(&self) -> NodeMetadata {
		metadata("test::Flag")
	}

	fn signature(&self) -> NodeSignature {
		NodeSignature::new(vec![], vec![OutputDeclaration::new("Flag", Type::Bool)])
	}

	fn execute(&self, _: &mut NodeIo, _: &mut EvaluationContext) -> TaggedValue {
		TaggedValue::Bool(true)
	}
}

/// Passes its input through under a configurable cache policy.
#[derive(Debug)]
pub struct PolicyNode(pub CacheTriggers);

impl Node for PolicyNode {
	fn metadata(&self) -> NodeMetadata {
		metadata("test::Policy")
	}

	fn signature(&self) -> NodeSignature {
		numeric(&["Value"])
	}

	fn cache_triggers(&self) -> CacheTriggers {
		self.0
	}

	fn execute(&self, io: &mut NodeIo, _: &mut EvaluationContext) -> TaggedValue {
		TaggedValue::F64(io.f64_or(0, 0.))
	}
}

/// Leases a scratch surface and forgets to release it.
#[derive(Debug)]
pub struct LeakyNode;

impl Node for LeakyNode {
	fn metadata(&self) -> NodeMetadata {
		metadata("test::Leaky")
	}

	fn signature(&self) -> NodeSignature {
		NodeSignature::new(vec![], vec![OutputDeclaration::new("Image", Type::Surface)])
	}

	fn execute(&self, _: &mut NodeIo, context: &mut EvaluationContext) -> TaggedValue {
		let size = context.document_size();
		TaggedValue::Surface(context.pool.request(size))
	}
}

/// Produces an empty canvas of the document size.
#[derive(Debug)]
pub struct CanvasNode;

impl Node for CanvasNode {
	fn metadata(&self) -> NodeMetadata {
		metadata("test::Canvas")
	}

	fn signature(&self) -> NodeSignature {
		NodeSignature::new(vec![], vec![OutputDeclaration::new("Image", Type::Surface)])
	}

	fn execute(&self, _: &mut NodeIo, context: &mut EvaluationContext) -> TaggedValue {
		let size = context.document_size();
		TaggedValue::Surface(context.pool.take(size))
	}
}
