pub mod filter;
pub mod layer;
pub mod registry;
pub mod shape;

pub use filter::{BrightnessNode, InvertNode, OpacityNode};
pub use layer::{FolderNode, ImageLayerNode, OutputNode};
pub use registry::{NodeConstructor, create_node, node_kinds};
pub use shape::{EllipseNode, RasterizeNode, RectangleNode};

use core_types::{EvaluationContext, NodeIo, NodeMetadata};
use raster_types::Surface;

const fn metadata(identifier: &'static str, display_name: &'static str, category: &'static str) -> NodeMetadata {
	NodeMetadata { identifier, display_name, category }
}

/// The surface on `index`, or an empty canvas of the document size when the input is missing.
fn surface_or_canvas(io: &mut NodeIo, index: usize, context: &mut EvaluationContext) -> Surface {
	match io.take_surface(index) {
		Some(surface) => surface,
		None => context.pool.take(context.document_size()),
	}
}

#[cfg(test)]
pub(crate) mod test_utils {
	use core_types::{EvaluationContext, Node, NodeIo, RenderParams, TaggedValue};
	use glam::UVec2;
	use raster_types::SurfacePool;

	pub const CANVAS: UVec2 = UVec2::new(128, 96);

	/// Runs a node with the given inputs, filling the rest with the declared defaults. Returns every output.
	pub fn run(node: &dyn Node, overrides: &[(usize, TaggedValue)]) -> Vec<TaggedValue> {
		let signature = node.signature();
		let mut inputs: Vec<_> = signature.inputs.iter().map(|input| input.default.clone()).collect();
		for (index, value) in overrides {
			inputs[*index] = value.clone();
		}

		let mut pool = SurfacePool::default();
		let mut context = EvaluationContext::new(RenderParams::new(CANVAS), &mut pool);
		let mut io = NodeIo::new(inputs, signature.outputs.len());
		let primary = node.execute(&mut io, &mut context);
		assert_eq!(pool.end_evaluation(), 0, "node leaked scratch surfaces");
		io.into_outputs(primary)
	}
}
