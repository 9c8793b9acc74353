//! Nodes mirroring the structure tree. Layers and folders are chained through their `Background` input,
//! bottom member first, and the top of the root chain feeds the [`OutputNode`].

use crate::{metadata, surface_or_canvas};
use core_types::{EvaluationContext, InputDeclaration, Node, NodeIo, NodeMetadata, NodeSignature, OutputDeclaration, TaggedValue, Type};
use raster_types::{BlendMode, Surface};

/// Blending options shared by layers and folders, read from inputs 2, 3 and 4.
struct Compositing {
	opacity: f32,
	visible: bool,
	blend_mode: BlendMode,
}

impl Compositing {
	fn inputs() -> [InputDeclaration; 3] {
		[
			InputDeclaration::new("Opacity", Type::F64, 1.),
			InputDeclaration::new("IsVisible", Type::Bool, true),
			InputDeclaration::new("BlendMode", Type::BlendMode, BlendMode::Normal),
		]
	}

	fn read(io: &NodeIo) -> Self {
		Self {
			opacity: io.f64_or(2, 1.).clamp(0., 1.) as f32,
			visible: io.bool_or(3, true),
			blend_mode: io.input(4).as_blend_mode().unwrap_or_default(),
		}
	}

	/// Blends `top` over `background` when visible. A missing background becomes an empty canvas.
	fn composite(&self, io: &mut NodeIo, top: Option<&Surface>, context: &mut EvaluationContext) -> Surface {
		let mut output = surface_or_canvas(io, 0, context);
		if let Some(top) = top.filter(|_| self.visible) {
			output.blend_from(top, self.opacity, self.blend_mode);
			output.commit();
		}
		output
	}
}

/// A raster layer. Its pixels live in the `Image` literal, which changes edit in place.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageLayerNode;

impl ImageLayerNode {
	pub const BACKGROUND: usize = 0;
	pub const IMAGE: usize = 1;
	pub const OPACITY: usize = 2;
	pub const IS_VISIBLE: usize = 3;
	pub const BLEND_MODE: usize = 4;
}

impl Node for ImageLayerNode {
	fn metadata(&self) -> NodeMetadata {
		metadata("raster_nodes::layer::ImageLayerNode", "Image Layer", "Structure")
	}

	fn signature(&self) -> NodeSignature {
		let mut inputs = vec![InputDeclaration::connection_only("Background", Type::Surface), InputDeclaration::connection_only("Image", Type::Surface)];
		inputs.extend(Compositing::inputs());
		NodeSignature::new(inputs, vec![OutputDeclaration::new("Output", Type::Surface), OutputDeclaration::new("FilterlessOutput", Type::Surface)])
	}

	fn execute(&self, io: &mut NodeIo, context: &mut EvaluationContext) -> TaggedValue {
		let compositing = Compositing::read(io);
		let image = io.take_surface(Self::IMAGE).map(|image| image.clone_from_latest());
		let output = compositing.composite(io, image.as_ref(), context);
		if let Some(image) = image {
			io.set_output(1, image);
		}
		TaggedValue::Surface(output)
	}
}

/// A group of members. Its children are composited onto a transparent canvas fed into `Content`,
/// which is then blended over the background as a single layer.
#[derive(Debug, Clone, Copy, Default)]
pub struct FolderNode;

impl FolderNode {
	pub const BACKGROUND: usize = 0;
	pub const CONTENT: usize = 1;
	pub const OPACITY: usize = 2;
	pub const IS_VISIBLE: usize = 3;
	pub const BLEND_MODE: usize = 4;
}

impl Node for FolderNode {
	fn metadata(&self) -> NodeMetadata {
		metadata("raster_nodes::layer::FolderNode", "Folder", "Structure")
	}

	fn signature(&self) -> NodeSignature {
		let mut inputs = vec![InputDeclaration::connection_only("Background", Type::Surface), InputDeclaration::connection_only("Content", Type::Surface)];
		inputs.extend(Compositing::inputs());
		NodeSignature::new(inputs, vec![OutputDeclaration::new("Output", Type::Surface)])
	}

	fn execute(&self, io: &mut NodeIo, context: &mut EvaluationContext) -> TaggedValue {
		let compositing = Compositing::read(io);
		let content = io.take_surface(Self::CONTENT);
		let output = compositing.composite(io, content.as_ref(), context);
		if let Some(content) = content {
			context.pool.recycle(content);
		}
		TaggedValue::Surface(output)
	}
}

/// The document's final image.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputNode;

impl Node for OutputNode {
	fn metadata(&self) -> NodeMetadata {
		metadata("raster_nodes::layer::OutputNode", "Output", "Structure")
	}

	fn signature(&self) -> NodeSignature {
		NodeSignature::new(vec![InputDeclaration::connection_only("Input", Type::Surface)], vec![OutputDeclaration::new("Output", Type::Surface)])
	}

	fn execute(&self, io: &mut NodeIo, _: &mut EvaluationContext) -> TaggedValue {
		io.take_input(0)
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::test_utils::{CANVAS, run};
	use glam::{DVec2, IVec2};
	use pretty_assertions::assert_eq;
	use raster_types::{Color, ShapeData};

	fn square(position: f64, color: Color) -> Surface {
		ShapeData::rectangle(DVec2::splat(position), DVec2::splat(10.), color).rasterize(CANVAS)
	}

	#[test]
	fn layer_without_background_or_image_is_empty_canvas() {
		let outputs = run(&ImageLayerNode, &[]);
		let output = outputs[0].as_surface().unwrap();
		assert!(output.is_empty());
		assert_eq!(output.size(), CANVAS);
		assert_eq!(outputs[1], TaggedValue::None);
	}

	#[test]
	fn layer_blends_image_over_background() {
		let outputs = run(
			&ImageLayerNode,
			&[(ImageLayerNode::BACKGROUND, square(0., Color::RED).into()), (ImageLayerNode::IMAGE, square(5., Color::BLUE).into())],
		);
		let output = outputs[0].as_surface().unwrap();
		assert_eq!(output.pixel(IVec2::new(2, 2)), Color::RED);
		assert_eq!(output.pixel(IVec2::new(7, 7)), Color::BLUE);
		assert_eq!(output.pixel(IVec2::new(12, 12)), Color::BLUE);
		assert_eq!(outputs[1].as_surface(), Some(&square(5., Color::BLUE)));
	}

	#[test]
	fn hidden_layer_passes_background_through() {
		let background = square(0., Color::RED);
		let outputs = run(
			&ImageLayerNode,
			&[
				(ImageLayerNode::BACKGROUND, background.clone().into()),
				(ImageLayerNode::IMAGE, square(5., Color::BLUE).into()),
				(ImageLayerNode::IS_VISIBLE, false.into()),
			],
		);
		assert_eq!(outputs[0].as_surface(), Some(&background));
	}

	#[test]
	fn uncommitted_image_writes_are_composited() {
		let mut image = Surface::new(CANVAS);
		image.fill(Color::GREEN, BlendMode::Normal);
		let outputs = run(&ImageLayerNode, &[(ImageLayerNode::IMAGE, image.into())]);
		assert_eq!(outputs[0].as_surface().unwrap().pixel(IVec2::new(100, 90)), Color::GREEN);
	}

	#[test]
	fn folder_applies_opacity_to_content_as_a_whole() {
		let mut content = square(0., Color::RED);
		content.blend_from(&square(5., Color::BLUE), 1., BlendMode::Normal);
		content.commit();

		let outputs = run(&FolderNode, &[(FolderNode::CONTENT, content.into()), (FolderNode::OPACITY, 0.5.into())]);
		let output = outputs[0].as_surface().unwrap();
		assert_eq!(output.pixel(IVec2::new(7, 7)), Color::BLUE.with_alpha(0.5));
		assert_eq!(output.pixel(IVec2::new(2, 2)), Color::RED.with_alpha(0.5));
	}

	#[test]
	fn output_passes_input_through() {
		assert_eq!(run(&OutputNode, &[]), vec![TaggedValue::None]);
		let image = square(0., Color::WHITE);
		assert_eq!(run(&OutputNode, &[(0, image.clone().into())]), vec![TaggedValue::Surface(image)]);
	}
}
