use crate::metadata;
use core_types::{EvaluationContext, InputDeclaration, Node, NodeIo, NodeMetadata, NodeSignature, OutputDeclaration, TaggedValue, Type};
use glam::DVec2;
use raster_types::{Color, ShapeData};

fn shape_signature() -> NodeSignature {
	NodeSignature::new(
		vec![
			InputDeclaration::new("Position", Type::DVec2, DVec2::ZERO),
			InputDeclaration::new("Size", Type::DVec2, DVec2::splat(100.)),
			InputDeclaration::new("Color", Type::Color, Color::BLACK),
		],
		vec![OutputDeclaration::new("Image", Type::Surface), OutputDeclaration::new("Shape", Type::Shape)],
	)
}

/// Builds the shape from the inputs, publishes it on the `Shape` output and returns it drawn onto a document sized canvas.
fn render_shape(io: &mut NodeIo, context: &mut EvaluationContext, build: fn(DVec2, DVec2, Color) -> ShapeData) -> TaggedValue {
	let position = io.input(0).as_dvec2().unwrap_or(DVec2::ZERO);
	let size = io.input(1).as_dvec2().unwrap_or(DVec2::splat(100.));
	let color = io.input(2).as_color().unwrap_or(Color::BLACK);
	let shape = build(position, size, color);

	let mut surface = context.pool.take(context.document_size());
	if shape.is_degenerate() {
		log::trace!("Skipping rasterization of a degenerate {:?}", shape.kind);
	} else {
		shape.draw_into(&mut surface);
		surface.commit();
	}
	io.set_output(1, shape);
	TaggedValue::Surface(surface)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RectangleNode;

impl Node for RectangleNode {
	fn metadata(&self) -> NodeMetadata {
		metadata("raster_nodes::shape::RectangleNode", "Rectangle", "Shape")
	}

	fn signature(&self) -> NodeSignature {
		shape_signature()
	}

	fn execute(&self, io: &mut NodeIo, context: &mut EvaluationContext) -> TaggedValue {
		render_shape(io, context, ShapeData::rectangle)
	}
}

#[derive(Debug, Clone, Copy, Default)]
pub struct EllipseNode;

impl Node for EllipseNode {
	fn metadata(&self) -> NodeMetadata {
		metadata("raster_nodes::shape::EllipseNode", "Ellipse", "Shape")
	}

	fn signature(&self) -> NodeSignature {
		shape_signature()
	}

	fn execute(&self, io: &mut NodeIo, context: &mut EvaluationContext) -> TaggedValue {
		render_shape(io, context, ShapeData::ellipse)
	}
}

/// Draws a shape description onto a document sized canvas.
#[derive(Debug, Clone, Copy, Default)]
pub struct RasterizeNode;

impl Node for RasterizeNode {
	fn metadata(&self) -> NodeMetadata {
		metadata("raster_nodes::shape::RasterizeNode", "Rasterize", "Shape")
	}

	fn signature(&self) -> NodeSignature {
		NodeSignature::new(vec![InputDeclaration::connection_only("Shape", Type::Shape)], vec![OutputDeclaration::new("Image", Type::Surface)])
	}

	fn execute(&self, io: &mut NodeIo, context: &mut EvaluationContext) -> TaggedValue {
		let Some(shape) = io.input(0).as_shape().copied() else {
			return TaggedValue::None;
		};
		let mut surface = context.pool.take(context.document_size());
		shape.draw_into(&mut surface);
		surface.commit();
		TaggedValue::Surface(surface)
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::test_utils::{CANVAS, run};
	use glam::IVec2;
	use pretty_assertions::assert_eq;

	#[test]
	fn rectangle_outputs_image_and_shape() {
		let outputs = run(
			&RectangleNode,
			&[(0, DVec2::new(10., 20.).into()), (1, DVec2::new(30., 40.).into()), (2, Color::RED.into())],
		);
		let surface = outputs[0].as_surface().unwrap();
		assert_eq!(surface.size(), CANVAS);
		assert_eq!(surface.pixel(IVec2::new(10, 20)), Color::RED);
		assert_eq!(surface.pixel(IVec2::new(39, 59)), Color::RED);
		assert_eq!(surface.pixel(IVec2::new(40, 60)), Color::TRANSPARENT);
		assert!(!surface.has_pending());
		assert_eq!(outputs[1], TaggedValue::Shape(ShapeData::rectangle(DVec2::new(10., 20.), DVec2::new(30., 40.), Color::RED)));
	}

	#[test]
	fn ellipse_matches_direct_rasterization() {
		let shape = ShapeData::ellipse(DVec2::new(5., 5.), DVec2::new(60., 40.), Color::BLUE);
		let outputs = run(&EllipseNode, &[(0, shape.position.into()), (1, shape.size.into()), (2, shape.color.into())]);
		assert_eq!(outputs[0].as_surface(), Some(&shape.rasterize(CANVAS)));
	}

	#[test]
	fn zero_area_shape_renders_empty() {
		let outputs = run(&RectangleNode, &[(1, DVec2::new(0., 50.).into())]);
		let surface = outputs[0].as_surface().unwrap();
		assert!(surface.is_empty());
		assert_eq!(surface.size(), CANVAS);
	}

	#[test]
	fn rasterize_without_shape_is_none() {
		assert_eq!(run(&RasterizeNode, &[]), vec![TaggedValue::None]);

		let shape = ShapeData::rectangle(DVec2::splat(8.), DVec2::splat(16.), Color::GREEN);
		let outputs = run(&RasterizeNode, &[(0, shape.into())]);
		assert_eq!(outputs[0].as_surface(), Some(&shape.rasterize(CANVAS)));
	}
}
