//! Per-pixel adjustments applied to a whole surface.
//!
//! Every filter passes a missing input through as [`TaggedValue::None`] and only touches stored tiles,
//! so transparent regions stay transparent and cost nothing.

use crate::metadata;
use core_types::{EvaluationContext, InputDeclaration, Node, NodeIo, NodeMetadata, NodeSignature, OutputDeclaration, TaggedValue, Type};
use raster_types::Color;

fn filter_signature(parameter: Option<InputDeclaration>) -> NodeSignature {
	let mut inputs = vec![InputDeclaration::connection_only("Input", Type::Surface)];
	inputs.extend(parameter);
	NodeSignature::new(inputs, vec![OutputDeclaration::new("Output", Type::Surface)])
}

fn apply_filter(io: &mut NodeIo, map: impl Fn(Color) -> Color) -> TaggedValue {
	let Some(mut surface) = io.take_surface(0) else {
		log::trace!("Filter input is missing");
		return TaggedValue::None;
	};
	surface.map_pixels(map);
	surface.commit();
	TaggedValue::Surface(surface)
}

/// Inverts the color channels, keeping alpha.
#[derive(Debug, Clone, Copy, Default)]
pub struct InvertNode;

impl InvertNode {
	pub fn transform(color: Color) -> Color {
		color.inverted_rgb()
	}
}

impl Node for InvertNode {
	fn metadata(&self) -> NodeMetadata {
		metadata("raster_nodes::filter::InvertNode", "Invert", "Raster: Adjustment")
	}

	fn signature(&self) -> NodeSignature {
		filter_signature(None)
	}

	fn execute(&self, io: &mut NodeIo, _: &mut EvaluationContext) -> TaggedValue {
		apply_filter(io, Self::transform)
	}
}

/// Shifts every color channel by `Amount`, in the range -1 to 1.
#[derive(Debug, Clone, Copy, Default)]
pub struct BrightnessNode;

impl BrightnessNode {
	pub fn transform(color: Color, amount: f32) -> Color {
		if color.is_transparent() {
			return color;
		}
		color.map_rgb(|channel| (channel + amount).clamp(0., 1.))
	}
}

impl Node for BrightnessNode {
	fn metadata(&self) -> NodeMetadata {
		metadata("raster_nodes::filter::BrightnessNode", "Brightness", "Raster: Adjustment")
	}

	fn signature(&self) -> NodeSignature {
		filter_signature(Some(InputDeclaration::new("Amount", Type::F64, 0.)))
	}

	fn execute(&self, io: &mut NodeIo, _: &mut EvaluationContext) -> TaggedValue {
		let amount = io.f64_or(1, 0.).clamp(-1., 1.) as f32;
		apply_filter(io, |color| Self::transform(color, amount))
	}
}

/// Scales alpha by `Opacity`, in the range 0 to 1.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpacityNode;

impl OpacityNode {
	pub fn transform(color: Color, opacity: f32) -> Color {
		color.multiplied_alpha(opacity)
	}
}

impl Node for OpacityNode {
	fn metadata(&self) -> NodeMetadata {
		metadata("raster_nodes::filter::OpacityNode", "Opacity", "Raster: Adjustment")
	}

	fn signature(&self) -> NodeSignature {
		filter_signature(Some(InputDeclaration::new("Opacity", Type::F64, 1.)))
	}

	fn execute(&self, io: &mut NodeIo, _: &mut EvaluationContext) -> TaggedValue {
		let opacity = io.f64_or(1, 1.).clamp(0., 1.) as f32;
		apply_filter(io, |color| Self::transform(color, opacity))
	}
}
