use crate::{BlendMode, Color, RectI, Surface};
use glam::{DVec2, UVec2};
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShapeKind {
	#[default]
	Rectangle,
	Ellipse,
}

/// A resolution independent description of a filled primitive, positioned in document pixel space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ShapeData {
	pub kind: ShapeKind,
	/// Top left corner of the bounding box.
	pub position: DVec2,
	pub size: DVec2,
	pub color: Color,
}

impl Hash for ShapeData {
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.kind.hash(state);
		self.position.to_array().map(f64::to_bits).hash(state);
		self.size.to_array().map(f64::to_bits).hash(state);
		self.color.hash(state);
	}
}

impl ShapeData {
	pub fn rectangle(position: DVec2, size: DVec2, color: Color) -> Self {
		Self {
			kind: ShapeKind::Rectangle,
			position,
			size,
			color,
		}
	}

	pub fn ellipse(position: DVec2, size: DVec2, color: Color) -> Self {
		Self {
			kind: ShapeKind::Ellipse,
			position,
			size,
			color,
		}
	}

	/// A shape covering no area rasterizes to nothing.
	pub fn is_degenerate(&self) -> bool {
		!(self.size.x.abs() > 0. && self.size.y.abs() > 0.) || !self.position.is_finite() || !self.size.is_finite()
	}

	/// Bounding box normalized so negative sizes extend up and to the left.
	pub fn bounds(&self) -> (DVec2, DVec2) {
		let corner = self.position + self.size;
		(self.position.min(corner), self.position.max(corner))
	}

	/// Draws the shape into the pending layer of `surface`.
	pub fn draw_into(&self, surface: &mut Surface) {
		if self.is_degenerate() {
			return;
		}
		let (min, max) = self.bounds();
		match self.kind {
			ShapeKind::Rectangle => surface.draw_rect(RectI::new(min.round().as_ivec2(), max.round().as_ivec2()), self.color, BlendMode::Normal),
			ShapeKind::Ellipse => surface.draw_ellipse((min + max) / 2., (max - min) / 2., self.color, BlendMode::Normal),
		}
	}

	/// Renders the shape onto a new committed canvas of the given size.
	pub fn rasterize(&self, canvas_size: UVec2) -> Surface {
		let mut surface = Surface::new(canvas_size);
		self.draw_into(&mut surface);
		surface.commit();
		surface
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use glam::IVec2;

	#[test]
	fn negative_size_rectangle_extends_backwards() {
		let shape = ShapeData::rectangle(DVec2::new(20., 20.), DVec2::new(-10., -5.), Color::RED);
		let surface = shape.rasterize(UVec2::new(64, 64));
		assert_eq!(surface.pixel(IVec2::new(10, 15)), Color::RED);
		assert_eq!(surface.pixel(IVec2::new(20, 20)), Color::TRANSPARENT);
	}

	#[test]
	fn degenerate_shapes_rasterize_to_nothing() {
		let shape = ShapeData::ellipse(DVec2::new(5., 5.), DVec2::new(0., 30.), Color::RED);
		assert!(shape.is_degenerate());
		assert!(shape.rasterize(UVec2::new(64, 64)).is_empty());
	}

	#[test]
	fn ellipse_fills_its_center() {
		let shape = ShapeData::ellipse(DVec2::new(0., 0.), DVec2::new(40., 20.), Color::GREEN);
		let surface = shape.rasterize(UVec2::new(64, 64));
		assert_eq!(surface.pixel(IVec2::new(20, 10)), Color::GREEN);
		assert_eq!(surface.pixel(IVec2::new(0, 0)), Color::TRANSPARENT);
	}
}
