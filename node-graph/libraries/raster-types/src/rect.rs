use crate::tile::{TILE_SIZE, TileCoord};
use glam::{IVec2, UVec2};
use serde::{Deserialize, Serialize};

/// An axis aligned integer pixel rectangle. `start` is inclusive and `end` is exclusive.
/// A rectangle whose end does not lie strictly after its start on both axes is empty.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RectI {
	pub start: IVec2,
	pub end: IVec2,
}

impl RectI {
	pub const EMPTY: RectI = RectI { start: IVec2::ZERO, end: IVec2::ZERO };

	#[must_use]
	pub const fn new(start: IVec2, end: IVec2) -> Self {
		Self { start, end }
	}

	#[must_use]
	pub fn from_position_size(position: IVec2, size: IVec2) -> Self {
		Self { start: position, end: position + size }
	}

	/// The rectangle covering a whole canvas of the given size, anchored at the origin.
	#[must_use]
	pub fn from_size(size: UVec2) -> Self {
		Self {
			start: IVec2::ZERO,
			end: size.as_ivec2(),
		}
	}

	/// The pixel area covered by a tile at the given coordinate.
	#[must_use]
	pub fn from_tile(coord: TileCoord) -> Self {
		let start = IVec2::new(coord.x, coord.y) * TILE_SIZE as i32;
		Self::from_position_size(start, IVec2::splat(TILE_SIZE as i32))
	}

	pub fn width(&self) -> i32 {
		self.end.x - self.start.x
	}

	pub fn height(&self) -> i32 {
		self.end.y - self.start.y
	}

	/// Number of pixels covered, `0` for empty or inverted rectangles.
	pub fn area(&self) -> usize {
		if self.is_empty() { 0 } else { self.width() as usize * self.height() as usize }
	}

	pub fn is_empty(&self) -> bool {
		self.width() <= 0 || self.height() <= 0
	}

	pub fn contains(&self, point: IVec2) -> bool {
		point.x >= self.start.x && point.y >= self.start.y && point.x < self.end.x && point.y < self.end.y
	}

	#[must_use]
	pub fn intersect(&self, other: &RectI) -> RectI {
		RectI {
			start: self.start.max(other.start),
			end: self.end.min(other.end),
		}
	}

	/// Smallest rectangle containing both. Empty rectangles do not contribute.
	#[must_use]
	pub fn union(&self, other: &RectI) -> RectI {
		match (self.is_empty(), other.is_empty()) {
			(true, _) => *other,
			(_, true) => *self,
			_ => RectI {
				start: self.start.min(other.start),
				end: self.end.max(other.end),
			},
		}
	}

	#[must_use]
	pub fn translate(&self, offset: IVec2) -> RectI {
		RectI {
			start: self.start + offset,
			end: self.end + offset,
		}
	}

	/// All tiles at full resolution that intersect this rectangle, in row-major order.
	pub fn tiles(&self) -> impl Iterator<Item = TileCoord> + use<> {
		let size = TILE_SIZE as i32;
		let (min, max) = if self.is_empty() {
			(IVec2::ZERO, IVec2::ZERO)
		} else {
			(
				IVec2::new(self.start.x.div_euclid(size), self.start.y.div_euclid(size)),
				IVec2::new((self.end.x - 1).div_euclid(size) + 1, (self.end.y - 1).div_euclid(size) + 1),
			)
		};
		(min.y..max.y).flat_map(move |y| (min.x..max.x).map(move |x| TileCoord { x, y }))
	}
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn negative_and_zero_rects_are_empty() {
		assert!(RectI::new(IVec2::new(5, 5), IVec2::new(5, 10)).is_empty());
		assert!(RectI::new(IVec2::new(5, 5), IVec2::new(2, 10)).is_empty());
		assert_eq!(RectI::new(IVec2::new(5, 5), IVec2::new(2, 10)).area(), 0);
		assert_eq!(RectI::new(IVec2::new(5, 5), IVec2::new(2, 10)).tiles().count(), 0);
	}

	#[test]
	fn tiles_cover_partial_edges() {
		let rect = RectI::new(IVec2::new(-1, 10), IVec2::new(TILE_SIZE as i32 + 1, 20));
		let tiles: Vec<_> = rect.tiles().collect();
		assert_eq!(tiles, vec![TileCoord { x: -1, y: 0 }, TileCoord { x: 0, y: 0 }, TileCoord { x: 1, y: 0 }]);
	}

	#[test]
	fn union_ignores_empty() {
		let a = RectI::from_position_size(IVec2::new(1, 1), IVec2::new(2, 2));
		assert_eq!(a.union(&RectI::EMPTY), a);
		assert_eq!(RectI::EMPTY.union(&a), a);
	}
}
