use crate::Color;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Edge length in pixels of every tile, at every resolution level.
pub const TILE_SIZE: u32 = 64;
pub const TILE_PIXELS: usize = (TILE_SIZE * TILE_SIZE) as usize;

/// Position of a tile in tile units (pixel position divided by [`TILE_SIZE`]).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileCoord {
	pub x: i32,
	pub y: i32,
}

impl TileCoord {
	pub const fn new(x: i32, y: i32) -> Self {
		Self { x, y }
	}

	/// The coordinate of the tile at `resolution` that this full resolution tile is downsampled into.
	pub fn at_resolution(self, resolution: Resolution) -> TileCoord {
		let factor = resolution.downscale_factor() as i32;
		TileCoord::new(self.x.div_euclid(factor), self.y.div_euclid(factor))
	}
}

/// The resolution levels a surface can be read at. Anything but [`Resolution::Full`] is derived by downsampling.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Resolution {
	#[default]
	Full,
	Half,
	Quarter,
	Eighth,
}

impl Resolution {
	pub const ALL: [Resolution; 4] = [Resolution::Full, Resolution::Half, Resolution::Quarter, Resolution::Eighth];

	/// How many full resolution pixels along each axis make up one pixel at this level.
	pub fn downscale_factor(self) -> u32 {
		match self {
			Resolution::Full => 1,
			Resolution::Half => 2,
			Resolution::Quarter => 4,
			Resolution::Eighth => 8,
		}
	}

	pub fn multiplier(self) -> f64 {
		1. / self.downscale_factor() as f64
	}
}

/// Identity of a tile's pixel contents. A new id is handed out every time pixels are written,
/// so two tiles with the same id are guaranteed to hold the same pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileId(u64);

impl TileId {
	fn next() -> Self {
		static NEXT_TILE_ID: AtomicU64 = AtomicU64::new(1);
		Self(NEXT_TILE_ID.fetch_add(1, Ordering::Relaxed))
	}
}

#[derive(Debug)]
struct TileData {
	id: TileId,
	pixels: Box<[Color]>,
}

impl Clone for TileData {
	fn clone(&self) -> Self {
		Self {
			id: TileId::next(),
			pixels: self.pixels.clone(),
		}
	}
}

/// A [`TILE_SIZE`] x [`TILE_SIZE`] block of pixels in row-major order.
///
/// Cloning a tile only bumps a reference count. Writing to a tile that is shared with another owner
/// (an undo snapshot, a cached node output, another surface) copies it first.
#[derive(Debug, Clone)]
pub struct Tile(Arc<TileData>);

impl Tile {
	pub fn new_filled(color: Color) -> Self {
		Self::from_pixels(vec![color; TILE_PIXELS].into_boxed_slice())
	}

	pub fn transparent() -> Self {
		Self::new_filled(Color::TRANSPARENT)
	}

	fn from_pixels(pixels: Box<[Color]>) -> Self {
		debug_assert_eq!(pixels.len(), TILE_PIXELS);
		Self(Arc::new(TileData { id: TileId::next(), pixels }))
	}

	pub fn id(&self) -> TileId {
		self.0.id
	}

	pub fn pixels(&self) -> &[Color] {
		&self.0.pixels
	}

	/// Mutable access to the pixels, copying them first if this tile is shared.
	/// The tile receives a fresh [`TileId`] either way.
	pub fn pixels_mut(&mut self) -> &mut [Color] {
		let data = Arc::make_mut(&mut self.0);
		data.id = TileId::next();
		&mut data.pixels
	}

	/// Pixel at a position local to this tile.
	pub fn pixel(&self, x: u32, y: u32) -> Color {
		self.0.pixels[(y * TILE_SIZE + x) as usize]
	}

	pub fn is_transparent(&self) -> bool {
		self.0.pixels.iter().all(Color::is_transparent)
	}

	/// Whether both handles point at the same pixel allocation.
	pub fn ptr_eq(&self, other: &Tile) -> bool {
		Arc::ptr_eq(&self.0, &other.0)
	}

	pub fn is_shared(&self) -> bool {
		Arc::strong_count(&self.0) > 1
	}

	/// Box-filters a `factor` x `factor` grid of full resolution tiles (row-major, `None` meaning transparent) into one tile.
	pub(crate) fn downsample(sources: &[Option<&Tile>], factor: u32) -> Option<Tile> {
		if sources.iter().all(Option::is_none) {
			return None;
		}

		let mut pixels = vec![Color::TRANSPARENT; TILE_PIXELS].into_boxed_slice();
		let weight = 1. / (factor * factor) as f32;
		let span = TILE_SIZE / factor;
		for (index, source) in sources.iter().enumerate() {
			let Some(source) = source else { continue };
			let offset_x = (index as u32 % factor) * span;
			let offset_y = (index as u32 / factor) * span;
			for y in 0..span {
				for x in 0..span {
					let (mut red, mut green, mut blue, mut alpha) = (0., 0., 0., 0.);
					for sample_y in 0..factor {
						for sample_x in 0..factor {
							let color = source.pixel(x * factor + sample_x, y * factor + sample_y);
							red += color.r() * color.a();
							green += color.g() * color.a();
							blue += color.b() * color.a();
							alpha += color.a();
						}
					}
					let color = if alpha > 0. {
						Color::from_rgbaf32_unchecked(red / alpha, green / alpha, blue / alpha, alpha * weight)
					} else {
						Color::TRANSPARENT
					};
					pixels[((offset_y + y) * TILE_SIZE + offset_x + x) as usize] = color;
				}
			}
		}

		let tile = Tile::from_pixels(pixels);
		(!tile.is_transparent()).then_some(tile)
	}
}

impl PartialEq for Tile {
	fn eq(&self, other: &Self) -> bool {
		self.ptr_eq(other) || self.id() == other.id() || self.pixels() == other.pixels()
	}
}
