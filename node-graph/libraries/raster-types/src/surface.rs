//! Sparse, tiled, multi-resolution pixel storage.
//!
//! A [`Surface`] keeps two layers of full resolution tiles. Writes land in the pending layer,
//! which reads through [`Surface::read_latest_region`] see immediately. [`Surface::commit`] moves
//! them into the committed layer, which is what [`Surface::read_region`] and the lazily derived
//! lower resolution levels are built from.

use crate::tile::{TILE_PIXELS, TILE_SIZE};
use crate::{BlendMode, Color, RectI, Resolution, Tile, TileCoord};
use glam::{DVec2, IVec2, UVec2};
use rustc_hash::{FxHashMap, FxHashSet, FxHasher};
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};
use std::sync::{Mutex, PoisonError};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SurfaceError {
	#[error("Pixel buffer holds {actual} pixels but the region needs {expected}")]
	BufferSizeMismatch { expected: usize, actual: usize },
	#[error("A surface cannot be resized to {0}")]
	InvalidSize(UVec2),
}

/// Committed tiles captured from a surface, shared rather than copied.
/// Coordinates without a tile were transparent at the time of capture.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TileSnapshot {
	tiles: Vec<(TileCoord, Option<Tile>)>,
}

impl TileSnapshot {
	pub fn coords(&self) -> impl Iterator<Item = TileCoord> + '_ {
		self.tiles.iter().map(|(coord, _)| *coord)
	}

	/// Number of captured coordinates, including transparent ones.
	pub fn len(&self) -> usize {
		self.tiles.len()
	}

	pub fn is_empty(&self) -> bool {
		self.tiles.is_empty()
	}

	/// Number of tiles actually holding pixel data.
	pub fn stored_tiles(&self) -> usize {
		self.tiles.iter().filter(|(_, tile)| tile.is_some()).count()
	}
}

type DerivedTiles = FxHashMap<(Resolution, TileCoord), Option<Tile>>;

#[derive(Debug, Default)]
pub struct Surface {
	size: UVec2,
	committed: FxHashMap<TileCoord, Tile>,
	pending: FxHashMap<TileCoord, Tile>,
	derived: Mutex<DerivedTiles>,
}

impl Clone for Surface {
	fn clone(&self) -> Self {
		Self {
			size: self.size,
			committed: self.committed.clone(),
			pending: self.pending.clone(),
			derived: Mutex::new(self.derived.lock().unwrap_or_else(PoisonError::into_inner).clone()),
		}
	}
}

impl Surface {
	pub fn new(size: UVec2) -> Self {
		Self { size, ..Default::default() }
	}

	/// Builds a committed surface from row-major pixels covering the whole canvas.
	pub fn from_pixels(size: UVec2, pixels: &[Color]) -> Result<Self, SurfaceError> {
		let mut surface = Self::new(size);
		surface.write_region(RectI::from_size(size), pixels)?;
		surface.commit();
		Ok(surface)
	}

	pub fn size(&self) -> UVec2 {
		self.size
	}

	pub fn bounds(&self) -> RectI {
		RectI::from_size(self.size)
	}

	/// True when no tile holds any data, committed or pending.
	pub fn is_empty(&self) -> bool {
		self.committed.is_empty() && self.pending.is_empty()
	}

	pub fn has_pending(&self) -> bool {
		!self.pending.is_empty()
	}

	pub fn committed_coords(&self) -> Vec<TileCoord> {
		sorted(self.committed.keys().copied())
	}

	pub fn pending_coords(&self) -> Vec<TileCoord> {
		sorted(self.pending.keys().copied())
	}

	/// Coordinates holding data in either layer.
	pub fn latest_coords(&self) -> Vec<TileCoord> {
		sorted(self.committed.keys().chain(self.pending.keys()).copied().collect::<FxHashSet<_>>())
	}

	pub fn committed_tile(&self, coord: TileCoord) -> Option<&Tile> {
		self.committed.get(&coord)
	}

	/// The pending tile if there is one, falling back to the committed tile.
	pub fn latest_tile(&self, coord: TileCoord) -> Option<&Tile> {
		self.pending.get(&coord).or_else(|| self.committed.get(&coord))
	}

	/// The most up to date pixel at a full resolution position. Positions outside the canvas are transparent.
	pub fn pixel(&self, position: IVec2) -> Color {
		if !self.bounds().contains(position) {
			return Color::TRANSPARENT;
		}
		let size = TILE_SIZE as i32;
		let coord = TileCoord::new(position.x.div_euclid(size), position.y.div_euclid(size));
		self.latest_tile(coord)
			.map_or(Color::TRANSPARENT, |tile| tile.pixel(position.x.rem_euclid(size) as u32, position.y.rem_euclid(size) as u32))
	}

	/// Writes row-major `pixels` covering `rect` into the pending layer. Parts outside the canvas are discarded
	/// and an empty rectangle is a no-op.
	pub fn write_region(&mut self, rect: RectI, pixels: &[Color]) -> Result<(), SurfaceError> {
		if rect.is_empty() {
			return Ok(());
		}
		if pixels.len() != rect.area() {
			return Err(SurfaceError::BufferSizeMismatch {
				expected: rect.area(),
				actual: pixels.len(),
			});
		}
		self.write_region_unchecked(rect, pixels);
		Ok(())
	}

	fn write_region_unchecked(&mut self, rect: RectI, pixels: &[Color]) {
		let clipped = rect.intersect(&self.bounds());
		for coord in clipped.tiles() {
			let tile_rect = RectI::from_tile(coord);
			let overlap = tile_rect.intersect(&clipped);
			let width = overlap.width() as usize;
			let destination = self.pending_tile_mut(coord).pixels_mut();
			for y in overlap.start.y..overlap.end.y {
				let source_start = ((y - rect.start.y) * rect.width() + overlap.start.x - rect.start.x) as usize;
				let destination_start = ((y - tile_rect.start.y) * TILE_SIZE as i32 + overlap.start.x - tile_rect.start.x) as usize;
				destination[destination_start..destination_start + width].copy_from_slice(&pixels[source_start..source_start + width]);
			}
		}
	}

	/// Reads committed pixels at the given resolution level. `rect` is expressed in that level's pixel space.
	/// Anything outside the canvas or not yet written reads as transparent.
	pub fn read_region(&self, rect: RectI, resolution: Resolution) -> Vec<Color> {
		let factor = resolution.downscale_factor();
		let level_bounds = RectI::from_size((self.size + UVec2::splat(factor - 1)) / factor);
		match resolution {
			Resolution::Full => copy_region(rect, level_bounds, |coord| self.committed.get(&coord).cloned()),
			_ => copy_region(rect, level_bounds, |coord| self.derived_tile(resolution, coord)),
		}
	}

	/// Reads full resolution pixels with pending writes composited over the committed tiles.
	pub fn read_latest_region(&self, rect: RectI) -> Vec<Color> {
		copy_region(rect, self.bounds(), |coord| self.latest_tile(coord).cloned())
	}

	/// Moves every pending tile into the committed layer, returning the coordinates that were touched.
	/// Tiles left fully transparent are dropped instead of stored.
	pub fn commit(&mut self) -> Vec<TileCoord> {
		let touched = self.pending_coords();
		for (coord, tile) in std::mem::take(&mut self.pending) {
			if tile.is_transparent() {
				self.committed.remove(&coord);
			} else {
				self.committed.insert(coord, tile);
			}
			self.invalidate_derived(coord);
		}
		if !touched.is_empty() {
			log::trace!("Committed {} tiles", touched.len());
		}
		touched
	}

	/// Discards all pending writes.
	pub fn cancel(&mut self) {
		self.pending.clear();
	}

	/// Drops the cached lower resolution tiles covering `rect` so they are rebuilt on the next read.
	pub fn invalidate(&mut self, rect: RectI) {
		for coord in rect.intersect(&self.bounds()).tiles() {
			self.invalidate_derived(coord);
		}
	}

	fn invalidate_derived(&mut self, coord: TileCoord) {
		let derived = self.derived.get_mut().unwrap_or_else(PoisonError::into_inner);
		for resolution in &Resolution::ALL[1..] {
			derived.remove(&(*resolution, coord.at_resolution(*resolution)));
		}
	}

	fn derived_tile(&self, resolution: Resolution, coord: TileCoord) -> Option<Tile> {
		let mut derived = self.derived.lock().unwrap_or_else(PoisonError::into_inner);
		if let Some(tile) = derived.get(&(resolution, coord)) {
			return tile.clone();
		}

		let factor = resolution.downscale_factor() as i32;
		let sources: Vec<_> = (0..factor)
			.flat_map(|y| (0..factor).map(move |x| TileCoord::new(coord.x * factor + x, coord.y * factor + y)))
			.map(|source| self.committed.get(&source))
			.collect();
		let tile = Tile::downsample(&sources, factor as u32);
		derived.insert((resolution, coord), tile.clone());
		tile
	}

	/// Number of lower resolution tiles currently cached.
	pub fn derived_tile_count(&self) -> usize {
		self.derived.lock().unwrap_or_else(PoisonError::into_inner).len()
	}

	fn pending_tile_mut(&mut self, coord: TileCoord) -> &mut Tile {
		let committed = &self.committed;
		self.pending.entry(coord).or_insert_with(|| committed.get(&coord).cloned().unwrap_or_else(Tile::transparent))
	}

	/// Captures the committed tiles at `coords`. The tiles are shared, so this costs a reference count per tile.
	pub fn snapshot(&self, coords: impl IntoIterator<Item = TileCoord>) -> TileSnapshot {
		let coords = sorted(coords.into_iter().collect::<FxHashSet<_>>());
		TileSnapshot {
			tiles: coords.into_iter().map(|coord| (coord, self.committed.get(&coord).cloned())).collect(),
		}
	}

	/// Captures every committed tile.
	pub fn snapshot_all(&self) -> TileSnapshot {
		self.snapshot(self.committed.keys().copied())
	}

	/// Puts previously captured tiles back into the committed layer, discarding pending writes at those coordinates.
	pub fn restore(&mut self, snapshot: &TileSnapshot) {
		for (coord, tile) in &snapshot.tiles {
			self.pending.remove(coord);
			match tile {
				Some(tile) => self.committed.insert(*coord, tile.clone()),
				None => self.committed.remove(coord),
			};
			self.invalidate_derived(*coord);
		}
	}

	/// A new surface whose committed layer is this surface's latest state. Every tile is shared.
	pub fn clone_from_latest(&self) -> Surface {
		let mut committed = self.committed.clone();
		for (coord, tile) in &self.pending {
			if tile.is_transparent() {
				committed.remove(coord);
			} else {
				committed.insert(*coord, tile.clone());
			}
		}
		Surface {
			size: self.size,
			committed,
			..Default::default()
		}
	}

	/// Changes the canvas size. Tiles falling fully outside are dropped and pixels past the new edge are cleared.
	pub fn resize(&mut self, size: UVec2) -> Result<(), SurfaceError> {
		if size.x == 0 || size.y == 0 {
			return Err(SurfaceError::InvalidSize(size));
		}
		self.size = size;
		let bounds = self.bounds();
		for tiles in [&mut self.committed, &mut self.pending] {
			tiles.retain(|coord, _| !RectI::from_tile(*coord).intersect(&bounds).is_empty());
			for (coord, tile) in tiles.iter_mut() {
				let tile_rect = RectI::from_tile(*coord);
				if tile_rect.intersect(&bounds) == tile_rect {
					continue;
				}
				let pixels = tile.pixels_mut();
				for (index, pixel) in pixels.iter_mut().enumerate() {
					let local = IVec2::new((index % TILE_SIZE as usize) as i32, (index / TILE_SIZE as usize) as i32);
					if !bounds.contains(tile_rect.start + local) {
						*pixel = Color::TRANSPARENT;
					}
				}
			}
		}
		self.derived.get_mut().unwrap_or_else(PoisonError::into_inner).clear();
		Ok(())
	}

	/// Empties the surface and sets a new size, keeping the map allocations for reuse.
	pub fn reset(&mut self, size: UVec2) {
		self.size = size;
		self.committed.clear();
		self.pending.clear();
		self.derived.get_mut().unwrap_or_else(PoisonError::into_inner).clear();
	}

	/// Writes transparent pixels over `rect` into the pending layer.
	pub fn clear_region(&mut self, rect: RectI) {
		let rect = rect.intersect(&self.bounds());
		self.write_region_unchecked(rect, &vec![Color::TRANSPARENT; rect.area()]);
	}

	/// Blends a solid color over the whole canvas.
	pub fn fill(&mut self, color: Color, blend_mode: BlendMode) {
		self.draw_rect(self.bounds(), color, blend_mode);
	}

	/// Blends a solid rectangle into the pending layer.
	pub fn draw_rect(&mut self, rect: RectI, color: Color, blend_mode: BlendMode) {
		let rect = rect.intersect(&self.bounds());
		if rect.is_empty() {
			return;
		}
		let pixels: Vec<_> = self.read_latest_region(rect).into_iter().map(|backdrop| blend_mode.blend(color, backdrop, 1.)).collect();
		self.write_region_unchecked(rect, &pixels);
	}

	/// Blends a solid ellipse into the pending layer. A pixel is covered when its center lies inside the ellipse.
	pub fn draw_ellipse(&mut self, center: DVec2, radii: DVec2, color: Color, blend_mode: BlendMode) {
		if radii.x <= 0. || radii.y <= 0. {
			return;
		}
		let start = (center - radii).floor().as_ivec2();
		let end = (center + radii).ceil().as_ivec2();
		let rect = RectI::new(start, end).intersect(&self.bounds());
		if rect.is_empty() {
			return;
		}

		let mut pixels = self.read_latest_region(rect);
		for y in rect.start.y..rect.end.y {
			for x in rect.start.x..rect.end.x {
				let offset = (DVec2::new(x as f64, y as f64) + 0.5 - center) / radii;
				if offset.length_squared() <= 1. {
					let index = ((y - rect.start.y) * rect.width() + x - rect.start.x) as usize;
					pixels[index] = blend_mode.blend(color, pixels[index], 1.);
				}
			}
		}
		self.write_region_unchecked(rect, &pixels);
	}

	/// Blends the latest contents of `top` over this surface's latest contents, into the pending layer.
	pub fn blend_from(&mut self, top: &Surface, opacity: f32, blend_mode: BlendMode) {
		if opacity <= 0. {
			return;
		}
		let bounds = self.bounds().intersect(&top.bounds());
		for coord in top.latest_coords() {
			let tile_rect = RectI::from_tile(coord);
			let overlap = tile_rect.intersect(&bounds);
			let Some(source) = top.latest_tile(coord) else { continue };
			if overlap.is_empty() || source.is_transparent() {
				continue;
			}

			let destination = self.pending_tile_mut(coord).pixels_mut();
			for y in overlap.start.y..overlap.end.y {
				for x in overlap.start.x..overlap.end.x {
					let index = ((y - tile_rect.start.y) * TILE_SIZE as i32 + x - tile_rect.start.x) as usize;
					destination[index] = blend_mode.blend(source.pixels()[index], destination[index], opacity);
				}
			}
		}
	}

	/// Applies `map` to every stored pixel, writing the result into the pending layer.
	/// Areas that hold no tile are left untouched, so `map` must keep transparent pixels transparent.
	pub fn map_pixels(&mut self, map: impl Fn(Color) -> Color) {
		for coord in self.latest_coords() {
			for pixel in self.pending_tile_mut(coord).pixels_mut() {
				*pixel = map(*pixel);
			}
		}
	}

	/// Replaces the pending layer with the committed contents moved by `offset` pixels.
	pub fn shift(&mut self, offset: IVec2) {
		self.cancel();
		if offset == IVec2::ZERO {
			return;
		}

		let mut targets = FxHashSet::default();
		for coord in self.committed.keys() {
			targets.insert(*coord);
			targets.extend(RectI::from_tile(*coord).translate(offset).tiles());
		}
		for target in sorted(targets) {
			let rect = RectI::from_tile(target);
			let pixels = self.read_region(rect.translate(-offset), Resolution::Full);
			self.write_region_unchecked(rect, &pixels);
		}
	}

	fn hash_tiles<H: Hasher>(tiles: &FxHashMap<TileCoord, Tile>, state: &mut H) {
		// Map iteration order is unspecified, so combine per-tile hashes in an order independent way
		let combined = tiles.iter().fold(0_u64, |accumulator, (coord, tile)| {
			let mut hasher = FxHasher::default();
			coord.hash(&mut hasher);
			tile.id().hash(&mut hasher);
			accumulator.wrapping_add(hasher.finish())
		});
		tiles.len().hash(state);
		combined.hash(state);
	}
}

/// Hashes tile identities rather than pixels. Equal hashes imply equal contents, but identical pixels
/// written twice hash differently.
impl Hash for Surface {
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.size.hash(state);
		Self::hash_tiles(&self.committed, state);
		Self::hash_tiles(&self.pending, state);
	}
}

/// Compares the latest pixel contents.
impl PartialEq for Surface {
	fn eq(&self, other: &Self) -> bool {
		if self.size != other.size {
			return false;
		}
		let coords: FxHashSet<_> = self.latest_coords().into_iter().chain(other.latest_coords()).collect();
		coords.into_iter().all(|coord| match (self.latest_tile(coord), other.latest_tile(coord)) {
			(Some(a), Some(b)) => a == b,
			(Some(tile), None) | (None, Some(tile)) => tile.is_transparent(),
			(None, None) => true,
		})
	}
}

#[derive(Serialize, Deserialize)]
struct SerializedSurface {
	size: UVec2,
	tiles: Vec<(TileCoord, Vec<Color>)>,
}

impl Serialize for Surface {
	fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		let tiles = self
			.committed_coords()
			.into_iter()
			.filter_map(|coord| self.committed.get(&coord).map(|tile| (coord, tile.pixels().to_vec())))
			.collect();
		SerializedSurface { size: self.size, tiles }.serialize(serializer)
	}
}

impl<'de> Deserialize<'de> for Surface {
	fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		let serialized = SerializedSurface::deserialize(deserializer)?;
		let mut surface = Surface::new(serialized.size);
		for (coord, pixels) in serialized.tiles {
			if pixels.len() != TILE_PIXELS {
				return Err(serde::de::Error::custom(SurfaceError::BufferSizeMismatch {
					expected: TILE_PIXELS,
					actual: pixels.len(),
				}));
			}
			surface.write_region_unchecked(RectI::from_tile(coord), &pixels);
		}
		surface.commit();
		Ok(surface)
	}
}

fn sorted(coords: impl IntoIterator<Item = TileCoord>) -> Vec<TileCoord> {
	let mut coords: Vec<_> = coords.into_iter().collect();
	coords.sort_unstable_by_key(|coord| (coord.y, coord.x));
	coords
}

/// Copies `rect` out of the tiles returned by `fetch`, leaving anything outside `bounds` transparent.
fn copy_region(rect: RectI, bounds: RectI, mut fetch: impl FnMut(TileCoord) -> Option<Tile>) -> Vec<Color> {
	let mut pixels = vec![Color::TRANSPARENT; rect.area()];
	let clipped = rect.intersect(&bounds);
	for coord in clipped.tiles() {
		let Some(tile) = fetch(coord) else { continue };
		let tile_rect = RectI::from_tile(coord);
		let overlap = tile_rect.intersect(&clipped);
		let width = overlap.width() as usize;
		for y in overlap.start.y..overlap.end.y {
			let source_start = ((y - tile_rect.start.y) * TILE_SIZE as i32 + overlap.start.x - tile_rect.start.x) as usize;
			let destination_start = ((y - rect.start.y) * rect.width() + overlap.start.x - rect.start.x) as usize;
			pixels[destination_start..destination_start + width].copy_from_slice(&tile.pixels()[source_start..source_start + width]);
		}
	}
	pixels
}

#[cfg(test)]
mod test {
	use super::*;
	use pretty_assertions::assert_eq;

	fn gradient(rect: RectI) -> Vec<Color> {
		(0..rect.area()).map(|index| Color::from_rgbaf32_unchecked((index % 97) as f32 / 97., (index % 13) as f32 / 13., 0.5, 1.)).collect()
	}

	#[test]
	fn committed_region_reads_back_exactly() {
		let mut surface = Surface::new(UVec2::new(200, 150));
		let rect = RectI::new(IVec2::new(30, 20), IVec2::new(170, 140));
		let pixels = gradient(rect);
		surface.write_region(rect, &pixels).unwrap();
		surface.commit();
		assert_eq!(surface.read_region(rect, Resolution::Full), pixels);
	}

	#[test]
	fn pending_writes_are_invisible_to_committed_reads() {
		let mut surface = Surface::new(UVec2::new(64, 64));
		let rect = RectI::from_size(UVec2::new(4, 4));
		surface.write_region(rect, &[Color::RED; 16]).unwrap();

		assert_eq!(surface.read_region(rect, Resolution::Full), vec![Color::TRANSPARENT; 16]);
		assert_eq!(surface.read_latest_region(rect), vec![Color::RED; 16]);

		surface.cancel();
		assert_eq!(surface.read_latest_region(rect), vec![Color::TRANSPARENT; 16]);
	}

	#[test]
	fn empty_and_inverted_rects_are_no_ops() {
		let mut surface = Surface::new(UVec2::new(64, 64));
		surface.write_region(RectI::new(IVec2::new(10, 10), IVec2::new(5, 20)), &[]).unwrap();
		surface.write_region(RectI::new(IVec2::new(10, 10), IVec2::new(10, 20)), &[Color::RED]).unwrap();
		assert!(!surface.has_pending());
		assert!(surface.read_region(RectI::new(IVec2::new(3, 3), IVec2::new(1, 1)), Resolution::Full).is_empty());
	}

	#[test]
	fn mismatched_buffer_is_rejected() {
		let mut surface = Surface::new(UVec2::new(64, 64));
		let result = surface.write_region(RectI::from_size(UVec2::new(2, 2)), &[Color::RED; 3]);
		assert_eq!(result, Err(SurfaceError::BufferSizeMismatch { expected: 4, actual: 3 }));
	}

	#[test]
	fn out_of_bounds_reads_are_transparent() {
		let mut surface = Surface::new(UVec2::new(10, 10));
		surface.fill(Color::RED, BlendMode::Normal);
		surface.commit();

		let pixels = surface.read_region(RectI::new(IVec2::new(8, 8), IVec2::new(12, 12)), Resolution::Full);
		assert_eq!(pixels[0], Color::RED);
		assert_eq!(pixels[3], Color::TRANSPARENT);
		assert_eq!(pixels[15], Color::TRANSPARENT);
		assert_eq!(surface.pixel(IVec2::new(-1, 0)), Color::TRANSPARENT);
	}

	#[test]
	fn transparent_tiles_are_elided_on_commit() {
		let mut surface = Surface::new(UVec2::new(128, 128));
		surface.fill(Color::RED, BlendMode::Normal);
		surface.commit();
		assert_eq!(surface.committed_coords().len(), 4);

		surface.clear_region(RectI::from_size(UVec2::new(64, 64)));
		let touched = surface.commit();
		assert_eq!(touched, vec![TileCoord::new(0, 0)]);
		assert_eq!(surface.committed_coords().len(), 3);
	}

	#[test]
	fn lower_resolutions_are_downsampled_and_invalidated() {
		let mut surface = Surface::new(UVec2::new(128, 128));
		surface.draw_rect(RectI::from_size(UVec2::new(64, 128)), Color::WHITE, BlendMode::Normal);
		surface.commit();

		let half = surface.read_region(RectI::from_size(UVec2::new(64, 64)), Resolution::Half);
		assert_eq!(half[0], Color::WHITE);
		assert_eq!(half[63], Color::TRANSPARENT);
		assert_eq!(surface.derived_tile_count(), 1);

		surface.draw_rect(RectI::new(IVec2::new(64, 0), IVec2::new(128, 64)), Color::BLACK, BlendMode::Normal);
		surface.commit();
		assert_eq!(surface.derived_tile_count(), 0);

		let half = surface.read_region(RectI::from_size(UVec2::new(64, 64)), Resolution::Half);
		assert_eq!(half[63], Color::BLACK);
		assert_eq!(half[64 * 63 + 63], Color::TRANSPARENT);
	}

	#[test]
	fn snapshots_share_tiles_and_restore_exactly() {
		let mut surface = Surface::new(UVec2::new(128, 64));
		surface.fill(Color::BLUE, BlendMode::Normal);
		surface.commit();
		let before = surface.clone();

		let snapshot = surface.snapshot([TileCoord::new(0, 0), TileCoord::new(5, 5)]);
		assert_eq!(snapshot.len(), 2);
		assert_eq!(snapshot.stored_tiles(), 1);
		assert!(surface.committed_tile(TileCoord::new(0, 0)).is_some_and(Tile::is_shared));

		surface.draw_rect(RectI::from_size(UVec2::new(10, 10)), Color::RED, BlendMode::Normal);
		surface.commit();
		assert_ne!(surface, before);
		assert_eq!(snapshot.stored_tiles(), 1);

		surface.restore(&snapshot);
		assert_eq!(surface, before);
	}

	#[test]
	fn hash_tracks_tile_identity() {
		let hash = |surface: &Surface| {
			let mut hasher = FxHasher::default();
			surface.hash(&mut hasher);
			hasher.finish()
		};
		let mut surface = Surface::new(UVec2::new(64, 64));
		surface.fill(Color::RED, BlendMode::Normal);
		surface.commit();
		let initial = hash(&surface);
		assert_eq!(initial, hash(&surface.clone()));

		let snapshot = surface.snapshot_all();
		surface.draw_rect(RectI::from_size(UVec2::ONE), Color::BLUE, BlendMode::Normal);
		assert_ne!(initial, hash(&surface));

		surface.restore(&snapshot);
		assert_eq!(initial, hash(&surface));
	}

	#[test]
	fn shift_moves_committed_pixels() {
		let mut surface = Surface::new(UVec2::new(128, 128));
		surface.draw_rect(RectI::from_size(UVec2::new(2, 2)), Color::RED, BlendMode::Normal);
		surface.commit();

		surface.shift(IVec2::new(70, 1));
		assert_eq!(surface.pixel(IVec2::new(0, 0)), Color::TRANSPARENT);
		assert_eq!(surface.pixel(IVec2::new(70, 1)), Color::RED);
		assert_eq!(surface.pixel(IVec2::new(71, 2)), Color::RED);

		surface.shift(IVec2::new(1, 0));
		assert_eq!(surface.pixel(IVec2::new(70, 1)), Color::TRANSPARENT);
		assert_eq!(surface.pixel(IVec2::new(1, 0)), Color::RED);
	}

	#[test]
	fn resize_clears_pixels_past_the_edge() {
		let mut surface = Surface::new(UVec2::new(128, 128));
		surface.fill(Color::GREEN, BlendMode::Normal);
		surface.commit();

		surface.resize(UVec2::new(32, 32)).unwrap();
		assert_eq!(surface.committed_coords(), vec![TileCoord::new(0, 0)]);

		surface.resize(UVec2::new(128, 128)).unwrap();
		assert_eq!(surface.pixel(IVec2::new(31, 31)), Color::GREEN);
		assert_eq!(surface.pixel(IVec2::new(32, 31)), Color::TRANSPARENT);
		assert_eq!(surface.resize(UVec2::new(0, 5)), Err(SurfaceError::InvalidSize(UVec2::new(0, 5))));
	}

	#[test]
	fn blending_composites_latest_contents() {
		let mut bottom = Surface::new(UVec2::new(64, 64));
		bottom.fill(Color::BLUE, BlendMode::Normal);
		let mut top = Surface::new(UVec2::new(64, 64));
		top.draw_ellipse(DVec2::splat(32.), DVec2::splat(8.), Color::RED, BlendMode::Normal);

		bottom.blend_from(&top, 1., BlendMode::Normal);
		assert_eq!(bottom.pixel(IVec2::new(32, 32)), Color::RED);
		assert_eq!(bottom.pixel(IVec2::new(0, 0)), Color::BLUE);
	}

	#[test]
	fn serialization_keeps_committed_tiles() {
		let mut surface = Surface::new(UVec2::new(100, 70));
		surface.draw_rect(RectI::new(IVec2::new(50, 40), IVec2::new(90, 60)), Color::RED, BlendMode::Normal);
		surface.commit();
		surface.draw_rect(RectI::from_size(UVec2::ONE), Color::BLUE, BlendMode::Normal);

		let json = serde_json::to_string(&surface).unwrap();
		let restored: Surface = serde_json::from_str(&json).unwrap();
		surface.cancel();
		assert_eq!(restored, surface);
	}
}
