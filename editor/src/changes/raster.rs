//! Changes that paint into layer images.
//!
//! Drawing goes into the image's pending layer so a preview can be discarded or redrawn freely. Finishing the change
//! commits it and keeps snapshots of only the tiles that were touched, before and after, which is all undo and redo need.

use super::{Change, ChangeOutcome, UpdateableChange, same_kind};
use crate::document::DocumentState;
use crate::error::ChangeError;
use crate::response::DocumentResponse;
use core_types::NodeId;
use glam::{DVec2, IVec2, UVec2};
use raster_types::{BlendMode, Color, RectI, Surface, TileCoord, TileSnapshot};

/// The touched tiles of one layer image, as they were before and after a change was committed.
#[derive(Debug, Default)]
struct TileDiff {
	before: Option<TileSnapshot>,
	after: Option<TileSnapshot>,
}

impl TileDiff {
	/// Commits the pending writes of `image`, returning the touched tiles.
	fn commit(&mut self, image: &mut Surface) -> Vec<TileCoord> {
		let touched = image.pending_coords();
		self.before = Some(image.snapshot(touched.iter().copied()));
		image.commit();
		self.after = Some(image.snapshot(touched.iter().copied()));
		touched
	}

	fn redo(&self, image: &mut Surface) -> Result<Vec<TileCoord>, ChangeError> {
		let after = self.after.as_ref().ok_or(ChangeError::NotApplied)?;
		image.restore(after);
		Ok(after.coords().collect())
	}

	/// Puts the captured tiles back, or throws away an uncommitted preview.
	fn revert(&self, image: &mut Surface) -> Vec<TileCoord> {
		match &self.before {
			Some(before) => {
				image.restore(before);
				before.coords().collect()
			}
			None => {
				let previewed = image.pending_coords();
				image.cancel();
				previewed
			}
		}
	}
}

fn image_changed(member: NodeId, tiles: Vec<TileCoord>) -> Vec<DocumentResponse> {
	vec![DocumentResponse::LayerImageChanged { member, tiles }]
}

/// Finishes a raster change: commits the pending preview on the first application and replays the result on redo.
fn commit_or_redo(diff: &mut TileDiff, image: &mut Surface, member: NodeId, first_apply: bool) -> Result<ChangeOutcome, ChangeError> {
	if !first_apply {
		return Ok(image_changed(member, diff.redo(image)?).into());
	}
	let touched = diff.commit(image);
	if touched.is_empty() {
		return Ok(ChangeOutcome::ignored());
	}
	Ok(image_changed(member, touched).into())
}

/// Draws a solid rectangle. Every update redraws from the layer's committed state.
#[derive(Debug)]
pub struct DrawRectangle {
	layer: NodeId,
	rect: RectI,
	color: Color,
	blend_mode: BlendMode,
	diff: TileDiff,
}

impl DrawRectangle {
	pub fn new(layer: NodeId, rect: RectI, color: Color, blend_mode: BlendMode) -> Self {
		Self {
			layer,
			rect,
			color,
			blend_mode,
			diff: TileDiff::default(),
		}
	}

	pub fn update(&mut self, _layer: NodeId, rect: RectI, color: Color, blend_mode: BlendMode) {
		self.rect = rect;
		self.color = color;
		self.blend_mode = blend_mode;
	}

	/// Replaces any previous preview with the rectangle's current parameters, returning every tile either touched.
	fn redraw(&self, image: &mut Surface) -> Vec<TileCoord> {
		let mut tiles = image.pending_coords();
		image.cancel();
		image.draw_rect(self.rect, self.color, self.blend_mode);
		tiles.extend(image.pending_coords());
		tiles.sort_unstable_by_key(|coord| (coord.y, coord.x));
		tiles.dedup();
		tiles
	}
}

impl Change for DrawRectangle {
	fn initialize(&mut self, target: &DocumentState) -> Result<(), ChangeError> {
		target.check_layer(self.layer)
	}

	fn apply(&mut self, target: &mut DocumentState, first_apply: bool) -> Result<ChangeOutcome, ChangeError> {
		let image = target.layer_image_mut(self.layer)?;
		if first_apply {
			self.redraw(image);
		}
		commit_or_redo(&mut self.diff, image, self.layer, first_apply)
	}

	fn revert(&mut self, target: &mut DocumentState) -> Result<Vec<DocumentResponse>, ChangeError> {
		let image = target.layer_image_mut(self.layer)?;
		Ok(image_changed(self.layer, self.diff.revert(image)))
	}
}

impl UpdateableChange for DrawRectangle {
	fn apply_temporarily(&mut self, target: &mut DocumentState) -> Result<Vec<DocumentResponse>, ChangeError> {
		let image = target.layer_image_mut(self.layer)?;
		Ok(image_changed(self.layer, self.redraw(image)))
	}
}

/// A freehand stroke of round stamps. Updates append points and only the new segments are drawn.
#[derive(Debug)]
pub struct PenStroke {
	layer: NodeId,
	points: Vec<IVec2>,
	color: Color,
	width: u32,
	drawn: usize,
	diff: TileDiff,
}

impl PenStroke {
	pub fn new(layer: NodeId, points: Vec<IVec2>, color: Color, width: u32) -> Self {
		Self {
			layer,
			points,
			color,
			width: width.max(1),
			drawn: 0,
			diff: TileDiff::default(),
		}
	}

	/// Appends points to the stroke. Its layer, color and width are fixed when the stroke starts.
	pub fn update(&mut self, layer: NodeId, points: Vec<IVec2>, color: Color, width: u32) {
		if layer != self.layer {
			log::warn!("Ignoring points for layer {layer} sent to the stroke on layer {}", self.layer);
			return;
		}
		if color != self.color || width.max(1) != self.width {
			log::warn!("A pen stroke keeps the color and width it started with");
		}
		self.points.extend(points);
	}

	/// Draws the segments added since the last call into the pending layer, returning the tiles they touched.
	fn draw_new_segments(&mut self, image: &mut Surface) -> Vec<TileCoord> {
		let before: Vec<_> = image.pending_coords();
		let radius = DVec2::splat(self.width as f64 / 2.);
		for index in self.drawn..self.points.len() {
			let end = self.points[index].as_dvec2();
			let start = index.checked_sub(1).map_or(end, |previous| self.points[previous].as_dvec2());
			let steps = start.distance(end).ceil().max(1.) as usize;
			for step in 0..=steps {
				let center = start.lerp(end, step as f64 / steps as f64) + 0.5;
				image.draw_ellipse(center, radius, self.color, BlendMode::Normal);
			}
		}
		self.drawn = self.points.len();
		image.pending_coords().into_iter().filter(|coord| !before.contains(coord)).collect()
	}
}

impl Change for PenStroke {
	fn initialize(&mut self, target: &DocumentState) -> Result<(), ChangeError> {
		target.check_layer(self.layer)
	}

	fn apply(&mut self, target: &mut DocumentState, first_apply: bool) -> Result<ChangeOutcome, ChangeError> {
		let image = target.layer_image_mut(self.layer)?;
		if first_apply {
			self.draw_new_segments(image);
		}
		commit_or_redo(&mut self.diff, image, self.layer, first_apply)
	}

	fn revert(&mut self, target: &mut DocumentState) -> Result<Vec<DocumentResponse>, ChangeError> {
		let image = target.layer_image_mut(self.layer)?;
		Ok(image_changed(self.layer, self.diff.revert(image)))
	}
}

impl UpdateableChange for PenStroke {
	fn apply_temporarily(&mut self, target: &mut DocumentState) -> Result<Vec<DocumentResponse>, ChangeError> {
		let image = target.layer_image_mut(self.layer)?;
		let mut tiles = self.draw_new_segments(image);
		if tiles.is_empty() {
			tiles = image.pending_coords();
		}
		Ok(image_changed(self.layer, tiles))
	}
}

/// Moves a layer's pixels. The offset is always relative to the committed state, so updates replace it.
/// Consecutive shifts of the same layer merge into one undo entry.
#[derive(Debug)]
pub struct ShiftLayer {
	layer: NodeId,
	offset: IVec2,
	diff: TileDiff,
}

impl ShiftLayer {
	pub fn new(layer: NodeId, offset: IVec2) -> Self {
		Self {
			layer,
			offset,
			diff: TileDiff::default(),
		}
	}

	pub fn update(&mut self, _layer: NodeId, offset: IVec2) {
		self.offset = offset;
	}
}

impl Change for ShiftLayer {
	fn initialize(&mut self, target: &DocumentState) -> Result<(), ChangeError> {
		target.check_layer(self.layer)
	}

	fn apply(&mut self, target: &mut DocumentState, first_apply: bool) -> Result<ChangeOutcome, ChangeError> {
		let image = target.layer_image_mut(self.layer)?;
		if first_apply {
			if self.offset == IVec2::ZERO {
				image.cancel();
				return Ok(ChangeOutcome::ignored());
			}
			image.shift(self.offset);
		}
		commit_or_redo(&mut self.diff, image, self.layer, first_apply)
	}

	fn revert(&mut self, target: &mut DocumentState) -> Result<Vec<DocumentResponse>, ChangeError> {
		let image = target.layer_image_mut(self.layer)?;
		Ok(image_changed(self.layer, self.diff.revert(image)))
	}

	fn is_mergeable_with(&self, other: &dyn Change) -> bool {
		same_kind(self, other).is_some_and(|other| other.layer == self.layer)
	}
}

impl UpdateableChange for ShiftLayer {
	fn apply_temporarily(&mut self, target: &mut DocumentState) -> Result<Vec<DocumentResponse>, ChangeError> {
		let image = target.layer_image_mut(self.layer)?;
		let mut tiles = image.pending_coords();
		image.shift(self.offset);
		tiles.extend(image.pending_coords());
		tiles.sort_unstable_by_key(|coord| (coord.y, coord.x));
		tiles.dedup();
		Ok(image_changed(self.layer, tiles))
	}
}

/// Erases every pixel of a layer.
#[derive(Debug)]
pub struct ClearLayer {
	layer: NodeId,
	diff: TileDiff,
}

impl ClearLayer {
	pub fn new(layer: NodeId) -> Self {
		Self { layer, diff: TileDiff::default() }
	}
}

impl Change for ClearLayer {
	fn initialize(&mut self, target: &DocumentState) -> Result<(), ChangeError> {
		target.check_layer(self.layer)
	}

	fn apply(&mut self, target: &mut DocumentState, first_apply: bool) -> Result<ChangeOutcome, ChangeError> {
		let image = target.layer_image_mut(self.layer)?;
		if first_apply {
			for coord in image.latest_coords() {
				image.clear_region(RectI::from_tile(coord));
			}
		}
		commit_or_redo(&mut self.diff, image, self.layer, first_apply)
	}

	fn revert(&mut self, target: &mut DocumentState) -> Result<Vec<DocumentResponse>, ChangeError> {
		let image = target.layer_image_mut(self.layer)?;
		Ok(image_changed(self.layer, self.diff.revert(image)))
	}
}

/// Changes the document size, resizing every layer image with it.
#[derive(Debug)]
pub struct ResizeCanvas {
	size: UVec2,
	previous: UVec2,
	layers: Vec<(NodeId, TileSnapshot)>,
}

impl ResizeCanvas {
	pub fn new(size: UVec2) -> Self {
		Self {
			size,
			previous: UVec2::ZERO,
			layers: Vec::new(),
		}
	}
}

impl Change for ResizeCanvas {
	fn initialize(&mut self, target: &DocumentState) -> Result<(), ChangeError> {
		if self.size.x == 0 || self.size.y == 0 {
			return Err(ChangeError::InvalidParameter(format!("canvas size {} has no area", self.size)));
		}
		self.previous = target.size;
		Ok(())
	}

	fn apply(&mut self, target: &mut DocumentState, first_apply: bool) -> Result<ChangeOutcome, ChangeError> {
		if first_apply && self.size == self.previous {
			return Ok(ChangeOutcome::ignored());
		}

		self.layers.clear();
		for layer in target.layers() {
			let image = target.layer_image_mut(layer)?;
			self.layers.push((layer, image.snapshot_all()));
			image.resize(self.size)?;
		}
		target.size = self.size;
		Ok(vec![DocumentResponse::CanvasResized(self.size)].into())
	}

	fn revert(&mut self, target: &mut DocumentState) -> Result<Vec<DocumentResponse>, ChangeError> {
		for (layer, snapshot) in self.layers.drain(..) {
			let image = target.layer_image_mut(layer)?;
			image.resize(self.previous)?;
			image.restore(&snapshot);
		}
		target.size = self.previous;
		Ok(vec![DocumentResponse::CanvasResized(self.previous)])
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::test_utils::{assert_reverts, init_logger, layer_image, shape_over_layer};
	use pretty_assertions::assert_eq;

	fn rect(x: i32, y: i32, width: i32, height: i32) -> RectI {
		RectI::from_position_size(IVec2::new(x, y), IVec2::new(width, height))
	}

	#[test]
	fn rectangle_preview_redraws_from_base() {
		init_logger();
		let (mut state, ids) = shape_over_layer();
		let mut change = DrawRectangle::new(ids.layer, rect(0, 0, 10, 10), Color::RED, BlendMode::Normal);
		change.initialize(&state).unwrap();
		change.apply_temporarily(&mut state).unwrap();

		change.update(ids.layer, rect(90, 90, 10, 10), Color::BLUE, BlendMode::Normal);
		change.apply_temporarily(&mut state).unwrap();
		let image = layer_image(&state, ids.layer);
		assert_eq!(image.pixel(IVec2::new(5, 5)), Color::TRANSPARENT);
		assert_eq!(image.pixel(IVec2::new(95, 95)), Color::BLUE);
		assert!(image.committed_coords().is_empty());

		change.revert(&mut state).unwrap();
		assert!(layer_image(&state, ids.layer).is_empty());
	}

	#[test]
	fn rectangle_snapshots_only_touched_tiles() {
		let (mut state, ids) = shape_over_layer();
		let mut change = DrawRectangle::new(ids.layer, rect(70, 2, 4, 4), Color::RED, BlendMode::Normal);
		change.initialize(&state).unwrap();
		let outcome = change.apply(&mut state, true).unwrap();
		assert_eq!(
			outcome.responses,
			vec![DocumentResponse::LayerImageChanged {
				member: ids.layer,
				tiles: vec![TileCoord::new(1, 0)]
			}]
		);
		assert_eq!(change.diff.after.as_ref().map(TileSnapshot::len), Some(1));

		assert_reverts(&mut state, DrawRectangle::new(ids.layer, rect(10, 10, 100, 50), Color::GREEN, BlendMode::Multiply));
	}

	#[test]
	fn rectangle_outside_canvas_is_not_recorded() {
		let (mut state, ids) = shape_over_layer();
		let mut change = DrawRectangle::new(ids.layer, rect(500, 500, 10, 10), Color::RED, BlendMode::Normal);
		change.initialize(&state).unwrap();
		assert!(change.apply(&mut state, true).unwrap().ignore_in_undo);
	}

	#[test]
	fn drawing_requires_a_layer() {
		let (state, ids) = shape_over_layer();
		let mut change = DrawRectangle::new(ids.shape, rect(0, 0, 1, 1), Color::RED, BlendMode::Normal);
		assert_eq!(change.initialize(&state), Err(ChangeError::MemberNotFound(ids.shape)));
	}

	#[test]
	fn pen_stroke_keeps_its_layer_color_and_width() {
		let (mut state, ids) = shape_over_layer();
		let mut stroke = PenStroke::new(ids.layer, vec![IVec2::new(10, 10)], Color::BLACK, 2);
		stroke.initialize(&state).unwrap();
		stroke.update(ids.shape, vec![IVec2::new(100, 100)], Color::BLACK, 2);
		stroke.update(ids.layer, vec![IVec2::new(30, 10)], Color::RED, 9);
		stroke.apply(&mut state, true).unwrap();

		let image = layer_image(&state, ids.layer);
		assert_eq!(image.pixel(IVec2::new(20, 10)), Color::BLACK);
		assert_eq!(image.pixel(IVec2::new(20, 14)), Color::TRANSPARENT);
		assert_eq!(image.pixel(IVec2::new(100, 100)), Color::TRANSPARENT);
	}

	#[test]
	fn pen_stroke_accumulates_points() {
		let (mut state, ids) = shape_over_layer();
		let mut stroke = PenStroke::new(ids.layer, vec![IVec2::new(10, 10)], Color::BLACK, 2);
		stroke.initialize(&state).unwrap();
		stroke.apply_temporarily(&mut state).unwrap();
		stroke.update(ids.layer, vec![IVec2::new(100, 10)], Color::BLACK, 2);
		let responses = stroke.apply_temporarily(&mut state).unwrap();
		assert_eq!(
			responses,
			vec![DocumentResponse::LayerImageChanged {
				member: ids.layer,
				tiles: vec![TileCoord::new(1, 0)]
			}]
		);

		stroke.apply(&mut state, true).unwrap();
		let image = layer_image(&state, ids.layer);
		assert_eq!(image.pixel(IVec2::new(55, 10)), Color::BLACK);
		assert_eq!(image.pixel(IVec2::new(55, 20)), Color::TRANSPARENT);
		assert!(!image.has_pending());

		stroke.revert(&mut state).unwrap();
		assert!(layer_image(&state, ids.layer).is_empty());
	}

	#[test]
	fn shift_moves_committed_pixels() {
		let (mut state, ids) = shape_over_layer();
		let mut draw = DrawRectangle::new(ids.layer, rect(0, 0, 8, 8), Color::RED, BlendMode::Normal);
		draw.initialize(&state).unwrap();
		draw.apply(&mut state, true).unwrap();

		let mut shift = ShiftLayer::new(ids.layer, IVec2::new(1, 1));
		shift.initialize(&state).unwrap();
		shift.apply_temporarily(&mut state).unwrap();
		shift.update(ids.layer, IVec2::new(64, 0));
		shift.apply(&mut state, true).unwrap();
		let image = layer_image(&state, ids.layer);
		assert_eq!(image.pixel(IVec2::new(3, 3)), Color::TRANSPARENT);
		assert_eq!(image.pixel(IVec2::new(67, 3)), Color::RED);
		assert_eq!(image.committed_coords(), vec![TileCoord::new(1, 0)]);

		shift.revert(&mut state).unwrap();
		assert_eq!(layer_image(&state, ids.layer).pixel(IVec2::new(3, 3)), Color::RED);

		assert_reverts(&mut state, ShiftLayer::new(ids.layer, IVec2::new(-5, 17)));
	}

	#[test]
	fn shifts_of_one_layer_merge() {
		let shift = ShiftLayer::new(NodeId(1), IVec2::X);
		assert!(shift.is_mergeable_with(&ShiftLayer::new(NodeId(1), IVec2::Y)));
		assert!(!shift.is_mergeable_with(&ShiftLayer::new(NodeId(2), IVec2::Y)));
		assert!(!shift.is_mergeable_with(&ClearLayer::new(NodeId(1))));
	}

	#[test]
	fn clear_and_resize_revert() {
		let (mut state, ids) = shape_over_layer();
		let mut draw = DrawRectangle::new(ids.layer, rect(20, 20, 100, 100), Color::GREEN, BlendMode::Normal);
		draw.initialize(&state).unwrap();
		draw.apply(&mut state, true).unwrap();

		assert_reverts(&mut state, ClearLayer::new(ids.layer));
		assert_reverts(&mut state, ResizeCanvas::new(UVec2::new(40, 200)));
		assert!(ResizeCanvas::new(UVec2::new(0, 10)).initialize(&state).is_err());
	}
}
