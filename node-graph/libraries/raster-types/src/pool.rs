use crate::Surface;
use glam::UVec2;

/// Recycles surface allocations between graph evaluations.
///
/// Scratch surfaces taken with [`SurfacePool::request`] are leased and must be handed back with
/// [`SurfacePool::release`] before the evaluation ends. [`SurfacePool::take`] hands out a surface
/// meant to become a node result, which is not leased and comes back through [`SurfacePool::recycle`]
/// once that result is superseded.
#[derive(Debug)]
pub struct SurfacePool {
	free: Vec<Surface>,
	capacity: usize,
	outstanding: usize,
	reused: usize,
	allocated: usize,
}

impl Default for SurfacePool {
	fn default() -> Self {
		Self::with_capacity(Self::DEFAULT_CAPACITY)
	}
}

impl SurfacePool {
	pub const DEFAULT_CAPACITY: usize = 32;

	pub fn with_capacity(capacity: usize) -> Self {
		Self {
			free: Vec::new(),
			capacity,
			outstanding: 0,
			reused: 0,
			allocated: 0,
		}
	}

	/// Leases an empty scratch surface of the given size.
	pub fn request(&mut self, size: UVec2) -> Surface {
		self.outstanding += 1;
		self.take(size)
	}

	/// Returns a leased scratch surface.
	pub fn release(&mut self, surface: Surface) {
		if self.outstanding == 0 {
			log::warn!("A surface was released to the pool without being requested from it");
		}
		self.outstanding = self.outstanding.saturating_sub(1);
		self.recycle(surface);
	}

	/// Hands out an empty surface of the given size without leasing it.
	pub fn take(&mut self, size: UVec2) -> Surface {
		match self.free.pop() {
			Some(mut surface) => {
				self.reused += 1;
				surface.reset(size);
				surface
			}
			None => {
				self.allocated += 1;
				Surface::new(size)
			}
		}
	}

	/// Gives a surface that is no longer needed back to the pool. Its tiles are dropped, its allocations kept.
	pub fn recycle(&mut self, mut surface: Surface) {
		if self.free.len() < self.capacity {
			surface.reset(UVec2::ZERO);
			self.free.push(surface);
		}
	}

	/// Number of scratch surfaces currently leased.
	pub fn outstanding(&self) -> usize {
		self.outstanding
	}

	pub fn available(&self) -> usize {
		self.free.len()
	}

	/// How many surfaces were served from recycled allocations rather than newly allocated.
	pub fn reused(&self) -> usize {
		self.reused
	}

	pub fn allocated(&self) -> usize {
		self.allocated
	}

	/// Closes an evaluation, returning how many leases were never released. Leaked leases are forgotten afterwards.
	pub fn end_evaluation(&mut self) -> usize {
		let leaked = std::mem::take(&mut self.outstanding);
		if leaked > 0 {
			log::warn!("{leaked} pooled surfaces were not released by the end of the evaluation");
		}
		leaked
	}
}
