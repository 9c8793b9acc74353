use serde::{Deserialize, Serialize};
pub use uuid_generation::*;

mod uuid_generation {
	use rand_chacha::ChaCha20Rng;
	use rand_chacha::rand_core::{RngCore, SeedableRng};
	use std::sync::{Mutex, PoisonError};

	const DEFAULT_SEED: u64 = 42;

	static RNG: Mutex<Option<ChaCha20Rng>> = Mutex::new(None);

	/// Restarts id generation from `random_seed`, making subsequently generated ids reproducible.
	pub fn set_uuid_seed(random_seed: u64) {
		let mut lock = RNG.lock().unwrap_or_else(PoisonError::into_inner);
		*lock = Some(ChaCha20Rng::seed_from_u64(random_seed));
	}

	pub fn generate_uuid() -> u64 {
		let mut lock = RNG.lock().unwrap_or_else(PoisonError::into_inner);
		lock.get_or_insert_with(|| ChaCha20Rng::seed_from_u64(DEFAULT_SEED)).next_u64()
	}
}

/// Stable identity of a node in a network. Structure members share the id of the node backing them.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u64);

impl NodeId {
	pub fn new() -> Self {
		Self(generate_uuid())
	}
}

impl std::fmt::Display for NodeId {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.0)
	}
}
