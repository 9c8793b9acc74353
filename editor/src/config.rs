use crate::consts::{CHECK_POOL_LEAKS, DEFAULT_DOCUMENT_SIZE, MAX_UNDO_HISTORY_LEN, MERGE_NUDGES};
use crate::error::PersistenceError;
use glam::UVec2;
use serde::{Deserialize, Serialize};

/// Per-document settings. Missing fields fall back to their defaults when deserializing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentConfig {
	/// Oldest undo entries are dropped once the history grows past this.
	pub max_undo_history_len: usize,
	pub default_document_size: UVec2,
	/// Whether consecutive mergeable changes, like nudges, collapse into one undo entry.
	pub merge_nudges: bool,
	/// Log an error whenever an evaluation ends with scratch surfaces still leased.
	pub check_pool_leaks: bool,
}

impl Default for DocumentConfig {
	fn default() -> Self {
		Self {
			max_undo_history_len: MAX_UNDO_HISTORY_LEN,
			default_document_size: UVec2::splat(DEFAULT_DOCUMENT_SIZE),
			merge_nudges: MERGE_NUDGES,
			check_pool_leaks: CHECK_POOL_LEAKS,
		}
	}
}

impl DocumentConfig {
	pub fn from_ron(source: &str) -> Result<Self, PersistenceError> {
		Ok(ron::from_str(source)?)
	}

	pub fn from_json(source: &str) -> Result<Self, PersistenceError> {
		Ok(serde_json::from_str(source)?)
	}
}
