use crate::actions::{EndChangeAction, StartOrUpdateChangeAction};
use crate::changes::{Change, UpdateableChange};
use crate::config::DocumentConfig;
use crate::document::DocumentState;
use crate::error::{DocumentError, TrackerError};
use crate::response::DocumentResponse;
use std::collections::VecDeque;

/// Changes recorded between two change boundaries, undone and redone together.
type Packet = Vec<Box<dyn Change>>;

/// Owns the undo and redo history of one document and the interactive change in progress, if any.
#[derive(Debug)]
pub struct ChangeTracker {
	undo_stack: VecDeque<Packet>,
	redo_stack: Vec<Packet>,
	active_change: Option<Box<dyn UpdateableChange>>,
	active_packet: Option<Packet>,
	max_len: usize,
	merge_enabled: bool,
}

impl ChangeTracker {
	pub fn new(config: &DocumentConfig) -> Self {
		Self {
			undo_stack: VecDeque::new(),
			redo_stack: Vec::new(),
			active_change: None,
			active_packet: None,
			max_len: config.max_undo_history_len,
			merge_enabled: config.merge_nudges,
		}
	}

	pub fn can_undo(&self) -> bool {
		!self.undo_stack.is_empty()
	}

	pub fn can_redo(&self) -> bool {
		!self.redo_stack.is_empty()
	}

	pub fn undo_len(&self) -> usize {
		self.undo_stack.len()
	}

	pub fn redo_len(&self) -> usize {
		self.redo_stack.len()
	}

	pub fn has_active_change(&self) -> bool {
		self.active_change.is_some()
	}

	/// Initializes and applies a change in one go, recording it in the open packet unless it had no effect.
	pub fn make_change(&mut self, target: &mut DocumentState, mut change: Box<dyn Change>) -> Result<Vec<DocumentResponse>, DocumentError> {
		if self.active_change.is_some() {
			return Err(TrackerError::ChangeInProgress.into());
		}

		change.initialize(target)?;
		let outcome = change.apply(target, true)?;
		log::debug!("Applied {change:?}");
		if !outcome.ignore_in_undo {
			self.record(change);
		}
		Ok(outcome.responses)
	}

	/// Starts an interactive change, or updates the active one with the parameters carried by `action`, and previews it.
	pub fn start_or_update(&mut self, target: &mut DocumentState, action: &dyn StartOrUpdateChangeAction) -> Result<Vec<DocumentResponse>, DocumentError> {
		if let Some(change) = &mut self.active_change {
			if !action.update_change(change.as_mut()) {
				return Err(TrackerError::MismatchedChange.into());
			}
			return Ok(change.apply_temporarily(target)?);
		}

		let mut change = action.create_change();
		change.initialize(target)?;
		let responses = change.apply_temporarily(target)?;
		self.active_change = Some(change);
		Ok(responses)
	}

	/// Finishes the active interactive change, either applying it for good or discarding its preview.
	pub fn end(&mut self, target: &mut DocumentState, action: &dyn EndChangeAction) -> Result<Vec<DocumentResponse>, DocumentError> {
		let Some(mut change) = self.active_change.take() else {
			return Err(TrackerError::NoActiveChange.into());
		};
		if !action.is_change_type_matching(change.as_ref()) {
			self.active_change = Some(change);
			return Err(TrackerError::MismatchedChange.into());
		}

		if action.cancels() {
			log::debug!("Cancelled {change:?}");
			return Ok(change.revert(target)?);
		}

		let outcome = match change.apply(target, true) {
			Ok(outcome) => outcome,
			Err(error) => {
				if let Err(revert_error) = change.revert(target) {
					log::error!("Failed to discard the preview of {change:?}: {revert_error}");
				}
				return Err(error.into());
			}
		};
		log::debug!("Applied {change:?}");
		if !outcome.ignore_in_undo {
			self.record(change);
		}
		Ok(outcome.responses)
	}

	fn record(&mut self, change: Box<dyn Change>) {
		self.redo_stack.clear();
		self.active_packet.get_or_insert_with(Vec::new).push(change);
	}

	/// Closes the open packet, merging it into the previous one when it is a single change that continues it.
	pub fn change_boundary(&mut self) {
		let Some(mut packet) = self.active_packet.take() else { return };
		if packet.is_empty() {
			return;
		}

		if self.merge_enabled && packet.len() == 1 {
			if let Some(top) = self.undo_stack.back_mut() {
				let homologous = top.windows(2).all(|pair| pair[0].is_mergeable_with(pair[1].as_ref()));
				let continues = top.last().is_some_and(|last| last.is_mergeable_with(packet[0].as_ref()));
				if homologous && continues {
					top.append(&mut packet);
					return;
				}
			}
		}

		self.undo_stack.push_back(packet);
		while self.undo_stack.len() > self.max_len {
			self.undo_stack.pop_front();
		}
	}

	fn check_idle(&self) -> Result<(), TrackerError> {
		if self.active_change.is_some() {
			return Err(TrackerError::ChangeInProgress);
		}
		if self.active_packet.is_some() {
			return Err(TrackerError::PacketOpen);
		}
		Ok(())
	}

	pub fn undo(&mut self, target: &mut DocumentState) -> Result<Vec<DocumentResponse>, DocumentError> {
		self.check_idle()?;
		let Some(mut packet) = self.undo_stack.pop_back() else {
			log::debug!("Nothing to undo");
			return Ok(vec![DocumentResponse::NothingToUndo]);
		};

		let mut responses = Vec::new();
		for index in (0..packet.len()).rev() {
			match packet[index].revert(target) {
				Ok(reverted) => responses.extend(reverted),
				Err(error) => {
					// Redo what was already undone so the packet stays on the undo stack
					let restored = packet[index + 1..].iter_mut().try_for_each(|change| change.apply(target, false).map(drop));
					match restored {
						Ok(()) => self.undo_stack.push_back(packet),
						Err(restore_error) => log::error!("Dropping a packet of {} changes that failed to undo: {restore_error}", packet.len()),
					}
					return Err(error.into());
				}
			}
		}
		log::debug!("Undid {} changes", packet.len());
		self.redo_stack.push(packet);
		Ok(responses)
	}

	pub fn redo(&mut self, target: &mut DocumentState) -> Result<Vec<DocumentResponse>, DocumentError> {
		self.check_idle()?;
		let Some(mut packet) = self.redo_stack.pop() else {
			log::debug!("Nothing to redo");
			return Ok(vec![DocumentResponse::NothingToRedo]);
		};

		let mut responses = Vec::new();
		for index in 0..packet.len() {
			match packet[index].apply(target, false) {
				Ok(outcome) => responses.extend(outcome.responses),
				Err(error) => {
					// Undo what was already redone so the packet stays on the redo stack
					let restored = packet[..index].iter_mut().rev().try_for_each(|change| change.revert(target).map(drop));
					match restored {
						Ok(()) => self.redo_stack.push(packet),
						Err(restore_error) => log::error!("Dropping a packet of {} changes that failed to redo: {restore_error}", packet.len()),
					}
					return Err(error.into());
				}
			}
		}
		log::debug!("Redid {} changes", packet.len());
		self.undo_stack.push_back(packet);
		Ok(responses)
	}

	/// Forgets the whole history without touching the document.
	pub fn delete_recorded_changes(&mut self) -> Result<(), TrackerError> {
		self.check_idle()?;
		self.undo_stack.clear();
		self.redo_stack.clear();
		Ok(())
	}
}
