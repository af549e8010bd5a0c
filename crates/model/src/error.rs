use thiserror::Error;

/// Errors raised while resolving or validating a descriptor set.
///
/// All of these are generation-time conditions: a mismatch between the
/// canonical slot assignment and what a representation reports is an
/// internal invariant violation, never something to recover from at
/// runtime.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
	/// A representation computed slot indices that disagree with the
	/// canonical assignment.
	#[error("slot index mismatch in {class}: expected {expected:?}, reported {reported:?}")]
	SlotIndexMismatch {
		/// Class whose slots disagree.
		class: String,
		/// Canonical contiguous assignment.
		expected: Vec<u32>,
		/// What the representation reported.
		reported: Vec<u32>,
	},
	/// A callback was consumed before the assigner ran.
	#[error("callback {class}::{callback} has no slot index assigned")]
	UnassignedSlot {
		/// Owning class.
		class: String,
		/// Callback public name.
		callback: String,
	},
}

/// Result alias for model operations.
pub type Result<T> = std::result::Result<T, Error>;
