use thiserror::Error;

use crate::handle::RawHandle;

/// Errors from the handle table, lifecycle and dispatch paths.
///
/// Note what is deliberately NOT an error: invoking a callback on a
/// disabled or disposed object is a defined no-op returning defaults.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
	/// A slot index outside the class's callback list.
	#[error("invalid callback slot {slot} for class {class}")]
	InvalidSlot {
		/// Class name of the target object.
		class: String,
		/// The out-of-range slot.
		slot: usize,
	},
	/// A second handler was attached to a single-subscriber slot.
	#[error("can't attach more than one handler to this slot")]
	HandlerAlreadyAttached,
	/// `release` was called on a reference count that is already zero.
	#[error("reference count underflow")]
	RefCountUnderflow,
	/// A handle operation targeted a vacated or re-used arena slot.
	#[error("stale handle {0:?}")]
	StaleHandle(RawHandle),
	/// The native frame passed a different number of inbound values than
	/// the signature declares.
	#[error("inbound arity mismatch: expected {expected}, got {got}")]
	ArityMismatch {
		/// Inbound parameter count of the signature.
		expected: usize,
		/// Values actually supplied.
		got: usize,
	},
}

/// Result alias for runtime operations.
pub type Result<T> = std::result::Result<T, Error>;
