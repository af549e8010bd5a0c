//! Reference-count lifecycle state machine.
//!
//! Maps the native-side reference count of a callback-interface object to
//! the strength of its managed handle. Two disciplines exist, selected
//! per class by external policy:
//! * static-strong: the handle stays strong for the object's entire
//!   native lifetime; add_ref/release only move the count
//! * dynamic: the handle starts weak, upgrades to strong on the 1 to 2
//!   transition and downgrades back on 2 to 1; a permanently strong
//!   handle would make such objects collection-proof cycles
//!
//! Release to zero always frees the handle and reports that the native
//! block must be freed. "Read count, compare to threshold, switch
//! handle" is one critical section: the switch is emitted under the
//! count mutex so it can never race the mutation that triggered it.

use parking_lot::Mutex;

use crate::error::{Error, Result};
use crate::handle::{HandleOp, HandleOps, HandleSwitch, RawHandle};

/// Whether a wrapper is owned by the current process or stands in for an
/// object living elsewhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WrapperKind {
	/// The real object lives in this process.
	Local,
	/// A cross-process proxy; handle operations are tagged remote so the
	/// sink can route them to the owning process's table.
	Remote,
}

/// Per-class handle-strength discipline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrengthPolicy {
	/// Handle is strong for the whole native lifetime.
	StaticStrong,
	/// Handle strength follows the reference count.
	Dynamic,
}

struct RefState {
	count: u32,
}

/// Result of one `release` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReleaseOutcome {
	/// Count after the decrement.
	pub count: u32,
	/// True when the count reached zero: the handle was freed and the
	/// caller must free the native memory block.
	pub freed: bool,
}

/// The native-side reference count of one wrapper, with the handle
/// strength it governs.
pub struct NativeRef {
	state: Mutex<RefState>,
	handle: RawHandle,
	policy: StrengthPolicy,
	wrapper_kind: WrapperKind,
}

impl NativeRef {
	/// Creates the state for a freshly constructed wrapper. The count
	/// starts at 1; whether the handle starts weak or strong is decided
	/// by the table insertion matching `policy`. Strength itself lives
	/// in the handle table; this state machine only emits the switches.
	pub fn new(handle: RawHandle, policy: StrengthPolicy, wrapper_kind: WrapperKind) -> Self {
		Self {
			state: Mutex::new(RefState { count: 1 }),
			handle,
			policy,
			wrapper_kind,
		}
	}

	fn emit(&self, ops: &dyn HandleOps, switch: HandleSwitch) {
		ops.switch(
			self.handle,
			HandleOp {
				switch,
				remote: self.wrapper_kind == WrapperKind::Remote,
			},
		);
	}

	/// Increments the count. On the 1 to 2 transition of a dynamic
	/// wrapper the handle is upgraded inside the same critical section.
	/// Returns the new count.
	pub fn add_ref(&self, ops: &dyn HandleOps) -> u32 {
		let mut state = self.state.lock();
		state.count += 1;
		if self.policy == StrengthPolicy::Dynamic && state.count == 2 {
			self.emit(ops, HandleSwitch::Upgrade);
			tracing::debug!(handle = ?self.handle, "refcount 1->2, handle upgraded");
		}
		state.count
	}

	/// Decrements the count. On the 2 to 1 transition of a dynamic
	/// wrapper the handle is downgraded; on zero it is freed.
	pub fn release(&self, ops: &dyn HandleOps) -> Result<ReleaseOutcome> {
		let mut state = self.state.lock();
		if state.count == 0 {
			return Err(Error::RefCountUnderflow);
		}
		state.count -= 1;
		match state.count {
			0 => {
				self.emit(ops, HandleSwitch::Free);
				tracing::debug!(handle = ?self.handle, "refcount 0, handle freed");
				Ok(ReleaseOutcome { count: 0, freed: true })
			}
			1 if self.policy == StrengthPolicy::Dynamic => {
				self.emit(ops, HandleSwitch::Downgrade);
				tracing::debug!(handle = ?self.handle, "refcount 2->1, handle downgraded");
				Ok(ReleaseOutcome { count: 1, freed: false })
			}
			count => Ok(ReleaseOutcome { count, freed: false }),
		}
	}

	/// Current count.
	pub fn count(&self) -> u32 {
		self.state.lock().count
	}

	/// True while only the native library's own bookkeeping references
	/// the object.
	pub fn has_one_ref(&self) -> bool {
		self.count() == 1
	}
}
