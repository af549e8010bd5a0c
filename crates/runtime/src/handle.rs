//! Generation-checked handle arena.
//!
//! Handle tokens are the opaque identifiers native code carries for
//! managed objects. The table is an indexed arena: each entry holds a
//! weak reference to the object plus, while the handle is strong, an
//! owning reference that keeps the object in the root set. Strength is
//! therefore "present in the root set" vs "present only in the arena".
//! Freed slots bump a per-slot generation so a stale token resolves to
//! nothing instead of whatever object re-used the slot.

use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use slab::Slab;

use crate::dispatch::CallbackObject;
use crate::error::{Error, Result};

/// Opaque handle token. This is the value that crosses the native
/// boundary and, for proxied objects, the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RawHandle {
	/// Arena slot index.
	pub index: u32,
	/// Generation the slot had when this token was issued.
	pub generation: u32,
}

impl RawHandle {
	/// The null token; resolves to nothing.
	pub const NULL: RawHandle = RawHandle {
		index: u32::MAX,
		generation: 0,
	};

	/// True for the null token.
	pub fn is_null(&self) -> bool {
		*self == Self::NULL
	}
}

/// Strength transition applied to a handle as the native reference count
/// crosses a threshold. Serializable because remote-tagged operations
/// cross the process boundary to the owning process's table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HandleSwitch {
	/// Weak to strong: the object is now referenced beyond the native
	/// library's own bookkeeping and must survive collection.
	Upgrade,
	/// Strong back to weak.
	Downgrade,
	/// Release the handle and vacate the slot.
	Free,
}

/// A switch plus its routing tag. `remote` is set when the wrapper is a
/// cross-process proxy, so the operation targets the owning process's
/// handle table rather than the local one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandleOp {
	/// The strength transition.
	pub switch: HandleSwitch,
	/// Route to the owning process's table.
	pub remote: bool,
}

/// Sink for handle operations emitted by the lifecycle state machine.
///
/// The local handle table is the usual sink; a remoting layer can
/// substitute one that forwards remote-tagged operations to the owning
/// process.
pub trait HandleOps: Send + Sync {
	/// Applies one strength transition.
	fn switch(&self, handle: RawHandle, op: HandleOp);
}

struct Entry {
	generation: u32,
	object: Weak<CallbackObject>,
	/// Present while the handle is strong.
	root: Option<Arc<CallbackObject>>,
}

struct Inner {
	slots: Slab<Entry>,
	/// Per-slot generation counters, surviving slot reuse.
	generations: Vec<u32>,
}

/// Arena of managed objects keyed by generation-checked tokens.
#[derive(Default)]
pub struct HandleTable {
	inner: RwLock<Inner>,
}

impl Default for Inner {
	fn default() -> Self {
		Self {
			slots: Slab::new(),
			generations: Vec::new(),
		}
	}
}

impl HandleTable {
	/// Creates an empty table.
	pub fn new() -> Self {
		Self::default()
	}

	/// Inserts an object with a weak handle.
	pub fn insert_weak(&self, object: &Arc<CallbackObject>) -> RawHandle {
		self.insert(object, false)
	}

	/// Inserts an object with a strong handle, keeping it rooted until
	/// downgraded or freed.
	pub fn insert_strong(&self, object: &Arc<CallbackObject>) -> RawHandle {
		self.insert(object, true)
	}

	fn insert(&self, object: &Arc<CallbackObject>, rooted: bool) -> RawHandle {
		let mut inner = self.inner.write();
		let index = inner.slots.vacant_key();
		if index >= inner.generations.len() {
			inner.generations.resize(index + 1, 0);
		}
		let generation = inner.generations[index];
		inner.slots.insert(Entry {
			generation,
			object: Arc::downgrade(object),
			root: rooted.then(|| Arc::clone(object)),
		});
		RawHandle {
			index: index as u32,
			generation,
		}
	}

	/// Resolves a token to its object. Returns `None` for null, stale or
	/// collected handles; dispatch degrades to a no-op in that case.
	pub fn resolve(&self, handle: RawHandle) -> Option<Arc<CallbackObject>> {
		if handle.is_null() {
			return None;
		}
		let inner = self.inner.read();
		let entry = inner.slots.get(handle.index as usize)?;
		if entry.generation != handle.generation {
			return None;
		}
		entry.object.upgrade()
	}

	/// Applies one strength transition to a handle.
	pub fn apply(&self, handle: RawHandle, switch: HandleSwitch) -> Result<()> {
		let mut inner = self.inner.write();
		let entry = inner
			.slots
			.get_mut(handle.index as usize)
			.filter(|entry| entry.generation == handle.generation)
			.ok_or(Error::StaleHandle(handle))?;
		match switch {
			HandleSwitch::Upgrade => {
				entry.root = entry.object.upgrade();
				if entry.root.is_none() {
					tracing::warn!(?handle, "upgrade of an already collected object");
				}
			}
			HandleSwitch::Downgrade => {
				entry.root = None;
			}
			HandleSwitch::Free => {
				inner.slots.remove(handle.index as usize);
				inner.generations[handle.index as usize] = inner.generations[handle.index as usize].wrapping_add(1);
			}
		}
		tracing::trace!(?handle, ?switch, "handle switch");
		Ok(())
	}

	/// True if the handle currently keeps its object in the root set.
	pub fn is_rooted(&self, handle: RawHandle) -> bool {
		let inner = self.inner.read();
		inner
			.slots
			.get(handle.index as usize)
			.filter(|entry| entry.generation == handle.generation)
			.is_some_and(|entry| entry.root.is_some())
	}

	/// Number of live entries.
	pub fn len(&self) -> usize {
		self.inner.read().slots.len()
	}

	/// True if no entries are live.
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

impl HandleOps for HandleTable {
	fn switch(&self, handle: RawHandle, op: HandleOp) {
		// A remote-tagged op reaching the local table means the caller
		// did not install a forwarding sink; apply locally but say so.
		if op.remote {
			tracing::debug!(?handle, ?op, "remote-tagged handle op applied to local table");
		}
		if let Err(err) = self.apply(handle, op.switch) {
			tracing::warn!(?handle, ?op, %err, "handle switch on stale token");
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn object() -> Arc<CallbackObject> {
		Arc::new(CallbackObject::new("Test", Vec::new()))
	}

	#[test]
	fn weak_handle_does_not_root() {
		let table = HandleTable::new();
		let obj = object();
		let handle = table.insert_weak(&obj);
		assert!(!table.is_rooted(handle));
		assert!(table.resolve(handle).is_some());

		drop(obj);
		// Only the arena referenced it; the entry is stale now.
		assert!(table.resolve(handle).is_none());
	}

	#[test]
	fn strong_handle_keeps_object_alive() {
		let table = HandleTable::new();
		let handle = {
			let obj = object();
			table.insert_strong(&obj)
		};
		assert!(table.is_rooted(handle));
		assert!(table.resolve(handle).is_some());

		table.apply(handle, HandleSwitch::Downgrade).unwrap();
		assert!(!table.is_rooted(handle));
		assert!(table.resolve(handle).is_none());
	}

	#[test]
	fn upgrade_roots_a_live_object() {
		let table = HandleTable::new();
		let obj = object();
		let handle = table.insert_weak(&obj);
		table.apply(handle, HandleSwitch::Upgrade).unwrap();
		drop(obj);
		// Rooted, so still resolvable.
		assert!(table.resolve(handle).is_some());
	}

	#[test]
	fn free_vacates_and_bumps_generation() {
		let table = HandleTable::new();
		let obj = object();
		let handle = table.insert_weak(&obj);
		table.apply(handle, HandleSwitch::Free).unwrap();
		assert!(table.resolve(handle).is_none());
		assert_eq!(table.apply(handle, HandleSwitch::Upgrade), Err(Error::StaleHandle(handle)));

		// Slot reuse issues a new generation; the old token stays dead.
		let other = object();
		let reused = table.insert_weak(&other);
		assert_eq!(reused.index, handle.index);
		assert_ne!(reused.generation, handle.generation);
		assert!(table.resolve(handle).is_none());
		assert!(table.resolve(reused).is_some());
	}

	#[test]
	fn null_handle_resolves_to_none() {
		let table = HandleTable::new();
		assert!(table.resolve(RawHandle::NULL).is_none());
	}
}
