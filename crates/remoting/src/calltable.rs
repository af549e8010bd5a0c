//! Per-callback call specifications shared by both endpoints.
//!
//! Slot indices, signatures and the basic-event classification all come
//! from the resolved model; neither endpoint computes any of them
//! independently. The table is built once per connection from the same
//! descriptor set the generator consumed, which is what keeps the
//! native vtable wiring, the local API and the remote proxy in
//! agreement.

use std::collections::HashMap;
use std::sync::Arc;

use cfx_model::{ClassDescriptor, EmitSession, GeneratorConfig, verify_slot_indices};
use cfx_runtime::CallSignature;

use crate::error::{Error, Result};
use crate::wire::CallKey;

/// Resolved spec of one forwardable callback.
#[derive(Debug, Clone)]
pub struct CallSpec {
	/// Slot index within the owning class, identical to the one the
	/// vtable wiring and the local attach path use.
	pub slot: u32,
	/// Runtime signature; the wire shapes derive from it.
	pub signature: Arc<CallSignature>,
	/// Basic events build no event-data value.
	pub is_basic_event: bool,
	/// Restricted to the owning process; never registrable remotely.
	pub host_only: bool,
}

/// Lookup table from call key to spec, plus the reverse slot lookup the
/// registration path needs.
#[derive(Debug, Default)]
pub struct CallTable {
	entries: HashMap<CallKey, CallSpec>,
	by_slot: HashMap<(String, u32), CallKey>,
}

impl CallTable {
	/// Builds the table from a resolved descriptor set.
	///
	/// Fails if any class skipped the slot assigner or carries indices
	/// that disagree with the canonical contiguous assignment; a
	/// duplicated index would silently alias two callbacks in the
	/// reverse lookup.
	pub fn from_classes(classes: &[ClassDescriptor], config: &GeneratorConfig) -> Result<Self> {
		let session = EmitSession::new();
		let mut entries = HashMap::new();
		let mut by_slot = HashMap::new();
		for class in classes {
			let positional: Vec<u32> = (0..class.callbacks.len() as u32).collect();
			verify_slot_indices(class, &positional)?;
			for resolved in session.resolved_callbacks(class)? {
				let key = CallKey::new(&class.name, &resolved.descriptor.public_name);
				by_slot.insert((class.name.clone(), resolved.slot_index), key.clone());
				entries.insert(
					key,
					CallSpec {
						slot: resolved.slot_index,
						signature: Arc::new(CallSignature::from_descriptor(resolved.descriptor)),
						is_basic_event: resolved.is_basic_event,
						host_only: config.is_host_only(&class.name, &resolved.descriptor.public_name),
					},
				);
			}
		}
		Ok(Self { entries, by_slot })
	}

	/// Looks a callback up by key.
	pub fn get(&self, key: &CallKey) -> Result<&CallSpec> {
		self.entries.get(key).ok_or_else(|| Error::UnknownCall(key.clone()))
	}

	/// Looks a callback up by owning class and slot index.
	pub fn key_for_slot(&self, class: &str, slot: u32) -> Result<&CallKey> {
		self.by_slot
			.get(&(class.to_string(), slot))
			.ok_or_else(|| Error::UnknownCall(CallKey::new(class, format!("slot {slot}"))))
	}

	/// Number of callbacks in the table.
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	/// True when no callbacks are known.
	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}
}
