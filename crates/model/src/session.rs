//! Per-run emission context.
//!
//! Downstream consumers (the text emitter, the remoting call tables)
//! read the resolved model through this session instead of recomputing
//! names or indices themselves; the resolver and assigner are the single
//! source of truth and any artifact deriving these independently is a
//! correctness bug. The session also carries the dedupe state for
//! symbols shared between classes, passed explicitly through the
//! emission call tree rather than living in ambient global state.

use rustc_hash::FxHashSet;

use crate::descriptor::{CallbackDescriptor, ClassDescriptor};
use crate::error::{Error, Result};

/// Resolved view of one callback, as consumed by every representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedCallback<'a> {
	/// Public symbol: the resolved event name or the bare public name.
	pub symbol: &'a str,
	/// Stable slot index within the owning class.
	pub slot_index: u32,
	/// Basic events carry no data, so no event-args value is built for
	/// them.
	pub is_basic_event: bool,
	/// The underlying descriptor.
	pub descriptor: &'a CallbackDescriptor,
}

/// State for one generation run.
#[derive(Debug, Default)]
pub struct EmitSession {
	emitted_symbols: FxHashSet<String>,
}

impl EmitSession {
	/// Creates a fresh session. Sessions are never shared across runs.
	pub fn new() -> Self {
		Self::default()
	}

	/// Records a shared symbol and reports whether this is its first
	/// emission. Event-args and handler types are shared between classes
	/// whose callbacks resolved to the same event name, so only the first
	/// occurrence emits the definition.
	pub fn first_emission(&mut self, symbol: &str) -> bool {
		self.emitted_symbols.insert(symbol.to_string())
	}

	/// Returns the resolved callbacks of one class in slot order.
	///
	/// Fails if the class was never run through the slot assigner.
	pub fn resolved_callbacks<'a>(&self, class: &'a ClassDescriptor) -> Result<Vec<ResolvedCallback<'a>>> {
		let mut resolved = Vec::with_capacity(class.callbacks.len());
		for cb in &class.callbacks {
			let slot_index = cb.slot_index.ok_or_else(|| Error::UnassignedSlot {
				class: class.name.clone(),
				callback: cb.public_name.clone(),
			})?;
			resolved.push(ResolvedCallback {
				symbol: cb.event_symbol(),
				slot_index,
				is_basic_event: cb.is_basic_event,
				descriptor: cb,
			});
		}
		Ok(resolved)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::descriptor::{CallbackDescriptor, ReturnType, ValueType};
	use crate::resolve_model;

	#[test]
	fn resolved_view_supports_exact_comparison() {
		fn requires_eq<T: Eq>() {}
		requires_eq::<ResolvedCallback<'_>>();
	}

	#[test]
	fn first_emission_dedupes_shared_symbols() {
		let mut session = EmitSession::new();
		assert!(session.first_emission("CfxOnLoadEventArgs"));
		assert!(!session.first_emission("CfxOnLoadEventArgs"));
		assert!(session.first_emission("CfxOnTitleEventArgs"));
	}

	#[test]
	fn resolved_callbacks_follow_slot_order() {
		let mut classes = vec![ClassDescriptor::callback_interface(
			"Frame",
			vec![
				CallbackDescriptor::new("Frame", "OnLoad", Vec::new(), ReturnType::Value(ValueType::Int)),
				CallbackDescriptor::new("Frame", "Closed", Vec::new(), ReturnType::Void),
			],
		)];
		resolve_model(&mut classes);

		let session = EmitSession::new();
		let resolved = session.resolved_callbacks(&classes[0]).unwrap();
		assert_eq!(resolved.len(), 2);
		assert_eq!(resolved[0].symbol, "CfxOnLoad");
		assert_eq!(resolved[0].slot_index, 0);
		assert!(!resolved[0].is_basic_event);
		assert_eq!(resolved[1].symbol, "Closed");
		assert_eq!(resolved[1].slot_index, 1);
		assert!(resolved[1].is_basic_event);
	}

	#[test]
	fn resolved_callbacks_require_assignment() {
		let class = ClassDescriptor::callback_interface(
			"Frame",
			vec![CallbackDescriptor::new("Frame", "OnLoad", Vec::new(), ReturnType::Void)],
		);
		let session = EmitSession::new();
		assert!(matches!(
			session.resolved_callbacks(&class),
			Err(Error::UnassignedSlot { .. })
		));
	}
}
