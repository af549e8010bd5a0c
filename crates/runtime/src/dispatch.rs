//! Local dispatch: per-instance slot state and the invocation path.
//!
//! Each callback slot has an attach (enable) and detach (disable)
//! operation guarded by a per-instance lock, so enable/disable never
//! races with itself. Attaching the first handler installs the native
//! wiring for that slot; detaching the last clears it back to the no-op
//! sentinel. Invocation itself does NOT hold that lock: the handler
//! chain is snapshotted and run outside, so a handler may re-attach
//! without deadlocking, and a disable racing an in-flight call is
//! expected rather than exceptional.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use cfx_model::ClassDescriptor;
use parking_lot::Mutex;

use crate::error::{Error, Result};
use crate::event::EventArgs;
use crate::handle::{HandleTable, RawHandle};
use crate::signature::CallSignature;
use crate::value::Value;

/// A subscribed handler. Handlers run in subscription order.
pub type Handler = Arc<dyn Fn(&mut EventArgs) + Send + Sync>;

/// Identifies one subscription for later detach.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandlerId {
	slot: usize,
	seq: u64,
}

/// What an invocation hands back to the native call frame: outbound
/// parameters in declaration order, then the return value if the
/// signature has one.
#[derive(Debug, Clone, PartialEq)]
pub struct CallOutcome {
	/// Outbound parameter values in declaration order.
	pub outbound: Vec<Value>,
	/// Return value; `None` for void callbacks.
	pub ret: Option<Value>,
}

impl CallOutcome {
	/// The outcome of a silent no-op: every outbound parameter and the
	/// return slot at its type default.
	pub fn defaults(signature: &CallSignature) -> Self {
		Self {
			outbound: signature.outbound_params().map(|p| Value::default_of(p.ty)).collect(),
			ret: match signature.return_type {
				cfx_model::ReturnType::Void => None,
				cfx_model::ReturnType::Value(ty) => Some(Value::default_of(ty)),
			},
		}
	}
}

struct SlotState {
	/// Mirrors whether the native vtable slot points at the thunk.
	installed: bool,
	next_seq: u64,
	/// Exactly-one-handler slots reject a second attach.
	single_subscriber: bool,
	handlers: Vec<(u64, Handler)>,
}

impl SlotState {
	fn new(single_subscriber: bool) -> Self {
		Self {
			installed: false,
			next_seq: 0,
			single_subscriber,
			handlers: Vec::new(),
		}
	}
}

/// Per-instance state of one callback-interface object.
pub struct CallbackObject {
	class_name: String,
	signatures: Vec<Arc<CallSignature>>,
	/// Set during teardown; a set flag turns every invocation into the
	/// defined no-op.
	callbacks_disabled: AtomicBool,
	slots: Mutex<Vec<SlotState>>,
}

impl CallbackObject {
	/// Creates an instance with one slot per signature, in slot order.
	pub fn new(class_name: impl Into<String>, signatures: Vec<CallSignature>) -> Self {
		let slots = signatures.iter().map(|_| SlotState::new(false)).collect();
		Self {
			class_name: class_name.into(),
			signatures: signatures.into_iter().map(Arc::new).collect(),
			callbacks_disabled: AtomicBool::new(false),
			slots: Mutex::new(slots),
		}
	}

	/// Creates an instance from a resolved class descriptor, checking
	/// that the descriptor's slot assignment matches the positional
	/// order this object will use. The resolver and assigner are the
	/// single source of truth; disagreement is fatal at construction.
	pub fn from_class(class: &ClassDescriptor) -> cfx_model::Result<Arc<Self>> {
		let positional: Vec<u32> = (0..class.callbacks.len() as u32).collect();
		cfx_model::verify_slot_indices(class, &positional)?;
		Ok(Arc::new(Self::new(
			&class.name,
			class.callbacks.iter().map(CallSignature::from_descriptor).collect(),
		)))
	}

	/// Class name of the instance.
	pub fn class_name(&self) -> &str {
		&self.class_name
	}

	/// Number of callback slots.
	pub fn slot_count(&self) -> usize {
		self.signatures.len()
	}

	/// Signature of one slot.
	pub fn signature(&self, slot: usize) -> Result<&Arc<CallSignature>> {
		self.signatures.get(slot).ok_or_else(|| Error::InvalidSlot {
			class: self.class_name.clone(),
			slot,
		})
	}

	/// Marks one slot as single-subscriber. Used for simple getter
	/// callbacks whose return value must come from exactly one place.
	pub fn mark_single_subscriber(&self, slot: usize) -> Result<()> {
		let mut slots = self.slots.lock();
		let state = slots.get_mut(slot).ok_or_else(|| Error::InvalidSlot {
			class: self.class_name.clone(),
			slot,
		})?;
		state.single_subscriber = true;
		Ok(())
	}

	/// Appends a handler to a slot's chain.
	///
	/// Returns the subscription id and whether this attach installed the
	/// native wiring (first handler on the slot); the caller drives the
	/// native enable path exactly when it did.
	pub fn attach(
		&self,
		slot: usize,
		handler: impl Fn(&mut EventArgs) + Send + Sync + 'static,
	) -> Result<(HandlerId, bool)> {
		let mut slots = self.slots.lock();
		let state = slots.get_mut(slot).ok_or_else(|| Error::InvalidSlot {
			class: self.class_name.clone(),
			slot,
		})?;
		if state.single_subscriber && !state.handlers.is_empty() {
			return Err(Error::HandlerAlreadyAttached);
		}
		let seq = state.next_seq;
		state.next_seq += 1;
		state.handlers.push((seq, Arc::new(handler)));
		let installed = !state.installed;
		state.installed = true;
		tracing::trace!(class = %self.class_name, slot, installed, "handler attached");
		Ok((HandlerId { slot, seq }, installed))
	}

	/// Removes one subscription.
	///
	/// Returns true when the chain emptied and the native wiring was
	/// cleared; the caller drives the native disable path exactly then.
	pub fn detach(&self, id: HandlerId) -> Result<bool> {
		let mut slots = self.slots.lock();
		let state = slots.get_mut(id.slot).ok_or_else(|| Error::InvalidSlot {
			class: self.class_name.clone(),
			slot: id.slot,
		})?;
		state.handlers.retain(|(seq, _)| *seq != id.seq);
		let uninstalled = state.installed && state.handlers.is_empty();
		if uninstalled {
			state.installed = false;
		}
		Ok(uninstalled)
	}

	/// Clears a slot's whole chain. Returns true if the native wiring
	/// was installed and is now cleared.
	pub fn detach_all(&self, slot: usize) -> Result<bool> {
		let mut slots = self.slots.lock();
		let state = slots.get_mut(slot).ok_or_else(|| Error::InvalidSlot {
			class: self.class_name.clone(),
			slot,
		})?;
		state.handlers.clear();
		let uninstalled = state.installed;
		state.installed = false;
		Ok(uninstalled)
	}

	/// True if the slot's native wiring is currently installed.
	pub fn is_installed(&self, slot: usize) -> bool {
		self.slots.lock().get(slot).is_some_and(|s| s.installed)
	}

	/// Flags the object so every further invocation degrades to the
	/// silent no-op.
	pub fn disable_callbacks(&self) {
		self.callbacks_disabled.store(true, Ordering::SeqCst);
	}

	/// True once teardown started.
	pub fn callbacks_disabled(&self) -> bool {
		self.callbacks_disabled.load(Ordering::SeqCst)
	}

	/// Tears the instance down: disables callbacks, then clears every
	/// slot. Returns the slots whose native wiring must be disabled;
	/// the caller performs those native disable calls and only then
	/// releases the native resource. Disabling after release would be a
	/// use-after-free.
	pub fn teardown(&self) -> Vec<usize> {
		self.disable_callbacks();
		let mut slots = self.slots.lock();
		let mut cleared = Vec::new();
		for (index, state) in slots.iter_mut().enumerate() {
			state.handlers.clear();
			if state.installed {
				state.installed = false;
				cleared.push(index);
			}
		}
		tracing::debug!(class = %self.class_name, slots = ?cleared, "instance torn down");
		cleared
	}

	/// Dispatches one native invocation.
	///
	/// If the object is disabled this is the defined no-op: default
	/// outbound and return values, no handler runs. Otherwise the
	/// handler chain runs in subscription order against one event-data
	/// value, which is invalidated before the outcome is copied back.
	pub fn invoke(&self, slot: usize, inbound: Vec<Value>) -> Result<CallOutcome> {
		let signature = self.signature(slot)?.clone();
		if self.callbacks_disabled() {
			tracing::trace!(class = %self.class_name, slot, "invocation on disabled object");
			return Ok(CallOutcome::defaults(&signature));
		}
		// Snapshot outside the invocation so handlers may attach/detach.
		let chain: Vec<Handler> = {
			let slots = self.slots.lock();
			let state = slots.get(slot).ok_or_else(|| Error::InvalidSlot {
				class: self.class_name.clone(),
				slot,
			})?;
			state.handlers.iter().map(|(_, h)| Arc::clone(h)).collect()
		};
		let mut args = EventArgs::new(signature, inbound)?;
		for handler in &chain {
			handler(&mut args);
		}
		args.invalidate();
		Ok(args.into_outcome())
	}
}

/// Dispatches a native invocation addressed by handle token.
///
/// An absent, stale or collected handle is the same defined no-op as a
/// disabled object: the native frame gets defaults and no user code
/// runs. The signature comes from the caller because the generated
/// native thunk knows it statically even when the object is gone.
pub fn invoke_handle(
	table: &HandleTable,
	handle: RawHandle,
	slot: usize,
	signature: &CallSignature,
	inbound: Vec<Value>,
) -> Result<CallOutcome> {
	match table.resolve(handle) {
		Some(object) => object.invoke(slot, inbound),
		None => {
			tracing::trace!(?handle, slot, "invocation on unresolvable handle");
			Ok(CallOutcome::defaults(signature))
		}
	}
}

#[cfg(test)]
mod tests {
	use cfx_model::{CallbackDescriptor, ParameterDescriptor, ReturnType, ValueType};
	use pretty_assertions::assert_eq;

	use super::*;

	fn query_signature() -> CallSignature {
		CallSignature::from_descriptor(&CallbackDescriptor::new(
			"Frame",
			"OnQuery",
			vec![
				ParameterDescriptor::inbound("query", ValueType::Str),
				ParameterDescriptor::outbound("response", ValueType::Str),
			],
			ReturnType::Value(ValueType::Bool),
		))
	}

	fn object() -> CallbackObject {
		CallbackObject::new("Frame", vec![query_signature()])
	}

	#[test]
	fn first_attach_installs_last_detach_clears() {
		let obj = object();
		let (first, installed) = obj.attach(0, |_| {}).unwrap();
		assert!(installed);
		let (second, installed) = obj.attach(0, |_| {}).unwrap();
		assert!(!installed);

		assert!(!obj.detach(first).unwrap());
		assert!(obj.detach(second).unwrap());
		assert!(!obj.is_installed(0));
	}

	#[test]
	fn handlers_run_in_subscription_order() {
		let obj = object();
		let order = Arc::new(Mutex::new(Vec::new()));
		for tag in ["first", "second", "third"] {
			let order = Arc::clone(&order);
			obj.attach(0, move |_| order.lock().push(tag)).unwrap();
		}
		obj.invoke(0, vec![Value::Str("q".to_string())]).unwrap();
		assert_eq!(*order.lock(), vec!["first", "second", "third"]);
	}

	#[test]
	fn handler_writes_reach_the_outcome() {
		let obj = object();
		obj.attach(0, |args| {
			let Value::Str(query) = args.get("query").clone() else {
				panic!("inbound type");
			};
			args.set("response", Value::Str(format!("re: {query}")));
			args.set_return_value(Value::Bool(true));
		})
		.unwrap();
		let outcome = obj.invoke(0, vec![Value::Str("hello".to_string())]).unwrap();
		assert_eq!(outcome.outbound, vec![Value::Str("re: hello".to_string())]);
		assert_eq!(outcome.ret, Some(Value::Bool(true)));
	}

	#[test]
	fn disabled_object_is_a_silent_no_op() {
		let obj = object();
		let ran = Arc::new(AtomicBool::new(false));
		let flag = Arc::clone(&ran);
		obj.attach(0, move |_| flag.store(true, Ordering::SeqCst)).unwrap();

		obj.disable_callbacks();
		let outcome = obj.invoke(0, vec![Value::Str("q".to_string())]).unwrap();
		assert!(!ran.load(Ordering::SeqCst));
		assert_eq!(outcome.outbound, vec![Value::Str(String::new())]);
		assert_eq!(outcome.ret, Some(Value::Bool(false)));
	}

	#[test]
	fn single_subscriber_slot_rejects_second_attach() {
		let obj = object();
		obj.mark_single_subscriber(0).unwrap();
		obj.attach(0, |_| {}).unwrap();
		assert_eq!(obj.attach(0, |_| {}).unwrap_err(), Error::HandlerAlreadyAttached);
	}

	#[test]
	fn teardown_disables_then_clears_every_installed_slot() {
		let obj = CallbackObject::new("Frame", vec![query_signature(), query_signature()]);
		obj.attach(1, |_| {}).unwrap();

		let cleared = obj.teardown();
		assert_eq!(cleared, vec![1]);
		assert!(obj.callbacks_disabled());
		assert!(!obj.is_installed(1));

		// Late native call after teardown: still served, as a no-op.
		let outcome = obj.invoke(1, vec![Value::Str("late".to_string())]).unwrap();
		assert_eq!(outcome.ret, Some(Value::Bool(false)));
	}

	#[test]
	fn invalid_slot_is_an_error() {
		let obj = object();
		assert!(matches!(
			obj.invoke(5, Vec::new()),
			Err(Error::InvalidSlot { slot: 5, .. })
		));
	}

	#[test]
	fn stale_handle_invocation_yields_defaults() {
		let table = HandleTable::new();
		let signature = query_signature();
		let handle = {
			let obj = Arc::new(object());
			table.insert_weak(&obj)
			// Object dropped here; only the arena knew it.
		};
		let outcome = invoke_handle(
			&table,
			handle,
			0,
			&signature,
			vec![Value::Str("q".to_string())],
		)
		.unwrap();
		assert_eq!(outcome, CallOutcome::defaults(&signature));
	}

	#[test]
	fn from_class_checks_the_canonical_slot_assignment() {
		let mut class = ClassDescriptor::callback_interface(
			"Frame",
			vec![
				CallbackDescriptor::new("Frame", "OnLoad", Vec::new(), ReturnType::Void),
				CallbackDescriptor::new("Frame", "Closed", Vec::new(), ReturnType::Void),
			],
		);
		// Unassigned descriptors are rejected.
		assert!(CallbackObject::from_class(&class).is_err());

		cfx_model::assign_slot_indices(&mut class);
		let obj = CallbackObject::from_class(&class).unwrap();
		assert_eq!(obj.slot_count(), 2);

		// A tampered assignment is fatal at construction.
		class.callbacks[0].slot_index = Some(1);
		class.callbacks[1].slot_index = Some(0);
		assert!(CallbackObject::from_class(&class).is_err());
	}
}
