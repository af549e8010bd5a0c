//! Declarative model of native callback interfaces.
//!
//! A callback interface is a native struct whose fields are function
//! pointers invoked by a native library to notify the host. This crate
//! holds the descriptor model for such interfaces and the two passes that
//! derive a stable public surface from it:
//! * [`resolve_event_names`]: computes the public event name and the
//!   basic-event classification for every callback, looking at the whole
//!   descriptor set at once
//! * [`assign_slot_indices`]: gives every callback its zero-based slot
//!   index, shared by the native vtable wiring, the local attach/detach
//!   path and the remote registration call
//!
//! Descriptors are built once per generation run, mutated only by these
//! two passes, and read-only afterwards. [`EmitSession`] packages the
//! resolved output for downstream consumers and replaces ambient global
//! state with an explicit per-run context.

pub mod config;
pub mod descriptor;
pub mod error;
pub mod naming;
pub mod session;
pub mod slots;

pub use config::GeneratorConfig;
pub use descriptor::{
	CallbackDescriptor, ClassCategory, ClassDescriptor, ParameterDescriptor, ReturnType, ValueType,
};
pub use error::{Error, Result};
pub use naming::{EVENT_NAME_PREFIX, resolve_event_names};
pub use session::{EmitSession, ResolvedCallback};
pub use slots::{assign_slot_indices, verify_slot_indices};

/// Runs both resolution passes over a full descriptor set.
///
/// Naming must see every class before deciding any single name, so this
/// takes the whole slice; slot assignment is per class.
pub fn resolve_model(classes: &mut [ClassDescriptor]) {
	resolve_event_names(classes);
	for class in classes.iter_mut() {
		assign_slot_indices(class);
	}
}
