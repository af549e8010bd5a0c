//! Externally supplied per-class generation policies.
//!
//! Whether a class uses dynamic handle strength, and which callbacks are
//! only reachable from the owning process, cannot be derived from the
//! descriptors themselves; both come from configuration.

use std::collections::BTreeSet;

use serde::Deserialize;

use crate::descriptor::ClassDescriptor;

/// Generation policies keyed by class and callback names.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorConfig {
	/// Classes whose managed handle starts weak and follows the native
	/// reference count: upgraded to strong while the count exceeds one,
	/// downgraded back at one. Used for classes where a permanently
	/// strong handle would create collection-proof cycles. Classes not
	/// listed keep a strong handle for their entire native lifetime.
	pub dynamic_strength_classes: BTreeSet<String>,
	/// `Class::callback` keys that must never be exposed on the remote
	/// proxy surface; they can only fire in the owning process.
	pub host_only_callbacks: BTreeSet<String>,
}

impl GeneratorConfig {
	/// True if the class follows the dynamic handle-strength discipline.
	pub fn dynamic_strength_for(&self, class: &str) -> bool {
		self.dynamic_strength_classes.contains(class)
	}

	/// True if the callback is restricted to the owning process.
	pub fn is_host_only(&self, class: &str, callback: &str) -> bool {
		self.host_only_callbacks.contains(&format!("{class}::{callback}"))
	}

	/// Stamps the per-class policies onto a descriptor set.
	pub fn apply(&self, classes: &mut [ClassDescriptor]) {
		for class in classes {
			class.dynamic_handle_strength = self.dynamic_strength_for(&class.name);
		}
	}
}
