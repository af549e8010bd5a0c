//! Slot index assignment and cross-representation validation.
//!
//! Every callback gets a stable zero-based slot index within its owning
//! class. The native vtable wiring, the local attach/detach call and the
//! remote registration call all reference that same index; wiring the
//! wrong slot silently delivers the wrong callback, which makes this the
//! single most dangerous defect class in the system. The assignment here
//! is the canonical one and any representation that computes indices
//! independently must be checked against it.

use crate::descriptor::ClassDescriptor;
use crate::error::{Error, Result};

/// Assigns sequential slot indices `0..N-1` to the callbacks of one
/// class, in declaration order.
pub fn assign_slot_indices(class: &mut ClassDescriptor) {
	for (index, cb) in class.callbacks.iter_mut().enumerate() {
		cb.slot_index = Some(index as u32);
	}
}

/// Checks an independently-computed index list against the canonical
/// assignment.
///
/// `reported` must list, per callback in declaration order, the slot
/// index the representation uses. Any disagreement is a generation-time
/// fatal condition.
pub fn verify_slot_indices(class: &ClassDescriptor, reported: &[u32]) -> Result<()> {
	let mut expected = Vec::with_capacity(class.callbacks.len());
	for cb in &class.callbacks {
		let index = cb.slot_index.ok_or_else(|| Error::UnassignedSlot {
			class: class.name.clone(),
			callback: cb.public_name.clone(),
		})?;
		expected.push(index);
	}
	if expected != reported {
		return Err(Error::SlotIndexMismatch {
			class: class.name.clone(),
			expected,
			reported: reported.to_vec(),
		});
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::descriptor::{CallbackDescriptor, ReturnType};

	fn sample_class() -> ClassDescriptor {
		ClassDescriptor::callback_interface(
			"Frame",
			vec![
				CallbackDescriptor::new("Frame", "OnLoad", Vec::new(), ReturnType::Void),
				CallbackDescriptor::new("Frame", "OnUnload", Vec::new(), ReturnType::Void),
				CallbackDescriptor::new("Frame", "Closed", Vec::new(), ReturnType::Void),
			],
		)
	}

	#[test]
	fn indices_are_contiguous_from_zero() {
		let mut class = sample_class();
		assign_slot_indices(&mut class);
		let indices: Vec<_> = class.callbacks.iter().map(|cb| cb.slot_index).collect();
		assert_eq!(indices, vec![Some(0), Some(1), Some(2)]);
	}

	#[test]
	fn verify_accepts_canonical_assignment() {
		let mut class = sample_class();
		assign_slot_indices(&mut class);
		assert!(verify_slot_indices(&class, &[0, 1, 2]).is_ok());
	}

	#[test]
	fn verify_rejects_swapped_slots() {
		let mut class = sample_class();
		assign_slot_indices(&mut class);
		let err = verify_slot_indices(&class, &[0, 2, 1]).unwrap_err();
		assert!(matches!(err, Error::SlotIndexMismatch { .. }));
	}

	#[test]
	fn verify_rejects_unassigned_descriptors() {
		let class = sample_class();
		let err = verify_slot_indices(&class, &[0, 1, 2]).unwrap_err();
		assert!(matches!(err, Error::UnassignedSlot { .. }));
	}
}
