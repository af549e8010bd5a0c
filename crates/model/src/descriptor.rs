//! Descriptor types for callback-interface classes.

use serde::{Deserialize, Serialize};

/// The closed set of data types the callback protocol marshals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueType {
	/// Boolean flag.
	Bool,
	/// Signed integer.
	Int,
	/// Unsigned integer.
	UInt,
	/// Floating point number.
	Float,
	/// UTF-8 string.
	Str,
	/// Raw byte buffer.
	Bytes,
	/// Handle-valued reference to another wrapped object.
	Object,
}

/// Return type of a callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReturnType {
	/// The callback returns nothing.
	Void,
	/// The callback returns a value of the given type.
	Value(ValueType),
}

impl ReturnType {
	/// Returns true for void callbacks.
	pub fn is_void(&self) -> bool {
		matches!(self, ReturnType::Void)
	}
}

/// One user-visible parameter of a callback.
///
/// The implicit self reference native code passes first is not modeled
/// here; parameter lists hold user-visible data only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterDescriptor {
	/// Parameter name as declared by the native header.
	pub name: String,
	/// Marshaled type.
	pub ty: ValueType,
	/// The native side passes data in through this parameter.
	pub is_inbound: bool,
	/// The host may pass data back out through this parameter.
	///
	/// A parameter can be both inbound and outbound (a get/set property in
	/// the emitted API) or outbound only (a set-only property).
	pub is_outbound: bool,
}

impl ParameterDescriptor {
	/// Creates an inbound-only parameter.
	pub fn inbound(name: impl Into<String>, ty: ValueType) -> Self {
		Self {
			name: name.into(),
			ty,
			is_inbound: true,
			is_outbound: false,
		}
	}

	/// Creates an outbound-only parameter.
	pub fn outbound(name: impl Into<String>, ty: ValueType) -> Self {
		Self {
			name: name.into(),
			ty,
			is_inbound: false,
			is_outbound: true,
		}
	}

	/// Creates a parameter that is both inbound and outbound.
	pub fn in_out(name: impl Into<String>, ty: ValueType) -> Self {
		Self {
			name: name.into(),
			ty,
			is_inbound: true,
			is_outbound: true,
		}
	}
}

/// One callback slot of a callback-interface class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallbackDescriptor {
	/// Public name of the callback, shared across classes that declare
	/// the same conceptual callback.
	pub public_name: String,
	/// User-visible parameters in declaration order.
	pub parameters: Vec<ParameterDescriptor>,
	/// Return type.
	pub return_type: ReturnType,
	/// Documentation lines, byte-compared by the naming resolver.
	pub documentation: Vec<String>,
	/// Name of the owning class. Kept by value rather than as a
	/// back-reference so the resolver can mutate callbacks while reading
	/// sibling classes.
	pub owner: String,
	/// Public event name, set once by the naming resolver. `None` means
	/// the bare public name is used.
	pub event_name: Option<String>,
	/// Zero-based slot index, set once by the slot assigner.
	pub slot_index: Option<u32>,
	/// True if the callback carries no data and returns nothing, set by
	/// the naming resolver.
	pub is_basic_event: bool,
}

impl CallbackDescriptor {
	/// Creates an unresolved descriptor.
	pub fn new(
		owner: impl Into<String>,
		public_name: impl Into<String>,
		parameters: Vec<ParameterDescriptor>,
		return_type: ReturnType,
	) -> Self {
		Self {
			public_name: public_name.into(),
			parameters,
			return_type,
			documentation: Vec::new(),
			owner: owner.into(),
			event_name: None,
			slot_index: None,
			is_basic_event: false,
		}
	}

	/// Sets the documentation lines.
	pub fn with_documentation(mut self, lines: impl IntoIterator<Item = impl Into<String>>) -> Self {
		self.documentation = lines.into_iter().map(Into::into).collect();
		self
	}

	/// True if the callback takes no user-visible data and returns nothing.
	///
	/// This is the basic-event predicate; the resolver stores the result
	/// in [`CallbackDescriptor::is_basic_event`].
	pub fn carries_no_data(&self) -> bool {
		self.parameters.is_empty() && self.return_type.is_void()
	}

	/// The public symbol the emitted API uses for this callback: the
	/// resolved event name, or the bare public name for basic events.
	pub fn event_symbol(&self) -> &str {
		self.event_name.as_deref().unwrap_or(&self.public_name)
	}
}

/// Category of a class in the input model.
///
/// Only callback interfaces are in scope for this crate; other categories
/// pass through the resolver untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClassCategory {
	/// A struct of function pointers invoked by the native library.
	CallbackInterface,
	/// Any other class kind.
	Other,
}

/// One class of the input model with its owned callbacks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassDescriptor {
	/// Class name, used to qualify event names.
	pub name: String,
	/// Category; the resolver only touches callback interfaces.
	pub category: ClassCategory,
	/// Owned callbacks in declaration order.
	pub callbacks: Vec<CallbackDescriptor>,
	/// Externally supplied policy: the managed handle starts weak and is
	/// upgraded while the native reference count exceeds one. Classes
	/// without this policy keep a permanently strong handle.
	pub dynamic_handle_strength: bool,
}

impl ClassDescriptor {
	/// Creates a callback-interface class.
	pub fn callback_interface(name: impl Into<String>, callbacks: Vec<CallbackDescriptor>) -> Self {
		Self {
			name: name.into(),
			category: ClassCategory::CallbackInterface,
			callbacks,
			dynamic_handle_strength: false,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn carries_no_data_requires_void_and_no_params() {
		let basic = CallbackDescriptor::new("Frame", "Closed", Vec::new(), ReturnType::Void);
		assert!(basic.carries_no_data());

		let with_ret = CallbackDescriptor::new("Frame", "Closed", Vec::new(), ReturnType::Value(ValueType::Bool));
		assert!(!with_ret.carries_no_data());

		let with_param = CallbackDescriptor::new(
			"Frame",
			"Closed",
			vec![ParameterDescriptor::inbound("code", ValueType::Int)],
			ReturnType::Void,
		);
		assert!(!with_param.carries_no_data());
	}

	#[test]
	fn event_symbol_falls_back_to_public_name() {
		let mut cb = CallbackDescriptor::new("Frame", "OnLoad", Vec::new(), ReturnType::Void);
		assert_eq!(cb.event_symbol(), "OnLoad");
		cb.event_name = Some("CfxOnLoad".to_string());
		assert_eq!(cb.event_symbol(), "CfxOnLoad");
	}
}
