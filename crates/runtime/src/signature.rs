//! Runtime call signatures.
//!
//! The runtime mirror of a callback descriptor: parameter names, types
//! and direction, plus the return type. Local dispatch and remote
//! forwarding both consume the same signature, which is what keeps the
//! two contracts behaviorally indistinguishable to native code.

use cfx_model::{CallbackDescriptor, ReturnType, ValueType};

/// One parameter of a call signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamSpec {
	/// Parameter name.
	pub name: String,
	/// Marshaled type.
	pub ty: ValueType,
	/// Data flows in from the native caller.
	pub inbound: bool,
	/// Data flows back out to the native caller.
	pub outbound: bool,
}

/// Signature of one callback slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSignature {
	/// User-visible parameters in declaration order. The implicit self
	/// reference is not part of the signature.
	pub params: Vec<ParamSpec>,
	/// Return type.
	pub return_type: ReturnType,
}

impl CallSignature {
	/// Builds the runtime signature of a descriptor.
	pub fn from_descriptor(cb: &CallbackDescriptor) -> Self {
		Self {
			params: cb
				.parameters
				.iter()
				.map(|p| ParamSpec {
					name: p.name.clone(),
					ty: p.ty,
					inbound: p.is_inbound,
					outbound: p.is_outbound,
				})
				.collect(),
			return_type: cb.return_type,
		}
	}

	/// Number of inbound parameters, i.e. the arity of an invocation.
	pub fn inbound_len(&self) -> usize {
		self.params.iter().filter(|p| p.inbound).count()
	}

	/// Outbound parameters in declaration order.
	pub fn outbound_params(&self) -> impl Iterator<Item = &ParamSpec> {
		self.params.iter().filter(|p| p.outbound)
	}

	/// True if the callback carries no data and returns nothing.
	pub fn is_basic(&self) -> bool {
		self.params.is_empty() && self.return_type.is_void()
	}
}
