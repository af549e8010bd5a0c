//! Event data passed to handler chains.
//!
//! One `EventArgs` value is built per invocation, carrying every inbound
//! parameter. Handlers read inbound data, write outbound parameters and
//! set the return value at most once. After the handler chain ran the
//! value is invalidated; any later access is a contract violation and
//! panics, as does setting the return value twice - the guard against
//! non-deterministic last-write-wins semantics across handlers.

use std::sync::Arc;

use cfx_model::ReturnType;

use crate::dispatch::CallOutcome;
use crate::error::{Error, Result};
use crate::signature::CallSignature;
use crate::value::Value;

/// Mutable event data for one callback invocation.
#[derive(Debug)]
pub struct EventArgs {
	signature: Arc<CallSignature>,
	/// Current value per parameter, in declaration order. Inbound
	/// parameters start at the value the native frame passed; outbound
	/// only parameters start at their type default.
	values: Vec<Value>,
	ret: Option<Value>,
	return_value_set: bool,
	invalid: bool,
}

impl EventArgs {
	/// Builds the event data from the inbound values of the native
	/// frame, given in declaration order of the inbound parameters.
	pub(crate) fn new(signature: Arc<CallSignature>, inbound: Vec<Value>) -> Result<Self> {
		if inbound.len() != signature.inbound_len() {
			return Err(Error::ArityMismatch {
				expected: signature.inbound_len(),
				got: inbound.len(),
			});
		}
		let mut inbound = inbound.into_iter();
		let values = signature
			.params
			.iter()
			.map(|p| {
				if p.inbound {
					inbound.next().expect("arity checked above")
				} else {
					Value::default_of(p.ty)
				}
			})
			.collect();
		Ok(Self {
			signature,
			values,
			ret: None,
			return_value_set: false,
			invalid: false,
		})
	}

	fn check_access(&self) {
		if self.invalid {
			panic!("event args accessed outside of the callback they belong to");
		}
	}

	fn param_index(&self, name: &str) -> usize {
		self.signature
			.params
			.iter()
			.position(|p| p.name == name)
			.unwrap_or_else(|| panic!("no parameter named {name:?}"))
	}

	/// Reads an inbound parameter.
	///
	/// # Panics
	/// If the args are invalidated, the parameter is unknown, or it is
	/// not inbound.
	pub fn get(&self, name: &str) -> &Value {
		self.check_access();
		let index = self.param_index(name);
		if !self.signature.params[index].inbound {
			panic!("parameter {name:?} is not inbound");
		}
		&self.values[index]
	}

	/// Writes an outbound parameter.
	///
	/// # Panics
	/// If the args are invalidated, the parameter is unknown or not
	/// outbound, or the value type does not match the signature.
	pub fn set(&mut self, name: &str, value: Value) {
		self.check_access();
		let index = self.param_index(name);
		let param = &self.signature.params[index];
		if !param.outbound {
			panic!("parameter {name:?} is not outbound");
		}
		if value.ty() != param.ty {
			panic!("parameter {name:?} expects {:?}, got {:?}", param.ty, value.ty());
		}
		self.values[index] = value;
	}

	/// Sets the return value.
	///
	/// # Panics
	/// If called more than once per callback (including from different
	/// handlers), on a void callback, or on a type mismatch.
	pub fn set_return_value(&mut self, value: Value) {
		self.check_access();
		let ReturnType::Value(ty) = self.signature.return_type else {
			panic!("callback returns no value");
		};
		if self.return_value_set {
			panic!("the return value has already been set");
		}
		if value.ty() != ty {
			panic!("return value expects {:?}, got {:?}", ty, value.ty());
		}
		self.return_value_set = true;
		self.ret = Some(value);
	}

	/// Marks the args invalid for any further access.
	pub(crate) fn invalidate(&mut self) {
		self.invalid = true;
	}

	/// Collects outbound parameters and the return value for the native
	/// frame. Unset outbound-only parameters yield their type default;
	/// unset in-out parameters keep the inbound value; an unset return
	/// slot yields the default of the return type.
	pub(crate) fn into_outcome(self) -> CallOutcome {
		let outbound = self
			.signature
			.params
			.iter()
			.zip(&self.values)
			.filter(|(p, _)| p.outbound)
			.map(|(_, v)| v.clone())
			.collect();
		let ret = match self.signature.return_type {
			ReturnType::Void => None,
			ReturnType::Value(ty) => Some(self.ret.unwrap_or_else(|| Value::default_of(ty))),
		};
		CallOutcome { outbound, ret }
	}
}

#[cfg(test)]
mod tests {
	use cfx_model::{CallbackDescriptor, ParameterDescriptor, ValueType};

	use super::*;

	fn signature() -> Arc<CallSignature> {
		let cb = CallbackDescriptor::new(
			"Frame",
			"OnQuery",
			vec![
				ParameterDescriptor::inbound("query", ValueType::Str),
				ParameterDescriptor::in_out("persistent", ValueType::Bool),
				ParameterDescriptor::outbound("response", ValueType::Str),
			],
			ReturnType::Value(ValueType::Bool),
		);
		Arc::new(CallSignature::from_descriptor(&cb))
	}

	fn args() -> EventArgs {
		EventArgs::new(
			signature(),
			vec![Value::Str("q".to_string()), Value::Bool(true)],
		)
		.unwrap()
	}

	#[test]
	fn inbound_values_are_readable() {
		let args = args();
		assert_eq!(args.get("query"), &Value::Str("q".to_string()));
		assert_eq!(args.get("persistent"), &Value::Bool(true));
	}

	#[test]
	fn unset_outbound_falls_back_to_defaults_and_passthrough() {
		let outcome = args().into_outcome();
		// In-out keeps the inbound value, out-only defaults, unset
		// return defaults.
		assert_eq!(outcome.outbound, vec![Value::Bool(true), Value::Str(String::new())]);
		assert_eq!(outcome.ret, Some(Value::Bool(false)));
	}

	#[test]
	fn set_values_reach_the_outcome_in_declaration_order() {
		let mut args = args();
		args.set("response", Value::Str("ok".to_string()));
		args.set("persistent", Value::Bool(false));
		args.set_return_value(Value::Bool(true));
		let outcome = args.into_outcome();
		assert_eq!(outcome.outbound, vec![Value::Bool(false), Value::Str("ok".to_string())]);
		assert_eq!(outcome.ret, Some(Value::Bool(true)));
	}

	#[test]
	fn arity_mismatch_is_an_error() {
		let err = EventArgs::new(signature(), vec![Value::Str("q".to_string())]).unwrap_err();
		assert_eq!(err, Error::ArityMismatch { expected: 2, got: 1 });
	}

	#[test]
	#[should_panic(expected = "already been set")]
	fn second_return_value_set_panics() {
		let mut args = args();
		args.set_return_value(Value::Bool(true));
		args.set_return_value(Value::Bool(false));
	}

	#[test]
	#[should_panic(expected = "not outbound")]
	fn writing_an_inbound_only_parameter_panics() {
		let mut args = args();
		args.set("query", Value::Str("no".to_string()));
	}

	#[test]
	#[should_panic(expected = "outside of the callback")]
	fn access_after_invalidation_panics() {
		let mut args = args();
		args.invalidate();
		let _ = args.get("query");
	}

	#[test]
	#[should_panic(expected = "expects Bool")]
	fn type_mismatch_on_set_panics() {
		let mut args = args();
		args.set("persistent", Value::Int(1));
	}
}
