//! Runtime values crossing the callback boundary.

use cfx_model::ValueType;
use serde::{Deserialize, Serialize};

use crate::handle::RawHandle;

/// One marshaled value, mirroring [`ValueType`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
	/// Boolean flag.
	Bool(bool),
	/// Signed integer.
	Int(i64),
	/// Unsigned integer.
	UInt(u64),
	/// Floating point number.
	Float(f64),
	/// UTF-8 string.
	Str(String),
	/// Raw byte buffer.
	Bytes(Vec<u8>),
	/// Handle token for another wrapped object.
	Object(RawHandle),
}

impl Value {
	/// The default/zero value of a type, written to every outbound
	/// parameter and the return slot when a callback fires on a disabled
	/// or disposed object.
	pub fn default_of(ty: ValueType) -> Value {
		match ty {
			ValueType::Bool => Value::Bool(false),
			ValueType::Int => Value::Int(0),
			ValueType::UInt => Value::UInt(0),
			ValueType::Float => Value::Float(0.0),
			ValueType::Str => Value::Str(String::new()),
			ValueType::Bytes => Value::Bytes(Vec::new()),
			ValueType::Object => Value::Object(RawHandle::NULL),
		}
	}

	/// The type of this value.
	pub fn ty(&self) -> ValueType {
		match self {
			Value::Bool(_) => ValueType::Bool,
			Value::Int(_) => ValueType::Int,
			Value::UInt(_) => ValueType::UInt,
			Value::Float(_) => ValueType::Float,
			Value::Str(_) => ValueType::Str,
			Value::Bytes(_) => ValueType::Bytes,
			Value::Object(_) => ValueType::Object,
		}
	}
}
