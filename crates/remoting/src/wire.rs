//! Wire messages and codec.
//!
//! Fixed field order, no versioning, no optional fields: the request and
//! response shapes are generated in lockstep with the local dispatch
//! signature and must never diverge from it. An event request carries
//! the handle token and then the inbound parameters in declaration
//! order; its reply carries the outbound parameters in declaration
//! order and then the return value if the signature has one.

use std::fmt;

use bytes::Bytes;
use cfx_runtime::{HandleSwitch, RawHandle, Value};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Key of one forwarded callback: owner class plus callback name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallKey {
	/// Owning class name.
	pub class: String,
	/// Callback public name.
	pub callback: String,
}

impl CallKey {
	/// Creates a key.
	pub fn new(class: impl Into<String>, callback: impl Into<String>) -> Self {
		Self {
			class: class.into(),
			callback: callback.into(),
		}
	}
}

impl fmt::Display for CallKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}::{}", self.class, self.callback)
	}
}

/// Request payloads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Payload {
	/// Registration RPC: enable or disable one native slot on the
	/// owning process's side.
	Register {
		/// Token of the proxied object.
		handle: RawHandle,
		/// Slot to switch.
		slot: u32,
		/// True to enable, false to disable.
		active: bool,
	},
	/// Forwarding RPC: replay one native invocation in the proxy
	/// process.
	Event {
		/// Which callback fired.
		key: CallKey,
		/// Token of the proxied object.
		handle: RawHandle,
		/// Inbound parameters in declaration order.
		inbound: Vec<Value>,
	},
	/// A remote-tagged handle operation routed to the owning process's
	/// handle table.
	HandleSwitch {
		/// Token whose strength changes.
		handle: RawHandle,
		/// The transition.
		switch: HandleSwitch,
	},
}

/// One request on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireRequest {
	/// Pairing id; the reply echoes it.
	pub id: u64,
	/// The payload.
	pub payload: Payload,
}

/// Reply payloads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Reply {
	/// Registration or handle switch done.
	Ack,
	/// Result of a forwarded invocation.
	Event {
		/// Outbound parameters in declaration order.
		outbound: Vec<Value>,
		/// Return value, present iff the signature returns one.
		ret: Option<Value>,
	},
	/// The serving endpoint failed; the message is the peer's error.
	Error(String),
}

/// One response on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireResponse {
	/// Echo of the request id.
	pub id: u64,
	/// The reply.
	pub reply: Reply,
}

/// Sequential request id generator.
#[derive(Debug, Default, Clone, Copy)]
pub struct CounterIdGen(u64);

impl CounterIdGen {
	/// Creates a counter starting at 0.
	pub const fn new() -> Self {
		Self(0)
	}

	/// Next unique id.
	#[allow(clippy::should_implement_trait, reason = "convention")]
	pub fn next(&mut self) -> u64 {
		let id = self.0;
		self.0 += 1;
		id
	}
}

/// Encodes a request to MessagePack bytes.
pub fn encode_request(request: &WireRequest) -> Result<Bytes> {
	Ok(Bytes::from(rmp_serde::to_vec(request)?))
}

/// Decodes a request from MessagePack bytes.
pub fn decode_request(raw: &[u8]) -> Result<WireRequest> {
	Ok(rmp_serde::from_slice(raw)?)
}

/// Encodes a response to MessagePack bytes.
pub fn encode_response(response: &WireResponse) -> Result<Bytes> {
	Ok(Bytes::from(rmp_serde::to_vec(response)?))
}

/// Decodes a response from MessagePack bytes.
pub fn decode_response(raw: &[u8]) -> Result<WireResponse> {
	Ok(rmp_serde::from_slice(raw)?)
}
