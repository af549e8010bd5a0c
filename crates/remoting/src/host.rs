//! Owning-process endpoint.
//!
//! The host owns the native object. It serves registration requests
//! from the proxy process by switching the native slot wiring, and when
//! a native callback fires it issues the forwarding RPC and blocks the
//! native call until the reply arrives.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use cfx_runtime::{CallOutcome, HandleOp, HandleOps, HandleTable, RawHandle, Value};
use parking_lot::Mutex;

use crate::calltable::CallTable;
use crate::error::{Error, Result};
use crate::transport::Transport;
use crate::wire::{CallKey, CounterIdGen, Payload, Reply, WireRequest, WireResponse};

/// Endpoint for the process that owns the native object.
pub struct HostEndpoint {
	calls: Arc<CallTable>,
	transport: Arc<dyn Transport>,
	id_gen: Mutex<CounterIdGen>,
	/// Class per adopted native object, established at construction
	/// time of the wrapper.
	objects: Mutex<HashMap<RawHandle, String>>,
	/// Native slots currently wired; the registration RPC switches
	/// membership here.
	registrations: Mutex<HashSet<(RawHandle, u32)>>,
}

impl HostEndpoint {
	/// Creates a host endpoint sending forwarding RPCs over `transport`.
	pub fn new(calls: Arc<CallTable>, transport: Arc<dyn Transport>) -> Self {
		Self {
			calls,
			transport,
			id_gen: Mutex::new(CounterIdGen::new()),
			objects: Mutex::new(HashMap::new()),
			registrations: Mutex::new(HashSet::new()),
		}
	}

	fn next_id(&self) -> u64 {
		self.id_gen.lock().next()
	}

	/// Records a native wrapper constructed on behalf of the proxy
	/// process: its foreign handle token and its class.
	pub fn adopt(&self, handle: RawHandle, class: impl Into<String>) {
		self.objects.lock().insert(handle, class.into());
	}

	/// Drops a native wrapper and all its registrations.
	pub fn evict(&self, handle: RawHandle) {
		self.objects.lock().remove(&handle);
		self.registrations.lock().retain(|(h, _)| *h != handle);
	}

	/// True if the native slot is currently wired.
	pub fn is_registered(&self, handle: RawHandle, slot: u32) -> bool {
		self.registrations.lock().contains(&(handle, slot))
	}

	/// Serves one request from the proxy process.
	pub fn handle_request(&self, request: WireRequest) -> WireResponse {
		let id = request.id;
		let reply = match self.dispatch(request.payload) {
			Ok(reply) => reply,
			Err(err) => {
				tracing::warn!(%err, "registration request failed");
				Reply::Error(err.to_string())
			}
		};
		WireResponse { id, reply }
	}

	fn dispatch(&self, payload: Payload) -> Result<Reply> {
		match payload {
			Payload::Register { handle, slot, active } => {
				self.set_callback(handle, slot, active)?;
				Ok(Reply::Ack)
			}
			Payload::Event { .. } | Payload::HandleSwitch { .. } => Err(Error::UnexpectedRequest),
		}
	}

	/// Enables or disables one native slot on the proxy's behalf.
	fn set_callback(&self, handle: RawHandle, slot: u32, active: bool) -> Result<()> {
		let class = self
			.objects
			.lock()
			.get(&handle)
			.cloned()
			.ok_or(Error::Runtime(cfx_runtime::Error::StaleHandle(handle)))?;
		let key = self.calls.key_for_slot(&class, slot)?.clone();
		let spec = self.calls.get(&key)?;
		if spec.host_only {
			return Err(Error::HostOnlyCallback(key));
		}
		let mut registrations = self.registrations.lock();
		if active {
			registrations.insert((handle, slot));
		} else {
			registrations.remove(&(handle, slot));
		}
		tracing::debug!(%key, ?handle, slot, active, "native slot switched");
		Ok(())
	}

	/// Forwards one native invocation to the proxy process and blocks
	/// until the reply.
	///
	/// An unregistered slot degrades to the same silent no-op as local
	/// dispatch on a disabled object: the native vtable entry is the
	/// no-op sentinel, so a call racing a disable simply gets defaults.
	pub fn fire(&self, handle: RawHandle, key: &CallKey, inbound: Vec<Value>) -> Result<CallOutcome> {
		let spec = self.calls.get(key)?;
		if spec.host_only {
			return Err(Error::HostOnlyCallback(key.clone()));
		}
		if !self.is_registered(handle, spec.slot) {
			tracing::trace!(%key, ?handle, "fire on unregistered slot");
			return Ok(CallOutcome::defaults(&spec.signature));
		}
		let request = WireRequest {
			id: self.next_id(),
			payload: Payload::Event {
				key: key.clone(),
				handle,
				inbound,
			},
		};
		match self.transport.roundtrip(request)?.reply {
			Reply::Event { outbound, ret } => {
				if outbound.len() != spec.signature.outbound_params().count()
					|| ret.is_some() == spec.signature.return_type.is_void()
				{
					return Err(Error::UnexpectedReply);
				}
				Ok(CallOutcome { outbound, ret })
			}
			Reply::Error(message) => Err(Error::Peer(message)),
			Reply::Ack => Err(Error::UnexpectedReply),
		}
	}
}

/// Routes handle operations by their remote tag: local operations hit
/// the local table, remote-tagged ones travel to the owning process's
/// table as a handle-switch RPC.
pub struct HandleOpRouter {
	local: Arc<HandleTable>,
	transport: Arc<dyn Transport>,
	id_gen: Mutex<CounterIdGen>,
}

impl HandleOpRouter {
	/// Creates a router over the local table and the channel to the
	/// owning process.
	pub fn new(local: Arc<HandleTable>, transport: Arc<dyn Transport>) -> Self {
		Self {
			local,
			transport,
			id_gen: Mutex::new(CounterIdGen::new()),
		}
	}
}

impl HandleOps for HandleOpRouter {
	fn switch(&self, handle: RawHandle, op: HandleOp) {
		if !op.remote {
			self.local.switch(handle, op);
			return;
		}
		let request = WireRequest {
			id: self.id_gen.lock().next(),
			payload: Payload::HandleSwitch {
				handle,
				switch: op.switch,
			},
		};
		// The count mutation already happened; a lost peer can only be
		// reported, not unwound.
		match self.transport.roundtrip(request) {
			Ok(WireResponse { reply: Reply::Ack, .. }) => {}
			Ok(WireResponse { reply, .. }) => {
				tracing::warn!(?handle, ?op, ?reply, "remote handle switch rejected");
			}
			Err(err) => {
				tracing::warn!(?handle, ?op, %err, "remote handle switch lost");
			}
		}
	}
}
