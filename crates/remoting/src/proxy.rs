//! Proxy-process endpoint.
//!
//! The proxy process holds the managed object the subscribers attach
//! to. Attaching the first handler to a slot sends the registration RPC
//! so the owning process wires the native slot; when a forwarded event
//! arrives, the proxy re-resolves the object from its handle table and
//! replays local dispatch exactly, including the disabled-object no-op
//! rule, then answers with the outbound parameters and return value.

use std::sync::Arc;

use cfx_runtime::{EventArgs, HandleTable, HandlerId, RawHandle, invoke_handle};
use parking_lot::Mutex;

use crate::calltable::CallTable;
use crate::error::{Error, Result};
use crate::transport::Transport;
use crate::wire::{CallKey, CounterIdGen, Payload, Reply, WireRequest, WireResponse};

/// Endpoint for the process holding the managed proxy object.
pub struct ProxyEndpoint {
	table: Arc<HandleTable>,
	calls: Arc<CallTable>,
	transport: Arc<dyn Transport>,
	id_gen: Mutex<CounterIdGen>,
	/// Serializes an attach/detach with its registration RPC. Without
	/// it a second subscriber can slip in between a failed registration
	/// and its rollback, staying attached with the native slot dark.
	registration: Mutex<()>,
}

impl ProxyEndpoint {
	/// Creates a proxy endpoint over the local handle table and the
	/// channel to the owning process.
	pub fn new(table: Arc<HandleTable>, calls: Arc<CallTable>, transport: Arc<dyn Transport>) -> Self {
		Self {
			table,
			calls,
			transport,
			id_gen: Mutex::new(CounterIdGen::new()),
			registration: Mutex::new(()),
		}
	}

	/// The handle table holding the proxy objects.
	pub fn table(&self) -> &Arc<HandleTable> {
		&self.table
	}

	fn next_id(&self) -> u64 {
		self.id_gen.lock().next()
	}

	/// Attaches a handler to a proxied object's callback.
	///
	/// The first handler on a slot triggers the registration RPC; if
	/// that fails the handler is detached again so local and native
	/// state stay consistent.
	pub fn subscribe(
		&self,
		handle: RawHandle,
		key: &CallKey,
		handler: impl Fn(&mut EventArgs) + Send + Sync + 'static,
	) -> Result<HandlerId> {
		let spec = self.calls.get(key)?;
		if spec.host_only {
			return Err(Error::HostOnlyCallback(key.clone()));
		}
		let object = self
			.table
			.resolve(handle)
			.ok_or(Error::Runtime(cfx_runtime::Error::StaleHandle(handle)))?;
		// Attach and registration must be one transition; a concurrent
		// subscriber observing `installed == false` between them would
		// skip its own registration RPC.
		let _transition = self.registration.lock();
		let (id, installed) = object.attach(spec.slot as usize, handler)?;
		if installed
			&& let Err(err) = self.register(handle, spec.slot, true)
		{
			let _ = object.detach(id);
			return Err(err);
		}
		Ok(id)
	}

	/// Detaches one handler; the last one on a slot triggers the
	/// deactivating registration RPC.
	pub fn unsubscribe(&self, handle: RawHandle, key: &CallKey, id: HandlerId) -> Result<()> {
		let spec = self.calls.get(key)?;
		let object = self
			.table
			.resolve(handle)
			.ok_or(Error::Runtime(cfx_runtime::Error::StaleHandle(handle)))?;
		let _transition = self.registration.lock();
		if object.detach(id)? {
			self.register(handle, spec.slot, false)?;
		}
		Ok(())
	}

	fn register(&self, handle: RawHandle, slot: u32, active: bool) -> Result<()> {
		let request = WireRequest {
			id: self.next_id(),
			payload: Payload::Register { handle, slot, active },
		};
		match self.transport.roundtrip(request)?.reply {
			Reply::Ack => Ok(()),
			Reply::Error(message) => Err(Error::Peer(message)),
			Reply::Event { .. } => Err(Error::UnexpectedReply),
		}
	}

	/// Serves one request from the owning process: a forwarded event or
	/// a remote-tagged handle switch.
	pub fn handle_request(&self, request: WireRequest) -> WireResponse {
		let id = request.id;
		let reply = match self.dispatch(request.payload) {
			Ok(reply) => reply,
			Err(err) => {
				tracing::warn!(%err, "forwarded request failed");
				Reply::Error(err.to_string())
			}
		};
		WireResponse { id, reply }
	}

	fn dispatch(&self, payload: Payload) -> Result<Reply> {
		match payload {
			Payload::Event { key, handle, inbound } => {
				let spec = self.calls.get(&key)?;
				tracing::trace!(%key, ?handle, "replaying forwarded event");
				let outcome = invoke_handle(&self.table, handle, spec.slot as usize, &spec.signature, inbound)?;
				Ok(Reply::Event {
					outbound: outcome.outbound,
					ret: outcome.ret,
				})
			}
			Payload::HandleSwitch { handle, switch } => {
				self.table.apply(handle, switch)?;
				Ok(Reply::Ack)
			}
			Payload::Register { .. } => Err(Error::UnexpectedRequest),
		}
	}
}
