//! Blocking transport seam.
//!
//! The forwarding protocol is strictly request/response and blocking
//! from the issuing side; no timeout or cancellation exists, so a lost
//! peer surfaces as a disconnect error to the blocked caller rather
//! than a stall forever on a half-open channel.

use bytes::Bytes;
use crossbeam_channel::{Receiver, Sender, unbounded};
use parking_lot::Mutex;

use crate::error::{Error, Result};
use crate::wire::{self, WireRequest, WireResponse};

/// One direction of a request/response channel.
pub trait Transport: Send + Sync {
	/// Sends a request and blocks until its reply arrives.
	fn roundtrip(&self, request: WireRequest) -> Result<WireResponse>;
}

/// Client half of an in-process byte channel pair.
///
/// Messages go through the full codec, so same-process wiring exercises
/// exactly the bytes a real IPC channel would carry.
pub struct InProcessTransport {
	/// Serializes concurrent roundtrips; the wire protocol has no
	/// interleaving, one exchange owns the channel at a time.
	exchange: Mutex<()>,
	tx: Sender<Bytes>,
	rx: Receiver<Bytes>,
}

/// Server half of an in-process byte channel pair.
pub struct InProcessServer {
	rx: Receiver<Bytes>,
	tx: Sender<Bytes>,
}

impl InProcessTransport {
	/// Builds a connected client/server pair.
	pub fn pair() -> (InProcessTransport, InProcessServer) {
		let (req_tx, req_rx) = unbounded();
		let (resp_tx, resp_rx) = unbounded();
		(
			InProcessTransport {
				exchange: Mutex::new(()),
				tx: req_tx,
				rx: resp_rx,
			},
			InProcessServer {
				rx: req_rx,
				tx: resp_tx,
			},
		)
	}
}

impl Transport for InProcessTransport {
	fn roundtrip(&self, request: WireRequest) -> Result<WireResponse> {
		let _guard = self.exchange.lock();
		let raw = wire::encode_request(&request)?;
		self.tx.send(raw).map_err(|_| Error::Disconnected)?;
		let raw = self.rx.recv().map_err(|_| Error::Disconnected)?;
		let response = wire::decode_response(&raw)?;
		if response.id != request.id {
			return Err(Error::IdMismatch {
				expected: request.id,
				got: response.id,
			});
		}
		Ok(response)
	}
}

impl InProcessServer {
	/// Blocks for the next request and answers it with `serve`.
	///
	/// Returns false when the client hung up; decode failures are
	/// errors, a clean disconnect is not.
	pub fn serve_next(&self, serve: impl FnOnce(WireRequest) -> WireResponse) -> Result<bool> {
		let raw = match self.rx.recv() {
			Ok(raw) => raw,
			Err(_) => return Ok(false),
		};
		let request = wire::decode_request(&raw)?;
		let response = serve(request);
		let raw = wire::encode_response(&response)?;
		self.tx.send(raw).map_err(|_| Error::Disconnected)?;
		Ok(true)
	}
}
