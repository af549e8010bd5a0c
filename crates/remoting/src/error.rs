use thiserror::Error;

use crate::wire::CallKey;

/// Errors from the forwarding layer.
///
/// There is no graceful-degradation path for a lost peer: a closed
/// channel surfaces as [`Error::Disconnected`] to the blocked caller,
/// which is this implementation's answer to the protocol's open
/// question on delivery failure.
#[derive(Error, Debug)]
pub enum Error {
	/// The peer closed the channel while a call was pending.
	#[error("transport disconnected")]
	Disconnected,
	/// The reply carried a different id than the request. The protocol
	/// is strictly serial request/response; this is a peer bug.
	#[error("response id {got} does not match request id {expected}")]
	IdMismatch {
		/// Id the request was sent with.
		expected: u64,
		/// Id the reply carried.
		got: u64,
	},
	/// Message could not be encoded.
	#[error("failed to encode message: {0}")]
	Encode(#[from] rmp_serde::encode::Error),
	/// Message could not be decoded.
	#[error("failed to decode message: {0}")]
	Decode(#[from] rmp_serde::decode::Error),
	/// No such callback in the resolved model.
	#[error("unknown call {0}")]
	UnknownCall(CallKey),
	/// The callback is restricted to the owning process.
	#[error("{0} is host-only and cannot cross processes")]
	HostOnlyCallback(CallKey),
	/// The peer answered with an error reply.
	#[error("peer reported: {0}")]
	Peer(String),
	/// A payload kind this endpoint does not serve.
	#[error("unexpected request payload")]
	UnexpectedRequest,
	/// A reply whose shape does not match the call signature.
	#[error("unexpected reply shape")]
	UnexpectedReply,
	/// Error from the dispatch layer.
	#[error(transparent)]
	Runtime(#[from] cfx_runtime::Error),
	/// Error from the resolved model.
	#[error(transparent)]
	Model(#[from] cfx_model::Error),
}

/// Result alias for remoting operations.
pub type Result<T> = std::result::Result<T, Error>;
