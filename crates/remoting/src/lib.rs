//! Cross-process callback forwarding.
//!
//! A callback-interface object can be proxied into a second process:
//! the native object stays with the owning (host) process while the
//! subscribers live on a proxy object elsewhere. This crate implements
//! the two RPCs that make the proxy transparent:
//! * registration: slot index plus an active flag, sent to the host,
//!   which enables or disables the native slot on the caller's behalf
//! * forwarding: when the native callback fires, the host sends the
//!   handle token and every inbound parameter to the proxy process,
//!   which replays local dispatch and answers with the outbound
//!   parameters and the return value
//!
//! Forwarding is synchronous from the native call's point of view; the
//! original call blocks until the reply arrives. Parameter order and
//! the in/out split are exactly those of local dispatch, so native code
//! cannot tell whether a callback was serviced locally or forwarded.

pub mod calltable;
pub mod error;
pub mod host;
pub mod proxy;
pub mod transport;
pub mod wire;

pub use calltable::{CallSpec, CallTable};
pub use error::{Error, Result};
pub use host::{HandleOpRouter, HostEndpoint};
pub use proxy::ProxyEndpoint;
pub use transport::{InProcessServer, InProcessTransport, Transport};
pub use wire::{CallKey, CounterIdGen, Payload, Reply, WireRequest, WireResponse};
