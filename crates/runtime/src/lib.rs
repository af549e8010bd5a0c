//! Object lifetime and local dispatch for native callback interfaces.
//!
//! A callback-interface object lives on both sides of a language
//! boundary: a native struct of function pointers holds a reference
//! count, and a managed wrapper owns the handlers. This crate implements
//! the protocol that keeps the two alive together:
//! * [`HandleTable`]: a generation-checked arena resolving opaque handle
//!   tokens to managed objects, with strong (rooted) and weak entries
//! * [`NativeRef`]: the reference-count state machine that upgrades,
//!   downgrades and frees the handle as the count crosses thresholds
//! * [`CallbackObject`]: per-instance slot state and the dispatch path a
//!   native invocation takes, including the graceful no-op for objects
//!   torn down while a call was in flight
//!
//! Native invocations may arrive on arbitrary native-owned threads,
//! concurrently with attach/detach and with teardown; nothing here
//! assumes a single thread.

pub mod dispatch;
pub mod error;
pub mod event;
pub mod handle;
pub mod lifecycle;
pub mod signature;
pub mod value;

pub use dispatch::{CallOutcome, CallbackObject, Handler, HandlerId, invoke_handle};
pub use error::{Error, Result};
pub use event::EventArgs;
pub use handle::{HandleOp, HandleOps, HandleSwitch, HandleTable, RawHandle};
pub use lifecycle::{NativeRef, ReleaseOutcome, StrengthPolicy, WrapperKind};
pub use signature::{CallSignature, ParamSpec};
pub use value::Value;
