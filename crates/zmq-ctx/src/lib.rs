//! Safe Rust bindings for the libzmq context API.
//!
//! This crate wraps the handful of libzmq calls a language binding needs to
//! manage a context: creation, termination, context options and the error
//! handler extension. It converts raw `zmq_errno()` values into typed errors
//! and keeps the native context pointer behind a non-forgeable handle.
//!
//! # Architecture
//!
//! - [`handle`]: the owned [`ContextHandle`] newtype
//! - [`error`]: errno translation ([`ZmqError`], [`ErrorKind`])
//! - [`version`]: library version and capability gating
//! - [`api`]: the [`ContextApi`] seam and the [`LibZmq`] implementation
//!
//! # Example
//!
//! ```ignore
//! use zmq_ctx::{ContextApi, ContextOption, LibZmq, ZmqResult};
//!
//! fn limited_context(api: &LibZmq) -> ZmqResult<()> {
//!     let ctx = api.init(1)?;
//!     api.set(&ctx, ContextOption::MaxSockets, 256)?;
//!     api.term(ctx)
//! }
//! ```

pub mod api;
pub mod error;
pub mod handle;
pub mod version;

pub use api::{ContextApi, ContextOption, ErrorHandlerFn, LibZmq};
pub use error::{ErrorKind, ZmqError, ZmqResult, ZMQ_HAUSNUMERO};
pub use handle::ContextHandle;
pub use version::{Capability, NativeVersion};
