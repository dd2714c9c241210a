//! Handle bridge between libzmq contexts and `org.zeromq.ZMQ$Context`.
//!
//! A managed context object keeps the native context pointer in a `long`
//! field. This crate resolves that field once per class, creates and
//! terminates contexts through it, forwards the context options, and lets
//! managed code receive libzmq's asynchronous error reports on libzmq's own
//! threads.
//!
//! The bridge is runtime-agnostic: [`ManagedObject`], [`ManagedVm`] and
//! [`CallbackTarget`] describe what it needs from the managed side. With the
//! `jni` feature the crate implements them on top of the `jni` crate and
//! exports the native methods of the Java binding.
//!
//! # Features
//!
//! - `jni`: JNI implementations and the `Java_org_zeromq_*` exports.
//! - `libzmq-link`: link the system libzmq. Without it every native call
//!   fails with `ENOTSUP`.
//! - `error-handler`: use `zmq_error_handler` (libzmq 4.2.3 or later).

pub mod accessor;
pub mod callback;
pub mod config;
pub mod context;
pub mod error;
pub mod exception;
pub mod logging;
pub mod object;
pub mod runtime;

#[cfg(feature = "jni")]
pub mod jvm;

pub use accessor::HandleAccessor;
pub use callback::{error_trampoline, CallbackTarget, ErrorCallback, Registration};
pub use config::{BindingConfig, BridgeConfig, LoggingConfig, CONFIG_ENV};
pub use context::ContextBridge;
pub use error::{BridgeError, BridgeResult};
pub use exception::{ExceptionSink, ManagedException};
pub use object::ManagedObject;
pub use runtime::{AttachGuard, Attachment, ManagedVm};
