//! The libzmq context API seam.
//!
//! [`ContextApi`] is the narrow set of native calls the binding makes. The
//! production implementation is [`LibZmq`]; tests substitute a fake that
//! records calls and can raise errors on demand.

use crate::error::{ZmqError, ZmqResult};
use crate::handle::ContextHandle;
use crate::version::NativeVersion;
use std::ffi::{c_char, c_int, c_void};

/// Native error callback signature expected by `zmq_error_handler`.
///
/// Arguments are the error number, the endpoint the error relates to (may
/// be null) and the opaque data registered with the callback.
pub type ErrorHandlerFn =
    unsafe extern "C" fn(code: c_int, host: *const c_char, data: *mut c_void);

/// Context options understood by `zmq_ctx_set` / `zmq_ctx_get`.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContextOption {
    /// `ZMQ_IO_THREADS`
    IoThreads = 1,
    /// `ZMQ_MAX_SOCKETS`
    MaxSockets = 2,
}

impl ContextOption {
    /// Returns the native option identifier.
    pub const fn as_raw(self) -> c_int {
        self as c_int
    }
}

/// Native context operations.
///
/// Every failing call must capture the library's last error number before
/// returning, since any further native call may overwrite it.
pub trait ContextApi: Send + Sync {
    /// Returns the version of the loaded library.
    fn version(&self) -> NativeVersion;

    /// Creates a context with `io_threads` background I/O threads.
    fn init(&self, io_threads: i32) -> ZmqResult<ContextHandle>;

    /// Terminates a context. The handle is consumed even on failure.
    fn term(&self, ctx: ContextHandle) -> ZmqResult<()>;

    /// Sets a context option.
    fn set(&self, ctx: &ContextHandle, option: ContextOption, value: i32) -> ZmqResult<()>;

    /// Reads a context option.
    fn get(&self, ctx: &ContextHandle, option: ContextOption) -> ZmqResult<i32>;

    /// Installs (or, with `None`, removes) the context's error callback.
    ///
    /// # Safety
    ///
    /// `data` is handed to `callback` on arbitrary native threads. It must
    /// stay valid until the callback is replaced or the context terminated.
    unsafe fn set_error_handler(
        &self,
        ctx: &ContextHandle,
        callback: Option<ErrorHandlerFn>,
        data: *mut c_void,
    ) -> ZmqResult<()>;

    /// Returns the message for an error number.
    fn strerror(&self, code: i32) -> String {
        ZmqError::from_code(code).kind().description().to_string()
    }
}

/// The system libzmq.
///
/// Without the `libzmq-link` feature every call fails with `ENOTSUP` and
/// [`version`](ContextApi::version) reports `0.0.0`, so capability-gated
/// operations are refused before any native call.
#[derive(Debug, Default, Clone, Copy)]
pub struct LibZmq;

impl LibZmq {
    pub fn new() -> Self {
        LibZmq
    }
}

#[cfg(feature = "libzmq-link")]
mod sys {
    use super::ErrorHandlerFn;
    use std::ffi::{c_char, c_int, c_void};

    extern "C" {
        pub fn zmq_version(major: *mut c_int, minor: *mut c_int, patch: *mut c_int);
        pub fn zmq_errno() -> c_int;
        pub fn zmq_strerror(errnum: c_int) -> *const c_char;
        pub fn zmq_init(io_threads: c_int) -> *mut c_void;
        pub fn zmq_term(context: *mut c_void) -> c_int;
        pub fn zmq_ctx_set(context: *mut c_void, option: c_int, optval: c_int) -> c_int;
        pub fn zmq_ctx_get(context: *mut c_void, option: c_int) -> c_int;
        #[cfg(feature = "error-handler")]
        pub fn zmq_error_handler(
            context: *mut c_void,
            handler: Option<ErrorHandlerFn>,
            data: *mut c_void,
        ) -> c_int;
    }
}

#[cfg(feature = "libzmq-link")]
fn last_error() -> ZmqError {
    ZmqError::from_code(unsafe { sys::zmq_errno() })
}

#[cfg(feature = "libzmq-link")]
impl ContextApi for LibZmq {
    fn version(&self) -> NativeVersion {
        let (mut major, mut minor, mut patch) = (0, 0, 0);
        unsafe { sys::zmq_version(&mut major, &mut minor, &mut patch) };
        NativeVersion::new(major, minor, patch)
    }

    fn init(&self, io_threads: i32) -> ZmqResult<ContextHandle> {
        let ptr = unsafe { sys::zmq_init(io_threads) };
        let err = last_error();
        // Safety: a non-null result is a fresh context owned by nobody else.
        unsafe { ContextHandle::from_raw(ptr) }.ok_or(err)
    }

    fn term(&self, ctx: ContextHandle) -> ZmqResult<()> {
        let rc = unsafe { sys::zmq_term(ctx.as_ptr()) };
        if rc == 0 {
            Ok(())
        } else {
            Err(last_error())
        }
    }

    fn set(&self, ctx: &ContextHandle, option: ContextOption, value: i32) -> ZmqResult<()> {
        let rc = unsafe { sys::zmq_ctx_set(ctx.as_ptr(), option.as_raw(), value) };
        if rc == 0 {
            Ok(())
        } else {
            Err(last_error())
        }
    }

    fn get(&self, ctx: &ContextHandle, option: ContextOption) -> ZmqResult<i32> {
        let value = unsafe { sys::zmq_ctx_get(ctx.as_ptr(), option.as_raw()) };
        if value < 0 {
            Err(last_error())
        } else {
            Ok(value)
        }
    }

    #[cfg(feature = "error-handler")]
    unsafe fn set_error_handler(
        &self,
        ctx: &ContextHandle,
        callback: Option<ErrorHandlerFn>,
        data: *mut c_void,
    ) -> ZmqResult<()> {
        let rc = sys::zmq_error_handler(ctx.as_ptr(), callback, data);
        if rc == 0 {
            Ok(())
        } else {
            Err(last_error())
        }
    }

    #[cfg(not(feature = "error-handler"))]
    unsafe fn set_error_handler(
        &self,
        _ctx: &ContextHandle,
        _callback: Option<ErrorHandlerFn>,
        _data: *mut c_void,
    ) -> ZmqResult<()> {
        log::warn!("LibZmq::set_error_handler called without error-handler feature");
        Err(ZmqError::not_supported())
    }

    fn strerror(&self, code: i32) -> String {
        let msg = unsafe { sys::zmq_strerror(code) };
        if msg.is_null() {
            return ZmqError::from_code(code).kind().description().to_string();
        }
        unsafe { std::ffi::CStr::from_ptr(msg) }
            .to_string_lossy()
            .into_owned()
    }
}

#[cfg(not(feature = "libzmq-link"))]
impl ContextApi for LibZmq {
    fn version(&self) -> NativeVersion {
        NativeVersion::default()
    }

    fn init(&self, _io_threads: i32) -> ZmqResult<ContextHandle> {
        log::warn!("LibZmq::init called without libzmq-link feature");
        Err(ZmqError::not_supported())
    }

    fn term(&self, _ctx: ContextHandle) -> ZmqResult<()> {
        log::warn!("LibZmq::term called without libzmq-link feature");
        Err(ZmqError::not_supported())
    }

    fn set(&self, _ctx: &ContextHandle, _option: ContextOption, _value: i32) -> ZmqResult<()> {
        log::warn!("LibZmq::set called without libzmq-link feature");
        Err(ZmqError::not_supported())
    }

    fn get(&self, _ctx: &ContextHandle, _option: ContextOption) -> ZmqResult<i32> {
        log::warn!("LibZmq::get called without libzmq-link feature");
        Err(ZmqError::not_supported())
    }

    unsafe fn set_error_handler(
        &self,
        _ctx: &ContextHandle,
        _callback: Option<ErrorHandlerFn>,
        _data: *mut c_void,
    ) -> ZmqResult<()> {
        log::warn!("LibZmq::set_error_handler called without libzmq-link feature");
        Err(ZmqError::not_supported())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_option_identifiers() {
        assert_eq!(ContextOption::IoThreads.as_raw(), 1);
        assert_eq!(ContextOption::MaxSockets.as_raw(), 2);
    }

    #[cfg(not(feature = "libzmq-link"))]
    #[test]
    fn test_unlinked_stub() {
        let api = LibZmq::new();
        assert_eq!(api.version(), NativeVersion::default());

        let err = api.init(1).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotSupported);
    }

    #[test]
    fn test_default_strerror_uses_description() {
        struct Unlinked;

        impl ContextApi for Unlinked {
            fn version(&self) -> NativeVersion {
                NativeVersion::default()
            }
            fn init(&self, _io_threads: i32) -> ZmqResult<ContextHandle> {
                Err(ZmqError::not_supported())
            }
            fn term(&self, _ctx: ContextHandle) -> ZmqResult<()> {
                Ok(())
            }
            fn set(&self, _: &ContextHandle, _: ContextOption, _: i32) -> ZmqResult<()> {
                Ok(())
            }
            fn get(&self, _: &ContextHandle, _: ContextOption) -> ZmqResult<i32> {
                Ok(0)
            }
            unsafe fn set_error_handler(
                &self,
                _: &ContextHandle,
                _: Option<ErrorHandlerFn>,
                _: *mut c_void,
            ) -> ZmqResult<()> {
                Ok(())
            }
        }

        assert_eq!(
            Unlinked.strerror(crate::error::ETERM),
            ErrorKind::Terminated.description()
        );
    }
}
