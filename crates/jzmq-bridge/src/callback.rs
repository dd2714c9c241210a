//! Error callbacks from libzmq into managed code.
//!
//! Registering a handler produces a [`Registration`]: the runtime handle
//! needed to attach libzmq's threads plus the runtime-specific callback
//! (target reference, resolved method, error translator). The bridge keeps
//! the registration boxed and hands its address to libzmq as callback data;
//! libzmq then calls [`error_trampoline`] with it from its own threads.

use crate::config::BindingConfig;
use crate::error::BridgeResult;
use crate::runtime::{AttachGuard, ManagedVm};
use std::borrow::Cow;
use std::ffi::{c_char, c_int, c_void, CStr};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

/// The managed side of an installed error handler.
pub trait ErrorCallback: Send + Sync {
    /// Delivers an error to the managed target and returns its reply.
    ///
    /// Called on a thread attached to the runtime. Implementations must not
    /// leave managed exceptions pending.
    fn report_error(&self, code: i32, host: &str) -> BridgeResult<i32>;
}

/// A managed object offered as an error handler.
///
/// Resolution is split so the bridge can refuse targets without the report
/// method while treating a missing translator as non-fatal.
pub trait CallbackTarget {
    /// Resolved report method.
    type Method;
    /// Resolved error-number translator.
    type Translator;

    /// Looks up the report method on the target's class.
    fn report_method(&mut self, bindings: &BindingConfig) -> BridgeResult<Self::Method>;

    /// Looks up the translator turning error numbers into managed objects.
    fn translator(&mut self, bindings: &BindingConfig) -> BridgeResult<Self::Translator>;

    /// Pins the target beyond the current call and builds the registration.
    fn pin(
        self,
        method: Self::Method,
        translator: Option<Self::Translator>,
    ) -> BridgeResult<Registration>;
}

/// An installed error handler.
///
/// Dropping the registration releases the pinned target.
pub struct Registration {
    vm: Arc<dyn ManagedVm>,
    callback: Box<dyn ErrorCallback>,
}

impl Registration {
    pub fn new(vm: Arc<dyn ManagedVm>, callback: Box<dyn ErrorCallback>) -> Self {
        Self { vm, callback }
    }

    /// Delivers an error from the current thread.
    ///
    /// Attaches the thread for the duration of the call if needed. Returns
    /// the target's reply, or `None` when the thread could not be attached
    /// or the callback failed.
    pub fn dispatch(&self, code: i32, host: &str) -> Option<i32> {
        let _guard = match AttachGuard::enter(self.vm.as_ref()) {
            Ok(guard) => guard,
            Err(err) => {
                log::error!("cannot deliver error {} from {}: {}", code, host, err);
                return None;
            }
        };

        match self.callback.report_error(code, host) {
            Ok(reply) => {
                log::trace!("error {} from {} reported, reply {}", code, host, reply);
                Some(reply)
            }
            Err(err) => {
                log::warn!("error handler failed for error {} from {}: {}", code, host, err);
                None
            }
        }
    }
}

/// Callback installed with `zmq_error_handler`.
///
/// # Safety
///
/// `data` must be null or point to a live [`Registration`]; `host` must be
/// null or a NUL-terminated string.
pub unsafe extern "C" fn error_trampoline(code: c_int, host: *const c_char, data: *mut c_void) {
    if data.is_null() {
        return;
    }
    let registration = &*(data as *const Registration);
    let host = if host.is_null() {
        Cow::Borrowed("")
    } else {
        CStr::from_ptr(host).to_string_lossy()
    };

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| registration.dispatch(code, &host)));
    if outcome.is_err() {
        log::error!("error handler panicked for error {} from {}", code, host);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BridgeError;
    use crate::runtime::Attachment;
    use std::cell::Cell;
    use std::ffi::CString;
    use std::ptr;
    use std::sync::Mutex;

    thread_local! {
        static ATTACHED: Cell<bool> = const { Cell::new(false) };
    }

    struct ThreadVm;

    impl ManagedVm for ThreadVm {
        fn attachment(&self) -> Attachment {
            if ATTACHED.with(Cell::get) {
                Attachment::Attached
            } else {
                Attachment::Detached
            }
        }

        fn attach_current_thread(&self) -> BridgeResult<()> {
            ATTACHED.with(|a| a.set(true));
            Ok(())
        }

        fn detach_current_thread(&self) {
            ATTACHED.with(|a| a.set(false));
        }
    }

    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<(i32, String, bool)>>,
        panic: bool,
    }

    impl ErrorCallback for Arc<Recorder> {
        fn report_error(&self, code: i32, host: &str) -> BridgeResult<i32> {
            if self.panic {
                panic!("target threw");
            }
            let attached = ATTACHED.with(Cell::get);
            self.calls
                .lock()
                .map_err(|_| BridgeError::runtime("poisoned"))?
                .push((code, host.to_string(), attached));
            Ok(0)
        }
    }

    fn registration(recorder: &Arc<Recorder>) -> Registration {
        Registration::new(Arc::new(ThreadVm), Box::new(recorder.clone()))
    }

    #[test]
    fn test_null_data_is_ignored() {
        unsafe { error_trampoline(1, ptr::null(), ptr::null_mut()) };
    }

    #[test]
    fn test_trampoline_attaches_for_the_call() {
        let recorder = Arc::new(Recorder::default());
        let reg = registration(&recorder);
        let host = CString::new("tcp://127.0.0.1:5555").unwrap();

        unsafe {
            error_trampoline(
                42,
                host.as_ptr(),
                &reg as *const Registration as *mut c_void,
            )
        };

        let calls = recorder.calls.lock().unwrap();
        assert_eq!(calls.as_slice(), &[(42, "tcp://127.0.0.1:5555".to_string(), true)]);
        assert!(!ATTACHED.with(Cell::get));
    }

    #[test]
    fn test_null_host_becomes_empty() {
        let recorder = Arc::new(Recorder::default());
        let reg = registration(&recorder);

        unsafe { error_trampoline(3, ptr::null(), &reg as *const Registration as *mut c_void) };

        assert_eq!(recorder.calls.lock().unwrap()[0].1, "");
    }

    #[test]
    fn test_panic_does_not_escape() {
        let recorder = Arc::new(Recorder {
            panic: true,
            ..Default::default()
        });
        let reg = registration(&recorder);

        unsafe { error_trampoline(5, ptr::null(), &reg as *const Registration as *mut c_void) };

        assert!(!ATTACHED.with(Cell::get));
    }
}
