//! In-process stand-in for libzmq's context API.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::ffi::{c_void, CString};
use std::ptr;
use std::thread;
use zmq_ctx::{
    ContextApi, ContextHandle, ContextOption, ErrorHandlerFn, NativeVersion, ZmqError, ZmqResult,
};

const FIRST_ADDR: usize = 0x1000;
const ADDR_STEP: usize = 0x40;
const DEFAULT_MAX_SOCKETS: i32 = 1023;
const DEFAULT_VERSION: NativeVersion = NativeVersion::new(4, 3, 5);

/// Number of calls made into the fake, per operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NativeCalls {
    pub init: usize,
    pub term: usize,
    pub set: usize,
    pub get: usize,
    pub set_error_handler: usize,
}

impl NativeCalls {
    pub fn total(&self) -> usize {
        self.init + self.term + self.set + self.get + self.set_error_handler
    }
}

struct FakeContext {
    io_threads: i32,
    max_sockets: i32,
    handler: Option<(ErrorHandlerFn, usize)>,
}

#[derive(Default)]
struct State {
    next_addr: usize,
    contexts: HashMap<usize, FakeContext>,
    calls: NativeCalls,
    fail_init: Option<i32>,
    /// Error code and whether the context survives the failure.
    fail_term: Option<(i32, bool)>,
    fail_handler: Option<i32>,
}

/// Fake libzmq.
///
/// Contexts are plain map entries keyed by a fake address. Installed error
/// handlers are stored as given and only run through
/// [`fire_error`](Self::fire_error).
pub struct FakeLibZmq {
    version: NativeVersion,
    state: Mutex<State>,
}

impl Default for FakeLibZmq {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeLibZmq {
    pub fn new() -> Self {
        Self::with_version(DEFAULT_VERSION)
    }

    pub fn with_version(version: NativeVersion) -> Self {
        Self {
            version,
            state: Mutex::new(State {
                next_addr: FIRST_ADDR,
                ..Default::default()
            }),
        }
    }

    pub fn calls(&self) -> NativeCalls {
        self.state.lock().calls
    }

    /// Makes the next `init` fail with `code`.
    pub fn fail_next_init(&self, code: i32) {
        self.state.lock().fail_init = Some(code);
    }

    /// Makes the next `term` fail with `code`. The context is still gone.
    pub fn fail_next_term(&self, code: i32) {
        self.state.lock().fail_term = Some((code, false));
    }

    /// Makes the next `term` fail with `EINTR`, leaving the context and its
    /// error handler running.
    pub fn interrupt_next_term(&self) {
        self.state.lock().fail_term = Some((libc::EINTR, true));
    }

    /// Makes the next `set_error_handler` fail with `code`.
    pub fn fail_next_handler_install(&self, code: i32) {
        self.state.lock().fail_handler = Some(code);
    }

    pub fn live_contexts(&self) -> usize {
        self.state.lock().contexts.len()
    }

    /// I/O thread count the context was created with.
    pub fn io_threads(&self, handle: i64) -> Option<i32> {
        let state = self.state.lock();
        state
            .contexts
            .get(&(handle as usize))
            .map(|ctx| ctx.io_threads)
    }

    pub fn has_handler(&self, handle: i64) -> bool {
        let state = self.state.lock();
        state
            .contexts
            .get(&(handle as usize))
            .is_some_and(|ctx| ctx.handler.is_some())
    }

    /// Reports an error on the context the way libzmq's I/O threads do.
    ///
    /// Returns false if the context has no error handler.
    pub fn fire_error(&self, handle: i64, code: i32, host: Option<&str>) -> bool {
        let handler = {
            let state = self.state.lock();
            state
                .contexts
                .get(&(handle as usize))
                .and_then(|ctx| ctx.handler)
        };
        let Some((callback, data)) = handler else {
            return false;
        };

        let host = host.map(|h| CString::new(h).unwrap_or_default());
        let host_ptr = host.as_ref().map_or(ptr::null(), |h| h.as_ptr());
        log::trace!("delivering error {} to handler of 0x{:x}", code, handle);
        // Safety: the handler and data were installed together by the bridge.
        unsafe { callback(code, host_ptr, data as *mut c_void) };
        true
    }

    /// Like [`fire_error`](Self::fire_error), from a fresh native thread.
    pub fn fire_error_on_thread(&self, handle: i64, code: i32, host: Option<&str>) -> bool {
        thread::scope(|scope| {
            scope
                .spawn(|| self.fire_error(handle, code, host))
                .join()
                .unwrap_or(false)
        })
    }

    fn with_context<T>(
        &self,
        ctx: &ContextHandle,
        f: impl FnOnce(&mut FakeContext) -> ZmqResult<T>,
    ) -> ZmqResult<T> {
        let mut state = self.state.lock();
        match state.contexts.get_mut(&ctx.addr()) {
            Some(context) => f(context),
            None => Err(ZmqError::from_code(libc::EFAULT)),
        }
    }
}

impl ContextApi for FakeLibZmq {
    fn version(&self) -> NativeVersion {
        self.version
    }

    fn init(&self, io_threads: i32) -> ZmqResult<ContextHandle> {
        let mut state = self.state.lock();
        state.calls.init += 1;
        if let Some(code) = state.fail_init.take() {
            return Err(ZmqError::from_code(code));
        }
        if io_threads < 0 {
            return Err(ZmqError::from_code(libc::EINVAL));
        }

        let addr = state.next_addr;
        state.next_addr += ADDR_STEP;
        // Safety: fake addresses are never dereferenced.
        let handle = unsafe { ContextHandle::from_raw(addr as *mut c_void) }
            .ok_or(ZmqError::from_code(libc::EFAULT))?;
        state.contexts.insert(
            addr,
            FakeContext {
                io_threads,
                max_sockets: DEFAULT_MAX_SOCKETS,
                handler: None,
            },
        );
        Ok(handle)
    }

    fn term(&self, ctx: ContextHandle) -> ZmqResult<()> {
        let mut state = self.state.lock();
        state.calls.term += 1;
        match state.fail_term.take() {
            Some((code, true)) => return Err(ZmqError::from_code(code)),
            Some((code, false)) => {
                state.contexts.remove(&ctx.addr());
                return Err(ZmqError::from_code(code));
            }
            None => {}
        }
        let removed = state.contexts.remove(&ctx.addr());
        match removed {
            Some(_) => Ok(()),
            None => Err(ZmqError::from_code(libc::EFAULT)),
        }
    }

    fn set(&self, ctx: &ContextHandle, option: ContextOption, value: i32) -> ZmqResult<()> {
        self.state.lock().calls.set += 1;
        self.with_context(ctx, |context| match option {
            ContextOption::MaxSockets if value > 0 => {
                context.max_sockets = value;
                Ok(())
            }
            ContextOption::IoThreads if value >= 0 => {
                context.io_threads = value;
                Ok(())
            }
            _ => Err(ZmqError::from_code(libc::EINVAL)),
        })
    }

    fn get(&self, ctx: &ContextHandle, option: ContextOption) -> ZmqResult<i32> {
        self.state.lock().calls.get += 1;
        self.with_context(ctx, |context| {
            Ok(match option {
                ContextOption::MaxSockets => context.max_sockets,
                ContextOption::IoThreads => context.io_threads,
            })
        })
    }

    unsafe fn set_error_handler(
        &self,
        ctx: &ContextHandle,
        callback: Option<ErrorHandlerFn>,
        data: *mut c_void,
    ) -> ZmqResult<()> {
        {
            let mut state = self.state.lock();
            state.calls.set_error_handler += 1;
            if let Some(code) = state.fail_handler.take() {
                return Err(ZmqError::from_code(code));
            }
        }
        let data = data as usize;
        self.with_context(ctx, |context| {
            context.handler = callback.map(|callback| (callback, data));
            Ok(())
        })
    }
}
