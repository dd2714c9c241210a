//! Context lifecycle, error-handler registration and option accessors.

use crate::accessor::HandleAccessor;
use crate::callback::{error_trampoline, CallbackTarget, Registration};
use crate::config::BridgeConfig;
use crate::error::{BridgeError, BridgeResult};
use crate::object::ManagedObject;
use dashmap::DashMap;
use std::ffi::c_void;
use std::ptr;
use zmq_ctx::{Capability, ContextApi, ContextHandle, ContextOption, ErrorHandlerFn, NativeVersion};

/// Binds managed context objects to native libzmq contexts.
///
/// One bridge serves the whole process. It owns the handle field cache and
/// the error-handler registrations, keyed by native context address.
///
/// The bridge does not lock the handle field of an object. Callers must not
/// construct, destroy or use the same object from several threads at once
/// without their own synchronization.
pub struct ContextBridge<N, F> {
    native: N,
    config: BridgeConfig,
    accessor: HandleAccessor<F>,
    handlers: DashMap<usize, Box<Registration>>,
}

impl<N, F> ContextBridge<N, F>
where
    N: ContextApi,
    F: Copy + Send + Sync + 'static,
{
    pub fn new(native: N, config: BridgeConfig) -> Self {
        let accessor = HandleAccessor::new(config.bindings.handle_field.clone());
        Self {
            native,
            config,
            accessor,
            handlers: DashMap::new(),
        }
    }

    pub fn native(&self) -> &N {
        &self.native
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn accessor(&self) -> &HandleAccessor<F> {
        &self.accessor
    }

    /// Internal name of the managed context class.
    pub fn context_class(&self) -> &str {
        &self.config.bindings.context_class
    }

    /// Number of installed error handlers.
    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    pub fn native_version(&self) -> NativeVersion {
        self.native.version()
    }

    /// Creates the native context for `obj` unless it already has one.
    ///
    /// On failure the object is left without a handle and the error carries
    /// the native error number.
    pub fn construct<O>(&self, obj: &mut O, io_threads: i32) -> BridgeResult<()>
    where
        O: ManagedObject<FieldId = F>,
    {
        if let Some(existing) = self.accessor.get(obj)? {
            log::debug!("context {:?} already constructed", existing);
            return Ok(());
        }

        let handle = self.native.init(io_threads)?;
        log::debug!("created context {:?} with {} I/O threads", handle, io_threads);

        let raw = handle.as_ptr();
        if let Err(err) = self.accessor.put(obj, Some(handle)) {
            // Safety: the handle was not stored anywhere, so this is its only owner.
            if let Some(orphan) = unsafe { ContextHandle::from_raw(raw) } {
                if let Err(term_err) = self.native.term(orphan) {
                    log::warn!("cannot terminate unstored context: {}", term_err);
                }
            }
            return Err(err);
        }
        Ok(())
    }

    /// Terminates the native context of `obj`, if any.
    ///
    /// The handle field is cleared whether or not termination succeeds. The
    /// context's error handler is released only after a successful
    /// termination. When termination fails (e.g. `EINTR`) libzmq may still
    /// report errors with the handler's data, so the registration is leaked
    /// instead.
    pub fn destroy<O>(&self, obj: &mut O) -> BridgeResult<()>
    where
        O: ManagedObject<FieldId = F>,
    {
        let Some(handle) = self.accessor.get(obj)? else {
            return Ok(());
        };
        let addr = handle.addr();
        log::debug!("terminating context {:?}", handle);

        let terminated = self.native.term(handle);

        if let Some((_, registration)) = self.handlers.remove(&addr) {
            if terminated.is_ok() {
                log::debug!("released error handler of context 0x{:x}", addr);
            } else {
                log::warn!("context 0x{:x} failed to terminate, leaking its error handler", addr);
                std::mem::forget(registration);
            }
        }
        self.accessor.put(obj, None)?;

        terminated.map_err(BridgeError::from)
    }

    /// Installs `target` as the error handler of the context, or removes the
    /// current handler when `target` is `None`.
    ///
    /// Returns whether the native registration succeeded. Nothing is
    /// registered when the library lacks error handlers, the object has no
    /// context or the target has no report method.
    pub fn set_error_handler<O, T>(&self, obj: &mut O, target: Option<T>) -> bool
    where
        O: ManagedObject<FieldId = F>,
        T: CallbackTarget,
    {
        if !self.supports(Capability::ErrorHandler) {
            return false;
        }
        let Some(handle) = self.live_handle(obj) else {
            return false;
        };

        match target {
            Some(target) => self.install_handler(&handle, target),
            None => self.uninstall_handler(&handle),
        }
    }

    /// Sets the maximum number of sockets of the context.
    pub fn set_max_sockets<O>(&self, obj: &mut O, max_sockets: i32) -> bool
    where
        O: ManagedObject<FieldId = F>,
    {
        self.set_option(obj, ContextOption::MaxSockets, max_sockets)
    }

    /// Returns the maximum number of sockets of the context, or -1.
    pub fn get_max_sockets<O>(&self, obj: &mut O) -> i32
    where
        O: ManagedObject<FieldId = F>,
    {
        self.get_option(obj, ContextOption::MaxSockets)
    }

    fn set_option<O>(&self, obj: &mut O, option: ContextOption, value: i32) -> bool
    where
        O: ManagedObject<FieldId = F>,
    {
        if !self.supports(Capability::ContextOptions) {
            return false;
        }
        let Some(handle) = self.live_handle(obj) else {
            return false;
        };

        match self.native.set(&handle, option, value) {
            Ok(()) => true,
            Err(err) => {
                log::debug!("cannot set {:?} to {} on {:?}: {}", option, value, handle, err);
                false
            }
        }
    }

    fn get_option<O>(&self, obj: &mut O, option: ContextOption) -> i32
    where
        O: ManagedObject<FieldId = F>,
    {
        if !self.supports(Capability::ContextOptions) {
            return -1;
        }
        let Some(handle) = self.live_handle(obj) else {
            return -1;
        };

        self.native.get(&handle, option).unwrap_or_else(|err| {
            log::debug!("cannot read {:?} from {:?}: {}", option, handle, err);
            -1
        })
    }

    fn supports(&self, capability: Capability) -> bool {
        let version = self.native.version();
        if version.supports(capability) {
            return true;
        }
        log::debug!(
            "{}",
            BridgeError::Unsupported {
                capability,
                version
            }
        );
        false
    }

    fn live_handle<O>(&self, obj: &mut O) -> Option<ContextHandle>
    where
        O: ManagedObject<FieldId = F>,
    {
        match self.accessor.get(obj) {
            Ok(handle) => handle,
            Err(err) => {
                log::warn!("cannot read context handle: {}", err);
                None
            }
        }
    }

    fn install_handler<T: CallbackTarget>(&self, handle: &ContextHandle, mut target: T) -> bool {
        let bindings = &self.config.bindings;

        let method = match target.report_method(bindings) {
            Ok(method) => method,
            Err(err) => {
                log::debug!("rejecting error handler for {:?}: {}", handle, err);
                return false;
            }
        };
        let translator = match target.translator(bindings) {
            Ok(translator) => Some(translator),
            Err(err) => {
                log::warn!("error numbers will not be translated: {}", err);
                None
            }
        };
        let registration = match target.pin(method, translator) {
            Ok(registration) => Box::new(registration),
            Err(err) => {
                log::error!("cannot register error handler for {:?}: {}", handle, err);
                return false;
            }
        };

        let data = (&*registration as *const Registration)
            .cast_mut()
            .cast::<c_void>();
        // Safety: the boxed registration stays in `handlers` until it is
        // replaced, uninstalled or its context destroyed, each of which
        // happens only after libzmq stopped using this data.
        let installed = unsafe {
            self.native
                .set_error_handler(handle, Some(error_trampoline as ErrorHandlerFn), data)
        };

        match installed {
            Ok(()) => {
                if self.handlers.insert(handle.addr(), registration).is_some() {
                    log::debug!("replaced error handler of {:?}", handle);
                } else {
                    log::debug!("installed error handler on {:?}", handle);
                }
                true
            }
            Err(err) => {
                log::warn!("cannot install error handler on {:?}: {}", handle, err);
                false
            }
        }
    }

    fn uninstall_handler(&self, handle: &ContextHandle) -> bool {
        let removed = unsafe { self.native.set_error_handler(handle, None, ptr::null_mut()) };

        match removed {
            Ok(()) => {
                if self.handlers.remove(&handle.addr()).is_some() {
                    log::debug!("removed error handler of {:?}", handle);
                }
                true
            }
            Err(err) => {
                log::warn!("cannot remove error handler of {:?}: {}", handle, err);
                false
            }
        }
    }
}
