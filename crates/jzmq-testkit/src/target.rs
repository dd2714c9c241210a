use crate::runtime::FakeVm;
use jzmq_bridge::{
    BindingConfig, BridgeError, BridgeResult, CallbackTarget, ErrorCallback, Registration,
};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use zmq_ctx::ErrorKind;

/// One call of `reportError` as seen by the managed target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportedError {
    /// Translated error, `None` when the translator is unavailable.
    pub kind: Option<ErrorKind>,
    pub code: i32,
    pub host: String,
    /// Whether the delivering thread was attached during the call.
    pub attached: bool,
}

/// Errors delivered to a [`FakeTarget`].
#[derive(Debug, Clone, Default)]
pub struct ErrorLog(Arc<Mutex<Vec<ReportedError>>>);

impl ErrorLog {
    pub fn entries(&self) -> Vec<ReportedError> {
        self.0.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.0.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.lock().is_empty()
    }
}

#[derive(Debug, Default)]
struct RefCounts {
    pinned: AtomicUsize,
    released: AtomicUsize,
}

/// Global references taken on a [`FakeTarget`].
#[derive(Debug, Clone, Default)]
pub struct PinnedRefs(Arc<RefCounts>);

impl PinnedRefs {
    pub fn pinned(&self) -> usize {
        self.0.pinned.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> usize {
        self.0.released.load(Ordering::SeqCst)
    }

    /// References taken and not yet released.
    pub fn live(&self) -> usize {
        self.pinned() - self.released()
    }
}

/// A managed error-handler object.
pub struct FakeTarget {
    vm: Arc<FakeVm>,
    log: ErrorLog,
    refs: PinnedRefs,
    has_report_method: bool,
    has_translator: bool,
    panics: bool,
    reply: i32,
}

impl FakeTarget {
    pub fn new(vm: &Arc<FakeVm>) -> Self {
        Self {
            vm: Arc::clone(vm),
            log: ErrorLog::default(),
            refs: PinnedRefs::default(),
            has_report_method: true,
            has_translator: true,
            panics: false,
            reply: 0,
        }
    }

    /// The target's class does not declare `reportError`.
    pub fn without_report_method(mut self) -> Self {
        self.has_report_method = false;
        self
    }

    /// The error class cannot be loaded.
    pub fn without_translator(mut self) -> Self {
        self.has_translator = false;
        self
    }

    /// `reportError` panics instead of returning.
    pub fn panicking(mut self) -> Self {
        self.panics = true;
        self
    }

    pub fn replying(mut self, reply: i32) -> Self {
        self.reply = reply;
        self
    }

    pub fn log(&self) -> ErrorLog {
        self.log.clone()
    }

    pub fn refs(&self) -> PinnedRefs {
        self.refs.clone()
    }
}

impl CallbackTarget for FakeTarget {
    type Method = ();
    type Translator = ();

    fn report_method(&mut self, bindings: &BindingConfig) -> BridgeResult<()> {
        if self.has_report_method {
            Ok(())
        } else {
            Err(BridgeError::MethodNotFound {
                name: bindings.report_method.clone(),
                signature: bindings.report_signature.clone(),
            })
        }
    }

    fn translator(&mut self, bindings: &BindingConfig) -> BridgeResult<()> {
        if self.has_translator {
            Ok(())
        } else {
            Err(BridgeError::ClassNotFound {
                class: bindings.error_class.clone(),
            })
        }
    }

    fn pin(self, _method: (), translator: Option<()>) -> BridgeResult<Registration> {
        self.refs.0.pinned.fetch_add(1, Ordering::SeqCst);
        let callback = FakeCallback {
            log: self.log,
            refs: self.refs,
            translate: translator.is_some(),
            panics: self.panics,
            reply: self.reply,
        };
        Ok(Registration::new(self.vm, Box::new(callback)))
    }
}

struct FakeCallback {
    log: ErrorLog,
    refs: PinnedRefs,
    translate: bool,
    panics: bool,
    reply: i32,
}

impl ErrorCallback for FakeCallback {
    fn report_error(&self, code: i32, host: &str) -> BridgeResult<i32> {
        if self.panics {
            panic!("reportError threw for error {}", code);
        }
        self.log.0.lock().push(ReportedError {
            kind: self.translate.then(|| ErrorKind::from_code(code)),
            code,
            host: host.to_string(),
            attached: FakeVm::current_thread_attached(),
        });
        Ok(self.reply)
    }
}

impl Drop for FakeCallback {
    fn drop(&mut self) {
        self.refs.0.released.fetch_add(1, Ordering::SeqCst);
    }
}
