use jzmq_bridge::{Attachment, BridgeError, BridgeResult, ManagedVm};
use std::cell::Cell;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

thread_local! {
    static ATTACHED: Cell<bool> = const { Cell::new(false) };
}

/// How [`FakeVm`] answers attach requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VmBehavior {
    #[default]
    Normal,
    /// Attaching fails.
    AttachFails,
    /// The VM cannot report attachment at all.
    Unsupported,
}

/// Fake managed runtime.
///
/// Attachment is tracked per OS thread and shared by every `FakeVm`, like a
/// real process hosting a single VM.
#[derive(Debug, Default)]
pub struct FakeVm {
    behavior: VmBehavior,
    attaches: AtomicUsize,
    detaches: AtomicUsize,
}

impl FakeVm {
    pub fn new() -> Arc<Self> {
        Self::with_behavior(VmBehavior::Normal)
    }

    pub fn with_behavior(behavior: VmBehavior) -> Arc<Self> {
        Arc::new(Self {
            behavior,
            ..Default::default()
        })
    }

    pub fn attach_count(&self) -> usize {
        self.attaches.load(Ordering::SeqCst)
    }

    pub fn detach_count(&self) -> usize {
        self.detaches.load(Ordering::SeqCst)
    }

    pub fn current_thread_attached() -> bool {
        ATTACHED.with(Cell::get)
    }

    /// Marks the calling thread as attached by someone else, e.g. a managed
    /// thread calling into native code.
    pub fn mark_current_thread_attached(attached: bool) {
        ATTACHED.with(|a| a.set(attached));
    }
}

impl ManagedVm for FakeVm {
    fn attachment(&self) -> Attachment {
        match self.behavior {
            VmBehavior::Unsupported => Attachment::Unsupported,
            _ if Self::current_thread_attached() => Attachment::Attached,
            _ => Attachment::Detached,
        }
    }

    fn attach_current_thread(&self) -> BridgeResult<()> {
        if self.behavior == VmBehavior::AttachFails {
            return Err(BridgeError::runtime("AttachCurrentThread failed"));
        }
        self.attaches.fetch_add(1, Ordering::SeqCst);
        ATTACHED.with(|a| a.set(true));
        Ok(())
    }

    fn detach_current_thread(&self) {
        self.detaches.fetch_add(1, Ordering::SeqCst);
        ATTACHED.with(|a| a.set(false));
    }
}
