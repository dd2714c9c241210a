//! Native thread attachment to the managed runtime.
//!
//! Error callbacks arrive on threads owned by libzmq. Before such a thread
//! can call managed code it has to be attached to the runtime, and it must
//! leave in the state it arrived in. [`AttachGuard`] scopes that: it attaches
//! on entry only when needed and detaches on drop only what it attached.

use crate::error::{BridgeError, BridgeResult};

/// Attachment state of the current thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attachment {
    /// The thread can call managed code.
    Attached,
    /// The thread must be attached before calling managed code.
    Detached,
    /// The runtime cannot report or change attachment (wrong version).
    Unsupported,
}

/// A managed runtime that native threads can attach to.
///
/// Implementations are shared between the registering thread and every
/// native thread delivering callbacks, hence `Send + Sync`.
pub trait ManagedVm: Send + Sync {
    /// Returns the attachment state of the calling thread.
    fn attachment(&self) -> Attachment;

    /// Attaches the calling thread.
    fn attach_current_thread(&self) -> BridgeResult<()>;

    /// Detaches the calling thread. Only called after a successful
    /// [`attach_current_thread`](Self::attach_current_thread) on the same
    /// thread.
    fn detach_current_thread(&self);
}

/// Scoped attachment of the current thread.
pub struct AttachGuard<'vm> {
    vm: &'vm dyn ManagedVm,
    detach_on_drop: bool,
}

impl<'vm> AttachGuard<'vm> {
    /// Ensures the calling thread is attached for the guard's lifetime.
    pub fn enter(vm: &'vm dyn ManagedVm) -> BridgeResult<Self> {
        match vm.attachment() {
            Attachment::Attached => Ok(Self {
                vm,
                detach_on_drop: false,
            }),
            Attachment::Detached => {
                vm.attach_current_thread()?;
                Ok(Self {
                    vm,
                    detach_on_drop: true,
                })
            }
            Attachment::Unsupported => Err(BridgeError::AttachUnsupported),
        }
    }

    /// Returns true if this guard attached the thread and will detach it.
    pub fn attached_here(&self) -> bool {
        self.detach_on_drop
    }
}

impl Drop for AttachGuard<'_> {
    fn drop(&mut self) {
        if self.detach_on_drop {
            self.vm.detach_current_thread();
        }
    }
}
