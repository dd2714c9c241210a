use crate::error::BridgeResult;
use crate::runtime::{Attachment, ManagedVm};
use jni::errors::{Error, JniError};
use jni::{JNIEnv, JavaVM};

/// The Java VM hosting the binding.
pub struct JniVm {
    vm: JavaVM,
}

impl JniVm {
    pub fn new(vm: JavaVM) -> Self {
        Self { vm }
    }

    /// Environment of the calling thread, which must be attached.
    pub fn env(&self) -> BridgeResult<JNIEnv<'_>> {
        Ok(self.vm.get_env()?)
    }
}

impl ManagedVm for JniVm {
    fn attachment(&self) -> Attachment {
        match self.vm.get_env() {
            Ok(_) => Attachment::Attached,
            Err(Error::JniCall(JniError::ThreadDetached)) => Attachment::Detached,
            Err(err) => {
                log::error!("cannot query thread attachment: {}", err);
                Attachment::Unsupported
            }
        }
    }

    fn attach_current_thread(&self) -> BridgeResult<()> {
        self.vm.attach_current_thread_permanently()?;
        Ok(())
    }

    fn detach_current_thread(&self) {
        // Safety: called once the callback returned and its local frame was
        // popped, so no local reference of this thread is still in use.
        unsafe { self.vm.detach_current_thread() }
    }
}
