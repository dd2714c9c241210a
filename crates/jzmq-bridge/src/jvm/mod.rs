//! JNI implementation of the bridge and the `org.zeromq` native methods.

mod exports;
mod object;
mod target;
mod vm;

pub use exports::bridge;
pub use object::JniObject;
pub use target::{JniErrorCallback, JniTarget};
pub use vm::JniVm;

use crate::error::BridgeError;
use jni::JNIEnv;

impl From<jni::errors::Error> for BridgeError {
    fn from(err: jni::errors::Error) -> Self {
        BridgeError::runtime(err.to_string())
    }
}

/// Clears a pending exception left behind by a failed lookup.
pub(crate) fn clear_pending(env: &mut JNIEnv<'_>) {
    if env.exception_check().unwrap_or(false) {
        let _ = env.exception_clear();
    }
}

/// Prints and clears a pending exception thrown by managed code.
pub(crate) fn describe_pending(env: &mut JNIEnv<'_>) {
    if env.exception_check().unwrap_or(false) {
        let _ = env.exception_describe();
        let _ = env.exception_clear();
    }
}
