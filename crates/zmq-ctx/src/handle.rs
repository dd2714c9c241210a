//! Owned native context handle.

use std::ffi::c_void;
use std::fmt;
use std::ptr::NonNull;

/// An owned libzmq context.
///
/// The handle is neither `Copy` nor `Clone`: it is produced by
/// [`ContextApi::init`](crate::ContextApi::init) and consumed by
/// [`ContextApi::term`](crate::ContextApi::term), so a terminated context
/// cannot be named again from safe code. Dropping a handle does not
/// terminate the context; ownership then stays with whoever holds the
/// stored field value.
///
/// Language bindings park the handle in a 64-bit field of a managed object
/// between calls. [`into_field`](Self::into_field) and
/// [`from_field`](Self::from_field) perform that conversion.
pub struct ContextHandle {
    ptr: NonNull<c_void>,
}

// libzmq contexts are thread safe.
unsafe impl Send for ContextHandle {}
unsafe impl Sync for ContextHandle {}

impl ContextHandle {
    /// Takes ownership of a raw context pointer.
    ///
    /// Returns `None` for a null pointer.
    ///
    /// # Safety
    ///
    /// `ptr` must be a live context returned by the native library, and no
    /// other `ContextHandle` may own it.
    pub unsafe fn from_raw(ptr: *mut c_void) -> Option<Self> {
        NonNull::new(ptr).map(|ptr| Self { ptr })
    }

    /// Reconstructs a handle previously stored with
    /// [`into_field`](Self::into_field). A zero field yields `None`.
    ///
    /// # Safety
    ///
    /// The value must have been produced by `into_field` and the context must
    /// not have been terminated since.
    pub unsafe fn from_field(value: i64) -> Option<Self> {
        Self::from_raw(value as usize as *mut c_void)
    }

    /// Releases ownership into the 64-bit representation stored by managed
    /// objects.
    pub fn into_field(self) -> i64 {
        self.ptr.as_ptr() as usize as i64
    }

    /// Returns the raw pointer without giving up ownership.
    pub fn as_ptr(&self) -> *mut c_void {
        self.ptr.as_ptr()
    }

    /// Returns the address of the context, usable as a map key.
    pub fn addr(&self) -> usize {
        self.ptr.as_ptr() as usize
    }
}

impl fmt::Debug for ContextHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContextHandle(0x{:016x})", self.addr())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_is_absent() {
        assert!(unsafe { ContextHandle::from_raw(std::ptr::null_mut()) }.is_none());
        assert!(unsafe { ContextHandle::from_field(0) }.is_none());
    }

    #[test]
    fn test_field_conversion_preserves_address() {
        let handle = unsafe { ContextHandle::from_field(0x7f00_1000) }.unwrap();
        assert_eq!(handle.addr(), 0x7f00_1000);
        assert_eq!(handle.into_field(), 0x7f00_1000);
    }

    #[test]
    fn test_debug_format() {
        let handle = unsafe { ContextHandle::from_field(0x10) }.unwrap();
        assert_eq!(format!("{:?}", handle), "ContextHandle(0x0000000000000010)");
    }
}
