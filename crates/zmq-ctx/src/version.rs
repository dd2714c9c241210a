//! libzmq version and the capabilities gated on it.

use std::fmt;

/// A libzmq version triple.
///
/// Field order matters: the derived ordering compares major, then minor,
/// then patch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct NativeVersion {
    pub major: i32,
    pub minor: i32,
    pub patch: i32,
}

impl NativeVersion {
    pub const fn new(major: i32, minor: i32, patch: i32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Returns the `ZMQ_MAKE_VERSION` encoding of this version.
    pub const fn packed(&self) -> i32 {
        self.major * 10_000 + self.minor * 100 + self.patch
    }

    /// Returns true if the given capability is available in this version.
    pub fn supports(&self, capability: Capability) -> bool {
        *self >= capability.min_version()
    }
}

impl fmt::Display for NativeVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Context features that only exist in newer libzmq releases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// `zmq_ctx_set` / `zmq_ctx_get`
    ContextOptions,
    /// `zmq_error_handler`
    ErrorHandler,
}

impl Capability {
    /// First libzmq release providing this capability.
    pub const fn min_version(&self) -> NativeVersion {
        match self {
            Capability::ContextOptions => NativeVersion::new(3, 0, 0),
            Capability::ErrorHandler => NativeVersion::new(4, 2, 3),
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Capability::ContextOptions => "context options",
            Capability::ErrorHandler => "error handler",
        };
        write!(f, "{}", s)
    }
}
