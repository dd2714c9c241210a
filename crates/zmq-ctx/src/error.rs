//! libzmq error numbers and their typed representation.
//!
//! libzmq reports failures through `zmq_errno()`. On platforms where a POSIX
//! error number is missing, libzmq substitutes a value offset from
//! [`ZMQ_HAUSNUMERO`]; the libzmq-specific errors (`EFSM`, `ETERM`, ...)
//! always use that offset. Both encodings map to the same [`ErrorKind`].

use std::fmt;
use thiserror::Error;

/// Base of libzmq's private error number range.
pub const ZMQ_HAUSNUMERO: i32 = 156_384_712;

const HAUS_ENOTSUP: i32 = ZMQ_HAUSNUMERO + 1;
const HAUS_EPROTONOSUPPORT: i32 = ZMQ_HAUSNUMERO + 2;
const HAUS_ENOBUFS: i32 = ZMQ_HAUSNUMERO + 3;
const HAUS_ENETDOWN: i32 = ZMQ_HAUSNUMERO + 4;
const HAUS_EADDRINUSE: i32 = ZMQ_HAUSNUMERO + 5;
const HAUS_EADDRNOTAVAIL: i32 = ZMQ_HAUSNUMERO + 6;
const HAUS_ECONNREFUSED: i32 = ZMQ_HAUSNUMERO + 7;
const HAUS_EINPROGRESS: i32 = ZMQ_HAUSNUMERO + 8;
const HAUS_ENOTSOCK: i32 = ZMQ_HAUSNUMERO + 9;
const HAUS_EMSGSIZE: i32 = ZMQ_HAUSNUMERO + 10;
const HAUS_EAFNOSUPPORT: i32 = ZMQ_HAUSNUMERO + 11;
const HAUS_ENETUNREACH: i32 = ZMQ_HAUSNUMERO + 12;
const HAUS_ECONNABORTED: i32 = ZMQ_HAUSNUMERO + 13;
const HAUS_ECONNRESET: i32 = ZMQ_HAUSNUMERO + 14;
const HAUS_ENOTCONN: i32 = ZMQ_HAUSNUMERO + 15;
const HAUS_ETIMEDOUT: i32 = ZMQ_HAUSNUMERO + 16;
const HAUS_EHOSTUNREACH: i32 = ZMQ_HAUSNUMERO + 17;
const HAUS_ENETRESET: i32 = ZMQ_HAUSNUMERO + 18;

/// Finite state machine cannot accept the operation in its current state.
pub const EFSM: i32 = ZMQ_HAUSNUMERO + 51;
/// The peer speaks an incompatible protocol version.
pub const ENOCOMPATPROTO: i32 = ZMQ_HAUSNUMERO + 52;
/// The context was terminated.
pub const ETERM: i32 = ZMQ_HAUSNUMERO + 53;
/// No I/O thread is available.
pub const EMTHREAD: i32 = ZMQ_HAUSNUMERO + 54;

/// Named libzmq error kinds.
///
/// The variants mirror the constants of `org.zeromq.ZMQ$Error` so that
/// [`ErrorKind::name`] can be used to look a kind up on the managed side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotSupported,
    ProtocolNotSupported,
    NoBufferSpace,
    NetworkDown,
    AddressInUse,
    AddressNotAvailable,
    ConnectionRefused,
    InProgress,
    NotSocket,
    MessageSize,
    AddressFamilyNotSupported,
    NetworkUnreachable,
    ConnectionAborted,
    ConnectionReset,
    NotConnected,
    TimedOut,
    HostUnreachable,
    NetworkReset,
    InvalidState,
    IncompatibleProtocol,
    Terminated,
    NoIoThread,
    InvalidArgument,
    TryAgain,
    BadAddress,
    Interrupted,
    TooManyFiles,
    OutOfMemory,
    Unknown,
}

impl ErrorKind {
    /// Maps a raw `zmq_errno()` value to its kind.
    pub fn from_code(code: i32) -> Self {
        match code {
            libc::ENOTSUP | HAUS_ENOTSUP => ErrorKind::NotSupported,
            libc::EPROTONOSUPPORT | HAUS_EPROTONOSUPPORT => ErrorKind::ProtocolNotSupported,
            libc::ENOBUFS | HAUS_ENOBUFS => ErrorKind::NoBufferSpace,
            libc::ENETDOWN | HAUS_ENETDOWN => ErrorKind::NetworkDown,
            libc::EADDRINUSE | HAUS_EADDRINUSE => ErrorKind::AddressInUse,
            libc::EADDRNOTAVAIL | HAUS_EADDRNOTAVAIL => ErrorKind::AddressNotAvailable,
            libc::ECONNREFUSED | HAUS_ECONNREFUSED => ErrorKind::ConnectionRefused,
            libc::EINPROGRESS | HAUS_EINPROGRESS => ErrorKind::InProgress,
            libc::ENOTSOCK | HAUS_ENOTSOCK => ErrorKind::NotSocket,
            libc::EMSGSIZE | HAUS_EMSGSIZE => ErrorKind::MessageSize,
            libc::EAFNOSUPPORT | HAUS_EAFNOSUPPORT => ErrorKind::AddressFamilyNotSupported,
            libc::ENETUNREACH | HAUS_ENETUNREACH => ErrorKind::NetworkUnreachable,
            libc::ECONNABORTED | HAUS_ECONNABORTED => ErrorKind::ConnectionAborted,
            libc::ECONNRESET | HAUS_ECONNRESET => ErrorKind::ConnectionReset,
            libc::ENOTCONN | HAUS_ENOTCONN => ErrorKind::NotConnected,
            libc::ETIMEDOUT | HAUS_ETIMEDOUT => ErrorKind::TimedOut,
            libc::EHOSTUNREACH | HAUS_EHOSTUNREACH => ErrorKind::HostUnreachable,
            libc::ENETRESET | HAUS_ENETRESET => ErrorKind::NetworkReset,
            EFSM => ErrorKind::InvalidState,
            ENOCOMPATPROTO => ErrorKind::IncompatibleProtocol,
            ETERM => ErrorKind::Terminated,
            EMTHREAD => ErrorKind::NoIoThread,
            libc::EINVAL => ErrorKind::InvalidArgument,
            libc::EAGAIN => ErrorKind::TryAgain,
            libc::EFAULT => ErrorKind::BadAddress,
            libc::EINTR => ErrorKind::Interrupted,
            libc::EMFILE => ErrorKind::TooManyFiles,
            libc::ENOMEM => ErrorKind::OutOfMemory,
            _ => ErrorKind::Unknown,
        }
    }

    /// Returns the errno-style constant name (e.g. `ETERM`).
    pub fn name(&self) -> &'static str {
        match self {
            ErrorKind::NotSupported => "ENOTSUP",
            ErrorKind::ProtocolNotSupported => "EPROTONOSUPPORT",
            ErrorKind::NoBufferSpace => "ENOBUFS",
            ErrorKind::NetworkDown => "ENETDOWN",
            ErrorKind::AddressInUse => "EADDRINUSE",
            ErrorKind::AddressNotAvailable => "EADDRNOTAVAIL",
            ErrorKind::ConnectionRefused => "ECONNREFUSED",
            ErrorKind::InProgress => "EINPROGRESS",
            ErrorKind::NotSocket => "ENOTSOCK",
            ErrorKind::MessageSize => "EMSGSIZE",
            ErrorKind::AddressFamilyNotSupported => "EAFNOSUPPORT",
            ErrorKind::NetworkUnreachable => "ENETUNREACH",
            ErrorKind::ConnectionAborted => "ECONNABORTED",
            ErrorKind::ConnectionReset => "ECONNRESET",
            ErrorKind::NotConnected => "ENOTCONN",
            ErrorKind::TimedOut => "ETIMEDOUT",
            ErrorKind::HostUnreachable => "EHOSTUNREACH",
            ErrorKind::NetworkReset => "ENETRESET",
            ErrorKind::InvalidState => "EFSM",
            ErrorKind::IncompatibleProtocol => "ENOCOMPATPROTO",
            ErrorKind::Terminated => "ETERM",
            ErrorKind::NoIoThread => "EMTHREAD",
            ErrorKind::InvalidArgument => "EINVAL",
            ErrorKind::TryAgain => "EAGAIN",
            ErrorKind::BadAddress => "EFAULT",
            ErrorKind::Interrupted => "EINTR",
            ErrorKind::TooManyFiles => "EMFILE",
            ErrorKind::OutOfMemory => "ENOMEM",
            ErrorKind::Unknown => "EUNKNOWN",
        }
    }

    /// Short human readable description, used when `zmq_strerror` is not
    /// available.
    pub fn description(&self) -> &'static str {
        match self {
            ErrorKind::NotSupported => "Not supported",
            ErrorKind::ProtocolNotSupported => "Protocol not supported",
            ErrorKind::NoBufferSpace => "No buffer space available",
            ErrorKind::NetworkDown => "Network is down",
            ErrorKind::AddressInUse => "Address already in use",
            ErrorKind::AddressNotAvailable => "Address not available",
            ErrorKind::ConnectionRefused => "Connection refused",
            ErrorKind::InProgress => "Operation in progress",
            ErrorKind::NotSocket => "Not a socket",
            ErrorKind::MessageSize => "Message too long",
            ErrorKind::AddressFamilyNotSupported => "Address family not supported",
            ErrorKind::NetworkUnreachable => "Network is unreachable",
            ErrorKind::ConnectionAborted => "Connection aborted",
            ErrorKind::ConnectionReset => "Connection reset",
            ErrorKind::NotConnected => "Not connected",
            ErrorKind::TimedOut => "Operation timed out",
            ErrorKind::HostUnreachable => "Host unreachable",
            ErrorKind::NetworkReset => "Network dropped connection on reset",
            ErrorKind::InvalidState => "Operation cannot be accomplished in current state",
            ErrorKind::IncompatibleProtocol => {
                "The protocol is not compatible with the socket type"
            }
            ErrorKind::Terminated => "Context was terminated",
            ErrorKind::NoIoThread => "No thread available",
            ErrorKind::InvalidArgument => "Invalid argument",
            ErrorKind::TryAgain => "Resource temporarily unavailable",
            ErrorKind::BadAddress => "Bad address",
            ErrorKind::Interrupted => "Interrupted system call",
            ErrorKind::TooManyFiles => "Too many open files",
            ErrorKind::OutOfMemory => "Cannot allocate memory",
            ErrorKind::Unknown => "Unknown error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A failed libzmq call, carrying the `zmq_errno()` value captured right
/// after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
#[error("libzmq error {code} ({kind}): {}", .kind.description())]
pub struct ZmqError {
    code: i32,
    kind: ErrorKind,
}

impl ZmqError {
    /// Creates an error from a raw error number.
    pub fn from_code(code: i32) -> Self {
        Self {
            code,
            kind: ErrorKind::from_code(code),
        }
    }

    /// Error returned by operations the linked library does not provide.
    pub fn not_supported() -> Self {
        Self::from_code(libc::ENOTSUP)
    }

    /// Returns the raw error number.
    pub fn code(&self) -> i32 {
        self.code
    }

    /// Returns the named kind of this error.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }
}

/// Result type for libzmq operations.
pub type ZmqResult<T> = Result<T, ZmqError>;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_posix_and_hausnumero_codes_agree() {
        assert_eq!(ErrorKind::from_code(libc::ENOTSUP), ErrorKind::NotSupported);
        assert_eq!(
            ErrorKind::from_code(ZMQ_HAUSNUMERO + 1),
            ErrorKind::NotSupported
        );
        assert_eq!(
            ErrorKind::from_code(libc::EHOSTUNREACH),
            ErrorKind::from_code(ZMQ_HAUSNUMERO + 17)
        );
    }

    #[test]
    fn test_zmq_specific_codes() {
        assert_eq!(ErrorKind::from_code(ETERM), ErrorKind::Terminated);
        assert_eq!(ErrorKind::from_code(EFSM), ErrorKind::InvalidState);
        assert_eq!(ErrorKind::from_code(EMTHREAD), ErrorKind::NoIoThread);
        assert_eq!(ErrorKind::Terminated.name(), "ETERM");
    }

    #[test]
    fn test_unknown_code() {
        assert_eq!(ErrorKind::from_code(-12345), ErrorKind::Unknown);
        assert_eq!(ErrorKind::from_code(0), ErrorKind::Unknown);
    }

    #[test]
    fn test_error_keeps_raw_code() {
        let err = ZmqError::from_code(libc::EINVAL);
        assert_eq!(err.code(), libc::EINVAL);
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);

        let msg = err.to_string();
        assert!(msg.contains("EINVAL"));
        assert!(msg.contains("Invalid argument"));
    }

    #[test]
    fn test_not_supported() {
        assert_eq!(ZmqError::not_supported().kind(), ErrorKind::NotSupported);
    }
}
