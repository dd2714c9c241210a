//! Bridge error types.

use thiserror::Error;
use zmq_ctx::{Capability, NativeVersion, ZmqError};

/// Error type for bridge operations.
#[derive(Debug, Clone, Error)]
pub enum BridgeError {
    /// libzmq reported a failure.
    #[error(transparent)]
    Native(#[from] ZmqError),

    /// The managed class has no field with the expected name and type.
    #[error("field {field} not found on {class}")]
    FieldNotFound { class: String, field: String },

    /// The callback target does not implement the report method.
    #[error("method {name}{signature} not found on callback target")]
    MethodNotFound { name: String, signature: String },

    /// A managed class could not be loaded.
    #[error("class {class} not found")]
    ClassNotFound { class: String },

    /// The loaded libzmq is too old for the requested operation.
    #[error("{capability} requires libzmq {}, found {version}", .capability.min_version())]
    Unsupported {
        capability: Capability,
        version: NativeVersion,
    },

    /// The managed runtime cannot attach native threads.
    #[error("managed runtime does not support attaching native threads")]
    AttachUnsupported,

    /// A call into the managed runtime failed.
    #[error("managed runtime call failed: {message}")]
    Runtime { message: String },

    /// The bridge configuration is invalid.
    #[error("configuration error: {message}")]
    Config { message: String },
}

impl BridgeError {
    /// Creates a runtime error with a message.
    pub fn runtime(message: impl Into<String>) -> Self {
        BridgeError::Runtime {
            message: message.into(),
        }
    }

    /// Creates a configuration error with a message.
    pub fn config(message: impl Into<String>) -> Self {
        BridgeError::Config {
            message: message.into(),
        }
    }

    /// Returns the native error number if this error came from libzmq.
    pub fn native_code(&self) -> Option<i32> {
        match self {
            BridgeError::Native(err) => Some(err.code()),
            _ => None,
        }
    }
}

/// Result type for bridge operations.
pub type BridgeResult<T> = Result<T, BridgeError>;
