//! Managed exceptions raised for failed bridge calls.

use crate::error::{BridgeError, BridgeResult};

/// The exception a failed call surfaces as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManagedException {
    /// The binding's exception class, constructed as `(message, code)`.
    Native { message: String, code: i32 },
    /// `java.lang.IllegalStateException(message)`, for failures that did not
    /// come from libzmq.
    IllegalState { message: String },
}

impl ManagedException {
    /// Picks the exception for `err`. Native failures use `strerror` for the
    /// message.
    pub fn for_error(err: &BridgeError, strerror: impl FnOnce(i32) -> String) -> Self {
        match err.native_code() {
            Some(code) => ManagedException::Native {
                message: strerror(code),
                code,
            },
            None => ManagedException::IllegalState {
                message: err.to_string(),
            },
        }
    }
}

/// Where managed exceptions are thrown.
pub trait ExceptionSink {
    /// Returns true if an exception is already pending on this thread.
    fn exception_pending(&mut self) -> bool;

    fn throw(&mut self, exception: &ManagedException) -> BridgeResult<()>;
}

/// Throws the exception for `err` unless one is already pending.
///
/// Returns whether an exception was thrown.
pub fn raise<S>(sink: &mut S, err: &BridgeError, strerror: impl FnOnce(i32) -> String) -> bool
where
    S: ExceptionSink + ?Sized,
{
    if sink.exception_pending() {
        log::debug!("exception already pending, not raising \"{}\"", err);
        return false;
    }

    let exception = ManagedException::for_error(err, strerror);
    match sink.throw(&exception) {
        Ok(()) => true,
        Err(throw_err) => {
            log::error!("cannot raise \"{}\": {}", err, throw_err);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use zmq_ctx::error::ETERM;
    use zmq_ctx::ZmqError;

    #[derive(Default)]
    struct Recorder {
        pending: bool,
        fail: bool,
        thrown: Vec<ManagedException>,
    }

    impl ExceptionSink for Recorder {
        fn exception_pending(&mut self) -> bool {
            self.pending
        }

        fn throw(&mut self, exception: &ManagedException) -> BridgeResult<()> {
            if self.fail {
                return Err(BridgeError::ClassNotFound {
                    class: "org/zeromq/ZMQException".to_string(),
                });
            }
            self.thrown.push(exception.clone());
            Ok(())
        }
    }

    fn strerror(code: i32) -> String {
        format!("error {}", code)
    }

    #[test]
    fn test_native_failure_carries_code() {
        let mut sink = Recorder::default();
        let err = BridgeError::from(ZmqError::from_code(ETERM));

        assert!(raise(&mut sink, &err, strerror));
        assert_eq!(
            sink.thrown,
            vec![ManagedException::Native {
                message: format!("error {}", ETERM),
                code: ETERM,
            }]
        );
    }

    #[test]
    fn test_other_failures_are_illegal_state() {
        let err = BridgeError::runtime("GetFieldID failed");

        assert_eq!(
            ManagedException::for_error(&err, |_| unreachable!()),
            ManagedException::IllegalState {
                message: "managed runtime call failed: GetFieldID failed".to_string(),
            }
        );
    }

    #[test]
    fn test_pending_exception_is_kept() {
        let mut sink = Recorder {
            pending: true,
            ..Default::default()
        };
        let err = BridgeError::from(ZmqError::from_code(ETERM));

        assert!(!raise(&mut sink, &err, strerror));
        assert!(sink.thrown.is_empty());
    }

    #[test]
    fn test_throw_failure_is_reported() {
        let mut sink = Recorder {
            fail: true,
            ..Default::default()
        };

        assert!(!raise(&mut sink, &BridgeError::runtime("boom"), strerror));
    }
}
