//! Test infrastructure for the jzmq handle bridge
//!
//! Provides:
//! - A fake libzmq that records calls, fails on demand and delivers error
//!   callbacks from any thread
//! - A fake managed runtime with per-thread attachment state
//! - Fake managed objects and error-handler targets
//! - Fixtures wiring them into a `ContextBridge`

pub mod fixtures;
mod native;
mod object;
mod runtime;
mod target;

pub use fixtures::*;
pub use native::{FakeLibZmq, NativeCalls};
pub use object::{FakeClass, FakeFieldId, FakeObject};
pub use runtime::{FakeVm, VmBehavior};
pub use target::{ErrorLog, FakeTarget, PinnedRefs, ReportedError};
