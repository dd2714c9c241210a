//! Test fixtures for common bridge setups

use crate::native::FakeLibZmq;
use crate::object::{FakeClass, FakeFieldId, FakeObject};
use jzmq_bridge::{BridgeConfig, ContextBridge};

/// Bridge over the fake library.
pub type FakeBridge = ContextBridge<FakeLibZmq, FakeFieldId>;

/// Bridge over a default fake library (libzmq 4.3.5).
pub fn bridge() -> FakeBridge {
    bridge_with(FakeLibZmq::new())
}

pub fn bridge_with(native: FakeLibZmq) -> FakeBridge {
    ContextBridge::new(native, BridgeConfig::default())
}

/// A fresh, unconstructed `ZMQ.Context` object.
pub fn context_object() -> FakeObject {
    FakeClass::context().instantiate()
}
