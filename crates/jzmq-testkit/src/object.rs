use jzmq_bridge::{BridgeError, BridgeResult, ManagedObject};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

/// Index of a field in its [`FakeClass`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FakeFieldId(usize);

/// A managed class with a fixed set of `long` fields.
#[derive(Debug)]
pub struct FakeClass {
    name: String,
    fields: Vec<String>,
    resolutions: AtomicUsize,
}

impl FakeClass {
    pub fn new(name: &str, fields: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            fields: fields.iter().map(|f| f.to_string()).collect(),
            resolutions: AtomicUsize::new(0),
        })
    }

    /// `org.zeromq.ZMQ$Context` with its `contextHandle` field.
    pub fn context() -> Arc<Self> {
        Self::new("org/zeromq/ZMQ$Context", &["contextHandle"])
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of field lookups made on this class.
    pub fn resolutions(&self) -> usize {
        self.resolutions.load(Ordering::SeqCst)
    }

    pub fn instantiate(self: &Arc<Self>) -> FakeObject {
        FakeObject {
            class: Arc::clone(self),
            values: vec![0; self.fields.len()],
        }
    }
}

/// An instance of a [`FakeClass`].
#[derive(Debug)]
pub struct FakeObject {
    class: Arc<FakeClass>,
    values: Vec<i64>,
}

impl FakeObject {
    pub fn class(&self) -> &Arc<FakeClass> {
        &self.class
    }

    pub fn field(&self, name: &str) -> Option<i64> {
        let index = self.class.fields.iter().position(|f| f == name)?;
        Some(self.values[index])
    }

    /// Raw value of `contextHandle`, 0 when absent.
    pub fn handle(&self) -> i64 {
        self.field("contextHandle").unwrap_or(0)
    }

    /// Overwrites a field directly, bypassing the bridge.
    pub fn poke(&mut self, name: &str, value: i64) {
        if let Some(index) = self.class.fields.iter().position(|f| f == name) {
            self.values[index] = value;
        }
    }
}

impl ManagedObject for FakeObject {
    type FieldId = FakeFieldId;

    fn class_name(&self) -> &str {
        &self.class.name
    }

    fn resolve_long_field(&mut self, name: &str) -> BridgeResult<FakeFieldId> {
        self.class.resolutions.fetch_add(1, Ordering::SeqCst);
        // Widen the window for racing first lookups.
        thread::yield_now();
        self.class
            .fields
            .iter()
            .position(|f| f == name)
            .map(FakeFieldId)
            .ok_or_else(|| BridgeError::FieldNotFound {
                class: self.class.name.clone(),
                field: name.to_string(),
            })
    }

    fn get_long(&mut self, field: FakeFieldId) -> BridgeResult<i64> {
        self.values
            .get(field.0)
            .copied()
            .ok_or_else(|| BridgeError::runtime("field of another class"))
    }

    fn set_long(&mut self, field: FakeFieldId, value: i64) -> BridgeResult<()> {
        let slot = self
            .values
            .get_mut(field.0)
            .ok_or_else(|| BridgeError::runtime("field of another class"))?;
        *slot = value;
        Ok(())
    }
}
