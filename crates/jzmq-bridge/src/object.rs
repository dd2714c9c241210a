//! Managed objects holding a native handle.

use crate::error::BridgeResult;

/// A managed-runtime object the bridge reads and writes by reflection.
///
/// The bridge only needs a class identity (the cache key for resolved field
/// descriptors), field resolution and 64-bit field access.
pub trait ManagedObject {
    /// Resolved field descriptor. Valid for every instance of the class and
    /// shareable across threads.
    type FieldId: Copy + Send + Sync + 'static;

    /// Name identifying the object's class.
    fn class_name(&self) -> &str;

    /// Locates a `long` field on the object's class.
    fn resolve_long_field(&mut self, name: &str) -> BridgeResult<Self::FieldId>;

    /// Reads a `long` field.
    fn get_long(&mut self, field: Self::FieldId) -> BridgeResult<i64>;

    /// Writes a `long` field.
    fn set_long(&mut self, field: Self::FieldId, value: i64) -> BridgeResult<()>;
}
