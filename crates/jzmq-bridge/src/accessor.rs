//! Cached access to the native handle field of managed objects.

use crate::error::BridgeResult;
use crate::object::ManagedObject;
use dashmap::DashMap;
use zmq_ctx::ContextHandle;

/// Reads and writes the handle field of managed objects.
///
/// Field descriptors are resolved once per class and cached for the lifetime
/// of the accessor. Resolution runs under the cache's entry lock, so
/// concurrent first use of a class resolves it exactly once.
pub struct HandleAccessor<F> {
    field_name: String,
    fields: DashMap<String, F>,
}

impl<F: Copy + Send + Sync + 'static> HandleAccessor<F> {
    pub fn new(field_name: impl Into<String>) -> Self {
        Self {
            field_name: field_name.into(),
            fields: DashMap::new(),
        }
    }

    /// Name of the handle field.
    pub fn field_name(&self) -> &str {
        &self.field_name
    }

    /// Number of classes with a resolved descriptor.
    pub fn cached_classes(&self) -> usize {
        self.fields.len()
    }

    /// Returns the handle field descriptor for the object's class.
    ///
    /// # Panics
    ///
    /// Panics if the class has no such field. That means the native library
    /// was loaded against a different version of the managed classes and the
    /// binding cannot work at all.
    pub fn field_for<O>(&self, obj: &mut O) -> F
    where
        O: ManagedObject<FieldId = F>,
    {
        if let Some(field) = self.fields.get(obj.class_name()) {
            return *field;
        }

        let class = obj.class_name().to_owned();
        let resolved = self
            .fields
            .entry(class.clone())
            .or_try_insert_with(|| obj.resolve_long_field(&self.field_name))
            .map(|field| *field);

        match resolved {
            Ok(field) => {
                log::debug!("resolved {}.{}", class, self.field_name);
                field
            }
            Err(err) => panic!(
                "cannot resolve handle field {}.{}: {}",
                class, self.field_name, err
            ),
        }
    }

    /// Reads the handle stored in the object, if any.
    pub fn get<O>(&self, obj: &mut O) -> BridgeResult<Option<ContextHandle>>
    where
        O: ManagedObject<FieldId = F>,
    {
        let field = self.field_for(obj);
        let raw = obj.get_long(field)?;
        // Safety: the field is written only by `put`, which stores handles
        // produced by `ContextHandle::into_field`, and is cleared on destroy.
        Ok(unsafe { ContextHandle::from_field(raw) })
    }

    /// Stores a handle in the object, or clears the field with `None`.
    pub fn put<O>(&self, obj: &mut O, handle: Option<ContextHandle>) -> BridgeResult<()>
    where
        O: ManagedObject<FieldId = F>,
    {
        let field = self.field_for(obj);
        obj.set_long(field, handle.map_or(0, ContextHandle::into_field))
    }
}
