use super::clear_pending;
use crate::error::{BridgeError, BridgeResult};
use crate::object::ManagedObject;
use jni::objects::{JFieldID, JObject, JValue};
use jni::signature::{Primitive, ReturnType};
use jni::JNIEnv;

/// A Java object seen through the current JNI environment.
///
/// `class` is the cache key for the handle field. It is the configured
/// binding class rather than the runtime class, so subclasses share the
/// descriptor resolved for their parent.
pub struct JniObject<'a, 'local> {
    env: &'a mut JNIEnv<'local>,
    obj: &'a JObject<'local>,
    class: &'a str,
}

impl<'a, 'local> JniObject<'a, 'local> {
    pub fn new(env: &'a mut JNIEnv<'local>, obj: &'a JObject<'local>, class: &'a str) -> Self {
        Self { env, obj, class }
    }
}

impl ManagedObject for JniObject<'_, '_> {
    type FieldId = JFieldID;

    fn class_name(&self) -> &str {
        self.class
    }

    fn resolve_long_field(&mut self, name: &str) -> BridgeResult<JFieldID> {
        let class = self.env.get_object_class(self.obj)?;
        self.env.get_field_id(&class, name, "J").map_err(|_| {
            clear_pending(self.env);
            BridgeError::FieldNotFound {
                class: self.class.to_string(),
                field: name.to_string(),
            }
        })
    }

    fn get_long(&mut self, field: JFieldID) -> BridgeResult<i64> {
        // Safety: `field` was resolved as a `long` field of this object's class.
        let value = unsafe {
            self.env
                .get_field_unchecked(self.obj, field, ReturnType::Primitive(Primitive::Long))
        }?;
        Ok(value.j()?)
    }

    fn set_long(&mut self, field: JFieldID, value: i64) -> BridgeResult<()> {
        // Safety: as for `get_long`.
        unsafe { self.env.set_field_unchecked(self.obj, field, JValue::Long(value)) }?;
        Ok(())
    }
}
