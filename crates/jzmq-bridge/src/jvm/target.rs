use super::{clear_pending, describe_pending, JniVm};
use crate::callback::{CallbackTarget, ErrorCallback, Registration};
use crate::config::BindingConfig;
use crate::error::{BridgeError, BridgeResult};
use jni::objects::{GlobalRef, JClass, JMethodID, JObject, JStaticMethodID, JValue};
use jni::signature::{Primitive, ReturnType};
use jni::JNIEnv;
use std::sync::Arc;

/// Local capacity of the frame used for one error report.
const REPORT_FRAME_CAPACITY: i32 = 4;

/// A Java object passed to `setErrorHandler`.
pub struct JniTarget<'a, 'local> {
    env: JNIEnv<'local>,
    target: &'a JObject<'local>,
}

impl<'a, 'local> JniTarget<'a, 'local> {
    pub fn new(env: JNIEnv<'local>, target: &'a JObject<'local>) -> Self {
        Self { env, target }
    }
}

impl CallbackTarget for JniTarget<'_, '_> {
    type Method = JMethodID;
    type Translator = (GlobalRef, JStaticMethodID);

    fn report_method(&mut self, bindings: &BindingConfig) -> BridgeResult<JMethodID> {
        let class = self.env.get_object_class(self.target)?;
        self.env
            .get_method_id(&class, &bindings.report_method, &bindings.report_signature)
            .map_err(|_| {
                clear_pending(&mut self.env);
                BridgeError::MethodNotFound {
                    name: bindings.report_method.clone(),
                    signature: bindings.report_signature.clone(),
                }
            })
    }

    fn translator(&mut self, bindings: &BindingConfig) -> BridgeResult<Self::Translator> {
        let class = self.env.find_class(&bindings.error_class).map_err(|_| {
            clear_pending(&mut self.env);
            BridgeError::ClassNotFound {
                class: bindings.error_class.clone(),
            }
        })?;
        let method = self
            .env
            .get_static_method_id(
                &class,
                &bindings.translator_method,
                &bindings.translator_signature,
            )
            .map_err(|_| {
                clear_pending(&mut self.env);
                BridgeError::MethodNotFound {
                    name: bindings.translator_method.clone(),
                    signature: bindings.translator_signature.clone(),
                }
            })?;
        Ok((self.env.new_global_ref(&class)?, method))
    }

    fn pin(
        self,
        method: JMethodID,
        translator: Option<Self::Translator>,
    ) -> BridgeResult<Registration> {
        let target = self.env.new_global_ref(self.target)?;
        let vm = Arc::new(JniVm::new(self.env.get_java_vm()?));
        let callback = JniErrorCallback {
            vm: vm.clone(),
            target,
            method,
            translator,
        };
        Ok(Registration::new(vm, Box::new(callback)))
    }
}

/// Calls `reportError(ZMQ.Error, String)` on a pinned handler object.
pub struct JniErrorCallback {
    vm: Arc<JniVm>,
    target: GlobalRef,
    method: JMethodID,
    translator: Option<(GlobalRef, JStaticMethodID)>,
}

impl JniErrorCallback {
    fn translate<'local>(&self, env: &mut JNIEnv<'local>, code: i32) -> JObject<'local> {
        let Some((class, method)) = &self.translator else {
            return JObject::null();
        };
        let class: &JClass = class.as_obj().into();

        // Safety: `method` is a static method of `class` taking an int and
        // returning an object.
        let translated = unsafe {
            env.call_static_method_unchecked(
                class,
                *method,
                ReturnType::Object,
                &[JValue::Int(code).as_jni()],
            )
        }
        .and_then(|value| value.l());

        match translated {
            Ok(obj) => obj,
            Err(err) => {
                log::warn!("cannot translate error {}: {}", code, err);
                describe_pending(env);
                JObject::null()
            }
        }
    }
}

impl ErrorCallback for JniErrorCallback {
    fn report_error(&self, code: i32, host: &str) -> BridgeResult<i32> {
        let mut env = self.vm.env()?;

        let reply = env.with_local_frame(REPORT_FRAME_CAPACITY, |env| -> BridgeResult<i32> {
            let error = self.translate(env, code);
            let host = env.new_string(host)?;

            // Safety: `method` was resolved on the target's class with the
            // configured `(error, String) -> int` signature.
            let reply = unsafe {
                env.call_method_unchecked(
                    self.target.as_obj(),
                    self.method,
                    ReturnType::Primitive(Primitive::Int),
                    &[JValue::Object(&error).as_jni(), JValue::Object(&host).as_jni()],
                )
            }?;
            Ok(reply.i()?)
        });

        describe_pending(&mut env);
        reply
    }
}
