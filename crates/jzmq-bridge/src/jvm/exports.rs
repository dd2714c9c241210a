//! Native methods of `org.zeromq.ZMQ` and `org.zeromq.ZMQ$Context`.

use super::{JniObject, JniTarget};
use crate::config::BridgeConfig;
use crate::context::ContextBridge;
use crate::error::{BridgeError, BridgeResult};
use crate::exception::{self, ExceptionSink, ManagedException};
use crate::logging;
use jni::objects::{JClass, JFieldID, JObject, JThrowable, JValue};
use jni::sys::{jboolean, jint, JNI_VERSION_1_8};
use jni::{JNIEnv, JavaVM};
use once_cell::sync::OnceCell;
use std::ffi::c_void;
use zmq_ctx::{ContextApi, LibZmq};

type JniBridge = ContextBridge<LibZmq, JFieldID>;

static BRIDGE: OnceCell<JniBridge> = OnceCell::new();

/// Returns the process-wide bridge, creating it on first use.
pub fn bridge() -> &'static JniBridge {
    BRIDGE.get_or_init(|| {
        let (config, load_err) = match BridgeConfig::load() {
            Ok(config) => (config, None),
            Err(err) => (BridgeConfig::default(), Some(err)),
        };
        logging::init(&config.logging);
        if let Some(err) = load_err {
            log::warn!("{}, using defaults", err);
        }

        let bridge = ContextBridge::new(LibZmq::new(), config);
        log::info!("jzmq bridge ready, libzmq {}", bridge.native_version());
        bridge
    })
}

#[no_mangle]
pub extern "system" fn JNI_OnLoad(_vm: JavaVM, _reserved: *mut c_void) -> jint {
    bridge();
    JNI_VERSION_1_8
}

/// Throws exceptions through the current JNI environment.
struct JniThrower<'a, 'local> {
    env: &'a mut JNIEnv<'local>,
    exception_class: &'a str,
}

impl ExceptionSink for JniThrower<'_, '_> {
    fn exception_pending(&mut self) -> bool {
        self.env.exception_check().unwrap_or(false)
    }

    fn throw(&mut self, exception: &ManagedException) -> BridgeResult<()> {
        match exception {
            ManagedException::Native { message, code } => {
                let message = self.env.new_string(message)?;
                let exception = self.env.new_object(
                    self.exception_class,
                    "(Ljava/lang/String;I)V",
                    &[JValue::Object(&message), JValue::Int(*code)],
                )?;
                self.env.throw(JThrowable::from(exception))?;
            }
            ManagedException::IllegalState { message } => {
                self.env.throw_new("java/lang/IllegalStateException", message)?;
            }
        }
        Ok(())
    }
}

fn raise(env: &mut JNIEnv<'_>, err: &BridgeError) {
    let bridge = bridge();
    let mut thrower = JniThrower {
        env,
        exception_class: &bridge.config().bindings.exception_class,
    };
    exception::raise(&mut thrower, err, |code| bridge.native().strerror(code));
}

#[no_mangle]
pub extern "system" fn Java_org_zeromq_ZMQ_00024Context_construct<'local>(
    mut env: JNIEnv<'local>,
    obj: JObject<'local>,
    io_threads: jint,
) {
    let bridge = bridge();
    let mut holder = JniObject::new(&mut env, &obj, bridge.context_class());
    if let Err(err) = bridge.construct(&mut holder, io_threads) {
        raise(&mut env, &err);
    }
}

#[no_mangle]
pub extern "system" fn Java_org_zeromq_ZMQ_00024Context_destroy<'local>(
    mut env: JNIEnv<'local>,
    obj: JObject<'local>,
) {
    let bridge = bridge();
    let mut holder = JniObject::new(&mut env, &obj, bridge.context_class());
    if let Err(err) = bridge.destroy(&mut holder) {
        raise(&mut env, &err);
    }
}

#[no_mangle]
pub extern "system" fn Java_org_zeromq_ZMQ_00024Context_setErrorHandler<'local>(
    mut env: JNIEnv<'local>,
    obj: JObject<'local>,
    handler: JObject<'local>,
) -> jboolean {
    let bridge = bridge();
    let target = if handler.is_null() {
        None
    } else {
        // Safety: the clone is used only on this thread and within this call.
        Some(JniTarget::new(unsafe { env.unsafe_clone() }, &handler))
    };
    let mut holder = JniObject::new(&mut env, &obj, bridge.context_class());
    jboolean::from(bridge.set_error_handler(&mut holder, target))
}

#[no_mangle]
pub extern "system" fn Java_org_zeromq_ZMQ_00024Context_setMaxSockets<'local>(
    mut env: JNIEnv<'local>,
    obj: JObject<'local>,
    max_sockets: jint,
) -> jboolean {
    let bridge = bridge();
    let mut holder = JniObject::new(&mut env, &obj, bridge.context_class());
    jboolean::from(bridge.set_max_sockets(&mut holder, max_sockets))
}

#[no_mangle]
pub extern "system" fn Java_org_zeromq_ZMQ_00024Context_getMaxSockets<'local>(
    mut env: JNIEnv<'local>,
    obj: JObject<'local>,
) -> jint {
    let bridge = bridge();
    let mut holder = JniObject::new(&mut env, &obj, bridge.context_class());
    bridge.get_max_sockets(&mut holder)
}

#[no_mangle]
pub extern "system" fn Java_org_zeromq_ZMQ_version_1full(_env: JNIEnv, _class: JClass) -> jint {
    bridge().native_version().packed()
}

#[no_mangle]
pub extern "system" fn Java_org_zeromq_ZMQ_version_1major(_env: JNIEnv, _class: JClass) -> jint {
    bridge().native_version().major
}

#[no_mangle]
pub extern "system" fn Java_org_zeromq_ZMQ_version_1minor(_env: JNIEnv, _class: JClass) -> jint {
    bridge().native_version().minor
}

#[no_mangle]
pub extern "system" fn Java_org_zeromq_ZMQ_version_1patch(_env: JNIEnv, _class: JClass) -> jint {
    bridge().native_version().patch
}
