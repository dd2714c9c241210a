//! Build script for zmq-ctx crate.
//!
//! When the `libzmq-link` feature is enabled this links against the system
//! libzmq. `LIBZMQ_LIB_DIR` adds an extra library search path for builds
//! against a locally installed library.

use std::env;

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=LIBZMQ_LIB_DIR");

    if env::var_os("CARGO_FEATURE_LIBZMQ_LINK").is_none() {
        return;
    }

    if let Some(dir) = env::var_os("LIBZMQ_LIB_DIR") {
        println!("cargo:rustc-link-search=native={}", dir.to_string_lossy());
    }
    println!("cargo:rustc-link-lib=zmq");
}
