//! C FFI - Stable ABI for object lifetime
//!
//! Design: thin `extern "C"` wrappers over the Rust handles:
//! 1. Reference counting (inc/dec, count, type index)
//! 2. String construction and access
//! 3. Runtime lifecycle
//!
//! An object crosses the boundary as a pointer to its `ObjectHeader`. A
//! pointer returned by an `anyrt_*_new` function carries one reference that
//! the caller must release with `anyrt_object_dec_ref`. Null pointers are
//! accepted everywhere and treated as "no object".

mod object;
mod refcount;

pub use object::{anyrt_str_data, anyrt_str_len, anyrt_str_new};
pub use refcount::{
    anyrt_object_dec_ref, anyrt_object_inc_ref, anyrt_object_ref_count, anyrt_object_type_index,
};

use crate::logging::log_ffi_error;

/// Initialize the runtime from the environment (idempotent)
///
/// Returns 0 on success, -1 if the environment configuration is invalid.
#[no_mangle]
pub extern "C" fn anyrt_runtime_init() -> i32 {
    match crate::runtime_init() {
        Ok(()) => 0,
        Err(e) => {
            log_ffi_error("anyrt_runtime_init", &e.to_string());
            -1
        }
    }
}

/// Flush logs and restore default configuration
#[no_mangle]
pub extern "C" fn anyrt_runtime_cleanup() {
    crate::runtime_cleanup();
}
