//! String objects across the C boundary

use core::ptr::{self, NonNull};
use std::ffi::c_char;

use crate::allocator::{payload, ObjectHeader};
use crate::builtins::{Str, StrObj};
use crate::logging::log_ffi_error;
use crate::registry::TypeIndex;

/// Copy a NUL-terminated C string into a new `Str`
///
/// Returns an owned reference, or null (with a logged error) for a null input.
///
/// # Safety
/// Non-null `data` must point to a NUL-terminated buffer.
#[no_mangle]
pub unsafe extern "C" fn anyrt_str_new(data: *const c_char) -> *mut ObjectHeader {
    match Str::from_c_ptr(data) {
        Ok(s) => s.into_object().into_raw().as_ptr(),
        Err(e) => {
            log_ffi_error("anyrt_str_new", &e.to_string());
            ptr::null_mut()
        }
    }
}

unsafe fn as_str_obj<'a>(obj: *const ObjectHeader) -> Option<&'a StrObj> {
    let header = NonNull::new(obj as *mut ObjectHeader)?;
    if header.as_ref().type_index() != TypeIndex::STR {
        return None;
    }
    Some(payload::<StrObj>(header))
}

/// NUL-terminated content of a string object; null if `obj` is not a `Str`
///
/// The pointer stays valid while the caller holds a reference to `obj`.
///
/// # Safety
/// Non-null `obj` must point to a live object header.
#[no_mangle]
pub unsafe extern "C" fn anyrt_str_data(obj: *const ObjectHeader) -> *const c_char {
    as_str_obj(obj).map_or(ptr::null(), StrObj::as_ptr)
}

/// Byte length of a string object, excluding the terminator; 0 if not a `Str`
///
/// # Safety
/// Non-null `obj` must point to a live object header.
#[no_mangle]
pub unsafe extern "C" fn anyrt_str_len(obj: *const ObjectHeader) -> usize {
    as_str_obj(obj).map_or(0, StrObj::len)
}
