//! Reference counting - C API for refcount operations

use core::ptr::NonNull;

use crate::allocator::ObjectHeader;
use crate::registry::TypeIndex;

/// Acquire one reference
///
/// # Safety
/// - Null-safe (no-op for null pointers)
/// - Non-null `obj` must point to a live object header
#[no_mangle]
pub unsafe extern "C" fn anyrt_object_inc_ref(obj: *mut ObjectHeader) {
    if let Some(header) = NonNull::new(obj) {
        header.as_ref().inc_ref();
    }
}

/// Release one reference, destroying the object when it was the last
///
/// # Safety
/// - Null-safe (no-op for null pointers)
/// - The caller must own the reference being released
#[no_mangle]
pub unsafe extern "C" fn anyrt_object_dec_ref(obj: *mut ObjectHeader) {
    if let Some(header) = NonNull::new(obj) {
        ObjectHeader::dec_ref(header);
    }
}

/// Current reference count (for debugging/testing)
///
/// # Safety
/// - Returns 0 for null pointers
/// - Non-null `obj` must point to a live object header
#[no_mangle]
pub unsafe extern "C" fn anyrt_object_ref_count(obj: *const ObjectHeader) -> u32 {
    obj.as_ref().map_or(0, ObjectHeader::ref_count)
}

/// Type index recorded in the header; `TypeIndex::NONE` for null
///
/// # Safety
/// Non-null `obj` must point to a live object header.
#[no_mangle]
pub unsafe extern "C" fn anyrt_object_type_index(obj: *const ObjectHeader) -> i32 {
    obj.as_ref()
        .map_or(TypeIndex::NONE, ObjectHeader::type_index)
        .0
}
