//! Object allocation - header-prefixed boxes with matching deleters
//!
//! Design: every managed object lives in an `ObjectBox<T>`:
//! 1. `ObjectHeader` first (type index, ref count, deleter)
//! 2. The payload `T` directly after it
//!
//! The deleter is monomorphized per payload type, so destroying an object
//! through a type-erased header still drops the right `T` and frees the
//! right layout.

mod header;


pub use header::{Deleter, ObjectHeader};

use core::ptr::NonNull;
use std::alloc::{alloc, dealloc, handle_alloc_error, Layout};
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::logging::{log_allocation, log_deallocation};
use crate::registry::TypeIndex;

/// Header-prefixed allocation holding one payload
#[repr(C)]
pub struct ObjectBox<T> {
    header: ObjectHeader,
    value: T,
}

static STATS: AllocCounters = AllocCounters::new();

struct AllocCounters {
    allocated: AtomicUsize,
    freed: AtomicUsize,
    bytes_allocated: AtomicUsize,
}

impl AllocCounters {
    const fn new() -> Self {
        Self {
            allocated: AtomicUsize::new(0),
            freed: AtomicUsize::new(0),
            bytes_allocated: AtomicUsize::new(0),
        }
    }
}

/// Allocate `value` behind a fresh header with `ref_count = 1`
///
/// The returned pointer owns that single reference.
pub fn alloc_object<T>(type_index: TypeIndex, value: T) -> NonNull<ObjectHeader> {
    let layout = Layout::new::<ObjectBox<T>>();

    unsafe {
        let raw = alloc(layout) as *mut ObjectBox<T>;
        let Some(ptr) = NonNull::new(raw) else {
            handle_alloc_error(layout);
        };

        ptr.as_ptr().write(ObjectBox {
            header: ObjectHeader::new(type_index, drop_object::<T>),
            value,
        });

        STATS.allocated.fetch_add(1, Ordering::Relaxed);
        STATS.bytes_allocated.fetch_add(layout.size(), Ordering::Relaxed);
        log_allocation(layout.size(), ptr.as_ptr() as *const u8);

        ptr.cast()
    }
}

/// Deleter installed by `alloc_object::<T>`
unsafe fn drop_object<T>(ptr: NonNull<ObjectHeader>) {
    let boxed = ptr.cast::<ObjectBox<T>>().as_ptr();
    let layout = Layout::new::<ObjectBox<T>>();

    log_deallocation(boxed as *const u8);

    core::ptr::drop_in_place(boxed);
    dealloc(boxed as *mut u8, layout);

    STATS.freed.fetch_add(1, Ordering::Relaxed);
}

/// Borrow the payload of a header allocated by `alloc_object::<T>`
///
/// # Safety
/// The header must be live and its allocation must hold a `T`.
#[inline]
pub unsafe fn payload<'a, T>(ptr: NonNull<ObjectHeader>) -> &'a T {
    &(*ptr.cast::<ObjectBox<T>>().as_ptr()).value
}

/// Get allocator statistics
pub fn stats() -> AllocatorStats {
    let allocated = STATS.allocated.load(Ordering::Relaxed);
    let freed = STATS.freed.load(Ordering::Relaxed);
    AllocatorStats {
        objects_allocated: allocated,
        objects_freed: freed,
        live_objects: allocated.saturating_sub(freed),
        bytes_allocated: STATS.bytes_allocated.load(Ordering::Relaxed),
    }
}

/// Allocator statistics for monitoring and debugging
#[derive(Debug, Clone, Copy)]
pub struct AllocatorStats {
    pub objects_allocated: usize,
    pub objects_freed: usize,
    pub live_objects: usize,
    pub bytes_allocated: usize,
}
