//! Object header - the fixed prefix of every managed heap allocation
//!
//! Design: the header is the first field of a `#[repr(C)]` box, so a pointer
//! to the allocation and a pointer to its header are the same address.
//! Handles only ever hold `NonNull<ObjectHeader>`; the concrete payload is
//! recovered through the type index.

use core::cell::Cell;
use core::ptr::NonNull;

use crate::registry::TypeIndex;

/// Destruction callback stored in every header.
///
/// Invoked exactly once, when the count drops from 1 to 0. It must drop the
/// payload and release the allocation the header lives in.
pub type Deleter = unsafe fn(NonNull<ObjectHeader>);

/// Object header - prefixed before every heap object
///
/// Counts are plain integers: a handle and the object it references belong
/// to one thread at a time, so none of these types are `Send` or `Sync`.
#[repr(C)]
pub struct ObjectHeader {
    type_index: TypeIndex,
    ref_count: Cell<u32>,
    deleter: Deleter,
}

impl ObjectHeader {
    /// Create header for a new object, owned by exactly one handle
    #[inline]
    pub const fn new(type_index: TypeIndex, deleter: Deleter) -> Self {
        Self {
            type_index,
            ref_count: Cell::new(1),
            deleter,
        }
    }

    /// Dynamic type of the object this header belongs to
    #[inline]
    pub fn type_index(&self) -> TypeIndex {
        self.type_index
    }

    /// Number of live owning handles
    #[inline]
    pub fn ref_count(&self) -> u32 {
        self.ref_count.get()
    }

    /// Increment reference count (hot path, always inlined)
    #[inline(always)]
    pub fn inc_ref(&self) {
        let old = self.ref_count.get();
        debug_assert!(old > 0, "inc_ref on a destroyed object");
        if old == u32::MAX {
            refcount_overflow();
        }
        self.ref_count.set(old + 1);
    }

    /// Decrement reference count, running the deleter on the last release
    ///
    /// # Safety
    /// `ptr` must point to a live header and the caller must give up the
    /// reference it is releasing.
    #[inline(always)]
    pub unsafe fn dec_ref(ptr: NonNull<ObjectHeader>) {
        let header = ptr.as_ref();
        let old = header.ref_count.get();
        debug_assert!(old > 0, "refcount underflow");
        header.ref_count.set(old - 1);

        if old == 1 {
            let deleter = header.deleter;
            deleter(ptr);
        }
    }
}

impl core::fmt::Debug for ObjectHeader {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ObjectHeader")
            .field("type_index", &self.type_index)
            .field("ref_count", &self.ref_count.get())
            .finish()
    }
}

#[cold]
#[inline(never)]
fn refcount_overflow() -> ! {
    crate::logging::log_runtime_error("reference count overflow", "ObjectHeader::inc_ref");
    std::process::abort()
}
