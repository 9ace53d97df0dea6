//! Reference counting handles
//!
//! Optimized for minimal overhead: acquire and release are a load and a
//! store on the header, and moving a handle never touches the count.
//! Hot path operations are always inlined.

use core::fmt;
use core::marker::PhantomData;
use core::ops::Deref;
use core::ptr::NonNull;

use super::ObjectType;
use crate::allocator::{alloc_object, payload, ObjectHeader};
use crate::error::{Error, Result};
use crate::logging::trace;
use crate::registry::TypeIndex;

/// Owning handle to a heap object of concrete type `T`
///
/// Design: intrusive strong reference with:
/// - Shallow cloning (count += 1, payload shared)
/// - Deterministic destruction on the last release
/// - Transfer by move (count unchanged)
///
/// A handle is never null; nullable slots use `Option<Ref<T>>`, which has
/// the same size.
pub struct Ref<T: ObjectType> {
    ptr: NonNull<ObjectHeader>,
    _marker: PhantomData<T>,
}

impl<T: ObjectType> Ref<T> {
    /// Allocate `value` behind a new header, owned by the returned handle
    #[inline]
    pub fn new(value: T) -> Self {
        let ptr = alloc_object(T::type_index(), value);
        trace!(event = "ref_new", address = ?ptr.as_ptr(), type_index = T::type_index().0);
        Self {
            ptr,
            _marker: PhantomData,
        }
    }

    /// Current reference count (for debugging and tests)
    #[inline]
    pub fn ref_count(this: &Self) -> u32 {
        Self::header(this).ref_count()
    }

    /// True when both handles reference the same allocation
    #[inline]
    pub fn ptr_eq(this: &Self, other: &Self) -> bool {
        this.ptr == other.ptr
    }

    /// Header of the referenced object
    #[inline]
    pub fn header(this: &Self) -> &ObjectHeader {
        unsafe { this.ptr.as_ref() }
    }

    /// Raw header pointer, without affecting the count
    #[inline]
    pub fn as_ptr(this: &Self) -> NonNull<ObjectHeader> {
        this.ptr
    }

    /// Convert to raw header pointer, consuming the handle without releasing
    #[inline]
    pub fn into_raw(this: Self) -> NonNull<ObjectHeader> {
        let ptr = this.ptr;
        core::mem::forget(this);
        ptr
    }

    /// Reclaim a handle from a pointer produced by `into_raw`
    ///
    /// Fails on a null pointer or a header of a different type; on failure
    /// the reference stays with the caller.
    ///
    /// # Safety
    /// A non-null `ptr` must point to a live header and carry one reference
    /// that the caller gives up on success.
    pub unsafe fn from_raw(ptr: *mut ObjectHeader) -> Result<Self> {
        let ptr = NonNull::new(ptr).ok_or_else(|| {
            Error::InvariantViolation(format!("null handle where `{}` is required", T::type_index()))
        })?;
        let actual = ptr.as_ref().type_index();
        if actual != T::type_index() {
            return Err(Error::type_mismatch(T::type_index().key(), actual.key()));
        }
        Ok(Self {
            ptr,
            _marker: PhantomData,
        })
    }

    /// Erase the concrete type, keeping the same reference
    #[inline]
    pub fn into_object(this: Self) -> ObjectRef {
        ObjectRef {
            ptr: Self::into_raw(this),
        }
    }

    /// A type-erased handle sharing this object (count += 1)
    #[inline]
    pub fn to_object(this: &Self) -> ObjectRef {
        Self::into_object(this.clone())
    }
}

impl<T: ObjectType> Clone for Ref<T> {
    #[inline]
    fn clone(&self) -> Self {
        Self::header(self).inc_ref();
        Self {
            ptr: self.ptr,
            _marker: PhantomData,
        }
    }
}

impl<T: ObjectType> Drop for Ref<T> {
    #[inline]
    fn drop(&mut self) {
        unsafe { ObjectHeader::dec_ref(self.ptr) }
    }
}

impl<T: ObjectType> Deref for Ref<T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        debug_assert_eq!(Self::header(self).type_index(), T::type_index());
        unsafe { payload(self.ptr) }
    }
}

impl<T: ObjectType + fmt::Debug> fmt::Debug for Ref<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&**self, f)
    }
}

/// Type-erased owning handle, the form in which `Any` stores objects
///
/// Same acquire/release behavior as `Ref<T>`; the concrete type is known
/// only through the header's type index.
pub struct ObjectRef {
    ptr: NonNull<ObjectHeader>,
}

impl ObjectRef {
    /// Dynamic type of the referenced object
    #[inline]
    pub fn type_index(&self) -> TypeIndex {
        self.header().type_index()
    }

    #[inline]
    pub fn ref_count(&self) -> u32 {
        self.header().ref_count()
    }

    #[inline]
    pub fn header(&self) -> &ObjectHeader {
        unsafe { self.ptr.as_ref() }
    }

    #[inline]
    pub fn as_ptr(&self) -> NonNull<ObjectHeader> {
        self.ptr
    }

    /// Identity comparison
    #[inline]
    pub fn ptr_eq(&self, other: &ObjectRef) -> bool {
        self.ptr == other.ptr
    }

    /// True when the object's dynamic type is `T`
    #[inline]
    pub fn is<T: ObjectType>(&self) -> bool {
        self.type_index() == T::type_index()
    }

    /// Borrow the payload as `T` if the type index matches
    #[inline]
    pub fn downcast_ref<T: ObjectType>(&self) -> Option<&T> {
        if self.is::<T>() {
            Some(unsafe { payload(self.ptr) })
        } else {
            None
        }
    }

    /// Recover the typed handle, failing with `TypeMismatch` on another type
    pub fn downcast<T: ObjectType>(self) -> Result<Ref<T>> {
        if !self.is::<T>() {
            return Err(Error::type_mismatch(T::type_index().key(), self.type_index().key()));
        }
        let ptr = self.into_raw();
        Ok(Ref {
            ptr,
            _marker: PhantomData,
        })
    }

    /// Typed handle sharing this object (count += 1)
    pub fn downcast_cloned<T: ObjectType>(&self) -> Result<Ref<T>> {
        self.clone().downcast()
    }

    /// Convert to raw header pointer, consuming the handle without releasing
    #[inline]
    pub fn into_raw(self) -> NonNull<ObjectHeader> {
        let ptr = self.ptr;
        core::mem::forget(self);
        ptr
    }

    /// Reclaim a handle from a pointer carrying one reference
    ///
    /// # Safety
    /// A non-null `ptr` must point to a live header; the caller gives up the
    /// reference it holds.
    pub unsafe fn from_raw(ptr: *mut ObjectHeader) -> Result<Self> {
        NonNull::new(ptr)
            .map(|ptr| Self { ptr })
            .ok_or_else(|| Error::InvariantViolation("null object handle".to_string()))
    }

    /// New handle to an object the caller only borrows (count += 1)
    ///
    /// # Safety
    /// `ptr` must point to a live header.
    pub unsafe fn from_borrowed(ptr: NonNull<ObjectHeader>) -> Self {
        ptr.as_ref().inc_ref();
        Self { ptr }
    }
}

impl Clone for ObjectRef {
    #[inline]
    fn clone(&self) -> Self {
        self.header().inc_ref();
        Self { ptr: self.ptr }
    }
}

impl Drop for ObjectRef {
    #[inline]
    fn drop(&mut self) {
        unsafe { ObjectHeader::dec_ref(self.ptr) }
    }
}

impl<T: ObjectType> From<Ref<T>> for ObjectRef {
    #[inline]
    fn from(handle: Ref<T>) -> Self {
        Ref::into_object(handle)
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{:p}", self.type_index(), self.ptr.as_ptr())
    }
}
