//! Object system - the universal `Any` value
//!
//! Design: a closed sum type instead of tagged pointers:
//! - Primitives inline (bool, 64-bit int, 64-bit float, raw pointer)
//! - POD descriptors inline (device, data type)
//! - Everything else as an owned `ObjectRef` (strings, dicts, user objects)
//!
//! Cloning an `Any` that holds an object acquires a reference; dropping or
//! overwriting it releases one.

mod convert;
mod hash;
mod pod;

pub use hash::{any_equal, any_hash};
pub use pod::{DataType, Device};

use core::ffi::c_void;
use core::fmt;

use crate::builtins::{Str, StrObj, UDict, UDictObj};
use crate::rc::{ObjectRef, ObjectType, Ref};
use crate::registry::TypeIndex;

/// Type-erased value passed across API boundaries
#[derive(Clone, Default)]
pub enum Any {
    #[default]
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Device(Device),
    DataType(DataType),
    Ptr(*mut c_void),
    Object(ObjectRef),
}

impl Any {
    /// Type tag of the stored value; object types report their own index
    pub fn tag(&self) -> TypeIndex {
        match self {
            Any::None => TypeIndex::NONE,
            Any::Bool(_) => TypeIndex::BOOL,
            Any::Int(_) => TypeIndex::INT,
            Any::Float(_) => TypeIndex::FLOAT,
            Any::Device(_) => TypeIndex::DEVICE,
            Any::DataType(_) => TypeIndex::DATA_TYPE,
            Any::Ptr(_) => TypeIndex::PTR,
            Any::Object(obj) => obj.type_index(),
        }
    }

    /// Registered key of the stored value's type (`"int"`, `"object.Str"`, ...)
    pub fn type_key(&self) -> String {
        self.tag().key()
    }

    #[inline]
    pub fn is_none(&self) -> bool {
        matches!(self, Any::None)
    }

    #[inline]
    pub fn is_object(&self) -> bool {
        matches!(self, Any::Object(_))
    }

    /// True when the value is an object of type `T`
    pub fn is<T: ObjectType>(&self) -> bool {
        self.as_object().is_some_and(|obj| obj.is::<T>())
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Any::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Any::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Any::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_device(&self) -> Option<Device> {
        match self {
            Any::Device(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_dtype(&self) -> Option<DataType> {
        match self {
            Any::DataType(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_ptr(&self) -> Option<*mut c_void> {
        match self {
            Any::Ptr(p) => Some(*p),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Any::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Borrow the payload of an object of type `T`
    pub fn downcast_ref<T: ObjectType>(&self) -> Option<&T> {
        self.as_object().and_then(|obj| obj.downcast_ref::<T>())
    }

    /// Borrow the string content, if this holds a `Str`
    pub fn as_str_obj(&self) -> Option<&StrObj> {
        self.downcast_ref::<StrObj>()
    }

    /// Typed extraction with the conversion rules of `TryFrom<&Any>`
    ///
    /// ```ignore
    /// let n: i32 = value.cast()?;
    /// ```
    pub fn cast<'a, T>(&'a self) -> crate::Result<T>
    where
        T: TryFrom<&'a Any, Error = crate::Error>,
    {
        T::try_from(self)
    }

    /// Replace with `None`, returning the previous value
    #[inline]
    pub fn take(&mut self) -> Any {
        core::mem::take(self)
    }
}

impl fmt::Display for Any {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Any::None => f.write_str("None"),
            Any::Bool(b) => write!(f, "{}", b),
            Any::Int(v) => write!(f, "{}", v),
            Any::Float(v) => write!(f, "{:?}", v),
            Any::Device(d) => write!(f, "{}", d),
            Any::DataType(d) => write!(f, "{}", d),
            Any::Ptr(p) => write!(f, "{:p}", *p),
            Any::Object(obj) => fmt_object(obj, f, false),
        }
    }
}

impl fmt::Debug for Any {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Any::Object(obj) => fmt_object(obj, f, true),
            Any::Device(d) => write!(f, "Device({})", d),
            Any::DataType(d) => write!(f, "DataType({})", d),
            other => fmt::Display::fmt(other, f),
        }
    }
}

fn fmt_object(obj: &ObjectRef, f: &mut fmt::Formatter<'_>, debug: bool) -> fmt::Result {
    if let Some(s) = obj.downcast_ref::<StrObj>() {
        return if debug {
            write!(f, "{:?}", s.to_string_lossy())
        } else {
            fmt::Display::fmt(s, f)
        };
    }
    if let Some(dict) = obj.downcast_ref::<UDictObj>() {
        return fmt::Debug::fmt(dict, f);
    }
    write!(f, "{:?}", obj)
}

/// Typed handles that can stand in an `Any`
impl From<ObjectRef> for Any {
    #[inline]
    fn from(obj: ObjectRef) -> Self {
        Any::Object(obj)
    }
}

impl<T: ObjectType> From<Ref<T>> for Any {
    #[inline]
    fn from(handle: Ref<T>) -> Self {
        Any::Object(Ref::into_object(handle))
    }
}

impl From<Str> for Any {
    #[inline]
    fn from(s: Str) -> Self {
        Any::Object(s.into_object())
    }
}

impl From<UDict> for Any {
    #[inline]
    fn from(dict: UDict) -> Self {
        Any::Object(dict.into_object())
    }
}
