//! Conversions into and out of `Any`
//!
//! Construction is infallible for every supported type. Extraction checks
//! the tag and fails with `TypeMismatch`; the only cross-tag conversions are
//! between int and float (float -> int only when the value is integral and
//! in range).

use core::ffi::c_void;

use num_traits::NumCast;

use super::{Any, DataType, Device};
use crate::builtins::{Str, StrObj, UDict, UDictObj};
use crate::error::{Error, Result};
use crate::logging::log_type_conversion;
use crate::rc::{ObjectRef, ObjectType, Ref};

impl From<bool> for Any {
    #[inline]
    fn from(v: bool) -> Self {
        Any::Bool(v)
    }
}

macro_rules! impl_from_int {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Any {
                #[inline]
                fn from(v: $ty) -> Self {
                    Any::Int(<i64 as From<$ty>>::from(v))
                }
            }
        )*
    };
}

impl_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<f32> for Any {
    #[inline]
    fn from(v: f32) -> Self {
        Any::Float(<f64 as From<f32>>::from(v))
    }
}

impl From<f64> for Any {
    #[inline]
    fn from(v: f64) -> Self {
        Any::Float(v)
    }
}

impl From<Device> for Any {
    #[inline]
    fn from(v: Device) -> Self {
        Any::Device(v)
    }
}

impl From<DataType> for Any {
    #[inline]
    fn from(v: DataType) -> Self {
        Any::DataType(v)
    }
}

impl From<*mut c_void> for Any {
    #[inline]
    fn from(v: *mut c_void) -> Self {
        Any::Ptr(v)
    }
}

impl From<&str> for Any {
    fn from(v: &str) -> Self {
        Any::from(Str::from(v))
    }
}

impl From<String> for Any {
    fn from(v: String) -> Self {
        Any::from(Str::from(v))
    }
}

impl From<&Str> for Any {
    fn from(v: &Str) -> Self {
        Any::from(v.clone())
    }
}

impl From<&Any> for Any {
    #[inline]
    fn from(v: &Any) -> Self {
        v.clone()
    }
}

impl<T: Into<Any>> From<Option<T>> for Any {
    fn from(v: Option<T>) -> Self {
        v.map_or(Any::None, Into::into)
    }
}

fn mismatch(expected: &str, value: &Any) -> Error {
    Error::type_mismatch(expected, value.type_key())
}

impl TryFrom<&Any> for bool {
    type Error = Error;

    fn try_from(value: &Any) -> Result<Self> {
        value.as_bool().ok_or_else(|| mismatch("bool", value))
    }
}

impl TryFrom<&Any> for i64 {
    type Error = Error;

    fn try_from(value: &Any) -> Result<Self> {
        match value {
            Any::Int(v) => Ok(*v),
            Any::Float(v) if v.fract() == 0.0 => {
                log_type_conversion("float", "int");
                <i64 as NumCast>::from(*v).ok_or_else(|| mismatch("int", value))
            }
            _ => Err(mismatch("int", value)),
        }
    }
}

macro_rules! impl_try_from_int {
    ($($ty:ty),*) => {
        $(
            impl TryFrom<&Any> for $ty {
                type Error = Error;

                fn try_from(value: &Any) -> Result<Self> {
                    let wide = i64::try_from(value)?;
                    <$ty as NumCast>::from(wide).ok_or_else(|| {
                        Error::type_mismatch(stringify!($ty), format!("int({})", wide))
                    })
                }
            }
        )*
    };
}

impl_try_from_int!(i8, i16, i32, isize, u8, u16, u32, u64, usize);

impl TryFrom<&Any> for f64 {
    type Error = Error;

    fn try_from(value: &Any) -> Result<Self> {
        match value {
            Any::Float(v) => Ok(*v),
            Any::Int(v) => {
                log_type_conversion("int", "float");
                Ok(*v as f64)
            }
            _ => Err(mismatch("float", value)),
        }
    }
}

impl TryFrom<&Any> for f32 {
    type Error = Error;

    fn try_from(value: &Any) -> Result<Self> {
        f64::try_from(value).map(|v| v as f32)
    }
}

impl TryFrom<&Any> for Device {
    type Error = Error;

    fn try_from(value: &Any) -> Result<Self> {
        value.as_device().ok_or_else(|| mismatch("Device", value))
    }
}

impl TryFrom<&Any> for DataType {
    type Error = Error;

    fn try_from(value: &Any) -> Result<Self> {
        value.as_dtype().ok_or_else(|| mismatch("dtype", value))
    }
}

impl TryFrom<&Any> for *mut c_void {
    type Error = Error;

    /// `None` converts to a null pointer
    fn try_from(value: &Any) -> Result<Self> {
        match value {
            Any::Ptr(p) => Ok(*p),
            Any::None => Ok(core::ptr::null_mut()),
            _ => Err(mismatch("Ptr", value)),
        }
    }
}

impl TryFrom<&Any> for ObjectRef {
    type Error = Error;

    fn try_from(value: &Any) -> Result<Self> {
        value.as_object().cloned().ok_or_else(|| mismatch("object.Object", value))
    }
}

impl TryFrom<Any> for ObjectRef {
    type Error = Error;

    fn try_from(value: Any) -> Result<Self> {
        match value {
            Any::Object(obj) => Ok(obj),
            other => Err(mismatch("object.Object", &other)),
        }
    }
}

impl<T: ObjectType> TryFrom<&Any> for Ref<T> {
    type Error = Error;

    fn try_from(value: &Any) -> Result<Self> {
        match value {
            Any::Object(obj) => obj.downcast_cloned::<T>(),
            other => Err(Error::type_mismatch(T::type_index().key(), other.type_key())),
        }
    }
}

impl<T: ObjectType> TryFrom<Any> for Ref<T> {
    type Error = Error;

    fn try_from(value: Any) -> Result<Self> {
        match value {
            Any::Object(obj) => obj.downcast::<T>(),
            other => Err(Error::type_mismatch(T::type_index().key(), other.type_key())),
        }
    }
}

impl TryFrom<&Any> for Str {
    type Error = Error;

    fn try_from(value: &Any) -> Result<Self> {
        Ref::<StrObj>::try_from(value).map(Str::from_ref)
    }
}

impl TryFrom<Any> for Str {
    type Error = Error;

    fn try_from(value: Any) -> Result<Self> {
        Ref::<StrObj>::try_from(value).map(Str::from_ref)
    }
}

impl TryFrom<&Any> for UDict {
    type Error = Error;

    fn try_from(value: &Any) -> Result<Self> {
        Ref::<UDictObj>::try_from(value).map(UDict::from_ref)
    }
}

impl TryFrom<Any> for UDict {
    type Error = Error;

    fn try_from(value: Any) -> Result<Self> {
        Ref::<UDictObj>::try_from(value).map(UDict::from_ref)
    }
}

impl TryFrom<&Any> for String {
    type Error = Error;

    /// Copy out string content; invalid UTF-8 is replaced lossily
    fn try_from(value: &Any) -> Result<Self> {
        value
            .as_str_obj()
            .map(|s| s.to_string_lossy().into_owned())
            .ok_or_else(|| mismatch("object.Str", value))
    }
}
