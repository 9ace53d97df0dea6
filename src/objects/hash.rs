//! Uniform hash/equality over `Any`
//!
//! Contract: `any_equal(a, b)` implies `any_hash(a) == any_hash(b)`.
//! - Tags must agree; `Int(1)`, `Float(1.0)` and `Bool(true)` are distinct keys
//! - Primitives compare by value; floats treat every NaN as one value and
//!   `-0.0 == 0.0`, so float keys stay findable
//! - Devices and data types compare field by field
//! - Objects compare by identity unless their type registered content hooks
//!   (`Str` compares by bytes)

use core::hash::{Hash, Hasher};
use std::collections::hash_map::DefaultHasher;

use super::Any;
use crate::builtins::string::STR_HOOKS;
use crate::rc::ObjectRef;
use crate::registry::{self, ContentHooks, TypeIndex};

/// Hash an `Any` with the runtime's fixed hasher
pub fn any_hash(value: &Any) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Key equality used by `UDict`
#[inline]
pub fn any_equal(a: &Any, b: &Any) -> bool {
    a == b
}

#[inline]
fn float_bits(v: f64) -> u64 {
    if v == 0.0 {
        0
    } else if v.is_nan() {
        f64::NAN.to_bits()
    } else {
        v.to_bits()
    }
}

#[inline]
fn hooks_for(index: TypeIndex) -> Option<ContentHooks> {
    if index == TypeIndex::STR {
        Some(STR_HOOKS)
    } else if index >= TypeIndex::DYNAMIC_BEGIN {
        registry::content_hooks(index)
    } else {
        None
    }
}

fn object_hash(obj: &ObjectRef) -> u64 {
    match hooks_for(obj.type_index()) {
        Some(hooks) => unsafe { (hooks.hash)(obj.as_ptr()) },
        None => obj.as_ptr().as_ptr() as usize as u64,
    }
}

fn object_eq(a: &ObjectRef, b: &ObjectRef) -> bool {
    if a.ptr_eq(b) {
        return true;
    }
    if a.type_index() != b.type_index() {
        return false;
    }
    match hooks_for(a.type_index()) {
        Some(hooks) => unsafe { (hooks.eq)(a.as_ptr(), b.as_ptr()) },
        None => false,
    }
}

impl Hash for Any {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.tag().0.hash(state);
        match self {
            Any::None => {}
            Any::Bool(b) => b.hash(state),
            Any::Int(v) => v.hash(state),
            Any::Float(v) => float_bits(*v).hash(state),
            Any::Device(d) => d.hash(state),
            Any::DataType(d) => d.hash(state),
            Any::Ptr(p) => (*p as usize).hash(state),
            Any::Object(obj) => object_hash(obj).hash(state),
        }
    }
}

impl PartialEq for Any {
    fn eq(&self, other: &Any) -> bool {
        match (self, other) {
            (Any::None, Any::None) => true,
            (Any::Bool(a), Any::Bool(b)) => a == b,
            (Any::Int(a), Any::Int(b)) => a == b,
            (Any::Float(a), Any::Float(b)) => a == b || (a.is_nan() && b.is_nan()),
            (Any::Device(a), Any::Device(b)) => a == b,
            (Any::DataType(a), Any::DataType(b)) => a == b,
            (Any::Ptr(a), Any::Ptr(b)) => a == b,
            (Any::Object(a), Any::Object(b)) => object_eq(a, b),
            _ => false,
        }
    }
}

impl Eq for Any {}

macro_rules! impl_int_eq {
    ($($ty:ty),*) => {
        $(
            impl PartialEq<$ty> for Any {
                fn eq(&self, other: &$ty) -> bool {
                    match self {
                        Any::Int(v) => i64::try_from(*other).map_or(false, |o| *v == o),
                        _ => false,
                    }
                }
            }

            impl PartialEq<Any> for $ty {
                fn eq(&self, other: &Any) -> bool {
                    other == self
                }
            }
        )*
    };
}

impl_int_eq!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

macro_rules! impl_float_eq {
    ($($ty:ty),*) => {
        $(
            impl PartialEq<$ty> for Any {
                fn eq(&self, other: &$ty) -> bool {
                    matches!(self, Any::Float(v) if *v == f64::from(*other))
                }
            }

            impl PartialEq<Any> for $ty {
                fn eq(&self, other: &Any) -> bool {
                    other == self
                }
            }
        )*
    };
}

impl_float_eq!(f32, f64);

impl PartialEq<bool> for Any {
    fn eq(&self, other: &bool) -> bool {
        matches!(self, Any::Bool(b) if b == other)
    }
}

impl PartialEq<str> for Any {
    fn eq(&self, other: &str) -> bool {
        self.as_str_obj().is_some_and(|s| s.as_bytes() == other.as_bytes())
    }
}

impl PartialEq<&str> for Any {
    fn eq(&self, other: &&str) -> bool {
        *self == **other
    }
}

impl PartialEq<String> for Any {
    fn eq(&self, other: &String) -> bool {
        *self == *other.as_str()
    }
}

impl PartialEq<Any> for &str {
    fn eq(&self, other: &Any) -> bool {
        *other == **self
    }
}
