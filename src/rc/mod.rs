//! Shared ownership - intrusive reference counting over object headers
//!
//! Design: deterministic destruction without a collector:
//! 1. `Ref<T>` typed handle (construction allocates with count = 1)
//! 2. `ObjectRef` erased handle (what `Any` stores)
//! 3. Per-allocation deleter, so erased handles destroy the right type
//!
//! Reference cycles are never reclaimed; owners must break them.

mod refcount;

#[cfg(test)]
mod tests;

pub use refcount::{ObjectRef, Ref};

use crate::registry::TypeIndex;

/// A payload type that can live behind an object header
///
/// Implemented for the built-in `StrObj` and `UDictObj`; user types use the
/// `object_type!` macro, which registers a type key on first use.
pub trait ObjectType: Sized + 'static {
    /// Registered type index stamped into every header of this type
    fn type_index() -> TypeIndex;
}

/// Declare a user object type under a unique registry key
///
/// ```ignore
/// struct Point { x: i64, y: i64 }
/// anyrt::object_type!(Point, "demo.Point");
/// let p = anyrt::Ref::new(Point { x: 1, y: 2 });
/// ```
///
/// A third argument supplies `ContentHooks`, making values of the type hash
/// and compare by content inside `Any`:
///
/// ```ignore
/// anyrt::object_type!(Point, "demo.Point", POINT_HOOKS);
/// ```
#[macro_export]
macro_rules! object_type {
    ($ty:ty, $key:expr) => {
        impl $crate::rc::ObjectType for $ty {
            fn type_index() -> $crate::registry::TypeIndex {
                static INDEX: $crate::__private::OnceCell<$crate::registry::TypeIndex> =
                    $crate::__private::OnceCell::new();
                *INDEX.get_or_init(|| $crate::registry::register_type($key))
            }
        }
    };
    ($ty:ty, $key:expr, $hooks:expr) => {
        impl $crate::rc::ObjectType for $ty {
            fn type_index() -> $crate::registry::TypeIndex {
                static INDEX: $crate::__private::OnceCell<$crate::registry::TypeIndex> =
                    $crate::__private::OnceCell::new();
                *INDEX.get_or_init(|| $crate::registry::register_type_with_hooks($key, $hooks))
            }
        }
    };
}
