//! Type registry - stable type indices for every tag an `Any` can carry
//!
//! Built-in tags (primitives, descriptors, the runtime's own object types)
//! have fixed indices. User object types are assigned indices from
//! `TypeIndex::DYNAMIC_BEGIN` upward on first registration, keyed by a
//! unique type key such as `"demo.Point"`.
//!
//! Registration is expected to happen before dependent objects are built;
//! lookups afterwards are lock-free reads.

use core::fmt;
use core::ptr::NonNull;
use std::sync::atomic::{AtomicI32, Ordering};

use dashmap::DashMap;
use once_cell::sync::Lazy;

use crate::allocator::ObjectHeader;
use crate::logging::{log_runtime_warning, log_type_registered};

/// Global registry (concurrent maps, populated with built-ins on first use)
static REGISTRY: Lazy<TypeRegistry> = Lazy::new(TypeRegistry::with_builtins);

/// Runtime type tag shared by `Any` values and object headers
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct TypeIndex(pub i32);

impl TypeIndex {
    pub const NONE: Self = Self(0);
    pub const INT: Self = Self(1);
    pub const FLOAT: Self = Self(2);
    pub const PTR: Self = Self(3);
    pub const DEVICE: Self = Self(4);
    pub const DATA_TYPE: Self = Self(5);
    pub const BOOL: Self = Self(6);

    /// First index of heap object types; also the root "any object" type
    pub const OBJECT: Self = Self(64);
    pub const STR: Self = Self(65);
    pub const UDICT: Self = Self(66);

    /// First index handed out by `register_type`
    pub const DYNAMIC_BEGIN: Self = Self(1024);

    /// True when values of this tag live on the heap behind a header
    #[inline]
    pub const fn is_object(self) -> bool {
        self.0 >= Self::OBJECT.0
    }

    /// Registered key of this type, or a placeholder for unknown indices
    pub fn key(self) -> String {
        type_key(self)
    }
}

impl fmt::Debug for TypeIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeIndex({}: {})", self.0, self.key())
    }
}

impl fmt::Display for TypeIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

/// Content-based hash and equality for an object type
///
/// Types without hooks hash and compare by object identity.
#[derive(Clone, Copy)]
pub struct ContentHooks {
    /// # Safety
    /// Called only with live headers of the registered type.
    pub hash: unsafe fn(NonNull<ObjectHeader>) -> u64,
    /// # Safety
    /// Called only with two live headers of the registered type.
    pub eq: unsafe fn(NonNull<ObjectHeader>, NonNull<ObjectHeader>) -> bool,
}

impl ContentHooks {
    /// True when both point at the same hash and equality functions
    pub fn same_as(&self, other: &ContentHooks) -> bool {
        self.hash as usize == other.hash as usize && self.eq as usize == other.eq as usize
    }
}

impl fmt::Debug for ContentHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ContentHooks")
    }
}

/// Registered type metadata
#[derive(Debug, Clone)]
pub struct TypeInfo {
    pub index: TypeIndex,
    pub key: String,
    pub hooks: Option<ContentHooks>,
}

struct TypeRegistry {
    by_index: DashMap<TypeIndex, TypeInfo>,
    by_key: DashMap<String, TypeIndex>,
    next_index: AtomicI32,
}

impl TypeRegistry {
    fn with_builtins() -> Self {
        let registry = Self {
            by_index: DashMap::with_capacity(64),
            by_key: DashMap::with_capacity(64),
            next_index: AtomicI32::new(TypeIndex::DYNAMIC_BEGIN.0),
        };

        let builtins = [
            (TypeIndex::NONE, "None", None),
            (TypeIndex::INT, "int", None),
            (TypeIndex::FLOAT, "float", None),
            (TypeIndex::PTR, "Ptr", None),
            (TypeIndex::DEVICE, "Device", None),
            (TypeIndex::DATA_TYPE, "dtype", None),
            (TypeIndex::BOOL, "bool", None),
            (TypeIndex::OBJECT, "object.Object", None),
            (TypeIndex::STR, "object.Str", Some(crate::builtins::string::STR_HOOKS)),
            (TypeIndex::UDICT, "object.UDict", None),
        ];

        for (index, key, hooks) in builtins {
            registry.insert(index, key.to_string(), hooks);
        }

        registry
    }

    fn insert(&self, index: TypeIndex, key: String, hooks: Option<ContentHooks>) {
        self.by_key.insert(key.clone(), index);
        self.by_index.insert(index, TypeInfo { index, key, hooks });
    }

    fn register(&self, key: &str, hooks: Option<ContentHooks>) -> TypeIndex {
        if let Some(existing) = self.by_key.get(key) {
            let index = *existing;
            drop(existing);
            // Hooks are fixed at first registration: live keys were hashed with them
            if let Some(requested) = hooks {
                let current = self.by_index.get(&index).and_then(|info| info.hooks);
                if !current.is_some_and(|c| c.same_as(&requested)) {
                    log_runtime_warning(&format!(
                        "type `{}` is already registered; new content hooks ignored",
                        key
                    ));
                }
            }
            return index;
        }

        let index = *self.by_key.entry(key.to_string()).or_insert_with(|| {
            let index = TypeIndex(self.next_index.fetch_add(1, Ordering::Relaxed));
            self.by_index.insert(index, TypeInfo {
                index,
                key: key.to_string(),
                hooks,
            });
            log_type_registered(key, index.0);
            index
        });

        index
    }
}

/// Force built-in registration (idempotent)
pub fn init() {
    Lazy::force(&REGISTRY);
}

/// Register an object type by key, returning its stable index
///
/// Registering the same key again returns the same index.
pub fn register_type(key: &str) -> TypeIndex {
    REGISTRY.register(key, None)
}

/// Register an object type whose values hash and compare by content
///
/// Hooks are fixed by the first registration of `key`. Later calls return
/// the existing index and leave its hooks (or lack of them) unchanged.
pub fn register_type_with_hooks(key: &str, hooks: ContentHooks) -> TypeIndex {
    REGISTRY.register(key, Some(hooks))
}

/// Look up a type index by key
pub fn lookup(key: &str) -> Option<TypeIndex> {
    REGISTRY.by_key.get(key).map(|entry| *entry)
}

/// Metadata for a registered index
pub fn type_info(index: TypeIndex) -> Option<TypeInfo> {
    REGISTRY.by_index.get(&index).map(|entry| entry.clone())
}

/// Key of a type index, or `<unregistered #n>`
pub fn type_key(index: TypeIndex) -> String {
    match REGISTRY.by_index.get(&index) {
        Some(info) => info.key.clone(),
        None => format!("<unregistered #{}>", index.0),
    }
}

/// Content hooks for an object type, if it registered any
#[inline]
pub fn content_hooks(index: TypeIndex) -> Option<ContentHooks> {
    REGISTRY.by_index.get(&index).and_then(|info| info.hooks)
}
