//! Dict type - heterogeneous hash tables with open addressing
//!
//! Design: linear scan over a power-of-two slot array
//! - Keys and values are `Any`; hashing/equality via `any_hash`/`any_equal`
//! - Stored hash per slot, so rehash never recomputes content hashes
//! - Geometric growth (factor of 2) before size exceeds the load factor
//! - Backward-shift deletion: no tombstones, every collision chain stays intact
//!
//! The slot array sits behind a `RefCell`: every `UDict` handle aliasing the
//! same object sees the same table, and overlapping borrows (mutating while
//! iterating or while holding an `entry` guard) panic instead of corrupting
//! it.

use core::cell::{RefCell, RefMut};
use core::fmt;

use crate::config::{self, DictConfig};
use crate::error::{Error, Result};
use crate::logging::log_dict_rehash;
use crate::objects::{any_hash, Any};
use crate::rc::{ObjectRef, ObjectType, Ref};
use crate::registry::TypeIndex;

struct Entry {
    hash: u64,
    key: Any,
    value: Any,
}

/// Slot storage; `None` marks a free slot
struct Table {
    slots: Vec<Option<Entry>>,
    size: usize,
    config: DictConfig,
}

impl Table {
    fn new(config: DictConfig) -> Self {
        Self {
            slots: Vec::new(),
            size: 0,
            config,
        }
    }

    #[inline]
    fn capacity(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    fn mask(&self) -> usize {
        self.capacity() - 1
    }

    /// True when holding `size` entries in `capacity` slots stays within the load factor
    #[inline]
    fn fits(&self, size: usize, capacity: usize) -> bool {
        size * 100 <= capacity * self.config.max_load_percent as usize
    }

    /// Smallest power-of-two capacity holding `size` entries
    fn capacity_for(&self, size: usize) -> usize {
        let mut capacity = self.config.min_capacity.max(1);
        while !self.fits(size, capacity) {
            capacity *= 2;
        }
        capacity
    }

    fn find(&self, key: &Any, hash: u64) -> Option<usize> {
        if self.size == 0 {
            return None;
        }

        let mask = self.mask();
        let mut index = hash as usize & mask;

        for _ in 0..self.capacity() {
            match &self.slots[index] {
                None => return None,
                Some(entry) if entry.hash == hash && entry.key == *key => return Some(index),
                Some(_) => {}
            }
            index = (index + 1) & mask;
        }

        None
    }

    /// Make room for one more entry, rehashing if the load factor would be crossed
    fn reserve_one(&mut self) {
        let needed = self.size + 1;
        if self.capacity() == 0 || !self.fits(needed, self.capacity()) {
            let new_capacity = self.capacity_for(needed).max(self.capacity() * 2);
            self.rehash(new_capacity);
        }
    }

    fn rehash(&mut self, new_capacity: usize) {
        debug_assert!(new_capacity.is_power_of_two());
        let old_capacity = self.capacity();
        let old_size = self.size;

        let mut slots = Vec::with_capacity(new_capacity);
        slots.resize_with(new_capacity, || None);
        let old_slots = core::mem::replace(&mut self.slots, slots);

        self.size = 0;
        for entry in old_slots.into_iter().flatten() {
            self.place(entry);
        }

        debug_assert_eq!(self.size, old_size, "rehash lost or duplicated entries");
        log_dict_rehash(old_capacity, new_capacity, self.size);
    }

    /// Put an entry whose key is absent into the first free slot of its chain
    fn place(&mut self, entry: Entry) -> usize {
        let mask = self.mask();
        let mut index = entry.hash as usize & mask;

        while self.slots[index].is_some() {
            index = (index + 1) & mask;
        }

        self.slots[index] = Some(entry);
        self.size += 1;
        index
    }

    /// Remove the entry at `index` and close the gap by shifting later chain members back
    fn remove_at(&mut self, index: usize) -> Option<Entry> {
        let removed = self.slots[index].take()?;
        self.size -= 1;

        let mask = self.mask();
        let mut hole = index;
        let mut cursor = (index + 1) & mask;

        while let Some(entry) = &self.slots[cursor] {
            let ideal = entry.hash as usize & mask;
            // Movable iff the hole lies cyclically within [ideal, cursor]
            if (cursor.wrapping_sub(ideal) & mask) >= (cursor.wrapping_sub(hole) & mask) {
                self.slots[hole] = self.slots[cursor].take();
                hole = cursor;
            }
            cursor = (cursor + 1) & mask;
        }

        Some(removed)
    }

    fn value_mut(&mut self, index: usize) -> &mut Any {
        match &mut self.slots[index] {
            Some(entry) => &mut entry.value,
            None => unreachable!("dict slot {} vacated while borrowed", index),
        }
    }
}

/// Heap payload of a dict object
pub struct UDictObj {
    table: RefCell<Table>,
}

impl ObjectType for UDictObj {
    #[inline]
    fn type_index() -> TypeIndex {
        TypeIndex::UDICT
    }
}

impl UDictObj {
    fn new(config: DictConfig) -> Self {
        Self {
            table: RefCell::new(Table::new(config)),
        }
    }

    /// Number of live entries
    #[inline]
    pub fn len(&self) -> usize {
        self.table.borrow().size
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of slots currently allocated
    #[inline]
    pub fn capacity(&self) -> usize {
        self.table.borrow().capacity()
    }
}

impl fmt::Debug for UDictObj {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let table = self.table.borrow();
        f.debug_map()
            .entries(table.slots.iter().flatten().map(|e| (&e.key, &e.value)))
            .finish()
    }
}

/// Handle to a heterogeneous `Any -> Any` hash map
///
/// Cloning shares the table; mutation through any alias is visible
/// through all of them.
#[derive(Clone)]
pub struct UDict(Ref<UDictObj>);

impl UDict {
    /// Empty dict using the active runtime configuration; allocates no slots
    pub fn new() -> Self {
        // `config::install` only accepts validated policies
        Self::from_policy(config::current().dict)
    }

    /// Empty dict with an explicit growth policy
    ///
    /// Fails with `Error::Config` unless `min_capacity` is a non-zero power
    /// of two and `max_load_percent` lies in `1..=95`.
    pub fn with_config(config: DictConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::from_policy(config))
    }

    fn from_policy(config: DictConfig) -> Self {
        debug_assert!(config.validate().is_ok());
        UDict(Ref::new(UDictObj::new(config)))
    }

    /// Empty dict able to hold `n` entries without rehashing
    pub fn with_capacity(n: usize) -> Self {
        let dict = Self::new();
        if n > 0 {
            let mut table = dict.0.table.borrow_mut();
            let capacity = table.capacity_for(n);
            table.rehash(capacity);
        }
        dict
    }

    #[inline]
    pub fn from_ref(handle: Ref<UDictObj>) -> Self {
        UDict(handle)
    }

    #[inline]
    pub fn into_ref(self) -> Ref<UDictObj> {
        self.0
    }

    #[inline]
    pub fn into_object(self) -> ObjectRef {
        Ref::into_object(self.0)
    }

    #[inline]
    pub fn ref_count(&self) -> u32 {
        Ref::ref_count(&self.0)
    }

    /// True when both handles alias the same table
    #[inline]
    pub fn ptr_eq(&self, other: &UDict) -> bool {
        Ref::ptr_eq(&self.0, &other.0)
    }

    /// Number of live entries
    #[inline]
    pub fn size(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.0.capacity()
    }

    /// Value mapped to a key equal to `key`, or `KeyNotFound`
    pub fn at(&self, key: impl Into<Any>) -> Result<Any> {
        let key = key.into();
        self.get(&key).ok_or_else(|| Error::KeyNotFound {
            key: format!("{:?}", key),
        })
    }

    /// Value mapped to `key`, if present
    pub fn get(&self, key: &Any) -> Option<Any> {
        let table = self.0.table.borrow();
        let index = table.find(key, any_hash(key))?;
        table.slots[index].as_ref().map(|entry| entry.value.clone())
    }

    pub fn contains_key(&self, key: impl Into<Any>) -> bool {
        let key = key.into();
        self.0.table.borrow().find(&key, any_hash(&key)).is_some()
    }

    /// Map `key` to `value`, returning the value it replaced
    ///
    /// Overwriting keeps the original key object and leaves `size` unchanged.
    pub fn insert(&self, key: impl Into<Any>, value: impl Into<Any>) -> Option<Any> {
        let key = key.into();
        let value = value.into();
        let hash = any_hash(&key);

        let mut table = self.0.table.borrow_mut();
        if let Some(index) = table.find(&key, hash) {
            return Some(core::mem::replace(table.value_mut(index), value));
        }

        table.reserve_one();
        table.place(Entry { hash, key, value });
        None
    }

    /// Mutable access to the value of `key`, inserting `None` when absent
    ///
    /// The guard borrows the table; any other access to this dict while it
    /// is alive panics.
    pub fn entry(&self, key: impl Into<Any>) -> RefMut<'_, Any> {
        let key = key.into();
        let hash = any_hash(&key);

        let mut table = self.0.table.borrow_mut();
        let index = match table.find(&key, hash) {
            Some(index) => index,
            None => {
                table.reserve_one();
                table.place(Entry {
                    hash,
                    key,
                    value: Any::None,
                })
            }
        };

        RefMut::map(table, |table| table.value_mut(index))
    }

    /// Remove the entry for `key`, returning its value; absent keys are a no-op
    pub fn erase(&self, key: impl Into<Any>) -> Option<Any> {
        let key = key.into();
        let hash = any_hash(&key);

        let removed = {
            let mut table = self.0.table.borrow_mut();
            let index = table.find(&key, hash)?;
            table.remove_at(index)
        };

        removed.map(|entry| entry.value)
    }

    /// Remove every entry, keeping the allocated slots
    pub fn clear(&self) {
        let drained: Vec<Entry> = {
            let mut table = self.0.table.borrow_mut();
            table.size = 0;
            table.slots.iter_mut().filter_map(Option::take).collect()
        };
        drop(drained);
    }

    /// Snapshot iterator over live `(key, value)` pairs
    ///
    /// Order is unspecified and changes across rehashes. Mutating the dict
    /// while the iterator is alive panics.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            table: self.0.table.borrow(),
            index: 0,
            remaining: self.len(),
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = Any> + '_ {
        self.iter().map(|(key, _)| key)
    }

    pub fn values(&self) -> impl Iterator<Item = Any> + '_ {
        self.iter().map(|(_, value)| value)
    }

    /// Owned copy of every pair
    pub fn items(&self) -> Vec<(Any, Any)> {
        self.iter().collect()
    }
}

impl Default for UDict {
    fn default() -> Self {
        Self::new()
    }
}

impl From<UDict> for Ref<UDictObj> {
    fn from(dict: UDict) -> Self {
        dict.0
    }
}

impl<K: Into<Any>, V: Into<Any>> FromIterator<(K, V)> for UDict {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut dict = UDict::new();
        dict.extend(iter);
        dict
    }
}

impl<K: Into<Any>, V: Into<Any>> Extend<(K, V)> for UDict {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<K: Into<Any>, V: Into<Any>> Extend<(K, V)> for &UDict {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl fmt::Debug for UDict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

impl<'a> IntoIterator for &'a UDict {
    type Item = (Any, Any);
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Iter<'a> {
        self.iter()
    }
}

/// Iterator over a borrowed table
pub struct Iter<'a> {
    table: core::cell::Ref<'a, Table>,
    index: usize,
    remaining: usize,
}

impl Iterator for Iter<'_> {
    type Item = (Any, Any);

    fn next(&mut self) -> Option<Self::Item> {
        while self.index < self.table.slots.len() {
            let slot = &self.table.slots[self.index];
            self.index += 1;
            if let Some(entry) = slot {
                self.remaining -= 1;
                return Some((entry.key.clone(), entry.value.clone()));
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for Iter<'_> {}

/// Build a `UDict` from `key => value` pairs of any convertible types
///
/// ```ignore
/// let dict = udict! { "key1" => 1, "key2" => "value2", 3 => 4 };
/// ```
#[macro_export]
macro_rules! udict {
    () => {
        $crate::UDict::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let dict = $crate::UDict::new();
        $(
            dict.insert($key, $value);
        )+
        dict
    }};
}
