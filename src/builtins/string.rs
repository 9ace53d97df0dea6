//! String type - immutable, reference counted byte strings
//!
//! Design: content is fixed at construction and shared by every handle
//! - Stored with a trailing NUL so `c_str()` needs no copy
//! - Length never counts the terminator
//! - Byte-wise comparison and hashing (content, not identity)
//! - Built from C strings, fixed char buffers or owned byte buffers

use core::cmp::Ordering;
use core::fmt;
use core::hash::{Hash, Hasher};
use core::ops::Deref;
use core::ptr::NonNull;
use std::borrow::Cow;
use std::collections::hash_map::DefaultHasher;
use std::ffi::{c_char, CStr};

use crate::allocator::{payload, ObjectHeader};
use crate::error::{Error, Result};
use crate::rc::{ObjectRef, ObjectType, Ref};
use crate::registry::{ContentHooks, TypeIndex};

/// Heap payload of a string object
pub struct StrObj {
    /// Content followed by exactly one terminating NUL
    data: Vec<u8>,
}

impl ObjectType for StrObj {
    #[inline]
    fn type_index() -> TypeIndex {
        TypeIndex::STR
    }
}

/// Content hooks registered for `object.Str`
pub(crate) const STR_HOOKS: ContentHooks = ContentHooks {
    hash: str_hash,
    eq: str_eq,
};

unsafe fn str_hash(ptr: NonNull<ObjectHeader>) -> u64 {
    let s: &StrObj = payload(ptr);
    let mut hasher = DefaultHasher::new();
    s.hash(&mut hasher);
    hasher.finish()
}

unsafe fn str_eq(a: NonNull<ObjectHeader>, b: NonNull<ObjectHeader>) -> bool {
    let a: &StrObj = payload(a);
    let b: &StrObj = payload(b);
    a.as_bytes() == b.as_bytes()
}

impl StrObj {
    /// Take ownership of `bytes`, appending the terminator in place
    ///
    /// Reuses the buffer when it has spare capacity; otherwise the push
    /// reallocates once.
    fn from_vec(mut bytes: Vec<u8>) -> Self {
        bytes.push(0);
        Self { data: bytes }
    }

    fn copy_from(bytes: &[u8]) -> Self {
        let mut data = Vec::with_capacity(bytes.len() + 1);
        data.extend_from_slice(bytes);
        data.push(0);
        Self { data }
    }

    /// Byte length, excluding the terminator
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len() - 1
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Content bytes, without the terminator
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data[..self.len()]
    }

    /// Content bytes including the terminator
    #[inline]
    pub fn as_bytes_with_nul(&self) -> &[u8] {
        &self.data
    }

    /// NUL-terminated view, valid while any handle lives
    ///
    /// Content containing an interior NUL is cut at the first one.
    pub fn c_str(&self) -> &CStr {
        let end = self.data.iter().position(|&b| b == 0).unwrap_or(self.len());
        unsafe { CStr::from_bytes_with_nul_unchecked(&self.data[..=end]) }
    }

    #[inline]
    pub fn as_ptr(&self) -> *const c_char {
        self.data.as_ptr() as *const c_char
    }

    /// Content as `&str` when it is valid UTF-8
    pub fn as_str(&self) -> Option<&str> {
        std::str::from_utf8(self.as_bytes()).ok()
    }

    pub fn to_string_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(self.as_bytes())
    }

    /// Write the content bytes unchanged, without the terminator
    pub fn write_to<W: std::io::Write>(&self, out: &mut W) -> std::io::Result<()> {
        out.write_all(self.as_bytes())
    }
}

impl PartialEq for StrObj {
    fn eq(&self, other: &Self) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl Eq for StrObj {}

impl PartialOrd for StrObj {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for StrObj {
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_bytes().cmp(other.as_bytes())
    }
}

impl Hash for StrObj {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_bytes().hash(state);
    }
}

/// Invalid UTF-8 renders as U+FFFD; use `write_to` for the exact bytes
impl fmt::Display for StrObj {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_string_lossy())
    }
}

impl fmt::Debug for StrObj {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.to_string_lossy(), f)
    }
}

/// Handle to an immutable string object
///
/// Cloning shares the object; comparison is by content.
#[derive(Clone)]
pub struct Str(Ref<StrObj>);

impl Str {
    /// Copy a NUL-terminated C string
    ///
    /// # Safety
    /// A non-null `ptr` must point to a valid NUL-terminated string.
    pub unsafe fn from_c_ptr(ptr: *const c_char) -> Result<Str> {
        if ptr.is_null() {
            return Err(Error::NullPointer {
                context: "Str::from_c_ptr",
            });
        }
        Ok(Str::from(CStr::from_ptr(ptr)))
    }

    /// Copy a fixed-size character buffer up to its first NUL
    ///
    /// A buffer without a NUL is copied whole.
    pub fn from_char_array(buf: &[u8]) -> Str {
        let len = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
        Str::from_obj(StrObj::copy_from(&buf[..len]))
    }

    /// Take ownership of an existing byte buffer
    pub fn from_bytes(bytes: Vec<u8>) -> Str {
        Str::from_obj(StrObj::from_vec(bytes))
    }

    fn from_obj(obj: StrObj) -> Str {
        Str(Ref::new(obj))
    }

    #[inline]
    pub fn from_ref(handle: Ref<StrObj>) -> Str {
        Str(handle)
    }

    #[inline]
    pub fn into_ref(self) -> Ref<StrObj> {
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

    /// True when both handles share one object
    #[inline]
    pub fn ptr_eq(&self, other: &Str) -> bool {
        Ref::ptr_eq(&self.0, &other.0)
    }

    /// New string holding `self` followed by `other`
    pub fn concat(&self, other: &Str) -> Str {
        let mut bytes = Vec::with_capacity(self.len() + other.len() + 1);
        bytes.extend_from_slice(self.as_bytes());
        bytes.extend_from_slice(other.as_bytes());
        Str::from_bytes(bytes)
    }
}

impl Deref for Str {
    type Target = StrObj;

    #[inline]
    fn deref(&self) -> &StrObj {
        &self.0
    }
}

impl Default for Str {
    fn default() -> Self {
        Str::from_bytes(Vec::new())
    }
}

impl From<&str> for Str {
    fn from(s: &str) -> Self {
        Str::from_obj(StrObj::copy_from(s.as_bytes()))
    }
}

impl From<String> for Str {
    fn from(s: String) -> Self {
        Str::from_bytes(s.into_bytes())
    }
}

impl From<&String> for Str {
    fn from(s: &String) -> Self {
        Str::from(s.as_str())
    }
}

impl From<&[u8]> for Str {
    fn from(bytes: &[u8]) -> Self {
        Str::from_obj(StrObj::copy_from(bytes))
    }
}

impl From<Vec<u8>> for Str {
    fn from(bytes: Vec<u8>) -> Self {
        Str::from_bytes(bytes)
    }
}

impl From<&CStr> for Str {
    fn from(s: &CStr) -> Self {
        Str::from_obj(StrObj::copy_from(s.to_bytes()))
    }
}

impl From<Str> for Ref<StrObj> {
    fn from(s: Str) -> Self {
        s.0
    }
}

impl PartialEq for Str {
    fn eq(&self, other: &Str) -> bool {
        self.ptr_eq(other) || **self == **other
    }
}

impl Eq for Str {}

impl PartialOrd for Str {
    fn partial_cmp(&self, other: &Str) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Str {
    fn cmp(&self, other: &Str) -> Ordering {
        (**self).cmp(&**other)
    }
}

impl Hash for Str {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (**self).hash(state);
    }
}

/// Byte-wise comparisons against foreign string types, both directions
macro_rules! impl_str_cmp {
    ($($other:ty, $s:ident => $bytes:expr;)*) => {
        $(
            impl PartialEq<$other> for Str {
                fn eq(&self, $s: &$other) -> bool {
                    self.as_bytes() == $bytes
                }
            }

            impl PartialEq<Str> for $other {
                fn eq(&self, other: &Str) -> bool {
                    <Str as PartialEq<$other>>::eq(other, self)
                }
            }

            impl PartialOrd<$other> for Str {
                fn partial_cmp(&self, $s: &$other) -> Option<Ordering> {
                    Some(self.as_bytes().cmp($bytes))
                }
            }

            impl PartialOrd<Str> for $other {
                fn partial_cmp(&self, other: &Str) -> Option<Ordering> {
                    <Str as PartialOrd<$other>>::partial_cmp(other, self).map(Ordering::reverse)
                }
            }
        )*
    };
}

impl_str_cmp! {
    str, s => s.as_bytes();
    &str, s => s.as_bytes();
    String, s => s.as_bytes();
    CStr, s => s.to_bytes();
    &CStr, s => s.to_bytes();
}

impl fmt::Display for Str {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&**self, f)
    }
}

impl fmt::Debug for Str {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&**self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_creation() {
        let s = Str::from("hello");
        assert_eq!(s.size(), 5);
        assert_eq!(s.as_bytes(), b"hello");
        assert_eq!(s.c_str().to_bytes(), b"hello");
        assert_eq!(s.as_bytes_with_nul(), b"hello\0");
        assert_eq!(s.as_str(), Some("hello"));
    }

    #[test]
    fn test_non_utf8_bytes_written_exactly() {
        let s = Str::from_bytes(vec![b'a', 0xff, b'b']);
        assert!(s.as_str().is_none());

        let mut out = Vec::new();
        s.write_to(&mut out).unwrap();
        assert_eq!(out, [b'a', 0xff, b'b']);
        assert_eq!(s.to_string(), "a\u{FFFD}b");
    }

    #[test]
    fn test_empty_string_has_terminator() {
        let s = Str::default();
        assert_eq!(s.len(), 0);
        assert!(s.is_empty());
        assert!(!s.as_ptr().is_null());
        assert_eq!(s.as_bytes_with_nul(), b"\0");
        assert_eq!(s.c_str().to_bytes(), b"");
    }

    #[test]
    fn test_from_c_ptr() {
        let src = b"from c\0";
        let s = unsafe { Str::from_c_ptr(src.as_ptr() as *const c_char) }.unwrap();
        assert_eq!(s, "from c");
        assert_eq!(s.len(), 6);

        let err = unsafe { Str::from_c_ptr(core::ptr::null()) }.unwrap_err();
        assert!(err.is_null_pointer());
    }

    #[test]
    fn test_from_char_array_stops_at_nul() {
        let mut buf = [0u8; 16];
        buf[..3].copy_from_slice(b"abc");
        buf[5] = b'z';
        let s = Str::from_char_array(&buf);
        assert_eq!(s.len(), 3);
        assert_eq!(s, "abc");

        assert_eq!(Str::from_char_array(b"full"), "full");
    }

    #[test]
    fn test_from_owned_buffer_reuses_storage() {
        let mut bytes = Vec::with_capacity(32);
        bytes.extend_from_slice(b"owned");
        let addr = bytes.as_ptr();

        let s = Str::from_bytes(bytes);
        assert_eq!(s.as_bytes().as_ptr(), addr);
        assert_eq!(s.len(), 5);

        let from_string = Str::from(String::from("moved"));
        assert_eq!(from_string, "moved");
    }

    #[test]
    fn test_interior_nul() {
        let s = Str::from(&b"a\0b"[..]);
        assert_eq!(s.len(), 3);
        assert_eq!(s.c_str().to_bytes(), b"a");
    }

    #[test]
    fn test_string_ordering() {
        let hello = Str::from("Hello");
        let world = Str::from("World");

        assert!(hello < world);
        assert!(hello <= world);
        assert!(world > hello);
        assert!(world >= hello);
        assert!(hello != world);
        assert!(hello == Str::from("Hello"));

        assert!(hello < "World");
        assert!("Apple" < hello);
        assert!(hello == "Hello");
        assert!("Hello" == hello);
        assert!(hello == String::from("Hello"));
        assert!(String::from("Hello") == hello);
        assert!(hello == *CStr::from_bytes_with_nul(b"Hello\0").unwrap());
        assert!(Str::from("abc") < Str::from("abcd"));
    }

    #[test]
    fn test_string_equality_shares_hash() {
        use std::collections::HashSet;
        let mut set = HashSet::new();
        set.insert(Str::from("dup"));
        set.insert(Str::from(String::from("dup")));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_concat_and_display() {
        let s = Str::from("hello").concat(&Str::from(" world"));
        assert_eq!(s, "hello world");
        assert_eq!(format!("{}", s), "hello world");
        assert_eq!(format!("{:?}", s), "\"hello world\"");
        assert_eq!(s.to_string(), "hello world");
    }

    #[test]
    fn test_handle_sharing() {
        let a = Str::from("shared");
        let b = a.clone();
        assert!(a.ptr_eq(&b));
        assert_eq!(a.ref_count(), 2);
        drop(b);
        assert_eq!(a.ref_count(), 1);
    }
}
