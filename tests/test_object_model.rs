use anyrt::allocator::{payload, ObjectHeader};
use anyrt::registry::{content_hooks, register_type_with_hooks, ContentHooks};
use anyrt::{
    any_equal, any_hash, object_type, udict, Any, Error, ObjectRef, ObjectType, Ref, Str, TypeIndex,
    UDict,
};
use std::cell::Cell;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::ptr::NonNull;
use std::rc::Rc;

struct Resource {
    released: Rc<Cell<u32>>,
}

impl Drop for Resource {
    fn drop(&mut self) {
        self.released.set(self.released.get() + 1);
    }
}

object_type!(Resource, "test.Resource");

struct Point {
    x: i32,
    y: i32,
}

unsafe fn point_hash(ptr: NonNull<ObjectHeader>) -> u64 {
    let p: &Point = payload(ptr);
    let mut hasher = DefaultHasher::new();
    (p.x, p.y).hash(&mut hasher);
    hasher.finish()
}

unsafe fn point_eq(a: NonNull<ObjectHeader>, b: NonNull<ObjectHeader>) -> bool {
    let (a, b): (&Point, &Point) = (payload(a), payload(b));
    a.x == b.x && a.y == b.y
}

const POINT_HOOKS: ContentHooks = ContentHooks {
    hash: point_hash,
    eq: point_eq,
};

object_type!(Point, "test.Point", POINT_HOOKS);

struct Token(u32);

object_type!(Token, "test.Token");

unsafe fn token_hash(ptr: NonNull<ObjectHeader>) -> u64 {
    u64::from(payload::<Token>(ptr).0)
}

unsafe fn token_eq(a: NonNull<ObjectHeader>, b: NonNull<ObjectHeader>) -> bool {
    payload::<Token>(a).0 == payload::<Token>(b).0
}

#[test]
fn test_handle_lifecycle() {
    let released = Rc::new(Cell::new(0));
    let a = Ref::new(Resource { released: released.clone() });
    assert_eq!(Ref::ref_count(&a), 1);

    let b = a.clone();
    let c = b.clone();
    assert_eq!(Ref::ref_count(&a), 3);

    drop(a);
    drop(c);
    assert_eq!(released.get(), 0);
    drop(b);
    assert_eq!(released.get(), 1);
}

#[test]
fn test_user_type_registered_dynamically() {
    let released = Rc::new(Cell::new(0));
    let obj = Ref::into_object(Ref::new(Resource { released: released.clone() }));

    assert!(obj.type_index() >= TypeIndex::DYNAMIC_BEGIN);
    assert_eq!(obj.type_index().key(), "test.Resource");
    assert_eq!(anyrt::registry::lookup("test.Resource"), Some(obj.type_index()));

    let any = Any::from(obj);
    assert!(any.is::<Resource>());
    assert_eq!(any.type_key(), "test.Resource");

    let err = any.cast::<Str>().unwrap_err();
    assert!(err.is_type_mismatch());

    drop(any);
    assert_eq!(released.get(), 1);
}

#[test]
fn test_user_objects_compare_by_identity() {
    let released = Rc::new(Cell::new(0));
    let a = Ref::new(Resource { released: released.clone() });
    let b = Ref::new(Resource { released: released.clone() });

    let dict = UDict::new();
    dict.insert(a.clone(), "a");
    dict.insert(b.clone(), "b");
    assert_eq!(dict.size(), 2);
    assert_eq!(dict.at(a.clone()).unwrap(), "a");

    drop(dict);
    drop((a, b));
    assert_eq!(released.get(), 2);
}

#[test]
fn test_hooked_user_type_compares_by_content() {
    let a = Any::from(Ref::new(Point { x: 0, y: 0 }));
    let b = Any::from(Ref::new(Point { x: 0, y: 0 }));
    let c = Any::from(Ref::new(Point { x: 1, y: 0 }));

    assert!(any_equal(&a, &b));
    assert_eq!(any_hash(&a), any_hash(&b));
    assert!(!any_equal(&a, &c));
    assert!(content_hooks(<Point as ObjectType>::type_index()).is_some());

    let dict = UDict::new();
    dict.insert(a, "origin");
    assert_eq!(dict.at(b).unwrap(), "origin");
    assert!(!dict.contains_key(c));
}

#[test]
fn test_late_hooks_do_not_orphan_live_keys() {
    let key = Ref::new(Token(7));
    let index = <Token as ObjectType>::type_index();
    let dict = UDict::new();
    dict.insert(key.clone(), "seven");

    let late = ContentHooks {
        hash: token_hash,
        eq: token_eq,
    };
    assert_eq!(register_type_with_hooks("test.Token", late), index);
    assert!(content_hooks(index).is_none());

    assert_eq!(dict.size(), 1);
    assert_eq!(dict.at(key.clone()).unwrap(), "seven");
    assert!(!dict.contains_key(Ref::new(Token(7))));
    assert_eq!(dict.erase(key), Some(Any::from("seven")));
    assert!(dict.is_empty());
}

#[test]
fn test_any_holds_every_kind() {
    let values: Vec<Any> = vec![
        Any::None,
        Any::from(true),
        Any::from(-7),
        Any::from(0.25),
        Any::from(anyrt::Device::cuda(0)),
        Any::from(anyrt::DataType::float(16).with_lanes(4)),
        Any::from(core::ptr::null_mut::<core::ffi::c_void>()),
        Any::from("text"),
        Any::from(UDict::new()),
    ];

    let rendered: Vec<String> = values.iter().map(|v| v.type_key()).collect();
    assert_eq!(
        rendered,
        ["None", "bool", "int", "float", "Device", "dtype", "Ptr", "object.Str", "object.UDict"]
    );
}

#[test]
fn test_any_copy_and_assignment_refcounts() {
    let s = Str::from("value");
    let mut slot = Any::from(s.clone());
    assert_eq!(s.ref_count(), 2);

    let copy = slot.clone();
    assert_eq!(s.ref_count(), 3);

    slot = copy.clone();
    assert_eq!(s.ref_count(), 3);

    slot = Any::from(1);
    drop(copy);
    assert_eq!(s.ref_count(), 1);
    assert_eq!(slot, 1);
}

#[test]
fn test_dict_literal() {
    let dict = udict! { "key1" => 1, "key2" => "value2", 3 => 4 };

    assert_eq!(dict.size(), 3);
    assert_eq!(dict.at("key1").unwrap(), 1);
    assert_eq!(dict.at("key2").unwrap(), "value2");
    assert_eq!(dict.at(3).unwrap(), 4);

    match dict.at("missing") {
        Err(Error::KeyNotFound { key }) => assert!(key.contains("missing")),
        other => panic!("expected KeyNotFound, got {:?}", other),
    }
}

#[test]
fn test_dict_thousand_keys_then_erase_and_reinsert() {
    let dict = UDict::new();
    for i in 0..1000 {
        dict.insert(i, Str::from(format!("v{}", i)));
    }
    assert_eq!(dict.size(), 1000);

    for i in 0..500 {
        assert!(dict.erase(i).is_some());
    }
    assert_eq!(dict.size(), 500);
    for i in 500..1000 {
        assert_eq!(dict.at(i).unwrap(), format!("v{}", i));
    }

    for i in 0..500 {
        *dict.entry(i) = Any::from(i);
    }
    assert_eq!(dict.size(), 1000);
    assert_eq!(dict.at(250).unwrap(), 250);
}

#[test]
fn test_dict_overwrite_keeps_size() {
    let dict = udict! { "k" => 1 };
    *dict.entry("k") = Any::from("replaced");
    assert_eq!(dict.size(), 1);
    assert_eq!(dict.at("k").unwrap(), "replaced");
}

#[test]
fn test_string_ordering_and_equality() {
    let hello = Str::from("Hello");
    let world = Str::from("World");

    assert!(hello < world);
    assert!(hello == "Hello");
    assert!("World" == world);
    assert!(Str::from("") < Str::from("a"));
    assert_eq!(hello.size(), 5);
    assert_eq!(hello.c_str().to_bytes(), b"Hello");
}

#[test]
fn test_raw_transfer() {
    let s = Str::from("raw");
    let raw = ObjectRef::from(Ref::from(s.clone())).into_raw();
    assert_eq!(s.ref_count(), 2);

    let back = unsafe { ObjectRef::from_raw(raw.as_ptr()) }.unwrap();
    assert_eq!(back.ref_count(), 2);
    drop(back);
    assert_eq!(s.ref_count(), 1);

    let err = unsafe { ObjectRef::from_raw(core::ptr::null_mut()) }.unwrap_err();
    assert!(matches!(err, Error::InvariantViolation(_)));
}
