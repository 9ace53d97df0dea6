use anyrt::{any_equal, any_hash, Any, Str, UDict};
use proptest::prelude::*;
use std::collections::HashMap;

/// Keys drawn from several tags so cross-type collisions are exercised
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Key {
    Int(i64),
    Text(String),
    Flag(bool),
}

impl Key {
    fn to_any(&self) -> Any {
        match self {
            Key::Int(v) => Any::from(*v),
            Key::Text(s) => Any::from(s.as_str()),
            Key::Flag(b) => Any::from(*b),
        }
    }
}

fn key_strategy() -> impl Strategy<Value = Key> {
    prop_oneof![
        (-64i64..64).prop_map(Key::Int),
        "[a-d]{0,3}".prop_map(Key::Text),
        any::<bool>().prop_map(Key::Flag),
    ]
}

#[derive(Debug, Clone)]
enum Op {
    Insert(Key, i64),
    Erase(Key),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (key_strategy(), any::<i64>()).prop_map(|(k, v)| Op::Insert(k, v)),
        2 => key_strategy().prop_map(Op::Erase),
    ]
}

proptest! {
    #[test]
    fn dict_matches_hashmap_model(ops in prop::collection::vec(op_strategy(), 0..300)) {
        let dict = UDict::new();
        let mut model: HashMap<Key, i64> = HashMap::new();

        for op in &ops {
            match op {
                Op::Insert(k, v) => {
                    let old = dict.insert(k.to_any(), *v);
                    prop_assert_eq!(old.map(|a| a.cast::<i64>().unwrap()), model.insert(k.clone(), *v));
                }
                Op::Erase(k) => {
                    let old = dict.erase(k.to_any());
                    prop_assert_eq!(old.map(|a| a.cast::<i64>().unwrap()), model.remove(k));
                }
            }
            prop_assert_eq!(dict.size(), model.len());
        }

        for (k, v) in &model {
            prop_assert_eq!(dict.at(k.to_any()).unwrap(), *v);
        }
        prop_assert_eq!(dict.iter().count(), model.len());
        if dict.capacity() > 0 {
            prop_assert!(dict.size() * 100 <= dict.capacity() * 75);
        }
    }

    #[test]
    fn equal_values_hash_equal(a in key_strategy(), b in key_strategy()) {
        let (x, y) = (a.to_any(), b.to_any());
        prop_assert_eq!(any_equal(&x, &y), a == b);
        if any_equal(&x, &y) {
            prop_assert_eq!(any_hash(&x), any_hash(&y));
        }
    }

    #[test]
    fn float_keys_hash_consistently(v in any::<f64>()) {
        let a = Any::from(v);
        let b = Any::from(v);
        prop_assert!(any_equal(&a, &b));
        prop_assert_eq!(any_hash(&a), any_hash(&b));
    }

    #[test]
    fn string_content_preserved(text in "\\PC{0,40}") {
        let s = Str::from(text.as_str());
        prop_assert_eq!(s.size(), text.len());
        prop_assert_eq!(s.as_str(), Some(text.as_str()));
        prop_assert_eq!(s.as_bytes_with_nul().last(), Some(&0u8));
    }

    #[test]
    fn string_order_matches_bytes(a in "[a-z]{0,6}", b in "[a-z]{0,6}") {
        let (sa, sb) = (Str::from(a.as_str()), Str::from(b.as_str()));
        prop_assert_eq!(sa.cmp(&sb), a.as_bytes().cmp(b.as_bytes()));
    }
}
