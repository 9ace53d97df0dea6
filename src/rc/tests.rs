//! Comprehensive tests for handle ownership

use super::*;
use crate::allocator::ObjectHeader;
use std::cell::Cell;
use std::rc::Rc;

#[derive(Debug)]
struct Tracked {
    id: u32,
    drops: Rc<Cell<usize>>,
}

impl Drop for Tracked {
    fn drop(&mut self) {
        self.drops.set(self.drops.get() + 1);
    }
}

crate::object_type!(Tracked, "test.rc.Tracked");

#[derive(Debug)]
struct Other(u8);

crate::object_type!(Other, "test.rc.Other");

fn tracked(id: u32) -> (Rc<Cell<usize>>, Ref<Tracked>) {
    let drops = Rc::new(Cell::new(0));
    let handle = Ref::new(Tracked {
        id,
        drops: Rc::clone(&drops),
    });
    (drops, handle)
}

#[cfg(test)]
mod ref_tests {
    use super::*;

    #[test]
    fn test_ref_new() {
        let (drops, rc) = tracked(1);
        assert_eq!(Ref::ref_count(&rc), 1);
        assert_eq!(rc.id, 1);
        assert_eq!(Ref::header(&rc).type_index(), Tracked::type_index());

        drop(rc);
        assert_eq!(drops.get(), 1);
    }

    #[test]
    fn test_ref_clone() {
        let (drops, rc1) = tracked(2);

        let rc2 = rc1.clone();
        assert_eq!(Ref::ref_count(&rc1), 2);
        assert_eq!(Ref::ref_count(&rc2), 2);
        assert!(Ref::ptr_eq(&rc1, &rc2));

        drop(rc1);
        assert_eq!(drops.get(), 0);
        assert_eq!(Ref::ref_count(&rc2), 1);
        assert_eq!(rc2.id, 2);

        drop(rc2);
        assert_eq!(drops.get(), 1);
    }

    #[test]
    fn test_n_handles_release_in_order() {
        let (drops, first) = tracked(3);
        let mut handles: Vec<_> = (0..9).map(|_| first.clone()).collect();
        handles.push(first);
        assert_eq!(Ref::ref_count(&handles[0]), 10);

        while handles.len() > 1 {
            handles.pop();
            assert_eq!(drops.get(), 0);
            assert_eq!(Ref::ref_count(&handles[0]) as usize, handles.len());
        }

        handles.pop();
        assert_eq!(drops.get(), 1);
    }

    #[test]
    fn test_move_keeps_count() {
        let (drops, rc) = tracked(4);
        let moved = rc;
        assert_eq!(Ref::ref_count(&moved), 1);

        let mut slot = Some(moved);
        let taken = slot.take();
        assert!(slot.is_none());
        assert_eq!(Ref::ref_count(taken.as_ref().unwrap()), 1);

        drop(taken);
        assert_eq!(drops.get(), 1);
    }

    #[test]
    fn test_option_ref_is_pointer_sized() {
        assert_eq!(
            core::mem::size_of::<Option<Ref<Tracked>>>(),
            core::mem::size_of::<usize>()
        );
    }

    #[test]
    fn test_into_raw_from_raw() {
        let (drops, rc) = tracked(5);
        let raw = Ref::into_raw(rc);

        unsafe {
            assert_eq!(raw.as_ref().ref_count(), 1);
            let back = Ref::<Tracked>::from_raw(raw.as_ptr()).unwrap();
            assert_eq!(back.id, 5);
            drop(back);
        }
        assert_eq!(drops.get(), 1);
    }

    #[test]
    fn test_from_raw_null() {
        let err = unsafe { Ref::<Tracked>::from_raw(core::ptr::null_mut()) }.unwrap_err();
        assert!(matches!(err, crate::Error::InvariantViolation(_)));
    }

    #[test]
    fn test_from_raw_wrong_type_keeps_ownership() {
        let (drops, rc) = tracked(6);
        let raw = Ref::into_raw(rc);

        unsafe {
            let err = Ref::<Other>::from_raw(raw.as_ptr()).unwrap_err();
            assert!(err.is_type_mismatch());
            assert_eq!(raw.as_ref().ref_count(), 1);
            ObjectHeader::dec_ref(raw);
        }
        assert_eq!(drops.get(), 1);
    }
}

#[cfg(test)]
mod object_ref_tests {
    use super::*;

    #[test]
    fn test_erase_and_downcast() {
        let (drops, rc) = tracked(7);
        let obj = Ref::into_object(rc);
        assert_eq!(obj.ref_count(), 1);
        assert!(obj.is::<Tracked>());
        assert!(!obj.is::<Other>());
        assert_eq!(obj.downcast_ref::<Tracked>().map(|t| t.id), Some(7));

        let typed = obj.downcast::<Tracked>().unwrap();
        assert_eq!(Ref::ref_count(&typed), 1);
        drop(typed);
        assert_eq!(drops.get(), 1);
    }

    #[test]
    fn test_downcast_mismatch() {
        let obj = Ref::into_object(Ref::new(Other(1)));
        let err = obj.downcast::<Tracked>().unwrap_err();
        assert!(err.is_type_mismatch());
        assert!(err.to_string().contains("test.rc.Tracked"));
        assert!(err.to_string().contains("test.rc.Other"));
    }

    #[test]
    fn test_to_object_shares() {
        let (drops, rc) = tracked(8);
        let obj = Ref::to_object(&rc);
        assert_eq!(Ref::ref_count(&rc), 2);

        let obj2 = obj.clone();
        assert!(obj.ptr_eq(&obj2));
        assert_eq!(obj.ref_count(), 3);

        drop(rc);
        drop(obj);
        assert_eq!(drops.get(), 0);
        drop(obj2);
        assert_eq!(drops.get(), 1);
    }

    #[test]
    fn test_from_borrowed() {
        let (drops, rc) = tracked(9);
        let borrowed = unsafe { ObjectRef::from_borrowed(Ref::as_ptr(&rc)) };
        assert_eq!(Ref::ref_count(&rc), 2);
        drop(borrowed);
        assert_eq!(Ref::ref_count(&rc), 1);
        drop(rc);
        assert_eq!(drops.get(), 1);
    }

    #[test]
    fn test_object_from_raw_null() {
        assert!(unsafe { ObjectRef::from_raw(core::ptr::null_mut()) }.is_err());
    }
}
