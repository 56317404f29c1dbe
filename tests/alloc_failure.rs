//! Allocation failure tests for the fallible `BirchSet` operations.
//!
//! This test binary installs a global allocator that forwards to the system allocator
//! until the current thread's allocation budget runs out, then returns null. Fallible
//! operations must report the failure and leave every container exactly as it was.
//!
//! The budget is per thread, so tests running in parallel do not consume each other's
//! budget. Only the calls made between [`with_budget`] arming and disarming are limited.

use std::alloc::{GlobalAlloc, Layout, System};
use std::cell::Cell;
use std::ptr;

use birchset::{BirchSet, Error};

thread_local! {
    static BUDGET: Cell<Option<usize>> = const { Cell::new(None) };
}

/// Fails allocations once the calling thread's budget is spent.
struct FailingAllocator;

impl FailingAllocator {
    fn permitted() -> bool {
        BUDGET
            .try_with(|budget| match budget.get() {
                None => true,
                Some(0) => false,
                Some(left) => {
                    budget.set(Some(left - 1));
                    true
                }
            })
            .unwrap_or(true)
    }
}

unsafe impl GlobalAlloc for FailingAllocator {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        if Self::permitted() {
            unsafe { System.alloc(layout) }
        } else {
            ptr::null_mut()
        }
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        unsafe { System.dealloc(ptr, layout) }
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        if Self::permitted() {
            unsafe { System.realloc(ptr, layout, new_size) }
        } else {
            ptr::null_mut()
        }
    }
}

#[global_allocator]
static ALLOC: FailingAllocator = FailingAllocator;

/// Runs `f` with at most `allocations` successful allocations on this thread.
fn with_budget<T>(allocations: usize, f: impl FnOnce() -> T) -> T {
    BUDGET.with(|budget| budget.set(Some(allocations)));
    let result = f();
    BUDGET.with(|budget| budget.set(None));
    result
}

fn snapshot(set: &BirchSet<u32>) -> (Vec<u32>, usize, usize) {
    (set.iter().copied().collect(), set.len(), set.height())
}

#[test]
fn insert_into_empty_set_fails_cleanly() {
    let mut set = BirchSet::new();

    let result = with_budget(0, || set.try_insert(7));

    assert!(matches!(result, Err(Error::AllocationFailed(_))));
    assert!(set.is_empty());
    assert_eq!(set.begin(), set.end());
    set.assert_invariants();

    assert_eq!(set.try_insert(7).map(|(_, inserted)| inserted), Ok(true));
}

#[test]
fn insert_failure_at_every_growth_point() {
    let mut set = BirchSet::new();

    for key in (0..200u32).map(|k| k.wrapping_mul(2_654_435_761) % 1000) {
        let before = snapshot(&set);

        match with_budget(0, || set.try_insert(key)) {
            Ok(_) => {}
            Err(Error::AllocationFailed(_)) => {
                assert_eq!(snapshot(&set), before, "failed insert of {key} changed the set");
                set.assert_invariants();

                // with memory available the same insert goes through.
                set.try_insert(key).unwrap();
            }
        }

        assert!(set.contains(&key));
        set.assert_invariants();
    }
}

#[test]
fn duplicate_insert_never_allocates() {
    let mut set = BirchSet::from([5, 3, 8]);

    let (position, inserted) = with_budget(0, || set.try_insert(3)).unwrap();

    assert!(!inserted);
    assert_eq!(set.get(position), Some(&3));
    assert_eq!(set.len(), 3);
}

#[test]
fn erased_slots_are_reused_without_allocating() {
    let mut set: BirchSet<u32> = (0..32).collect();
    for key in [3, 17, 31] {
        set.remove(&key);
    }

    let inserted = with_budget(0, || [40, 41, 42].map(|key| set.try_insert(key).is_ok()));

    assert_eq!(inserted, [true, true, true]);
    assert_eq!(set.len(), 32);
    set.assert_invariants();
}

#[test]
fn clone_failure_leaves_source_intact() {
    let set: BirchSet<u32> = [50, 30, 70, 20, 40, 60, 80].into_iter().collect();
    let before = snapshot(&set);

    let result = with_budget(0, || set.try_clone());

    assert!(matches!(result, Err(Error::AllocationFailed(_))));
    assert_eq!(snapshot(&set), before);

    let copy = with_budget(1, || set.try_clone()).unwrap();
    assert_eq!(snapshot(&copy), before);
    copy.assert_invariants();
}

#[test]
fn clone_from_failure_leaves_target_intact() {
    let source: BirchSet<u32> = (0..64).collect();
    let mut target = BirchSet::from([7, 3, 9]);
    let before = snapshot(&target);

    let result = with_budget(0, || target.try_clone_from(&source));

    assert!(matches!(result, Err(Error::AllocationFailed(_))));
    assert_eq!(snapshot(&target), before);
    assert_eq!(source.len(), 64);
    target.assert_invariants();

    target.try_clone_from(&source).unwrap();
    assert_eq!(target, source);
}

#[test]
fn empty_clone_needs_no_memory() {
    let set = BirchSet::<u32>::new();

    let copy = with_budget(0, || set.try_clone()).unwrap();

    assert!(copy.is_empty());
}
