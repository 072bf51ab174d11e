//! Shared test utilities: a recording raw allocator with failure injection
//! and a checker for the tree's structural invariants.

#![allow(dead_code)]

use std::{
  cell::{Cell, RefCell},
  collections::HashMap,
  ptr,
};

use treealloc::{HEADER_SIZE, Libc, RawAllocator, TreeAllocator};

pub fn init_logging() {
  let _ = env_logger::builder().is_test(true).try_init();
}

/// Wraps `malloc` and remembers which chunks are live and which were freed.
///
/// A relocating instance moves every reallocated block to a fresh address
/// and holds on to the old block until drop, so the address is never
/// handed out again while the test runs.
#[derive(Default)]
pub struct Tracking {
  live: RefCell<HashMap<usize, usize>>,
  freed: RefCell<Vec<*mut u8>>,
  fail_next: Cell<bool>,
  relocate: bool,
  retired: RefCell<Vec<*mut u8>>,
}

impl Tracking {
  pub fn relocating() -> Self {
    let mut tracking = Self::default();
    tracking.relocate = true;
    tracking
  }

  pub fn relocates(&self) -> bool {
    self.relocate
  }

  /// Makes the next raw allocation request fail.
  pub fn fail_next(&self) {
    self.fail_next.set(true);
  }

  pub fn live_handles(&self) -> Vec<*mut u8> {
    self.live.borrow().keys().map(|addr| *addr as *mut u8).collect()
  }

  pub fn live_count(&self) -> usize {
    self.live.borrow().len()
  }

  /// Handles freed since the last call.
  pub fn take_freed(&self) -> Vec<*mut u8> {
    self.freed.take()
  }

  fn failing(&self) -> bool {
    self.fail_next.replace(false)
  }

  fn track(
    &self,
    raw: *mut u8,
    size: usize,
  ) -> *mut u8 {
    if !raw.is_null() {
      self.live.borrow_mut().insert(raw as usize + HEADER_SIZE, size);
    }
    raw
  }
}

impl Drop for Tracking {
  fn drop(&mut self) {
    for raw in self.retired.take() {
      unsafe { Libc.free(raw) }
    }
  }
}

unsafe impl RawAllocator for Tracking {
  unsafe fn alloc(
    &self,
    size: usize,
  ) -> *mut u8 {
    if self.failing() {
      return ptr::null_mut();
    }
    self.track(unsafe { Libc.alloc(size) }, size)
  }

  unsafe fn alloc_zeroed(
    &self,
    size: usize,
  ) -> *mut u8 {
    if self.failing() {
      return ptr::null_mut();
    }
    self.track(unsafe { Libc.alloc_zeroed(size) }, size)
  }

  unsafe fn realloc(
    &self,
    raw: *mut u8,
    size: usize,
  ) -> *mut u8 {
    if self.failing() {
      return ptr::null_mut();
    }

    let handle = raw as usize + HEADER_SIZE;
    let old_size = *self.live.borrow().get(&handle).expect("realloc of a dead chunk");

    let moved = if self.relocate {
      unsafe {
        let moved = Libc.alloc(size);
        if !moved.is_null() {
          moved.copy_from_nonoverlapping(raw, old_size.min(size));
          self.retired.borrow_mut().push(raw);
        }
        moved
      }
    } else {
      unsafe { Libc.realloc(raw, size) }
    };

    if !moved.is_null() {
      self.live.borrow_mut().remove(&handle);
    }

    self.track(moved, size)
  }

  unsafe fn free(
    &self,
    raw: *mut u8,
  ) {
    let handle = raw as usize + HEADER_SIZE;
    assert!(self.live.borrow_mut().remove(&handle).is_some(), "double free of {handle:#x}");
    self.freed.borrow_mut().push(handle as *mut u8);
    unsafe { Libc.free(raw) }
  }
}

/// Checks link symmetry, single membership and parent queries over every
/// live chunk. Returns the parent of each live chunk.
pub unsafe fn check_invariants(tree: &TreeAllocator<Tracking>) -> HashMap<*mut u8, *mut u8> {
  let live = tree.raw().live_handles();
  let mut parents = HashMap::new();

  unsafe {
    for &chunk in &live {
      let next = tree.next_sibling(chunk);
      if !next.is_null() {
        assert_eq!(tree.prev_link(next), chunk, "next sibling of {chunk:p} does not point back");
      }

      let first = tree.first_child(chunk);
      if !first.is_null() {
        assert_eq!(tree.prev_link(first), chunk, "first child of {chunk:p} does not point back");
        assert!(tree.is_first_child(first));
      }
    }

    for &root in live.iter().filter(|chunk| tree.is_root(**chunk)) {
      assert!(tree.get_parent(root).is_null());
      assert!(tree.next_sibling(root).is_null());
      parents.insert(root, ptr::null_mut());
      collect(tree, root, &mut parents);
    }
  }

  assert_eq!(parents.len(), live.len(), "some live chunks are unreachable from a root");

  parents
}

unsafe fn collect(
  tree: &TreeAllocator<Tracking>,
  parent: *mut u8,
  parents: &mut HashMap<*mut u8, *mut u8>,
) {
  unsafe {
    for child in tree.children(parent) {
      assert!(parents.insert(child, parent).is_none(), "{child:p} reached twice");
      assert_eq!(tree.get_parent(child), parent);
      collect(tree, child, parents);
    }
  }
}
