use std::{ptr, ptr::NonNull};

use log::{debug, trace};

use crate::{
  error::AllocError,
  header::{HEADER_SIZE, Header, header, to_handle, to_raw},
  raw::{Libc, RawAllocator},
};

unsafe fn child(handle: *mut u8) -> *mut u8 {
  unsafe { (*header(handle)).first_child }
}

unsafe fn next(handle: *mut u8) -> *mut u8 {
  unsafe { (*header(handle)).next_sibling }
}

unsafe fn prev(handle: *mut u8) -> *mut u8 {
  unsafe { (*header(handle)).prev_link }
}

unsafe fn set_child(
  handle: *mut u8,
  value: *mut u8,
) {
  unsafe { (*header(handle)).first_child = value }
}

unsafe fn set_next(
  handle: *mut u8,
  value: *mut u8,
) {
  unsafe { (*header(handle)).next_sibling = value }
}

unsafe fn set_prev(
  handle: *mut u8,
  value: *mut u8,
) {
  unsafe { (*header(handle)).prev_link = value }
}

/// Whether a non-root chunk heads its parent's child list. A previous
/// sibling would point back at `handle` through its `next_sibling`; a
/// parent never does.
unsafe fn is_first(handle: *mut u8) -> bool {
  unsafe { next(prev(handle)) != handle }
}

fn total_size(size: usize) -> Result<usize, AllocError> {
  size
    .checked_add(HEADER_SIZE)
    .ok_or(AllocError::SizeOverflow { size })
}

fn or_null(result: Result<NonNull<u8>, AllocError>) -> *mut u8 {
  match result {
    Ok(handle) => handle.as_ptr(),
    Err(_) => ptr::null_mut(),
  }
}

/// Hierarchical allocator: every chunk may depend on a parent chunk, and
/// freeing a chunk frees everything that depends on it.
///
/// Handles are payload addresses. Null is accepted wherever a handle or
/// parent is optional. All methods are `unsafe` because handles are
/// unchecked: passing anything other than null or a live handle from this
/// allocator is undefined behavior, as is reparenting a chunk under one of
/// its own descendants.
pub struct TreeAllocator<R: RawAllocator = Libc> {
  raw: R,
}

impl TreeAllocator<Libc> {
  pub fn new() -> Self {
    Self { raw: Libc }
  }
}

impl Default for TreeAllocator<Libc> {
  fn default() -> Self {
    Self::new()
  }
}

impl<R: RawAllocator> TreeAllocator<R> {
  pub fn with_raw(raw: R) -> Self {
    Self { raw }
  }

  pub fn raw(&self) -> &R {
    &self.raw
  }

  /// Allocates `size` bytes depending on `parent` (or a new root when
  /// `parent` is null). The new chunk becomes `parent`'s first child.
  pub unsafe fn try_alloc(
    &self,
    size: usize,
    parent: *mut u8,
  ) -> Result<NonNull<u8>, AllocError> {
    unsafe {
      let total = total_size(size).inspect_err(|err| debug!("alloc failed: {err}"))?;
      self.init(self.raw.alloc(total), size, parent)
    }
  }

  /// Like [`try_alloc`](Self::try_alloc), with a zero-initialized payload.
  pub unsafe fn try_alloc_zeroed(
    &self,
    size: usize,
    parent: *mut u8,
  ) -> Result<NonNull<u8>, AllocError> {
    unsafe {
      let total = total_size(size).inspect_err(|err| debug!("alloc failed: {err}"))?;
      self.init(self.raw.alloc_zeroed(total), size, parent)
    }
  }

  /// Resizes the chunk behind `handle`, possibly moving it. Links pointing
  /// at the chunk are rewritten; its descendants stay where they are.
  ///
  /// On failure the chunk and the tree are left exactly as they were.
  pub unsafe fn try_reallocate(
    &self,
    handle: *mut u8,
    size: usize,
  ) -> Result<NonNull<u8>, AllocError> {
    if handle.is_null() {
      return unsafe { self.try_alloc(size, ptr::null_mut()) };
    }

    unsafe {
      let total = total_size(size).inspect_err(|err| debug!("realloc of {handle:p} failed: {err}"))?;
      let raw = self.raw.realloc(to_raw(handle), total);

      if raw.is_null() {
        let err = AllocError::OutOfMemory { size };
        debug!("realloc of {handle:p} failed: {err}");
        return Err(err);
      }

      let moved = to_handle(raw);

      if moved != handle {
        trace!("chunk {handle:p} relocated to {moved:p}");
        relink(handle, moved);
      }

      Ok(NonNull::new_unchecked(moved))
    }
  }

  pub unsafe fn alloc(
    &self,
    size: usize,
    parent: *mut u8,
  ) -> *mut u8 {
    or_null(unsafe { self.try_alloc(size, parent) })
  }

  pub unsafe fn alloc_zeroed(
    &self,
    size: usize,
    parent: *mut u8,
  ) -> *mut u8 {
    or_null(unsafe { self.try_alloc_zeroed(size, parent) })
  }

  pub unsafe fn reallocate(
    &self,
    handle: *mut u8,
    size: usize,
  ) -> *mut u8 {
    or_null(unsafe { self.try_reallocate(handle, size) })
  }

  /// Frees `handle` and every chunk depending on it. Always returns null
  /// so callers can write `p = tree.free(p)`.
  ///
  /// # Panics
  ///
  /// Panics if the subtree contains a cycle.
  pub unsafe fn free(
    &self,
    handle: *mut u8,
  ) -> *mut u8 {
    if handle.is_null() {
      return ptr::null_mut();
    }

    unsafe {
      self.set_parent(handle, ptr::null_mut());
      self.destroy(handle);
    }

    trace!("freed subtree at {handle:p}");

    ptr::null_mut()
  }

  /// Parent of `handle`, or null for roots. Costs one step per sibling in
  /// front of `handle`.
  pub unsafe fn get_parent(
    &self,
    handle: *mut u8,
  ) -> *mut u8 {
    unsafe {
      if handle.is_null() || prev(handle).is_null() {
        return ptr::null_mut();
      }

      let mut current = handle;

      while !is_first(current) {
        current = prev(current);
      }

      prev(current)
    }
  }

  /// Moves `handle`, with its whole subtree, to the front of `parent`'s
  /// child list. A null `parent` makes it a root.
  pub unsafe fn set_parent(
    &self,
    handle: *mut u8,
    parent: *mut u8,
  ) {
    if handle.is_null() {
      return;
    }

    unsafe {
      let back = prev(handle);

      if !back.is_null() {
        let sibling = next(handle);

        if !sibling.is_null() {
          set_prev(sibling, back);
        }

        if is_first(handle) {
          set_child(back, sibling);
        } else {
          set_next(back, sibling);
        }
      }

      set_next(handle, ptr::null_mut());
      set_prev(handle, ptr::null_mut());

      if !parent.is_null() {
        let head = child(parent);

        set_next(handle, head);

        if !head.is_null() {
          set_prev(head, handle);
        }

        set_prev(handle, parent);
        set_child(parent, handle);
      }
    }

    trace!("chunk {handle:p} reparented under {parent:p}");
  }

  /// Detaches `handle` into a root of its own and hands its children to
  /// `parent`, in front of the children `parent` already has. With a null
  /// `parent` every former child becomes a root.
  pub unsafe fn steal(
    &self,
    handle: *mut u8,
    parent: *mut u8,
  ) {
    if handle.is_null() {
      return;
    }

    unsafe {
      self.set_parent(handle, ptr::null_mut());

      let first = child(handle);

      if first.is_null() {
        return;
      }

      set_child(handle, ptr::null_mut());

      if parent.is_null() {
        let mut current = first;

        while !current.is_null() {
          let following = next(current);
          set_next(current, ptr::null_mut());
          set_prev(current, ptr::null_mut());
          current = following;
        }
      } else {
        let head = child(parent);

        if !head.is_null() {
          let mut last = first;

          while !next(last).is_null() {
            last = next(last);
          }

          set_next(last, head);
          set_prev(head, last);
        }

        set_prev(first, parent);
        set_child(parent, first);
      }
    }

    trace!("children of {handle:p} moved under {parent:p}");
  }

  pub unsafe fn first_child(
    &self,
    handle: *mut u8,
  ) -> *mut u8 {
    if handle.is_null() {
      return ptr::null_mut();
    }

    unsafe { child(handle) }
  }

  pub unsafe fn next_sibling(
    &self,
    handle: *mut u8,
  ) -> *mut u8 {
    if handle.is_null() {
      return ptr::null_mut();
    }

    unsafe { next(handle) }
  }

  /// Raw back-link: the parent for a first child, the previous sibling
  /// otherwise, null for a root.
  pub unsafe fn prev_link(
    &self,
    handle: *mut u8,
  ) -> *mut u8 {
    if handle.is_null() {
      return ptr::null_mut();
    }

    unsafe { prev(handle) }
  }

  pub unsafe fn is_root(
    &self,
    handle: *mut u8,
  ) -> bool {
    handle.is_null() || unsafe { prev(handle).is_null() }
  }

  pub unsafe fn is_first_child(
    &self,
    handle: *mut u8,
  ) -> bool {
    unsafe { !self.is_root(handle) && is_first(handle) }
  }

  /// Iterates the child list of `handle`, most recently attached first.
  /// The iterator reads links lazily and borrows nothing: the list must not
  /// be modified, nor its chunks freed, while it is in use.
  pub unsafe fn children(
    &self,
    handle: *mut u8,
  ) -> Children {
    Children {
      current: unsafe { self.first_child(handle) },
    }
  }

  unsafe fn init(
    &self,
    raw: *mut u8,
    size: usize,
    parent: *mut u8,
  ) -> Result<NonNull<u8>, AllocError> {
    if raw.is_null() {
      let err = AllocError::OutOfMemory { size };
      debug!("alloc failed: {err}");
      return Err(err);
    }

    unsafe {
      let handle = to_handle(raw);
      header(handle).write(Header::new());

      trace!("allocated {size} bytes at {handle:p}, parent {parent:p}");

      self.set_parent(handle, parent);

      Ok(NonNull::new_unchecked(handle))
    }
  }

  /// Releases the root `top` and everything below it, each chunk after
  /// its descendants and later siblings, in constant stack space.
  ///
  /// The walk treats `first_child` and `next_sibling` as the two branches
  /// of a binary tree and clears each branch as it takes it. Every chunk's
  /// `prev_link` already names the chunk it is entered from, so it leads
  /// back up once both branches are gone.
  unsafe fn destroy(
    &self,
    top: *mut u8,
  ) {
    let mut current = top;

    loop {
      unsafe {
        let down = child(current);
        let side = next(current);

        let target = if !down.is_null() {
          set_child(current, ptr::null_mut());
          down
        } else if !side.is_null() {
          set_next(current, ptr::null_mut());
          side
        } else {
          ptr::null_mut()
        };

        if !target.is_null() {
          assert!(prev(target) == current, "cycle in chunk tree at {target:p}");
          current = target;
          continue;
        }

        let up = prev(current);
        self.raw.free(to_raw(current));

        if current == top {
          return;
        }

        current = up;
      }
    }
  }
}

/// Rewrites every link aimed at a chunk that moved from `old` to `new`.
/// The chunk's own header has already moved with it.
unsafe fn relink(
  old: *mut u8,
  new: *mut u8,
) {
  unsafe {
    let head = child(new);

    if !head.is_null() {
      set_prev(head, new);
    }

    let sibling = next(new);

    if !sibling.is_null() {
      set_prev(sibling, new);
    }

    let back = prev(new);

    if !back.is_null() {
      if next(back) == old {
        set_next(back, new);
      } else {
        set_child(back, new);
      }
    }
  }
}

/// Iterator over a child list, see [`TreeAllocator::children`].
pub struct Children {
  current: *mut u8,
}

impl Iterator for Children {
  type Item = *mut u8;

  fn next(&mut self) -> Option<Self::Item> {
    if self.current.is_null() {
      return None;
    }

    let item = self.current;
    self.current = unsafe { next(item) };

    Some(item)
  }
}
