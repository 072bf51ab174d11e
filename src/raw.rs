use libc::c_void;

/// The byte-level allocator chunks are carved from.
///
/// # Safety
///
/// Implementors must honour the C allocator contract: `alloc_zeroed`
/// returns zeroed memory, a failing `realloc` returns null and leaves the
/// original block valid and unchanged, and every non-null pointer handed
/// out stays valid until passed to `realloc` or `free`. Pointers returned
/// must be aligned to at least [`MIN_ALIGN`](crate::MIN_ALIGN).
pub unsafe trait RawAllocator {
  unsafe fn alloc(
    &self,
    size: usize,
  ) -> *mut u8;

  unsafe fn alloc_zeroed(
    &self,
    size: usize,
  ) -> *mut u8;

  unsafe fn realloc(
    &self,
    ptr: *mut u8,
    size: usize,
  ) -> *mut u8;

  unsafe fn free(
    &self,
    ptr: *mut u8,
  );
}

/// The process heap, through `malloc(3)` and friends.
#[derive(Debug, Default, Clone, Copy)]
pub struct Libc;

unsafe impl RawAllocator for Libc {
  unsafe fn alloc(
    &self,
    size: usize,
  ) -> *mut u8 {
    unsafe { libc::malloc(size) as *mut u8 }
  }

  unsafe fn alloc_zeroed(
    &self,
    size: usize,
  ) -> *mut u8 {
    unsafe { libc::calloc(1, size) as *mut u8 }
  }

  unsafe fn realloc(
    &self,
    ptr: *mut u8,
    size: usize,
  ) -> *mut u8 {
    unsafe { libc::realloc(ptr as *mut c_void, size) as *mut u8 }
  }

  unsafe fn free(
    &self,
    ptr: *mut u8,
  ) {
    unsafe { libc::free(ptr as *mut c_void) }
  }
}

unsafe impl<R: RawAllocator + ?Sized> RawAllocator for &R {
  unsafe fn alloc(
    &self,
    size: usize,
  ) -> *mut u8 {
    unsafe { (**self).alloc(size) }
  }

  unsafe fn alloc_zeroed(
    &self,
    size: usize,
  ) -> *mut u8 {
    unsafe { (**self).alloc_zeroed(size) }
  }

  unsafe fn realloc(
    &self,
    ptr: *mut u8,
    size: usize,
  ) -> *mut u8 {
    unsafe { (**self).realloc(ptr, size) }
  }

  unsafe fn free(
    &self,
    ptr: *mut u8,
  ) {
    unsafe { (**self).free(ptr) }
  }
}
