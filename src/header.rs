use std::{mem, ptr};

use crate::align_to;

/// Alignment assumed of every pointer returned by the raw allocator.
pub const MIN_ALIGN: usize = 2 * mem::size_of::<usize>();

/// Bytes reserved in front of each payload. The header sits at the end of
/// this prefix so it is adjacent to the payload.
pub const HEADER_SIZE: usize = align_to!(mem::size_of::<Header>(), MIN_ALIGN);

/// Tree links of a chunk. Every link holds a payload address (handle).
///
/// `prev_link` is the parent when the chunk heads its parent's child list
/// and the previous sibling otherwise. It is null only for roots.
#[repr(C)]
pub struct Header {
  pub first_child: *mut u8,
  pub next_sibling: *mut u8,
  pub prev_link: *mut u8,
}

impl Header {
  pub fn new() -> Self {
    Self {
      first_child: ptr::null_mut(),
      next_sibling: ptr::null_mut(),
      prev_link: ptr::null_mut(),
    }
  }
}

/// Payload address for a chunk whose raw block starts at `raw`.
pub unsafe fn to_handle(raw: *mut u8) -> *mut u8 {
  unsafe { raw.add(HEADER_SIZE) }
}

/// Raw block start for the chunk behind `handle`.
pub unsafe fn to_raw(handle: *mut u8) -> *mut u8 {
  unsafe { handle.sub(HEADER_SIZE) }
}

/// Header of the chunk behind `handle`.
pub unsafe fn header(handle: *mut u8) -> *mut Header {
  unsafe { handle.sub(mem::size_of::<Header>()) as *mut Header }
}
