//! # treealloc - A Hierarchical Memory Allocator
//!
//! This crate provides a **tree allocator**: every allocation may depend on a
//! *parent* allocation, and freeing a parent frees everything below it.
//!
//! ## Overview
//!
//! Application code models object lifetimes as a tree (a parsed document
//! owns its nodes, which own their strings) and disposes of the whole
//! structure by freeing its root:
//!
//! ```text
//!   Dependency Forest:
//!
//!   NULL <-- doc --> NULL
//!             ^
//!             |
//!             +-> node <--> node <--> node --> NULL
//!                  |         |         ^
//!                  v         v         |
//!                 NULL      NULL       +-> str <--> str --> NULL
//!                                           |        |
//!                                           v        v
//!                                          NULL     NULL
//!
//!   free(doc) releases all seven chunks.
//! ```
//!
//! ## Crate Structure
//!
//! ```text
//!   treealloc
//!   ├── align      - Alignment macro (align_to!)
//!   ├── error      - AllocError
//!   ├── header     - Chunk header layout (internal)
//!   ├── raw        - RawAllocator trait and the libc implementation
//!   └── tree       - TreeAllocator implementation
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use std::ptr;
//! use treealloc::TreeAllocator;
//!
//! let tree = TreeAllocator::new();
//!
//! unsafe {
//!     let doc = tree.alloc(64, ptr::null_mut());
//!     let node = tree.alloc(32, doc);
//!     let text = tree.alloc_zeroed(16, node);
//!
//!     assert_eq!(tree.get_parent(text), node);
//!     assert_eq!(tree.get_parent(node), doc);
//!
//!     // Releases doc, node and text.
//!     tree.free(doc);
//! }
//! ```
//!
//! ## How It Works
//!
//! Each chunk carries a header right before the bytes handed to the user:
//!
//! ```text
//!   Single Allocation:
//!   ┌──────────────────────────────────────┬─────────────────────────┐
//!   │            Chunk Header              │        User Data        │
//!   │  ┌────────┬─────────────┬──────────┐ │                         │
//!   │  │ first  │    next     │   prev   │ │   N bytes usable        │
//!   │  │ child  │   sibling   │   link   │ │                         │
//!   │  └────────┴─────────────┴──────────┘ │                         │
//!   │   HEADER_SIZE (padded to MIN_ALIGN)  │                         │
//!   └──────────────────────────────────────┴─────────────────────────┘
//!                                          ▲
//!                                          └── Handle returned to user
//! ```
//!
//! A child list is doubly linked, except that the head's back-link points
//! at the parent instead of a predecessor. Telling the two apart is O(1):
//! a previous sibling points forward at the chunk, a parent does not.
//!
//! Reallocation may move a chunk. When it does, the parent or previous
//! sibling, the next sibling and the first child are patched to the new
//! address; nothing else in the tree changes.
//!
//! ## Features
//!
//! - **Cascading free**: `free` releases a chunk and all its descendants
//! - **Reparenting**: `set_parent` moves a subtree, `steal` hands a chunk's
//!   children to another parent
//! - **Pluggable backing store**: any [`RawAllocator`], `malloc` by default
//! - **Logging**: structural operations are reported through `log` at
//!   `trace` level, allocation failures at `debug`
//!
//! ## Limitations
//!
//! - **Single-threaded only**: handles must not be shared across threads
//! - **No destructors**: only bytes are reclaimed
//! - **Unchecked handles**: passing foreign pointers, double frees and
//!   reparenting under a descendant are undefined behavior; `free` only
//!   asserts against cycles
//!
//! ## Safety
//!
//! Handles are raw pointers, so every operation is an `unsafe fn`.

pub mod align;
mod error;
mod header;
mod raw;
mod tree;

pub use error::AllocError;
pub use header::{HEADER_SIZE, MIN_ALIGN};
pub use raw::{Libc, RawAllocator};
pub use tree::{Children, TreeAllocator};
