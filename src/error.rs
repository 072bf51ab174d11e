use thiserror::Error;

/// Failure of a chunk-creating operation. The tree is left untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AllocError {
  #[error("raw allocator could not provide {size} bytes")]
  OutOfMemory { size: usize },

  #[error("requested size {size} overflows once the chunk header is added")]
  SizeOverflow { size: usize },
}
