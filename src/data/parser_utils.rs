//! Shared winnow-based parsing utilities used by the chunk, submesh and vertex decoders.

use winnow::error::ContextError;

use crate::error::{DecodeError, DecodeResult};

/// Common result type for winnow parsers.
pub type WResult<T> = Result<T, winnow::error::ErrMode<ContextError>>;

/// Resolve a relative offset against a base: `base + rel` as an absolute file offset.
///
/// Fields in the format are unsigned 32-bit values, so the only failure is
/// arithmetic overflow, which is reported as out of bounds.
pub fn resolve_offset(file_data: &[u8], base: usize, rel: u32) -> DecodeResult<usize> {
    base.checked_add(rel as usize)
        .ok_or(DecodeError::OutOfBounds {
            offset: base,
            len: rel as usize,
            available: file_data.len(),
        })
}

/// Borrow `len` bytes at `offset`, failing instead of clamping.
pub fn slice_at(file_data: &[u8], offset: usize, len: usize) -> DecodeResult<&[u8]> {
    offset
        .checked_add(len)
        .and_then(|end| file_data.get(offset..end))
        .ok_or(DecodeError::OutOfBounds {
            offset,
            len,
            available: file_data.len(),
        })
}
