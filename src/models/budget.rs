//! Input-sized cap on how much a decode may read out.
//!
//! Chunk control blocks and submesh vertex/index buffers occupy disjoint
//! regions of a well-formed file, so together they never account for more
//! bytes than the buffer holds. Offsets are not checked for aliasing, so a
//! crafted table can point many entries at one large buffer; charging every
//! region against the buffer length keeps output size linear in input size.

use crate::error::{DecodeError, DecodeResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeBudget {
    total: usize,
    remaining: usize,
}

impl DecodeBudget {
    pub fn new(file_data: &[u8]) -> Self {
        Self {
            total: file_data.len(),
            remaining: file_data.len(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.remaining
    }

    /// Take `bytes` from the budget. Nothing is taken on failure.
    pub fn charge(&mut self, bytes: usize, offset: usize, what: &str) -> DecodeResult<()> {
        match self.remaining.checked_sub(bytes) {
            Some(left) => {
                self.remaining = left;
                Ok(())
            }
            None => Err(DecodeError::malformed(
                offset,
                format!(
                    "{what} of 0x{bytes:X} bytes exceed 0x{:X} left of a 0x{:X} byte buffer",
                    self.remaining, self.total
                ),
            )),
        }
    }
}
