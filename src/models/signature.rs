//! Locates mesh chunks by scanning for their fixed start signature.
//!
//! The container has no directory; every mesh chunk is introduced by the
//! 12-byte pattern
//!
//! ```text
//! 33 EA 00 00  ?? ?? ?? ??  2D 00 02 1C
//! ```
//!
//! where the middle word varies per chunk and is not interpreted. The chunk
//! header begins four bytes after the end of the match.

use std::iter::FusedIterator;

/// Length of the chunk start signature in bytes.
pub const SIGNATURE_LEN: usize = 12;
const SIGNATURE_PREFIX: [u8; 4] = [0x33, 0xEA, 0x00, 0x00];
const SIGNATURE_SUFFIX: [u8; 4] = [0x2D, 0x00, 0x02, 0x1C];
/// Bytes between the end of the signature and the chunk header.
const HEADER_GAP: usize = 4;

/// A signature match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkMatch {
    /// File offset of the first signature byte.
    pub offset: usize,
}

impl ChunkMatch {
    /// Offset one past the last signature byte.
    pub fn end(&self) -> usize {
        self.offset + SIGNATURE_LEN
    }

    /// Offset where the chunk header parse starts.
    pub fn header_start(&self) -> usize {
        self.end() + HEADER_GAP
    }
}

fn is_signature(window: &[u8]) -> bool {
    window[..4] == SIGNATURE_PREFIX && window[8..SIGNATURE_LEN] == SIGNATURE_SUFFIX
}

/// Scanner over one buffer. Each call to [`ChunkLocator::matches`] starts a
/// fresh scan from the beginning.
#[derive(Debug, Clone, Copy)]
pub struct ChunkLocator<'a> {
    data: &'a [u8],
}

impl<'a> ChunkLocator<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    pub fn matches(&self) -> ChunkMatches<'a> {
        ChunkMatches {
            data: self.data,
            pos: 0,
        }
    }
}

impl<'a> IntoIterator for ChunkLocator<'a> {
    type Item = ChunkMatch;
    type IntoIter = ChunkMatches<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.matches()
    }
}

/// Iterator of non-overlapping signature matches in file order.
#[derive(Debug, Clone)]
pub struct ChunkMatches<'a> {
    data: &'a [u8],
    pos: usize,
}

impl Iterator for ChunkMatches<'_> {
    type Item = ChunkMatch;

    fn next(&mut self) -> Option<ChunkMatch> {
        let rest = self.data.get(self.pos..)?;
        let Some(found) = rest.windows(SIGNATURE_LEN).position(is_signature) else {
            self.pos = self.data.len();
            return None;
        };

        let hit = ChunkMatch {
            offset: self.pos + found,
        };
        self.pos = hit.end();
        Some(hit)
    }
}

impl FusedIterator for ChunkMatches<'_> {}
