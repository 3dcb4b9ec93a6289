use thiserror::Error;

/// Failures raised while decoding a `.preinstanced` buffer.
///
/// None of these abort a whole decode. They are recorded against the chunk or
/// submesh they occurred in (see [`Skipped`]) or, for the non-fatal kinds,
/// counted in the [`DecodeReport`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum DecodeError {
    #[error("read of {len} bytes at 0x{offset:X} exceeds buffer of 0x{available:X} bytes")]
    OutOfBounds {
        offset: usize,
        len: usize,
        available: usize,
    },
    #[error("malformed chunk at 0x{offset:X}: {reason}")]
    MalformedChunk { offset: usize, reason: String },
    #[error("vertex stride is zero at 0x{offset:X} (total size 0x{total_size:X})")]
    DegenerateStride { offset: usize, total_size: u32 },
    #[error("triangle {triangle:?} references a vertex beyond count {vertex_count}")]
    DanglingIndex {
        triangle: [u16; 3],
        vertex_count: usize,
    },
}

impl DecodeError {
    pub(crate) fn malformed(offset: usize, reason: impl Into<String>) -> Self {
        DecodeError::MalformedChunk {
            offset,
            reason: reason.into(),
        }
    }

}

pub type DecodeResult<T> = Result<T, DecodeError>;

/// A chunk or submesh that was dropped from the output.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Skipped {
    /// Index of the chunk in signature-scan order.
    pub chunk_index: usize,
    /// `None` when the whole chunk was skipped.
    pub submesh_index: Option<usize>,
    /// File offset of the signature match for the chunk.
    pub chunk_offset: usize,
    pub error: DecodeError,
}

/// Observable summary of a best-effort decode.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct DecodeReport {
    /// Signature matches found (after any `max_chunks` budget).
    pub chunks_located: usize,
    /// Chunks whose header parsed and which produced a chunk group.
    pub chunks_decoded: usize,
    /// Meshes emitted across all chunk groups.
    pub meshes_decoded: usize,
    pub skipped: Vec<Skipped>,
    /// Submeshes that declared a zero vertex stride and were emitted empty.
    pub degenerate_strides: usize,
    /// Triangles dropped for referencing a vertex past the end of their mesh.
    pub dangling_triangles: usize,
    /// Unterminated trailing strips dropped by [`TrailingStrip::Discard`].
    ///
    /// [`TrailingStrip::Discard`]: crate::models::strip::TrailingStrip::Discard
    pub discarded_strip_tails: usize,
}

impl DecodeReport {
    /// Skips that dropped an entire chunk.
    pub fn skipped_chunks(&self) -> impl Iterator<Item = &Skipped> {
        self.skipped.iter().filter(|s| s.submesh_index.is_none())
    }

    /// Skips that dropped a single submesh inside an otherwise decoded chunk.
    pub fn skipped_submeshes(&self) -> impl Iterator<Item = &Skipped> {
        self.skipped.iter().filter(|s| s.submesh_index.is_some())
    }

    /// Fold a per-chunk report into this one. Chunks must be absorbed in
    /// scan order to keep `skipped` ordered.
    pub(crate) fn absorb(&mut self, other: DecodeReport) {
        self.chunks_located += other.chunks_located;
        self.chunks_decoded += other.chunks_decoded;
        self.meshes_decoded += other.meshes_decoded;
        self.skipped.extend(other.skipped);
        self.degenerate_strides += other.degenerate_strides;
        self.dangling_triangles += other.dangling_triangles;
        self.discarded_strip_tails += other.discarded_strip_tails;
    }

    /// True when nothing was skipped, dropped or emitted empty.
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty()
            && self.degenerate_strides == 0
            && self.dangling_triangles == 0
            && self.discarded_strip_tails == 0
    }
}
