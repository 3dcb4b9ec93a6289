//! Submesh table walker.
//!
//! Each submesh's buffer parameters are reached through a chain of relative
//! offsets. Every hop is its own function so a bad hop is easy to pin down:
//!
//! ```text
//! submesh_table_start + i*0xC + 8  -> u32 BE header_rel
//! mesh_chunk_start + header_rel + 0xC -> u32 BE vertex_info_rel
//! mesh_chunk_start + vertex_info_rel:
//!   u32 BE  vertex_total_size
//!   u32 BE  vertex_stride
//!   8       skipped
//!   u32 BE  vertex_start       relative to mesh_chunk_start + face_data_offset
//!   0x14    skipped
//!   u32 BE  face_index_count   twice the real count
//!   4       skipped
//!   u32 BE  face_start         relative to mesh_chunk_start + face_data_offset
//! ```

use tracing::{trace, warn};

use crate::data::parser_utils::resolve_offset;
use crate::data::{ByteCursor, Endian};
use crate::error::{DecodeError, DecodeResult};
use crate::models::chunk::{ChunkDescriptor, SUBMESH_ENTRY_SIZE};

const ENTRY_OFFSET_FIELD: usize = 8;
const HEADER_VERTEX_INFO_FIELD: u32 = 0xC;

/// Buffer parameters for one submesh, all offsets absolute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmeshDescriptor {
    pub vertex_count: usize,
    /// Zero when the stream declares a degenerate stride; `vertex_count` is then zero too.
    pub vertex_stride: usize,
    pub vertex_buffer_offset: usize,
    /// Number of u16 indices in the strip stream (already halved).
    pub face_index_count: usize,
    pub face_buffer_offset: usize,
}

impl SubmeshDescriptor {
    pub fn has_degenerate_stride(&self) -> bool {
        self.vertex_stride == 0
    }

    /// Bytes of vertex records plus index stream this submesh reads.
    pub fn buffer_len(&self) -> usize {
        self.vertex_count
            .saturating_mul(self.vertex_stride)
            .saturating_add(self.face_index_count.saturating_mul(2))
    }
}

/// Step 1: read the submesh header offset out of table entry `index`.
fn submesh_header_rel(
    cursor: &mut ByteCursor<'_>,
    chunk: &ChunkDescriptor,
    index: usize,
) -> DecodeResult<u32> {
    cursor.seek(chunk.submesh_table_start + index * SUBMESH_ENTRY_SIZE + ENTRY_OFFSET_FIELD)?;
    cursor.read_u32(Endian::Big)
}

/// Steps 2-3: follow the submesh header to the absolute vertex info block.
fn vertex_info_offset(
    cursor: &mut ByteCursor<'_>,
    file_data: &[u8],
    chunk: &ChunkDescriptor,
    header_rel: u32,
) -> DecodeResult<usize> {
    let header = resolve_offset(file_data, chunk.mesh_chunk_start, header_rel)?;
    cursor.seek(resolve_offset(file_data, header, HEADER_VERTEX_INFO_FIELD)?)?;
    let info_rel = cursor.read_u32(Endian::Big)?;
    resolve_offset(file_data, chunk.mesh_chunk_start, info_rel)
}

/// Resolve an offset stored relative to the chunk's face data region.
fn payload_offset(file_data: &[u8], chunk: &ChunkDescriptor, rel: u32) -> DecodeResult<usize> {
    let payload = resolve_offset(file_data, chunk.mesh_chunk_start, chunk.face_data_offset)?;
    resolve_offset(file_data, payload, rel)
}

/// Steps 4-7: read the vertex and face buffer parameters from the info block.
fn read_vertex_info(
    cursor: &mut ByteCursor<'_>,
    file_data: &[u8],
    chunk: &ChunkDescriptor,
    info_offset: usize,
) -> DecodeResult<SubmeshDescriptor> {
    cursor.seek(info_offset)?;
    let total_size = cursor.read_u32(Endian::Big)?;
    let stride = cursor.read_u32(Endian::Big)?;
    let vertex_count = if stride == 0 {
        warn!(
            chunk = chunk.chunk_start_offset,
            "{}",
            DecodeError::DegenerateStride {
                offset: info_offset,
                total_size
            }
        );
        0
    } else {
        (total_size / stride) as usize
    };

    cursor.skip(8)?;
    let vertex_start = cursor.read_u32(Endian::Big)?;
    cursor.skip(0x14)?;
    let face_index_count = cursor.read_u32(Endian::Big)? / 2;
    cursor.skip(4)?;
    let face_start = cursor.read_u32(Endian::Big)?;

    Ok(SubmeshDescriptor {
        vertex_count,
        vertex_stride: stride as usize,
        vertex_buffer_offset: payload_offset(file_data, chunk, vertex_start)?,
        face_index_count: face_index_count as usize,
        face_buffer_offset: payload_offset(file_data, chunk, face_start)?,
    })
}

/// Resolve the buffer parameters of submesh `index` within `chunk`.
pub fn resolve_submesh(
    file_data: &[u8],
    chunk: &ChunkDescriptor,
    index: usize,
) -> DecodeResult<SubmeshDescriptor> {
    let mut cursor = ByteCursor::new(file_data);
    let header_rel = submesh_header_rel(&mut cursor, chunk, index)?;
    let info_offset = vertex_info_offset(&mut cursor, file_data, chunk, header_rel)?;
    let desc = read_vertex_info(&mut cursor, file_data, chunk, info_offset)?;
    trace!(chunk = chunk.chunk_start_offset, submesh = index, ?desc, "resolved submesh");
    Ok(desc)
}

/// Walk every submesh of a chunk. A failing entry does not stop the walk.
pub fn walk_submeshes<'a>(
    file_data: &'a [u8],
    chunk: &'a ChunkDescriptor,
) -> impl Iterator<Item = (usize, DecodeResult<SubmeshDescriptor>)> + 'a {
    (0..chunk.submesh_count as usize).map(move |i| (i, resolve_submesh(file_data, chunk, i)))
}
