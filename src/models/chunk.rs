//! Chunk control block parser.
//!
//! ```text
//! header_start (signature end + 4):
//!   u32 LE  face_data_offset   relative to mesh_chunk_start
//!   u32 LE  mesh_data_size
//! mesh_chunk_start:
//!   0x14    reserved
//!   u32 BE  data_table_count
//!   u32 BE  submesh_count
//!   data_table_count × 8 bytes     (not used for geometry)
//!   submesh_count × 0xC bytes      submesh table
//! ```

use tracing::trace;
use winnow::Parser;
use winnow::binary::{be_u32, le_u32};
use winnow::token::take;

use crate::data::parser_utils::WResult;
use crate::error::{DecodeError, DecodeResult};
use crate::models::signature::ChunkMatch;

const RESERVED_LEN: usize = 0x14;
/// Size of the fixed header from `header_start` to the first data table entry.
const HEADER_LEN: usize = 8 + RESERVED_LEN + 8;
const DATA_TABLE_ENTRY_SIZE: usize = 8;
/// Size of one submesh table entry.
pub const SUBMESH_ENTRY_SIZE: usize = 0xC;

/// Parsed control block of one chunk. All relative offsets inside the chunk
/// resolve against `mesh_chunk_start`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkDescriptor {
    /// File offset of the signature match.
    pub chunk_start_offset: usize,
    /// Start of the vertex/index payload, relative to `mesh_chunk_start`.
    pub face_data_offset: u32,
    pub mesh_data_size: u32,
    pub mesh_chunk_start: usize,
    pub data_table_count: u32,
    pub submesh_count: u32,
    /// Absolute offset of the submesh table (after the skipped data table).
    pub submesh_table_start: usize,
}

impl ChunkDescriptor {
    /// Bytes from the header start to the end of the submesh table.
    pub fn control_block_len(&self) -> usize {
        let header_start = self.mesh_chunk_start - 8;
        self.submesh_table_start + self.submesh_count as usize * SUBMESH_ENTRY_SIZE - header_start
    }
}

struct HeaderFields {
    face_data_offset: u32,
    mesh_data_size: u32,
    data_table_count: u32,
    submesh_count: u32,
}

fn parse_header(input: &mut &[u8]) -> WResult<HeaderFields> {
    let face_data_offset = le_u32.parse_next(input)?;
    let mesh_data_size = le_u32.parse_next(input)?;
    let _reserved: &[u8] = take(RESERVED_LEN).parse_next(input)?;
    let data_table_count = be_u32.parse_next(input)?;
    let submesh_count = be_u32.parse_next(input)?;
    Ok(HeaderFields {
        face_data_offset,
        mesh_data_size,
        data_table_count,
        submesh_count,
    })
}

/// Parse the control block for a located chunk.
///
/// Fails with [`DecodeError::MalformedChunk`] if the header runs off the end
/// of the buffer or its declared tables do not fit inside it.
pub fn parse_chunk_header(file_data: &[u8], hit: ChunkMatch) -> DecodeResult<ChunkDescriptor> {
    let header_start = hit.header_start();
    let available = file_data.len();

    let header_bytes = file_data
        .get(header_start..)
        .filter(|rest| rest.len() >= HEADER_LEN)
        .ok_or_else(|| {
            DecodeError::malformed(
                header_start,
                format!("header needs 0x{HEADER_LEN:X} bytes, buffer is 0x{available:X}"),
            )
        })?;

    let input = &mut &header_bytes[..];
    let hdr = parse_header(input)
        .map_err(|e| DecodeError::malformed(header_start, format!("header: {e}")))?;

    let mesh_chunk_start = header_start + 8;
    let data_table_start = header_start + HEADER_LEN;

    let submesh_table_start = (hdr.data_table_count as usize)
        .checked_mul(DATA_TABLE_ENTRY_SIZE)
        .and_then(|len| data_table_start.checked_add(len))
        .filter(|&end| end <= available)
        .ok_or_else(|| {
            DecodeError::malformed(
                header_start,
                format!(
                    "data table of {} entries at 0x{data_table_start:X} overruns buffer",
                    hdr.data_table_count
                ),
            )
        })?;

    (hdr.submesh_count as usize)
        .checked_mul(SUBMESH_ENTRY_SIZE)
        .and_then(|len| submesh_table_start.checked_add(len))
        .filter(|&end| end <= available)
        .ok_or_else(|| {
            DecodeError::malformed(
                header_start,
                format!(
                    "submesh table of {} entries at 0x{submesh_table_start:X} overruns buffer",
                    hdr.submesh_count
                ),
            )
        })?;

    trace!(
        chunk = hit.offset,
        mesh_chunk_start,
        face_data_offset = hdr.face_data_offset,
        submeshes = hdr.submesh_count,
        "parsed chunk header"
    );

    Ok(ChunkDescriptor {
        chunk_start_offset: hit.offset,
        face_data_offset: hdr.face_data_offset,
        mesh_data_size: hdr.mesh_data_size,
        mesh_chunk_start,
        data_table_count: hdr.data_table_count,
        submesh_count: hdr.submesh_count,
        submesh_table_start,
    })
}
