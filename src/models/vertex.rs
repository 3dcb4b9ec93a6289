//! Vertex extraction.
//!
//! Vertex records are `vertex_stride` bytes. The position is always three
//! big-endian f32 at the start of the record; UV channels are pairs of
//! big-endian f32 located by their distance from the end of the record, which
//! differs between format variants and is chosen by the caller via
//! [`UvLayout`]. V is stored flipped: the decoded value is `1 - raw_v`.

use crate::data::{ByteCursor, Endian};
use crate::error::{DecodeError, DecodeResult};
use crate::models::submesh::SubmeshDescriptor;

const UV_LEN: usize = 8;

/// Where the UV channels sit inside a vertex record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum UvLayout {
    /// One channel in the last 8 bytes of the record.
    #[default]
    Single,
    /// Primary channel at `stride - 16`, secondary channel at `stride - 8`.
    Dual,
    /// Explicit channel offsets counted back from the end of the record.
    Custom {
        primary_from_end: u32,
        secondary_from_end: Option<u32>,
    },
}

impl UvLayout {
    pub fn primary_from_end(&self) -> usize {
        match self {
            UvLayout::Single => 8,
            UvLayout::Dual => 16,
            UvLayout::Custom {
                primary_from_end, ..
            } => *primary_from_end as usize,
        }
    }

    pub fn secondary_from_end(&self) -> Option<usize> {
        match self {
            UvLayout::Single => None,
            UvLayout::Dual => Some(8),
            UvLayout::Custom {
                secondary_from_end, ..
            } => secondary_from_end.map(|off| off as usize),
        }
    }
}

/// A decoded vertex.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Vertex {
    pub position: [f32; 3],
    /// `(u, 1 - raw_v)`.
    pub uv: [f32; 2],
    /// Second channel, present only for layouts that declare one.
    pub uv2: Option<[f32; 2]>,
}

fn check_channel(sub: &SubmeshDescriptor, from_end: usize) -> DecodeResult<()> {
    if from_end < UV_LEN || from_end > sub.vertex_stride {
        return Err(DecodeError::malformed(
            sub.vertex_buffer_offset,
            format!(
                "uv channel {from_end} bytes from record end does not fit stride {}",
                sub.vertex_stride
            ),
        ));
    }
    Ok(())
}

fn read_uv(cursor: &mut ByteCursor<'_>, at: usize, sanitize: bool) -> DecodeResult<[f32; 2]> {
    cursor.seek(at)?;
    let u = cursor.read_f32(Endian::Big)?;
    let raw_v = cursor.read_f32(Endian::Big)?;
    let uv = [u, 1.0 - raw_v];
    if sanitize {
        Ok(uv.map(|c| if c.is_nan() { 0.0 } else { c }))
    } else {
        Ok(uv)
    }
}

/// Read all vertices of a submesh.
///
/// A degenerate (zero) stride yields no vertices. Any record that would run
/// past the buffer fails the whole submesh with [`DecodeError::OutOfBounds`].
pub fn extract_vertices(
    file_data: &[u8],
    sub: &SubmeshDescriptor,
    layout: UvLayout,
    sanitize_uvs: bool,
) -> DecodeResult<Vec<Vertex>> {
    if sub.vertex_count == 0 || sub.has_degenerate_stride() {
        return Ok(Vec::new());
    }

    let stride = sub.vertex_stride;
    let primary = layout.primary_from_end();
    let secondary = layout.secondary_from_end();
    check_channel(sub, primary)?;
    if let Some(secondary) = secondary {
        check_channel(sub, secondary)?;
    }

    let mut cursor = ByteCursor::new(file_data);
    // The count comes straight from the file; don't trust it for allocation.
    let mut vertices = Vec::with_capacity(sub.vertex_count.min(file_data.len() / stride));

    for v in 0..sub.vertex_count {
        let record = v
            .checked_mul(stride)
            .and_then(|rel| sub.vertex_buffer_offset.checked_add(rel))
            .ok_or(DecodeError::OutOfBounds {
                offset: sub.vertex_buffer_offset,
                len: sub.vertex_count.saturating_mul(stride),
                available: file_data.len(),
            })?;

        cursor.seek(record)?;
        let position = [
            cursor.read_f32(Endian::Big)?,
            cursor.read_f32(Endian::Big)?,
            cursor.read_f32(Endian::Big)?,
        ];
        let uv = read_uv(&mut cursor, record + stride - primary, sanitize_uvs)?;
        let uv2 = secondary
            .map(|from_end| read_uv(&mut cursor, record + stride - from_end, sanitize_uvs))
            .transpose()?;

        vertices.push(Vertex { position, uv, uv2 });
    }

    Ok(vertices)
}
