//! Triangle strip decoding.
//!
//! Index streams are big-endian u16 values. `0xFFFF` closes the current strip
//! and is not itself a vertex index. Each strip of `n` indices expands into
//! `n - 2` triangles with alternating winding.

use itertools::Itertools;
use winnow::Parser;
use winnow::binary::be_u16;
use winnow::combinator::repeat;
use winnow::error::{ContextError, ErrMode};

use crate::data::parser_utils::slice_at;
use crate::error::{DecodeError, DecodeResult};
use crate::models::submesh::SubmeshDescriptor;

/// Strip terminator.
pub const STRIP_RESTART: u16 = 0xFFFF;

/// Handling of indices after the last terminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TrailingStrip {
    /// Drop them.
    #[default]
    Discard,
    /// Triangulate them as if the stream ended with a terminator.
    Keep,
}

/// Three vertex indices into the owning mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Triangle(pub [u16; 3]);

impl Triangle {
    pub fn indices(&self) -> [u16; 3] {
        self.0
    }

    /// Whether every index is below `vertex_count`.
    pub fn fits(&self, vertex_count: usize) -> bool {
        self.0.iter().all(|&i| (i as usize) < vertex_count)
    }
}

/// Expand one strip into triangles.
///
/// Triangle `k` is `(s[k+1], s[k+2], s[k])` for even `k` and
/// `(s[k+2], s[k+1], s[k])` for odd `k`.
pub fn triangulate_strip(strip: &[u16]) -> impl Iterator<Item = Triangle> + '_ {
    strip
        .iter()
        .copied()
        .tuple_windows::<(u16, u16, u16)>()
        .enumerate()
        .map(|(k, (a, b, c))| {
            if k % 2 == 0 {
                Triangle([b, c, a])
            } else {
                Triangle([c, b, a])
            }
        })
}

/// Triangles from a whole index stream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StripTriangles {
    pub triangles: Vec<Triangle>,
    pub strip_count: usize,
    /// An unterminated tail was present and dropped.
    pub discarded_tail: bool,
}

/// Split an index stream at terminators and triangulate each strip.
pub fn triangulate_stream(indices: &[u16], trailing: TrailingStrip) -> StripTriangles {
    let mut strips: Vec<&[u16]> = indices.split(|&i| i == STRIP_RESTART).collect();

    // `split` always yields a final segment: empty when the stream ends on a
    // terminator, otherwise the open strip.
    let mut discarded_tail = false;
    if let Some(tail) = strips.pop() {
        match trailing {
            _ if tail.is_empty() => {}
            TrailingStrip::Keep => strips.push(tail),
            TrailingStrip::Discard => discarded_tail = true,
        }
    }

    StripTriangles {
        triangles: strips
            .iter()
            .flat_map(|strip| triangulate_strip(strip))
            .collect(),
        strip_count: strips.len(),
        discarded_tail,
    }
}

/// Read the raw index stream of a submesh.
pub fn read_index_stream(file_data: &[u8], sub: &SubmeshDescriptor) -> DecodeResult<Vec<u16>> {
    let len = sub
        .face_index_count
        .checked_mul(2)
        .ok_or(DecodeError::OutOfBounds {
            offset: sub.face_buffer_offset,
            len: usize::MAX,
            available: file_data.len(),
        })?;
    let input = &mut slice_at(file_data, sub.face_buffer_offset, len)?;
    repeat(sub.face_index_count, be_u16)
        .parse_next(input)
        .map_err(|_: ErrMode<ContextError>| DecodeError::OutOfBounds {
            offset: sub.face_buffer_offset,
            len,
            available: file_data.len(),
        })
}

/// Read and triangulate the index stream of a submesh.
pub fn decode_strips(
    file_data: &[u8],
    sub: &SubmeshDescriptor,
    trailing: TrailingStrip,
) -> DecodeResult<StripTriangles> {
    let indices = read_index_stream(file_data, sub)?;
    Ok(triangulate_stream(&indices, trailing))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tris(list: &[[u16; 3]]) -> Vec<Triangle> {
        list.iter().copied().map(Triangle).collect()
    }

    #[test]
    fn strip_lengths_give_n_minus_two() {
        for n in 0..10u16 {
            let strip: Vec<u16> = (0..n).collect();
            assert_eq!(
                triangulate_strip(&strip).count(),
                (n as usize).saturating_sub(2),
                "strip of {n}"
            );
        }
    }

    #[test]
    fn winding_alternates_from_even() {
        let got: Vec<_> = triangulate_strip(&[10, 11, 12, 13, 14]).collect();
        assert_eq!(got, tris(&[[11, 12, 10], [13, 12, 11], [13, 14, 12]]));
    }

    #[test]
    fn terminators_split_strips() {
        let out = triangulate_stream(
            &[0, 1, 2, STRIP_RESTART, 3, 4, 5, 6, STRIP_RESTART],
            TrailingStrip::Discard,
        );
        assert_eq!(out.strip_count, 2);
        assert!(!out.discarded_tail);
        assert_eq!(out.triangles, tris(&[[1, 2, 0], [4, 5, 3], [6, 5, 4]]));
    }

    #[test]
    fn sentinel_only_stream_is_empty() {
        let out = triangulate_stream(&[STRIP_RESTART], TrailingStrip::Discard);
        assert_eq!(out.strip_count, 1);
        assert!(out.triangles.is_empty());
        assert!(!out.discarded_tail);

        let out = triangulate_stream(&[], TrailingStrip::Discard);
        assert_eq!(out, StripTriangles::default());
    }

    #[test]
    fn trailing_strip_policy() {
        let stream = [0, 1, 2, STRIP_RESTART, 3, 4, 5];
        let discard = triangulate_stream(&stream, TrailingStrip::Discard);
        assert!(discard.discarded_tail);
        assert_eq!(discard.triangles, tris(&[[1, 2, 0]]));

        let keep = triangulate_stream(&stream, TrailingStrip::Keep);
        assert!(!keep.discarded_tail);
        assert_eq!(keep.triangles, tris(&[[1, 2, 0], [4, 5, 3]]));
    }

    #[test]
    fn reads_big_endian_stream() {
        let data = [0xAA, 0x00, 0x00, 0x00, 0x01, 0x00, 0x02, 0xFF, 0xFF];
        let sub = SubmeshDescriptor {
            vertex_count: 3,
            vertex_stride: 24,
            vertex_buffer_offset: 0,
            face_index_count: 4,
            face_buffer_offset: 1,
        };
        assert_eq!(read_index_stream(&data, &sub).unwrap(), vec![0, 1, 2, 0xFFFF]);
        let out = decode_strips(&data, &sub, TrailingStrip::Discard).unwrap();
        assert_eq!(out.triangles, tris(&[[1, 2, 0]]));

        let short = SubmeshDescriptor {
            face_index_count: 5,
            ..sub
        };
        assert!(matches!(
            read_index_stream(&data, &short),
            Err(DecodeError::OutOfBounds { .. })
        ));
    }
}
