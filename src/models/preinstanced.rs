//! Best-effort decoding of a whole `.preinstanced` buffer.
//!
//! Chunks are located by signature and planned in scan order: header,
//! submesh table, and a charge against the [`DecodeBudget`]. Each planned
//! chunk is then decoded independently: vertices, strips, mesh. A failure
//! drops only the chunk or submesh it occurred in and is recorded in the
//! [`DecodeReport`]. Planned chunks read the buffer and nothing else, so they
//! can be decoded on any thread; results are always merged in scan order.

use bon::Builder;
use rootcause::Report;
use tracing::{debug, warn};

use crate::error::{DecodeError, DecodeReport, DecodeResult, Skipped};
use crate::models::budget::DecodeBudget;
use crate::models::chunk::{ChunkDescriptor, parse_chunk_header};
use crate::models::mesh::{ChunkMeshes, Mesh, Model, assemble_mesh};
use crate::models::signature::{ChunkLocator, ChunkMatch};
use crate::models::strip::{TrailingStrip, decode_strips};
use crate::models::submesh::{SubmeshDescriptor, walk_submeshes};
use crate::models::vertex::{UvLayout, extract_vertices};

/// Caller-supplied decode settings. The defaults read one UV channel, drop
/// unterminated strip tails and leave NaN UVs untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Builder)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DecodeOptions {
    #[builder(default)]
    pub uv_layout: UvLayout,
    #[builder(default)]
    pub trailing_strip: TrailingStrip,
    /// Replace NaN UV components with `0.0`.
    #[builder(default)]
    pub sanitize_uvs: bool,
    /// Decode at most this many located chunks.
    pub max_chunks: Option<usize>,
}

/// Decoded geometry plus the summary of everything that was skipped.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Decoded {
    pub model: Model,
    pub report: DecodeReport,
}

/// Per-submesh counters, only committed to the report once the submesh succeeds.
struct SubmeshStats {
    degenerate: bool,
    discarded_tail: bool,
    dangling: usize,
}

fn decode_submesh(
    file_data: &[u8],
    chunk_index: usize,
    submesh_index: usize,
    sub: &SubmeshDescriptor,
    options: &DecodeOptions,
) -> DecodeResult<(Mesh, SubmeshStats)> {
    let vertices = extract_vertices(file_data, sub, options.uv_layout, options.sanitize_uvs)?;
    let strips = decode_strips(file_data, sub, options.trailing_strip)?;
    if strips.discarded_tail {
        warn!(
            chunk = chunk_index,
            submesh = submesh_index,
            "dropping unterminated trailing strip"
        );
    }

    let (mesh, dangling) = assemble_mesh(chunk_index, submesh_index, vertices, strips.triangles);
    Ok((
        mesh,
        SubmeshStats {
            degenerate: sub.has_degenerate_stride(),
            discarded_tail: strips.discarded_tail,
            dangling,
        },
    ))
}

/// A chunk whose header parsed and whose submeshes were resolved and charged
/// against the decode budget, ready for vertex and strip decoding.
struct ChunkPlan {
    chunk_index: usize,
    desc: ChunkDescriptor,
    submeshes: Vec<(usize, DecodeResult<SubmeshDescriptor>)>,
}

fn plan_chunk(
    file_data: &[u8],
    chunk_index: usize,
    hit: ChunkMatch,
    budget: &mut DecodeBudget,
) -> DecodeResult<ChunkPlan> {
    debug!(chunk = chunk_index, offset = hit.offset, "decoding chunk");
    let desc = parse_chunk_header(file_data, hit)?;
    budget.charge(desc.control_block_len(), hit.header_start(), "chunk tables")?;

    let submeshes = walk_submeshes(file_data, &desc)
        .map(|(submesh_index, resolved)| {
            let charged = resolved.and_then(|sub| {
                budget.charge(sub.buffer_len(), sub.vertex_buffer_offset, "submesh buffers")?;
                Ok(sub)
            });
            (submesh_index, charged)
        })
        .collect();

    Ok(ChunkPlan {
        chunk_index,
        desc,
        submeshes,
    })
}

fn decode_plan(
    file_data: &[u8],
    plan: ChunkPlan,
    options: &DecodeOptions,
) -> (ChunkMeshes, DecodeReport) {
    let ChunkPlan {
        chunk_index,
        desc,
        submeshes,
    } = plan;
    let mut report = DecodeReport {
        chunks_located: 1,
        chunks_decoded: 1,
        ..DecodeReport::default()
    };
    let mut meshes = Vec::with_capacity(submeshes.len());

    for (submesh_index, resolved) in submeshes {
        let decoded = resolved.and_then(|sub| {
            decode_submesh(file_data, chunk_index, submesh_index, &sub, options)
        });
        match decoded {
            Ok((mesh, stats)) => {
                debug!(
                    chunk = chunk_index,
                    submesh = submesh_index,
                    vertices = mesh.vertices.len(),
                    triangles = mesh.triangles.len(),
                    "decoded mesh"
                );
                report.degenerate_strides += usize::from(stats.degenerate);
                report.discarded_strip_tails += usize::from(stats.discarded_tail);
                report.dangling_triangles += stats.dangling;
                meshes.push(mesh);
            }
            Err(error) => {
                warn!(chunk = chunk_index, submesh = submesh_index, %error, "skipping submesh");
                report.skipped.push(Skipped {
                    chunk_index,
                    submesh_index: Some(submesh_index),
                    chunk_offset: desc.chunk_start_offset,
                    error,
                });
            }
        }
    }

    report.meshes_decoded = meshes.len();
    let group = ChunkMeshes {
        chunk_index,
        offset: desc.chunk_start_offset,
        mesh_data_size: desc.mesh_data_size,
        meshes,
    };
    (group, report)
}

/// Decode a single located chunk.
///
/// Submesh failures are reported in the returned [`DecodeReport`]; only a
/// header failure fails the call. The chunk is budgeted against the whole
/// buffer on its own.
pub fn decode_chunk(
    file_data: &[u8],
    chunk_index: usize,
    hit: ChunkMatch,
    options: &DecodeOptions,
) -> Result<(ChunkMeshes, DecodeReport), Report<DecodeError>> {
    let mut budget = DecodeBudget::new(file_data);
    let plan = plan_chunk(file_data, chunk_index, hit, &mut budget).map_err(Report::new)?;
    Ok(decode_plan(file_data, plan, options))
}

/// Plan every located chunk in scan order against one shared budget.
fn plan_chunks(file_data: &[u8], options: &DecodeOptions) -> Vec<Result<ChunkPlan, Skipped>> {
    let mut budget = DecodeBudget::new(file_data);
    ChunkLocator::new(file_data)
        .matches()
        .take(options.max_chunks.unwrap_or(usize::MAX))
        .enumerate()
        .map(|(chunk_index, hit)| {
            plan_chunk(file_data, chunk_index, hit, &mut budget).map_err(|error| {
                warn!(chunk = chunk_index, offset = hit.offset, %error, "skipping chunk");
                Skipped {
                    chunk_index,
                    submesh_index: None,
                    chunk_offset: hit.offset,
                    error,
                }
            })
        })
        .collect()
}

fn chunk_outcome(
    file_data: &[u8],
    planned: Result<ChunkPlan, Skipped>,
    options: &DecodeOptions,
) -> (Option<ChunkMeshes>, DecodeReport) {
    match planned {
        Ok(plan) => {
            let (group, report) = decode_plan(file_data, plan, options);
            (Some(group), report)
        }
        Err(skipped) => {
            let report = DecodeReport {
                chunks_located: 1,
                skipped: vec![skipped],
                ..DecodeReport::default()
            };
            (None, report)
        }
    }
}

fn merge_outcomes(
    outcomes: impl IntoIterator<Item = (Option<ChunkMeshes>, DecodeReport)>,
) -> Decoded {
    let mut decoded = Decoded::default();
    for (group, report) in outcomes {
        decoded.report.absorb(report);
        decoded.model.chunks.extend(group);
    }
    debug!(
        located = decoded.report.chunks_located,
        decoded = decoded.report.chunks_decoded,
        meshes = decoded.report.meshes_decoded,
        skipped = decoded.report.skipped.len(),
        "decode finished"
    );
    decoded
}

/// Decode every chunk in `file_data`. Never fails; see [`Decoded::report`].
pub fn parse_preinstanced(file_data: &[u8], options: &DecodeOptions) -> Decoded {
    merge_outcomes(
        plan_chunks(file_data, options)
            .into_iter()
            .map(|planned| chunk_outcome(file_data, planned, options)),
    )
}

/// [`parse_preinstanced`] with vertex and strip decoding on the rayon pool.
/// Chunks are planned in scan order first, so output is identical to the
/// sequential version.
#[cfg(feature = "rayon")]
pub fn parse_preinstanced_parallel(file_data: &[u8], options: &DecodeOptions) -> Decoded {
    use rayon::prelude::*;

    let outcomes: Vec<_> = plan_chunks(file_data, options)
        .into_par_iter()
        .map(|planned| chunk_outcome(file_data, planned, options))
        .collect();
    merge_outcomes(outcomes)
}
