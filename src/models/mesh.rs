//! Output mesh types and mesh assembly.

use tracing::warn;

use crate::error::DecodeError;
use crate::models::strip::Triangle;
use crate::models::vertex::Vertex;

/// Geometry of one submesh.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Mesh {
    pub chunk_index: usize,
    pub submesh_index: usize,
    pub vertices: Vec<Vertex>,
    /// Only triangles whose indices are all below `vertices.len()`.
    pub triangles: Vec<Triangle>,
}

impl Mesh {
    /// Object name used by the asset pipeline, e.g. `Mesh_0_2`.
    pub fn name(&self) -> String {
        format!("Mesh_{}_{}", self.chunk_index, self.submesh_index)
    }
}

/// All meshes decoded from one located chunk, in submesh order.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ChunkMeshes {
    /// Index of the chunk in signature-scan order.
    pub chunk_index: usize,
    /// File offset of the chunk's signature match.
    pub offset: usize,
    pub mesh_data_size: u32,
    pub meshes: Vec<Mesh>,
}

/// Top-level decode output: one group per chunk whose header parsed.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Model {
    pub chunks: Vec<ChunkMeshes>,
}

impl Model {
    /// Every mesh in chunk-then-submesh order.
    pub fn meshes(&self) -> impl Iterator<Item = &Mesh> {
        self.chunks.iter().flat_map(|chunk| chunk.meshes.iter())
    }

    pub fn mesh_count(&self) -> usize {
        self.chunks.iter().map(|chunk| chunk.meshes.len()).sum()
    }

    pub fn into_meshes(self) -> impl Iterator<Item = Mesh> {
        self.chunks.into_iter().flat_map(|chunk| chunk.meshes)
    }
}

/// Build a mesh, dropping triangles that reference missing vertices.
///
/// Returns the mesh and the number of dropped triangles.
pub fn assemble_mesh(
    chunk_index: usize,
    submesh_index: usize,
    vertices: Vec<Vertex>,
    triangles: Vec<Triangle>,
) -> (Mesh, usize) {
    let vertex_count = vertices.len();
    let total = triangles.len();
    let mut first_dangling = None;

    let triangles: Vec<Triangle> = triangles
        .into_iter()
        .filter(|tri| {
            let fits = tri.fits(vertex_count);
            if !fits && first_dangling.is_none() {
                first_dangling = Some(*tri);
            }
            fits
        })
        .collect();

    let dropped = total - triangles.len();
    if let Some(tri) = first_dangling {
        warn!(
            chunk = chunk_index,
            submesh = submesh_index,
            dropped,
            "{}",
            DecodeError::DanglingIndex {
                triangle: tri.indices(),
                vertex_count
            }
        );
    }

    (
        Mesh {
            chunk_index,
            submesh_index,
            vertices,
            triangles,
        },
        dropped,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn verts(n: usize) -> Vec<Vertex> {
        vec![Vertex::default(); n]
    }

    #[test]
    fn drops_only_dangling_triangles() {
        let tris = vec![
            Triangle([1, 2, 0]),
            Triangle([3, 2, 1]),
            Triangle([2, 1, 0]),
        ];
        let (mesh, dropped) = assemble_mesh(4, 1, verts(3), tris);
        assert_eq!(dropped, 1);
        assert_eq!(mesh.vertices.len(), 3);
        assert_eq!(mesh.triangles, vec![Triangle([1, 2, 0]), Triangle([2, 1, 0])]);
        assert_eq!(mesh.name(), "Mesh_4_1");
    }

    #[test]
    fn zero_vertices_drop_everything() {
        let (mesh, dropped) = assemble_mesh(0, 0, Vec::new(), vec![Triangle([1, 2, 0])]);
        assert_eq!(dropped, 1);
        assert!(mesh.triangles.is_empty());
    }

    #[test]
    fn model_flattens_in_order() {
        let mesh = |c, s| Mesh {
            chunk_index: c,
            submesh_index: s,
            ..Mesh::default()
        };
        let model = Model {
            chunks: vec![
                ChunkMeshes {
                    chunk_index: 0,
                    meshes: vec![mesh(0, 0), mesh(0, 1)],
                    ..ChunkMeshes::default()
                },
                ChunkMeshes {
                    chunk_index: 1,
                    ..ChunkMeshes::default()
                },
                ChunkMeshes {
                    chunk_index: 2,
                    meshes: vec![mesh(2, 0)],
                    ..ChunkMeshes::default()
                },
            ],
        };
        assert_eq!(model.mesh_count(), 3);
        let names: Vec<_> = model.meshes().map(Mesh::name).collect();
        assert_eq!(names, ["Mesh_0_0", "Mesh_0_1", "Mesh_2_0"]);

        let owned: Vec<_> = model
            .into_meshes()
            .map(|m| (m.chunk_index, m.submesh_index))
            .collect();
        assert_eq!(owned, [(0, 0), (0, 1), (2, 0)]);
    }

    #[cfg(feature = "json")]
    #[test]
    fn serializes_to_json() {
        use serde_json::json;

        let model = Model {
            chunks: vec![ChunkMeshes {
                chunk_index: 0,
                offset: 16,
                mesh_data_size: 0x40,
                meshes: vec![Mesh {
                    vertices: vec![Vertex {
                        position: [1.0, 2.0, 3.0],
                        uv: [0.5, f32::NAN],
                        uv2: None,
                    }],
                    triangles: vec![Triangle([0, 0, 0])],
                    ..Mesh::default()
                }],
            }],
        };

        let value = serde_json::to_value(&model).unwrap();
        let chunk = &value["chunks"][0];
        assert_eq!(chunk["offset"], 16);
        assert_eq!(chunk["mesh_data_size"], 0x40);
        let mesh = &chunk["meshes"][0];
        assert_eq!(mesh["vertices"][0]["position"], json!([1.0, 2.0, 3.0]));
        // JSON has no NaN
        assert_eq!(mesh["vertices"][0]["uv"], json!([0.5, null]));
        assert_eq!(mesh["vertices"][0]["uv2"], json!(null));
        assert_eq!(mesh["triangles"], json!([[0, 0, 0]]));
    }
}
