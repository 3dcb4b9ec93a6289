//! Plain-text model dump for golden-file comparisons.
//!
//! Per mesh, in model order:
//!
//! ```text
//! <vertex count>
//! <triangle count>
//! <x> <y> <z> <u> <v>     one line per vertex
//! <a> <b> <c>             one line per triangle
//! ```
//!
//! Floats use Rust's shortest round-trip formatting, so a dump is stable
//! across runs and platforms.

use std::fmt::{self, Write};

use crate::models::mesh::{Mesh, Model};

pub fn write_mesh<W: Write>(out: &mut W, mesh: &Mesh) -> fmt::Result {
    writeln!(out, "{}", mesh.vertices.len())?;
    writeln!(out, "{}", mesh.triangles.len())?;
    for vertex in &mesh.vertices {
        let [x, y, z] = vertex.position;
        let [u, v] = vertex.uv;
        writeln!(out, "{x} {y} {z} {u} {v}")?;
    }
    for tri in &mesh.triangles {
        let [a, b, c] = tri.indices();
        writeln!(out, "{a} {b} {c}")?;
    }
    Ok(())
}

pub fn write_model<W: Write>(out: &mut W, model: &Model) -> fmt::Result {
    model.meshes().try_for_each(|mesh| write_mesh(out, mesh))
}

/// Render a whole model as a text dump.
pub fn model_to_string(model: &Model) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = write_model(&mut out, model);
    out
}
