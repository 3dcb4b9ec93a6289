/// Whole-decode output size cap
pub mod budget;
/// Per-chunk control block parser
pub mod chunk;
/// Output mesh types and assembly
pub mod mesh;
/// Whole-buffer decode entry points
pub mod preinstanced;
/// Chunk signature scanner
pub mod signature;
/// Triangle strip decoding
pub mod strip;
/// Submesh offset table walker
pub mod submesh;
/// Vertex record extraction
pub mod vertex;

#[cfg(test)]
pub(crate) mod test_fixture;
