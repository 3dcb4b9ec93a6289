/// Byte-level readers over the raw file buffer
pub mod data;
/// Error definitions and decode summaries
pub mod error;
/// Text export of decoded geometry
pub mod export;
/// Mesh chunk decoding (signature scan, tables, vertices, strips)
pub mod models;

pub use error::{DecodeError, DecodeReport, Skipped};
pub use models::mesh::{ChunkMeshes, Mesh, Model};
pub use models::preinstanced::{DecodeOptions, Decoded, decode_chunk, parse_preinstanced};
#[cfg(feature = "rayon")]
pub use models::preinstanced::parse_preinstanced_parallel;
pub use models::strip::{TrailingStrip, Triangle};
pub use models::vertex::{UvLayout, Vertex};
