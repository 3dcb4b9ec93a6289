/// Endian-aware cursor over the raw file bytes
pub mod cursor;
/// Offset and slice helpers shared by the decoders
pub mod parser_utils;

pub use cursor::{ByteCursor, Endian};
