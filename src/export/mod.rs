/// Golden-file text dump of a decoded model
pub mod text_dump;
