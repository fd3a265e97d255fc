/// EDSK container parsing and emission

/// Parses EDSK bytes into a [`crate::image::DskImage`]
pub mod reader;
/// Emits a [`crate::image::DskImage`] to EDSK bytes
pub mod writer;

pub use reader::parse;
pub use writer::emit;
