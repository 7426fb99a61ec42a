pub mod block;
pub mod document;
pub mod splice;

pub use crate::block::{Block, Delimiters};
pub use crate::document::{Document, Line};
pub use crate::splice::error::SpliceError;
