//! Generic node/attribute tree.
//!
//! Scene objects are serialized as fragments of this tree. The tree has no
//! pointers: objects refer to one another only through 64-bit identifiers
//! that the scene resolves after parsing.

mod attribute;
mod element;

pub use attribute::*;
pub use element::*;
