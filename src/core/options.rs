//! Load and write configuration.

/// Options for the two-phase scene load.
#[derive(Clone, Debug)]
pub struct LoadOptions {
    /// Parse object elements in parallel during phase 1.
    ///
    /// Each object only reads its own subtree, so this is always safe.
    /// Reference resolution (phase 2) runs sequentially regardless.
    pub parallel: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self { parallel: true }
    }
}

impl LoadOptions {
    /// Sequential phase-1 parsing.
    pub fn sequential() -> Self {
        Self { parallel: false }
    }
}

/// Options for rendering objects back into tree elements.
#[derive(Clone, Debug)]
pub struct WriteOptions {
    /// Use the binary name encoding (`"Name\0\x01Class"`) instead of the text
    /// one (`"Class::Name"`) in object headers.
    pub binary: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self { binary: true }
    }
}

impl WriteOptions {
    /// Text encoding of object headers.
    pub fn text() -> Self {
        Self { binary: false }
    }
}
