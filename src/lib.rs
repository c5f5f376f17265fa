//! # FBX
//!
//! Typed object graph of the FBX 3D interchange format.
//!
//! The byte-level tokenizer that turns a file into a generic element tree is
//! an external collaborator. This crate builds typed scene objects on top of
//! that tree, links them through their wire identifiers and renders them
//! back.
//!
//! ## Modules
//!
//! - [`util`] - Errors and math helpers
//! - [`tree`] - Generic element/attribute tree
//! - [`core`] - Identity, properties, connections and the object trait
//! - [`objects`] - Models, geometry, materials, deformers and poses
//! - [`scene`] - Object arena, hierarchy, loading and writing
//!
//! ## Example
//!
//! ```ignore
//! use fbx::prelude::*;
//!
//! let (scene, _ids) = Scene::load(&objects, &connections, &LoadOptions::default())?;
//! for handle in scene.handles_of::<Model>() {
//!     let world = scene.global_transform(handle)?;
//!     println!("{} {:?}", scene.object(handle).unwrap().name(), world);
//! }
//! ```

pub mod util;
pub mod tree;
pub mod core;
pub mod objects;
pub mod scene;

// Re-export commonly used types
pub use util::{Error, Result};
pub use scene::Scene;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::util::{DMat4, DVec2, DVec3, DVec4, Error, Result, RotationOrder};
    pub use crate::tree::{Attribute, Element};
    pub use crate::core::{
        ClassType, IdMap, LoadOptions, ObjectHandle, ObjectId, ObjectType, SceneObject, WriteOptions,
    };
    pub use crate::objects::*;
    pub use crate::scene::Scene;
}
