//! Concrete scene object kinds.
//!
//! Each kind parses itself from one element of the `Objects` section, renders
//! itself back and lists the connections it owns. Links to other objects are
//! held as [`ObjectHandle`](crate::core::ObjectHandle)s into the owning scene.

mod deformer;
pub mod geometry;
mod material;
mod model;
mod node_attribute;
mod pose;
mod texture;

pub use deformer::{BlendShape, Cluster, Skin};
pub use geometry::{Channel, ChannelBuffer, ChannelType, ComponentType, Geometry, GeometryBuilder, PolyType, SubMesh};
pub use material::{ColorType, FactorType, Material, MaterialBuilder, MaterialChannel, TextureSlot};
pub use model::{CullingType, InheritType, Model, ShadingType};
pub use node_attribute::NodeAttribute;
pub use pose::{BindPose, Binding};
pub use texture::Texture;
