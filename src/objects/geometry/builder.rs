//! Fluent geometry authoring.

use super::channel::{Channel, ChannelBuffer, ChannelType, SubMesh};
use super::Geometry;
use crate::core::{ObjectBase, ObjectHandle, Property};
use crate::objects::{BlendShape, Skin};
use crate::scene::Scene;
use crate::util::{DVec2, DVec3, DVec4, Error, Result};

/// Polygon arity shortcuts for [`GeometryBuilder::with_indices`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PolyType {
    Triangle,
    Quad,
}

impl PolyType {
    pub const fn arity(self) -> usize {
        match self {
            Self::Triangle => 3,
            Self::Quad => 4,
        }
    }
}

/// Accumulates geometry data and inserts the finished object into a scene.
///
/// ```ignore
/// let geometry = GeometryBuilder::new(&mut scene, "Quad")
///     .with_vertices(&corners)
///     .with_polygon(&[0, 1, 2, 3])?
///     .with_normals(&normals, 0, "")
///     .build();
/// ```
pub struct GeometryBuilder<'s> {
    scene: &'s mut Scene,
    name: String,
    properties: Vec<Property>,
    vertices: Vec<DVec3>,
    polygons: Vec<Vec<i32>>,
    channels: Vec<Channel>,
    submeshes: Vec<SubMesh>,
    skins: Vec<ObjectHandle>,
    blend_shapes: Vec<ObjectHandle>,
}

impl<'s> GeometryBuilder<'s> {
    pub fn new(scene: &'s mut Scene, name: impl Into<String>) -> Self {
        Self {
            scene,
            name: name.into(),
            properties: Vec::new(),
            vertices: Vec::new(),
            polygons: Vec::new(),
            channels: Vec::new(),
            submeshes: Vec::new(),
            skins: Vec::new(),
            blend_shapes: Vec::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_property(mut self, property: Property) -> Self {
        self.properties.push(property);
        self
    }

    pub fn with_vertex(mut self, vertex: DVec3) -> Self {
        self.vertices.push(vertex);
        self
    }

    pub fn with_vertices(mut self, vertices: &[DVec3]) -> Self {
        self.vertices.extend_from_slice(vertices);
        self
    }

    /// Append one polygon of at least three vertices.
    pub fn with_polygon(mut self, indices: &[i32]) -> Result<Self> {
        if indices.len() < 3 {
            return Err(Error::PolygonTooSmall { count: indices.len() });
        }
        self.polygons.push(indices.to_vec());
        Ok(self)
    }

    /// Append fixed-arity polygons from a flat index buffer.
    pub fn with_indices(mut self, indices: &[i32], arity: usize) -> Result<Self> {
        if arity < 3 {
            return Err(Error::InvalidArity(arity));
        }
        if indices.len() % arity != 0 {
            return Err(Error::IndexBufferNotDivisible { len: indices.len(), arity });
        }
        self.polygons.extend(indices.chunks_exact(arity).map(<[i32]>::to_vec));
        Ok(self)
    }

    pub fn with_poly_type(self, indices: &[i32], poly_type: PolyType) -> Result<Self> {
        self.with_indices(indices, poly_type.arity())
    }

    pub fn with_submesh(mut self, polygon_start: usize, polygon_count: usize, material_index: i32) -> Self {
        self.submeshes.push(SubMesh::new(polygon_start, polygon_count, material_index));
        self
    }

    pub fn with_skin(mut self, skin: ObjectHandle) -> Result<Self> {
        self.check_deformer::<Skin>(skin, "Skin")?;
        self.skins.push(skin);
        Ok(self)
    }

    pub fn with_blend_shape(mut self, blend_shape: ObjectHandle) -> Result<Self> {
        self.check_deformer::<BlendShape>(blend_shape, "BlendShape")?;
        self.blend_shapes.push(blend_shape);
        Ok(self)
    }

    fn check_deformer<T: crate::core::SceneObject>(&self, handle: ObjectHandle, expected: &'static str) -> Result<()> {
        if handle.scene() != self.scene.id() {
            return Err(Error::CrossScene(handle));
        }
        let object = self.scene.object(handle).ok_or(Error::ObjectNotFound(handle))?;
        if object.downcast_ref::<T>().is_none() {
            return Err(Error::WrongKind {
                expected,
                actual: object.kind_name(),
            });
        }
        Ok(())
    }

    pub fn with_normals(self, normals: &[DVec3], layer: i32, name: &str) -> Self {
        self.with_channel(ChannelType::Normal, layer, name, normals.len(), || {
            ChannelBuffer::Double3(normals.to_vec())
        })
    }

    pub fn with_tangents(self, tangents: &[DVec4], layer: i32, name: &str) -> Self {
        self.with_channel(ChannelType::Tangent, layer, name, tangents.len(), || {
            ChannelBuffer::Double4(tangents.to_vec())
        })
    }

    pub fn with_binormals(self, binormals: &[DVec4], layer: i32, name: &str) -> Self {
        self.with_channel(ChannelType::Binormal, layer, name, binormals.len(), || {
            ChannelBuffer::Double4(binormals.to_vec())
        })
    }

    pub fn with_colors(self, colors: &[DVec4], layer: i32, name: &str) -> Self {
        self.with_channel(ChannelType::Color, layer, name, colors.len(), || {
            ChannelBuffer::Double4(colors.to_vec())
        })
    }

    pub fn with_uvs(self, uvs: &[DVec2], layer: i32, name: &str) -> Self {
        self.with_channel(ChannelType::TexCoord, layer, name, uvs.len(), || {
            ChannelBuffer::Double2(uvs.to_vec())
        })
    }

    /// Empty input and a repeated (type, layer) pair are ignored.
    fn with_channel(
        mut self,
        channel_type: ChannelType,
        layer: i32,
        name: &str,
        len: usize,
        buffer: impl FnOnce() -> ChannelBuffer,
    ) -> Self {
        if len == 0 {
            return self;
        }
        if self
            .channels
            .iter()
            .any(|c| c.channel_type == channel_type && c.layer == layer)
        {
            tracing::debug!(?channel_type, layer, "duplicate channel ignored");
            return self;
        }
        self.channels.push(Channel::new(layer, name, channel_type, buffer()));
        self
    }

    /// Fit channels to the polygon-vertex count, sort them by (type, layer)
    /// and insert the geometry into the scene.
    pub fn build(self) -> ObjectHandle {
        let mut base = ObjectBase::new(self.name);
        for property in self.properties {
            base.add_property(property);
        }

        let mut geometry = Geometry::from_parts(base, self.vertices, self.polygons, self.channels, self.submeshes);
        geometry.finalize_channels();
        geometry.skins = self.skins;
        geometry.blend_shapes = self.blend_shapes;
        self.scene.insert(geometry)
    }
}
