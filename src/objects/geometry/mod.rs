//! Polygon mesh geometry: control points, polygons, layered channels,
//! submeshes and attached deformers.
//!
//! Polygons are kept as separate index lists in memory and flattened into the
//! terminal-encoded `PolygonVertexIndex` buffer on write. Edges are never
//! stored; they are derived from the polygons every time the geometry is
//! rendered.

mod builder;
mod channel;
mod layers;
mod topology;

pub use builder::{GeometryBuilder, PolyType};
pub use channel::{Channel, ChannelBuffer, ChannelType, ComponentType, SubMesh};
pub use layers::{MappingType, ReferenceType};
pub use topology::{decode_polygons, derive_edges, encode_polygons, index_count};

use crate::core::{
    impl_object_base, ClassType, Connection, ObjectBase, ObjectHandle, ObjectType, SceneObject,
    WriteOptions,
};
use crate::tree::{Attribute, Element};
use crate::util::{DVec3, Error, Result};

const GEOMETRY_VERSION: i32 = 124;

/// Mesh geometry attached to a `Mesh` model.
#[derive(Clone, Debug)]
pub struct Geometry {
    base: ObjectBase,
    vertices: Vec<DVec3>,
    polygons: Vec<Vec<i32>>,
    channels: Vec<Channel>,
    submeshes: Vec<SubMesh>,
    skins: Vec<ObjectHandle>,
    blend_shapes: Vec<ObjectHandle>,
}

impl Geometry {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_base(ObjectBase::new(name))
    }

    fn with_base(base: ObjectBase) -> Self {
        Self {
            base,
            vertices: Vec::new(),
            polygons: Vec::new(),
            channels: Vec::new(),
            submeshes: Vec::new(),
            skins: Vec::new(),
            blend_shapes: Vec::new(),
        }
    }

    /// Geometry assembled by the builder.
    pub(crate) fn from_parts(
        base: ObjectBase,
        vertices: Vec<DVec3>,
        polygons: Vec<Vec<i32>>,
        channels: Vec<Channel>,
        submeshes: Vec<SubMesh>,
    ) -> Self {
        Self {
            vertices,
            polygons,
            channels,
            submeshes,
            ..Self::with_base(base)
        }
    }

    /// Phase-1 parse of a `Geometry` element.
    pub fn from_element(element: &Element) -> Self {
        let mut geometry = Self::with_base(ObjectBase::from_element(element));

        if let Some(flat) = element.child_attribute("Vertices").and_then(Attribute::to_f64_vec) {
            if flat.len() % 3 != 0 {
                tracing::warn!(
                    geometry = geometry.base.name(),
                    len = flat.len(),
                    "vertex buffer length is not a multiple of 3"
                );
            }
            geometry.vertices = flat.chunks_exact(3).map(|c| DVec3::new(c[0], c[1], c[2])).collect();
        }

        if let Some(attr) = element.child_attribute("PolygonVertexIndex") {
            match attr.to_i32_vec() {
                Some(indices) => geometry.polygons = decode_polygons(&indices),
                None => tracing::warn!(
                    geometry = geometry.base.name(),
                    value = ?attr,
                    "polygon vertex indices are not 32-bit integers, topology dropped"
                ),
            }
        }

        geometry.channels = layers::read_channels(element, &geometry.polygons);
        geometry.finalize_channels();
        geometry.submeshes = layers::read_submeshes(element, &geometry.polygons);
        geometry
    }

    // === Topology ===

    pub fn vertices(&self) -> &[DVec3] {
        &self.vertices
    }

    pub fn polygons(&self) -> &[Vec<i32>] {
        &self.polygons
    }

    pub fn polygon_count(&self) -> usize {
        self.polygons.len()
    }

    /// Number of polygon vertices, the length of every channel.
    pub fn index_count(&self) -> usize {
        index_count(&self.polygons)
    }

    /// Terminal-encoded flat index buffer.
    pub fn polygon_vertex_indices(&self) -> Vec<i32> {
        encode_polygons(&self.polygons)
    }

    /// Unique edges as flat polygon-vertex positions, recomputed on each call.
    pub fn edges(&self) -> Vec<i32> {
        derive_edges(&self.polygons)
    }

    // === Channels and submeshes ===

    /// Channels sorted by type, then layer.
    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    pub fn channel(&self, channel_type: ChannelType, layer: i32) -> Option<&Channel> {
        self.channels
            .iter()
            .find(|c| c.channel_type == channel_type && c.layer == layer)
    }

    pub fn submeshes(&self) -> &[SubMesh] {
        &self.submeshes
    }

    /// Fit every channel to the polygon-vertex count and restore sort order.
    fn finalize_channels(&mut self) {
        let count = self.index_count();
        for channel in &mut self.channels {
            channel.fit_to(count);
        }
        self.channels.sort_by_key(|c| (c.channel_type, c.layer));
    }

    // === Deformers ===

    pub fn skins(&self) -> &[ObjectHandle] {
        &self.skins
    }

    pub fn blend_shapes(&self) -> &[ObjectHandle] {
        &self.blend_shapes
    }

    pub fn add_skin(&mut self, skin: ObjectHandle) -> Result<()> {
        self.add_skin_at(skin, self.skins.len())
    }

    pub fn add_skin_at(&mut self, skin: ObjectHandle, index: usize) -> Result<()> {
        insert_deformer(&mut self.skins, self.base.handle(), skin, index)
    }

    /// Remove a skin. Handles from other scenes are ignored.
    pub fn remove_skin(&mut self, skin: ObjectHandle) -> bool {
        remove_deformer(&mut self.skins, self.base.handle(), skin)
    }

    pub fn remove_skin_at(&mut self, index: usize) -> Result<ObjectHandle> {
        remove_deformer_at(&mut self.skins, index)
    }

    pub fn add_blend_shape(&mut self, blend_shape: ObjectHandle) -> Result<()> {
        self.add_blend_shape_at(blend_shape, self.blend_shapes.len())
    }

    pub fn add_blend_shape_at(&mut self, blend_shape: ObjectHandle, index: usize) -> Result<()> {
        insert_deformer(&mut self.blend_shapes, self.base.handle(), blend_shape, index)
    }

    /// Remove a blend shape. Handles from other scenes are ignored.
    pub fn remove_blend_shape(&mut self, blend_shape: ObjectHandle) -> bool {
        remove_deformer(&mut self.blend_shapes, self.base.handle(), blend_shape)
    }

    pub fn remove_blend_shape_at(&mut self, index: usize) -> Result<ObjectHandle> {
        remove_deformer_at(&mut self.blend_shapes, index)
    }

    /// Append without scene checks, used while resolving connections.
    pub(crate) fn push_skin(&mut self, skin: ObjectHandle) {
        self.skins.push(skin);
    }

    pub(crate) fn push_blend_shape(&mut self, blend_shape: ObjectHandle) {
        self.blend_shapes.push(blend_shape);
    }
}

fn insert_deformer(
    list: &mut Vec<ObjectHandle>,
    owner: ObjectHandle,
    deformer: ObjectHandle,
    index: usize,
) -> Result<()> {
    if deformer.scene() != owner.scene() {
        return Err(Error::CrossScene(deformer));
    }
    if index > list.len() {
        return Err(Error::out_of_range(index, list.len()));
    }
    list.insert(index, deformer);
    Ok(())
}

fn remove_deformer(list: &mut Vec<ObjectHandle>, owner: ObjectHandle, deformer: ObjectHandle) -> bool {
    if deformer.scene() != owner.scene() {
        return false;
    }
    match list.iter().position(|&d| d == deformer) {
        Some(pos) => {
            list.remove(pos);
            true
        }
        None => false,
    }
}

fn remove_deformer_at(list: &mut Vec<ObjectHandle>, index: usize) -> Result<ObjectHandle> {
    if index >= list.len() {
        return Err(Error::out_of_range(index, list.len()));
    }
    Ok(list.remove(index))
}

impl SceneObject for Geometry {
    impl_object_base!();

    fn class(&self) -> ClassType {
        ClassType::Geometry
    }

    fn object_type(&self) -> ObjectType {
        ObjectType::Mesh
    }

    fn connections(&self) -> Vec<Connection> {
        let id = self.base.id();
        self.blend_shapes
            .iter()
            .chain(&self.skins)
            .map(|d| Connection::object(d.id(), id))
            .collect()
    }

    fn to_element(&self, options: &WriteOptions) -> Element {
        let vertices: Vec<f64> = bytemuck::cast_slice(&self.vertices).to_vec();
        let mut children = vec![
            self.base.properties().to_element(),
            Element::with_attribute("Vertices", vertices),
            Element::with_attribute("PolygonVertexIndex", self.polygon_vertex_indices()),
            Element::with_attribute("Edges", self.edges()),
            Element::with_attribute("GeometryVersion", GEOMETRY_VERSION),
        ];
        children.extend(layers::layer_elements(&self.channels, &self.submeshes, self.polygon_count()));

        Element::with_parts(
            self.class().element_name(),
            self.base.header_attributes(self.class(), ObjectType::Mesh, options),
            children,
        )
    }

    fn release(&mut self, handle: ObjectHandle) {
        self.skins.retain(|&s| s != handle);
        self.blend_shapes.retain(|&b| b != handle);
    }
}
