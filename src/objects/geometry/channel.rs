//! Per-polygon-vertex attribute channels and submesh ranges.

use crate::util::{DVec2, DVec3, DVec4};

/// Semantic kind of a channel. The declaration order is the sort order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ChannelType {
    Normal,
    Tangent,
    Binormal,
    Color,
    TexCoord,
    /// Per-polygon material assignment, synthesized from submeshes on write.
    Material,
}

impl ChannelType {
    /// Element name of the layer block.
    pub const fn element_name(self) -> &'static str {
        match self {
            Self::Normal => "LayerElementNormal",
            Self::Tangent => "LayerElementTangent",
            Self::Binormal => "LayerElementBinormal",
            Self::Color => "LayerElementColor",
            Self::TexCoord => "LayerElementUV",
            Self::Material => "LayerElementMaterial",
        }
    }

    /// Name of the value array inside the layer block.
    pub const fn array_name(self) -> &'static str {
        match self {
            Self::Normal => "Normals",
            Self::Tangent => "Tangents",
            Self::Binormal => "Binormals",
            Self::Color => "Colors",
            Self::TexCoord => "UV",
            Self::Material => "Materials",
        }
    }

    /// Name of the index array used with `IndexToDirect` references.
    pub const fn index_name(self) -> &'static str {
        match self {
            Self::Normal => "NormalsIndex",
            Self::Tangent => "TangentsIndex",
            Self::Binormal => "BinormalsIndex",
            Self::Color => "ColorIndex",
            Self::TexCoord => "UVIndex",
            Self::Material => "MaterialsIndex",
        }
    }

    /// Name of the separate `w` array for vector channels.
    pub const fn weight_name(self) -> Option<&'static str> {
        match self {
            Self::Normal => Some("NormalsW"),
            Self::Tangent => Some("TangentsW"),
            Self::Binormal => Some("BinormalsW"),
            _ => None,
        }
    }

    /// Channels read from layer blocks (the material layer is handled apart).
    pub const ATTRIBUTES: [ChannelType; 5] = [
        Self::Normal,
        Self::Tangent,
        Self::Binormal,
        Self::Color,
        Self::TexCoord,
    ];
}

/// Component layout of a channel buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ComponentType {
    Int,
    Double,
    Double2,
    Double3,
    Double4,
}

impl ComponentType {
    /// Scalars per element.
    pub const fn arity(self) -> usize {
        match self {
            Self::Int | Self::Double => 1,
            Self::Double2 => 2,
            Self::Double3 => 3,
            Self::Double4 => 4,
        }
    }
}

/// Typed channel storage, one element per polygon vertex.
#[derive(Clone, Debug, PartialEq)]
pub enum ChannelBuffer {
    Int(Vec<i32>),
    Double(Vec<f64>),
    Double2(Vec<DVec2>),
    Double3(Vec<DVec3>),
    Double4(Vec<DVec4>),
}

impl ChannelBuffer {
    pub fn component_type(&self) -> ComponentType {
        match self {
            Self::Int(_) => ComponentType::Int,
            Self::Double(_) => ComponentType::Double,
            Self::Double2(_) => ComponentType::Double2,
            Self::Double3(_) => ComponentType::Double3,
            Self::Double4(_) => ComponentType::Double4,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Int(v) => v.len(),
            Self::Double(v) => v.len(),
            Self::Double2(v) => v.len(),
            Self::Double3(v) => v.len(),
            Self::Double4(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Truncate or zero-pad to exactly `len` elements.
    pub fn resize(&mut self, len: usize) {
        match self {
            Self::Int(v) => v.resize(len, 0),
            Self::Double(v) => v.resize(len, 0.0),
            Self::Double2(v) => v.resize(len, DVec2::ZERO),
            Self::Double3(v) => v.resize(len, DVec3::ZERO),
            Self::Double4(v) => v.resize(len, DVec4::ZERO),
        }
    }

    /// Flatten to scalars, component by component.
    pub fn to_flat(&self) -> Vec<f64> {
        match self {
            Self::Int(v) => v.iter().map(|&x| x as f64).collect(),
            Self::Double(v) => v.clone(),
            Self::Double2(v) => bytemuck::cast_slice(v).to_vec(),
            Self::Double3(v) => bytemuck::cast_slice(v).to_vec(),
            Self::Double4(v) => bytemuck::cast_slice(v).to_vec(),
        }
    }

    /// Rebuild a buffer of the given layout from flat scalars.
    ///
    /// A trailing partial element is dropped.
    pub fn from_flat(component: ComponentType, flat: &[f64]) -> Self {
        match component {
            ComponentType::Int => Self::Int(flat.iter().map(|&x| x as i32).collect()),
            ComponentType::Double => Self::Double(flat.to_vec()),
            ComponentType::Double2 => Self::Double2(
                flat.chunks_exact(2).map(|c| DVec2::new(c[0], c[1])).collect(),
            ),
            ComponentType::Double3 => Self::Double3(
                flat.chunks_exact(3).map(|c| DVec3::new(c[0], c[1], c[2])).collect(),
            ),
            ComponentType::Double4 => Self::Double4(
                flat.chunks_exact(4).map(|c| DVec4::new(c[0], c[1], c[2], c[3])).collect(),
            ),
        }
    }
}

/// A layered, typed per-polygon-vertex attribute buffer.
#[derive(Clone, Debug, PartialEq)]
pub struct Channel {
    pub layer: i32,
    pub name: String,
    pub channel_type: ChannelType,
    pub buffer: ChannelBuffer,
}

impl Channel {
    pub fn new(layer: i32, name: impl Into<String>, channel_type: ChannelType, buffer: ChannelBuffer) -> Self {
        Self {
            layer,
            name: name.into(),
            channel_type,
            buffer,
        }
    }

    pub fn component_type(&self) -> ComponentType {
        self.buffer.component_type()
    }

    /// Vector channels keep `w` in a separate array on the wire; colors don't.
    pub fn has_split_weight(&self) -> bool {
        self.component_type() == ComponentType::Double4 && self.channel_type.weight_name().is_some()
    }

    /// Resize the buffer to the mesh's polygon-vertex count.
    pub fn fit_to(&mut self, index_count: usize) {
        if self.buffer.len() != index_count {
            self.buffer.resize(index_count);
        }
    }
}

/// Contiguous polygon range sharing one material index.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct SubMesh {
    pub polygon_start: usize,
    pub polygon_count: usize,
    pub material_index: i32,
}

impl SubMesh {
    pub const fn new(polygon_start: usize, polygon_count: usize, material_index: i32) -> Self {
        Self {
            polygon_start,
            polygon_count,
            material_index,
        }
    }

    /// Polygon range covered by this submesh.
    pub fn range(&self) -> std::ops::Range<usize> {
        self.polygon_start..self.polygon_start + self.polygon_count
    }
}

/// Fold per-polygon material indices into runs of equal values.
pub fn submeshes_from_materials(materials: &[i32]) -> Vec<SubMesh> {
    let mut out: Vec<SubMesh> = Vec::new();
    for (polygon, &material) in materials.iter().enumerate() {
        match out.last_mut() {
            Some(last) if last.material_index == material => last.polygon_count += 1,
            _ => out.push(SubMesh::new(polygon, 1, material)),
        }
    }
    out
}

/// Expand submeshes into one material index per polygon.
///
/// Polygons outside every submesh get material 0; out-of-range submesh
/// polygons are ignored.
pub fn materials_from_submeshes(submeshes: &[SubMesh], polygon_count: usize) -> Vec<i32> {
    let mut materials = vec![0; polygon_count];
    for submesh in submeshes {
        for polygon in submesh.range() {
            if let Some(slot) = materials.get_mut(polygon) {
                *slot = submesh.material_index;
            }
        }
    }
    materials
}
