//! Layer element blocks: rendering channels and submeshes, and reading them
//! back into per-polygon-vertex buffers.

use super::channel::{
    materials_from_submeshes, submeshes_from_materials, Channel, ChannelBuffer, ChannelType,
    ComponentType, SubMesh,
};
use crate::tree::{Attribute, Element};

const LAYER_ELEMENT_VERSION: i32 = 101;
const LAYER_VERSION: i32 = 100;

/// How values map onto the mesh.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MappingType {
    ByPolygonVertex,
    ByControlPoint,
    ByPolygon,
    AllSame,
}

impl MappingType {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ByPolygonVertex" => Some(Self::ByPolygonVertex),
            "ByVertex" | "ByVertice" | "ByControlPoint" => Some(Self::ByControlPoint),
            "ByPolygon" => Some(Self::ByPolygon),
            "AllSame" => Some(Self::AllSame),
            _ => None,
        }
    }
}

/// Whether values are addressed directly or through an index array.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReferenceType {
    Direct,
    IndexToDirect,
}

impl ReferenceType {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Direct" => Some(Self::Direct),
            "IndexToDirect" | "Index" => Some(Self::IndexToDirect),
            _ => None,
        }
    }
}

// ============================================================================
// Writing
// ============================================================================

/// One rendered block: an attribute channel or the synthesized material layer.
enum LayerEntry<'a> {
    Channel(&'a Channel),
    Material,
}

impl LayerEntry<'_> {
    fn layer(&self) -> i32 {
        match self {
            Self::Channel(c) => c.layer,
            Self::Material => 0,
        }
    }

    fn channel_type(&self) -> ChannelType {
        match self {
            Self::Channel(c) => c.channel_type,
            Self::Material => ChannelType::Material,
        }
    }
}

/// Render every layer element block followed by every `Layer` block.
///
/// Channels are grouped by layer in order of first appearance. A material
/// layer is synthesized on layer 0 whenever submeshes exist and is placed
/// first among its layer's blocks. The `Layer` entries keep list order, with
/// the material entry last. Nothing is stored back on the geometry.
pub(super) fn layer_elements(
    channels: &[Channel],
    submeshes: &[SubMesh],
    polygon_count: usize,
) -> Vec<Element> {
    let mut entries: Vec<LayerEntry<'_>> = channels.iter().map(LayerEntry::Channel).collect();
    if !submeshes.is_empty() {
        entries.push(LayerEntry::Material);
    }

    let mut groups: Vec<(i32, Vec<LayerEntry<'_>>)> = Vec::new();
    for entry in entries {
        let layer = entry.layer();
        match groups.iter_mut().find(|(l, _)| *l == layer) {
            Some((_, group)) => group.push(entry),
            None => groups.push((layer, vec![entry])),
        }
    }
    let listing: Vec<(i32, Vec<ChannelType>)> = groups
        .iter()
        .map(|(layer, group)| (*layer, group.iter().map(LayerEntry::channel_type).collect()))
        .collect();

    for (_, group) in &mut groups {
        if let Some(pos) = group.iter().position(|e| matches!(e, LayerEntry::Material)) {
            let material = group.remove(pos);
            group.insert(0, material);
        }
    }

    let mut out = Vec::new();
    for (_, group) in &groups {
        for entry in group {
            out.push(match entry {
                LayerEntry::Channel(channel) => channel_element(channel),
                LayerEntry::Material => material_element(submeshes, polygon_count),
            });
        }
    }
    for (layer, types) in listing {
        let mut layer_element = Element::with_parts(
            "Layer",
            [Attribute::Int32(layer)],
            vec![Element::with_attribute("Version", LAYER_VERSION)],
        );
        for channel_type in types {
            layer_element.push_child(
                Element::new("LayerElement")
                    .child(Element::with_attribute("Type", channel_type.element_name()))
                    .child(Element::with_attribute("TypedIndex", layer)),
            );
        }
        out.push(layer_element);
    }
    out
}

/// Block header shared by every layer element.
fn layer_header(channel_type: ChannelType, layer: i32, name: &str, mapping: &str, reference: &str) -> Element {
    Element::with_parts(
        channel_type.element_name(),
        [Attribute::Int32(layer)],
        vec![
            Element::with_attribute("Version", LAYER_ELEMENT_VERSION),
            Element::with_attribute("Name", name),
            Element::with_attribute("MappingInformationType", mapping),
            Element::with_attribute("ReferenceInformationType", reference),
        ],
    )
}

fn channel_element(channel: &Channel) -> Element {
    let mut element = layer_header(channel.channel_type, channel.layer, &channel.name, "ByPolygonVertex", "Direct");
    let array_name = channel.channel_type.array_name();

    match (&channel.buffer, channel.channel_type.weight_name()) {
        (ChannelBuffer::Double4(values), Some(weight_name)) => {
            let xyz: Vec<f64> = values.iter().flat_map(|v| [v.x, v.y, v.z]).collect();
            let w: Vec<f64> = values.iter().map(|v| v.w).collect();
            element.push_child(Element::with_attribute(array_name, xyz));
            element.push_child(Element::with_attribute(weight_name, w));
        }
        (ChannelBuffer::Int(values), _) => {
            element.push_child(Element::with_attribute(array_name, values.clone()));
        }
        (buffer, _) => {
            element.push_child(Element::with_attribute(array_name, buffer.to_flat()));
        }
    }
    element
}

fn material_element(submeshes: &[SubMesh], polygon_count: usize) -> Element {
    let (mapping, materials) = match submeshes {
        [single] => ("AllSame", vec![single.material_index]),
        _ => ("ByPolygon", materials_from_submeshes(submeshes, polygon_count)),
    };
    let mut element = layer_header(ChannelType::Material, 0, "", mapping, "IndexToDirect");
    element.push_child(Element::with_attribute(ChannelType::Material.array_name(), materials));
    element
}

// ============================================================================
// Reading
// ============================================================================

/// Read every attribute channel of a geometry element, expanded to one value
/// per polygon vertex. Malformed blocks are skipped.
pub(super) fn read_channels(element: &Element, polygons: &[Vec<i32>]) -> Vec<Channel> {
    let mut channels = Vec::new();
    for channel_type in ChannelType::ATTRIBUTES {
        for block in element.children_named(channel_type.element_name()) {
            match read_channel(block, channel_type, polygons) {
                Some(channel) => channels.push(channel),
                None => tracing::warn!(block = block.name(), "skipping malformed layer element"),
            }
        }
    }
    channels
}

fn read_channel(block: &Element, channel_type: ChannelType, polygons: &[Vec<i32>]) -> Option<Channel> {
    let layer = block.first_attribute().and_then(Attribute::as_i32).unwrap_or(0);
    let name = block.child_attribute("Name").and_then(Attribute::as_str).unwrap_or_default();
    let mapping = match block.child_attribute("MappingInformationType").and_then(Attribute::as_str) {
        Some(s) => MappingType::parse(s)?,
        None => MappingType::ByPolygonVertex,
    };
    let reference = match block.child_attribute("ReferenceInformationType").and_then(Attribute::as_str) {
        Some(s) => ReferenceType::parse(s)?,
        None => ReferenceType::Direct,
    };

    let values = block.child_attribute(channel_type.array_name())?.to_f64_vec()?;
    let indices = match reference {
        ReferenceType::Direct => None,
        ReferenceType::IndexToDirect => Some(block.child_attribute(channel_type.index_name())?.to_i32_vec()?),
    };

    let arity = match channel_type {
        ChannelType::TexCoord => 2,
        ChannelType::Color => 4,
        _ => 3,
    };
    let count = values.len() / arity;
    let weights = channel_type
        .weight_name()
        .and_then(|n| block.child_attribute(n))
        .and_then(Attribute::to_f64_vec)
        .filter(|w| w.len() == count);

    let (component, out_arity) = match (arity, &weights) {
        (2, _) => (ComponentType::Double2, 2),
        (3, Some(_)) => (ComponentType::Double4, 4),
        (3, None) => (ComponentType::Double3, 3),
        _ => (ComponentType::Double4, 4),
    };

    let slots = source_slots(mapping, indices.as_deref(), polygons);
    let mut flat = vec![0.0; slots.len() * out_arity];
    for (dst, slot) in flat.chunks_exact_mut(out_arity).zip(&slots) {
        let Some(slot) = (*slot).filter(|&s| s < count) else {
            continue;
        };
        dst[..arity].copy_from_slice(&values[slot * arity..(slot + 1) * arity]);
        if let Some(w) = &weights {
            dst[3] = w[slot];
        }
    }

    Some(Channel::new(layer, name, channel_type, ChannelBuffer::from_flat(component, &flat)))
}

/// For every polygon vertex, the value slot it reads from.
fn source_slots(mapping: MappingType, indices: Option<&[i32]>, polygons: &[Vec<i32>]) -> Vec<Option<usize>> {
    let lookup = |i: usize| -> Option<usize> {
        match indices {
            Some(ix) => ix.get(i).and_then(|&v| usize::try_from(v).ok()),
            None => Some(i),
        }
    };
    let index_count: usize = polygons.iter().map(Vec::len).sum();

    match mapping {
        MappingType::ByPolygonVertex => (0..index_count).map(lookup).collect(),
        MappingType::ByControlPoint => polygons
            .iter()
            .flatten()
            .map(|&v| usize::try_from(v).ok().and_then(lookup))
            .collect(),
        MappingType::ByPolygon => polygons
            .iter()
            .enumerate()
            .flat_map(|(p, poly)| std::iter::repeat(lookup(p)).take(poly.len()))
            .collect(),
        MappingType::AllSame => vec![lookup(0); index_count],
    }
}

/// Rebuild submeshes from the material layer, if any.
///
/// The layer goes through the same mapping and reference expansion as the
/// attribute channels; each polygon takes the material of its first polygon
/// vertex. `IndexToDirect` without a `MaterialsIndex` array reads `Materials`
/// as the per-slot indices, which is how material layers are usually stored.
pub(super) fn read_submeshes(element: &Element, polygons: &[Vec<i32>]) -> Vec<SubMesh> {
    let Some(block) = element.find_child(ChannelType::Material.element_name()) else {
        return Vec::new();
    };
    let Some(materials) = block
        .child_attribute(ChannelType::Material.array_name())
        .and_then(Attribute::to_i32_vec)
    else {
        tracing::warn!("material layer without a material array");
        return Vec::new();
    };

    let mapping = match block.child_attribute("MappingInformationType").and_then(Attribute::as_str) {
        Some(s) => match MappingType::parse(s) {
            Some(mapping) => mapping,
            None => {
                tracing::warn!(mapping = s, "unsupported material mapping");
                return Vec::new();
            }
        },
        None => MappingType::ByPolygonVertex,
    };
    let reference = block
        .child_attribute("ReferenceInformationType")
        .and_then(Attribute::as_str)
        .and_then(ReferenceType::parse)
        .unwrap_or(ReferenceType::Direct);
    let indices = match reference {
        ReferenceType::Direct => None,
        ReferenceType::IndexToDirect => block
            .child_attribute(ChannelType::Material.index_name())
            .and_then(Attribute::to_i32_vec),
    };

    let slots = source_slots(mapping, indices.as_deref(), polygons);
    let mut per_polygon = Vec::with_capacity(polygons.len());
    let mut offset = 0;
    for (polygon, vertices) in polygons.iter().enumerate() {
        let material = slots
            .get(offset)
            .copied()
            .flatten()
            .and_then(|slot| materials.get(slot).copied());
        let Some(material) = material else {
            tracing::warn!(polygon, ?mapping, ?reference, "material layer does not cover every polygon");
            return Vec::new();
        };
        per_polygon.push(material);
        offset += vertices.len();
    }
    submeshes_from_materials(&per_polygon)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::{DVec2, DVec3, DVec4};

    fn names(elements: &[Element]) -> Vec<&str> {
        elements.iter().map(Element::name).collect()
    }

    #[test]
    fn test_material_block_first_in_layer() {
        let channels = vec![
            Channel::new(0, "", ChannelType::Normal, ChannelBuffer::Double3(vec![DVec3::Z; 3])),
            Channel::new(0, "map1", ChannelType::TexCoord, ChannelBuffer::Double2(vec![DVec2::ZERO; 3])),
        ];
        let out = layer_elements(&channels, &[SubMesh::new(0, 1, 2)], 1);
        assert_eq!(
            names(&out),
            ["LayerElementMaterial", "LayerElementNormal", "LayerElementUV", "Layer"]
        );
        assert_eq!(out[0].child_attribute("MappingInformationType"), Some(&Attribute::from("AllSame")));
        assert_eq!(out[0].child_attribute("Materials"), Some(&Attribute::from(vec![2])));

        let listed: Vec<&Attribute> = out[3]
            .children_named("LayerElement")
            .filter_map(|e| e.child_attribute("Type"))
            .collect();
        assert_eq!(
            listed,
            [
                &Attribute::from("LayerElementNormal"),
                &Attribute::from("LayerElementUV"),
                &Attribute::from("LayerElementMaterial"),
            ]
        );
    }

    #[test]
    fn test_rendering_is_repeatable() {
        let channels = vec![Channel::new(1, "", ChannelType::Color, ChannelBuffer::Double4(vec![DVec4::ONE]))];
        let submeshes = [SubMesh::new(0, 1, 0), SubMesh::new(1, 1, 1)];
        let first = layer_elements(&channels, &submeshes, 2);
        let second = layer_elements(&channels, &submeshes, 2);
        assert_eq!(first, second);
        // Layer 1 first, then the synthesized layer 0.
        assert_eq!(names(&first), ["LayerElementColor", "LayerElementMaterial", "Layer", "Layer"]);
        assert_eq!(first[1].child_attribute("Materials"), Some(&Attribute::from(vec![0, 1])));
    }

    #[test]
    fn test_weight_split() {
        let channel = Channel::new(
            0,
            "",
            ChannelType::Tangent,
            ChannelBuffer::Double4(vec![DVec4::new(1.0, 2.0, 3.0, 0.5)]),
        );
        let e = channel_element(&channel);
        assert_eq!(e.child_attribute("Tangents"), Some(&Attribute::from(vec![1.0, 2.0, 3.0])));
        assert_eq!(e.child_attribute("TangentsW"), Some(&Attribute::from(vec![0.5])));

        let polygons = vec![vec![0]];
        let parsed = read_channel(&e, ChannelType::Tangent, &polygons).unwrap();
        assert_eq!(parsed.buffer, channel.buffer);
    }

    #[test]
    fn test_color_not_split() {
        let channel = Channel::new(0, "", ChannelType::Color, ChannelBuffer::Double4(vec![DVec4::ONE]));
        let e = channel_element(&channel);
        assert_eq!(e.child_attribute("Colors").map(Attribute::len), Some(4));
        assert!(e.find_child("ColorsW").is_none());
    }

    #[test]
    fn test_read_indexed_by_control_point() {
        let polygons = vec![vec![0, 1, 2]];
        let block = Element::with_parts("LayerElementUV", [Attribute::Int32(0)], Vec::new())
            .child(Element::with_attribute("MappingInformationType", "ByVertice"))
            .child(Element::with_attribute("ReferenceInformationType", "IndexToDirect"))
            .child(Element::with_attribute("UV", vec![0.0, 0.0, 1.0, 1.0]))
            .child(Element::with_attribute("UVIndex", vec![1, 0, 1]));
        let channel = read_channel(&block, ChannelType::TexCoord, &polygons).unwrap();
        assert_eq!(
            channel.buffer,
            ChannelBuffer::Double2(vec![DVec2::ONE, DVec2::ZERO, DVec2::ONE])
        );
    }

    #[test]
    fn test_read_by_polygon() {
        let polygons = vec![vec![0, 1, 2], vec![2, 1, 3]];
        let block = Element::new("LayerElementNormal")
            .child(Element::with_attribute("MappingInformationType", "ByPolygon"))
            .child(Element::with_attribute("ReferenceInformationType", "Direct"))
            .child(Element::with_attribute("Normals", vec![0.0, 0.0, 1.0, 0.0, 1.0, 0.0]));
        let channel = read_channel(&block, ChannelType::Normal, &polygons).unwrap();
        let ChannelBuffer::Double3(values) = channel.buffer else {
            panic!("expected a 3-component buffer");
        };
        assert_eq!(values, vec![DVec3::Z, DVec3::Z, DVec3::Z, DVec3::Y, DVec3::Y, DVec3::Y]);
    }

    #[test]
    fn test_unknown_mapping_skipped() {
        let block = Element::new("LayerElementNormal")
            .child(Element::with_attribute("MappingInformationType", "ByEdge"))
            .child(Element::with_attribute("Normals", vec![0.0, 0.0, 1.0]));
        assert!(read_channel(&block, ChannelType::Normal, &[vec![0, 1, 2]]).is_none());
    }

    #[test]
    fn test_read_submeshes() {
        let polygons = vec![vec![0, 1, 2], vec![0, 2, 3], vec![3, 2, 4]];
        let by_polygon = Element::new("Geometry").child(
            Element::new("LayerElementMaterial")
                .child(Element::with_attribute("MappingInformationType", "ByPolygon"))
                .child(Element::with_attribute("ReferenceInformationType", "IndexToDirect"))
                .child(Element::with_attribute("Materials", vec![0, 0, 1])),
        );
        assert_eq!(
            read_submeshes(&by_polygon, &polygons),
            vec![SubMesh::new(0, 2, 0), SubMesh::new(2, 1, 1)]
        );

        let all_same = Element::new("Geometry").child(
            Element::new("LayerElementMaterial")
                .child(Element::with_attribute("MappingInformationType", "AllSame"))
                .child(Element::with_attribute("Materials", vec![3])),
        );
        assert_eq!(read_submeshes(&all_same, &polygons), vec![SubMesh::new(0, 3, 3)]);
    }

    #[test]
    fn test_read_indexed_submeshes() {
        let polygons = vec![vec![0, 1, 2], vec![0, 2, 3], vec![3, 2, 4]];
        let indexed = Element::new("Geometry").child(
            Element::new("LayerElementMaterial")
                .child(Element::with_attribute("MappingInformationType", "ByPolygon"))
                .child(Element::with_attribute("ReferenceInformationType", "IndexToDirect"))
                .child(Element::with_attribute("Materials", vec![5, 7]))
                .child(Element::with_attribute("MaterialsIndex", vec![1, 0, 0])),
        );
        assert_eq!(
            read_submeshes(&indexed, &polygons),
            vec![SubMesh::new(0, 1, 7), SubMesh::new(1, 2, 5)]
        );

        // Per polygon vertex: the first vertex of each polygon decides.
        let by_vertex = Element::new("Geometry").child(
            Element::new("LayerElementMaterial")
                .child(Element::with_attribute("MappingInformationType", "ByPolygonVertex"))
                .child(Element::with_attribute("ReferenceInformationType", "Direct"))
                .child(Element::with_attribute("Materials", vec![2, 9, 9, 2, 9, 9, 4, 9, 9])),
        );
        assert_eq!(
            read_submeshes(&by_vertex, &polygons),
            vec![SubMesh::new(0, 2, 2), SubMesh::new(2, 1, 4)]
        );

        let short = Element::new("Geometry").child(
            Element::new("LayerElementMaterial")
                .child(Element::with_attribute("MappingInformationType", "ByPolygon"))
                .child(Element::with_attribute("ReferenceInformationType", "IndexToDirect"))
                .child(Element::with_attribute("Materials", vec![5, 7]))
                .child(Element::with_attribute("MaterialsIndex", vec![1, 4, 0])),
        );
        assert!(read_submeshes(&short, &polygons).is_empty());

        let by_edge = Element::new("Geometry").child(
            Element::new("LayerElementMaterial")
                .child(Element::with_attribute("MappingInformationType", "ByEdge"))
                .child(Element::with_attribute("Materials", vec![0])),
        );
        assert!(read_submeshes(&by_edge, &polygons).is_empty());
    }
}
