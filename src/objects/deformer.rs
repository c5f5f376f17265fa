//! Deformers: skins with their clusters, and blend shapes.

use crate::core::{
    impl_object_base, ClassType, Connection, ObjectBase, ObjectHandle, ObjectType, SceneObject,
    WriteOptions,
};
use crate::tree::{Attribute, Element};
use crate::util::{matrix_from_slice, matrix_to_vec, DMat4};

const SKIN_VERSION: i32 = 101;
const CLUSTER_VERSION: i32 = 100;
const BLEND_SHAPE_VERSION: i32 = 100;
const DEFAULT_DEFORM_ACCURACY: f64 = 50.0;

// ============================================================================
// Skin
// ============================================================================

/// Skin deformer owning an ordered list of clusters.
#[derive(Clone, Debug)]
pub struct Skin {
    base: ObjectBase,
    pub deform_accuracy: f64,
    clusters: Vec<ObjectHandle>,
}

impl Skin {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            base: ObjectBase::new(name),
            deform_accuracy: DEFAULT_DEFORM_ACCURACY,
            clusters: Vec::new(),
        }
    }

    pub fn from_element(element: &Element) -> Self {
        Self {
            base: ObjectBase::from_element(element),
            deform_accuracy: element
                .child_attribute("Link_DeformAcuracy")
                .and_then(Attribute::as_f64)
                .unwrap_or(DEFAULT_DEFORM_ACCURACY),
            clusters: Vec::new(),
        }
    }

    pub fn clusters(&self) -> &[ObjectHandle] {
        &self.clusters
    }

    pub(crate) fn push_cluster(&mut self, cluster: ObjectHandle) {
        if !self.clusters.contains(&cluster) {
            self.clusters.push(cluster);
        }
    }
}

impl SceneObject for Skin {
    impl_object_base!();

    fn class(&self) -> ClassType {
        ClassType::Deformer
    }

    fn object_type(&self) -> ObjectType {
        ObjectType::Skin
    }

    fn connections(&self) -> Vec<Connection> {
        let id = self.base.id();
        self.clusters.iter().map(|c| Connection::object(c.id(), id)).collect()
    }

    fn to_element(&self, options: &WriteOptions) -> Element {
        Element::with_parts(
            self.class().element_name(),
            self.base.header_attributes(self.class(), ObjectType::Skin, options),
            vec![
                Element::with_attribute("Version", SKIN_VERSION),
                Element::with_attribute("Link_DeformAcuracy", self.deform_accuracy),
            ],
        )
    }

    fn release(&mut self, handle: ObjectHandle) {
        self.clusters.retain(|&c| c != handle);
    }
}

// ============================================================================
// Cluster
// ============================================================================

/// Per-bone vertex weights of a skin.
#[derive(Clone, Debug)]
pub struct Cluster {
    base: ObjectBase,
    pub indices: Vec<i32>,
    pub weights: Vec<f64>,
    pub transform: DMat4,
    pub transform_link: DMat4,
    link: Option<ObjectHandle>,
}

impl Cluster {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            base: ObjectBase::new(name),
            indices: Vec::new(),
            weights: Vec::new(),
            transform: DMat4::IDENTITY,
            transform_link: DMat4::IDENTITY,
            link: None,
        }
    }

    /// Phase-1 parse; missing arrays are empty and bad matrices are identity.
    pub fn from_element(element: &Element) -> Self {
        let matrix = |name: &str| {
            element
                .child_attribute(name)
                .and_then(Attribute::as_f64_slice)
                .and_then(matrix_from_slice)
                .unwrap_or(DMat4::IDENTITY)
        };
        let mut cluster = Self {
            base: ObjectBase::from_element(element),
            indices: element
                .child_attribute("Indexes")
                .and_then(Attribute::to_i32_vec)
                .unwrap_or_default(),
            weights: element
                .child_attribute("Weights")
                .and_then(Attribute::to_f64_vec)
                .unwrap_or_default(),
            transform: matrix("Transform"),
            transform_link: matrix("TransformLink"),
            link: None,
        };
        if cluster.indices.len() != cluster.weights.len() {
            tracing::debug!(
                cluster = cluster.base.name(),
                indices = cluster.indices.len(),
                weights = cluster.weights.len(),
                "index and weight counts differ, truncating"
            );
            let n = cluster.indices.len().min(cluster.weights.len());
            cluster.indices.truncate(n);
            cluster.weights.truncate(n);
        }
        cluster
    }

    /// Model driving this cluster.
    pub fn link(&self) -> Option<ObjectHandle> {
        self.link
    }

    pub(crate) fn set_link_unchecked(&mut self, link: Option<ObjectHandle>) {
        self.link = link;
    }
}

impl SceneObject for Cluster {
    impl_object_base!();

    fn class(&self) -> ClassType {
        ClassType::SubDeformer
    }

    fn object_type(&self) -> ObjectType {
        ObjectType::Cluster
    }

    fn connections(&self) -> Vec<Connection> {
        self.link
            .map(|link| Connection::object(link.id(), self.base.id()))
            .into_iter()
            .collect()
    }

    fn to_element(&self, options: &WriteOptions) -> Element {
        Element::with_parts(
            self.class().element_name(),
            self.base.header_attributes(self.class(), ObjectType::Cluster, options),
            vec![
                Element::with_attribute("Version", CLUSTER_VERSION),
                Element::with_parts("UserData", [Attribute::from(""), Attribute::from("")], Vec::new()),
                Element::with_attribute("Indexes", self.indices.clone()),
                Element::with_attribute("Weights", self.weights.clone()),
                Element::with_attribute("Transform", matrix_to_vec(&self.transform)),
                Element::with_attribute("TransformLink", matrix_to_vec(&self.transform_link)),
            ],
        )
    }

    fn release(&mut self, handle: ObjectHandle) {
        if self.link == Some(handle) {
            self.link = None;
        }
    }
}

// ============================================================================
// BlendShape
// ============================================================================

#[derive(Clone, Debug)]
pub struct BlendShape {
    base: ObjectBase,
}

impl BlendShape {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            base: ObjectBase::new(name),
        }
    }

    pub fn from_element(element: &Element) -> Self {
        Self {
            base: ObjectBase::from_element(element),
        }
    }
}

impl SceneObject for BlendShape {
    impl_object_base!();

    fn class(&self) -> ClassType {
        ClassType::Deformer
    }

    fn object_type(&self) -> ObjectType {
        ObjectType::BlendShape
    }

    fn to_element(&self, options: &WriteOptions) -> Element {
        Element::with_parts(
            self.class().element_name(),
            self.base.header_attributes(self.class(), ObjectType::BlendShape, options),
            vec![
                Element::with_attribute("Version", BLEND_SHAPE_VERSION),
                self.base.properties().to_element(),
            ],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::DVec3;

    #[test]
    fn test_cluster_round_trip() {
        let mut cluster = Cluster::new("bone_cluster");
        cluster.indices = vec![0, 2, 5];
        cluster.weights = vec![1.0, 0.5, 0.25];
        cluster.transform_link = DMat4::from_translation(DVec3::new(0.0, 1.0, 0.0));

        let e = cluster.to_element(&WriteOptions::default());
        assert_eq!(e.name(), "Deformer");
        assert_eq!(e.attributes()[2], Attribute::from("Cluster"));

        let parsed = Cluster::from_element(&e);
        assert_eq!(parsed.indices, cluster.indices);
        assert_eq!(parsed.weights, cluster.weights);
        assert_eq!(parsed.transform, DMat4::IDENTITY);
        assert_eq!(parsed.transform_link, cluster.transform_link);
    }

    #[test]
    fn test_cluster_mismatched_counts_truncate() {
        let e = Element::new("Deformer")
            .child(Element::with_attribute("Indexes", vec![0, 1, 2]))
            .child(Element::with_attribute("Weights", vec![1.0]));
        let cluster = Cluster::from_element(&e);
        assert_eq!(cluster.indices, vec![0]);
        assert_eq!(cluster.weights, vec![1.0]);
    }

    #[test]
    fn test_skin_defaults() {
        let skin = Skin::from_element(&Element::new("Deformer"));
        assert_eq!(skin.deform_accuracy, DEFAULT_DEFORM_ACCURACY);
        assert!(skin.clusters().is_empty());
    }
}
