//! Two-phase scene loading.
//!
//! Phase 1 turns every child of the `Objects` element into an object on its
//! own. Objects only read their own subtree here, so this step may run in
//! parallel. Phase 2 runs once the identifier map is complete: bind poses
//! resolve their node identifiers, then every connection is integrated
//! through the scene's link registry.

use rayon::prelude::*;

use super::Scene;
use crate::core::{
    parse_connections, Connection, IdMap, LoadOptions, ObjectBase, ObjectHandle, ObjectId, ObjectType,
    SceneObject, CONNECTIONS_ELEMENT, ROOT_ID,
};
use crate::objects::{BindPose, BlendShape, Cluster, Geometry, Material, Model, NodeAttribute, Skin, Texture};
use crate::tree::{Attribute, Element};
use crate::util::{Error, Result};

/// Name of the element holding every object.
pub const OBJECTS_ELEMENT: &str = "Objects";

/// Builds an object from its element, given the parsed type string.
/// Returns `None` for types the factory does not handle.
pub type ObjectFactory = fn(&Element, Option<ObjectType>) -> Option<Box<dyn SceneObject>>;

/// Factories keyed by object element name.
const FACTORIES: &[(&str, ObjectFactory)] = &[
    ("Model", model_factory),
    ("NodeAttribute", node_attribute_factory),
    ("Geometry", geometry_factory),
    ("Material", material_factory),
    ("Texture", texture_factory),
    ("Pose", pose_factory),
    ("Deformer", deformer_factory),
];

fn model_factory(element: &Element, object_type: Option<ObjectType>) -> Option<Box<dyn SceneObject>> {
    match object_type? {
        t @ (ObjectType::Null | ObjectType::LimbNode | ObjectType::Mesh) => {
            Some(Box::new(Model::from_element(element, t)))
        }
        _ => None,
    }
}

fn node_attribute_factory(element: &Element, object_type: Option<ObjectType>) -> Option<Box<dyn SceneObject>> {
    match object_type? {
        t @ (ObjectType::Null | ObjectType::LimbNode) => Some(Box::new(NodeAttribute::from_element(element, t))),
        _ => None,
    }
}

fn geometry_factory(element: &Element, object_type: Option<ObjectType>) -> Option<Box<dyn SceneObject>> {
    match object_type? {
        ObjectType::Mesh => Some(Box::new(Geometry::from_element(element))),
        _ => None,
    }
}

fn material_factory(element: &Element, _: Option<ObjectType>) -> Option<Box<dyn SceneObject>> {
    Some(Box::new(Material::from_element(element)))
}

fn texture_factory(element: &Element, _: Option<ObjectType>) -> Option<Box<dyn SceneObject>> {
    Some(Box::new(Texture::from_element(element)))
}

fn pose_factory(element: &Element, object_type: Option<ObjectType>) -> Option<Box<dyn SceneObject>> {
    match object_type? {
        ObjectType::BindPose => Some(Box::new(BindPose::from_element(element))),
        _ => None,
    }
}

fn deformer_factory(element: &Element, object_type: Option<ObjectType>) -> Option<Box<dyn SceneObject>> {
    match object_type? {
        ObjectType::Skin => Some(Box::new(Skin::from_element(element))),
        ObjectType::Cluster => Some(Box::new(Cluster::from_element(element))),
        ObjectType::BlendShape => Some(Box::new(BlendShape::from_element(element))),
        _ => None,
    }
}

/// Phase-1 parse of one object element. Unknown kinds yield `None`.
pub fn parse_object(element: &Element) -> Option<Box<dyn SceneObject>> {
    let (_, factory) = FACTORIES.iter().find(|(name, _)| *name == element.name())?;
    let object_type = element
        .attributes()
        .get(2)
        .and_then(Attribute::as_str)
        .and_then(ObjectType::from_type_name);
    factory(element, object_type)
}

impl Scene {
    /// Build a scene from its `Objects` and `Connections` elements.
    ///
    /// Malformed objects and dangling connections are skipped. The returned
    /// map translates the identifiers found in the file to live handles.
    #[tracing::instrument(
        skip_all,
        fields(objects = objects.children().len(), connections = connections.children().len())
    )]
    pub fn load(objects: &Element, connections: &Element, options: &LoadOptions) -> Result<(Scene, IdMap)> {
        if objects.name() != OBJECTS_ELEMENT {
            return Err(Error::invalid(format!("expected {OBJECTS_ELEMENT}, got {}", objects.name())));
        }
        if connections.name() != CONNECTIONS_ELEMENT {
            return Err(Error::invalid(format!(
                "expected {CONNECTIONS_ELEMENT}, got {}",
                connections.name()
            )));
        }

        // Phase 1: objects on their own.
        let parse = |element: &Element| -> (Option<ObjectId>, Option<Box<dyn SceneObject>>) {
            (ObjectBase::parsed_id(element), parse_object(element))
        };
        let parsed: Vec<_> = if options.parallel {
            objects.children().par_iter().map(parse).collect()
        } else {
            objects.children().iter().map(parse).collect()
        };

        let mut scene = Scene::new();
        let mut ids = IdMap::with_capacity(parsed.len());
        for (element, (id, object)) in objects.children().iter().zip(parsed) {
            let Some(object) = object else {
                tracing::debug!(element = element.name(), "skipping unsupported object");
                continue;
            };
            let handle = scene.insert_boxed(object);
            match id {
                Some(ROOT_ID) | None => tracing::warn!(object = ?handle, "object without a usable identifier"),
                Some(id) => {
                    if ids.insert(id, handle).is_some() {
                        tracing::warn!(id, "duplicate object identifier, later object wins");
                    }
                }
            }
        }

        // Phase 2: identifier-based references.
        for handle in scene.handles().collect::<Vec<_>>() {
            if let Some(object) = scene.object_mut(handle) {
                object.resolve_references(&ids);
            }
        }

        let edges = parse_connections(connections);
        let mut applied = 0usize;
        for connection in &edges {
            if scene.apply_connection(connection, &ids) {
                applied += 1;
            }
        }
        tracing::debug!(objects = scene.len(), applied, total = edges.len(), "scene loaded");
        Ok((scene, ids))
    }

    /// Integrate one parsed connection. Returns whether it took effect.
    fn apply_connection(&mut self, connection: &Connection, ids: &IdMap) -> bool {
        if connection.target == ROOT_ID {
            return false;
        }
        let (Some(&source), Some(&target)) = (ids.get(&connection.source), ids.get(&connection.target)) else {
            tracing::warn!(
                source = connection.source,
                target = connection.target,
                "dropping connection with a missing endpoint"
            );
            return false;
        };
        if source == target {
            tracing::debug!(id = connection.source, "dropping self connection");
            return false;
        }
        match self.link(source, target, connection.property.as_deref()) {
            Ok(linked) => linked,
            Err(err) => {
                tracing::debug!(%err, source = connection.source, target = connection.target, "connection rejected");
                false
            }
        }
    }

    /// Integrate `source` into `target` according to their kinds.
    ///
    /// Returns `Ok(false)` when no handler exists for the pair.
    pub fn link(
        &mut self,
        source: ObjectHandle,
        target: ObjectHandle,
        property: Option<&str>,
    ) -> Result<bool> {
        super::link::check_pair(self, source, target)?;
        let (Some(src), Some(dst)) = (self.object(source), self.object(target)) else {
            return Err(Error::ObjectNotFound(source));
        };
        let Some(handler) = self.links.handler(src.class(), src.object_type(), dst.class()) else {
            tracing::trace!(source = ?src.class(), target = ?dst.class(), "no link handler");
            return Ok(false);
        };
        handler(self, source, target, property)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::WriteOptions;

    #[test]
    fn test_factory_dispatch() {
        let model = Model::new("m", ObjectType::LimbNode).to_element(&WriteOptions::default());
        let parsed = parse_object(&model).unwrap();
        assert_eq!(parsed.object_type(), ObjectType::LimbNode);

        let unknown = Element::new("Video").attribute(1i64).attribute("v").attribute("Clip");
        assert!(parse_object(&unknown).is_none());

        let light = Element::new("NodeAttribute").attribute(1i64).attribute("l").attribute("Light");
        assert!(parse_object(&light).is_none());
    }

    #[test]
    fn test_wrong_root_elements() {
        let err = Scene::load(&Element::new("Connections"), &Element::new("Connections"), &LoadOptions::default());
        assert!(matches!(err, Err(Error::InvalidStructure(_))));
    }
}
