//! Connection integration keyed by the kinds of both endpoints.
//!
//! Every connection names a source and a target object. Integrating it is a
//! two-sided decision: what happens depends on the kind of the source *and*
//! the kind of the target. Handlers are registered per pair, so supporting a
//! new object kind means registering new handlers rather than editing the
//! existing ones. Pairs without a handler are ignored.

use std::collections::HashMap;
use std::fmt;

use super::Scene;
use crate::core::{ClassType, ObjectHandle, ObjectType};
use crate::objects::{Cluster, Geometry, Model, Skin};
use crate::util::{Error, Result};

/// Integrates `source` into `target`. The property name is set for
/// object-property connections.
pub type LinkHandler = fn(&mut Scene, ObjectHandle, ObjectHandle, Option<&str>) -> Result<()>;

/// Endpoint kinds a handler is registered for.
///
/// `source_type: None` matches any source of the class.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LinkKey {
    pub source: ClassType,
    pub source_type: Option<ObjectType>,
    pub target: ClassType,
}

impl LinkKey {
    pub const fn new(source: ClassType, target: ClassType) -> Self {
        Self {
            source,
            source_type: None,
            target,
        }
    }

    pub const fn typed(source: ClassType, source_type: ObjectType, target: ClassType) -> Self {
        Self {
            source,
            source_type: Some(source_type),
            target,
        }
    }
}

/// Table of link handlers.
#[derive(Clone)]
pub struct LinkRegistry {
    handlers: HashMap<LinkKey, LinkHandler>,
}

impl fmt::Debug for LinkRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.handlers.keys()).finish()
    }
}

impl Default for LinkRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl LinkRegistry {
    /// Registry without any handler.
    pub fn empty() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Registry with handlers for every built-in object kind.
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry.register(LinkKey::new(ClassType::Model, ClassType::Model), link_child);
        registry.register(LinkKey::new(ClassType::NodeAttribute, ClassType::Model), link_attribute);
        registry.register(LinkKey::new(ClassType::Geometry, ClassType::Model), link_geometry);
        registry.register(LinkKey::new(ClassType::Material, ClassType::Model), link_material);
        registry.register(
            LinkKey::typed(ClassType::Deformer, ObjectType::Skin, ClassType::Geometry),
            link_skin,
        );
        registry.register(
            LinkKey::typed(ClassType::Deformer, ObjectType::BlendShape, ClassType::Geometry),
            link_blend_shape,
        );
        registry.register(
            LinkKey::typed(ClassType::SubDeformer, ObjectType::Cluster, ClassType::Deformer),
            link_cluster,
        );
        registry.register(LinkKey::new(ClassType::Model, ClassType::SubDeformer), link_cluster_model);
        registry.register(LinkKey::new(ClassType::Texture, ClassType::Material), link_texture);
        registry
    }

    /// Add or replace the handler for a pair of kinds.
    pub fn register(&mut self, key: LinkKey, handler: LinkHandler) -> Option<LinkHandler> {
        self.handlers.insert(key, handler)
    }

    /// Handler for the given endpoint kinds; type-specific entries win.
    pub fn handler(&self, source: ClassType, source_type: ObjectType, target: ClassType) -> Option<LinkHandler> {
        self.handlers
            .get(&LinkKey::typed(source, source_type, target))
            .or_else(|| self.handlers.get(&LinkKey::new(source, target)))
            .copied()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

// ============================================================================
// Built-in handlers
// ============================================================================

fn link_child(scene: &mut Scene, source: ObjectHandle, target: ObjectHandle, _: Option<&str>) -> Result<()> {
    let index = scene.try_get::<Model>(target)?.children().len();
    scene.add_child_at(target, source, index)
}

fn link_attribute(scene: &mut Scene, source: ObjectHandle, target: ObjectHandle, _: Option<&str>) -> Result<()> {
    scene.set_node_attribute(target, Some(source))
}

fn link_geometry(scene: &mut Scene, source: ObjectHandle, target: ObjectHandle, _: Option<&str>) -> Result<()> {
    scene.set_geometry(target, Some(source))
}

fn link_material(scene: &mut Scene, source: ObjectHandle, target: ObjectHandle, _: Option<&str>) -> Result<()> {
    scene.add_material(target, source)
}

fn link_skin(scene: &mut Scene, source: ObjectHandle, target: ObjectHandle, _: Option<&str>) -> Result<()> {
    scene.try_get_mut::<Geometry>(target)?.push_skin(source);
    Ok(())
}

fn link_blend_shape(scene: &mut Scene, source: ObjectHandle, target: ObjectHandle, _: Option<&str>) -> Result<()> {
    scene.try_get_mut::<Geometry>(target)?.push_blend_shape(source);
    Ok(())
}

fn link_cluster(scene: &mut Scene, source: ObjectHandle, target: ObjectHandle, _: Option<&str>) -> Result<()> {
    scene.try_get_mut::<Skin>(target)?.push_cluster(source);
    Ok(())
}

fn link_cluster_model(scene: &mut Scene, source: ObjectHandle, target: ObjectHandle, _: Option<&str>) -> Result<()> {
    scene.try_get_mut::<Cluster>(target)?.set_link_unchecked(Some(source));
    Ok(())
}

fn link_texture(scene: &mut Scene, source: ObjectHandle, target: ObjectHandle, property: Option<&str>) -> Result<()> {
    scene.add_texture_channel(target, property.unwrap_or_default(), source)
}

/// Checks shared by every attach operation: both handles live in `scene`
/// and are distinct.
pub(super) fn check_pair(scene: &Scene, source: ObjectHandle, target: ObjectHandle) -> Result<()> {
    for handle in [target, source] {
        if handle.scene() != scene.id() {
            return Err(Error::CrossScene(handle));
        }
        if !scene.contains(handle) {
            return Err(Error::ObjectNotFound(handle));
        }
    }
    if source == target {
        return Err(Error::SelfReference);
    }
    Ok(())
}
