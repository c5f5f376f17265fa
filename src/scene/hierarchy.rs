//! Two-sided mutation: parent/child links, attachments and transforms.
//!
//! Every operation validates all of its inputs before touching either side,
//! so a failed call leaves the scene unchanged.

use super::link::check_pair;
use super::Scene;
use crate::core::{ObjectHandle, ObjectType, SceneObject};
use crate::objects::{BlendShape, Cluster, Geometry, Material, Model, NodeAttribute, Skin, Texture};
use crate::util::{DMat4, Error, Result};

impl Scene {
    // ========================================================================
    // Hierarchy
    // ========================================================================

    pub fn parent(&self, model: ObjectHandle) -> Option<ObjectHandle> {
        self.get::<Model>(model).and_then(Model::parent)
    }

    pub fn children(&self, model: ObjectHandle) -> &[ObjectHandle] {
        self.get::<Model>(model).map(Model::children).unwrap_or_default()
    }

    /// True if `ancestor` is found walking up from `node`'s parent.
    pub fn is_ancestor(&self, ancestor: ObjectHandle, node: ObjectHandle) -> bool {
        let mut current = self.parent(node);
        while let Some(p) = current {
            if p == ancestor {
                return true;
            }
            current = self.parent(p);
        }
        false
    }

    /// Append `child` to `parent`'s children.
    pub fn add_child(&mut self, parent: ObjectHandle, child: ObjectHandle) -> Result<()> {
        let count = self.try_get::<Model>(parent)?.children().len();
        self.add_child_at(parent, child, count)
    }

    /// Insert `child` at `index` (`0..=count`).
    ///
    /// A child with another parent is detached first. Re-adding an existing
    /// child moves it instead of duplicating it.
    pub fn add_child_at(&mut self, parent: ObjectHandle, child: ObjectHandle, index: usize) -> Result<()> {
        check_pair(self, child, parent)?;
        let count = self.try_get::<Model>(parent)?.children().len();
        let old_parent = self.try_get::<Model>(child)?.parent();
        if index > count {
            return Err(Error::out_of_range(index, count));
        }
        if self.is_ancestor(child, parent) {
            return Err(Error::invalid("cannot parent a model under its own descendant"));
        }

        if let Some(old) = old_parent {
            if let Some(model) = self.get_mut::<Model>(old) {
                model.remove_child_entry(child);
            }
        }
        let parent_model = self.try_get_mut::<Model>(parent)?;
        let index = index.min(parent_model.children().len());
        parent_model.insert_child(index, child);
        self.try_get_mut::<Model>(child)?.set_parent(Some(parent));
        Ok(())
    }

    /// Remove `child` from `parent`. Returns false if it was not a child.
    pub fn remove_child(&mut self, parent: ObjectHandle, child: ObjectHandle) -> Result<bool> {
        if child.scene() != self.id() {
            return Err(Error::CrossScene(child));
        }
        if !self.try_get_mut::<Model>(parent)?.remove_child_entry(child) {
            return Ok(false);
        }
        if let Some(model) = self.get_mut::<Model>(child) {
            model.set_parent(None);
        }
        Ok(true)
    }

    pub fn remove_child_at(&mut self, parent: ObjectHandle, index: usize) -> Result<ObjectHandle> {
        let children = self.try_get::<Model>(parent)?.children();
        let child = *children
            .get(index)
            .ok_or(Error::out_of_range(index, children.len()))?;
        self.remove_child(parent, child)?;
        Ok(child)
    }

    /// Clear both sides of `model`'s parent link.
    pub fn detach_from_parent(&mut self, model: ObjectHandle) -> Result<()> {
        let Some(parent) = self.try_get::<Model>(model)?.parent() else {
            return Ok(());
        };
        if let Some(p) = self.get_mut::<Model>(parent) {
            p.remove_child_entry(model);
        }
        self.try_get_mut::<Model>(model)?.set_parent(None);
        Ok(())
    }

    /// Make every child of `model` parentless.
    pub fn detach_all_children(&mut self, model: ObjectHandle) -> Result<()> {
        let children = self.try_get_mut::<Model>(model)?.take_children();
        for child in children {
            if let Some(c) = self.get_mut::<Model>(child) {
                c.set_parent(None);
            }
        }
        Ok(())
    }

    // ========================================================================
    // Transforms
    // ========================================================================

    pub fn local_transform(&self, model: ObjectHandle) -> Result<DMat4> {
        Ok(self.try_get::<Model>(model)?.local_transform())
    }

    /// Model-to-world transform, recomputed along the full ancestor chain on
    /// every call.
    pub fn global_transform(&self, model: ObjectHandle) -> Result<DMat4> {
        let node = self.try_get::<Model>(model)?;
        let mut world = node.local_transform();
        let mut current = node.parent();
        while let Some(handle) = current {
            let ancestor = self.try_get::<Model>(handle)?;
            world = ancestor.local_transform() * world;
            current = ancestor.parent();
        }
        Ok(world)
    }

    // ========================================================================
    // Attachments
    // ========================================================================

    pub fn node_attribute(&self, model: ObjectHandle) -> Result<Option<ObjectHandle>> {
        self.try_get::<Model>(model)?.attribute()
    }

    /// Attach (or clear with `None`) the node attribute of a `Null` or
    /// `LimbNode` model. The attribute type must match the model type.
    pub fn set_node_attribute(&mut self, model: ObjectHandle, attribute: Option<ObjectHandle>) -> Result<()> {
        let target = self.try_get::<Model>(model)?;
        let model_type = target.object_type();
        if !target.supports_attribute() {
            return Err(Error::AttributesNotSupported(model_type));
        }
        if let Some(handle) = attribute {
            let attribute_type = self.try_get::<NodeAttribute>(handle)?.object_type();
            if attribute_type != model_type {
                return Err(Error::AttributeTypeMismatch {
                    model: model_type,
                    attribute: attribute_type,
                });
            }
        }
        self.try_get_mut::<Model>(model)?.set_attribute_unchecked(attribute);
        Ok(())
    }

    /// Attach (or clear) the geometry of a mesh model.
    pub fn set_geometry(&mut self, model: ObjectHandle, geometry: Option<ObjectHandle>) -> Result<()> {
        self.mesh_model(model)?;
        if let Some(handle) = geometry {
            self.try_get::<Geometry>(handle)?;
        }
        self.try_get_mut::<Model>(model)?.set_geometry_unchecked(geometry);
        Ok(())
    }

    /// Append a material to a mesh model. Already present materials are kept
    /// in place.
    pub fn add_material(&mut self, model: ObjectHandle, material: ObjectHandle) -> Result<()> {
        self.mesh_model(model)?;
        self.try_get::<Material>(material)?;
        self.try_get_mut::<Model>(model)?.push_material(material);
        Ok(())
    }

    fn mesh_model(&self, model: ObjectHandle) -> Result<&Model> {
        let target = self.try_get::<Model>(model)?;
        if target.object_type() != ObjectType::Mesh {
            return Err(Error::WrongKind {
                expected: "Mesh model",
                actual: format!("{:?} model", target.object_type()),
            });
        }
        Ok(target)
    }

    /// Bind a texture to a named material channel.
    pub fn add_texture_channel(&mut self, material: ObjectHandle, name: &str, texture: ObjectHandle) -> Result<()> {
        check_pair(self, texture, material)?;
        if self.get::<Texture>(texture).is_none() {
            return Err(Error::MissingTexture(name.to_string()));
        }
        self.try_get_mut::<Material>(material)?.push_channel(name, texture);
        Ok(())
    }

    // ========================================================================
    // Deformers
    // ========================================================================

    pub fn add_skin(&mut self, geometry: ObjectHandle, skin: ObjectHandle) -> Result<()> {
        check_pair(self, skin, geometry)?;
        self.try_get::<Skin>(skin)?;
        self.try_get_mut::<Geometry>(geometry)?.add_skin(skin)
    }

    pub fn add_blend_shape(&mut self, geometry: ObjectHandle, blend_shape: ObjectHandle) -> Result<()> {
        check_pair(self, blend_shape, geometry)?;
        self.try_get::<BlendShape>(blend_shape)?;
        self.try_get_mut::<Geometry>(geometry)?.add_blend_shape(blend_shape)
    }

    pub fn add_cluster(&mut self, skin: ObjectHandle, cluster: ObjectHandle) -> Result<()> {
        check_pair(self, cluster, skin)?;
        self.try_get::<Cluster>(cluster)?;
        self.try_get_mut::<Skin>(skin)?.push_cluster(cluster);
        Ok(())
    }

    /// Set the model that drives a cluster.
    pub fn set_cluster_link(&mut self, cluster: ObjectHandle, model: Option<ObjectHandle>) -> Result<()> {
        if let Some(handle) = model {
            check_pair(self, handle, cluster)?;
            self.try_get::<Model>(handle)?;
        }
        self.try_get_mut::<Cluster>(cluster)?.set_link_unchecked(model);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::DVec3;

    fn two_nulls() -> (Scene, ObjectHandle, ObjectHandle) {
        let mut scene = Scene::new();
        let a = scene.create_model("a", ObjectType::Null).unwrap();
        let b = scene.create_model("b", ObjectType::Null).unwrap();
        (scene, a, b)
    }

    #[test]
    fn test_add_child_sets_both_sides() {
        let (mut scene, a, b) = two_nulls();
        scene.add_child(a, b).unwrap();
        assert_eq!(scene.parent(b), Some(a));
        assert_eq!(scene.children(a), &[b]);

        scene.add_child(a, b).unwrap();
        assert_eq!(scene.children(a), &[b]);
    }

    #[test]
    fn test_self_parenting_rejected() {
        let (mut scene, a, _) = two_nulls();
        assert_eq!(scene.add_child(a, a), Err(Error::SelfReference));
        assert!(scene.children(a).is_empty());
    }

    #[test]
    fn test_cycle_rejected() {
        let (mut scene, a, b) = two_nulls();
        scene.add_child(a, b).unwrap();
        assert!(scene.add_child(b, a).is_err());
        assert_eq!(scene.parent(a), None);
    }

    #[test]
    fn test_reparent_detaches_first() {
        let (mut scene, a, b) = two_nulls();
        let c = scene.create_model("c", ObjectType::Null).unwrap();
        scene.add_child(a, c).unwrap();
        scene.add_child(b, c).unwrap();
        assert!(scene.children(a).is_empty());
        assert_eq!(scene.children(b), &[c]);
        assert_eq!(scene.parent(c), Some(b));
    }

    #[test]
    fn test_positional_bounds() {
        let (mut scene, a, b) = two_nulls();
        assert_eq!(scene.add_child_at(a, b, 1), Err(Error::out_of_range(1, 0)));
        assert_eq!(scene.parent(b), None);
        scene.add_child_at(a, b, 0).unwrap();
        assert_eq!(scene.remove_child_at(a, 3), Err(Error::out_of_range(3, 1)));
        assert_eq!(scene.remove_child_at(a, 0), Ok(b));
        assert_eq!(scene.parent(b), None);
    }

    #[test]
    fn test_cross_scene_child() {
        let (mut scene, a, _) = two_nulls();
        let (_other, foreign, _) = two_nulls();
        assert_eq!(scene.add_child(a, foreign), Err(Error::CrossScene(foreign)));
    }

    #[test]
    fn test_destroy_orphans_children() {
        let (mut scene, a, b) = two_nulls();
        let root = scene.create_model("root", ObjectType::Null).unwrap();
        scene.add_child(root, a).unwrap();
        scene.add_child(a, b).unwrap();
        scene.destroy(a).unwrap();
        assert_eq!(scene.parent(b), None);
        assert!(scene.children(root).is_empty());
        assert!(scene.contains(b));
    }

    #[test]
    fn test_global_transform_composes_parents() {
        let (mut scene, a, b) = two_nulls();
        scene.add_child(a, b).unwrap();
        scene
            .get_mut::<Model>(a)
            .unwrap()
            .set_local_translation(Some(DVec3::new(1.0, 0.0, 0.0)));
        scene
            .get_mut::<Model>(b)
            .unwrap()
            .set_local_translation(Some(DVec3::new(0.0, 2.0, 0.0)));

        let world = scene.global_transform(b).unwrap();
        assert_eq!(world.transform_point3(DVec3::ZERO), DVec3::new(1.0, 2.0, 0.0));
    }

    #[test]
    fn test_node_attribute_rules() {
        let mut scene = Scene::new();
        let null = scene.create_model("n", ObjectType::Null).unwrap();
        let mesh = scene.create_model("m", ObjectType::Mesh).unwrap();
        let limb_attr = scene.create_node_attribute("l", ObjectType::LimbNode).unwrap();
        let null_attr = scene.create_node_attribute("n", ObjectType::Null).unwrap();

        assert_eq!(
            scene.set_node_attribute(null, Some(limb_attr)),
            Err(Error::AttributeTypeMismatch {
                model: ObjectType::Null,
                attribute: ObjectType::LimbNode
            })
        );
        assert_eq!(
            scene.set_node_attribute(mesh, Some(null_attr)),
            Err(Error::AttributesNotSupported(ObjectType::Mesh))
        );
        scene.set_node_attribute(null, Some(null_attr)).unwrap();
        assert_eq!(scene.node_attribute(null), Ok(Some(null_attr)));
    }

    #[test]
    fn test_deformer_kind_checked() {
        let mut scene = Scene::new();
        let geometry = scene.geometry_builder("g").build();
        let blend_shape = scene.create_blend_shape("b");
        assert!(scene.add_skin(geometry, blend_shape).is_err());
        scene.add_blend_shape(geometry, blend_shape).unwrap();
        assert_eq!(scene.get::<Geometry>(geometry).unwrap().blend_shapes(), &[blend_shape]);
    }
}
