//! Scene arena: owns every object and mediates all cross-object mutation.
//!
//! Objects reference each other through [`ObjectHandle`]s. A handle stays
//! valid until the object is destroyed through [`Scene::destroy`], which also
//! removes every reference other objects hold to it.
//!
//! # Example
//!
//! ```ignore
//! use fbx::prelude::*;
//!
//! let mut scene = Scene::new();
//! let root = scene.create_model("Root", ObjectType::Null)?;
//! let arm = scene.create_model("Arm", ObjectType::Null)?;
//! scene.add_child(root, arm)?;
//! let world = scene.global_transform(arm)?;
//! ```

mod hierarchy;
mod link;
mod loader;
mod writer;

pub use link::{LinkHandler, LinkKey, LinkRegistry};
pub use loader::{parse_object, ObjectFactory, OBJECTS_ELEMENT};

use slotmap::SlotMap;

use crate::core::{ObjectHandle, ObjectKey, ObjectType, SceneId, SceneObject};
use crate::objects::{
    BindPose, BlendShape, Cluster, GeometryBuilder, Material, MaterialBuilder, Model, NodeAttribute,
    Skin, Texture,
};
use crate::util::{Error, Result};

/// Container and owner of a connected object graph.
pub struct Scene {
    id: SceneId,
    objects: SlotMap<ObjectKey, Box<dyn SceneObject>>,
    /// Insertion order, used when writing.
    order: Vec<ObjectKey>,
    links: LinkRegistry,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Scene {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scene")
            .field("id", &self.id)
            .field("objects", &self.objects.len())
            .finish()
    }
}

/// Short type name for error messages.
fn short_type_name<T>() -> &'static str {
    let full = std::any::type_name::<T>();
    full.rsplit("::").next().unwrap_or(full)
}

impl Scene {
    /// Empty scene with the built-in link handlers.
    pub fn new() -> Self {
        Self::with_links(LinkRegistry::with_defaults())
    }

    /// Empty scene with a custom link registry.
    pub fn with_links(links: LinkRegistry) -> Self {
        Self {
            id: SceneId::next(),
            objects: SlotMap::with_key(),
            order: Vec::new(),
            links,
        }
    }

    #[inline]
    pub fn id(&self) -> SceneId {
        self.id
    }

    pub fn links(&self) -> &LinkRegistry {
        &self.links
    }

    pub fn links_mut(&mut self) -> &mut LinkRegistry {
        &mut self.links
    }

    // ========================================================================
    // Storage
    // ========================================================================

    /// Take ownership of an object and return its handle.
    pub fn insert<T: SceneObject>(&mut self, object: T) -> ObjectHandle {
        self.insert_boxed(Box::new(object))
    }

    pub(crate) fn insert_boxed(&mut self, mut object: Box<dyn SceneObject>) -> ObjectHandle {
        let scene = self.id;
        let key = self.objects.insert_with_key(|key| {
            object.base_mut().attach(ObjectHandle::new(scene, key));
            object
        });
        self.order.push(key);
        ObjectHandle::new(scene, key)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// True if `handle` refers to a live object of this scene.
    pub fn contains(&self, handle: ObjectHandle) -> bool {
        handle.scene() == self.id && self.objects.contains_key(handle.key())
    }

    pub fn object(&self, handle: ObjectHandle) -> Option<&dyn SceneObject> {
        if handle.scene() != self.id {
            return None;
        }
        self.objects.get(handle.key()).map(|o| o.as_ref())
    }

    pub fn object_mut(&mut self, handle: ObjectHandle) -> Option<&mut dyn SceneObject> {
        if handle.scene() != self.id {
            return None;
        }
        self.objects.get_mut(handle.key()).map(|o| o.as_mut())
    }

    /// Typed access; `None` for stale handles and objects of another kind.
    pub fn get<T: SceneObject>(&self, handle: ObjectHandle) -> Option<&T> {
        self.object(handle)?.downcast_ref::<T>()
    }

    pub fn get_mut<T: SceneObject>(&mut self, handle: ObjectHandle) -> Option<&mut T> {
        self.object_mut(handle)?.downcast_mut::<T>()
    }

    /// Typed access reporting why the lookup failed.
    pub fn try_get<T: SceneObject>(&self, handle: ObjectHandle) -> Result<&T> {
        if handle.scene() != self.id {
            return Err(Error::CrossScene(handle));
        }
        let object = self.object(handle).ok_or(Error::ObjectNotFound(handle))?;
        object.downcast_ref::<T>().ok_or_else(|| Error::WrongKind {
            expected: short_type_name::<T>(),
            actual: object.kind_name(),
        })
    }

    pub fn try_get_mut<T: SceneObject>(&mut self, handle: ObjectHandle) -> Result<&mut T> {
        if handle.scene() != self.id {
            return Err(Error::CrossScene(handle));
        }
        let object = self.object_mut(handle).ok_or(Error::ObjectNotFound(handle))?;
        if !object.as_any().is::<T>() {
            return Err(Error::WrongKind {
                expected: short_type_name::<T>(),
                actual: object.kind_name(),
            });
        }
        object.downcast_mut::<T>().ok_or(Error::ObjectNotFound(handle))
    }

    /// Objects in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &dyn SceneObject> + '_ {
        self.order
            .iter()
            .filter_map(|&key| self.objects.get(key))
            .map(|o| o.as_ref())
    }

    /// Handles in insertion order.
    pub fn handles(&self) -> impl Iterator<Item = ObjectHandle> + '_ {
        self.order.iter().map(|&key| ObjectHandle::new(self.id, key))
    }

    /// Handles of every object of type `T`, in insertion order.
    pub fn handles_of<T: SceneObject>(&self) -> impl Iterator<Item = ObjectHandle> + '_ {
        self.iter()
            .filter(|o| o.as_any().is::<T>())
            .map(|o| o.handle())
    }

    /// First object with the given name.
    pub fn find_by_name(&self, name: &str) -> Option<ObjectHandle> {
        self.iter().find(|o| o.name() == name).map(|o| o.handle())
    }

    /// Destroy an object and drop every reference to it.
    ///
    /// Children of a destroyed model become parentless; they are not
    /// destroyed with it.
    pub fn destroy(&mut self, handle: ObjectHandle) -> Result<()> {
        if handle.scene() != self.id {
            return Err(Error::CrossScene(handle));
        }
        if !self.objects.contains_key(handle.key()) {
            return Err(Error::ObjectNotFound(handle));
        }
        if self.get::<Model>(handle).is_some() {
            self.detach_all_children(handle)?;
            self.detach_from_parent(handle)?;
        }

        self.objects.remove(handle.key());
        self.order.retain(|&key| key != handle.key());
        for object in self.objects.values_mut() {
            object.release(handle);
        }
        tracing::debug!(object = ?handle, "destroyed");
        Ok(())
    }

    // ========================================================================
    // Creation
    // ========================================================================

    /// Create a `Null`, `LimbNode` or `Mesh` model.
    pub fn create_model(&mut self, name: impl Into<String>, model_type: ObjectType) -> Result<ObjectHandle> {
        match model_type {
            ObjectType::Null | ObjectType::LimbNode | ObjectType::Mesh => {
                Ok(self.insert(Model::new(name, model_type)))
            }
            other => Err(Error::WrongKind {
                expected: "Null, LimbNode or Mesh",
                actual: format!("{other:?}"),
            }),
        }
    }

    /// Create a `Null` or `LimbNode` node attribute.
    pub fn create_node_attribute(
        &mut self,
        name: impl Into<String>,
        attribute_type: ObjectType,
    ) -> Result<ObjectHandle> {
        match attribute_type {
            ObjectType::Null | ObjectType::LimbNode => Ok(self.insert(NodeAttribute::new(name, attribute_type))),
            other => Err(Error::WrongKind {
                expected: "Null or LimbNode",
                actual: format!("{other:?}"),
            }),
        }
    }

    pub fn create_texture(&mut self, name: impl Into<String>, file_name: impl Into<String>) -> ObjectHandle {
        self.insert(Texture::new(name, file_name))
    }

    pub fn create_material(&mut self, name: impl Into<String>) -> ObjectHandle {
        self.insert(Material::new(name))
    }

    pub fn create_skin(&mut self, name: impl Into<String>) -> ObjectHandle {
        self.insert(Skin::new(name))
    }

    pub fn create_cluster(&mut self, name: impl Into<String>) -> ObjectHandle {
        self.insert(Cluster::new(name))
    }

    pub fn create_blend_shape(&mut self, name: impl Into<String>) -> ObjectHandle {
        self.insert(BlendShape::new(name))
    }

    pub fn create_bind_pose(&mut self, name: impl Into<String>) -> ObjectHandle {
        self.insert(BindPose::new(name))
    }

    pub fn geometry_builder(&mut self, name: impl Into<String>) -> GeometryBuilder<'_> {
        GeometryBuilder::new(self, name)
    }

    pub fn material_builder(&mut self, name: impl Into<String>) -> MaterialBuilder<'_> {
        MaterialBuilder::new(self, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ClassType;

    #[test]
    fn test_insert_attaches_handle() {
        let mut scene = Scene::new();
        let handle = scene.create_texture("t", "t.png");
        let object = scene.object(handle).unwrap();
        assert_eq!(object.handle(), handle);
        assert_eq!(object.class(), ClassType::Texture);
        assert!(scene.contains(handle));
        assert_eq!(scene.find_by_name("t"), Some(handle));
    }

    #[test]
    fn test_typed_access_errors() {
        let mut scene = Scene::new();
        let texture = scene.create_texture("t", "t.png");
        assert!(scene.get::<Model>(texture).is_none());
        assert!(matches!(scene.try_get::<Model>(texture), Err(Error::WrongKind { expected: "Model", .. })));

        let other = Scene::new();
        assert_eq!(other.try_get::<Texture>(texture).err(), Some(Error::CrossScene(texture)));
    }

    #[test]
    fn test_create_model_rejects_other_kinds() {
        let mut scene = Scene::new();
        assert!(scene.create_model("m", ObjectType::Skin).is_err());
        assert!(scene.create_node_attribute("a", ObjectType::Mesh).is_err());
        assert!(scene.is_empty());
    }

    #[test]
    fn test_destroy_releases_references() {
        let mut scene = Scene::new();
        let texture = scene.create_texture("t", "t.png");
        let material = scene.material_builder("m").with_channel("DiffuseColor", texture).unwrap().build();
        scene.destroy(texture).unwrap();

        assert!(!scene.contains(texture));
        assert!(scene.get::<Material>(material).unwrap().channels().is_empty());
        assert_eq!(scene.destroy(texture), Err(Error::ObjectNotFound(texture)));
    }

    #[test]
    fn test_ids_unique_within_scene() {
        let mut scene = Scene::new();
        let ids: std::collections::HashSet<_> =
            (0..64).map(|i| scene.create_skin(format!("s{i}")).id()).collect();
        assert_eq!(ids.len(), 64);
    }
}
