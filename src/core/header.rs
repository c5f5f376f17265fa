//! Object identity: arena handles, wire identifiers and kind tags.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use slotmap::{new_key_type, Key};

new_key_type! {
    /// Arena key of an object inside its scene.
    pub struct ObjectKey;
}

/// Wire identifier of an object, written as a 64-bit integer.
pub type ObjectId = i64;

/// Identifier reserved for the document root in connection lists.
pub const ROOT_ID: ObjectId = 0;

/// Seed mixed into every identifier hash.
const ID_SEED: u64 = 0x46_42_58; // "FBX"

static NEXT_SCENE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a scene.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SceneId(u64);

impl SceneId {
    /// Placeholder for objects not yet inserted into any scene.
    pub const DETACHED: Self = Self(0);

    /// Allocate a fresh scene identity.
    pub fn next() -> Self {
        Self(NEXT_SCENE_ID.fetch_add(1, Ordering::Relaxed))
    }

    #[inline]
    pub fn is_detached(self) -> bool {
        self == Self::DETACHED
    }
}

impl fmt::Debug for SceneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Scene#{}", self.0)
    }
}

/// Copyable, non-owning reference to an object living in a scene arena.
///
/// The handle carries the scene identity so cross-scene misuse can be
/// detected without looking the object up.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectHandle {
    scene: SceneId,
    key: ObjectKey,
}

impl ObjectHandle {
    /// Handle of an object that is not part of any scene yet.
    pub fn detached() -> Self {
        Self {
            scene: SceneId::DETACHED,
            key: ObjectKey::null(),
        }
    }

    pub(crate) fn new(scene: SceneId, key: ObjectKey) -> Self {
        Self { scene, key }
    }

    /// Owning scene.
    #[inline]
    pub fn scene(&self) -> SceneId {
        self.scene
    }

    /// Arena key.
    #[inline]
    pub fn key(&self) -> ObjectKey {
        self.key
    }

    /// True if this handle was never attached to a scene.
    #[inline]
    pub fn is_detached(&self) -> bool {
        self.scene.is_detached() || self.key.is_null()
    }

    /// Stable wire identifier derived from the arena key.
    ///
    /// Always positive and never [`ROOT_ID`].
    pub fn id(&self) -> ObjectId {
        let hash = murmur3::hash_u64(self.key.data().as_ffi(), ID_SEED) & (i64::MAX as u64);
        if hash == 0 {
            1
        } else {
            hash as ObjectId
        }
    }
}

impl fmt::Debug for ObjectHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}/{:?}", self.scene, self.key)
    }
}

/// Class tag: the top-level element name an object is rendered under.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ClassType {
    Model,
    NodeAttribute,
    Geometry,
    Material,
    Texture,
    Pose,
    Deformer,
    SubDeformer,
}

impl ClassType {
    /// Element name used in the `Objects` section.
    pub const fn element_name(self) -> &'static str {
        match self {
            Self::Model => "Model",
            Self::NodeAttribute => "NodeAttribute",
            Self::Geometry => "Geometry",
            Self::Material => "Material",
            Self::Texture => "Texture",
            Self::Pose => "Pose",
            Self::Deformer | Self::SubDeformer => "Deformer",
        }
    }
}

/// Type tag: the concrete kind within a class.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ObjectType {
    Null,
    LimbNode,
    Mesh,
    Material,
    Texture,
    BindPose,
    Skin,
    Cluster,
    BlendShape,
}

impl ObjectType {
    /// Type string written as the third header attribute.
    pub const fn type_name(self) -> &'static str {
        match self {
            Self::Null => "Null",
            Self::LimbNode => "LimbNode",
            Self::Mesh => "Mesh",
            Self::Material | Self::Texture => "",
            Self::BindPose => "BindPose",
            Self::Skin => "Skin",
            Self::Cluster => "Cluster",
            Self::BlendShape => "BlendShape",
        }
    }

    /// Parse the type string of a model or node attribute header.
    pub fn from_type_name(name: &str) -> Option<Self> {
        match name {
            "Null" => Some(Self::Null),
            "LimbNode" => Some(Self::LimbNode),
            "Mesh" => Some(Self::Mesh),
            "BindPose" => Some(Self::BindPose),
            "Skin" => Some(Self::Skin),
            "Cluster" => Some(Self::Cluster),
            "BlendShape" => Some(Self::BlendShape),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    #[test]
    fn test_scene_ids_are_unique() {
        let a = SceneId::next();
        let b = SceneId::next();
        assert_ne!(a, b);
        assert!(!a.is_detached());
        assert!(SceneId::DETACHED.is_detached());
    }

    #[test]
    fn test_handle_ids_stable_and_positive() {
        let mut arena: SlotMap<ObjectKey, ()> = SlotMap::with_key();
        let scene = SceneId::next();
        let a = ObjectHandle::new(scene, arena.insert(()));
        let b = ObjectHandle::new(scene, arena.insert(()));

        assert_eq!(a.id(), a.id());
        assert_ne!(a.id(), b.id());
        assert!(a.id() > 0 && b.id() > 0);
        assert!(ObjectHandle::detached().is_detached());
    }

    #[test]
    fn test_type_names() {
        assert_eq!(ObjectType::from_type_name("LimbNode"), Some(ObjectType::LimbNode));
        assert_eq!(ObjectType::from_type_name("Camera"), None);
        assert_eq!(ClassType::SubDeformer.element_name(), "Deformer");
    }
}
