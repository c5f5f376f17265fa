//! Common object identity, naming and property plumbing.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;

use super::{
    ClassType, Connection, ObjectHandle, ObjectId, ObjectType, Property, PropertyBag,
    PropertyFlags, PropertyValue, SceneId, WriteOptions,
};
use crate::tree::{Attribute, Element};
use crate::util::DVec3;

/// Separator between name and class in the binary header encoding.
const BINARY_NAME_SEPARATOR: &str = "\u{0}\u{1}";
/// Separator between class and name in the text header encoding.
const TEXT_NAME_SEPARATOR: &str = "::";

/// Map from parsed wire identifiers to live objects, complete before phase 2.
pub type IdMap = HashMap<ObjectId, ObjectHandle>;

/// State shared by every scene object.
#[derive(Clone, Debug)]
pub struct ObjectBase {
    handle: ObjectHandle,
    name: String,
    properties: PropertyBag,
}

impl ObjectBase {
    /// Base for an object created through the authoring API.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            handle: ObjectHandle::detached(),
            name: name.into(),
            properties: PropertyBag::new(),
        }
    }

    /// Base parsed from an object element: header name plus property block.
    pub fn from_element(element: &Element) -> Self {
        let name = element
            .attributes()
            .get(1)
            .and_then(Attribute::as_str)
            .map(split_header_name)
            .unwrap_or_default();
        Self {
            handle: ObjectHandle::detached(),
            name: name.to_string(),
            properties: PropertyBag::from_object_element(element),
        }
    }

    /// Wire identifier an element was written with, if any.
    pub fn parsed_id(element: &Element) -> Option<ObjectId> {
        element.first_attribute().and_then(Attribute::as_i64)
    }

    pub(crate) fn attach(&mut self, handle: ObjectHandle) {
        self.handle = handle;
    }

    #[inline]
    pub fn handle(&self) -> ObjectHandle {
        self.handle
    }

    /// Wire identifier of this object.
    #[inline]
    pub fn id(&self) -> ObjectId {
        self.handle.id()
    }

    #[inline]
    pub fn scene(&self) -> SceneId {
        self.handle.scene()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn properties(&self) -> &PropertyBag {
        &self.properties
    }

    pub fn properties_mut(&mut self) -> &mut PropertyBag {
        &mut self.properties
    }

    /// The `[id, name, type]` attribute triple of an object element.
    pub fn header_attributes(
        &self,
        class: ClassType,
        object_type: ObjectType,
        options: &WriteOptions,
    ) -> [Attribute; 3] {
        let class_name = class.element_name();
        let name = if options.binary {
            format!("{}{BINARY_NAME_SEPARATOR}{class_name}", self.name)
        } else {
            format!("{class_name}{TEXT_NAME_SEPARATOR}{}", self.name)
        };
        [
            Attribute::Int64(self.id()),
            Attribute::String(name),
            Attribute::String(object_type.type_name().to_string()),
        ]
    }

    // === Typed property access ===

    pub fn vec3_property(&self, name: &str) -> Option<DVec3> {
        self.properties.value(name).and_then(PropertyValue::as_vec3)
    }

    pub fn f64_property(&self, name: &str) -> Option<f64> {
        self.properties.value(name).and_then(PropertyValue::as_f64)
    }

    pub fn i32_property(&self, name: &str) -> Option<i32> {
        self.properties.value(name).and_then(PropertyValue::as_i32)
    }

    pub fn bool_property(&self, name: &str) -> Option<bool> {
        self.properties.value(name).and_then(PropertyValue::as_bool)
    }

    /// Set or clear (`None`) a property, keeping its declared schema if present.
    pub fn set_property(
        &mut self,
        name: &str,
        type_name: &str,
        label: &str,
        flags: PropertyFlags,
        value: Option<PropertyValue>,
    ) {
        match value {
            Some(value) => self.properties.set_value(name, type_name, label, flags, value),
            None => {
                self.properties.remove(name);
            }
        }
    }

    /// Insert a complete property entry.
    pub fn add_property(&mut self, property: Property) {
        self.properties.set(property);
    }
}

/// Strip the class part from a header name in either encoding.
fn split_header_name(raw: &str) -> &str {
    if let Some((name, _class)) = raw.split_once(BINARY_NAME_SEPARATOR) {
        name
    } else if let Some((_class, name)) = raw.split_once(TEXT_NAME_SEPARATOR) {
        name
    } else {
        raw
    }
}

/// Interface implemented by every object kind stored in a scene.
///
/// Objects render themselves to elements and enumerate the edges that point
/// at them (children, attributes, deformers, textures). Integrating an incoming edge is handled by the scene's
/// link registry, which may need to touch both endpoints.
pub trait SceneObject: Any + Send + Sync + fmt::Debug {
    fn base(&self) -> &ObjectBase;

    fn base_mut(&mut self) -> &mut ObjectBase;

    fn class(&self) -> ClassType;

    fn object_type(&self) -> ObjectType;

    /// Edges owned by this object. It is the target endpoint of each.
    fn connections(&self) -> Vec<Connection> {
        Vec::new()
    }

    /// Render this object as one top-level element.
    fn to_element(&self, options: &WriteOptions) -> Element;

    /// Phase-2 hook for identifiers held outside the connection list.
    fn resolve_references(&mut self, _ids: &IdMap) {}

    /// Drop every reference this object holds to `handle`.
    fn release(&mut self, _handle: ObjectHandle) {}

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl dyn SceneObject {
    pub fn downcast_ref<T: SceneObject>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    pub fn downcast_mut<T: SceneObject>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut::<T>()
    }

    pub fn handle(&self) -> ObjectHandle {
        self.base().handle()
    }

    pub fn name(&self) -> &str {
        self.base().name()
    }

    /// Short description used in error messages.
    pub fn kind_name(&self) -> String {
        format!("{:?}/{:?}", self.class(), self.object_type())
    }
}

/// Implements the boilerplate accessors of [`SceneObject`].
macro_rules! impl_object_base {
    () => {
        fn base(&self) -> &$crate::core::ObjectBase {
            &self.base
        }

        fn base_mut(&mut self) -> &mut $crate::core::ObjectBase {
            &mut self.base
        }

        fn as_any(&self) -> &dyn ::std::any::Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn ::std::any::Any {
            self
        }
    };
}
pub(crate) use impl_object_base;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_name_encodings() {
        assert_eq!(split_header_name("Cube\u{0}\u{1}Model"), "Cube");
        assert_eq!(split_header_name("Model::Cube"), "Cube");
        assert_eq!(split_header_name("Cube"), "Cube");
    }

    #[test]
    fn test_header_attributes() {
        let base = ObjectBase::new("Cube");
        let binary = base.header_attributes(ClassType::Model, ObjectType::Mesh, &WriteOptions::default());
        assert_eq!(binary[1], Attribute::from("Cube\u{0}\u{1}Model"));
        assert_eq!(binary[2], Attribute::from("Mesh"));

        let text = base.header_attributes(ClassType::Model, ObjectType::Mesh, &WriteOptions::text());
        assert_eq!(text[1], Attribute::from("Model::Cube"));
    }

    #[test]
    fn test_from_element() {
        let element = Element::new("Model")
            .attribute(42i64)
            .attribute("Model::Root")
            .attribute("Null");
        let base = ObjectBase::from_element(&element);
        assert_eq!(base.name(), "Root");
        assert_eq!(ObjectBase::parsed_id(&element), Some(42));
        assert!(base.handle().is_detached());
    }

    #[test]
    fn test_optional_property_clears() {
        let mut base = ObjectBase::new("n");
        base.set_property("Visibility", "Visibility", "", PropertyFlags::ANIMATABLE, Some(PropertyValue::Double(0.5)));
        assert_eq!(base.f64_property("Visibility"), Some(0.5));
        base.set_property("Visibility", "Visibility", "", PropertyFlags::ANIMATABLE, None);
        assert_eq!(base.f64_property("Visibility"), None);
    }
}
