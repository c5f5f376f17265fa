//! Type-specific payload attached to a model (null markers, skeleton limbs).

use crate::core::{impl_object_base, ClassType, ObjectBase, ObjectType, SceneObject, WriteOptions};
use crate::tree::Element;

/// Node attribute of a `Null` or `LimbNode` model.
///
/// Its type must match the type of the model it is attached to.
#[derive(Clone, Debug)]
pub struct NodeAttribute {
    base: ObjectBase,
    attribute_type: ObjectType,
}

impl NodeAttribute {
    pub fn new(name: impl Into<String>, attribute_type: ObjectType) -> Self {
        Self {
            base: ObjectBase::new(name),
            attribute_type,
        }
    }

    pub fn from_element(element: &Element, attribute_type: ObjectType) -> Self {
        Self {
            base: ObjectBase::from_element(element),
            attribute_type,
        }
    }

    fn type_flags(&self) -> &'static str {
        match self.attribute_type {
            ObjectType::LimbNode => "Skeleton",
            _ => "Null",
        }
    }
}

impl SceneObject for NodeAttribute {
    impl_object_base!();

    fn class(&self) -> ClassType {
        ClassType::NodeAttribute
    }

    fn object_type(&self) -> ObjectType {
        self.attribute_type
    }

    fn to_element(&self, options: &WriteOptions) -> Element {
        Element::with_parts(
            self.class().element_name(),
            self.base.header_attributes(self.class(), self.attribute_type, options),
            vec![
                Element::with_attribute("TypeFlags", self.type_flags()),
                self.base.properties().to_element(),
            ],
        )
    }
}
