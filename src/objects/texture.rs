//! File-backed textures bound to material channels.

use crate::core::{impl_object_base, ClassType, ObjectBase, ObjectType, SceneObject, WriteOptions};
use crate::tree::{Attribute, Element};

const TEXTURE_VERSION: i32 = 202;

#[derive(Clone, Debug)]
pub struct Texture {
    base: ObjectBase,
    pub file_name: String,
    pub relative_file_name: String,
}

impl Texture {
    pub fn new(name: impl Into<String>, file_name: impl Into<String>) -> Self {
        let file_name = file_name.into();
        Self {
            base: ObjectBase::new(name),
            relative_file_name: file_name.clone(),
            file_name,
        }
    }

    pub fn from_element(element: &Element) -> Self {
        let text = |name: &str| {
            element
                .child_attribute(name)
                .and_then(Attribute::as_str)
                .unwrap_or_default()
                .to_string()
        };
        Self {
            base: ObjectBase::from_element(element),
            file_name: text("FileName"),
            relative_file_name: text("RelativeFilename"),
        }
    }
}

impl SceneObject for Texture {
    impl_object_base!();

    fn class(&self) -> ClassType {
        ClassType::Texture
    }

    fn object_type(&self) -> ObjectType {
        ObjectType::Texture
    }

    fn to_element(&self, options: &WriteOptions) -> Element {
        Element::with_parts(
            self.class().element_name(),
            self.base.header_attributes(self.class(), ObjectType::Texture, options),
            vec![
                Element::with_attribute("Type", "TextureVideoClip"),
                Element::with_attribute("Version", TEXTURE_VERSION),
                Element::with_attribute("TextureName", format!("Texture::{}", self.base.name())),
                self.base.properties().to_element(),
                Element::with_attribute("FileName", self.file_name.as_str()),
                Element::with_attribute("RelativeFilename", self.relative_file_name.as_str()),
            ],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_names_round_trip() {
        let mut texture = Texture::new("albedo", "C:/maps/albedo.png");
        texture.relative_file_name = "maps/albedo.png".to_string();
        let parsed = Texture::from_element(&texture.to_element(&WriteOptions::text()));
        assert_eq!(parsed.base().name(), "albedo");
        assert_eq!(parsed.file_name, "C:/maps/albedo.png");
        assert_eq!(parsed.relative_file_name, "maps/albedo.png");
    }
}
