//! Surface materials: property-backed colors and factors plus named texture
//! channels.

use crate::core::{
    impl_object_base, ClassType, Connection, ObjectBase, ObjectHandle, ObjectType, Property,
    PropertyFlags, PropertyValue, SceneObject, WriteOptions,
};
use crate::objects::Texture;
use crate::scene::Scene;
use crate::tree::{Attribute, Element};
use crate::util::{DVec3, Error, Result};

const MATERIAL_VERSION: i32 = 102;

/// Color properties of a material.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ColorType {
    DiffuseColor,
    SpecularColor,
    ReflectionColor,
    AmbientColor,
    EmissiveColor,
    TransparentColor,
}

impl ColorType {
    pub const fn name(self) -> &'static str {
        match self {
            Self::DiffuseColor => "DiffuseColor",
            Self::SpecularColor => "SpecularColor",
            Self::ReflectionColor => "ReflectionColor",
            Self::AmbientColor => "AmbientColor",
            Self::EmissiveColor => "EmissiveColor",
            Self::TransparentColor => "TransparentColor",
        }
    }
}

/// Scalar factor properties of a material.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FactorType {
    DiffuseFactor,
    SpecularFactor,
    ReflectionFactor,
    Shininess,
    ShininessExponent,
    AmbientFactor,
    BumpFactor,
    EmissiveFactor,
    TransparencyFactor,
}

impl FactorType {
    pub const fn name(self) -> &'static str {
        match self {
            Self::DiffuseFactor => "DiffuseFactor",
            Self::SpecularFactor => "SpecularFactor",
            Self::ReflectionFactor => "ReflectionFactor",
            Self::Shininess => "Shininess",
            Self::ShininessExponent => "ShininessExponent",
            Self::AmbientFactor => "AmbientFactor",
            Self::BumpFactor => "BumpFactor",
            Self::EmissiveFactor => "EmissiveFactor",
            Self::TransparencyFactor => "TransparencyFactor",
        }
    }
}

/// Well-known texture slot names.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TextureSlot {
    DiffuseColor,
    NormalMap,
    HeightMap,
    ReflectionColor,
    AmbientColor,
    EmissiveColor,
    SpecularColor,
    TransparentColor,
}

impl TextureSlot {
    pub const fn name(self) -> &'static str {
        match self {
            Self::DiffuseColor => "DiffuseColor",
            Self::NormalMap => "NormalMap",
            Self::HeightMap => "HeightMap",
            Self::ReflectionColor => "ReflectionColor",
            Self::AmbientColor => "AmbientColor",
            Self::EmissiveColor => "EmissiveColor",
            Self::SpecularColor => "SpecularColor",
            Self::TransparentColor => "TransparentColor",
        }
    }
}

/// A texture bound to a named material slot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MaterialChannel {
    pub name: String,
    pub texture: ObjectHandle,
}

/// Property schema of a factor: bump factors are declared differently.
fn factor_schema(name: &str) -> (&'static str, &'static str) {
    if name.starts_with("Bump") {
        ("double", "Number")
    } else {
        ("Number", "")
    }
}

#[derive(Clone, Debug)]
pub struct Material {
    base: ObjectBase,
    pub shading_model: String,
    pub multi_layer: bool,
    channels: Vec<MaterialChannel>,
}

impl Material {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_base(ObjectBase::new(name))
    }

    fn with_base(base: ObjectBase) -> Self {
        Self {
            base,
            shading_model: String::new(),
            multi_layer: false,
            channels: Vec::new(),
        }
    }

    pub fn from_element(element: &Element) -> Self {
        let mut material = Self::with_base(ObjectBase::from_element(element));
        if let Some(shading) = element.child_attribute("ShadingModel").and_then(Attribute::as_str) {
            material.shading_model = shading.to_string();
        }
        if let Some(multi) = element.child_attribute("MultiLayer").and_then(Attribute::as_bool) {
            material.multi_layer = multi;
        }
        material
    }

    /// Texture channels in connection order.
    pub fn channels(&self) -> &[MaterialChannel] {
        &self.channels
    }

    /// Texture bound to the first channel called `name`.
    pub fn texture(&self, name: &str) -> Option<ObjectHandle> {
        self.channels.iter().find(|c| c.name == name).map(|c| c.texture)
    }

    pub(crate) fn push_channel(&mut self, name: impl Into<String>, texture: ObjectHandle) {
        self.channels.push(MaterialChannel {
            name: name.into(),
            texture,
        });
    }

    pub fn color(&self, color: ColorType) -> Option<DVec3> {
        self.base.vec3_property(color.name())
    }

    pub fn set_color(&mut self, color: ColorType, value: Option<DVec3>) {
        self.base.set_property(
            color.name(),
            "Color",
            "",
            PropertyFlags::ANIMATABLE,
            value.map(PropertyValue::Color),
        );
    }

    pub fn factor(&self, factor: FactorType) -> Option<f64> {
        self.base.f64_property(factor.name())
    }

    pub fn set_factor(&mut self, factor: FactorType, value: Option<f64>) {
        let (type_name, label) = factor_schema(factor.name());
        self.base.set_property(
            factor.name(),
            type_name,
            label,
            PropertyFlags::ANIMATABLE,
            value.map(PropertyValue::Double),
        );
    }
}

impl SceneObject for Material {
    impl_object_base!();

    fn class(&self) -> ClassType {
        ClassType::Material
    }

    fn object_type(&self) -> ObjectType {
        ObjectType::Material
    }

    /// One property edge per texture channel, labelled with the channel name.
    fn connections(&self) -> Vec<Connection> {
        let id = self.base.id();
        self.channels
            .iter()
            .map(|c| Connection::property(c.texture.id(), id, c.name.clone()))
            .collect()
    }

    fn to_element(&self, options: &WriteOptions) -> Element {
        Element::with_parts(
            self.class().element_name(),
            self.base.header_attributes(self.class(), ObjectType::Material, options),
            vec![
                Element::with_attribute("Version", MATERIAL_VERSION),
                Element::with_attribute("ShadingModel", self.shading_model.as_str()),
                Element::with_attribute("MultiLayer", i32::from(self.multi_layer)),
                self.base.properties().to_element(),
            ],
        )
    }

    fn release(&mut self, handle: ObjectHandle) {
        self.channels.retain(|c| c.texture != handle);
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Fluent material authoring.
pub struct MaterialBuilder<'s> {
    scene: &'s mut Scene,
    material: Material,
}

impl<'s> MaterialBuilder<'s> {
    pub fn new(scene: &'s mut Scene, name: impl Into<String>) -> Self {
        Self {
            scene,
            material: Material::new(name),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.material.base.set_name(name);
        self
    }

    pub fn with_shading_model(mut self, shading_model: impl Into<String>) -> Self {
        self.material.shading_model = shading_model.into();
        self
    }

    pub fn with_multi_layer(mut self, multi_layer: bool) -> Self {
        self.material.multi_layer = multi_layer;
        self
    }

    pub fn with_property(mut self, property: Property) -> Self {
        self.material.base.add_property(property);
        self
    }

    pub fn with_slot(self, slot: TextureSlot, texture: ObjectHandle) -> Result<Self> {
        self.with_channel(slot.name(), texture)
    }

    /// Bind a texture of this scene to a named channel.
    pub fn with_channel(mut self, name: &str, texture: ObjectHandle) -> Result<Self> {
        if texture.scene() != self.scene.id() {
            return Err(Error::CrossScene(texture));
        }
        if self.scene.get::<Texture>(texture).is_none() {
            return Err(Error::MissingTexture(name.to_string()));
        }
        self.material.push_channel(name, texture);
        Ok(self)
    }

    pub fn with_color(self, color: ColorType, value: DVec3) -> Self {
        self.with_named_color(color.name(), value)
    }

    pub fn with_named_color(mut self, name: &str, value: DVec3) -> Self {
        self.material.base.add_property(Property::new(
            name,
            "Color",
            "",
            PropertyFlags::IMPORTED | PropertyFlags::ANIMATABLE,
            PropertyValue::Color(value),
        ));
        self
    }

    pub fn with_factor(self, factor: FactorType, value: f64) -> Self {
        self.with_named_factor(factor.name(), value)
    }

    pub fn with_named_factor(mut self, name: &str, value: f64) -> Self {
        let (type_name, label) = factor_schema(name);
        self.material.base.add_property(Property::new(
            name,
            type_name,
            label,
            PropertyFlags::IMPORTED | PropertyFlags::ANIMATABLE,
            PropertyValue::Double(value),
        ));
        self
    }

    pub fn build(self) -> ObjectHandle {
        self.scene.insert(self.material)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_and_factor_properties() {
        let mut material = Material::new("m");
        assert_eq!(material.color(ColorType::DiffuseColor), None);

        material.set_color(ColorType::DiffuseColor, Some(DVec3::new(1.0, 0.5, 0.25)));
        material.set_factor(FactorType::BumpFactor, Some(0.3));
        assert_eq!(material.color(ColorType::DiffuseColor), Some(DVec3::new(1.0, 0.5, 0.25)));
        assert_eq!(material.factor(FactorType::BumpFactor), Some(0.3));

        let bump = material.base().properties().get("BumpFactor").unwrap();
        assert_eq!((bump.type_name.as_str(), bump.label.as_str()), ("double", "Number"));

        material.set_color(ColorType::DiffuseColor, None);
        assert_eq!(material.color(ColorType::DiffuseColor), None);
    }

    #[test]
    fn test_element_round_trip() {
        let mut material = Material::new("m");
        material.shading_model = "phong".to_string();
        material.multi_layer = true;
        material.set_factor(FactorType::Shininess, Some(20.0));

        let e = material.to_element(&WriteOptions::default());
        assert_eq!(e.child_attribute("Version"), Some(&Attribute::Int32(MATERIAL_VERSION)));
        assert_eq!(e.child_attribute("MultiLayer"), Some(&Attribute::Int32(1)));

        let parsed = Material::from_element(&e);
        assert_eq!(parsed.shading_model, "phong");
        assert!(parsed.multi_layer);
        assert_eq!(parsed.factor(FactorType::Shininess), Some(20.0));
    }
}
