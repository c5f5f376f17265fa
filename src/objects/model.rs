//! Hierarchical scene nodes and their pivot-aware local transforms.
//!
//! A model owns the ordered list of its children while each child keeps a
//! non-owning handle back to its parent. Operations that touch both ends of
//! that relation live on [`Scene`](crate::scene::Scene); this module only
//! manipulates one side at a time.

use crate::core::{
    impl_object_base, ClassType, Connection, ObjectBase, ObjectHandle, ObjectType, PropertyFlags,
    PropertyValue, SceneObject, WriteOptions,
};
use crate::tree::{Attribute, Element};
use crate::util::{euler_to_matrix, DMat4, DVec3, Error, Result, RotationOrder};

/// Version written into every model element.
const MODEL_VERSION: i32 = 232;

// Property names.
const LCL_TRANSLATION: &str = "Lcl Translation";
const LCL_ROTATION: &str = "Lcl Rotation";
const LCL_SCALING: &str = "Lcl Scaling";
const ROTATION_OFFSET: &str = "RotationOffset";
const ROTATION_PIVOT: &str = "RotationPivot";
const PRE_ROTATION: &str = "PreRotation";
const POST_ROTATION: &str = "PostRotation";
const SCALING_OFFSET: &str = "ScalingOffset";
const SCALING_PIVOT: &str = "ScalingPivot";
const ROTATION_ORDER: &str = "RotationOrder";
const VISIBILITY: &str = "Visibility";
const VISIBILITY_INHERITANCE: &str = "Visibility Inheritance";
const DEFAULT_ATTRIBUTE_INDEX: &str = "DefaultAttributeIndex";
const INHERIT_TYPE: &str = "InheritType";

/// Viewport shading mode, stored as a character code.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ShadingType {
    #[default]
    HardShading,
    WireFrame,
    FlatShading,
    LightShading,
    TextureShading,
    FullShading,
}

impl ShadingType {
    /// Decode a shading code. Unknown codes fall back to hard shading.
    pub fn from_code(code: u8) -> Self {
        match code {
            b'W' => Self::WireFrame,
            b'F' => Self::FlatShading,
            b'Y' => Self::LightShading,
            b'T' => Self::TextureShading,
            b'U' => Self::FullShading,
            _ => Self::HardShading,
        }
    }

    /// Encode as a shading code. Hard shading is written as zero.
    pub fn code(self) -> u8 {
        match self {
            Self::HardShading => 0,
            Self::WireFrame => b'W',
            Self::FlatShading => b'F',
            Self::LightShading => b'Y',
            Self::TextureShading => b'T',
            Self::FullShading => b'U',
        }
    }
}

/// Face culling mode, stored as text.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CullingType {
    #[default]
    CullingOff,
    CullingOnCcw,
    CullingOnCw,
}

impl CullingType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CullingOff => "CullingOff",
            Self::CullingOnCcw => "CullingOnCCW",
            Self::CullingOnCw => "CullingOnCW",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "CullingOff" => Some(Self::CullingOff),
            "CullingOnCCW" => Some(Self::CullingOnCcw),
            "CullingOnCW" => Some(Self::CullingOnCw),
            _ => None,
        }
    }
}

/// How a child inherits its parent's rotation and scale.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InheritType {
    RrSs = 0,
    RSrs = 1,
    Rrs = 2,
}

impl InheritType {
    pub fn from_i32(v: i32) -> Option<Self> {
        match v {
            0 => Some(Self::RrSs),
            1 => Some(Self::RSrs),
            2 => Some(Self::Rrs),
            _ => None,
        }
    }
}

/// A node of the scene hierarchy.
///
/// `Null` and `LimbNode` models carry at most one node attribute of the same
/// type. `Mesh` models have no attribute slot; they link to a geometry and an
/// ordered material list instead.
#[derive(Clone, Debug)]
pub struct Model {
    base: ObjectBase,
    model_type: ObjectType,
    parent: Option<ObjectHandle>,
    children: Vec<ObjectHandle>,
    attribute: Option<ObjectHandle>,
    geometry: Option<ObjectHandle>,
    materials: Vec<ObjectHandle>,
    pub shading: ShadingType,
    pub culling: CullingType,
}

impl Model {
    /// Create a detached model of the given kind.
    pub fn new(name: impl Into<String>, model_type: ObjectType) -> Self {
        Self::with_base(ObjectBase::new(name), model_type)
    }

    fn with_base(base: ObjectBase, model_type: ObjectType) -> Self {
        Self {
            base,
            model_type,
            parent: None,
            children: Vec::new(),
            attribute: None,
            geometry: None,
            materials: Vec::new(),
            shading: ShadingType::default(),
            culling: CullingType::default(),
        }
    }

    /// Phase-1 parse of a `Model` element.
    ///
    /// Shading and culling are decoded leniently: unknown values keep the
    /// defaults.
    pub fn from_element(element: &Element, model_type: ObjectType) -> Self {
        let mut model = Self::with_base(ObjectBase::from_element(element), model_type);

        if let Some(code) = element.child_attribute("Shading").and_then(Attribute::as_i64) {
            model.shading = u8::try_from(code).map(ShadingType::from_code).unwrap_or_default();
        }

        if let Some(attr) = element.child_attribute("Culling") {
            match attr.as_str().and_then(CullingType::parse) {
                Some(culling) => model.culling = culling,
                None => tracing::debug!(model = model.base.name(), value = ?attr, "unknown culling mode"),
            }
        }

        model
    }

    /// Whether this kind of model carries a node attribute.
    pub fn supports_attribute(&self) -> bool {
        matches!(self.model_type, ObjectType::Null | ObjectType::LimbNode)
    }

    pub fn parent(&self) -> Option<ObjectHandle> {
        self.parent
    }

    pub fn children(&self) -> &[ObjectHandle] {
        &self.children
    }

    /// Attached node attribute.
    pub fn attribute(&self) -> Result<Option<ObjectHandle>> {
        if !self.supports_attribute() {
            return Err(Error::AttributesNotSupported(self.model_type));
        }
        Ok(self.attribute)
    }

    /// Geometry of a mesh model.
    pub fn geometry(&self) -> Option<ObjectHandle> {
        self.geometry
    }

    /// Materials of a mesh model, indexed by submesh material index.
    pub fn materials(&self) -> &[ObjectHandle] {
        &self.materials
    }

    // === One-sided mutation used by the scene ===

    pub(crate) fn set_parent(&mut self, parent: Option<ObjectHandle>) {
        self.parent = parent;
    }

    pub(crate) fn insert_child(&mut self, index: usize, child: ObjectHandle) {
        self.children.insert(index, child);
    }

    pub(crate) fn remove_child_entry(&mut self, child: ObjectHandle) -> bool {
        match self.children.iter().position(|&c| c == child) {
            Some(pos) => {
                self.children.remove(pos);
                true
            }
            None => false,
        }
    }

    pub(crate) fn take_children(&mut self) -> Vec<ObjectHandle> {
        std::mem::take(&mut self.children)
    }

    pub(crate) fn set_attribute_unchecked(&mut self, attribute: Option<ObjectHandle>) {
        self.attribute = attribute;
    }

    pub(crate) fn set_geometry_unchecked(&mut self, geometry: Option<ObjectHandle>) {
        self.geometry = geometry;
    }

    pub(crate) fn push_material(&mut self, material: ObjectHandle) {
        if !self.materials.contains(&material) {
            self.materials.push(material);
        }
    }

    // === Transform properties ===

    pub fn local_translation(&self) -> Option<DVec3> {
        self.base.vec3_property(LCL_TRANSLATION)
    }

    pub fn set_local_translation(&mut self, value: Option<DVec3>) {
        self.set_vec3(LCL_TRANSLATION, LCL_TRANSLATION, LCL_TRANSLATION, value);
    }

    /// Euler angles in degrees.
    pub fn local_rotation(&self) -> Option<DVec3> {
        self.base.vec3_property(LCL_ROTATION)
    }

    pub fn set_local_rotation(&mut self, value: Option<DVec3>) {
        self.set_vec3(LCL_ROTATION, LCL_ROTATION, LCL_ROTATION, value);
    }

    pub fn local_scale(&self) -> Option<DVec3> {
        self.base.vec3_property(LCL_SCALING)
    }

    pub fn set_local_scale(&mut self, value: Option<DVec3>) {
        self.set_vec3(LCL_SCALING, LCL_SCALING, LCL_SCALING, value);
    }

    pub fn rotation_offset(&self) -> Option<DVec3> {
        self.base.vec3_property(ROTATION_OFFSET)
    }

    pub fn set_rotation_offset(&mut self, value: Option<DVec3>) {
        self.set_vec3(ROTATION_OFFSET, "Vector3D", "Vector3D", value);
    }

    pub fn rotation_pivot(&self) -> Option<DVec3> {
        self.base.vec3_property(ROTATION_PIVOT)
    }

    pub fn set_rotation_pivot(&mut self, value: Option<DVec3>) {
        self.set_vec3(ROTATION_PIVOT, "Vector3D", "Vector3D", value);
    }

    pub fn pre_rotation(&self) -> Option<DVec3> {
        self.base.vec3_property(PRE_ROTATION)
    }

    pub fn set_pre_rotation(&mut self, value: Option<DVec3>) {
        self.set_vec3(PRE_ROTATION, "Vector3D", "Vector3D", value);
    }

    pub fn post_rotation(&self) -> Option<DVec3> {
        self.base.vec3_property(POST_ROTATION)
    }

    pub fn set_post_rotation(&mut self, value: Option<DVec3>) {
        self.set_vec3(POST_ROTATION, "Vector3D", "Vector3D", value);
    }

    pub fn scaling_offset(&self) -> Option<DVec3> {
        self.base.vec3_property(SCALING_OFFSET)
    }

    pub fn set_scaling_offset(&mut self, value: Option<DVec3>) {
        self.set_vec3(SCALING_OFFSET, "Vector3D", "Vector3D", value);
    }

    pub fn scaling_pivot(&self) -> Option<DVec3> {
        self.base.vec3_property(SCALING_PIVOT)
    }

    pub fn set_scaling_pivot(&mut self, value: Option<DVec3>) {
        self.set_vec3(SCALING_PIVOT, "Vector3D", "Vector3D", value);
    }

    /// Rotation order applied to the local rotation only.
    pub fn rotation_order(&self) -> RotationOrder {
        self.base
            .i32_property(ROTATION_ORDER)
            .map(RotationOrder::from_i32)
            .unwrap_or_default()
    }

    pub fn set_rotation_order(&mut self, order: Option<RotationOrder>) {
        let value = order.map(|o| PropertyValue::Enum(o as i32));
        self.base.set_property(ROTATION_ORDER, "enum", "", PropertyFlags::empty(), value);
    }

    pub fn visibility(&self) -> Option<f64> {
        self.base.f64_property(VISIBILITY)
    }

    pub fn set_visibility(&mut self, value: Option<f64>) {
        let value = value.map(PropertyValue::Double);
        self.base.set_property(VISIBILITY, VISIBILITY, "", PropertyFlags::ANIMATABLE, value);
    }

    pub fn visibility_inheritance(&self) -> Option<bool> {
        self.base.bool_property(VISIBILITY_INHERITANCE)
    }

    pub fn set_visibility_inheritance(&mut self, value: Option<bool>) {
        let value = value.map(PropertyValue::Bool);
        self.base.set_property(VISIBILITY_INHERITANCE, VISIBILITY_INHERITANCE, "", PropertyFlags::empty(), value);
    }

    pub fn default_attribute_index(&self) -> Option<i32> {
        self.base.i32_property(DEFAULT_ATTRIBUTE_INDEX)
    }

    pub fn set_default_attribute_index(&mut self, value: Option<i32>) {
        let value = value.map(PropertyValue::Int);
        self.base.set_property(DEFAULT_ATTRIBUTE_INDEX, "int", "Integer", PropertyFlags::empty(), value);
    }

    pub fn inherit_type(&self) -> Option<InheritType> {
        self.base.i32_property(INHERIT_TYPE).and_then(InheritType::from_i32)
    }

    pub fn set_inherit_type(&mut self, value: Option<InheritType>) {
        let value = value.map(|v| PropertyValue::Enum(v as i32));
        self.base.set_property(INHERIT_TYPE, "enum", "", PropertyFlags::empty(), value);
    }

    fn set_vec3(&mut self, name: &str, type_name: &str, label: &str, value: Option<DVec3>) {
        let value = value.map(PropertyValue::Vector3);
        self.base.set_property(name, type_name, label, PropertyFlags::ANIMATABLE, value);
    }

    /// Local transform from the current properties.
    ///
    /// `T * Roff * Rp * Rpre * R * Rpost^-1 * Rp^-1 * Soff * Sp * S * Sp^-1`,
    /// where unset vectors are zero and an unset scale is one. Pre-rotation
    /// is always XYZ and post-rotation always ZYX; the configured rotation
    /// order only applies to the local rotation.
    pub fn local_transform(&self) -> DMat4 {
        self.evaluate_local(
            self.local_translation().unwrap_or_default(),
            self.local_rotation().unwrap_or_default(),
            self.local_scale().unwrap_or(DVec3::ONE),
        )
    }

    /// Local transform for explicit translation, rotation and scale, using
    /// this model's pivots and offsets.
    pub fn evaluate_local(&self, translation: DVec3, rotation: DVec3, scale: DVec3) -> DMat4 {
        let rotation_pivot = self.rotation_pivot().unwrap_or_default();
        let scaling_pivot = self.scaling_pivot().unwrap_or_default();

        let t = DMat4::from_translation(translation);
        let r = euler_to_matrix(rotation, self.rotation_order());
        let s = DMat4::from_scale(scale);

        let pre = euler_to_matrix(self.pre_rotation().unwrap_or_default(), RotationOrder::Xyz);
        let post = euler_to_matrix(-self.post_rotation().unwrap_or_default(), RotationOrder::Zyx);

        let roff = DMat4::from_translation(self.rotation_offset().unwrap_or_default());
        let rpip = DMat4::from_translation(rotation_pivot);
        let rpii = DMat4::from_translation(-rotation_pivot);

        let soff = DMat4::from_translation(self.scaling_offset().unwrap_or_default());
        let spip = DMat4::from_translation(scaling_pivot);
        let spii = DMat4::from_translation(-scaling_pivot);

        t * roff * rpip * pre * r * post * rpii * soff * spip * s * spii
    }
}

impl SceneObject for Model {
    impl_object_base!();

    fn class(&self) -> ClassType {
        ClassType::Model
    }

    fn object_type(&self) -> ObjectType {
        self.model_type
    }

    fn connections(&self) -> Vec<Connection> {
        let id = self.base.id();
        let mut connections: Vec<Connection> = self
            .children
            .iter()
            .map(|child| Connection::object(child.id(), id))
            .collect();

        if let (true, Some(attribute)) = (self.supports_attribute(), self.attribute) {
            connections.push(Connection::object(attribute.id(), id));
        }
        if let Some(geometry) = self.geometry {
            connections.push(Connection::object(geometry.id(), id));
        }
        connections.extend(self.materials.iter().map(|m| Connection::object(m.id(), id)));
        connections
    }

    fn to_element(&self, options: &WriteOptions) -> Element {
        let children = vec![
            Element::with_attribute("Version", MODEL_VERSION),
            self.base.properties().to_element(),
            Element::with_attribute("MultiLayer", false),
            Element::with_attribute("MultiTake", 0),
            Element::with_attribute("Shading", Attribute::Char(self.shading.code())),
            Element::with_attribute("Culling", self.culling.as_str()),
        ];
        Element::with_parts(
            self.class().element_name(),
            self.base.header_attributes(self.class(), self.model_type, options),
            children,
        )
    }

    fn release(&mut self, handle: ObjectHandle) {
        self.remove_child_entry(handle);
        if self.parent == Some(handle) {
            self.parent = None;
        }
        if self.attribute == Some(handle) {
            self.attribute = None;
        }
        if self.geometry == Some(handle) {
            self.geometry = None;
        }
        self.materials.retain(|&m| m != handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::matrix_approx_eq;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_shading_code_parse() {
        let parse = |code: i64| {
            let element = Element::new("Model").child(Element::with_attribute("Shading", code));
            Model::from_element(&element, ObjectType::Mesh).shading
        };
        assert_eq!(parse(i64::from(b'T')), ShadingType::TextureShading);
        assert_eq!(parse(i64::from(b'W')), ShadingType::WireFrame);
        // 0x154 would truncate to 'T'.
        assert_eq!(parse(0x154), ShadingType::HardShading);
        assert_eq!(parse(-1), ShadingType::HardShading);
    }

    #[test]
    fn test_identity_by_default() {
        let model = Model::new("n", ObjectType::Null);
        assert!(matrix_approx_eq(&model.local_transform(), &DMat4::IDENTITY, EPS));
    }

    #[test]
    fn test_pure_translation() {
        let mut model = Model::new("n", ObjectType::Null);
        model.set_local_translation(Some(DVec3::new(1.0, 0.0, 0.0)));
        let expected = DMat4::from_translation(DVec3::X);
        assert!(matrix_approx_eq(&model.local_transform(), &expected, EPS));
    }

    #[test]
    fn test_rotation_about_pivot() {
        let mut model = Model::new("n", ObjectType::Null);
        model.set_local_rotation(Some(DVec3::new(0.0, 0.0, 90.0)));
        model.set_rotation_pivot(Some(DVec3::new(1.0, 0.0, 0.0)));

        // The pivot itself stays in place; the origin swings around it.
        let m = model.local_transform();
        assert!((m.transform_point3(DVec3::X) - DVec3::X).length() < EPS);
        assert!((m.transform_point3(DVec3::ZERO) - DVec3::new(1.0, -1.0, 0.0)).length() < EPS);
    }

    #[test]
    fn test_scaling_pivot() {
        let mut model = Model::new("n", ObjectType::Null);
        model.set_local_scale(Some(DVec3::splat(2.0)));
        model.set_scaling_pivot(Some(DVec3::ONE));

        let m = model.local_transform();
        assert!((m.transform_point3(DVec3::ONE) - DVec3::ONE).length() < EPS);
        assert!((m.transform_point3(DVec3::ZERO) - DVec3::splat(-1.0)).length() < EPS);
    }

    #[test]
    fn test_pre_post_rotation_cancel() {
        let mut model = Model::new("n", ObjectType::Null);
        model.set_pre_rotation(Some(DVec3::new(10.0, 20.0, 30.0)));
        model.set_post_rotation(Some(DVec3::new(10.0, 20.0, 30.0)));
        // Rpre(XYZ) * Rpost(ZYX of negated angles) is the identity.
        assert!(matrix_approx_eq(&model.local_transform(), &DMat4::IDENTITY, EPS));
    }

    #[test]
    fn test_rotation_order_only_affects_local_rotation() {
        let mut a = Model::new("a", ObjectType::Null);
        a.set_pre_rotation(Some(DVec3::new(30.0, 40.0, 0.0)));
        let mut b = a.clone();
        b.set_rotation_order(Some(RotationOrder::Zyx));
        assert!(matrix_approx_eq(&a.local_transform(), &b.local_transform(), EPS));

        b.set_local_rotation(Some(DVec3::new(90.0, 90.0, 0.0)));
        a.set_local_rotation(Some(DVec3::new(90.0, 90.0, 0.0)));
        assert!(!matrix_approx_eq(&a.local_transform(), &b.local_transform(), EPS));
    }

    #[test]
    fn test_attribute_support() {
        let mesh = Model::new("m", ObjectType::Mesh);
        assert_eq!(mesh.attribute(), Err(Error::AttributesNotSupported(ObjectType::Mesh)));
        let null = Model::new("n", ObjectType::Null);
        assert_eq!(null.attribute(), Ok(None));
    }

    #[test]
    fn test_lenient_shading_and_culling() {
        let element = Element::new("Model")
            .attribute(1i64)
            .attribute("Model::n")
            .attribute("Null")
            .child(Element::with_attribute("Shading", Attribute::Char(b'T')))
            .child(Element::with_attribute("Culling", "CullingSideways"));
        let model = Model::from_element(&element, ObjectType::Null);
        assert_eq!(model.shading, ShadingType::TextureShading);
        assert_eq!(model.culling, CullingType::CullingOff);
    }

    #[test]
    fn test_element_layout() {
        let mut model = Model::new("n", ObjectType::LimbNode);
        model.culling = CullingType::CullingOnCw;
        let e = model.to_element(&WriteOptions::default());
        let names: Vec<&str> = e.children().iter().map(Element::name).collect();
        assert_eq!(names, ["Version", "Properties70", "MultiLayer", "MultiTake", "Shading", "Culling"]);

        let parsed = Model::from_element(&e, ObjectType::LimbNode);
        assert_eq!(parsed.culling, CullingType::CullingOnCw);
        assert_eq!(parsed.base().name(), "n");
    }
}
