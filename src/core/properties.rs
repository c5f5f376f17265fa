//! Typed property block (`Properties70`) shared by all scene objects.
//!
//! Properties are stored as an ordered list of named entries. Each entry
//! carries a declared type string, a label, flag bits and a value. Setting an
//! existing name replaces the entry in place so the block keeps its order.

use bitflags::bitflags;
use smallvec::SmallVec;
use std::fmt;

use crate::tree::{Attribute, Element};
use crate::util::DVec3;

/// Element name of the property block.
pub const PROPERTIES_ELEMENT: &str = "Properties70";

/// Element name of a single property entry.
const PROPERTY_ENTRY: &str = "P";

bitflags! {
    /// Flag bits of a property entry.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct PropertyFlags: u8 {
        /// Value may be animated
        const ANIMATABLE = 1 << 0;
        /// Added by the user rather than the schema
        const USER_DEFINED = 1 << 1;
        /// Came from an imported file
        const IMPORTED = 1 << 2;
        const HIDDEN = 1 << 3;
        const LOCKED = 1 << 4;
    }
}

impl PropertyFlags {
    const LETTERS: [(PropertyFlags, char); 5] = [
        (Self::ANIMATABLE, 'A'),
        (Self::USER_DEFINED, 'U'),
        (Self::IMPORTED, 'I'),
        (Self::HIDDEN, 'H'),
        (Self::LOCKED, 'L'),
    ];

    /// Render as the flag string, e.g. `"A+U"`.
    pub fn to_flag_string(self) -> String {
        let mut out = String::new();
        for (flag, letter) in Self::LETTERS {
            if self.contains(flag) {
                if !out.is_empty() {
                    out.push('+');
                }
                out.push(letter);
            }
        }
        out
    }

    /// Parse a flag string. Unknown letters are ignored.
    pub fn from_flag_string(s: &str) -> Self {
        let mut flags = Self::empty();
        for c in s.chars() {
            if let Some((flag, _)) = Self::LETTERS.iter().find(|(_, l)| *l == c) {
                flags |= *flag;
            }
        }
        flags
    }
}

/// Value of a property entry.
#[derive(Clone, Debug, PartialEq)]
pub enum PropertyValue {
    Bool(bool),
    Int(i32),
    /// Enumerated value (`enum` type string).
    Enum(i32),
    Int64(i64),
    Double(f64),
    Vector3(DVec3),
    /// RGB color (`Color` / `ColorRGB` type strings).
    Color(DVec3),
    String(String),
}

impl PropertyValue {
    fn attributes(&self) -> SmallVec<[Attribute; 3]> {
        match self {
            Self::Bool(v) => smallvec::smallvec![Attribute::Int32(*v as i32)],
            Self::Int(v) | Self::Enum(v) => smallvec::smallvec![Attribute::Int32(*v)],
            Self::Int64(v) => smallvec::smallvec![Attribute::Int64(*v)],
            Self::Double(v) => smallvec::smallvec![Attribute::Double(*v)],
            Self::Vector3(v) | Self::Color(v) => smallvec::smallvec![
                Attribute::Double(v.x),
                Attribute::Double(v.y),
                Attribute::Double(v.z)
            ],
            Self::String(v) => smallvec::smallvec![Attribute::String(v.clone())],
        }
    }

    /// Decode a value from its declared type string and trailing attributes.
    fn parse(type_name: &str, values: &[Attribute]) -> Option<Self> {
        let first = values.first()?;
        let value = match type_name {
            "bool" | "Bool" => Self::Bool(first.as_bool()?),
            "enum" => Self::Enum(first.as_i32()?),
            "int" | "Integer" => Self::Int(first.as_i32()?),
            "ULongLong" | "KTime" => Self::Int64(first.as_i64()?),
            "KString" | "DateTime" | "object" => Self::String(first.as_str()?.to_string()),
            "Color" | "ColorRGB" => Self::Color(vec3(values)?),
            _ => match values.len() {
                3 => Self::Vector3(vec3(values)?),
                _ => match first {
                    Attribute::String(s) => Self::String(s.clone()),
                    Attribute::Int64(v) => Self::Int64(*v),
                    Attribute::Double(_) | Attribute::Float(_) => Self::Double(first.as_f64()?),
                    _ => Self::Int(first.as_i32()?),
                },
            },
        };
        Some(value)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Self::Double(v) => Some(v),
            Self::Int(v) | Self::Enum(v) => Some(v as f64),
            Self::Int64(v) => Some(v as f64),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match *self {
            Self::Int(v) | Self::Enum(v) => Some(v),
            Self::Bool(v) => Some(v as i32),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            Self::Bool(v) => Some(v),
            Self::Int(v) | Self::Enum(v) => Some(v != 0),
            _ => None,
        }
    }

    pub fn as_vec3(&self) -> Option<DVec3> {
        match *self {
            Self::Vector3(v) | Self::Color(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }
}

fn vec3(values: &[Attribute]) -> Option<DVec3> {
    match values {
        [x, y, z, ..] => Some(DVec3::new(x.as_f64()?, y.as_f64()?, z.as_f64()?)),
        _ => None,
    }
}

/// One named entry of a property block.
#[derive(Clone, Debug, PartialEq)]
pub struct Property {
    pub name: String,
    /// Declared type, e.g. `"Lcl Translation"` or `"Color"`.
    pub type_name: String,
    /// Secondary type label, often empty.
    pub label: String,
    pub flags: PropertyFlags,
    pub value: PropertyValue,
}

impl Property {
    pub fn new(
        name: impl Into<String>,
        type_name: impl Into<String>,
        label: impl Into<String>,
        flags: PropertyFlags,
        value: PropertyValue,
    ) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            label: label.into(),
            flags,
            value,
        }
    }

    fn to_element(&self) -> Element {
        let head = [
            Attribute::String(self.name.clone()),
            Attribute::String(self.type_name.clone()),
            Attribute::String(self.label.clone()),
            Attribute::String(self.flags.to_flag_string()),
        ];
        Element::with_parts(
            PROPERTY_ENTRY,
            head.into_iter().chain(self.value.attributes()),
            Vec::new(),
        )
    }

    fn from_element(element: &Element) -> Option<Self> {
        let attrs = element.attributes();
        let [name, type_name, label, flags, values @ ..] = attrs else {
            return None;
        };
        let type_name = type_name.as_str()?;
        Some(Self {
            name: name.as_str()?.to_string(),
            type_name: type_name.to_string(),
            label: label.as_str().unwrap_or_default().to_string(),
            flags: PropertyFlags::from_flag_string(flags.as_str().unwrap_or_default()),
            value: PropertyValue::parse(type_name, values)?,
        })
    }
}

/// Ordered property block keyed by name.
#[derive(Clone, Default, PartialEq)]
pub struct PropertyBag {
    entries: Vec<Property>,
}

impl PropertyBag {
    /// Create an empty block.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an entry by name.
    pub fn set(&mut self, property: Property) {
        match self.entries.iter_mut().find(|p| p.name == property.name) {
            Some(existing) => *existing = property,
            None => self.entries.push(property),
        }
    }

    /// Set only the value of an entry, creating it with the given schema if missing.
    pub fn set_value(
        &mut self,
        name: &str,
        type_name: &str,
        label: &str,
        flags: PropertyFlags,
        value: PropertyValue,
    ) {
        match self.entries.iter_mut().find(|p| p.name == name) {
            Some(existing) => existing.value = value,
            None => self.entries.push(Property::new(name, type_name, label, flags, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Property> {
        self.entries.iter().find(|p| p.name == name)
    }

    pub fn value(&self, name: &str) -> Option<&PropertyValue> {
        self.get(name).map(|p| &p.value)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Remove an entry and return it.
    pub fn remove(&mut self, name: &str) -> Option<Property> {
        let pos = self.entries.iter().position(|p| p.name == name)?;
        Some(self.entries.remove(pos))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Property> {
        self.entries.iter()
    }

    /// Render as a `Properties70` element.
    pub fn to_element(&self) -> Element {
        Element::with_children(
            PROPERTIES_ELEMENT,
            self.entries.iter().map(Property::to_element).collect(),
        )
    }

    /// Parse the `Properties70` child of an object element.
    ///
    /// Entries that cannot be decoded are skipped.
    pub fn from_object_element(element: &Element) -> Self {
        let mut bag = Self::new();
        if let Some(block) = element.find_child(PROPERTIES_ELEMENT) {
            for entry in block.children_named(PROPERTY_ENTRY) {
                match Property::from_element(entry) {
                    Some(p) => bag.set(p),
                    None => tracing::debug!(element = element.name(), "skipping undecodable property entry"),
                }
            }
        }
        bag
    }
}

impl fmt::Debug for PropertyBag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.entries.iter().map(|p| (&p.name, &p.value)))
            .finish()
    }
}

impl FromIterator<Property> for PropertyBag {
    fn from_iter<T: IntoIterator<Item = Property>>(iter: T) -> Self {
        let mut bag = Self::new();
        for p in iter {
            bag.set(p);
        }
        bag
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn translation(v: DVec3) -> Property {
        Property::new(
            "Lcl Translation",
            "Lcl Translation",
            "",
            PropertyFlags::ANIMATABLE,
            PropertyValue::Vector3(v),
        )
    }

    #[test]
    fn test_set_replaces_in_place() {
        let mut bag = PropertyBag::new();
        bag.set(translation(DVec3::X));
        bag.set(Property::new("Visibility", "Visibility", "", PropertyFlags::ANIMATABLE, PropertyValue::Double(1.0)));
        bag.set(translation(DVec3::Y));

        assert_eq!(bag.len(), 2);
        assert_eq!(bag.iter().next().map(|p| p.name.as_str()), Some("Lcl Translation"));
        assert_eq!(bag.value("Lcl Translation").and_then(PropertyValue::as_vec3), Some(DVec3::Y));
    }

    #[test]
    fn test_flag_string() {
        let flags = PropertyFlags::ANIMATABLE | PropertyFlags::USER_DEFINED;
        assert_eq!(flags.to_flag_string(), "A+U");
        assert_eq!(PropertyFlags::from_flag_string("A+U"), flags);
        assert_eq!(PropertyFlags::from_flag_string(""), PropertyFlags::empty());
    }

    #[test]
    fn test_element_roundtrip() {
        let mut bag = PropertyBag::new();
        bag.set(translation(DVec3::new(1.0, 2.0, 3.0)));
        bag.set(Property::new("RotationOrder", "enum", "", PropertyFlags::empty(), PropertyValue::Enum(4)));
        bag.set(Property::new("DiffuseColor", "Color", "", PropertyFlags::ANIMATABLE, PropertyValue::Color(DVec3::ONE)));
        bag.set(Property::new("ShadingModel", "KString", "", PropertyFlags::empty(), PropertyValue::String("phong".into())));

        let object = Element::new("Model").child(bag.to_element());
        let parsed = PropertyBag::from_object_element(&object);
        assert_eq!(parsed, bag);
    }

    #[test]
    fn test_malformed_entries_skipped() {
        let block = Element::new(PROPERTIES_ELEMENT)
            .child(Element::with_attribute("P", "only-a-name"))
            .child(Element::new("P").attribute("Visibility").attribute("double").attribute("Number").attribute("").attribute(0.5));
        let object = Element::new("Model").child(block);

        let bag = PropertyBag::from_object_element(&object);
        assert_eq!(bag.len(), 1);
        assert_eq!(bag.value("Visibility"), Some(&PropertyValue::Double(0.5)));
    }
}
