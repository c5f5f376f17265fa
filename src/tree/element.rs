//! Generic labeled tree node.

use smallvec::SmallVec;

use super::Attribute;

/// A named tree element with ordered attributes and ordered children.
///
/// This is the unit every scene object is rendered to and parsed from. The
/// byte-level tokenizer that produces and consumes these lives outside this
/// crate.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Element {
    name: String,
    attributes: SmallVec<[Attribute; 3]>,
    children: Vec<Element>,
}

impl Element {
    /// Create an element without attributes or children.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: SmallVec::new(),
            children: Vec::new(),
        }
    }

    /// Create an element from all of its parts.
    pub fn with_parts(
        name: impl Into<String>,
        attributes: impl IntoIterator<Item = Attribute>,
        children: Vec<Element>,
    ) -> Self {
        Self {
            name: name.into(),
            attributes: attributes.into_iter().collect(),
            children,
        }
    }

    /// Element with children only, e.g. a `Properties70` block.
    pub fn with_children(name: impl Into<String>, children: Vec<Element>) -> Self {
        Self {
            name: name.into(),
            attributes: SmallVec::new(),
            children,
        }
    }

    /// Leaf element holding a single attribute, e.g. `Version: 232`.
    pub fn with_attribute(name: impl Into<String>, value: impl Into<Attribute>) -> Self {
        let mut element = Self::new(name);
        element.attributes.push(value.into());
        element
    }

    /// Builder-style attribute append.
    pub fn attribute(mut self, value: impl Into<Attribute>) -> Self {
        self.attributes.push(value.into());
        self
    }

    /// Builder-style child append.
    pub fn child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    /// Append a child in place.
    pub fn push_child(&mut self, child: Element) {
        self.children.push(child);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    pub fn children(&self) -> &[Element] {
        &self.children
    }

    /// First attribute, if any.
    #[inline]
    pub fn first_attribute(&self) -> Option<&Attribute> {
        self.attributes.first()
    }

    /// First child with the given name.
    pub fn find_child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    /// All children with the given name, in order.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// First attribute of the first child named `name`.
    pub fn child_attribute(&self, name: &str) -> Option<&Attribute> {
        self.find_child(name).and_then(Element::first_attribute)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_child() {
        let e = Element::new("Model")
            .child(Element::with_attribute("Version", 232))
            .child(Element::with_attribute("Shading", Attribute::Char(b'Y')))
            .child(Element::with_attribute("Version", 7));

        assert_eq!(e.children().len(), 3);
        assert_eq!(e.child_attribute("Version"), Some(&Attribute::Int32(232)));
        assert_eq!(e.children_named("Version").count(), 2);
        assert!(e.find_child("Culling").is_none());
    }

    #[test]
    fn test_with_parts() {
        let e = Element::with_parts("C", [Attribute::from("OO"), 1i64.into(), 2i64.into()], Vec::new());
        assert_eq!(e.attributes().len(), 3);
        assert_eq!(e.first_attribute().and_then(Attribute::as_str), Some("OO"));
    }
}
