//! Identifier-based edges between scene objects.
//!
//! On the wire every edge is a `C` element: `["OO", source, target]` for an
//! object-to-object link or `["OP", source, target, property]` for a link into
//! a named property of the target.

use crate::tree::{Attribute, Element};

use super::ObjectId;

/// Element name of the connection section.
pub const CONNECTIONS_ELEMENT: &str = "Connections";

const CONNECTION_ENTRY: &str = "C";

/// Kind of edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ConnectionKind {
    /// Object to object.
    Object,
    /// Object to a named property of the target.
    Property,
}

impl ConnectionKind {
    pub const fn code(self) -> &'static str {
        match self {
            Self::Object => "OO",
            Self::Property => "OP",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "OO" => Some(Self::Object),
            "OP" => Some(Self::Property),
            _ => None,
        }
    }
}

/// A declared edge. The source is integrated into the target when resolved.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Connection {
    pub kind: ConnectionKind,
    pub source: ObjectId,
    pub target: ObjectId,
    /// Property name, present for [`ConnectionKind::Property`] edges.
    pub property: Option<String>,
}

impl Connection {
    /// Object-to-object edge.
    pub fn object(source: ObjectId, target: ObjectId) -> Self {
        Self {
            kind: ConnectionKind::Object,
            source,
            target,
            property: None,
        }
    }

    /// Object-to-property edge.
    pub fn property(source: ObjectId, target: ObjectId, property: impl Into<String>) -> Self {
        Self {
            kind: ConnectionKind::Property,
            source,
            target,
            property: Some(property.into()),
        }
    }

    /// Render as a `C` element.
    pub fn to_element(&self) -> Element {
        let mut element = Element::new(CONNECTION_ENTRY)
            .attribute(self.kind.code())
            .attribute(self.source)
            .attribute(self.target);
        if let (ConnectionKind::Property, Some(property)) = (self.kind, &self.property) {
            element = element.attribute(property.as_str());
        }
        element
    }

    /// Parse a `C` element. Returns `None` for malformed entries.
    pub fn from_element(element: &Element) -> Option<Self> {
        if element.name() != CONNECTION_ENTRY {
            return None;
        }
        let attrs = element.attributes();
        let kind = ConnectionKind::from_code(attrs.first()?.as_str()?)?;
        let source = attrs.get(1)?.as_i64()?;
        let target = attrs.get(2)?.as_i64()?;
        let property = match kind {
            ConnectionKind::Object => None,
            ConnectionKind::Property => Some(attrs.get(3).and_then(Attribute::as_str)?.to_string()),
        };
        Some(Self {
            kind,
            source,
            target,
            property,
        })
    }
}

/// Parse every well-formed entry of a `Connections` element, in order.
pub fn parse_connections(element: &Element) -> Vec<Connection> {
    element
        .children()
        .iter()
        .filter_map(|c| {
            let parsed = Connection::from_element(c);
            if parsed.is_none() {
                tracing::debug!(attributes = ?c.attributes(), "skipping malformed connection");
            }
            parsed
        })
        .collect()
}

/// Render a `Connections` element.
pub fn connections_to_element<'a>(connections: impl IntoIterator<Item = &'a Connection>) -> Element {
    Element::with_children(
        CONNECTIONS_ELEMENT,
        connections.into_iter().map(Connection::to_element).collect(),
    )
}
