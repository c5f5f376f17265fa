//! Core layer - identity, properties and connections shared by all objects.
//!
//! This module provides:
//! - [`ObjectHandle`] / [`ObjectId`] - arena handles and wire identifiers
//! - [`ClassType`] / [`ObjectType`] - kind tags
//! - [`PropertyBag`] - the typed `Properties70` block
//! - [`Connection`] - identifier-based edges
//! - [`SceneObject`] - the interface every object kind implements
//! - [`LoadOptions`] / [`WriteOptions`] - configuration

mod connection;
mod header;
mod object;
mod options;
mod properties;

pub use connection::{
    connections_to_element, parse_connections, Connection, ConnectionKind, CONNECTIONS_ELEMENT,
};
pub use header::{ClassType, ObjectHandle, ObjectId, ObjectKey, ObjectType, SceneId, ROOT_ID};
pub(crate) use object::impl_object_base;
pub use object::{IdMap, ObjectBase, SceneObject};
pub use options::{LoadOptions, WriteOptions};
pub use properties::{Property, PropertyBag, PropertyFlags, PropertyValue, PROPERTIES_ELEMENT};
