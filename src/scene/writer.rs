//! Rendering a scene back into `Objects` and `Connections` elements.

use super::loader::OBJECTS_ELEMENT;
use super::Scene;
use crate::core::{connections_to_element, ClassType, Connection, WriteOptions, ROOT_ID};
use crate::objects::Model;
use crate::tree::Element;

impl Scene {
    /// Render every object, in insertion order.
    #[tracing::instrument(skip_all, fields(objects = self.len()))]
    pub fn objects_element(&self, options: &WriteOptions) -> Element {
        Element::with_children(
            OBJECTS_ELEMENT,
            self.iter().map(|object| object.to_element(options)).collect(),
        )
    }

    /// Every connection owned by the scene's objects.
    ///
    /// Parentless models are connected to the document root.
    pub fn connections(&self) -> Vec<Connection> {
        let mut connections = Vec::new();
        for object in self.iter() {
            if object.class() == ClassType::Model
                && object.downcast_ref::<Model>().is_some_and(|m| m.parent().is_none())
            {
                connections.push(Connection::object(object.base().id(), ROOT_ID));
            }
            connections.extend(object.connections());
        }
        connections
    }

    #[tracing::instrument(skip_all)]
    pub fn connections_element(&self) -> Element {
        let connections = self.connections();
        tracing::debug!(count = connections.len(), "writing connections");
        connections_to_element(&connections)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ObjectType;

    #[test]
    fn test_root_connections() {
        let mut scene = Scene::new();
        let root = scene.create_model("root", ObjectType::Null).unwrap();
        let child = scene.create_model("child", ObjectType::Null).unwrap();
        scene.add_child(root, child).unwrap();

        let connections = scene.connections();
        assert_eq!(
            connections,
            vec![
                Connection::object(root.id(), ROOT_ID),
                Connection::object(child.id(), root.id()),
            ]
        );
    }

    #[test]
    fn test_objects_element_order() {
        let mut scene = Scene::new();
        scene.create_texture("t", "t.png");
        scene.create_material("m");
        let e = scene.objects_element(&WriteOptions::default());
        let names: Vec<&str> = e.children().iter().map(Element::name).collect();
        assert_eq!(names, ["Texture", "Material"]);
    }
}
