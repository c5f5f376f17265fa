//! Bind poses: per-node world matrices captured at skin bind time.

use crate::core::{
    impl_object_base, ClassType, IdMap, ObjectBase, ObjectHandle, ObjectId, ObjectType,
    SceneObject, WriteOptions,
};
use crate::tree::{Attribute, Element};
use crate::util::{matrix_from_slice, matrix_to_vec, DMat4, Error, Result};

const POSE_VERSION: i32 = 100;

/// One pose entry.
///
/// Parsing produces `Unresolved` entries keyed by the wire identifier of the
/// node; identifier resolution turns them into `Resolved` ones or drops them.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Binding {
    Unresolved { node: ObjectId, matrix: DMat4 },
    Resolved { target: ObjectHandle, matrix: DMat4 },
}

impl Binding {
    pub fn new(target: ObjectHandle, matrix: DMat4) -> Self {
        Self::Resolved { target, matrix }
    }

    pub fn matrix(&self) -> DMat4 {
        match *self {
            Self::Unresolved { matrix, .. } | Self::Resolved { matrix, .. } => matrix,
        }
    }

    pub fn target(&self) -> Option<ObjectHandle> {
        match *self {
            Self::Resolved { target, .. } => Some(target),
            Self::Unresolved { .. } => None,
        }
    }

    fn node_id(&self) -> ObjectId {
        match *self {
            Self::Unresolved { node, .. } => node,
            Self::Resolved { target, .. } => target.id(),
        }
    }
}

/// Bind pose object.
#[derive(Clone, Debug)]
pub struct BindPose {
    base: ObjectBase,
    bindings: Vec<Binding>,
}

impl BindPose {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            base: ObjectBase::new(name),
            bindings: Vec::new(),
        }
    }

    /// Phase-1 parse. A missing or malformed matrix becomes the identity;
    /// entries without an integer node identifier are skipped.
    pub fn from_element(element: &Element) -> Self {
        let mut pose = Self {
            base: ObjectBase::from_element(element),
            bindings: Vec::new(),
        };

        let declared = element.child_attribute("NbPoseNodes").and_then(Attribute::as_i64);
        if declared.unwrap_or(0) == 0 {
            return pose;
        }

        for node in element.children_named("PoseNode") {
            let Some(Attribute::Int64(id)) = node.child_attribute("Node") else {
                tracing::debug!(pose = pose.base.name(), "pose node without an identifier");
                continue;
            };
            let matrix = node
                .child_attribute("Matrix")
                .and_then(Attribute::as_f64_slice)
                .and_then(matrix_from_slice)
                .unwrap_or_else(|| {
                    tracing::debug!(node = id, "bad pose matrix, using identity");
                    DMat4::IDENTITY
                });
            pose.bindings.push(Binding::Unresolved { node: *id, matrix });
        }
        pose
    }

    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    /// Binding for `target`, if any.
    pub fn binding_for(&self, target: ObjectHandle) -> Option<&Binding> {
        self.bindings.iter().find(|b| b.target() == Some(target))
    }

    pub fn add_binding(&mut self, binding: Binding) -> Result<()> {
        self.add_binding_at(binding, self.bindings.len())
    }

    /// Insert a binding at `index`, or replace the matrix of an existing
    /// binding for the same target. Unresolved bindings are rejected.
    pub fn add_binding_at(&mut self, binding: Binding, index: usize) -> Result<()> {
        let Some(target) = binding.target() else {
            return Err(Error::invalid(format!(
                "binding for node {} is not resolved to a scene object",
                binding.node_id()
            )));
        };
        if target.scene() != self.base.scene() {
            return Err(Error::CrossScene(target));
        }
        if index > self.bindings.len() {
            return Err(Error::out_of_range(index, self.bindings.len()));
        }
        match self.bindings.iter_mut().find(|b| b.target() == Some(target)) {
            Some(existing) => *existing = binding,
            None => self.bindings.insert(index, binding),
        }
        Ok(())
    }

    /// Remove the first binding equal to `binding` (target and matrix).
    pub fn remove_binding(&mut self, binding: &Binding) -> bool {
        match self.bindings.iter().position(|b| b == binding) {
            Some(pos) => {
                self.bindings.remove(pos);
                true
            }
            None => false,
        }
    }

    pub fn remove_binding_at(&mut self, index: usize) -> Result<Binding> {
        if index >= self.bindings.len() {
            return Err(Error::out_of_range(index, self.bindings.len()));
        }
        Ok(self.bindings.remove(index))
    }
}

impl SceneObject for BindPose {
    impl_object_base!();

    fn class(&self) -> ClassType {
        ClassType::Pose
    }

    fn object_type(&self) -> ObjectType {
        ObjectType::BindPose
    }

    fn to_element(&self, options: &WriteOptions) -> Element {
        let mut children = vec![
            Element::with_attribute("Type", "BindPose"),
            Element::with_attribute("Version", POSE_VERSION),
            Element::with_attribute("NbPoseNodes", self.bindings.len() as i32),
        ];
        children.extend(self.bindings.iter().map(|b| {
            Element::new("PoseNode")
                .child(Element::with_attribute("Node", b.node_id()))
                .child(Element::with_attribute("Matrix", matrix_to_vec(&b.matrix())))
        }));

        Element::with_parts(
            self.class().element_name(),
            self.base.header_attributes(self.class(), ObjectType::BindPose, options),
            children,
        )
    }

    /// Replace placeholders by live bindings; unknown identifiers are removed.
    fn resolve_references(&mut self, ids: &IdMap) {
        let before = self.bindings.len();
        self.bindings.retain_mut(|binding| match *binding {
            Binding::Unresolved { node, matrix } => match ids.get(&node) {
                Some(&target) => {
                    *binding = Binding::Resolved { target, matrix };
                    true
                }
                None => false,
            },
            Binding::Resolved { .. } => true,
        });
        if self.bindings.len() != before {
            tracing::debug!(
                pose = self.base.name(),
                dropped = before - self.bindings.len(),
                "unresolved pose nodes removed"
            );
        }
    }

    fn release(&mut self, handle: ObjectHandle) {
        self.bindings.retain(|b| b.target() != Some(handle));
    }
}
