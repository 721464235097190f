//! Spatial node interface exposed by the renderer.

use std::fmt;

use nalgebra::Point3;
use serde::{Deserialize, Serialize};

use crate::LocalTransform;

/// Opaque handle of a renderer-owned scene node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Errors returned by scene operations.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SceneError {
    #[error("unknown scene node {0}")]
    UnknownNode(NodeId),
    #[error("re-parenting {node} under {parent} would create a cycle")]
    CycleDetected { node: NodeId, parent: NodeId },
    #[error("a node named `{0}` already exists")]
    DuplicateName(String),
}

/// Per-node operations the anchoring core needs from the renderer.
///
/// Implementations own the nodes; the core only holds [`NodeId`]s.
pub trait Scene {
    /// Look up a node by name.
    fn find(&self, name: &str) -> Option<NodeId>;

    /// Node name, if the node exists.
    fn name(&self, node: NodeId) -> Option<&str>;

    /// The frame that follows the viewer's eye. `None` until the renderer
    /// is ready.
    fn viewer_frame(&self) -> Option<NodeId>;

    fn parent(&self, node: NodeId) -> Option<NodeId>;

    fn local_transform(&self, node: NodeId) -> Option<LocalTransform>;

    fn world_position(&self, node: NodeId) -> Option<Point3<f32>>;

    fn is_visible(&self, node: NodeId) -> Option<bool>;

    fn set_local_transform(
        &mut self,
        node: NodeId,
        transform: LocalTransform,
    ) -> Result<(), SceneError>;

    /// Move `node` under `parent`, keeping its local transform.
    fn reparent(&mut self, node: NodeId, parent: NodeId) -> Result<(), SceneError>;

    fn set_visible(&mut self, node: NodeId, visible: bool) -> Result<(), SceneError>;

    /// Name for logging, falling back to the numeric handle.
    fn label(&self, node: NodeId) -> String {
        self.name(node)
            .map(str::to_owned)
            .unwrap_or_else(|| node.to_string())
    }
}
