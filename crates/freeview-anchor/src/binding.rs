use freeview_core::{LocalTransform, NodeId};
use freeview_gesture::ModelPose;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// Lifecycle of the controller's anchor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnchorState {
    #[default]
    Unanchored,
    /// Distance measurement and re-parenting in progress.
    Anchoring,
    Anchored,
}

/// The reference frame a node is currently bound to.
///
/// A node has exactly one binding. The controller stores it explicitly
/// instead of inferring it from parent links.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "frame", rename_all = "snake_case")]
pub enum AnchorBinding {
    /// Follows the tracked marker.
    Marker { node: NodeId, marker: NodeId },
    /// Floats in front of the viewer at a fixed distance (meters).
    Viewer {
        node: NodeId,
        viewer: NodeId,
        distance: f32,
    },
}

impl AnchorBinding {
    #[inline]
    pub fn node(&self) -> NodeId {
        match *self {
            AnchorBinding::Marker { node, .. } | AnchorBinding::Viewer { node, .. } => node,
        }
    }

    pub fn distance(&self) -> Option<f32> {
        match *self {
            AnchorBinding::Viewer { distance, .. } => Some(distance),
            AnchorBinding::Marker { .. } => None,
        }
    }
}

/// What to anchor: the node to show, plus sibling representations that
/// must stay hidden while it is anchored.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnchorRequest {
    pub node: NodeId,
    pub hidden: Vec<NodeId>,
}

impl AnchorRequest {
    pub fn new(node: NodeId) -> Self {
        Self {
            node,
            hidden: Vec::new(),
        }
    }

    pub fn hiding(mut self, nodes: impl IntoIterator<Item = NodeId>) -> Self {
        self.hidden.extend(nodes);
        self
    }
}

/// Where a node lived before it was anchored.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct NodeOrigin {
    pub parent: NodeId,
    pub transform: LocalTransform,
}

/// Local offset of an anchored node: straight ahead along the viewer's
/// forward axis (-Z), no lateral offset.
#[inline]
pub fn anchor_offset(distance: f32) -> Vector3<f32> {
    Vector3::new(0.0, 0.0, -distance)
}

/// Local transform of an anchored node for a given pose.
pub(crate) fn anchored_transform(
    origin: &LocalTransform,
    distance: f32,
    pose: ModelPose,
) -> LocalTransform {
    LocalTransform {
        translation: anchor_offset(distance),
        rotation: LocalTransform::rotation_from_degrees(pose.pitch, pose.yaw) * origin.rotation,
        scale: origin.scale * pose.scale,
    }
}
