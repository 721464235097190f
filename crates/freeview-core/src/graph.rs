//! In-memory scene graph.
//!
//! A small reference [`Scene`] implementation: named nodes, parent links,
//! uniform-scale local transforms and a visibility flag per node. It also
//! counts every mutating call so callers can observe whether anything is
//! still writing to the scene.

use std::collections::HashMap;

use nalgebra::{Point3, Similarity3};

use crate::{LocalTransform, NodeId, Scene, SceneError};

#[derive(Clone, Debug)]
struct NodeRecord {
    name: String,
    parent: Option<NodeId>,
    local: LocalTransform,
    visible: bool,
}

#[derive(Clone, Debug, Default)]
pub struct SceneGraph {
    nodes: Vec<NodeRecord>,
    by_name: HashMap<String, NodeId>,
    viewer: Option<NodeId>,
    writes: u64,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a visible node. Names must be unique.
    pub fn add_node(
        &mut self,
        name: impl Into<String>,
        parent: Option<NodeId>,
        local: LocalTransform,
    ) -> Result<NodeId, SceneError> {
        let name = name.into();
        if self.by_name.contains_key(&name) {
            return Err(SceneError::DuplicateName(name));
        }
        if let Some(p) = parent {
            self.record(p)?;
        }
        let id = NodeId(self.nodes.len() as u32);
        self.by_name.insert(name.clone(), id);
        self.nodes.push(NodeRecord {
            name,
            parent,
            local,
            visible: true,
        });
        Ok(id)
    }

    /// Declare (or clear) the viewer frame.
    pub fn set_viewer_frame(&mut self, viewer: Option<NodeId>) -> Result<(), SceneError> {
        if let Some(v) = viewer {
            self.record(v)?;
        }
        self.viewer = viewer;
        Ok(())
    }

    /// Number of mutating calls so far.
    #[inline]
    pub fn write_count(&self) -> u64 {
        self.writes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Direct children of `node`, in insertion order.
    pub fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, rec)| rec.parent == Some(node))
            .map(|(i, _)| NodeId(i as u32))
            .collect()
    }

    /// A node is effectively shown only if it and all of its ancestors are.
    pub fn is_effectively_visible(&self, node: NodeId) -> bool {
        let mut cur = Some(node);
        while let Some(id) = cur {
            match self.nodes.get(id.0 as usize) {
                Some(rec) if rec.visible => cur = rec.parent,
                _ => return false,
            }
        }
        true
    }

    /// Node-to-world similarity. `None` for unknown nodes or when a node on
    /// the chain has a degenerate scale.
    pub fn world_similarity(&self, node: NodeId) -> Option<Similarity3<f32>> {
        let rec = self.record(node).ok()?;
        let mut acc = rec.local.to_similarity()?;
        let mut cur = rec.parent;
        while let Some(id) = cur {
            let rec = self.record(id).ok()?;
            acc = rec.local.to_similarity()? * acc;
            cur = rec.parent;
        }
        Some(acc)
    }

    fn record(&self, node: NodeId) -> Result<&NodeRecord, SceneError> {
        self.nodes
            .get(node.0 as usize)
            .ok_or(SceneError::UnknownNode(node))
    }

    fn record_mut(&mut self, node: NodeId) -> Result<&mut NodeRecord, SceneError> {
        self.nodes
            .get_mut(node.0 as usize)
            .ok_or(SceneError::UnknownNode(node))
    }

    fn is_ancestor_or_self(&self, candidate: NodeId, node: NodeId) -> bool {
        let mut cur = Some(node);
        while let Some(id) = cur {
            if id == candidate {
                return true;
            }
            cur = self.nodes.get(id.0 as usize).and_then(|r| r.parent);
        }
        false
    }
}

impl Scene for SceneGraph {
    fn find(&self, name: &str) -> Option<NodeId> {
        self.by_name.get(name).copied()
    }

    fn name(&self, node: NodeId) -> Option<&str> {
        self.record(node).ok().map(|r| r.name.as_str())
    }

    fn viewer_frame(&self) -> Option<NodeId> {
        self.viewer
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.record(node).ok()?.parent
    }

    fn local_transform(&self, node: NodeId) -> Option<LocalTransform> {
        self.record(node).ok().map(|r| r.local)
    }

    fn world_position(&self, node: NodeId) -> Option<Point3<f32>> {
        let mut p = Point3::origin();
        let mut cur = Some(node);
        while let Some(id) = cur {
            let rec = self.record(id).ok()?;
            p = rec.local.apply(p);
            cur = rec.parent;
        }
        Some(p)
    }

    fn is_visible(&self, node: NodeId) -> Option<bool> {
        self.record(node).ok().map(|r| r.visible)
    }

    fn set_local_transform(
        &mut self,
        node: NodeId,
        transform: LocalTransform,
    ) -> Result<(), SceneError> {
        self.record_mut(node)?.local = transform;
        self.writes += 1;
        Ok(())
    }

    fn reparent(&mut self, node: NodeId, parent: NodeId) -> Result<(), SceneError> {
        self.record(node)?;
        self.record(parent)?;
        if self.is_ancestor_or_self(node, parent) {
            return Err(SceneError::CycleDetected { node, parent });
        }
        self.record_mut(node)?.parent = Some(parent);
        self.writes += 1;
        Ok(())
    }

    fn set_visible(&mut self, node: NodeId, visible: bool) -> Result<(), SceneError> {
        self.record_mut(node)?.visible = visible;
        self.writes += 1;
        Ok(())
    }
}
