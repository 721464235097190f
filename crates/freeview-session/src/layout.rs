//! Builds the scene a marker tracker and renderer would set up.

use freeview_core::{LocalTransform, NodeId, Scene, SceneError, SceneGraph, Structure};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// Name of the viewer frame node.
pub const VIEWER_NODE: &str = "camera";

fn default_model_scale() -> f32 {
    0.1
}

/// Where a structure's marker sits relative to the viewer, in meters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MarkerPlacement {
    pub structure: Structure,
    pub position: [f32; 3],
    /// Nominal scale of the structure's models under the marker frame.
    #[serde(default = "default_model_scale")]
    pub model_scale: f32,
}

impl MarkerPlacement {
    /// Marker straight ahead of the viewer at `distance` meters.
    pub fn ahead(structure: Structure, distance: f32) -> Self {
        Self {
            structure,
            position: [0.0, 0.0, -distance],
            model_scale: default_model_scale(),
        }
    }
}

/// Handles of one structure's nodes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StructureNodes {
    pub target: NodeId,
    pub atom: NodeId,
    pub schematic: NodeId,
}

/// Build a scene with a viewer frame and, per placement, a marker frame
/// holding both representations. Models start hidden, as the tracker shows
/// them only once their marker is found.
pub fn build_scene(
    placements: &[MarkerPlacement],
) -> Result<(SceneGraph, Vec<StructureNodes>), SceneError> {
    let mut scene = SceneGraph::new();
    let viewer = scene.add_node(VIEWER_NODE, None, LocalTransform::identity())?;
    scene.set_viewer_frame(Some(viewer))?;

    let mut nodes = Vec::with_capacity(placements.len());
    for p in placements {
        let names = p.structure.node_names();
        let [x, y, z] = p.position;
        let target = scene.add_node(
            names.target,
            None,
            LocalTransform::from_translation(Vector3::new(x, y, z)),
        )?;
        let model = LocalTransform::identity().with_scale(p.model_scale);
        let atom = scene.add_node(names.atom, Some(target), model)?;
        let schematic = scene.add_node(names.schematic, Some(target), model)?;
        scene.set_visible(atom, false)?;
        scene.set_visible(schematic, false)?;
        nodes.push(StructureNodes {
            target,
            atom,
            schematic,
        });
    }
    Ok((scene, nodes))
}

/// One marker per structure, all one meter ahead.
pub fn default_scene() -> Result<(SceneGraph, Vec<StructureNodes>), SceneError> {
    let placements: Vec<_> = Structure::ALL
        .into_iter()
        .map(|s| MarkerPlacement::ahead(s, 1.0))
        .collect();
    build_scene(&placements)
}
