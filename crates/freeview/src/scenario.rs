//! Scripted replay of tracker, input and frame events.
//!
//! A scenario lists marker placements and a timeline of events. Replaying it
//! builds the scene, drives a [`SessionCoordinator`] with a recording UI, and
//! returns a report with every UI notification and a snapshot per step.
//! `external_*` events stand in for the marker tracker meddling with the
//! scene on its own.

use std::{fs, path::Path};

use freeview_core::{NodeId, Scene, SceneError, SceneGraph, Structure, UnknownStructure};
use freeview_gesture::PointerEvent;
use freeview_session::layout::{build_scene, MarkerPlacement};
use freeview_session::{DebugSnapshot, RecordingUi, SessionCoordinator, UiEvent, ViewerConfig};
use log::{debug, info};
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

#[derive(thiserror::Error, Debug)]
pub enum ScenarioError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Scene(#[from] SceneError),
    #[error(transparent)]
    UnknownStructure(#[from] UnknownStructure),
    #[error("event {index}: no scene node named `{name}`")]
    UnknownNode { index: usize, name: String },
}

fn default_true() -> bool {
    true
}

fn default_frames() -> u32 {
    1
}

/// One timeline entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ScenarioEvent {
    Found {
        structure: String,
    },
    Lost {
        structure: String,
    },
    Pointer(PointerEvent),
    Wheel {
        delta_y: f32,
    },
    /// `frames` consecutive frame ticks of `dt` seconds each.
    Tick {
        dt: f32,
        #[serde(default = "default_frames")]
        frames: u32,
    },
    ToggleMode,
    TrackerReady,
    TrackerError {
        message: String,
    },
    /// The renderer becomes ready: the viewer frame resolves from now on.
    ViewerReady,
    /// The tracker hides a node.
    ExternalHide {
        node: String,
    },
    /// The tracker moves a node under another parent.
    ExternalReparent {
        node: String,
        parent: String,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub markers: Vec<MarkerPlacement>,
    /// Whether the viewer frame resolves from the start.
    #[serde(default = "default_true")]
    pub viewer_ready: bool,
    pub events: Vec<ScenarioEvent>,
}

impl Scenario {
    /// Load a JSON scenario from disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, ScenarioError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct ReplayStep {
    pub index: usize,
    pub event: ScenarioEvent,
    pub snapshot: DebugSnapshot,
}

#[derive(Clone, Debug, Serialize)]
pub struct ReplayReport {
    pub ui_events: Vec<UiEvent>,
    pub steps: Vec<ReplayStep>,
    pub final_snapshot: DebugSnapshot,
    /// Total mutating scene calls, from the coordinator and `external_*`
    /// events alike.
    pub scene_writes: u64,
}

impl ReplayReport {
    /// Write the report to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), ScenarioError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

/// Replay `scenario` against a fresh scene and coordinator.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip(scenario, config), fields(events = scenario.events.len()))
)]
pub fn replay(scenario: &Scenario, config: ViewerConfig) -> Result<ReplayReport, ScenarioError> {
    let (mut scene, _) = build_scene(&scenario.markers)?;
    let viewer = scene.viewer_frame();
    if !scenario.viewer_ready {
        scene.set_viewer_frame(None)?;
    }

    let mut coordinator = SessionCoordinator::new(config, RecordingUi::new());
    let mut steps = Vec::with_capacity(scenario.events.len());
    for (index, event) in scenario.events.iter().enumerate() {
        debug!("step {index}: {event:?}");
        apply_event(&mut coordinator, &mut scene, viewer, index, event)?;
        steps.push(ReplayStep {
            index,
            event: event.clone(),
            snapshot: coordinator.debug_snapshot(),
        });
    }

    let final_snapshot = coordinator.debug_snapshot();
    info!(
        "replayed {} events, {} scene writes",
        steps.len(),
        scene.write_count()
    );
    Ok(ReplayReport {
        ui_events: coordinator.into_ui().events,
        steps,
        final_snapshot,
        scene_writes: scene.write_count(),
    })
}

fn apply_event(
    coordinator: &mut SessionCoordinator<RecordingUi>,
    scene: &mut SceneGraph,
    viewer: Option<NodeId>,
    index: usize,
    event: &ScenarioEvent,
) -> Result<(), ScenarioError> {
    match event {
        ScenarioEvent::Found { structure } => {
            let s: Structure = structure.parse()?;
            coordinator.on_marker_found(scene, s);
        }
        ScenarioEvent::Lost { structure } => {
            let s: Structure = structure.parse()?;
            coordinator.on_marker_lost(scene, s);
        }
        ScenarioEvent::Pointer(ev) => {
            coordinator.on_pointer(scene, ev);
        }
        ScenarioEvent::Wheel { delta_y } => {
            coordinator.on_wheel(scene, *delta_y);
        }
        ScenarioEvent::Tick { dt, frames } => {
            for _ in 0..*frames {
                coordinator.on_frame(scene, *dt);
            }
        }
        ScenarioEvent::ToggleMode => coordinator.toggle_mode(scene),
        ScenarioEvent::TrackerReady => coordinator.on_tracker_ready(),
        ScenarioEvent::TrackerError { message } => coordinator.on_tracker_error(message),
        ScenarioEvent::ViewerReady => scene.set_viewer_frame(viewer)?,
        ScenarioEvent::ExternalHide { node } => {
            let id = lookup(scene, index, node)?;
            scene.set_visible(id, false)?;
        }
        ScenarioEvent::ExternalReparent { node, parent } => {
            let id = lookup(scene, index, node)?;
            let parent = lookup(scene, index, parent)?;
            scene.reparent(id, parent)?;
        }
    }
    Ok(())
}

fn lookup(scene: &SceneGraph, index: usize, name: &str) -> Result<NodeId, ScenarioError> {
    scene.find(name).ok_or_else(|| ScenarioError::UnknownNode {
        index,
        name: name.to_owned(),
    })
}

/// Short scenario covering detection, gestures, marker loss and tracker
/// interference. Printed by `freeview demo-scenario`.
pub fn demo_scenario() -> Scenario {
    let found = |s: &str| ScenarioEvent::Found {
        structure: s.to_owned(),
    };
    let lost = |s: &str| ScenarioEvent::Lost {
        structure: s.to_owned(),
    };
    let tick = ScenarioEvent::Tick {
        dt: 1.0 / 60.0,
        frames: 3,
    };
    Scenario {
        markers: Structure::ALL
            .into_iter()
            .map(|s| MarkerPlacement::ahead(s, 0.6))
            .collect(),
        viewer_ready: true,
        events: vec![
            ScenarioEvent::TrackerReady,
            found("bcc"),
            tick.clone(),
            ScenarioEvent::Pointer(PointerEvent::down(1, 200.0, 200.0)),
            ScenarioEvent::Pointer(PointerEvent::moved(1, 260.0, 180.0)),
            ScenarioEvent::Pointer(PointerEvent::up(1, 260.0, 180.0)),
            lost("bcc"),
            ScenarioEvent::ExternalHide {
                node: "bcc-atom".to_owned(),
            },
            ScenarioEvent::ExternalReparent {
                node: "bcc-atom".to_owned(),
                parent: "bcc-target".to_owned(),
            },
            tick.clone(),
            ScenarioEvent::ToggleMode,
            ScenarioEvent::Wheel { delta_y: -120.0 },
            found("hcp"),
            tick,
        ],
    }
}
