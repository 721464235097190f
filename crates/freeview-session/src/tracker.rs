use freeview_core::Structure;
use log::debug;
use serde::Serialize;

/// Per-structure tracking state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackingState {
    #[default]
    Idle,
    /// Marker seen and structure active, but not anchored (yet).
    Detected,
    Anchored,
}

/// What the coordinator has to do in response to a tracker signal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrackingAction {
    /// Nothing to do: duplicate signal or signal for an inactive structure.
    Ignore,
    /// Make this structure active, tearing down `previous` first.
    Activate { previous: Option<Structure> },
    /// Active structure seen again after an anchoring attempt failed.
    RetryAnchor,
    /// Active structure seen again after its marker was lost.
    Regained,
    /// The active structure's marker left the camera view.
    Lost,
}

/// Marker tracking state machine: one `Idle → Detected → Anchored` track
/// per structure, with at most one structure outside `Idle`.
#[derive(Clone, Debug, Default)]
pub struct MarkerTracker {
    states: [TrackingState; 3],
    active: Option<Structure>,
    marker_visible: bool,
}

fn slot(structure: Structure) -> usize {
    match structure {
        Structure::Bcc => 0,
        Structure::Fcc => 1,
        Structure::Hcp => 2,
    }
}

impl MarkerTracker {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn active(&self) -> Option<Structure> {
        self.active
    }

    pub fn state(&self, structure: Structure) -> TrackingState {
        self.states[slot(structure)]
    }

    /// Whether the active structure's marker is currently in view.
    pub fn marker_visible(&self) -> bool {
        self.active.is_some() && self.marker_visible
    }

    pub fn found(&mut self, structure: Structure) -> TrackingAction {
        if self.active == Some(structure) {
            let was_visible = std::mem::replace(&mut self.marker_visible, true);
            return match self.state(structure) {
                TrackingState::Detected => TrackingAction::RetryAnchor,
                _ if !was_visible => TrackingAction::Regained,
                _ => {
                    debug!("{structure} seen again while active; ignoring");
                    TrackingAction::Ignore
                }
            };
        }

        let previous = self.active.replace(structure);
        if let Some(prev) = previous {
            self.states[slot(prev)] = TrackingState::Idle;
        }
        self.states[slot(structure)] = TrackingState::Detected;
        self.marker_visible = true;
        TrackingAction::Activate { previous }
    }

    pub fn lost(&mut self, structure: Structure) -> TrackingAction {
        if self.active != Some(structure) {
            debug!("{structure} lost while inactive; ignoring");
            return TrackingAction::Ignore;
        }
        if !std::mem::replace(&mut self.marker_visible, false) {
            return TrackingAction::Ignore;
        }
        TrackingAction::Lost
    }

    /// Record the outcome of an anchoring attempt for the active structure.
    pub fn set_anchored(&mut self, structure: Structure, anchored: bool) {
        if self.active != Some(structure) {
            return;
        }
        self.states[slot(structure)] = if anchored {
            TrackingState::Anchored
        } else {
            TrackingState::Detected
        };
    }

    /// Back to all-`Idle` with nothing active.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
