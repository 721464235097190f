use freeview_anchor::AnchorState;
use freeview_core::{DisplayMode, Structure};
use freeview_gesture::ModelPose;
use serde::Serialize;

/// Runtime state of the active structure. Created on activation, dropped
/// when another structure takes over.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct TrackableSession {
    pub structure: Structure,
    pub mode: DisplayMode,
    pub anchor_state: AnchorState,
    /// Anchor distance in meters from the last successful measurement.
    pub last_known_distance: Option<f32>,
    pub pose: ModelPose,
}

impl TrackableSession {
    pub fn new(structure: Structure, mode: DisplayMode) -> Self {
        Self {
            structure,
            mode,
            anchor_state: AnchorState::Unanchored,
            last_known_distance: None,
            pose: ModelPose::default(),
        }
    }

    #[inline]
    pub fn scale(&self) -> f32 {
        self.pose.scale
    }

    #[inline]
    pub fn is_anchored(&self) -> bool {
        self.anchor_state == AnchorState::Anchored
    }
}
