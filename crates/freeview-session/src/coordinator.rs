use freeview_anchor::{
    AnchorController, AnchorError, AnchorRequest, AnchorState, EnforcementReport,
};
use freeview_core::{DisplayMode, NodeId, Scene, Structure};
use freeview_gesture::{GestureOutput, ModelPose, PointerEvent};
use log::{debug, info, warn};
use serde::Serialize;

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{
    MarkerTracker, TrackableSession, TrackingAction, TrackingState, UiSink, ViewerConfig,
};

const STATUS_CAMERA_READY: &str = "Camera ready - hold a marker in front of the camera";

/// Point-in-time view of the coordinator, for diagnostics and tests.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DebugSnapshot {
    pub structure: Option<Structure>,
    pub mode: DisplayMode,
    pub anchor_state: AnchorState,
    pub tracking: Option<TrackingState>,
    pub marker_visible: bool,
    pub anchored_node: Option<NodeId>,
    pub distance: Option<f32>,
    pub pose: Option<ModelPose>,
    pub enforcer_running: bool,
    pub enforcer_corrections: u64,
}

/// Owns the single active session and routes tracker, input and frame
/// events to the anchor controller and the UI.
///
/// Every entry point takes the scene by `&mut`; the coordinator never holds
/// on to it. Failures are logged and surfaced as status text, never
/// returned.
pub struct SessionCoordinator<U: UiSink> {
    config: ViewerConfig,
    tracker: MarkerTracker,
    controller: AnchorController,
    session: Option<TrackableSession>,
    mode: DisplayMode,
    ui: U,
}

impl<U: UiSink> SessionCoordinator<U> {
    pub fn new(config: ViewerConfig, ui: U) -> Self {
        Self {
            controller: AnchorController::new(config.anchor, config.enforcer, config.gesture),
            tracker: MarkerTracker::new(),
            session: None,
            mode: config.initial_mode,
            config,
            ui,
        }
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    /// Currently selected display mode. Survives structure switches.
    #[inline]
    pub fn mode(&self) -> DisplayMode {
        self.mode
    }

    pub fn active_structure(&self) -> Option<Structure> {
        self.session.as_ref().map(|s| s.structure)
    }

    pub fn session(&self) -> Option<&TrackableSession> {
        self.session.as_ref()
    }

    pub fn tracker(&self) -> &MarkerTracker {
        &self.tracker
    }

    pub fn controller(&self) -> &AnchorController {
        &self.controller
    }

    pub fn ui(&self) -> &U {
        &self.ui
    }

    pub fn ui_mut(&mut self) -> &mut U {
        &mut self.ui
    }

    pub fn into_ui(self) -> U {
        self.ui
    }

    /// The tracker reports `structure`'s marker in view.
    #[cfg_attr(feature = "tracing", instrument(level = "info", skip(self, scene)))]
    pub fn on_marker_found<S: Scene + ?Sized>(&mut self, scene: &mut S, structure: Structure) {
        match self.tracker.found(structure) {
            TrackingAction::Ignore => {}
            TrackingAction::Activate { previous } => {
                if let Some(prev) = previous {
                    info!("switching from {prev} to {structure}");
                    self.deactivate(scene, prev);
                }
                self.activate(scene, structure);
            }
            TrackingAction::RetryAnchor => {
                debug!("{structure} seen again, retrying anchor");
                self.set_status(&detected_text(structure), true);
                self.try_anchor(scene);
            }
            TrackingAction::Regained => {
                self.set_status(&detected_text(structure), true);
            }
            TrackingAction::Lost => {}
        }
    }

    /// The tracker reports `structure`'s marker out of view. An anchored
    /// model stays where it is; only the status changes.
    #[cfg_attr(feature = "tracing", instrument(level = "info", skip(self, scene)))]
    pub fn on_marker_lost<S: Scene + ?Sized>(&mut self, scene: &mut S, structure: Structure) {
        if self.tracker.lost(structure) != TrackingAction::Lost {
            return;
        }
        let name = structure.info().name;
        if self.session.is_some_and(|s| s.is_anchored()) {
            // The tracker hides marker content as soon as it loses the
            // marker; correct that now rather than on the next frame.
            self.controller.enforce_now(scene);
            self.set_status(&format!("{name} - free to rotate (marker not visible)"), true);
        } else {
            debug!("{structure} lost before it could be anchored");
            self.set_status(&format!("{name} - marker not visible"), false);
        }
    }

    /// Switch between the two display modes.
    ///
    /// With an active structure this shows the other representation and, if
    /// anchored, moves the anchor over to it in one step. Any gesture in
    /// progress is cancelled; the model keeps its orientation and zoom.
    #[cfg_attr(feature = "tracing", instrument(level = "info", skip(self, scene)))]
    pub fn toggle_mode<S: Scene + ?Sized>(&mut self, scene: &mut S) {
        let next = self.mode.toggled();
        let Some(session) = self.session else {
            self.mode = next;
            self.ui.mode_changed(next);
            return;
        };

        let names = session.structure.node_names();
        let Some(shown) = scene.find(names.representation(next)) else {
            warn!(
                "{}",
                AnchorError::NodeNotFound(names.representation(next).to_owned())
            );
            return;
        };
        let hidden: Vec<NodeId> = scene
            .find(names.representation(session.mode))
            .into_iter()
            .collect();

        self.controller.cancel_gesture();
        if self.controller.is_anchored() {
            let request = AnchorRequest::new(shown).hiding(hidden);
            match self.controller.rebind(scene, request, session.pose) {
                Ok(binding) => {
                    if let Some(s) = self.session.as_mut() {
                        s.last_known_distance = binding.distance();
                    }
                }
                Err(err) => {
                    warn!("mode switch to {} skipped: {err}", next.label());
                    if !self.controller.is_anchored() {
                        // Neither node made it under the viewer frame.
                        self.fall_back_to_detected(session.structure);
                    }
                    return;
                }
            }
        } else {
            set_visible(scene, shown, true);
            for node in hidden {
                set_visible(scene, node, false);
            }
        }

        self.mode = next;
        if let Some(s) = self.session.as_mut() {
            s.mode = next;
        }
        info!("display mode is now {}", next.label());
        self.ui.mode_changed(next);
    }

    /// Pointer input for the anchored model.
    pub fn on_pointer<S: Scene + ?Sized>(
        &mut self,
        scene: &mut S,
        event: &PointerEvent,
    ) -> Option<GestureOutput> {
        let session = self.session.as_mut()?;
        match self
            .controller
            .handle_pointer(scene, event, &mut session.pose)
        {
            Ok(out) => out,
            Err(err) => {
                warn!("pointer input dropped: {err}");
                None
            }
        }
    }

    /// Mouse wheel zoom for the anchored model.
    pub fn on_wheel<S: Scene + ?Sized>(
        &mut self,
        scene: &mut S,
        delta_y: f32,
    ) -> Option<GestureOutput> {
        let session = self.session.as_mut()?;
        match self
            .controller
            .handle_wheel(scene, delta_y, &mut session.pose)
        {
            Ok(out) => out,
            Err(err) => {
                warn!("wheel input dropped: {err}");
                None
            }
        }
    }

    /// Per-frame hook; drives the visibility enforcer.
    pub fn on_frame<S: Scene + ?Sized>(
        &mut self,
        scene: &mut S,
        dt: f32,
    ) -> Option<EnforcementReport> {
        self.controller.tick(scene, dt)
    }

    pub fn on_tracker_ready(&mut self) {
        self.set_status(STATUS_CAMERA_READY, true);
    }

    pub fn on_tracker_error(&mut self, message: &str) {
        warn!("marker tracker error: {message}");
        self.set_status(&format!("Error: {message}"), false);
    }

    /// Unanchor and hide the active structure and forget the session.
    #[cfg_attr(feature = "tracing", instrument(level = "info", skip(self, scene)))]
    pub fn shutdown<S: Scene + ?Sized>(&mut self, scene: &mut S) {
        if let Some(active) = self.active_structure() {
            self.deactivate(scene, active);
        }
        self.tracker.reset();
    }

    pub fn debug_snapshot(&self) -> DebugSnapshot {
        let structure = self.active_structure();
        DebugSnapshot {
            structure,
            mode: self.mode,
            anchor_state: self
                .session
                .map(|s| s.anchor_state)
                .unwrap_or_default(),
            tracking: structure.map(|s| self.tracker.state(s)),
            marker_visible: self.tracker.marker_visible(),
            anchored_node: self.controller.anchored_node(),
            distance: self.controller.distance(),
            pose: self.session.map(|s| s.pose),
            enforcer_running: self.controller.enforcer().is_running(),
            enforcer_corrections: self.controller.enforcer().corrections(),
        }
    }

    fn activate<S: Scene + ?Sized>(&mut self, scene: &mut S, structure: Structure) {
        hide_all_except(scene, structure);
        self.session = Some(TrackableSession::new(structure, self.mode));
        self.ui.structure_activated(structure);
        self.set_status(&detected_text(structure), true);

        let names = structure.node_names();
        for mode in DisplayMode::ALL {
            if let Some(node) = scene.find(names.representation(mode)) {
                set_visible(scene, node, mode == self.mode);
            }
        }
        self.try_anchor(scene);
    }

    fn try_anchor<S: Scene + ?Sized>(&mut self, scene: &mut S) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let structure = session.structure;
        let names = structure.node_names();
        let wanted = names.representation(session.mode);
        let Some(node) = scene.find(wanted) else {
            warn!(
                "{structure}: {}",
                AnchorError::NodeNotFound(wanted.to_owned())
            );
            return;
        };
        let hidden = scene.find(names.representation(session.mode.toggled()));

        session.anchor_state = AnchorState::Anchoring;
        session.pose = ModelPose::default();
        let request = AnchorRequest::new(node).hiding(hidden);
        match self.controller.begin_anchor(scene, request, session.pose) {
            Ok(binding) => {
                session.anchor_state = AnchorState::Anchored;
                session.last_known_distance = binding.distance();
                self.tracker.set_anchored(structure, true);
                let text = format!("{} - free to rotate & zoom", structure.info().name);
                self.set_status(&text, true);
            }
            Err(err) => {
                session.anchor_state = AnchorState::Unanchored;
                self.tracker.set_anchored(structure, false);
                warn!("{structure} could not be anchored: {err}");
                if err == AnchorError::AnchorUnavailable {
                    let text = format!("{} detected - viewer not ready", structure.info().name);
                    self.set_status(&text, false);
                }
            }
        }
    }

    /// Release the anchor (if any) and hide both representations.
    fn deactivate<S: Scene + ?Sized>(&mut self, scene: &mut S, structure: Structure) {
        if self.controller.is_anchored() {
            if let Err(err) = self.controller.end_anchor(scene) {
                warn!("releasing {structure} failed: {err}");
                self.controller.abandon();
            }
        } else {
            self.controller.cancel_gesture();
        }
        let names = structure.node_names();
        for mode in DisplayMode::ALL {
            if let Some(node) = scene.find(names.representation(mode)) {
                set_visible(scene, node, false);
            }
        }
        self.session = None;
        debug!("{structure} deactivated");
    }

    /// Bring the session and tracker back in line with a controller that
    /// lost its anchor, so the next detection retries.
    fn fall_back_to_detected(&mut self, structure: Structure) {
        if let Some(s) = self.session.as_mut() {
            s.anchor_state = AnchorState::Unanchored;
        }
        self.tracker.set_anchored(structure, false);
        self.set_status(&detected_text(structure), false);
    }

    fn set_status(&mut self, text: &str, emphasized: bool) {
        debug!("status: {text}");
        self.ui.status_changed(text, emphasized);
    }
}

fn detected_text(structure: Structure) -> String {
    format!("{} detected", structure.info().name)
}

fn set_visible<S: Scene + ?Sized>(scene: &mut S, node: NodeId, visible: bool) {
    if scene.is_visible(node) == Some(visible) {
        return;
    }
    if let Err(err) = scene.set_visible(node, visible) {
        warn!("visibility of {} not updated: {err}", scene.label(node));
    }
}

fn hide_all_except<S: Scene + ?Sized>(scene: &mut S, keep: Structure) {
    for structure in Structure::ALL.into_iter().filter(|&s| s != keep) {
        let names = structure.node_names();
        for mode in DisplayMode::ALL {
            if let Some(node) = scene.find(names.representation(mode)) {
                set_visible(scene, node, false);
            }
        }
    }
}
