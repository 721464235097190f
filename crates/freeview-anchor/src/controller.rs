use freeview_core::{LocalTransform, NodeId, Scene};
use freeview_gesture::{GestureInterpreter, GestureOutput, GestureParams, ModelPose, PointerEvent};
use log::{debug, info, warn};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::binding::{anchored_transform, NodeOrigin};
use crate::enforcer::{EnforcementReport, EnforcementTarget, EnforcerParams, VisibilityEnforcer};
use crate::{AnchorBinding, AnchorError, AnchorParams, AnchorRequest, AnchorState};

#[derive(Clone, Debug)]
struct ActiveAnchor {
    binding: AnchorBinding,
    origin: NodeOrigin,
    hidden: Vec<NodeId>,
}

impl ActiveAnchor {
    fn enforcement_target(&self) -> Option<EnforcementTarget> {
        match self.binding {
            AnchorBinding::Viewer {
                node,
                viewer,
                distance,
            } => Some(EnforcementTarget {
                node,
                viewer,
                distance,
                hidden: self.hidden.clone(),
            }),
            AnchorBinding::Marker { .. } => None,
        }
    }
}

/// Moves a node from its marker frame to a fixed spot in front of the
/// viewer and back.
///
/// While a node is anchored the controller owns the node's
/// [`VisibilityEnforcer`] and enables gesture input for it. Both are torn
/// down by [`end_anchor`](Self::end_anchor).
#[derive(Clone, Debug)]
pub struct AnchorController {
    params: AnchorParams,
    state: AnchorState,
    active: Option<ActiveAnchor>,
    enforcer: VisibilityEnforcer,
    gestures: GestureInterpreter,
}

impl Default for AnchorController {
    fn default() -> Self {
        Self::new(
            AnchorParams::default(),
            EnforcerParams::default(),
            GestureParams::default(),
        )
    }
}

impl AnchorController {
    pub fn new(params: AnchorParams, enforcer: EnforcerParams, gestures: GestureParams) -> Self {
        Self {
            params,
            state: AnchorState::Unanchored,
            active: None,
            enforcer: VisibilityEnforcer::new(enforcer),
            gestures: GestureInterpreter::new(gestures),
        }
    }

    #[inline]
    pub fn params(&self) -> &AnchorParams {
        &self.params
    }

    #[inline]
    pub fn state(&self) -> AnchorState {
        self.state
    }

    #[inline]
    pub fn is_anchored(&self) -> bool {
        self.state == AnchorState::Anchored
    }

    /// Binding of the anchored node, if any.
    pub fn binding(&self) -> Option<&AnchorBinding> {
        self.active.as_ref().map(|a| &a.binding)
    }

    pub fn anchored_node(&self) -> Option<NodeId> {
        self.binding().map(AnchorBinding::node)
    }

    pub fn distance(&self) -> Option<f32> {
        self.binding().and_then(AnchorBinding::distance)
    }

    pub fn enforcer(&self) -> &VisibilityEnforcer {
        &self.enforcer
    }

    pub fn gestures(&self) -> &GestureInterpreter {
        &self.gestures
    }

    /// Anchor `request.node` in front of the viewer.
    ///
    /// Measures the node's distance to the viewer frame, clamps it into the
    /// configured range, and re-parents the node under the viewer frame at
    /// that distance along the forward axis. On failure the node keeps its
    /// marker binding. Calling this again for the node that is already
    /// anchored returns the existing binding without touching the scene.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip(self, scene, request, pose), fields(node = request.node.0))
    )]
    pub fn begin_anchor<S: Scene + ?Sized>(
        &mut self,
        scene: &mut S,
        request: AnchorRequest,
        pose: ModelPose,
    ) -> Result<AnchorBinding, AnchorError> {
        if let Some(active) = &self.active {
            if active.binding.node() == request.node {
                debug!("{} already anchored", scene.label(request.node));
                return Ok(active.binding);
            }
            return Err(AnchorError::InvalidTransition(
                "another node is anchored; rebind instead",
            ));
        }

        self.state = AnchorState::Anchoring;
        let result = self.measure_and_enter(scene, &request, pose);
        match result {
            Ok(active) => {
                let binding = active.binding;
                self.start_anchored(active);
                info!(
                    "anchored {} at {:.3} m",
                    scene.label(request.node),
                    binding.distance().unwrap_or_default()
                );
                Ok(binding)
            }
            Err(err) => {
                self.state = AnchorState::Unanchored;
                warn!("anchoring {} failed: {err}", scene.label(request.node));
                Err(err)
            }
        }
    }

    /// Stop enforcement and gestures, then put the node back under its
    /// marker frame with its original local transform.
    ///
    /// Returns the restored marker binding. Without an active anchor this is
    /// a no-op reported as [`AnchorError::InvalidTransition`]. If the scene
    /// refuses the move the node stays anchored and enforced.
    #[cfg_attr(feature = "tracing", instrument(level = "info", skip(self, scene)))]
    pub fn end_anchor<S: Scene + ?Sized>(
        &mut self,
        scene: &mut S,
    ) -> Result<AnchorBinding, AnchorError> {
        let Some(active) = self.active.take() else {
            self.state = AnchorState::Unanchored;
            return Err(AnchorError::InvalidTransition("nothing is anchored"));
        };
        self.enforcer.stop();
        self.gestures.disable();
        self.state = AnchorState::Unanchored;

        let node = active.binding.node();
        if let Err(err) = restore_origin(scene, node, &active.origin) {
            warn!("releasing {} failed ({err}); still anchored", scene.label(node));
            self.start_anchored(active);
            return Err(err);
        }
        info!("released {} back to its marker", scene.label(node));
        Ok(AnchorBinding::Marker {
            node,
            marker: active.origin.parent,
        })
    }

    /// Drop the anchor without touching the scene.
    ///
    /// For callers giving up after [`end_anchor`](Self::end_anchor) failed.
    /// The node stays wherever the scene left it.
    pub fn abandon(&mut self) -> Option<AnchorBinding> {
        let active = self.active.take()?;
        self.enforcer.stop();
        self.gestures.disable();
        self.state = AnchorState::Unanchored;
        warn!(
            "abandoned anchor on node {}; it is no longer tracked",
            active.binding.node()
        );
        Some(active.binding)
    }

    /// Swap the anchored node for `request.node` in one step.
    ///
    /// The new node takes over the current anchor distance (no
    /// re-measurement) and the old node returns to its marker frame. Any
    /// in-progress gesture is cancelled. If the new node cannot be entered
    /// the old anchor is kept.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip(self, scene, request, pose), fields(node = request.node.0))
    )]
    pub fn rebind<S: Scene + ?Sized>(
        &mut self,
        scene: &mut S,
        request: AnchorRequest,
        pose: ModelPose,
    ) -> Result<AnchorBinding, AnchorError> {
        let Some(current) = self.active.clone() else {
            return Err(AnchorError::InvalidTransition("rebind without an anchor"));
        };
        let distance = current.binding.distance().unwrap_or(self.params.min_distance);
        self.gestures.cancel();

        if current.binding.node() == request.node {
            let mut active = current;
            active.hidden = request.hidden;
            apply_visibility(scene, active.binding.node(), &active.hidden);
            let binding = active.binding;
            self.start_anchored(active);
            return Ok(binding);
        }

        // Validate everything about the new node before touching the old.
        let viewer = scene.viewer_frame().ok_or(AnchorError::AnchorUnavailable)?;
        let origin = read_origin(scene, request.node)?;

        let old_node = current.binding.node();
        self.enforcer.stop();
        if let Err(err) = restore_origin(scene, old_node, &current.origin) {
            self.start_anchored(current);
            return Err(err);
        }

        let entered = enter_viewer(scene, &request, origin, viewer, distance, pose);
        match entered {
            Ok(active) => {
                let binding = active.binding;
                self.start_anchored(active);
                info!(
                    "rebound anchor from {} to {}",
                    scene.label(old_node),
                    scene.label(request.node)
                );
                Ok(binding)
            }
            Err(err) => {
                warn!(
                    "rebind to {} failed ({err}); keeping {}",
                    scene.label(request.node),
                    scene.label(old_node)
                );
                let old_request = AnchorRequest {
                    node: old_node,
                    hidden: current.hidden.clone(),
                };
                match enter_viewer(scene, &old_request, current.origin, viewer, distance, pose) {
                    Ok(active) => self.start_anchored(active),
                    Err(_) => {
                        self.active = None;
                        self.state = AnchorState::Unanchored;
                        self.gestures.disable();
                    }
                }
                Err(err)
            }
        }
    }

    /// Write `pose` to the anchored node. Only rotation and scale change;
    /// the anchor offset stays put.
    pub fn apply_pose<S: Scene + ?Sized>(
        &mut self,
        scene: &mut S,
        pose: ModelPose,
    ) -> Result<(), AnchorError> {
        let active = self
            .active
            .as_ref()
            .ok_or(AnchorError::InvalidTransition("pose update without an anchor"))?;
        let distance = active.binding.distance().unwrap_or(self.params.min_distance);
        let transform = anchored_transform(&active.origin.transform, distance, pose);
        scene.set_local_transform(active.binding.node(), transform)?;
        Ok(())
    }

    /// Route a pointer sample through the gesture interpreter and apply the
    /// result to `pose` and the anchored node.
    pub fn handle_pointer<S: Scene + ?Sized>(
        &mut self,
        scene: &mut S,
        event: &PointerEvent,
        pose: &mut ModelPose,
    ) -> Result<Option<GestureOutput>, AnchorError> {
        if !self.is_anchored() {
            return Ok(None);
        }
        let output = self.gestures.on_pointer(event, *pose);
        self.apply_output(scene, output, pose)
    }

    /// Mouse wheel zoom for the anchored node.
    pub fn handle_wheel<S: Scene + ?Sized>(
        &mut self,
        scene: &mut S,
        delta_y: f32,
        pose: &mut ModelPose,
    ) -> Result<Option<GestureOutput>, AnchorError> {
        if !self.is_anchored() {
            return Ok(None);
        }
        let output = self.gestures.on_wheel(delta_y, *pose);
        self.apply_output(scene, output, pose)
    }

    /// Drop any in-progress gesture (pointer baselines), keeping the pose.
    pub fn cancel_gesture(&mut self) {
        self.gestures.cancel();
    }

    /// Frame tick: run the visibility enforcer if it is due.
    pub fn tick<S: Scene + ?Sized>(&mut self, scene: &mut S, dt: f32) -> Option<EnforcementReport> {
        self.enforcer.tick(scene, dt)
    }

    /// Run a corrective pass right away, ignoring the enforcer's interval.
    pub fn enforce_now<S: Scene + ?Sized>(&mut self, scene: &mut S) -> Option<EnforcementReport> {
        self.enforcer.run_pass(scene)
    }

    fn apply_output<S: Scene + ?Sized>(
        &mut self,
        scene: &mut S,
        output: Option<GestureOutput>,
        pose: &mut ModelPose,
    ) -> Result<Option<GestureOutput>, AnchorError> {
        let Some(out) = output else {
            return Ok(None);
        };
        pose.apply(out);
        self.apply_pose(scene, *pose)?;
        Ok(Some(out))
    }

    fn measure_and_enter<S: Scene + ?Sized>(
        &self,
        scene: &mut S,
        request: &AnchorRequest,
        pose: ModelPose,
    ) -> Result<ActiveAnchor, AnchorError> {
        let viewer = scene.viewer_frame().ok_or(AnchorError::AnchorUnavailable)?;
        let origin = read_origin(scene, request.node)?;
        let raw = measure_distance(scene, request.node, viewer)?;
        let distance = self.params.clamp_distance(raw);
        debug!(
            "{}: measured {:.3} m, anchoring at {:.3} m",
            scene.label(request.node),
            raw,
            distance
        );
        enter_viewer(scene, request, origin, viewer, distance, pose)
    }

    fn start_anchored(&mut self, active: ActiveAnchor) {
        if let Some(target) = active.enforcement_target() {
            self.enforcer.start(target);
        }
        self.gestures.enable();
        self.active = Some(active);
        self.state = AnchorState::Anchored;
    }
}

fn read_origin<S: Scene + ?Sized>(scene: &S, node: NodeId) -> Result<NodeOrigin, AnchorError> {
    let transform = scene
        .local_transform(node)
        .ok_or_else(|| AnchorError::NodeNotFound(scene.label(node)))?;
    let parent = scene
        .parent(node)
        .ok_or(AnchorError::InvalidTransition("node has no marker frame"))?;
    if Some(parent) == scene.viewer_frame() {
        return Err(AnchorError::InvalidTransition(
            "node is already under the viewer frame",
        ));
    }
    Ok(NodeOrigin { parent, transform })
}

fn measure_distance<S: Scene + ?Sized>(
    scene: &S,
    node: NodeId,
    viewer: NodeId,
) -> Result<f32, AnchorError> {
    let p_node = scene
        .world_position(node)
        .ok_or_else(|| AnchorError::NodeNotFound(scene.label(node)))?;
    let p_viewer = scene
        .world_position(viewer)
        .ok_or(AnchorError::AnchorUnavailable)?;
    Ok((p_node - p_viewer).norm())
}

/// Re-parent under the viewer. Either fully succeeds or leaves the node
/// where it was.
fn enter_viewer<S: Scene + ?Sized>(
    scene: &mut S,
    request: &AnchorRequest,
    origin: NodeOrigin,
    viewer: NodeId,
    distance: f32,
    pose: ModelPose,
) -> Result<ActiveAnchor, AnchorError> {
    let node = request.node;
    scene.set_local_transform(node, anchored_transform(&origin.transform, distance, pose))?;
    if let Err(err) = scene.reparent(node, viewer) {
        roll_back(scene, node, origin.transform);
        return Err(err.into());
    }
    apply_visibility(scene, node, &request.hidden);
    Ok(ActiveAnchor {
        binding: AnchorBinding::Viewer {
            node,
            viewer,
            distance,
        },
        origin,
        hidden: request.hidden.clone(),
    })
}

/// Back under the marker frame. Either fully succeeds or leaves the node
/// anchored as it was.
fn restore_origin<S: Scene + ?Sized>(
    scene: &mut S,
    node: NodeId,
    origin: &NodeOrigin,
) -> Result<(), AnchorError> {
    let anchored = scene
        .local_transform(node)
        .ok_or_else(|| AnchorError::NodeNotFound(scene.label(node)))?;
    scene.set_local_transform(node, origin.transform)?;
    if let Err(err) = scene.reparent(node, origin.parent) {
        roll_back(scene, node, anchored);
        return Err(err.into());
    }
    Ok(())
}

fn roll_back<S: Scene + ?Sized>(scene: &mut S, node: NodeId, transform: LocalTransform) {
    if let Err(err) = scene.set_local_transform(node, transform) {
        warn!("could not roll back {}: {err}", scene.label(node));
    }
}

fn apply_visibility<S: Scene + ?Sized>(scene: &mut S, shown: NodeId, hidden: &[NodeId]) {
    if let Err(err) = scene.set_visible(shown, true) {
        warn!("could not show {}: {err}", scene.label(shown));
    }
    for &node in hidden {
        if let Err(err) = scene.set_visible(node, false) {
            warn!("could not hide {}: {err}", scene.label(node));
        }
    }
}
