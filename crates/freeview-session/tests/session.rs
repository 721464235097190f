use approx::assert_abs_diff_eq;
use nalgebra::Point3;
use freeview_anchor::{anchor_offset, AnchorState};
use freeview_core::{DisplayMode, LocalTransform, NodeId, Scene, SceneError, SceneGraph, Structure};
use freeview_gesture::PointerEvent;
use freeview_session::layout::{build_scene, default_scene, MarkerPlacement, StructureNodes};
use freeview_session::{RecordingUi, SessionCoordinator, TrackingState, UiEvent, ViewerConfig};

fn coordinator() -> SessionCoordinator<RecordingUi> {
    SessionCoordinator::new(ViewerConfig::default(), RecordingUi::new())
}

fn all_reps(nodes: &[StructureNodes]) -> Vec<NodeId> {
    nodes.iter().flat_map(|n| [n.atom, n.schematic]).collect()
}

fn bound_to_viewer(scene: &SceneGraph, nodes: &[StructureNodes]) -> Vec<NodeId> {
    let viewer = scene.viewer_frame();
    all_reps(nodes)
        .into_iter()
        .filter(|&n| scene.parent(n) == viewer)
        .collect()
}

fn visible_reps(scene: &SceneGraph, nodes: &[StructureNodes]) -> Vec<NodeId> {
    all_reps(nodes)
        .into_iter()
        .filter(|&n| scene.is_visible(n) == Some(true))
        .collect()
}

#[test]
fn repeated_detection_is_absorbed() {
    let (mut scene, _) = default_scene().unwrap();
    let mut c = coordinator();

    c.on_marker_found(&mut scene, Structure::Bcc);
    let writes = scene.write_count();
    let events = c.ui().events.len();
    let distance = c.controller().distance();

    c.on_marker_found(&mut scene, Structure::Bcc);
    c.on_marker_found(&mut scene, Structure::Bcc);

    assert_eq!(c.ui().activations(), 1);
    assert_eq!(c.ui().events.len(), events);
    assert_eq!(scene.write_count(), writes);
    assert_eq!(c.controller().distance(), distance);
}

#[test]
fn only_the_last_detected_structure_is_shown() {
    let (mut scene, nodes) = default_scene().unwrap();
    let mut c = coordinator();
    let sequence = [
        Structure::Bcc,
        Structure::Fcc,
        Structure::Fcc,
        Structure::Hcp,
        Structure::Bcc,
        Structure::Hcp,
    ];

    for s in sequence {
        c.on_marker_found(&mut scene, s);
        let idx = Structure::ALL.iter().position(|&x| x == s).unwrap();
        let expected = nodes[idx].atom;

        assert_eq!(visible_reps(&scene, &nodes), vec![expected]);
        assert_eq!(bound_to_viewer(&scene, &nodes), vec![expected]);
        assert_eq!(c.controller().anchored_node(), Some(expected));
        for (other, n) in Structure::ALL.iter().zip(&nodes) {
            if *other != s {
                assert_eq!(scene.parent(n.atom), Some(n.target));
                assert_eq!(scene.parent(n.schematic), Some(n.target));
                assert_eq!(c.tracker().state(*other), TrackingState::Idle);
            }
        }
    }
}

#[test]
fn switching_restores_the_previous_model() {
    let (mut scene, nodes) = default_scene().unwrap();
    let before = scene.local_transform(nodes[0].atom).unwrap();
    let mut c = coordinator();

    c.on_marker_found(&mut scene, Structure::Bcc);
    c.on_pointer(&mut scene, &PointerEvent::down(1, 0.0, 0.0));
    c.on_pointer(&mut scene, &PointerEvent::moved(1, 40.0, 0.0));
    c.on_marker_found(&mut scene, Structure::Fcc);

    assert_eq!(scene.local_transform(nodes[0].atom), Some(before));
    assert_eq!(c.controller().gestures().active_pointers(), 0);
    let pose = c.session().unwrap().pose;
    assert_eq!(pose.yaw, 0.0);
}

#[test]
fn marker_loss_keeps_the_anchored_model() {
    let (mut scene, nodes) = default_scene().unwrap();
    let mut c = coordinator();
    c.on_marker_found(&mut scene, Structure::Fcc);
    let fcc = nodes[1];

    let visibility: Vec<_> = all_reps(&nodes)
        .into_iter()
        .map(|n| scene.is_visible(n))
        .collect();
    c.on_marker_lost(&mut scene, Structure::Fcc);
    let after: Vec<_> = all_reps(&nodes)
        .into_iter()
        .map(|n| scene.is_visible(n))
        .collect();

    assert_eq!(visibility, after);
    assert_eq!(scene.parent(fcc.atom), scene.viewer_frame());
    assert_eq!(c.debug_snapshot().anchor_state, AnchorState::Anchored);
    assert_eq!(
        c.ui().last_status(),
        Some("FCC - Face-Centred Cubic - free to rotate (marker not visible)")
    );
}

#[test]
fn loss_of_an_inactive_marker_is_ignored() {
    let (mut scene, _) = default_scene().unwrap();
    let mut c = coordinator();
    c.on_marker_found(&mut scene, Structure::Fcc);
    let events = c.ui().events.len();
    let writes = scene.write_count();

    c.on_marker_lost(&mut scene, Structure::Hcp);
    assert_eq!(c.ui().events.len(), events);
    assert_eq!(scene.write_count(), writes);
}

#[test]
fn enforcer_undoes_tracker_auto_hide() {
    let (mut scene, nodes) = default_scene().unwrap();
    let mut c = coordinator();
    c.on_marker_found(&mut scene, Structure::Hcp);
    let hcp = nodes[2];

    // What the tracker does on its own when the marker disappears.
    scene.set_visible(hcp.atom, false).unwrap();
    scene.reparent(hcp.atom, hcp.target).unwrap();
    let mut local = scene.local_transform(hcp.atom).unwrap();
    local.translation.x += 0.3;
    scene.set_local_transform(hcp.atom, local).unwrap();

    let report = c.on_frame(&mut scene, 0.016).unwrap();
    assert!(report.reparented);
    assert!(report.offset_restored);
    assert_eq!(scene.is_visible(hcp.atom), Some(true));
    assert_eq!(scene.parent(hcp.atom), scene.viewer_frame());
    let restored = scene.local_transform(hcp.atom).unwrap();
    assert_abs_diff_eq!(
        restored.translation,
        anchor_offset(1.0),
        epsilon = 1e-5
    );

    let writes = scene.write_count();
    assert_eq!(c.on_frame(&mut scene, 0.016).unwrap().corrections(), 0);
    assert_eq!(scene.write_count(), writes);
}

#[test]
fn anchor_distance_follows_the_clamp() {
    for (raw, expected) in [(0.05_f32, 0.2_f32), (1.0, 1.0), (5.0, 2.0)] {
        let (mut scene, nodes) =
            build_scene(&[MarkerPlacement::ahead(Structure::Bcc, raw)]).unwrap();
        let mut c = coordinator();
        c.on_marker_found(&mut scene, Structure::Bcc);

        assert_abs_diff_eq!(c.debug_snapshot().distance.unwrap(), expected, epsilon = 1e-5);
        assert_abs_diff_eq!(
            c.session().unwrap().last_known_distance.unwrap(),
            expected,
            epsilon = 1e-5
        );
        let local = scene.local_transform(nodes[0].atom).unwrap();
        assert_abs_diff_eq!(local.translation, anchor_offset(expected), epsilon = 1e-5);
    }
}

#[test]
fn mode_toggle_keeps_exactly_one_node_bound() {
    let (mut scene, nodes) = default_scene().unwrap();
    let mut c = coordinator();
    c.on_marker_found(&mut scene, Structure::Bcc);
    let bcc = nodes[0];
    let distance = c.controller().distance();

    for round in 0..4 {
        c.toggle_mode(&mut scene);
        let expected = if round % 2 == 0 {
            bcc.schematic
        } else {
            bcc.atom
        };
        assert_eq!(bound_to_viewer(&scene, &nodes), vec![expected]);
        assert_eq!(visible_reps(&scene, &nodes), vec![expected]);
        assert_eq!(c.controller().anchored_node(), Some(expected));
        assert_eq!(c.controller().distance(), distance);

        c.on_frame(&mut scene, 0.016);
        assert_eq!(bound_to_viewer(&scene, &nodes), vec![expected]);
    }
    assert_eq!(c.mode(), DisplayMode::Atom);
}

#[test]
fn mode_toggle_after_marker_loss_keeps_distance() {
    let (mut scene, nodes) =
        build_scene(&[MarkerPlacement::ahead(Structure::Fcc, 0.7)]).unwrap();
    let mut c = coordinator();
    c.on_marker_found(&mut scene, Structure::Fcc);
    c.on_marker_lost(&mut scene, Structure::Fcc);
    c.toggle_mode(&mut scene);

    let local = scene.local_transform(nodes[0].schematic).unwrap();
    assert_abs_diff_eq!(local.translation, anchor_offset(0.7), epsilon = 1e-5);
    assert_eq!(
        c.ui().events.last(),
        Some(&UiEvent::ModeChanged {
            mode: DisplayMode::Schematic
        })
    );
}

#[test]
fn mode_toggle_cancels_gesture_but_keeps_pose() {
    let (mut scene, _) = default_scene().unwrap();
    let mut c = coordinator();
    c.on_marker_found(&mut scene, Structure::Bcc);

    c.on_pointer(&mut scene, &PointerEvent::down(1, 100.0, 100.0));
    c.on_pointer(&mut scene, &PointerEvent::moved(1, 140.0, 100.0));
    c.toggle_mode(&mut scene);

    assert_eq!(c.controller().gestures().active_pointers(), 0);
    let pose = c.session().unwrap().pose;
    assert_abs_diff_eq!(pose.yaw, 20.0);

    // The stale contact is gone: moving it does nothing.
    assert!(c
        .on_pointer(&mut scene, &PointerEvent::moved(1, 400.0, 100.0))
        .is_none());
}

#[test]
fn closed_drag_path_returns_to_start_orientation() {
    let (mut scene, _) = default_scene().unwrap();
    let mut c = coordinator();
    c.on_marker_found(&mut scene, Structure::Hcp);

    let path = [
        (100.0, 100.0),
        (137.5, 91.0),
        (160.0, 140.0),
        (80.25, 173.0),
        (55.0, 60.0),
        (100.0, 100.0),
    ];
    c.on_pointer(&mut scene, &PointerEvent::down(7, path[0].0, path[0].1));
    for &(x, y) in &path[1..] {
        c.on_pointer(&mut scene, &PointerEvent::moved(7, x, y));
    }
    c.on_pointer(&mut scene, &PointerEvent::up(7, 100.0, 100.0));

    let pose = c.session().unwrap().pose;
    assert_abs_diff_eq!(pose.pitch, 0.0, epsilon = 1e-3);
    assert_abs_diff_eq!(pose.yaw, 0.0, epsilon = 1e-3);
}

#[test]
fn pinch_is_clamped_to_zoom_bounds() {
    for (spread, expected) in [(1000.0_f32, 3.0_f32), (1.0, 0.5)] {
        let (mut scene, _) = default_scene().unwrap();
        let mut c = coordinator();
        c.on_marker_found(&mut scene, Structure::Bcc);

        c.on_pointer(&mut scene, &PointerEvent::down(1, 0.0, 0.0));
        c.on_pointer(&mut scene, &PointerEvent::down(2, 100.0, 0.0));
        c.on_pointer(&mut scene, &PointerEvent::moved(2, spread, 0.0));

        assert_abs_diff_eq!(c.session().unwrap().scale(), expected);
    }
}

#[test]
fn gestures_never_move_the_anchor() {
    let (mut scene, nodes) = default_scene().unwrap();
    let mut c = coordinator();
    c.on_marker_found(&mut scene, Structure::Bcc);

    c.on_pointer(&mut scene, &PointerEvent::down(1, 0.0, 0.0));
    c.on_pointer(&mut scene, &PointerEvent::moved(1, 30.0, -12.0));
    c.on_pointer(&mut scene, &PointerEvent::down(2, 200.0, 0.0));
    c.on_pointer(&mut scene, &PointerEvent::moved(2, 300.0, 0.0));
    c.on_wheel(&mut scene, -50.0);

    let local = scene.local_transform(nodes[0].atom).unwrap();
    assert_abs_diff_eq!(local.translation, anchor_offset(1.0), epsilon = 1e-5);
    assert!(c.session().unwrap().scale() > 1.0);
}

#[test]
fn no_corrections_after_release() {
    let (mut scene, nodes) = default_scene().unwrap();
    let mut c = coordinator();
    c.on_marker_found(&mut scene, Structure::Bcc);
    c.on_marker_found(&mut scene, Structure::Fcc);
    c.shutdown(&mut scene);

    // The tracker keeps meddling; nothing may answer.
    scene.set_visible(nodes[1].atom, true).unwrap();
    scene.set_visible(nodes[0].atom, true).unwrap();
    let writes = scene.write_count();
    for _ in 0..30 {
        assert!(c.on_frame(&mut scene, 0.016).is_none());
    }
    assert_eq!(scene.write_count(), writes);
    assert!(!c.debug_snapshot().enforcer_running);
}

#[test]
fn viewer_not_ready_is_retried_on_next_detection() {
    let (mut scene, nodes) = default_scene().unwrap();
    let viewer = scene.viewer_frame();
    scene.set_viewer_frame(None).unwrap();
    let mut c = coordinator();

    c.on_marker_found(&mut scene, Structure::Fcc);
    let fcc = nodes[1];
    assert_eq!(scene.parent(fcc.atom), Some(fcc.target));
    assert_eq!(scene.is_visible(fcc.atom), Some(true));
    assert_eq!(c.tracker().state(Structure::Fcc), TrackingState::Detected);
    assert_eq!(
        c.ui().last_status(),
        Some("FCC - Face-Centred Cubic detected - viewer not ready")
    );
    assert!(!c.debug_snapshot().enforcer_running);

    scene.set_viewer_frame(viewer).unwrap();
    c.on_marker_found(&mut scene, Structure::Fcc);
    assert_eq!(scene.parent(fcc.atom), viewer);
    assert_eq!(c.tracker().state(Structure::Fcc), TrackingState::Anchored);
    assert_eq!(c.ui().activations(), 1);
}

#[test]
fn regained_marker_refreshes_status_only() {
    let (mut scene, _) = default_scene().unwrap();
    let mut c = coordinator();
    c.on_marker_found(&mut scene, Structure::Bcc);
    c.on_marker_lost(&mut scene, Structure::Bcc);
    let writes = scene.write_count();

    c.on_marker_found(&mut scene, Structure::Bcc);
    assert_eq!(scene.write_count(), writes);
    assert_eq!(c.ui().activations(), 1);
    assert_eq!(
        c.ui().last_status(),
        Some("BCC - Body-Centred Cubic detected")
    );
}

#[test]
fn missing_representation_node_is_skipped() {
    let mut scene = SceneGraph::new();
    let viewer = scene
        .add_node("camera", None, Default::default())
        .unwrap();
    scene.set_viewer_frame(Some(viewer)).unwrap();
    let mut c = coordinator();

    c.on_marker_found(&mut scene, Structure::Bcc);
    assert_eq!(c.active_structure(), Some(Structure::Bcc));
    assert_eq!(c.debug_snapshot().anchor_state, AnchorState::Unanchored);
    assert_eq!(c.controller().anchored_node(), None);
}

#[test]
fn losing_an_unanchored_marker_updates_status() {
    let (mut scene, _) = default_scene().unwrap();
    scene.set_viewer_frame(None).unwrap();
    let mut c = coordinator();
    c.on_marker_found(&mut scene, Structure::Hcp);
    c.on_marker_lost(&mut scene, Structure::Hcp);
    assert_eq!(
        c.ui().last_status(),
        Some("HCP - Hexagonal Close-Packed - marker not visible")
    );
    assert!(!c.debug_snapshot().marker_visible);
}

/// Scene that refuses to move anything under the viewer frame while
/// `blocked` is set.
struct BlockedViewer {
    inner: SceneGraph,
    blocked: bool,
}

impl Scene for BlockedViewer {
    fn find(&self, name: &str) -> Option<NodeId> {
        self.inner.find(name)
    }
    fn name(&self, node: NodeId) -> Option<&str> {
        self.inner.name(node)
    }
    fn viewer_frame(&self) -> Option<NodeId> {
        self.inner.viewer_frame()
    }
    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.inner.parent(node)
    }
    fn local_transform(&self, node: NodeId) -> Option<LocalTransform> {
        self.inner.local_transform(node)
    }
    fn world_position(&self, node: NodeId) -> Option<Point3<f32>> {
        self.inner.world_position(node)
    }
    fn is_visible(&self, node: NodeId) -> Option<bool> {
        self.inner.is_visible(node)
    }
    fn set_local_transform(
        &mut self,
        node: NodeId,
        transform: LocalTransform,
    ) -> Result<(), SceneError> {
        self.inner.set_local_transform(node, transform)
    }
    fn reparent(&mut self, node: NodeId, parent: NodeId) -> Result<(), SceneError> {
        if self.blocked && Some(parent) == self.inner.viewer_frame() {
            return Err(SceneError::UnknownNode(parent));
        }
        self.inner.reparent(node, parent)
    }
    fn set_visible(&mut self, node: NodeId, visible: bool) -> Result<(), SceneError> {
        self.inner.set_visible(node, visible)
    }
}

#[test]
fn failed_mode_switch_drops_back_to_detected_and_retries() {
    let (inner, nodes) = default_scene().unwrap();
    let mut scene = BlockedViewer {
        inner,
        blocked: false,
    };
    let mut c = coordinator();
    c.on_marker_found(&mut scene, Structure::Bcc);
    assert!(c.controller().is_anchored());

    scene.blocked = true;
    c.toggle_mode(&mut scene);
    let bcc = nodes[0];
    let snap = c.debug_snapshot();
    assert_eq!(snap.mode, DisplayMode::Atom);
    assert_eq!(snap.anchor_state, AnchorState::Unanchored);
    assert_eq!(snap.tracking, Some(TrackingState::Detected));
    assert_eq!(snap.anchored_node, None);
    assert!(!snap.enforcer_running);
    assert_eq!(scene.parent(bcc.atom), Some(bcc.target));
    assert_eq!(scene.parent(bcc.schematic), Some(bcc.target));
    assert_eq!(
        c.ui().last_status(),
        Some("BCC - Body-Centred Cubic detected")
    );

    scene.blocked = false;
    c.on_marker_found(&mut scene, Structure::Bcc);
    assert_eq!(c.controller().anchored_node(), Some(bcc.atom));
    assert_eq!(scene.parent(bcc.atom), scene.viewer_frame());
    assert_eq!(c.debug_snapshot().anchor_state, AnchorState::Anchored);
    assert_eq!(c.tracker().state(Structure::Bcc), TrackingState::Anchored);
}
