use log::debug;
use nalgebra::{Point2, Vector2};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{GestureOutput, GestureParams, ModelPose, PointerEvent, PointerPhase};

/// Baseline of a two-pointer pinch.
#[derive(Clone, Copy, Debug, PartialEq)]
struct PinchBaseline {
    distance: f32,
    scale: f32,
}

/// State of one gesture session, from first pointer-down to last pointer-up.
#[derive(Clone, Debug, Default)]
struct GestureState {
    /// At most two tracked contacts, in arrival order.
    pointers: Vec<(u64, Point2<f32>)>,
    /// Last sampled position of the single rotating pointer.
    rotation_baseline: Option<Point2<f32>>,
    pinch: Option<PinchBaseline>,
    /// Total rotation (pitch, yaw) emitted during this session.
    rotation_accumulator: Vector2<f32>,
    /// Last scale emitted during this session.
    scale_accumulator: Option<f32>,
}

impl GestureState {
    fn position_of(&self, id: u64) -> Option<Point2<f32>> {
        self.pointers
            .iter()
            .find(|(pid, _)| *pid == id)
            .map(|(_, p)| *p)
    }

    fn pinch_distance(&self) -> Option<f32> {
        match self.pointers.as_slice() {
            [(_, a), (_, b)] => Some((a - b).norm()),
            _ => None,
        }
    }

    /// Re-establish baselines for the current pointer count.
    fn rebaseline(&mut self, current_scale: f32) {
        match self.pointers.as_slice() {
            [(_, p)] => {
                self.rotation_baseline = Some(*p);
                self.pinch = None;
            }
            [_, _] => {
                self.rotation_baseline = None;
                self.pinch = self.pinch_distance().map(|distance| PinchBaseline {
                    distance,
                    scale: current_scale,
                });
            }
            _ => {
                self.rotation_baseline = None;
                self.pinch = None;
            }
        }
    }
}

/// Turns pointer streams into rotation and zoom updates.
///
/// One pointer drags the model around (yaw follows horizontal motion, pitch
/// follows vertical motion with the sign inverted). Two pointers pinch-zoom
/// relative to the distance and scale at the moment the second pointer went
/// down. Any change in pointer count re-baselines, so a stale baseline never
/// leaks into the next phase of the gesture.
#[derive(Clone, Debug)]
pub struct GestureInterpreter {
    params: GestureParams,
    enabled: bool,
    state: Option<GestureState>,
}

impl GestureInterpreter {
    /// Create a disabled interpreter.
    pub fn new(params: GestureParams) -> Self {
        Self {
            params,
            enabled: false,
            state: None,
        }
    }

    #[inline]
    pub fn params(&self) -> &GestureParams {
        &self.params
    }

    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn enable(&mut self) {
        self.enabled = true;
    }

    /// Disable and drop any in-progress gesture.
    pub fn disable(&mut self) {
        self.enabled = false;
        self.cancel();
    }

    /// Drop any in-progress gesture without changing the enabled flag.
    pub fn cancel(&mut self) {
        if self.state.take().is_some() {
            debug!("gesture cancelled");
        }
    }

    /// Number of tracked contacts (0, 1 or 2).
    pub fn active_pointers(&self) -> usize {
        self.state.as_ref().map_or(0, |s| s.pointers.len())
    }

    /// `true` while a pinch baseline is recorded.
    pub fn is_pinching(&self) -> bool {
        self.state.as_ref().is_some_and(|s| s.pinch.is_some())
    }

    /// Feed one pointer sample. `pose` is the model's pose before this
    /// sample; it seeds the pinch baseline.
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    pub fn on_pointer(&mut self, event: &PointerEvent, pose: ModelPose) -> Option<GestureOutput> {
        if !self.enabled {
            return None;
        }
        match event.phase {
            PointerPhase::Down => {
                self.pointer_down(event, pose);
                None
            }
            PointerPhase::Move => self.pointer_move(event),
            PointerPhase::Up | PointerPhase::Cancel => {
                self.pointer_up(event, pose);
                None
            }
        }
    }

    /// Mouse wheel zoom: positive `delta_y` zooms out.
    pub fn on_wheel(&mut self, delta_y: f32, pose: ModelPose) -> Option<GestureOutput> {
        if !self.enabled || !delta_y.is_finite() {
            return None;
        }
        let scale = self
            .params
            .clamp_scale(pose.scale - delta_y * self.params.zoom_sensitivity);
        Some(GestureOutput::Scale { scale })
    }

    fn pointer_down(&mut self, event: &PointerEvent, pose: ModelPose) {
        let state = self.state.get_or_insert_with(GestureState::default);
        let pos = event.position();
        if let Some(entry) = state.pointers.iter_mut().find(|(id, _)| *id == event.id) {
            entry.1 = pos;
        } else if state.pointers.len() < 2 {
            state.pointers.push((event.id, pos));
        } else {
            debug!("ignoring extra pointer {}", event.id);
            return;
        }
        state.rebaseline(pose.scale);
        if let Some(pinch) = state.pinch {
            debug!("pinch start: distance={:.1}px", pinch.distance);
        }
    }

    fn pointer_move(&mut self, event: &PointerEvent) -> Option<GestureOutput> {
        let params = self.params;
        let state = self.state.as_mut()?;
        let pos = event.position();
        let entry = state.pointers.iter_mut().find(|(id, _)| *id == event.id)?;
        entry.1 = pos;

        match state.pointers.len() {
            1 => {
                let last = state.rotation_baseline.replace(pos)?;
                let d = pos - last;
                if d.x == 0.0 && d.y == 0.0 {
                    return None;
                }
                let yaw_delta = d.x * params.rotation_sensitivity;
                let pitch_delta = -d.y * params.rotation_sensitivity;
                state.rotation_accumulator += Vector2::new(pitch_delta, yaw_delta);
                Some(GestureOutput::Rotate {
                    pitch_delta,
                    yaw_delta,
                })
            }
            2 => {
                let baseline = state.pinch?;
                let current = state.pinch_distance()?;
                if !baseline.distance.is_finite()
                    || baseline.distance <= params.pinch_epsilon
                    || !current.is_finite()
                {
                    return None;
                }
                let scale = params.clamp_scale(baseline.scale * (current / baseline.distance));
                state.scale_accumulator = Some(scale);
                Some(GestureOutput::Scale { scale })
            }
            _ => None,
        }
    }

    fn pointer_up(&mut self, event: &PointerEvent, pose: ModelPose) {
        let Some(state) = self.state.as_mut() else {
            return;
        };
        if state.position_of(event.id).is_none() {
            return;
        }
        state.pointers.retain(|(id, _)| *id != event.id);
        if state.pointers.is_empty() {
            if let Some(done) = self.state.take() {
                debug!(
                    "gesture end: rotation=({:.1}, {:.1}) deg, scale={:?}",
                    done.rotation_accumulator.x, done.rotation_accumulator.y, done.scale_accumulator
                );
            }
            return;
        }
        // 2 -> 1: drop the pinch and restart rotation from where the
        // remaining finger is now.
        state.rebaseline(pose.scale);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn enabled() -> GestureInterpreter {
        let mut g = GestureInterpreter::new(GestureParams::default());
        g.enable();
        g
    }

    fn feed(g: &mut GestureInterpreter, pose: &mut ModelPose, events: &[PointerEvent]) {
        for ev in events {
            if let Some(out) = g.on_pointer(ev, *pose) {
                pose.apply(out);
            }
        }
    }

    #[test]
    fn disabled_interpreter_ignores_input() {
        let mut g = GestureInterpreter::new(GestureParams::default());
        let pose = ModelPose::default();
        assert!(g.on_pointer(&PointerEvent::down(1, 0.0, 0.0), pose).is_none());
        assert!(g.on_pointer(&PointerEvent::moved(1, 10.0, 0.0), pose).is_none());
        assert!(g.on_wheel(100.0, pose).is_none());
        assert_eq!(g.active_pointers(), 0);
    }

    #[test]
    fn drag_right_yaws_and_drag_down_pitches_negative() {
        let mut g = enabled();
        let mut pose = ModelPose::default();
        feed(
            &mut g,
            &mut pose,
            &[
                PointerEvent::down(1, 100.0, 100.0),
                PointerEvent::moved(1, 120.0, 100.0),
                PointerEvent::moved(1, 120.0, 110.0),
            ],
        );
        assert_abs_diff_eq!(pose.yaw, 10.0, epsilon = 1e-5);
        assert_abs_diff_eq!(pose.pitch, -5.0, epsilon = 1e-5);
        assert_abs_diff_eq!(pose.scale, 1.0);
    }

    #[test]
    fn closed_drag_path_leaves_rotation_unchanged() {
        let mut g = enabled();
        let mut pose = ModelPose {
            pitch: 12.5,
            yaw: -40.0,
            scale: 1.0,
        };
        feed(
            &mut g,
            &mut pose,
            &[
                PointerEvent::down(7, 100.0, 100.0),
                PointerEvent::moved(7, 173.3, 91.7),
                PointerEvent::moved(7, 12.9, 240.1),
                PointerEvent::moved(7, 100.4, 55.5),
                PointerEvent::moved(7, 100.0, 100.0),
                PointerEvent::up(7, 100.0, 100.0),
            ],
        );
        assert_abs_diff_eq!(pose.pitch, 12.5, epsilon = 1e-3);
        assert_abs_diff_eq!(pose.yaw, -40.0, epsilon = 1e-3);
        assert_eq!(g.active_pointers(), 0);
    }

    #[test]
    fn pinch_scales_relative_to_baseline_and_clamps() {
        let mut g = enabled();
        let mut pose = ModelPose::default();
        feed(
            &mut g,
            &mut pose,
            &[
                PointerEvent::down(1, 100.0, 100.0),
                PointerEvent::down(2, 110.0, 100.0),
                PointerEvent::moved(2, 120.0, 100.0),
            ],
        );
        assert_abs_diff_eq!(pose.scale, 2.0, epsilon = 1e-5);

        // 10x the baseline distance clamps to the upper bound.
        feed(&mut g, &mut pose, &[PointerEvent::moved(2, 200.0, 100.0)]);
        assert_abs_diff_eq!(pose.scale, 3.0);

        // 0.01x clamps to the lower bound.
        feed(&mut g, &mut pose, &[PointerEvent::moved(2, 100.1, 100.0)]);
        assert_abs_diff_eq!(pose.scale, 0.5);
    }

    #[test]
    fn zero_baseline_distance_produces_no_scale_change() {
        let mut g = enabled();
        let mut pose = ModelPose::default();
        feed(
            &mut g,
            &mut pose,
            &[
                PointerEvent::down(1, 50.0, 50.0),
                PointerEvent::down(2, 50.0, 50.0),
            ],
        );
        assert!(g
            .on_pointer(&PointerEvent::moved(2, 90.0, 50.0), pose)
            .is_none());
        assert_abs_diff_eq!(pose.scale, 1.0);
    }

    #[test]
    fn second_pinch_uses_fresh_baseline() {
        let mut g = enabled();
        let mut pose = ModelPose::default();
        feed(
            &mut g,
            &mut pose,
            &[
                PointerEvent::down(1, 0.0, 0.0),
                PointerEvent::down(2, 100.0, 0.0),
                PointerEvent::moved(2, 150.0, 0.0),
                PointerEvent::up(2, 150.0, 0.0),
                PointerEvent::up(1, 0.0, 0.0),
            ],
        );
        assert_abs_diff_eq!(pose.scale, 1.5, epsilon = 1e-5);

        // New gesture at a different spread: baseline is 40px at scale 1.5.
        feed(
            &mut g,
            &mut pose,
            &[
                PointerEvent::down(3, 0.0, 0.0),
                PointerEvent::down(4, 40.0, 0.0),
                PointerEvent::moved(4, 60.0, 0.0),
            ],
        );
        assert_abs_diff_eq!(pose.scale, 2.25, epsilon = 1e-5);
    }

    #[test]
    fn lifting_one_pinch_finger_does_not_jump_rotation() {
        let mut g = enabled();
        let mut pose = ModelPose::default();
        feed(
            &mut g,
            &mut pose,
            &[
                PointerEvent::down(1, 0.0, 0.0),
                PointerEvent::down(2, 100.0, 0.0),
                PointerEvent::moved(1, -50.0, 0.0),
                PointerEvent::up(2, 100.0, 0.0),
            ],
        );
        assert!(!g.is_pinching());
        assert_eq!(g.active_pointers(), 1);
        let before = pose;

        // Remaining finger continues from its current spot, not from where
        // it went down.
        feed(&mut g, &mut pose, &[PointerEvent::moved(1, -48.0, 0.0)]);
        assert_abs_diff_eq!(pose.yaw - before.yaw, 1.0, epsilon = 1e-5);
        assert_abs_diff_eq!(pose.pitch, before.pitch);
    }

    #[test]
    fn rotation_to_pinch_transition_drops_rotation_baseline() {
        let mut g = enabled();
        let mut pose = ModelPose::default();
        feed(
            &mut g,
            &mut pose,
            &[
                PointerEvent::down(1, 0.0, 0.0),
                PointerEvent::moved(1, 10.0, 0.0),
                PointerEvent::down(2, 30.0, 0.0),
                PointerEvent::moved(1, 0.0, 0.0),
            ],
        );
        // Only the first move rotated; the two-finger move zoomed.
        assert_abs_diff_eq!(pose.yaw, 5.0, epsilon = 1e-5);
        assert_abs_diff_eq!(pose.scale, 1.5, epsilon = 1e-5);
    }

    #[test]
    fn third_pointer_is_ignored() {
        let mut g = enabled();
        let pose = ModelPose::default();
        for (id, x) in [(1, 0.0), (2, 10.0), (3, 20.0)] {
            g.on_pointer(&PointerEvent::down(id, x, 0.0), pose);
        }
        assert_eq!(g.active_pointers(), 2);
        assert!(g
            .on_pointer(&PointerEvent::moved(3, 500.0, 0.0), pose)
            .is_none());
    }

    #[test]
    fn cancel_and_disable_clear_state() {
        let mut g = enabled();
        let pose = ModelPose::default();
        g.on_pointer(&PointerEvent::down(1, 0.0, 0.0), pose);
        g.on_pointer(&PointerEvent::down(2, 10.0, 0.0), pose);
        g.cancel();
        assert_eq!(g.active_pointers(), 0);
        assert!(g.is_enabled());
        // A move for a forgotten pointer is ignored.
        assert!(g
            .on_pointer(&PointerEvent::moved(2, 40.0, 0.0), pose)
            .is_none());

        g.on_pointer(&PointerEvent::down(1, 0.0, 0.0), pose);
        g.disable();
        assert_eq!(g.active_pointers(), 0);
        assert!(!g.is_enabled());
    }

    #[test]
    fn wheel_zooms_and_clamps() {
        let mut g = enabled();
        let pose = ModelPose::default();
        match g.on_wheel(-100.0, pose) {
            Some(GestureOutput::Scale { scale }) => assert_abs_diff_eq!(scale, 1.2, epsilon = 1e-5),
            other => panic!("unexpected wheel output {other:?}"),
        }
        assert_eq!(
            g.on_wheel(10_000.0, pose),
            Some(GestureOutput::Scale { scale: 0.5 })
        );
        assert!(g.on_wheel(f32::NAN, pose).is_none());
    }

    #[test]
    fn cancel_phase_behaves_like_up() {
        let mut g = enabled();
        let pose = ModelPose::default();
        g.on_pointer(&PointerEvent::down(1, 0.0, 0.0), pose);
        g.on_pointer(
            &PointerEvent::new(1, 0.0, 0.0, PointerPhase::Cancel),
            pose,
        );
        assert_eq!(g.active_pointers(), 0);
    }
}
