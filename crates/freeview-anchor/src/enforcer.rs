//! Continuous correction of an anchored node against an uncooperative tracker.
//!
//! The marker tracker hides marker content on its own schedule when a marker
//! is lost, and may move nodes back under the marker frame. A one-shot fix
//! would be undone on the tracker's next update, so the enforcer re-checks
//! on every pass for as long as it runs. Writes happen only when something
//! drifted.

use freeview_core::{NodeId, Scene, SceneError};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::binding::anchor_offset;

/// Drift below this (meters) is left alone.
const OFFSET_TOLERANCE: f32 = 1e-5;

/// Enforcement cadence.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnforcerParams {
    /// Seconds between corrective passes; `0.0` runs a pass on every tick.
    pub interval_secs: f32,
}

impl Default for EnforcerParams {
    fn default() -> Self {
        Self { interval_secs: 0.0 }
    }
}

/// The state a pass re-asserts.
#[derive(Clone, Debug, PartialEq)]
pub struct EnforcementTarget {
    pub node: NodeId,
    pub viewer: NodeId,
    pub distance: f32,
    /// Sibling representations that must stay hidden.
    pub hidden: Vec<NodeId>,
}

/// Corrections made by one pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct EnforcementReport {
    pub visibility_fixes: usize,
    pub reparented: bool,
    pub offset_restored: bool,
    pub errors: usize,
}

impl EnforcementReport {
    pub fn corrections(&self) -> usize {
        self.visibility_fixes + usize::from(self.reparented) + usize::from(self.offset_restored)
    }
}

#[derive(Clone, Debug, Default)]
pub struct VisibilityEnforcer {
    params: EnforcerParams,
    target: Option<EnforcementTarget>,
    since_last_pass: f32,
    passes: u64,
    corrections: u64,
}

impl VisibilityEnforcer {
    pub fn new(params: EnforcerParams) -> Self {
        Self {
            params,
            ..Self::default()
        }
    }

    #[inline]
    pub fn params(&self) -> &EnforcerParams {
        &self.params
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.target.is_some()
    }

    pub fn target(&self) -> Option<&EnforcementTarget> {
        self.target.as_ref()
    }

    /// Total passes run since construction.
    pub fn passes(&self) -> u64 {
        self.passes
    }

    /// Total corrective writes since construction.
    pub fn corrections(&self) -> u64 {
        self.corrections
    }

    /// Start enforcing `target`, replacing any previous target.
    pub fn start(&mut self, target: EnforcementTarget) {
        if let Some(prev) = self.target.as_ref() {
            debug!("enforcer retargeted from {} to {}", prev.node, target.node);
        } else {
            debug!("enforcer started for {}", target.node);
        }
        self.target = Some(target);
        self.since_last_pass = 0.0;
    }

    /// Stop enforcing. Returns `false` if it was not running.
    pub fn stop(&mut self) -> bool {
        match self.target.take() {
            Some(t) => {
                debug!("enforcer stopped for {}", t.node);
                true
            }
            None => false,
        }
    }

    /// Advance the enforcement clock by `dt` seconds and run a pass if due.
    pub fn tick<S: Scene + ?Sized>(&mut self, scene: &mut S, dt: f32) -> Option<EnforcementReport> {
        self.target.as_ref()?;
        if self.params.interval_secs > 0.0 {
            self.since_last_pass += dt.max(0.0);
            if self.since_last_pass < self.params.interval_secs {
                return None;
            }
            self.since_last_pass = 0.0;
        }
        self.run_pass(scene)
    }

    /// Run one corrective pass immediately. `None` when stopped.
    pub fn run_pass<S: Scene + ?Sized>(&mut self, scene: &mut S) -> Option<EnforcementReport> {
        let target = self.target.as_ref()?;
        let mut report = EnforcementReport::default();

        // (a) the selected representation is shown and its siblings are not.
        for (node, want) in std::iter::once((target.node, true))
            .chain(target.hidden.iter().map(|&n| (n, false)))
            .chain(std::iter::once((target.viewer, true)))
        {
            if scene.is_visible(node) != Some(want)
                && applied(scene.set_visible(node, want), "fix visibility", &mut report)
            {
                report.visibility_fixes += 1;
            }
        }

        // (b) still parented under the viewer frame.
        if scene.parent(target.node) != Some(target.viewer)
            && applied(
                scene.reparent(target.node, target.viewer),
                "re-parent",
                &mut report,
            )
        {
            report.reparented = true;
        }

        // (c) still at the anchor distance; rotation and scale belong to the user.
        let expected = anchor_offset(target.distance);
        if let Some(mut local) = scene.local_transform(target.node) {
            if (local.translation - expected).norm() > OFFSET_TOLERANCE {
                local.translation = expected;
                if applied(
                    scene.set_local_transform(target.node, local),
                    "restore offset",
                    &mut report,
                ) {
                    report.offset_restored = true;
                }
            }
        }

        self.passes += 1;
        let fixed = report.corrections();
        if fixed > 0 {
            self.corrections += fixed as u64;
            debug!(
                "enforcer pass on {}: {} correction(s)",
                scene.label(target.node),
                fixed
            );
        }
        Some(report)
    }
}

fn applied(res: Result<(), SceneError>, what: &str, report: &mut EnforcementReport) -> bool {
    match res {
        Ok(()) => true,
        Err(err) => {
            warn!("enforcer could not {what}: {err}");
            report.errors += 1;
            false
        }
    }
}
