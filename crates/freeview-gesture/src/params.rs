use serde::{Deserialize, Serialize};

/// Gesture sensitivity and zoom bounds.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureParams {
    /// Degrees of rotation per pixel of single-pointer drag.
    pub rotation_sensitivity: f32,
    /// Scale change per unit of wheel delta.
    pub zoom_sensitivity: f32,
    /// Lower zoom bound, as a multiple of the model's nominal scale.
    pub min_scale: f32,
    /// Upper zoom bound, as a multiple of the model's nominal scale.
    pub max_scale: f32,
    /// Pinch baselines shorter than this (pixels) produce no scale change.
    pub pinch_epsilon: f32,
}

impl Default for GestureParams {
    fn default() -> Self {
        Self {
            rotation_sensitivity: 0.5,
            zoom_sensitivity: 0.002,
            min_scale: 0.5,
            max_scale: 3.0,
            pinch_epsilon: 1e-3,
        }
    }
}

impl GestureParams {
    /// Clamp a scale multiplier into `[min_scale, max_scale]`.
    ///
    /// Never panics, even if the bounds are inverted in a config file; the
    /// lower bound wins in that case.
    #[inline]
    pub fn clamp_scale(&self, scale: f32) -> f32 {
        scale.min(self.max_scale).max(self.min_scale)
    }
}
