use serde::{Deserialize, Serialize};

/// Safety range for the measured marker-to-viewer distance, in meters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnchorParams {
    pub min_distance: f32,
    pub max_distance: f32,
}

impl Default for AnchorParams {
    fn default() -> Self {
        Self {
            min_distance: 0.2,
            max_distance: 2.0,
        }
    }
}

impl AnchorParams {
    /// Clamp a raw distance into `[min_distance, max_distance]`.
    ///
    /// A NaN measurement resolves to `min_distance`.
    #[inline]
    pub fn clamp_distance(&self, raw: f32) -> f32 {
        raw.max(self.min_distance).min(self.max_distance)
    }
}
