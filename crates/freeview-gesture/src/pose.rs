use serde::{Deserialize, Serialize};

/// Transform update produced by the interpreter.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GestureOutput {
    /// Incremental rotation in degrees.
    Rotate { pitch_delta: f32, yaw_delta: f32 },
    /// New absolute scale multiplier (already clamped).
    Scale { scale: f32 },
}

/// User-controlled orientation and zoom of the inspected model.
///
/// Angles are in degrees and unbounded; `scale` multiplies the model's
/// nominal scale.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModelPose {
    pub pitch: f32,
    pub yaw: f32,
    pub scale: f32,
}

impl Default for ModelPose {
    fn default() -> Self {
        Self {
            pitch: 0.0,
            yaw: 0.0,
            scale: 1.0,
        }
    }
}

impl ModelPose {
    pub fn apply(&mut self, output: GestureOutput) {
        match output {
            GestureOutput::Rotate {
                pitch_delta,
                yaw_delta,
            } => {
                self.pitch += pitch_delta;
                self.yaw += yaw_delta;
            }
            GestureOutput::Scale { scale } => self.scale = scale,
        }
    }
}
