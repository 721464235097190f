use nalgebra::{Point3, Similarity3, Translation3, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

/// Local transform of a scene node relative to its parent.
///
/// Scale is uniform; models are never stretched along a single axis.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LocalTransform {
    pub translation: Vector3<f32>,
    pub rotation: UnitQuaternion<f32>,
    pub scale: f32,
}

impl Default for LocalTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl LocalTransform {
    pub fn identity() -> Self {
        Self {
            translation: Vector3::zeros(),
            rotation: UnitQuaternion::identity(),
            scale: 1.0,
        }
    }

    pub fn from_translation(translation: Vector3<f32>) -> Self {
        Self {
            translation,
            ..Self::identity()
        }
    }

    pub fn with_rotation(mut self, rotation: UnitQuaternion<f32>) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    /// Rotation from Euler angles in degrees (pitch about X, yaw about Y).
    pub fn rotation_from_degrees(pitch_deg: f32, yaw_deg: f32) -> UnitQuaternion<f32> {
        UnitQuaternion::from_euler_angles(pitch_deg.to_radians(), yaw_deg.to_radians(), 0.0)
    }

    /// `None` when the scale is zero or not finite.
    pub fn to_similarity(&self) -> Option<Similarity3<f32>> {
        (self.scale.is_finite() && self.scale != 0.0).then(|| {
            Similarity3::from_parts(
                Translation3::from(self.translation),
                self.rotation,
                self.scale,
            )
        })
    }

    /// Map a point from this node's space into its parent's space.
    #[inline]
    pub fn apply(&self, p: Point3<f32>) -> Point3<f32> {
        Point3::from(self.rotation * (p.coords * self.scale) + self.translation)
    }
}
